// The composition context and the staged pipeline.
//
// One `CompositionContext` is created per run and threaded through an
// ordered list of stages: load rhythm elements, pick tones, build the
// sample library (sample mode only), assemble bars, export MIDI. Each
// stage is the sole writer while it runs; earlier stages' outputs are
// read-only inputs to later ones. All randomness comes from the single
// seeded generator passed alongside the context, which is what makes a
// whole run reproducible from its seed.

use crate::assemble::{AssemblyMode, assemble_bars};
use crate::bar::Bar;
use crate::elements::{RhythmDocument, RhythmTemplate};
use crate::error::{Error, Result};
use crate::midi::write_midi;
use crate::samples::{SequenceSample, generate_library};
use crate::sequencer::{draw_minor_bias, generate_tone_sequence};
use crate::theory::{Tone, all_tones};
use rand::rngs::StdRng;
use std::path::PathBuf;

/// Process-wide state for one composition run, populated strictly in
/// pipeline order.
#[derive(Debug, Clone)]
pub struct CompositionContext {
    pub bar_capacity: u32,
    pub templates: Vec<RhythmTemplate>,
    /// The 24-tone universe, in sorted order.
    pub all_tones: Vec<Tone>,
    pub primary_tone: Option<Tone>,
    /// The run's "sadness" — probability mass shifted toward minor tones.
    pub minor_bias: f64,
    pub tone_sequence: Vec<Tone>,
    pub samples: Vec<SequenceSample>,
    pub bars: Vec<Bar>,
}

impl CompositionContext {
    pub fn new() -> Self {
        CompositionContext {
            bar_capacity: 32,
            templates: Vec::new(),
            all_tones: all_tones(),
            primary_tone: None,
            minor_bias: 0.0,
            tone_sequence: Vec::new(),
            samples: Vec::new(),
            bars: Vec::new(),
        }
    }
}

impl Default for CompositionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// One pipeline stage. Stages run in a fixed order and each mutates the
/// context exactly once.
pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut CompositionContext, rng: &mut StdRng) -> Result<()>;
}

/// Load the rhythm-element document (or the compiled-in default) and
/// derive the template list and bar capacity.
pub struct LoadElements {
    pub path: Option<PathBuf>,
}

impl Stage for LoadElements {
    fn name(&self) -> &'static str {
        "Loading rhythm elements"
    }

    fn run(&self, ctx: &mut CompositionContext, _rng: &mut StdRng) -> Result<()> {
        let doc = match &self.path {
            Some(path) => RhythmDocument::from_path(path)?,
            None => RhythmDocument::builtin(),
        };
        ctx.bar_capacity = doc.bar.size;
        ctx.templates = doc.templates()?;
        println!(
            "  {} templates, bar capacity {}",
            ctx.templates.len(),
            ctx.bar_capacity
        );
        Ok(())
    }
}

/// Pick the primary tone, draw the minor-mode bias, and build the tone
/// progression.
pub struct PickTones;

impl Stage for PickTones {
    fn name(&self) -> &'static str {
        "Selecting tones"
    }

    fn run(&self, ctx: &mut CompositionContext, rng: &mut StdRng) -> Result<()> {
        let primary = *crate::choice::uniform_choice(&ctx.all_tones, rng)?;
        ctx.primary_tone = Some(primary);
        ctx.minor_bias = draw_minor_bias(rng);
        ctx.tone_sequence =
            generate_tone_sequence(primary, &ctx.all_tones, ctx.minor_bias, rng)?;

        println!("  primary tone: {primary}");
        println!("  sadness: {:.3}", ctx.minor_bias);
        let progression: Vec<String> =
            ctx.tone_sequence.iter().map(|t| t.to_string()).collect();
        println!("  tone sequence: {}", progression.join(" "));
        Ok(())
    }
}

/// Generate the sample library against the primary tone. Required by
/// sample-mode assembly; skipped entirely in continuous mode.
pub struct BuildSamples;

impl Stage for BuildSamples {
    fn name(&self) -> &'static str {
        "Generating sequence samples"
    }

    fn run(&self, ctx: &mut CompositionContext, rng: &mut StdRng) -> Result<()> {
        let primary = ctx.primary_tone.ok_or_else(|| {
            Error::NotFound("primary tone not chosen; run the tone stage first".into())
        })?;
        ctx.samples = generate_library(primary, ctx.bar_capacity, &ctx.templates, rng)?;
        println!("  {} samples in the library", ctx.samples.len());
        Ok(())
    }
}

/// Fill the bars with one of the two assembly strategies.
pub struct AssembleBars {
    pub mode: AssemblyMode,
    pub bar_count: usize,
}

impl Stage for AssembleBars {
    fn name(&self) -> &'static str {
        "Assembling bars"
    }

    fn run(&self, ctx: &mut CompositionContext, rng: &mut StdRng) -> Result<()> {
        assemble_bars(ctx, self.mode, self.bar_count, rng)?;
        for bar in &ctx.bars {
            println!("  {bar}");
        }
        Ok(())
    }
}

/// Write the assembled bars to a Standard MIDI File.
pub struct ExportMidi {
    pub path: PathBuf,
    pub tempo_bpm: u16,
}

impl Stage for ExportMidi {
    fn name(&self) -> &'static str {
        "Writing MIDI"
    }

    fn run(&self, ctx: &mut CompositionContext, _rng: &mut StdRng) -> Result<()> {
        write_midi(&ctx.bars, ctx.bar_capacity, self.tempo_bpm, &self.path)?;
        println!("  {} bars written to {}", ctx.bars.len(), self.path.display());
        Ok(())
    }
}
