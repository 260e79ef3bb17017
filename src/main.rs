// Melody Generator — CLI entry point.
//
// Generates a seeded melody with harmonic accompaniment and writes it to
// MIDI. The pipeline: load rhythm elements → select tones → generate
// samples (sample mode) → assemble bars → MIDI output.

use clap::{Parser, ValueEnum};
use melodygen::assemble::AssemblyMode;
use melodygen::context::{
    AssembleBars, BuildSamples, CompositionContext, ExportMidi, LoadElements, PickTones, Stage,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Generate every note in place, bar by bar.
    Continuous,
    /// Generate a sample library and chain samples through the friend graph.
    Samples,
}

#[derive(Debug, Parser)]
#[command(name = "melodygen", about = "Procedural melody generator with harmonic accompaniment")]
struct Args {
    /// Output MIDI file.
    #[arg(default_value = "output.mid")]
    output: PathBuf,

    /// Number of bars to assemble.
    #[arg(long, default_value_t = 64)]
    bars: usize,

    /// Tempo in BPM.
    #[arg(long, default_value_t = 120)]
    tempo: u16,

    /// RNG seed. A random seed is drawn and printed when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Rhythm-element JSON document. The compiled-in default is used when
    /// omitted.
    #[arg(long)]
    elements: Option<PathBuf>,

    /// Bar assembly strategy.
    #[arg(long, value_enum, default_value_t = ModeArg::Samples)]
    mode: ModeArg,
}

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| rand::rng().random::<u64>());
    let mode = match args.mode {
        ModeArg::Continuous => AssemblyMode::Continuous,
        ModeArg::Samples => AssemblyMode::SampleReuse,
    };

    println!("=== Melody Generator ===");
    println!("Output: {}", args.output.display());
    println!("Bars: {}", args.bars);
    println!("Tempo: {} BPM", args.tempo);
    println!("Mode: {:?}", args.mode);
    println!("Seed: {}", seed);
    println!();

    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(LoadElements { path: args.elements.clone() }),
        Box::new(PickTones),
    ];
    if mode == AssemblyMode::SampleReuse {
        stages.push(Box::new(BuildSamples));
    }
    stages.push(Box::new(AssembleBars { mode, bar_count: args.bars }));
    stages.push(Box::new(ExportMidi {
        path: args.output.clone(),
        tempo_bpm: args.tempo,
    }));

    let mut ctx = CompositionContext::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let total = stages.len();
    for (index, stage) in stages.iter().enumerate() {
        println!("[{}/{}] {}...", index + 1, total, stage.name());
        if let Err(e) = stage.run(&mut ctx, &mut rng) {
            eprintln!("  Error: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {} (or any MIDI player)", args.output.display());
}
