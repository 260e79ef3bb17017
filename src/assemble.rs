// Bar assembly: turning templates or samples into a full piece.
//
// Two interchangeable strategies share the same contract: mark the bar's
// tone zones from the rotating tone sequence, fill it exactly to
// capacity, and leave every note pitched and finalized.
//
// - Continuous: draw rhythm templates bar by bar and resolve each pitch
//   in place, with the previous note carried across bar boundaries.
// - Sample reuse: stitch pre-pitched library samples using the friend
//   graph, re-weighting each friend by how melodically reachable its
//   first note is from the last placed note, and transposing the chosen
//   sample into the bar's current tone zone.

use crate::bar::Bar;
use crate::choice::{Weighted, uniform_choice, weighted_choice};
use crate::context::CompositionContext;
use crate::error::{Error, Result};
use crate::note::{Note, resolve_pitch};
use crate::samples::SequenceSample;
use crate::theory::Tone;
use rand::Rng;

/// Weight assigned to a friend whose first note is not a valid melodic
/// continuation of the previous note.
const UNREACHABLE_PENALTY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// Fresh rhythmic material per bar, pitched note by note.
    Continuous,
    /// Stitch library samples along the friend graph.
    SampleReuse,
}

/// Rotating cursor over the tone sequence feeding the bars' tone zones.
struct ToneCursor<'a> {
    sequence: &'a [Tone],
    index: usize,
}

impl<'a> ToneCursor<'a> {
    fn new(sequence: &'a [Tone]) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::NotFound(
                "tone sequence is empty; run the tone stage first".into(),
            ));
        }
        Ok(ToneCursor { sequence, index: 0 })
    }

    fn next(&mut self) -> Tone {
        let tone = self.sequence[self.index];
        self.index = (self.index + 1) % self.sequence.len();
        tone
    }
}

/// Mark a fresh bar's tone zones: offset 0 always, and with probability
/// 0.5 a second zone at the midpoint.
fn mark_tone_zones(bar: &mut Bar, cursor: &mut ToneCursor<'_>, rng: &mut impl Rng) {
    bar.tones.insert(0, cursor.next());
    if rng.random_bool(0.5) {
        bar.tones.insert(bar.capacity / 2, cursor.next());
    }
}

/// Assemble `bar_count` bars into `ctx.bars` using the given strategy.
pub fn assemble_bars(
    ctx: &mut CompositionContext,
    mode: AssemblyMode,
    bar_count: usize,
    rng: &mut impl Rng,
) -> Result<()> {
    match mode {
        AssemblyMode::Continuous => continuous(ctx, bar_count, rng),
        AssemblyMode::SampleReuse => sample_reuse(ctx, bar_count, rng),
    }
}

fn continuous(ctx: &mut CompositionContext, bar_count: usize, rng: &mut impl Rng) -> Result<()> {
    let mut cursor = ToneCursor::new(&ctx.tone_sequence)?;
    let mut prev: Option<Note> = None;
    let mut bars = Vec::with_capacity(bar_count);

    for _ in 0..bar_count {
        let mut bar = Bar::new(ctx.bar_capacity);
        mark_tone_zones(&mut bar, &mut cursor, rng);

        while !bar.is_full() {
            let space = bar.space_left();
            let fitting: Vec<Weighted<usize>> = ctx
                .templates
                .iter()
                .enumerate()
                .filter(|(_, t)| t.length <= space)
                .map(|(i, t)| Weighted { value: i, weight: t.probability })
                .collect();
            if fitting.is_empty() {
                return Err(Error::Capacity(format!(
                    "no rhythm template fits remaining bar capacity {space}"
                )));
            }
            let chosen = weighted_choice(&fitting, rng)?.value;
            for note in &ctx.templates[chosen].notes {
                bar.append_note(note.clone())?;
            }
        }

        // Resolve pitches in offset order, threading the previous note
        // across bars. Silent notes never become the previous note.
        let offsets: Vec<u32> = bar.notes.keys().copied().collect();
        for offset in offsets {
            let tone = bar.tone_at(offset)?;
            let Some(note) = bar.notes.get_mut(&offset) else {
                continue;
            };
            resolve_pitch(note, prev.as_ref(), tone, rng)?;
            if prev.is_none() || !note.is_silent {
                prev = Some(note.clone());
            }
        }

        bars.push(bar);
    }

    ctx.bars = bars;
    Ok(())
}

fn sample_reuse(ctx: &mut CompositionContext, bar_count: usize, rng: &mut impl Rng) -> Result<()> {
    if ctx.samples.is_empty() {
        return Err(Error::NotFound(
            "sample library is empty; run the sample stage first".into(),
        ));
    }
    let mut cursor = ToneCursor::new(&ctx.tone_sequence)?;
    let mut prev_sample: Option<usize> = None;
    let mut prev_note: Option<Note> = None;
    let mut bars = Vec::with_capacity(bar_count);

    for _ in 0..bar_count {
        let mut bar = Bar::new(ctx.bar_capacity);
        mark_tone_zones(&mut bar, &mut cursor, rng);
        let zone_limit = ctx.bar_capacity / bar.tones.len() as u32;

        while !bar.is_full() {
            let space = bar.space_left();
            let limit = space.min(zone_limit);
            let tone = bar.tone_at(ctx.bar_capacity - space)?;

            let chosen = pick_next_sample(
                &ctx.samples,
                prev_sample,
                prev_note.as_ref(),
                tone,
                limit,
                rng,
            )?;

            let notes = ctx.samples[chosen].transposed_notes(tone);
            for note in notes {
                prev_note = Some(note.clone());
                bar.append_note(note)?;
            }
            prev_sample = Some(chosen);
        }

        bars.push(bar);
    }

    ctx.bars = bars;
    Ok(())
}

/// Choose the next sample to place, under a length limit.
///
/// The first placement of the whole composition takes the library's
/// first generated sample. Afterwards the previous sample's friends are
/// filtered by the limit and re-weighted: stored friend weight times the
/// next-pitch weight of the candidate's (transposed) first note relative
/// to the previous placed note, or a fixed penalty when that pitch is
/// not a reachable candidate. When no friend fits, fall back to a
/// uniform pick over the whole library under the same limit.
fn pick_next_sample(
    samples: &[SequenceSample],
    prev_sample: Option<usize>,
    prev_note: Option<&Note>,
    tone: Tone,
    limit: u32,
    rng: &mut impl Rng,
) -> Result<usize> {
    if prev_sample.is_none() && samples[0].length() <= limit {
        return Ok(0);
    }

    let mut candidates: Vec<Weighted<usize>> = Vec::new();
    if let Some(previous) = prev_sample {
        let continuations = prev_note.map(|p| p.next_pitch_candidates(tone));
        for friend in &samples[previous].friends {
            let sample = &samples[friend.sample];
            if sample.length() > limit {
                continue;
            }
            let first_pitch = sample.transposed_notes(tone).first().map(|n| n.pitch);
            let weight = match (&continuations, first_pitch) {
                (Some(continuations), Some(pitch)) => {
                    match continuations.iter().find(|c| c.value == pitch) {
                        Some(candidate) => friend.weight * candidate.weight,
                        None => UNREACHABLE_PENALTY,
                    }
                }
                _ => friend.weight,
            };
            candidates.push(Weighted { value: friend.sample, weight });
        }
    }

    if candidates.is_empty() {
        let fitting: Vec<usize> = (0..samples.len())
            .filter(|&i| samples[i].length() <= limit)
            .collect();
        if fitting.is_empty() {
            return Err(Error::Capacity(format!(
                "no sample fits remaining capacity {limit}"
            )));
        }
        return Ok(*uniform_choice(&fitting, rng)?);
    }

    Ok(weighted_choice(&candidates, rng)?.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompositionContext;
    use crate::elements::RhythmDocument;
    use crate::samples::{Friend, generate_library};
    use crate::sequencer::generate_tone_sequence;
    use crate::theory::{Mode, Tone, all_tones};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn prepared_context(rng: &mut StdRng, with_samples: bool) -> CompositionContext {
        let mut ctx = CompositionContext::new();
        let doc = RhythmDocument::builtin();
        ctx.bar_capacity = doc.bar.size;
        ctx.templates = doc.templates().unwrap();
        let primary = Tone::new(0, Mode::Major);
        ctx.primary_tone = Some(primary);
        ctx.tone_sequence =
            generate_tone_sequence(primary, &all_tones(), 0.3, rng).unwrap();
        if with_samples {
            ctx.samples =
                generate_library(primary, ctx.bar_capacity, &ctx.templates, rng).unwrap();
        }
        ctx
    }

    fn assert_bars_well_formed(ctx: &CompositionContext, expected: usize) {
        assert_eq!(ctx.bars.len(), expected);
        for bar in &ctx.bars {
            assert!(bar.tones.contains_key(&0));
            assert!(bar.tones.len() <= 2);
            let total: u32 = bar.notes.values().map(|n| n.length).sum();
            assert_eq!(total, bar.capacity, "bar not filled exactly: {bar}");
            for note in bar.notes.values() {
                assert!(note.finalized);
            }
        }
    }

    #[test]
    fn continuous_fills_every_bar_exactly() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ctx = prepared_context(&mut rng, false);
        assemble_bars(&mut ctx, AssemblyMode::Continuous, 16, &mut rng).unwrap();
        assert_bars_well_formed(&ctx, 16);
    }

    #[test]
    fn sample_reuse_fills_every_bar_exactly() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut ctx = prepared_context(&mut rng, true);
        assemble_bars(&mut ctx, AssemblyMode::SampleReuse, 16, &mut rng).unwrap();
        assert_bars_well_formed(&ctx, 16);
    }

    #[test]
    fn sample_reuse_without_library_is_not_found() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = prepared_context(&mut rng, false);
        assert!(matches!(
            assemble_bars(&mut ctx, AssemblyMode::SampleReuse, 4, &mut rng),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn empty_friend_list_falls_back_to_library() {
        // A library whose samples have no usable friends must still
        // assemble via the uniform fallback, not fail.
        let mut rng = StdRng::seed_from_u64(4);
        let mut ctx = prepared_context(&mut rng, true);
        for sample in &mut ctx.samples {
            sample.friends = Vec::new();
        }
        assemble_bars(&mut ctx, AssemblyMode::SampleReuse, 8, &mut rng).unwrap();
        assert_bars_well_formed(&ctx, 8);
    }

    #[test]
    fn oversized_friends_are_filtered_out() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ctx = prepared_context(&mut rng, true);
        // Point every friend edge at a full-bar sample; half-bar zones
        // must then fall back rather than overflow.
        let full = ctx
            .samples
            .iter()
            .position(|s| s.length() == ctx.bar_capacity);
        if let Some(full) = full {
            for sample in &mut ctx.samples {
                sample.friends = vec![Friend { sample: full, weight: 1.0 }];
            }
        }
        assemble_bars(&mut ctx, AssemblyMode::SampleReuse, 8, &mut rng).unwrap();
        assert_bars_well_formed(&ctx, 8);
    }

    #[test]
    fn continuous_same_seed_same_bars() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ctx = prepared_context(&mut rng, false);
            assemble_bars(&mut ctx, AssemblyMode::Continuous, 12, &mut rng).unwrap();
            ctx.bars
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn sample_reuse_same_seed_same_bars() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut ctx = prepared_context(&mut rng, true);
            assemble_bars(&mut ctx, AssemblyMode::SampleReuse, 12, &mut rng).unwrap();
            ctx.bars
        };
        assert_eq!(run(43), run(43));
    }
}
