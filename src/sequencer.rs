// Tone sequencing: the harmonic progression of the piece.
//
// Starting from the chosen primary tone, each step draws the next tone
// from the candidates harmonically related to the last one — complements
// at full weight, reciprocal alternatives slightly discounted — biased by
// the run's "sadness": a per-run factor shifting probability mass toward
// minor-mode candidates. The resulting sequence is consumed cyclically by
// the bar assembler's tone zones.

use crate::choice::weighted_choice;
use crate::error::{Error, Result};
use crate::theory::{Mode, Tone};
use rand::Rng;

/// Draw the run's minor-mode bias ("sadness"), uniform in [0.15, 0.75).
pub fn draw_minor_bias(rng: &mut impl Rng) -> f64 {
    0.15 + rng.random::<f64>() * 0.6
}

/// Build the tone progression: the primary tone followed by 3..=7
/// harmonically reachable steps. Immediate repetition is possible only
/// when the last tone scores under one of the two relations.
pub fn generate_tone_sequence(
    primary: Tone,
    all: &[Tone],
    minor_bias: f64,
    rng: &mut impl Rng,
) -> Result<Vec<Tone>> {
    let steps = rng.random_range(3..=7);
    let mut sequence = vec![primary];
    let mut last = primary;
    for _ in 0..steps {
        let mut candidates = last.next_tone_candidates(all);
        if candidates.is_empty() {
            return Err(Error::EmptyDistribution(format!(
                "tone {last} has no harmonic successors"
            )));
        }
        for candidate in &mut candidates {
            candidate.weight *= match candidate.value.mode {
                Mode::Minor => minor_bias,
                Mode::Major => 1.0 - minor_bias,
            };
        }
        last = weighted_choice(&candidates, rng)?.value;
        sequence.push(last);
    }
    Ok(sequence)
}
