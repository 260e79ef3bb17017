// Notes: timed, pitched events and the melodic next-pitch model.
//
// A `Note` starts life as a rhythmic placeholder cloned out of a template
// (length, glyph, silence/decoration flags) and acquires its pitch during
// resolution. `next_pitch_candidates` is the single most important
// algorithm in the system: it ranks the scale pitches of the current tone
// by scale-step distance from the previous note and assigns the fixed
// melodic-interval weights that every pitch placement funnels through.
//
// `resolve_pitch` is the shared per-note resolution used by both the
// sample generator and the continuous bar assembler.

use crate::choice::{Weighted, weighted_choice};
use crate::error::Result;
use crate::theory::{NOTE_NAMES, Mode, Tone};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;

/// Default melodic register bounds and reach, in absolute pitch.
pub const MELODIC_LOW: i32 = 52;
pub const MELODIC_HIGH: i32 = 84;
pub const NEIGHBOR_GAP: i32 = 12;

/// Octave anchoring the composition's first note and all transposition
/// deltas to a tone's root.
pub const ANCHOR_OCTAVE: i32 = 5;
/// Octave of the single repair candidate returned when the previous
/// pitch has fallen outside the current tone's scale.
pub const REPAIR_OCTAVE: i32 = 6;

/// Selection weight per scale-step distance from the previous note.
/// Seconds dominate; distances 7 and 8 carry no weight and are dropped.
fn step_weight(delta: usize) -> f64 {
    match delta {
        0 => 0.5,
        1 => 2.0,
        2 => 0.2,
        3 => 0.5,
        4 => 0.5,
        5 => 0.1,
        6 => 0.1,
        _ => 0.0,
    }
}

/// A single timed event. Mutable while its pitch is being resolved,
/// frozen once `finalized` is set — after that the pitch must not change
/// (transposition always operates on clones, never on the original).
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Absolute pitch. Defaults to middle C until resolved.
    pub pitch: i32,
    /// All notes are equally loud.
    pub velocity: u8,
    /// Duration in bar units.
    pub length: u32,
    pub is_silent: bool,
    /// Decoration notes may only land on strongly consonant pitches.
    pub is_decoration: bool,
    /// Display glyph carried over from the source rhythm template.
    pub glyph: String,
    pub finalized: bool,
}

impl Note {
    pub fn new(length: u32, glyph: &str) -> Self {
        Note {
            pitch: 60,
            velocity: 127,
            length,
            is_silent: false,
            is_decoration: false,
            glyph: glyph.to_string(),
            finalized: false,
        }
    }

    /// Pitch class of the current pitch.
    pub fn pitch_class(&self) -> i32 {
        self.pitch.rem_euclid(12)
    }

    /// In-scale pitches within reach of this note: the window
    /// `[max(low, pitch-gap), min(high, pitch+gap))` intersected with the
    /// tone's scale.
    pub fn neighbor_pitches(&self, tone: Tone, low: i32, high: i32, gap: i32) -> BTreeSet<i32> {
        let lo = low.max(self.pitch - gap);
        let hi = high.min(self.pitch + gap);
        tone.scale_pitches()
            .into_iter()
            .filter(|&p| p >= lo && p < hi)
            .collect()
    }

    /// Reachable pitches restricted further to the strongly consonant
    /// set — the candidate pool for decoration notes.
    pub fn harmonic_neighbor_pitches(&self, tone: Tone, low: i32, high: i32) -> BTreeSet<i32> {
        let harmonic = tone.harmonic_pitches();
        self.neighbor_pitches(tone, low, high, NEIGHBOR_GAP)
            .into_iter()
            .filter(|p| harmonic.contains(p))
            .collect()
    }

    /// Rank every scale pitch of `tone` by scale-step distance from this
    /// note's position in the sorted scale list, keeping candidates
    /// within 8 steps and a positive weight.
    ///
    /// If the current pitch is not in the scale at all (the harmonic
    /// context changed under the melody), the single repair candidate is
    /// the tone's root in the repair octave, at weight 1.
    pub fn next_pitch_candidates(&self, tone: Tone) -> Vec<Weighted<i32>> {
        let scale: Vec<i32> = tone.scale_pitches().into_iter().collect();
        let Some(position) = scale.iter().position(|&p| p == self.pitch) else {
            return vec![Weighted {
                value: tone.pitch_in_octave(REPAIR_OCTAVE),
                weight: 1.0,
            }];
        };

        let mut candidates = Vec::new();
        for (index, &pitch) in scale.iter().enumerate() {
            let delta = position.abs_diff(index);
            if delta > 8 {
                continue;
            }
            let weight = step_weight(delta);
            if weight > 0.0 {
                candidates.push(Weighted { value: pitch, weight });
            }
        }
        candidates
    }

    /// Shift this note's pitch from one tonal context to another: a
    /// linear shift by the root difference in the anchor octave, then a
    /// modal correction so the result stays idiomatic to the destination
    /// mode instead of landing on an out-of-scale leading-tone artifact.
    pub fn transpose(&mut self, from: Tone, to: Tone) {
        self.pitch += to.pitch_in_octave(ANCHOR_OCTAVE) - from.pitch_in_octave(ANCHOR_OCTAVE);
        let delta = self.pitch.rem_euclid(12) - to.pitch_class as i32;
        if from.mode == Mode::Minor && to.mode == Mode::Major && (delta == 8 || delta == 3) {
            self.pitch += 1;
        }
        if from.mode == Mode::Major && to.mode == Mode::Minor && (delta == 9 || delta == 4) {
            self.pitch -= 1;
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.glyph,
            NOTE_NAMES[self.pitch.rem_euclid(12) as usize],
            self.pitch.div_euclid(12) + 1
        )
    }
}

/// Resolve one note's pitch against a harmonic context.
///
/// `prev == None` marks the start of the whole composition: the note is
/// anchored to the tone's root in the anchor octave, silent or not (the
/// anchor check deliberately precedes the silence check). A silent note
/// is finalized with no pitch and must not become the next "previous
/// note" — callers skip it when threading `prev`.
///
/// Decoration notes draw from the next-pitch candidates restricted to
/// consonant neighbours; plain notes draw from the candidates minus the
/// tone's forbidden set. Either pool may legitimately intersect to
/// nothing, in which case the pitch falls back to the tone's root in the
/// anchor octave rather than failing the run.
pub fn resolve_pitch(
    note: &mut Note,
    prev: Option<&Note>,
    tone: Tone,
    rng: &mut impl Rng,
) -> Result<()> {
    let Some(prev) = prev else {
        note.pitch = tone.pitch_in_octave(ANCHOR_OCTAVE);
        note.finalized = true;
        return Ok(());
    };

    if note.is_silent {
        note.finalized = true;
        return Ok(());
    }

    let candidates = prev.next_pitch_candidates(tone);
    let pool: Vec<Weighted<i32>> = if note.is_decoration {
        let consonant = prev.harmonic_neighbor_pitches(tone, MELODIC_LOW, MELODIC_HIGH);
        candidates
            .into_iter()
            .filter(|c| consonant.contains(&c.value))
            .collect()
    } else {
        let forbidden = tone.forbidden_pitches();
        candidates
            .into_iter()
            .filter(|c| !forbidden.contains(&c.value))
            .collect()
    };

    note.pitch = if pool.is_empty() {
        tone.pitch_in_octave(ANCHOR_OCTAVE)
    } else {
        weighted_choice(&pool, rng)?.value
    };
    note.finalized = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn c_major() -> Tone {
        Tone::new(0, Mode::Major)
    }

    #[test]
    fn neighbor_pitches_stay_in_window_and_scale() {
        let mut note = Note::new(8, "♩");
        note.pitch = 60;
        let neighbors = note.neighbor_pitches(c_major(), MELODIC_LOW, MELODIC_HIGH, NEIGHBOR_GAP);
        let scale = c_major().scale_pitches();
        for p in &neighbors {
            assert!((52..72).contains(p), "pitch {p} outside window");
            assert!(scale.contains(p));
        }
        assert!(neighbors.contains(&60));
        assert!(neighbors.contains(&64));
        // 61 (C#) is not in C major.
        assert!(!neighbors.contains(&61));
    }

    #[test]
    fn harmonic_neighbors_are_consonant() {
        let mut note = Note::new(8, "♩");
        note.pitch = 60;
        let harmonic = c_major().harmonic_pitches();
        for p in note.harmonic_neighbor_pitches(c_major(), MELODIC_LOW, MELODIC_HIGH) {
            assert!(harmonic.contains(&p));
        }
    }

    #[test]
    fn next_pitch_candidates_weight_by_step_distance() {
        let mut note = Note::new(8, "♩");
        note.pitch = 60; // C5, in scale
        let candidates = note.next_pitch_candidates(c_major());
        // The note itself gets the prime weight.
        let same = candidates.iter().find(|c| c.value == 60).unwrap();
        assert_eq!(same.weight, 0.5);
        // One scale step up (D5 = 62) gets the dominant second weight.
        let second = candidates.iter().find(|c| c.value == 62).unwrap();
        assert_eq!(second.weight, 2.0);
        // Nothing beyond 6 scale steps survives.
        for c in &candidates {
            assert!(c.weight > 0.0);
        }
    }

    #[test]
    fn out_of_scale_pitch_yields_single_repair_candidate() {
        let mut note = Note::new(8, "♩");
        note.pitch = 61; // C# — not in C major
        let candidates = note.next_pitch_candidates(c_major());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, c_major().pitch_in_octave(REPAIR_OCTAVE));
        assert_eq!(candidates[0].weight, 1.0);
    }

    #[test]
    fn transpose_round_trip_same_mode_is_identity() {
        let g = Tone::new(7, Mode::Major);
        let mut note = Note::new(8, "♩");
        note.pitch = 64;
        note.transpose(c_major(), g);
        assert_eq!(note.pitch, 71);
        note.transpose(g, c_major());
        assert_eq!(note.pitch, 64);
    }

    #[test]
    fn transpose_minor_to_major_raises_modal_artifacts() {
        let am = Tone::new(9, Mode::Minor);
        let c = c_major();
        let mut note = Note::new(8, "♩");
        // 77 shifts to 68 (offset 8 from C), which the correction raises.
        note.pitch = 77;
        note.transpose(am, c);
        assert_eq!(note.pitch, 69);
    }

    #[test]
    fn transpose_major_to_minor_lowers_modal_artifacts() {
        let c = c_major();
        let cm = Tone::new(0, Mode::Minor);
        // Root stays put.
        let mut note = Note::new(8, "♩");
        note.pitch = 60;
        note.transpose(c, cm);
        assert_eq!(note.pitch, 60);
        // The major third (offset 4) is lowered to the minor third.
        let mut note = Note::new(8, "♩");
        note.pitch = 64;
        note.transpose(c, cm);
        assert_eq!(note.pitch, 63);
        // The major sixth (offset 9) is lowered to the minor sixth.
        let mut note = Note::new(8, "♩");
        note.pitch = 69;
        note.transpose(c, cm);
        assert_eq!(note.pitch, 68);
    }

    #[test]
    fn resolve_anchors_first_note_to_tone_root() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut note = Note::new(8, "♩");
        resolve_pitch(&mut note, None, c_major(), &mut rng).unwrap();
        assert_eq!(note.pitch, c_major().pitch_in_octave(ANCHOR_OCTAVE));
        assert!(note.finalized);
    }

    #[test]
    fn resolve_silent_note_finalizes_without_pitch() {
        let mut rng = StdRng::seed_from_u64(5);
        let prev = {
            let mut n = Note::new(8, "♩");
            n.pitch = 60;
            n
        };
        let mut note = Note::new(8, "♪");
        note.is_silent = true;
        let before = note.pitch;
        resolve_pitch(&mut note, Some(&prev), c_major(), &mut rng).unwrap();
        assert!(note.finalized);
        assert_eq!(note.pitch, before);
    }

    #[test]
    fn resolved_plain_notes_avoid_forbidden_pitches() {
        let mut rng = StdRng::seed_from_u64(11);
        let forbidden = c_major().forbidden_pitches();
        let mut prev = Note::new(8, "♩");
        prev.pitch = 60;
        for _ in 0..200 {
            let mut note = Note::new(8, "♩");
            resolve_pitch(&mut note, Some(&prev), c_major(), &mut rng).unwrap();
            assert!(
                !forbidden.contains(&note.pitch),
                "plain note resolved onto forbidden pitch {}",
                note.pitch
            );
            prev = note;
        }
    }

    #[test]
    fn resolved_decoration_notes_are_consonant() {
        let mut rng = StdRng::seed_from_u64(13);
        let harmonic = c_major().harmonic_pitches();
        let mut prev = Note::new(8, "♩");
        prev.pitch = 60;
        for _ in 0..200 {
            let mut note = Note::new(8, "♩");
            note.is_decoration = true;
            resolve_pitch(&mut note, Some(&prev), c_major(), &mut rng).unwrap();
            // Either a consonant choice or the explicit root fallback.
            assert!(
                harmonic.contains(&note.pitch)
                    || note.pitch == c_major().pitch_in_octave(ANCHOR_OCTAVE)
            );
            prev = note;
        }
    }

    #[test]
    fn display_format() {
        let mut note = Note::new(8, "♩");
        note.pitch = 60;
        assert_eq!(note.to_string(), "♩C6");
    }
}
