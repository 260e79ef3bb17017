// Tonal model: pitch classes, modes, and the harmonic-set math.
//
// A `Tone` is a harmonic context — a root pitch class (0-11) plus a mode
// (major or minor), analogous to a key or chord root. Everything derived
// from it is a pure function of those two fields: the triad pitch classes,
// the absolute pitches considered in scale, the strongly consonant
// ("harmonic") absolute pitches, and their dissonant semitone neighbours
// ("forbidden"). These sets drive every pitch decision downstream.
//
// Absolute pitches are plain `i32` MIDI-style note numbers. The forbidden
// set legitimately starts at -1 (one semitone below a root at pitch class
// 0), so unsigned types are deliberately avoided.

use crate::choice::Weighted;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Note names used for display. German convention for the last entry
/// (H rather than B).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C♯", "D", "E♭", "E", "F", "F♯", "G", "G♯", "A", "B♭", "H",
];

/// Major/minor quality of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

/// A harmonic context: root pitch class plus mode. Immutable value type;
/// equality and ordering are by `(pitch_class, mode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tone {
    /// Root pitch class, 0-11 (0 = C).
    pub pitch_class: u8,
    pub mode: Mode,
}

impl Tone {
    pub fn new(pitch_class: u8, mode: Mode) -> Self {
        Tone {
            pitch_class: pitch_class % 12,
            mode,
        }
    }

    /// Absolute pitch of this tone's root in a given octave.
    pub fn pitch_in_octave(&self, octave: i32) -> i32 {
        octave * 12 + self.pitch_class as i32
    }

    /// The pitch classes of the tone's triad: root, fifth, and the
    /// mode-defining third (major 3rd or minor 3rd).
    pub fn triad_pitch_classes(&self) -> BTreeSet<i32> {
        let pc = self.pitch_class as i32;
        let third = match self.mode {
            Mode::Major => 4,
            Mode::Minor => 3,
        };
        BTreeSet::from([pc, (pc + 7) % 12, (pc + third) % 12])
    }

    /// All absolute pitches considered "in scale" for this tone, across
    /// octaves 0..8. Uses the harmonic-minor seventh: the leading tone
    /// (+11) is present in both modes.
    pub fn scale_pitches(&self) -> BTreeSet<i32> {
        let mut set = BTreeSet::new();
        for octave in 0..8 {
            let root = self.pitch_in_octave(octave);
            set.extend([root, root + 2, root + 5, root + 7, root + 11]);
            match self.mode {
                Mode::Major => set.extend([root + 4, root + 9]),
                Mode::Minor => set.extend([root + 3, root + 8]),
            }
        }
        set
    }

    /// Absolute pitches treated as strongly consonant: the triad
    /// transposed into every 12-semitone block up to pitch 99.
    pub fn harmonic_pitches(&self) -> BTreeSet<i32> {
        let pc = self.pitch_class as i32;
        let third = match self.mode {
            Mode::Major => 4,
            Mode::Minor => 3,
        };
        let mut set = BTreeSet::new();
        for block in (0..100).step_by(12) {
            set.extend([block + pc, block + pc + 7, block + pc + third]);
        }
        set
    }

    /// Dissonant semitone neighbours of the harmonic pitches, replicated
    /// every octave up to (exclusive) pitch 160. Non-decorative notes
    /// must avoid these.
    pub fn forbidden_pitches(&self) -> BTreeSet<i32> {
        let mut set = BTreeSet::new();
        for &t in &self.triad_pitch_classes() {
            let mut p = t - 1;
            while p < 160 {
                set.insert(p);
                p += 12;
            }
            let mut p = t + 1;
            while p < 160 {
                set.insert(p);
                p += 12;
            }
        }
        set
    }

    /// Tones reachable from this one by standard harmonic motion: the
    /// fifth (+7) always, the major third (+4) from a major tone, the
    /// minor third (+3) from a minor tone. Candidate mode is
    /// unconstrained — both qualities at a reachable pitch class count.
    pub fn complementary(&self, all: &[Tone]) -> Vec<Tone> {
        let pc = self.pitch_class as i32;
        let related = match self.mode {
            Mode::Major => (pc + 4) % 12,
            Mode::Minor => (pc + 3) % 12,
        };
        let fifth = (pc + 7) % 12;
        all.iter()
            .copied()
            .filter(|t| {
                let tpc = t.pitch_class as i32;
                tpc == fifth || tpc == related
            })
            .collect()
    }

    /// Tones for which this tone is itself a complement — the inverse of
    /// `complementary`, used to add reciprocal transition options.
    pub fn alternatives(&self, all: &[Tone]) -> Vec<Tone> {
        all.iter()
            .copied()
            .filter(|t| t.complementary(all).contains(self))
            .collect()
    }

    /// Transition candidates from this tone: complements at weight 1,
    /// alternatives at weight 0.75. A tone satisfying both relations
    /// appears twice, once per relation.
    pub fn next_tone_candidates(&self, all: &[Tone]) -> Vec<Weighted<Tone>> {
        let mut out = Vec::new();
        for t in self.complementary(all) {
            out.push(Weighted {
                value: t,
                weight: 1.0,
            });
        }
        for t in self.alternatives(all) {
            out.push(Weighted {
                value: t,
                weight: 0.75,
            });
        }
        out
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NOTE_NAMES[self.pitch_class as usize % 12])?;
        if self.mode == Mode::Minor {
            write!(f, "m")?;
        }
        Ok(())
    }
}

/// The full 24-tone universe: 12 pitch classes × 2 modes, in
/// `(pitch_class, mode)` order. This ordering is what makes uniform
/// tone picks deterministic under a fixed seed.
pub fn all_tones() -> Vec<Tone> {
    let mut tones = Vec::with_capacity(24);
    for pc in 0..12 {
        tones.push(Tone::new(pc, Mode::Major));
        tones.push(Tone::new(pc, Mode::Minor));
    }
    tones
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triad_contains_root_and_fifth() {
        for tone in all_tones() {
            let triad = tone.triad_pitch_classes();
            assert!(triad.contains(&(tone.pitch_class as i32)));
            assert!(triad.contains(&(((tone.pitch_class as i32) + 7) % 12)));
        }
    }

    #[test]
    fn c_major_triad() {
        let c = Tone::new(0, Mode::Major);
        assert_eq!(c.triad_pitch_classes(), BTreeSet::from([0, 4, 7]));
    }

    #[test]
    fn a_minor_triad() {
        let am = Tone::new(9, Mode::Minor);
        assert_eq!(am.triad_pitch_classes(), BTreeSet::from([9, 4, 0]));
    }

    #[test]
    fn c_major_harmonic_pitches_low_octaves() {
        let c = Tone::new(0, Mode::Major);
        let harmonic = c.harmonic_pitches();
        for p in [0, 4, 7, 12, 16, 19, 24] {
            assert!(harmonic.contains(&p), "expected {p} to be harmonic");
        }
        for p in [1, 3, 5, 6, 8, 11] {
            assert!(!harmonic.contains(&p), "expected {p} not to be harmonic");
        }
    }

    #[test]
    fn harmonic_and_forbidden_are_disjoint() {
        for tone in all_tones() {
            let harmonic = tone.harmonic_pitches();
            let forbidden = tone.forbidden_pitches();
            assert!(
                harmonic.is_disjoint(&forbidden),
                "harmonic and forbidden overlap for {tone}"
            );
        }
    }

    #[test]
    fn forbidden_brackets_the_root() {
        let c = Tone::new(0, Mode::Major);
        let forbidden = c.forbidden_pitches();
        // One semitone either side of every triad member, every octave.
        assert!(forbidden.contains(&-1));
        assert!(forbidden.contains(&1));
        assert!(forbidden.contains(&11));
        assert!(forbidden.contains(&13));
    }

    #[test]
    fn scale_uses_harmonic_minor_seventh() {
        let am = Tone::new(9, Mode::Minor);
        let scale = am.scale_pitches();
        // A3 = 45; G#4 = 56 (root + 11, the raised leading tone).
        assert!(scale.contains(&45));
        assert!(scale.contains(&56));
        // Natural minor seventh (G4 = 55) is absent.
        assert!(!scale.contains(&55));
    }

    #[test]
    fn complementary_of_c_major() {
        let all = all_tones();
        let c = Tone::new(0, Mode::Major);
        let compl = c.complementary(&all);
        // G (fifth) and E (major third), both qualities each.
        assert_eq!(compl.len(), 4);
        assert!(compl.iter().all(|t| t.pitch_class == 7 || t.pitch_class == 4));
    }

    #[test]
    fn alternatives_invert_complements() {
        let all = all_tones();
        let g = Tone::new(7, Mode::Major);
        // C major reaches G major via the fifth, so C major must be an
        // alternative of G major.
        let alts = g.alternatives(&all);
        assert!(alts.contains(&Tone::new(0, Mode::Major)));
    }

    #[test]
    fn display_names() {
        assert_eq!(Tone::new(0, Mode::Major).to_string(), "C");
        assert_eq!(Tone::new(9, Mode::Minor).to_string(), "Am");
        assert_eq!(Tone::new(11, Mode::Major).to_string(), "H");
    }

    #[test]
    fn all_tones_is_sorted_and_complete() {
        let tones = all_tones();
        assert_eq!(tones.len(), 24);
        let mut sorted = tones.clone();
        sorted.sort();
        assert_eq!(tones, sorted);
    }
}
