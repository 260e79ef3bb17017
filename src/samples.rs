// Sequence samples: short, reusable, pre-pitched note runs.
//
// The library generates a handful of half-bar and full-bar samples
// against the primary tone, resolving every pitch with the shared
// per-note logic. After generation each sample gets a weighted "friend"
// list — other samples that plausibly follow it, plus a discounted
// self-loop for immediate repetition. Friends are indices into the
// library vector; the graph is the basis for sample-mode bar assembly.

use crate::choice::{Weighted, weighted_choice};
use crate::elements::RhythmTemplate;
use crate::error::{Error, Result};
use crate::note::{Note, resolve_pitch};
use crate::theory::Tone;
use rand::Rng;

/// A weighted successor edge in the friend graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Friend {
    /// Index of the successor sample in the library.
    pub sample: usize,
    pub weight: f64,
}

/// An ordered run of notes generated against one reference tone. The
/// notes are immutable once generated; transposition always returns a
/// fresh list.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSample {
    pub tone: Tone,
    pub notes: Vec<Note>,
    pub friends: Vec<Friend>,
}

impl SequenceSample {
    pub fn length(&self) -> u32 {
        self.notes.iter().map(|n| n.length).sum()
    }

    /// The sample's notes remapped into another tonal context. The
    /// original notes are never mutated.
    pub fn transposed_notes(&self, target: Tone) -> Vec<Note> {
        self.notes
            .iter()
            .map(|note| {
                let mut copy = note.clone();
                copy.transpose(self.tone, target);
                copy
            })
            .collect()
    }
}

/// Generate the sample library: 6..=10 samples, each targeting half a
/// bar (weight 0.8) or a full bar (weight 0.2), filled from the rhythm
/// templates and pitched against the primary tone. The very first note
/// of the very first sample anchors the whole composition on the
/// primary root; the running previous note is carried across samples.
pub fn generate_library(
    primary: Tone,
    bar_capacity: u32,
    templates: &[RhythmTemplate],
    rng: &mut impl Rng,
) -> Result<Vec<SequenceSample>> {
    let count = rng.random_range(6..=10);
    let mut samples: Vec<SequenceSample> = Vec::with_capacity(count);
    let mut prev: Option<Note> = None;

    for _ in 0..count {
        let targets = [
            Weighted { value: bar_capacity / 2, weight: 0.8 },
            Weighted { value: bar_capacity, weight: 0.2 },
        ];
        let target = weighted_choice(&targets, rng)?.value;

        let mut notes = Vec::new();
        let mut remaining = target;
        while remaining > 0 {
            let fitting: Vec<Weighted<&RhythmTemplate>> = templates
                .iter()
                .filter(|t| t.length <= remaining)
                .map(|t| Weighted { value: t, weight: t.probability })
                .collect();
            if fitting.is_empty() {
                return Err(Error::Capacity(format!(
                    "no rhythm template fits remaining sample budget {remaining}"
                )));
            }
            let template = weighted_choice(&fitting, rng)?.value;
            for template_note in &template.notes {
                let mut note = template_note.clone();
                resolve_pitch(&mut note, prev.as_ref(), primary, rng)?;
                if prev.is_none() || !note.is_silent {
                    prev = Some(note.clone());
                }
                notes.push(note);
            }
            remaining -= template.length;
        }

        samples.push(SequenceSample {
            tone: primary,
            notes,
            friends: Vec::new(),
        });
    }

    build_friend_graph(&mut samples, rng);
    Ok(samples)
}

/// Wire the friend graph: per sample, a few uniform picks of successors
/// with weights in (0,1), plus a self-loop discounted below 0.4 for
/// immediate repetition.
fn build_friend_graph(samples: &mut [SequenceSample], rng: &mut impl Rng) {
    let count = samples.len();
    for index in 0..count {
        let mut friends = Vec::new();
        let links = rng.random_range(2..=4);
        for _ in 0..links {
            let other = rng.random_range(0..count);
            if other != index {
                friends.push(Friend {
                    sample: other,
                    weight: rng.random::<f64>(),
                });
            }
        }
        friends.push(Friend {
            sample: index,
            weight: 0.4 * rng.random::<f64>(),
        });
        samples[index].friends = friends;
    }
}
