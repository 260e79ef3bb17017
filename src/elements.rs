// Rhythm-element documents: the source data for all rhythmic material.
//
// A document declares the bar capacity, a dictionary of named atomic note
// lengths, and a list of rhythmic sequence templates. Each template is a
// comma-separated list of atomic references, optionally prefixed `*` for
// a harmonic-decoration note or `#` for silence, plus a declared selection
// probability. Template lengths are derived, never declared.
//
// When no document is supplied the compiled-in default set is used.

use crate::error::{Error, Result};
use crate::note::Note;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RhythmDocument {
    pub bar: BarSpec,
    pub atomic: BTreeMap<String, AtomicSpec>,
    pub elements: Vec<ElementSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BarSpec {
    /// Bar capacity in duration units.
    pub size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtomicSpec {
    pub length: u32,
    pub representation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    pub sequence: String,
    pub probability: f64,
}

/// A parsed rhythmic sequence template: unpitched notes, the declared
/// selection probability, and the derived total length.
#[derive(Debug, Clone)]
pub struct RhythmTemplate {
    pub notes: Vec<Note>,
    pub probability: f64,
    pub length: u32,
}

impl RhythmDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The compiled-in template set. Bar capacity 32; every length is a
    /// multiple of the shortest template (4), so bar filling always
    /// terminates.
    pub fn builtin() -> Self {
        let mut atomic = BTreeMap::new();
        atomic.insert(
            "e".to_string(),
            AtomicSpec { length: 4, representation: "♪".to_string() },
        );
        atomic.insert(
            "q".to_string(),
            AtomicSpec { length: 8, representation: "♩".to_string() },
        );
        atomic.insert(
            "h".to_string(),
            AtomicSpec { length: 16, representation: "𝅗𝅥".to_string() },
        );

        let elements = [
            ("q,q,q,q", 1.0),
            ("q,*q,q,*q", 0.8),
            ("e,e,q,e,e,q", 1.2),
            ("h,*q,q", 0.7),
            ("q,e,e,#q,q", 0.9),
            ("e,e,e,e", 1.0),
            ("q,*e,e", 1.1),
            ("#e,e,q", 0.6),
            ("q,q", 1.0),
            ("e,*e", 0.8),
            ("e,e", 0.9),
            ("q", 0.5),
            ("e", 0.4),
            ("#e", 0.2),
        ]
        .into_iter()
        .map(|(sequence, probability)| ElementSpec {
            sequence: sequence.to_string(),
            probability,
        })
        .collect();

        RhythmDocument {
            bar: BarSpec { size: 32 },
            atomic,
            elements,
        }
    }

    /// Build the note sequences for every declared template.
    pub fn templates(&self) -> Result<Vec<RhythmTemplate>> {
        self.elements
            .iter()
            .map(|element| {
                let notes = notes_from_sequence(&self.atomic, &element.sequence)?;
                let length = notes.iter().map(|n| n.length).sum();
                Ok(RhythmTemplate {
                    notes,
                    probability: element.probability,
                    length,
                })
            })
            .collect()
    }
}

/// Expand one comma-separated sequence into unpitched notes.
fn notes_from_sequence(
    atomic: &BTreeMap<String, AtomicSpec>,
    sequence: &str,
) -> Result<Vec<Note>> {
    let mut notes = Vec::new();
    for part in sequence.split(',') {
        let part = part.trim();
        let is_decoration = part.starts_with('*');
        let is_silent = part.starts_with('#');
        let key = if is_decoration || is_silent {
            &part[1..]
        } else {
            part
        };
        let spec = atomic.get(key).ok_or_else(|| {
            Error::Document(format!("unknown atomic note '{key}' in sequence '{sequence}'"))
        })?;
        if spec.length == 0 {
            return Err(Error::Document(format!(
                "atomic note '{key}' must have a positive length"
            )));
        }
        let mut note = Note::new(spec.length, &spec.representation);
        note.is_decoration = is_decoration;
        note.is_silent = is_silent;
        notes.push(note);
    }
    Ok(notes)
}
