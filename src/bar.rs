// Bars: fixed-capacity timelines of tone zones and placed notes.
//
// Both mappings are keyed by offset-within-bar. `tones` marks where the
// harmonic context changes (offset 0 is always present once a bar is in
// use); `notes` holds the contiguous, non-overlapping note sequence.
// A fully populated bar satisfies `sum(note.length) == capacity` exactly —
// the assembler never truncates, it fails with a capacity error instead.

use crate::error::{Error, Result};
use crate::note::Note;
use crate::theory::Tone;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    /// Total duration in bar units.
    pub capacity: u32,
    /// Harmonic-context zones, keyed by offset.
    pub tones: BTreeMap<u32, Tone>,
    /// Placed notes, keyed by offset. Offsets are contiguous with the
    /// note lengths: no gaps, no overlaps.
    pub notes: BTreeMap<u32, Note>,
}

impl Bar {
    pub fn new(capacity: u32) -> Self {
        Bar {
            capacity,
            tones: BTreeMap::new(),
            notes: BTreeMap::new(),
        }
    }

    /// Unused duration after the last placed note.
    pub fn space_left(&self) -> u32 {
        match self.notes.iter().next_back() {
            None => self.capacity,
            Some((offset, note)) => self.capacity - (offset + note.length),
        }
    }

    pub fn is_full(&self) -> bool {
        self.space_left() == 0
    }

    /// Append a note at the next free offset. A note longer than the
    /// remaining space is a capacity error, never a silent truncation.
    pub fn append_note(&mut self, note: Note) -> Result<()> {
        let space = self.space_left();
        if note.length > space {
            return Err(Error::Capacity(format!(
                "note of length {} does not fit remaining space {}",
                note.length, space
            )));
        }
        self.notes.insert(self.capacity - space, note);
        Ok(())
    }

    /// The tone governing a given offset: the zone at the offset itself
    /// or the nearest one before it (floor lookup).
    pub fn tone_at(&self, offset: u32) -> Result<Tone> {
        if self.tones.is_empty() {
            return Err(Error::NotFound("bar has no tone zones".into()));
        }
        self.tones
            .range(..=offset)
            .next_back()
            .map(|(_, tone)| *tone)
            .ok_or_else(|| Error::NotFound(format!("no tone zone at or before offset {offset}")))
    }

    /// The note at a given offset, or the first one after it (ceiling
    /// lookup).
    pub fn note_at_or_after(&self, offset: u32) -> Result<&Note> {
        if self.notes.is_empty() {
            return Err(Error::NotFound("bar has no notes".into()));
        }
        self.notes
            .range(offset..)
            .next()
            .map(|(_, note)| note)
            .ok_or_else(|| Error::NotFound(format!("no note at or after offset {offset}")))
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "| ")?;
        for note in self.notes.values() {
            write!(f, "{note} ")?;
        }
        let zones: Vec<String> = self.tones.values().map(|t| t.to_string()).collect();
        write!(f, "{}|", zones.join("/"))
    }
}
