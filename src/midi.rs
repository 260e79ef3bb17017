// MIDI export: assembled bars to a Standard MIDI File.
//
// Output is SMF Format 1 with three tracks: tempo, melody, and the
// accompaniment built from each bar's tone zones (every zone sounds its
// root in a low octave for an even share of the bar). A bar always spans
// four quarter notes regardless of its capacity in duration units.
//
// Uses the `midly` crate for serialization.

use crate::bar::Bar;
use crate::error::Result;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Every bar spans four quarter notes.
const QUARTERS_PER_BAR: u32 = 4;

/// Accompaniment sounds the tone roots in this octave.
const ACCOMPANIMENT_OCTAVE: i32 = 3;
const ACCOMPANIMENT_VELOCITY: u8 = 100;

/// Convert the bars to MIDI and write them to a file.
pub fn write_midi(bars: &[Bar], bar_capacity: u32, tempo_bpm: u16, path: &Path) -> Result<()> {
    let smf = bars_to_smf(bars, bar_capacity, tempo_bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Convert the bars to an in-memory SMF.
pub fn bars_to_smf(bars: &[Bar], bar_capacity: u32, tempo_bpm: u16) -> Smf<'static> {
    let ticks_per_unit = TICKS_PER_QUARTER as u32 * QUARTERS_PER_BAR / bar_capacity.max(1);

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo.
    let tempo_microseconds = 60_000_000 / tempo_bpm.max(1) as u32;
    let mut tempo_track: Track<'static> = Vec::new();
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Track 1: melody. Silent notes advance time without sounding.
    let melody_channel = u4::new(0);
    let mut melody: Track<'static> = Vec::new();
    melody.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Melody")),
    });
    let mut pending: u32 = 0;
    for bar in bars {
        for note in bar.notes.values() {
            let duration = note.length * ticks_per_unit;
            if note.is_silent {
                pending += duration;
                continue;
            }
            let key = u7::new(note.pitch.clamp(0, 127) as u8);
            melody.push(TrackEvent {
                delta: u28::new(pending),
                kind: TrackEventKind::Midi {
                    channel: melody_channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(note.velocity.min(127)),
                    },
                },
            });
            melody.push(TrackEvent {
                delta: u28::new(duration),
                kind: TrackEventKind::Midi {
                    channel: melody_channel,
                    message: MidiMessage::NoteOff { key, vel: u7::new(0) },
                },
            });
            pending = 0;
        }
    }
    melody.push(TrackEvent {
        delta: u28::new(pending),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(melody);

    // Track 2: accompaniment. Each tone zone sounds its root for an even
    // share of the bar.
    let accompaniment_channel = u4::new(1);
    let mut accompaniment: Track<'static> = Vec::new();
    accompaniment.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Accompaniment")),
    });
    for bar in bars {
        let zones = bar.tones.len().max(1) as u32;
        let zone_ticks = bar.capacity / zones * ticks_per_unit;
        for tone in bar.tones.values() {
            let key = u7::new(tone.pitch_in_octave(ACCOMPANIMENT_OCTAVE).clamp(0, 127) as u8);
            accompaniment.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: accompaniment_channel,
                    message: MidiMessage::NoteOn {
                        key,
                        vel: u7::new(ACCOMPANIMENT_VELOCITY),
                    },
                },
            });
            accompaniment.push(TrackEvent {
                delta: u28::new(zone_ticks),
                kind: TrackEventKind::Midi {
                    channel: accompaniment_channel,
                    message: MidiMessage::NoteOff { key, vel: u7::new(0) },
                },
            });
        }
    }
    accompaniment.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(accompaniment);

    smf
}
