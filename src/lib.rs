// Melody Generator
//
// A procedural melody generator with harmonic accompaniment. A seeded run
// picks a primary tone and a "sadness" bias, walks a short harmonic
// progression, fills bars with rhythm-template notes pitched by weighted
// stepwise motion, and writes the result to a Standard MIDI File. Two
// assembly strategies exist: continuous per-note generation, and reuse of
// a small library of pre-pitched sequence samples chained through a
// weighted friend graph.
//
// Architecture:
// - theory.rs: Tones (pitch class + mode), triads, scales, harmonic and
//   forbidden pitch sets, complement/alternative tone relations
// - note.rs: Notes, stepwise-motion candidate weighting, transposition,
//   the shared pitch-resolution routine
// - choice.rs: Weighted and uniform random selection
// - bar.rs: Fixed-capacity bars of offset-keyed notes and tone zones
// - elements.rs: The rhythm-element document (JSON) and its compiled-in
//   default, expanded into note templates
// - sequencer.rs: The tone progression and the minor-mode bias
// - samples.rs: The sequence-sample library and its friend graph
// - assemble.rs: Bar assembly, continuous and sample-reuse
// - context.rs: The composition context and the staged pipeline
// - midi.rs: MIDI file output from assembled bars
// - error.rs: The crate error type
//
// The generator is deterministic given a seed, supporting reproducible
// output.

pub mod assemble;
pub mod bar;
pub mod choice;
pub mod context;
pub mod elements;
pub mod error;
pub mod midi;
pub mod note;
pub mod samples;
pub mod sequencer;
pub mod theory;
