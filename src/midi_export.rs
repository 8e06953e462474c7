//! Standard MIDI File export of the selected pattern.

use std::fs;
use std::path::{Path, PathBuf};

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::notes;
use crate::pattern::Pattern;
use crate::tempo::Tempo;

pub const TICKS_PER_BEAT: u16 = 480;
pub const VELOCITY: u8 = 100;
const TICKS_PER_STEP: u32 = TICKS_PER_BEAT as u32 / 4;

/// One exported note, in seconds from the start of the bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportNote {
    pub step:     usize,
    pub key:      u8,
    pub time:     f64,
    pub duration: f64,
}

/// Notes for every non-empty, resolvable slot in step order.
pub fn events(pattern: &Pattern, tempo: Tempo) -> Vec<ExportNote> {
    let sps = tempo.seconds_per_step();
    pattern.slots().iter().enumerate()
        .filter_map(|(step, slot)| {
            let note = slot.as_ref()?;
            match notes::midi_number(note) {
                Ok(key) => Some(ExportNote { step, key, time: step as f64 * sps, duration: sps }),
                Err(e) => {
                    warn!(step, pattern = pattern.id, "not exported: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Single-track SMF bytes for `pattern` at `tempo`.
pub fn encode(pattern: &Pattern, tempo: Tempo) -> Result<Vec<u8>> {
    let notes = events(pattern, tempo);
    if notes.is_empty() {
        return Err(Error::MidiExport(format!("pattern '{}' has no notes", pattern.id)));
    }

    // (tick, is_note_on, key); offs sort before ons at the same tick
    let mut timeline: Vec<(u32, bool, u8)> = Vec::with_capacity(notes.len() * 2);
    for n in &notes {
        let on = n.step as u32 * TICKS_PER_STEP;
        timeline.push((on, true, n.key));
        timeline.push((on + TICKS_PER_STEP, false, n.key));
    }
    timeline.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

    let micros_per_beat = (60_000_000.0 / tempo.bpm()).round() as u32;
    let mut track = vec![
        meta(MetaMessage::TrackName(pattern.name.as_bytes())),
        meta(MetaMessage::Tempo(u24::new(micros_per_beat.min(0x00ff_ffff)))),
        meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
    ];

    let channel = u4::new(0);
    let mut last = 0u32;
    for (tick, is_on, key) in timeline {
        let key = u7::new(key);
        let message = if is_on {
            MidiMessage::NoteOn { key, vel: u7::new(VELOCITY) }
        } else {
            MidiMessage::NoteOff { key, vel: u7::new(0) }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last),
            kind:  TrackEventKind::Midi { channel, message },
        });
        last = tick;
    }
    track.push(meta(MetaMessage::EndOfTrack));

    let smf = Smf {
        header: Header::new(Format::SingleTrack, Timing::Metrical(u15::new(TICKS_PER_BEAT))),
        tracks: vec![track],
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Writes `<pattern id>.midi` into `dir`, creating it if needed.
pub fn write_to(dir: &Path, pattern: &Pattern, tempo: Tempo) -> Result<PathBuf> {
    let bytes = encode(pattern, tempo)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.midi", pattern.id));
    fs::write(&path, bytes)?;
    info!(path = %path.display(), bpm = tempo.bpm(), "MIDI exported");
    Ok(path)
}

fn meta(message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(message) }
}
