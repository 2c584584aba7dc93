//! Mode-change chimes.
//!
//! Every mode has a short tone. Tones are played on a MIDI output port from
//! a dedicated thread so the frame loop never waits on audio.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hand_gesture::AppMode;

const CHANNEL: u8 = 0;

// ════════════════════════════════════════════════════════════════════════════
// Tone: what a mode sounds like
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub waveform:     Waveform,
    pub duration:     Duration,
    /// Linear amplitude, 0.0–1.0.
    pub gain:         f32,
}

pub fn tone_for(mode: AppMode) -> Tone {
    let (frequency_hz, waveform) = match mode {
        AppMode::Tree    => (440.0, Waveform::Sine),
        AppMode::Scatter => (880.0, Waveform::Square),
        AppMode::Focus   => (660.0, Waveform::Triangle),
        AppMode::Gallery => (550.0, Waveform::Sawtooth),
    };
    Tone { frequency_hz, waveform, duration: Duration::from_millis(400), gain: 0.05 }
}

/// Nearest equal-tempered MIDI note (A4 = 440 Hz = 69).
pub fn midi_note(frequency_hz: f32) -> u8 {
    if !(frequency_hz > 0.0) {
        return 69;
    }
    let n = 69.0 + 12.0 * (frequency_hz / 440.0).log2();
    n.round().clamp(0.0, 127.0) as u8
}

/// General MIDI program whose timbre is closest to the waveform.
pub fn gm_program(waveform: Waveform) -> u8 {
    match waveform {
        Waveform::Sine     => 79, // Ocarina
        Waveform::Square   => 80, // Lead 1 (square)
        Waveform::Triangle => 73, // Flute
        Waveform::Sawtooth => 81, // Lead 2 (sawtooth)
    }
}

/// Map linear gain to note velocity on a perceptual (square-root) curve,
/// never silent.
pub fn gain_to_velocity(gain: f32) -> u8 {
    (gain.clamp(0.0, 1.0).sqrt() * 127.0).round().clamp(1.0, 127.0) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// ModeSink: whoever wants to hear about mode changes
// ════════════════════════════════════════════════════════════════════════════

pub trait ModeSink {
    fn mode_changed(&mut self, mode: AppMode);
}

/// Sink for `--no-audio`.
pub struct Silent;

impl ModeSink for Silent {
    fn mode_changed(&mut self, _mode: AppMode) {}
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: abstraction over midir / null
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

/// Open the first MIDI output port, preferring a softsynth.
/// Falls back to `NullOut` with a warning if none is usable.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("gesture_tree_chime") {
        Ok(m)  => m,
        Err(e) => {
            log::warn!("[chime] MIDI init error: {} — chimes disabled", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        log::warn!("[chime] no MIDI output ports found — chimes disabled");
        log::warn!("[chime] on Linux start `timidity -iA` or `fluidsynth` to hear them");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter()
        .position(|p| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    log::info!("[chime] opening MIDI port: {}", name);

    match midi_out.connect(port, "gesture-tree-chime") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            log::warn!("[chime] failed to connect: {} — chimes disabled", e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Chime: the playback thread
// ════════════════════════════════════════════════════════════════════════════

enum ChimeCommand {
    Play(Tone),
    Quit,
}

/// Handle to the chime thread. Dropping it stops the thread.
pub struct Chime {
    cmd_tx: Sender<ChimeCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Chime {
    /// Spawn the chime thread on the first available MIDI port.
    pub fn spawn() -> Self {
        Self::with_output(open_midi_output)
    }

    fn with_output<F>(open: F) -> Self
    where
        F: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ChimeCommand>();
        let handle = thread::spawn(move || chime_thread(open(), cmd_rx));
        Chime { cmd_tx, handle: Some(handle) }
    }

    pub fn play(&self, tone: Tone) {
        let _ = self.cmd_tx.send(ChimeCommand::Play(tone));
    }
}

impl ModeSink for Chime {
    fn mode_changed(&mut self, mode: AppMode) {
        self.play(tone_for(mode));
    }
}

impl Drop for Chime {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(ChimeCommand::Quit);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn chime_thread(mut midi: Box<dyn MidiOut>, cmd_rx: Receiver<ChimeCommand>) {
    let mut program = None;
    for cmd in cmd_rx {
        let tone = match cmd {
            ChimeCommand::Play(t) => t,
            ChimeCommand::Quit    => return,
        };
        let prog = gm_program(tone.waveform);
        if program != Some(prog) {
            midi.program_change(CHANNEL, prog);
            program = Some(prog);
        }
        let note = midi_note(tone.frequency_hz);
        midi.note_on(CHANNEL, note, gain_to_velocity(tone.gain));
        thread::sleep(tone.duration);
        midi.note_off(CHANNEL, note);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn each_mode_has_its_own_note() {
        let notes: Vec<u8> = AppMode::ALL.iter().map(|m| midi_note(tone_for(*m).frequency_hz)).collect();
        assert_eq!(notes, vec![69, 81, 76, 73]);
    }

    #[test]
    fn tones_are_short_and_quiet() {
        for m in AppMode::ALL {
            let t = tone_for(m);
            assert_eq!(t.duration, Duration::from_millis(400));
            assert_eq!(t.gain, 0.05);
        }
        assert_eq!(tone_for(AppMode::Focus).waveform, Waveform::Triangle);
    }

    #[test]
    fn velocity_curve() {
        assert_eq!(gain_to_velocity(1.0), 127);
        assert_eq!(gain_to_velocity(0.0), 1);
        assert_eq!(gain_to_velocity(0.05), 28);
    }

    #[test]
    fn bad_frequency_falls_back_to_a4() {
        assert_eq!(midi_note(0.0), 69);
        assert_eq!(midi_note(f32::NAN), 69);
        assert_eq!(midi_note(1.0e9), 127);
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(u8, u8, u8)>>>);

    impl MidiOut for Recorder {
        fn program_change(&mut self, _ch: u8, p: u8) {
            self.0.lock().unwrap().push((0xC0, p, 0));
        }
        fn note_on(&mut self, _ch: u8, n: u8, v: u8) {
            self.0.lock().unwrap().push((0x90, n, v));
        }
        fn note_off(&mut self, _ch: u8, n: u8) {
            self.0.lock().unwrap().push((0x80, n, 0));
        }
    }

    #[test]
    fn chime_thread_plays_program_then_note() {
        let rec = Recorder::default();
        let out = rec.clone();
        let mut chime = Chime::with_output(move || Box::new(out) as Box<dyn MidiOut>);
        chime.play(Tone { duration: Duration::from_millis(1), ..tone_for(AppMode::Scatter) });
        chime.mode_changed(AppMode::Scatter);
        drop(chime);

        let log = rec.0.lock().unwrap().clone();
        assert_eq!(log[0], (0xC0, 80, 0));
        assert_eq!(log[1], (0x90, 81, 28));
        assert_eq!(log[2], (0x80, 81, 0));
        // Same program again: no second program change.
        assert_eq!(log.iter().filter(|e| e.0 == 0xC0).count(), 1);
        assert_eq!(log.len(), 5);
    }
}
