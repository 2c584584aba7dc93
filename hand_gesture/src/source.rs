//! Landmark sources: anything that produces [`DetectionFrame`]s.
//!
//! Every source runs on its own thread and delivers immutable frames over an
//! `mpsc` channel. Consumers don't need to know whether frames came from a
//! detector subprocess, a recorded file, or the keyboard simulator.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::GestureError;
use crate::landmark::DetectionFrame;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`DetectionFrame`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    /// Produce frames until the input ends or the receiver hangs up.
    fn run(self: Box<Self>, tx: Sender<DetectionFrame>);
}

/// Spawn a landmark source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<DetectionFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource: one detection per line
// ════════════════════════════════════════════════════════════════════════════

/// Reads detections as JSON lines (see [`DetectionFrame::from_json_line`]).
///
/// Blank lines are ignored; malformed lines are logged and skipped so that a
/// single bad frame never stalls tracking.
pub struct JsonLinesSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesSource { reader }
    }

    /// Read the next frame, skipping blank and malformed lines.
    /// `Ok(None)` at end of input.
    pub fn next_frame(&mut self) -> Result<Option<DetectionFrame>, GestureError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() { continue; }
            match DetectionFrame::from_json_line(trimmed) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e)    => log::warn!("[detector] skipping frame: {}", e),
            }
        }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn run(mut self: Box<Self>, tx: Sender<DetectionFrame>) {
        loop {
            match self.next_frame() {
                Ok(Some(frame)) => {
                    if tx.send(frame).is_err() { return; }
                }
                Ok(None) => {
                    log::info!("[detector] input ended");
                    return;
                }
                Err(e) => {
                    log::warn!("[detector] read failed: {}", e);
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorProcess: external landmark detector on stdout
// ════════════════════════════════════════════════════════════════════════════

/// An external hand-landmark detector (e.g. a MediaPipe script) that owns the
/// camera and prints `READY` followed by one detection JSON line per frame.
///
/// The reader thread only ever touches stdout. The child itself lives behind a
/// [`DetectorHandle`] so the frame thread can stop it without waiting for the
/// next line of output.
pub struct DetectorProcess {
    handle: DetectorHandle,
    lines:  JsonLinesSource<BufReader<ChildStdout>>,
}

impl DetectorProcess {
    /// Start `program` with `args` and wait for its `READY` line.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, GestureError> {
        log::info!("[detector] starting {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            GestureError::Io(std::io::Error::new(std::io::ErrorKind::Other, "detector stdout unavailable"))
        })?;
        let handle = DetectorHandle { child: Arc::new(Mutex::new(child)) };
        let mut reader = BufReader::new(stdout);

        let mut ready = String::new();
        if let Err(e) = reader.read_line(&mut ready) {
            handle.kill();
            return Err(e.into());
        }
        if ready.trim() != "READY" {
            handle.kill();
            return Err(GestureError::NotReady(ready.trim().to_string()));
        }

        log::info!("[detector] ready (pid {})", handle.id());
        Ok(DetectorProcess { handle, lines: JsonLinesSource::new(reader) })
    }

    /// A handle that can stop the child after the process has moved onto its
    /// reader thread.
    pub fn handle(&self) -> DetectorHandle {
        self.handle.clone()
    }
}

impl LandmarkSource for DetectorProcess {
    fn run(mut self: Box<Self>, tx: Sender<DetectionFrame>) {
        loop {
            match self.lines.next_frame() {
                Ok(Some(frame)) => {
                    if tx.send(frame).is_err() { return; }
                }
                Ok(None) => {
                    log::warn!("[detector] process closed its output");
                    return;
                }
                Err(e) => {
                    log::warn!("[detector] read failed: {}", e);
                    return;
                }
            }
        }
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        self.handle.kill();
    }
}

/// Shared ownership of a detector child process.
///
/// Killing the child closes its stdout, so a reader blocked on the next line
/// sees end of input and its thread exits.
#[derive(Clone, Debug)]
pub struct DetectorHandle {
    child: Arc<Mutex<Child>>,
}

impl DetectorHandle {
    pub fn id(&self) -> u32 {
        self.lock().id()
    }

    /// Kill and reap the child. Safe to call more than once.
    pub fn kill(&self) {
        let mut child = self.lock();
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        match child.kill() {
            Ok(()) => log::info!("[detector] stopped pid {}", child.id()),
            Err(e) => log::warn!("[detector] kill failed: {}", e),
        }
        let _ = child.wait();
    }

    /// False once the child has exited and been reaped.
    pub fn is_running(&self) -> bool {
        matches!(self.lock().try_wait(), Ok(None))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Child> {
        self.child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_line(ts: f64) -> String {
        let pts: Vec<String> = (0..21).map(|_| "[0.5,0.5,0]".to_string()).collect();
        format!("{{\"timestamp_ms\": {}, \"hands\": [{{\"landmarks\": [{}]}}]}}", ts, pts.join(","))
    }

    #[test]
    fn json_lines_skip_blank_and_bad_lines() {
        let input = format!("\n{}\nnot json\n{{\"timestamp_ms\": 2}}\n", hand_line(1.0));
        let mut src = JsonLinesSource::new(Cursor::new(input));
        let a = src.next_frame().unwrap().unwrap();
        let b = src.next_frame().unwrap().unwrap();
        assert_eq!(a.timestamp_ms, 1.0);
        assert_eq!(a.hands.len(), 1);
        assert_eq!(b.timestamp_ms, 2.0);
        assert!(b.hands.is_empty());
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn spawned_source_delivers_in_order() {
        let input = format!("{}\n{}\n{}\n", hand_line(1.0), hand_line(2.0), hand_line(3.0));
        let rx = spawn_landmark_source(JsonLinesSource::new(Cursor::new(input)));
        let stamps: Vec<f64> = rx.iter().map(|f| f.timestamp_ms).collect();
        assert_eq!(stamps, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_detector_binary_is_io_error() {
        let r = DetectorProcess::spawn("/nonexistent/hand-detector", &[]);
        assert!(matches!(r, Err(GestureError::Io(_))));
    }

    #[cfg(unix)]
    fn sleeping_detector() -> DetectorProcess {
        let args = vec!["-c".to_string(), "echo READY; exec sleep 30".to_string()];
        DetectorProcess::spawn("sh", &args).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn handle_stops_detector_blocked_on_read() {
        let detector = sleeping_detector();
        let handle = detector.handle();
        let rx = spawn_landmark_source(detector);
        assert!(handle.is_running());

        handle.kill();
        assert!(!handle.is_running());
        // Reader thread sees EOF and hangs up.
        assert!(rx.recv().is_err());
        handle.kill();
    }

    #[cfg(unix)]
    #[test]
    fn silent_detector_without_ready_is_rejected() {
        let args = vec!["-c".to_string(), "echo hello".to_string()];
        let r = DetectorProcess::spawn("sh", &args);
        assert!(matches!(r, Err(GestureError::NotReady(ref l)) if l == "hello"));
    }
}
