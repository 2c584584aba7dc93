//! gesture_probe: run the classifier over a detection stream and print
//! every mode transition with the features that caused it.
//!
//! ```text
//! gesture_probe < recorded_detections.jsonl
//! gesture_probe python3 hand_detect.py        # live detector subprocess
//! ```

use std::io::{self, BufReader};

use hand_gesture::{
    classify, spawn_landmark_source, AppMode, DetectorProcess, GestureClassifier,
    GestureThresholds, HandFeatures, HandState, JsonLinesSource,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              Hand Gesture Probe                          ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let rx = match args.split_first() {
        Some((program, rest)) => {
            println!("  Source: detector `{}`", program);
            spawn_landmark_source(DetectorProcess::spawn(program, rest)?)
        }
        None => {
            println!("  Source: stdin (one detection JSON object per line)");
            spawn_landmark_source(JsonLinesSource::new(BufReader::new(io::stdin())))
        }
    };
    println!();

    let thresholds = GestureThresholds::default();
    let mut classifier = GestureClassifier::new(thresholds);
    let mut hand = HandState::default();
    let mut mode = AppMode::default();
    let mut frames = 0usize;
    let mut changes = 0usize;

    for frame in rx {
        frames += 1;
        if let Some(change) = classifier.process(&frame, &mut hand, mode) {
            changes += 1;
            mode = change.to;
            match hand.landmarks.as_ref().map(HandFeatures::from_landmarks) {
                Some(f) => println!(
                    "  [{:>10.1} ms]  {:<7} → {:<7}  idx={:.3} mid={:.3} ring={:.3} pinky={:.3} pinch={:.3} avg={:.3}",
                    frame.timestamp_ms, change.from, change.to,
                    f.index, f.middle, f.ring, f.pinky, f.pinch, f.average_extension(),
                ),
                None => println!("  [{:>10.1} ms]  {} → {}", frame.timestamp_ms, change.from, change.to),
            }
        } else if let Some(f) = hand.landmarks.as_ref().map(HandFeatures::from_landmarks) {
            if classify(&f, &thresholds).is_none() {
                log::debug!("ambiguous hand at {:.1} ms (avg={:.3})", frame.timestamp_ms, f.average_extension());
            }
        }
    }

    println!();
    println!("  {} frames, {} mode changes, final mode {}", frames, changes, mode);
    Ok(())
}
