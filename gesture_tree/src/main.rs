//! gesture_tree: interactive entry point.

use std::path::PathBuf;

use clap::Parser;

use gesture_tree::app::{run, AppConfig, HandInput};
use tree_scene::SceneConfig;

#[derive(Parser, Debug)]
#[command(name = "gesture_tree", about = "Gesture-controlled particle Christmas tree")]
struct Cli {
    /// Small particle counts for slow machines
    #[arg(long)]
    quick: bool,

    /// Seed for a reproducible layout
    #[arg(long)]
    seed: Option<u64>,

    /// Photo to show (path or http(s) URL); repeatable
    #[arg(long = "photo", value_name = "PATH_OR_URL")]
    photos: Vec<String>,

    /// Load every image in this directory
    #[arg(long)]
    photos_dir: Option<PathBuf>,

    /// No mode-change chimes
    #[arg(long)]
    no_audio: bool,

    #[arg(long, default_value_t = gesture_tree::visualizer::WIN_W)]
    width: usize,

    #[arg(long, default_value_t = gesture_tree::visualizer::WIN_H)]
    height: usize,

    #[arg(long)]
    ornaments: Option<usize>,

    #[arg(long)]
    dust: Option<usize>,

    #[arg(long)]
    snow: Option<usize>,

    /// Use a LeapMotion controller instead of the keyboard
    #[cfg(feature = "leap")]
    #[arg(long)]
    leap: bool,

    /// External landmark detector and its arguments, e.g.
    /// `--detector python3 hand_detect.py`
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "CMD")]
    detector: Vec<String>,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let mut scene = SceneConfig::default();
        if self.quick {
            scene = scene.with_counts(400, 600, 80);
        }
        let ornaments = self.ornaments.unwrap_or(scene.ornament_count);
        let dust      = self.dust.unwrap_or(scene.dust_count);
        let snow      = self.snow.unwrap_or(scene.snowflake_count);
        scene = scene.with_counts(ornaments, dust, snow);
        scene.seed = self.seed;

        let hand_input = match self.detector.split_first() {
            Some((program, args)) => HandInput::Detector { program: program.clone(), args: args.to_vec() },
            None                  => HandInput::Simulated,
        };
        #[cfg(feature = "leap")]
        let hand_input = if self.leap { HandInput::Leap } else { hand_input };

        AppConfig {
            scene,
            hand_input,
            photos:     self.photos,
            photos_dir: self.photos_dir,
            audio:      !self.no_audio,
            width:      self.width,
            height:     self.height,
            ..AppConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().into_config();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Gesture Tree — Particle Christmas Tree                ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    match &cfg.hand_input {
        HandInput::Simulated => {
            println!("  Hand: keyboard simulation  (F/O/P/C/R/N poses, mouse moves the hand)");
        }
        HandInput::Detector { program, .. } => println!("  Hand: detector `{}`", program),
        #[cfg(feature = "leap")]
        HandInput::Leap => println!("  Hand: LeapMotion hardware"),
    }
    println!(
        "  Scene: {} ornaments, {} dust, {} snowflakes",
        cfg.scene.ornament_count, cfg.scene.dust_count, cfg.scene.snowflake_count,
    );
    println!("  Photos: {} given{}", cfg.photos.len(),
        cfg.photos_dir.as_ref().map(|d| format!(" + {}", d.display())).unwrap_or_default());
    println!();
    println!("  Opening window…");
    println!();

    run(cfg)
}
