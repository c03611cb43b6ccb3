//! finger_keys: command-line entry point.

use clap::Parser;
use finger_keys::app::run;
use finger_keys::config::{AppConfig, Cli, Command, SourceKind};
use finger_keys::error::AppError;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn dispatch() -> Result<(), AppError> {
    match Cli::parse().into_command()? {
        Command::PrintTable(cfg) => {
            let table = cfg.build_table()?.to_config();
            let json = serde_json::to_string_pretty(&table)
                .map_err(|e| AppError::Config(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }
        Command::Run(cfg) => {
            banner(&cfg);
            run(cfg)
        }
    }
}

fn banner(cfg: &AppConfig) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║              Finger Keys — finger-chord keyboard             ║");
    eprintln!("╚══════════════════════════════════════════════════════════════╝");
    eprintln!();

    match cfg.source {
        SourceKind::Sim   => eprintln!("  Mode: Keyboard simulation  (1–5 toggle fingers, Q quits)"),
        SourceKind::Stdin => eprintln!("  Mode: Pose estimator on stdin"),
        SourceKind::Leap  => eprintln!("  Mode: LeapMotion hardware"),
    }
    #[cfg(feature = "inject")]
    let typing = cfg.inject;
    #[cfg(not(feature = "inject"))]
    let typing = false;
    eprintln!("  Keys: {}", if typing { "typed into the focused window" } else { "printed" });
    eprintln!("  Cooldown: {:.2}s   Thumb rule: {}", cfg.cooldown_secs, cfg.thumb.name());
    eprintln!();
}
