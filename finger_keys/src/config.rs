//! Application configuration: JSON file, then command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::warn;

use finger_code::{GestureTable, TableConfig, ThumbRule};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// SourceKind
// ════════════════════════════════════════════════════════════════════════════

/// Where landmark frames come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Keyboard-driven simulated hand in the window.
    #[default]
    Sim,
    /// JSON lines from an external pose estimator on stdin.
    Stdin,
    /// LeapMotion controller (`leap` feature).
    Leap,
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.  Every field has a default, so
/// a config file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Minimum seconds between two typed keys.
    pub cooldown_secs: f64,
    pub thumb:         ThumbRule,
    /// Hands classified per frame; extra detections are ignored.
    pub max_hands:     usize,
    /// Hands reported below this detection score are ignored.
    pub min_score:     f32,
    /// Inline gesture table.  Replaced by `table_path` when both are set.
    pub table:         Option<TableConfig>,
    pub table_path:    Option<PathBuf>,
    pub source:        SourceKind,
    /// No window; requires a non-simulated source.
    pub headless:      bool,
    /// Type into the focused window when built with `inject`.
    pub inject:        bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cooldown_secs: 1.0,
            thumb:         ThumbRule::TipLeft,
            max_hands:     1,
            min_score:     0.7,
            table:         None,
            table_path:    None,
            source:        SourceKind::Sim,
            headless:      false,
            inject:        true,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = read(path)?;
        serde_json::from_str(&text)
            .map_err(|source| AppError::Json { path: path.to_path_buf(), source })
    }

    pub fn cooldown(&self) -> Result<Duration, AppError> {
        Duration::try_from_secs_f64(self.cooldown_secs)
            .map_err(|_| AppError::Config(format!(
                "cooldown must be a non-negative number of seconds, got {}", self.cooldown_secs
            )))
    }

    /// The gesture table this configuration selects: `table_path`, else the
    /// inline `table`, else the built-in layout.
    pub fn build_table(&self) -> Result<GestureTable, AppError> {
        if let Some(path) = &self.table_path {
            if self.table.is_some() {
                warn!("both `table` and `table_path` set; using {}", path.display());
            }
            let text = read(path)?;
            return Ok(GestureTable::from_json(&text)?);
        }
        match &self.table {
            Some(cfg) => Ok(GestureTable::from_config(cfg)?),
            None      => Ok(GestureTable::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.cooldown()?;
        if self.max_hands == 0 {
            return Err(AppError::Config("max_hands must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(AppError::Config(format!("min_score must be in 0–1, got {}", self.min_score)));
        }
        if self.headless && self.source == SourceKind::Sim {
            return Err(AppError::Config("the simulated hand needs the window; use --stdin or --leap with --headless".into()));
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| AppError::Io { path: path.to_path_buf(), source })
}

// ════════════════════════════════════════════════════════════════════════════
// Command line
// ════════════════════════════════════════════════════════════════════════════

/// Command-line flags.  `--config` is loaded first; every other flag
/// overrides the value it names.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "finger_keys", version, about = "Finger-chord virtual keyboard")]
pub struct Cli {
    /// JSON application config
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON gesture table: {"entries": [{"fingers": "11000", "action": "f"}]}
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Minimum seconds between keys (default 1.0)
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub cooldown: Option<f64>,

    /// Thumb rule: tip-left, tip-right or by-hand (default tip-left)
    #[arg(long, value_name = "RULE")]
    pub thumb: Option<ThumbRule>,

    /// Read estimator JSON lines from stdin
    #[arg(long, conflicts_with = "leap")]
    pub stdin: bool,

    /// Read a LeapMotion controller (needs --features leap)
    #[arg(long)]
    pub leap: bool,

    /// No window (with --stdin or --leap)
    #[arg(long)]
    pub headless: bool,

    /// Print keys instead of typing them
    #[arg(long)]
    pub no_inject: bool,

    /// Print the gesture table as JSON and exit
    #[arg(long)]
    pub print_table: bool,
}

/// What the binary was asked to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Run(AppConfig),
    PrintTable(AppConfig),
}

impl Cli {
    /// Merge the flags over `--config` (or the defaults).
    pub fn into_command(self) -> Result<Command, AppError> {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None       => AppConfig::default(),
        };

        if let Some(path) = self.table    { cfg.table_path = Some(path); }
        if let Some(secs) = self.cooldown { cfg.cooldown_secs = secs; }
        if let Some(rule) = self.thumb    { cfg.thumb = rule; }
        if self.stdin     { cfg.source = SourceKind::Stdin; }
        if self.leap      { cfg.source = SourceKind::Leap; }
        if self.headless  { cfg.headless = true; }
        if self.no_inject { cfg.inject = false; }

        if self.print_table {
            return Ok(Command::PrintTable(cfg));
        }
        cfg.validate()?;
        Ok(Command::Run(cfg))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use finger_code::{Action, FingerState};

    fn cli(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("finger_keys").chain(line.split_whitespace()))
    }

    fn command(line: &str) -> Result<Command, AppError> {
        cli(line).unwrap().into_command()
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("finger_keys_{}_{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn stock_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.cooldown().unwrap(), Duration::from_secs(1));
        assert_eq!(cfg.max_hands, 1);
        assert_eq!(cfg.thumb, ThumbRule::TipLeft);
        assert_eq!(cfg.build_table().unwrap(), GestureTable::default());
    }

    #[test]
    fn no_args_runs_with_defaults() {
        assert_eq!(command("").unwrap(), Command::Run(AppConfig::default()));
    }

    #[test]
    fn flags_override() {
        match command("--stdin --headless --cooldown 0.25 --thumb by-hand --no-inject").unwrap() {
            Command::Run(cfg) => {
                assert_eq!(cfg.source, SourceKind::Stdin);
                assert!(cfg.headless);
                assert!(!cfg.inject);
                assert_eq!(cfg.cooldown().unwrap(), Duration::from_millis(250));
                assert_eq!(cfg.thumb, ThumbRule::ByHandedness);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn malformed_flags_are_rejected_by_the_parser() {
        assert!(cli("--cooldown").is_err());
        assert!(cli("--cooldown soon").is_err());
        assert!(cli("--thumb sideways").is_err());
        assert!(cli("--frobnicate").is_err());
        assert!(cli("--stdin --leap").is_err());
    }

    #[test]
    fn negative_cooldown_fails_validation() {
        assert_eq!(cli("--cooldown -1").unwrap().cooldown, Some(-1.0));
        assert!(matches!(command("--cooldown -1"), Err(AppError::Config(_))));
    }

    #[test]
    fn headless_sim_is_rejected() {
        assert!(matches!(command("--headless"), Err(AppError::Config(_))));
    }

    #[test]
    fn help_is_handled_by_clap() {
        let err = cli("--help").unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("--print-table"));
    }

    #[test]
    fn print_table_skips_validation() {
        assert!(matches!(command("--print-table --headless").unwrap(), Command::PrintTable(_)));
    }

    #[test]
    fn config_file_then_flags() {
        let path = temp_file("cfg.json", r#"{ "cooldown_secs": 2.0, "source": "stdin", "max_hands": 2 }"#);
        let line = format!("--cooldown 0.5 --config {}", path.display());
        match command(&line).unwrap() {
            Command::Run(cfg) => {
                assert_eq!(cfg.cooldown_secs, 0.5);
                assert_eq!(cfg.source, SourceKind::Stdin);
                assert_eq!(cfg.max_hands, 2);
                assert_eq!(cfg.min_score, 0.7);
            }
            other => panic!("unexpected {:?}", other),
        }
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_config_file_names_path() {
        let err = command("--config /nonexistent/finger_keys.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/finger_keys.json"));
    }

    #[test]
    fn inline_table_is_used() {
        let cfg: AppConfig = serde_json::from_str(r#"{
            "table": { "entries": [ { "fingers": "01100", "action": "space" } ] }
        }"#).unwrap();
        let t = cfg.build_table().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.lookup(FingerState::parse("01100").unwrap()), Action::Char(' '));
    }

    #[test]
    fn table_path_wins_over_inline() {
        let path = temp_file("table.json", r#"{ "entries": [ { "fingers": "00000", "action": "enter" } ] }"#);
        let cfg = AppConfig {
            table:      Some(TableConfig::default()),
            table_path: Some(path.clone()),
            ..AppConfig::default()
        };
        let t = cfg.build_table().unwrap();
        assert_eq!(t.lookup(FingerState::ALL_DOWN), Action::Enter);
        fs::remove_file(path).ok();
    }

    #[test]
    fn duplicate_table_entry_surfaces_as_table_error() {
        let cfg: AppConfig = serde_json::from_str(r#"{
            "table": { "entries": [ { "fingers": "10000", "action": "a" },
                                    { "fingers": "10000", "action": "b" } ] }
        }"#).unwrap();
        assert!(matches!(cfg.build_table(), Err(AppError::Table(_))));
    }
}
