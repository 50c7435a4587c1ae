//! CLI argument definitions for the Optik binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::{Path, PathBuf};

/// Optik: drive the mouse, scroll wheel and dictation with hand gestures.
#[derive(Parser, Debug)]
#[command(name = "optik", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Landmark recording to play back (JSON Lines, one detection per line).
    /// Use `-` to read a live detector's output from stdin.
    #[arg(short = 'r', long = "replay")]
    pub replay: PathBuf,

    /// Log intents instead of injecting them into the OS.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Target screen size as WIDTHxHEIGHT, or `auto` to query the primary display.
    #[arg(long = "screen", value_parser = parse_screen)]
    pub screen: Option<ScreenArg>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Print a JSON report to stdout for every frame that changed state or emitted intents.
    #[arg(long = "report")]
    pub report: bool,
}

/// Value of `--screen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenArg {
    Auto,
    Size { width: u32, height: u32 },
}

fn parse_screen(value: &str) -> Result<ScreenArg, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(ScreenArg::Auto);
    }
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if width == 0 || height == 0 {
        return Err("screen dimensions must be positive".to_string());
    }
    Ok(ScreenArg::Size { width, height })
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OPTIK_CONFIG env var > platform default (~/.optik/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OPTIK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    /// Whether the landmark stream comes from stdin rather than a file.
    pub fn replay_from_stdin(&self) -> bool {
        self.replay == Path::new("-")
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".optik").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".optik").join("config.toml");
    }
    PathBuf::from("config.toml")
}
