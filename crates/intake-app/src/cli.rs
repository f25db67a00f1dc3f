//! CLI argument definitions for the intake kiosk.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use intake_core::{CapturePolicy, Result};

/// Intake: voice-guided capture of client records.
#[derive(Parser, Debug)]
#[command(name = "intake", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// URL the finished record is POSTed to.
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Capture policy: prompt-then-listen or listen-immediately.
    #[arg(long = "policy")]
    pub policy: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > INTAKE_CONFIG env var > ~/.intake/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("INTAKE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the persistence endpoint.
    ///
    /// Priority: --endpoint flag > INTAKE_ENDPOINT env var > config file value.
    pub fn resolve_endpoint(&self, config_endpoint: &str) -> String {
        if let Some(ref e) = self.endpoint {
            return e.clone();
        }
        if let Ok(e) = std::env::var("INTAKE_ENDPOINT") {
            if !e.trim().is_empty() {
                return e;
            }
        }
        config_endpoint.to_string()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Resolve the capture policy.
    ///
    /// Priority: --policy flag > config file value.
    pub fn resolve_policy(&self, config_policy: CapturePolicy) -> Result<CapturePolicy> {
        match self.policy {
            Some(ref p) => p.parse(),
            None => Ok(config_policy),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".intake").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".intake").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse() {
        let args = CliArgs::try_parse_from([
            "intake",
            "-c",
            "/tmp/intake.toml",
            "--endpoint",
            "http://10.0.0.9/api/Registros",
            "-l",
            "debug",
            "--policy",
            "listen-immediately",
        ])
        .unwrap();

        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/intake.toml"));
        assert_eq!(
            args.resolve_endpoint("http://localhost:5016/api/Registros"),
            "http://10.0.0.9/api/Registros"
        );
        assert_eq!(args.resolve_log_level("info"), "debug");
        assert_eq!(
            args.resolve_policy(CapturePolicy::PromptThenListen).unwrap(),
            CapturePolicy::ListenImmediately
        );
    }

    #[test]
    fn test_config_values_used_without_flags() {
        let args = CliArgs::try_parse_from(["intake"]).unwrap();
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(
            args.resolve_policy(CapturePolicy::ListenImmediately).unwrap(),
            CapturePolicy::ListenImmediately
        );
    }

    #[test]
    fn test_bad_policy_flag() {
        let args = CliArgs::try_parse_from(["intake", "--policy", "sometimes"]).unwrap();
        assert!(args.resolve_policy(CapturePolicy::PromptThenListen).is_err());
    }

    #[test]
    fn test_default_config_path_file_name() {
        assert!(default_config_path().ends_with("config.toml"));
    }
}
