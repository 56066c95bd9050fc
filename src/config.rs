//! Configuration for vscode-bisect.
//!
//! Loaded from an explicit path, `.vscode-bisect.yml` in the current directory,
//! or `~/.config/vscode-bisect/vscode-bisect.yml`, falling back to defaults.
//! Command-line flags override individual values afterwards.

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: EndpointsConfig,
    pub workspace: WorkspaceConfig,
    pub launch: LaunchConfig,
    pub perf: PerfConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Base URL of the update service (commit catalog and archive downloads)
    pub update_base: String,
    /// Hosted web endpoint used by the remote runtime
    pub remote_url: String,
    /// HTTP timeout for catalog requests
    pub request_timeout_ms: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            update_base: "https://update.code.visualstudio.com".to_string(),
            remote_url: "https://insiders.vscode.dev".to_string(),
            request_timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root for cached builds and scratch data (default: ~/.vscode-bisect)
    pub root: Option<PathBuf>,
}

impl WorkspaceConfig {
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(format!(".{}", PROJECT_NAME))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// How long to wait for the web server readiness line
    pub ready_timeout_ms: u64,
    /// Grace period between terminate and kill when stopping a build
    pub stop_timeout_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 60000,
            stop_timeout_ms: 5000,
        }
    }
}

impl LaunchConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    /// Samples taken per build; the fastest one is kept
    pub runs: u32,
    /// Deadline for a single sample
    pub timeout_ms: u64,
    /// Startup time above which a build is judged bad automatically
    pub threshold_ms: Option<u64>,
    /// Retries for a build that produced no sample before it is judged bad
    pub max_retries: u32,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            runs: 3,
            timeout_ms: 60000,
            threshold_ms: None,
            max_retries: 2,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .vscode-bisect.yml in current directory
    /// 3. ~/.config/vscode-bisect/vscode-bisect.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project config
        let project_config = PathBuf::from(format!(".{}.yml", PROJECT_NAME));
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load {}: {}", project_config.display(), e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(PROJECT_NAME).join(format!("{}.yml", PROJECT_NAME));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Reject values that would make a session meaningless
    pub fn validate(&self) -> Result<()> {
        if self.perf.runs == 0 {
            bail!("perf.runs must be at least 1");
        }
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
