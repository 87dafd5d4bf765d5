//! Application configuration. Engine endpoint, log location, runner cadence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default account API endpoint handed to the engine.
pub const DEFAULT_API_URL: &str = "https://mail-api.proton.me";

/// Default cadence of the task runner's polling loop.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Account API endpoint. Read from ET_API_URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Directory for session logs. Defaults to `<executable dir>/logs`. Read from ET_LOG_DIR.
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Runner cycle in ms: spinner cadence and progress poll bound. Read from ET_POLL_INTERVAL_MS.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Simulated engine
    // ─────────────────────────────────────────────────────────────────────────
    /// Number of progress steps per simulated transfer. Read from ET_SIM_STEPS.
    #[serde(default)]
    pub sim_steps: Option<u32>,

    /// Delay between simulated progress steps in ms. Read from ET_SIM_STEP_DELAY_MS.
    #[serde(default)]
    pub sim_step_delay_ms: Option<u64>,

    /// Report a newer release at startup. Read from ET_SIM_NEWER_RELEASE.
    #[serde(default)]
    pub sim_newer_release: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("ET"));
        if let Ok(path) = std::env::var("ET_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Numeric overrides are parsed directly; invalid values keep the default.
        if let Ok(s) = std::env::var("ET_POLL_INTERVAL_MS") {
            if let Ok(ms) = s.parse::<u64>() {
                cfg.poll_interval_ms = Some(ms);
            }
        }
        if let Ok(s) = std::env::var("ET_SIM_STEPS") {
            if let Ok(n) = s.parse::<u32>() {
                cfg.sim_steps = Some(n);
            }
        }
        if let Ok(s) = std::env::var("ET_SIM_STEP_DELAY_MS") {
            if let Ok(ms) = s.parse::<u64>() {
                cfg.sim_step_delay_ms = Some(ms);
            }
        }
        if let Ok(s) = std::env::var("ET_SIM_NEWER_RELEASE") {
            if let Ok(newer) = s.parse::<bool>() {
                cfg.sim_newer_release = Some(newer);
            }
        }
        Ok(cfg)
    }

    pub fn api_url_or_default(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Runner cadence. Zero is bumped to 1 ms so the loop never spins.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(
            self.poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .max(1),
        )
    }

    /// Log directory: configured value, else `logs` next to the executable.
    pub fn log_dir_or_default(&self, exec_dir: &Path) -> PathBuf {
        self.log_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| exec_dir.join("logs"))
    }

    pub fn sim_steps_or_default(&self) -> u32 {
        self.sim_steps.unwrap_or(40).max(1)
    }

    pub fn sim_step_delay_or_default(&self) -> Duration {
        Duration::from_millis(self.sim_step_delay_ms.unwrap_or(150))
    }
}
