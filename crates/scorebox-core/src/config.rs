use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sandbox and scheduling knobs. Loaded from `scorebox.yaml` when
/// present, then overridden by `SCOREBOX_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    /// The single shared base image every submission runs inside.
    pub base_image: String,
    pub memory_bytes: i64,
    pub nano_cpus: i64,
    pub pids_limit: i64,
    /// Hard wall-clock ceiling for one container run.
    pub timeout_seconds: u64,
    /// How much of the log artifact is persisted per prediction.
    pub log_tail_chars: usize,
    pub sweep_interval_seconds: u64,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            base_image: "scorebox/base:latest".to_string(),
            memory_bytes: 512 * 1024 * 1024,
            nano_cpus: 1_000_000_000,
            pids_limit: 100,
            timeout_seconds: 20,
            log_tail_chars: 2000,
            sweep_interval_seconds: 3600,
        }
    }
}

impl EvalSettings {
    /// Settings resolution: file (if it exists) -> env overrides -> validate.
    pub fn resolve(path: &Path) -> anyhow::Result<Self> {
        let mut settings = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings: EvalSettings = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SCOREBOX_BASE_IMAGE") {
            self.base_image = v;
        }
        if let Ok(v) = std::env::var("SCOREBOX_MEMORY_BYTES") {
            if let Ok(n) = v.parse() {
                self.memory_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("SCOREBOX_TIMEOUT_SECONDS") {
            if let Ok(n) = v.parse() {
                self.timeout_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("SCOREBOX_PIDS_LIMIT") {
            if let Ok(n) = v.parse() {
                self.pids_limit = n;
            }
        }
        if let Ok(v) = std::env::var("SCOREBOX_SWEEP_INTERVAL_SECONDS") {
            if let Ok(n) = v.parse() {
                self.sweep_interval_seconds = n;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_image.trim().is_empty() {
            anyhow::bail!("settings error: base_image must not be empty");
        }
        if self.timeout_seconds == 0 {
            anyhow::bail!("settings error: timeout_seconds must be positive");
        }
        if self.memory_bytes < 16 * 1024 * 1024 {
            anyhow::bail!(
                "settings error: memory_bytes too low ({}), minimum 16 MiB",
                self.memory_bytes
            );
        }
        if self.pids_limit < 1 {
            anyhow::bail!("settings error: pids_limit must be at least 1");
        }
        Ok(())
    }
}

pub fn write_sample_settings(path: &Path) -> anyhow::Result<()> {
    std::fs::write(
        path,
        r#"# Scorebox sandbox settings
base_image: scorebox/base:latest
memory_bytes: 536870912
nano_cpus: 1000000000
pids_limit: 100
timeout_seconds: 20
log_tail_chars: 2000
sweep_interval_seconds: 3600
"#,
    )
    .with_context(|| format!("failed to write sample settings {}", path.display()))?;
    Ok(())
}
