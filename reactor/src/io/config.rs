//! Engine configuration stored in a TOML file (default `reactor.toml`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::checksum::{ChecksumValidator, KeyOrder};

/// Engine configuration (TOML).
///
/// Loaded once at startup and shared read-only afterwards. Missing fields
/// default to development values, except `secret_key`, which must be set
/// before [`EngineConfig::validate`] passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Key for state checksums. Must match whatever renders the pages.
    pub secret_key: String,

    /// Fail on unresolved paths, methods and assignment targets instead of
    /// skipping them.
    pub strict: bool,

    /// Directory of `<component>.html` templates.
    pub templates_dir: String,

    pub checksum: ChecksumConfig,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChecksumConfig {
    /// Key order used when serializing state for signing.
    pub key_order: KeyOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Live component instances kept before the least recently used is evicted.
    pub cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3002,
            cache_capacity: 1024,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            strict: false,
            templates_dir: "templates".to_string(),
            checksum: ChecksumConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            return Err(anyhow!("secret_key must be set"));
        }
        if self.templates_dir.trim().is_empty() {
            return Err(anyhow!("templates_dir must be non-empty"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must be non-empty"));
        }
        if self.server.cache_capacity == 0 {
            return Err(anyhow!("server.cache_capacity must be > 0"));
        }
        Ok(())
    }

    /// Checksum validator keyed with this config's secret.
    pub fn validator(&self) -> ChecksumValidator {
        ChecksumValidator::new(self.secret_key.clone(), self.checksum.key_order)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`. The result is
/// not validated, so callers can still fill in the secret from elsewhere.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EngineConfig) -> Result<()> {
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
