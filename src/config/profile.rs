use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-site defaults loaded from a YAML file. Command-line flags win.
///
/// ```yaml
/// executable: /opt/pipeline/bin/xmlpipe
/// pipe_dir: /run/pipectl
/// connect_timeout_ms: 30000
/// log: /var/log/pipeline.log
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub executable: Option<String>,
    pub pipe_dir: Option<PathBuf>,
    pub connect_timeout_ms: Option<u64>,
    pub log: Option<String>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read profile '{}'", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid profile '{}'", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
