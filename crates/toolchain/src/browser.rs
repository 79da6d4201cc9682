//! Headless-browser configuration read by the diagram renderer.

use std::path::PathBuf;

use serde::Serialize;
use wfgen_common::config::RenderConfig;
use wfgen_common::error::WfgenResult;

/// Sandbox flags required when the renderer runs in containers and CI.
const BROWSER_ARGS: [&str; 3] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<PathBuf>,
    pub args: Vec<String>,
}

impl BrowserConfig {
    pub fn from_render_config(config: &RenderConfig) -> Self {
        Self {
            executable_path: config.browser_executable.clone(),
            args: BROWSER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Write the browser configuration into the output directory and return its path.
pub fn write_browser_config(config: &RenderConfig) -> WfgenResult<PathBuf> {
    let path = config.browser_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&BrowserConfig::from_render_config(config))?;
    std::fs::write(&path, json)?;
    tracing::debug!(path = %path.display(), "Wrote renderer browser configuration");
    Ok(path)
}
