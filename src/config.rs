use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Site settings from `blog.toml`. The file is optional and every field has
/// a default, so a bare checkout runs without any configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title, used for the page `<title>` on the list page.
    pub title: String,
    /// Directory holding templates, static assets, and `posts/*.md`.
    pub content_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            content_dir: "content".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
