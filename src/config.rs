use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub page: PageConfig,
    pub font: FontConfig,
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub paper: String,
    pub numbers: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            paper: "a4".to_string(),
            numbers: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Body text size in points.
    pub size: u32,
    /// Font family name; the renderer default applies when unset.
    pub family: Option<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            size: 11,
            family: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub color: String,
    pub underline: bool,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            color: "#1a4f8b".to_string(),
            underline: true,
        }
    }
}

impl Config {
    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config =
            toml::from_str("[page]\nnumbers = true\n\n[font]\nsize = 12\n").unwrap();
        assert!(config.page.numbers);
        assert_eq!(config.page.paper, "a4");
        assert_eq!(config.font.size, 12);
        assert_eq!(config.links.color, "#1a4f8b");
        assert!(config.links.underline);
    }
}
