//! User-facing settings read from the `[[sources]]`, `[labels]` and
//! `[theme]` sections of the configuration file.

use crate::core::alerts::AlertTexts;
use crate::ui::widgets::ButtonStyle;
use anyhow::Context;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Available UI themes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    #[default]
    Default,
    Blue,
    Green,
    Purple,
    Red,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Default => "Default (Cyan)",
            AppTheme::Blue => "Blue",
            AppTheme::Green => "Green",
            AppTheme::Purple => "Purple",
            AppTheme::Red => "Red",
        }
    }

    pub fn accent(&self) -> Color {
        match self {
            AppTheme::Default => Color::Cyan,
            AppTheme::Blue => Color::Blue,
            AppTheme::Green => Color::Green,
            AppTheme::Purple => Color::Magenta,
            AppTheme::Red => Color::Red,
        }
    }

    /// Fill drawn behind the caption while loading.
    fn fill(&self) -> Color {
        match self {
            AppTheme::Default => Color::Indexed(30),
            AppTheme::Blue => Color::Indexed(18),
            AppTheme::Green => Color::Indexed(22),
            AppTheme::Purple => Color::Indexed(54),
            AppTheme::Red => Color::Indexed(52),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Default => AppTheme::Blue,
            AppTheme::Blue => AppTheme::Green,
            AppTheme::Green => AppTheme::Purple,
            AppTheme::Purple => AppTheme::Red,
            AppTheme::Red => AppTheme::Default,
        }
    }

    pub fn button_style(&self) -> ButtonStyle {
        ButtonStyle {
            background: self.accent(),
            loading_fill: self.fill(),
            ..ButtonStyle::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    pub accent: AppTheme,
}

/// A downloadable archive offered in the source picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "Glide - Image Loading Library by BumpTech",
            "https://github.com/bumptech/glide/archive/refs/heads/master.zip",
        ),
        Source::new(
            "LoadApp - Current repository by Udacity",
            "https://github.com/udacity/nd940-c3-advanced-android-programming-project-starter/archive/master.zip",
        ),
        Source::new(
            "Retrofit - Type-safe HTTP client by Square, Inc",
            "https://github.com/square/retrofit/archive/refs/heads/master.zip",
        ),
    ]
}

/// Every user-visible text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub idle: String,
    pub loading: String,
    pub success: String,
    pub failed: String,
    pub alert_title: String,
    pub alert_success: String,
    pub alert_failure: String,
    pub alert_action: String,
    pub busy: String,
    pub no_selection: String,
    pub download_description: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            idle: "Download".to_string(),
            loading: "Downloading".to_string(),
            success: "Success".to_string(),
            failed: "Failed".to_string(),
            alert_title: "Download finished".to_string(),
            alert_success: "The project repository is downloaded".to_string(),
            alert_failure: "The project repository could not be downloaded".to_string(),
            alert_action: "Check the status".to_string(),
            busy: "A download is already in progress".to_string(),
            no_selection: "Please select the file to download".to_string(),
            download_description: "Downloading the selected repository".to_string(),
        }
    }
}

impl Labels {
    pub fn alert_texts(&self) -> AlertTexts {
        AlertTexts {
            title: self.alert_title.clone(),
            success: self.alert_success.clone(),
            failure: self.alert_failure.clone(),
            action: self.alert_action.clone(),
        }
    }

    pub fn outcome(&self, succeeded: bool) -> &str {
        if succeeded { &self.success } else { &self.failed }
    }
}

/// User-configurable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sources: Vec<Source>,
    pub labels: Labels,
    pub theme: ThemeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            labels: Labels::default(),
            theme: ThemeSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut settings: Settings = toml::from_str(content)?;
        if settings.sources.is_empty() {
            settings.sources = default_sources();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings = Settings::from_toml("verbose = 2\n").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sources.len(), 3);
    }

    #[test]
    fn partial_labels_and_theme_are_merged() {
        let settings = Settings::from_toml(
            r#"
[labels]
idle = "Fetch"

[theme]
accent = "purple"

[[sources]]
name = "Tiny"
url = "https://example.com/tiny.zip"
"#,
        )
        .unwrap();

        assert_eq!(settings.labels.idle, "Fetch");
        assert_eq!(settings.labels.loading, "Downloading");
        assert_eq!(settings.theme.accent, AppTheme::Purple);
        assert_eq!(settings.sources, vec![Source::new("Tiny", "https://example.com/tiny.zip")]);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetchdrop.toml");
        std::fs::write(&path, "[labels\n").unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn theme_cycles_back_to_default() {
        let mut theme = AppTheme::Default;
        for _ in 0..5 {
            theme = theme.next();
        }
        assert_eq!(theme, AppTheme::Default);
        assert_eq!(AppTheme::Red.button_style().background, Color::Red);
    }
}
