use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::layout_engine::geometry::{MinimumSize, Viewport};
use crate::layout_engine::resize::DEFAULT_RESIZE_STEP;
use crate::model::window_type::TERMINAL_WELCOME;

const MAX_WORKSPACES: usize = 32;
const MAX_DEBOUNCE_MS: u64 = 60_000;

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitdesk")
}

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("splitdesk")
        .join("config.toml")
}

fn default_debounce_ms() -> u64 { 500 }
fn default_min_width() -> f64 { 300.0 }
fn default_min_height() -> f64 { 200.0 }
fn default_resize_step() -> f64 { DEFAULT_RESIZE_STEP }
fn default_viewport_width() -> f64 { 1920.0 }
fn default_viewport_height() -> f64 { 1080.0 }
fn default_workspace_count() -> usize { 4 }
fn default_welcome() -> String { TERMINAL_WELCOME.to_string() }
fn default_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("ex".to_string(), "explorer".to_string())])
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Quiet period before a changed session is written to storage.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Where session data is stored; defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            data_dir: None,
        }
    }
}

impl Settings {
    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    pub fn data_dir(&self) -> PathBuf { self.data_dir.clone().unwrap_or_else(data_dir) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            issues.push(format!(
                "debounce_ms ({}) must not exceed {}",
                self.debounce_ms, MAX_DEBOUNCE_MS
            ));
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default = "default_min_width")]
    pub min_window_width: f64,
    #[serde(default = "default_min_height")]
    pub min_window_height: f64,
    #[serde(default = "default_resize_step")]
    pub resize_step: f64,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_window_width: default_min_width(),
            min_window_height: default_min_height(),
            resize_step: default_resize_step(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl LayoutSettings {
    pub fn minimum_size(&self) -> MinimumSize {
        MinimumSize {
            width: self.min_window_width,
            height: self.min_window_height,
        }
    }

    pub fn viewport(&self) -> Viewport { Viewport::new(self.viewport_width, self.viewport_height) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (name, value) in [
            ("min_window_width", self.min_window_width),
            ("min_window_height", self.min_window_height),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                issues.push(format!("{name} must be a positive number, got {value}"));
            }
        }
        if !(self.resize_step > 0.0 && self.resize_step <= 0.5) {
            issues.push(format!(
                "resize_step ({}) must be greater than 0 and at most 0.5",
                self.resize_step
            ));
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    #[serde(default = "default_workspace_count")]
    pub count: usize,
    #[serde(default)]
    pub names: Vec<String>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            count: default_workspace_count(),
            names: Vec::new(),
        }
    }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.count == 0 {
            issues.push("workspaces.count must be at least 1".to_string());
        }
        if self.count > MAX_WORKSPACES {
            issues.push(format!("workspaces.count should not exceed {MAX_WORKSPACES}"));
        }
        if self.names.len() > self.count {
            issues.push("More workspace names provided than workspaces.count".to_string());
        }

        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TerminalSettings {
    #[serde(default = "default_welcome")]
    pub welcome: String,
    /// Short forms resolved when a name is not a registered command or alias.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            aliases: default_aliases(),
        }
    }
}

impl TerminalSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (alias, target) in &self.aliases {
            if alias.trim().is_empty() {
                issues.push(format!("Alias for '{target}' has an empty name"));
            }
            if target.trim().is_empty() {
                issues.push(format!("Alias '{alias}' has an empty target"));
            }
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
    #[serde(default)]
    pub terminal: TerminalSettings,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, otherwise returns the default config.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("Invalid config: {}", e.message()),
        }
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.settings.validate());
        issues.extend(self.layout.validate());
        issues.extend(self.workspaces.validate());
        issues.extend(self.terminal.validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_file_matches_default_config() {
        let parsed = Config::parse(include_str!("../../splitdesk.default.toml")).unwrap();
        assert_eq!(parsed, Config::default());
        assert!(parsed.validate().is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.workspaces.count, 4);
        assert_eq!(cfg.layout.minimum_size(), MinimumSize::default());
        assert_eq!(cfg.settings.debounce(), Duration::from_millis(500));
        assert_eq!(cfg.terminal.aliases.get("ex").map(String::as_str), Some("explorer"));
    }

    #[test]
    fn test_partial_sections() {
        let cfg = Config::parse(
            r#"
            [layout]
            viewport_width = 1000
            viewport_height = 800.0

            [workspaces]
            count = 2
            names = ["code", "notes"]
        "#,
        )
        .unwrap();
        assert_eq!(cfg.layout.viewport(), Viewport::new(1000.0, 800.0));
        assert_eq!(cfg.layout.resize_step, 0.05);
        assert_eq!(cfg.workspaces.names, vec!["code", "notes"]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = Config::parse("[layout]\nmin_window_depth = 3\n").unwrap_err();
        assert!(err.to_string().starts_with("Invalid config"));
    }

    #[test]
    fn test_workspace_settings_validation_zero_and_names() {
        let settings = WorkspaceSettings {
            count: 0,
            names: vec!["a".into()],
        };
        let issues = settings.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("at least 1"));
        assert!(issues[1].contains("More workspace names"));
    }

    #[test]
    fn test_workspace_settings_validation_too_many() {
        let settings = WorkspaceSettings { count: 100, names: vec![] };
        assert_eq!(settings.validate().len(), 1);
    }

    #[test]
    fn test_layout_settings_validation() {
        let layout = LayoutSettings {
            min_window_width: 0.0,
            resize_step: 0.75,
            ..LayoutSettings::default()
        };
        let issues = layout.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("min_window_width"));
        assert!(issues[1].starts_with("resize_step"));
    }

    #[test]
    fn test_terminal_and_settings_validation() {
        let mut cfg = Config::default();
        cfg.terminal.aliases.insert("".into(), "help".into());
        cfg.terminal.aliases.insert("x".into(), " ".into());
        cfg.settings.debounce_ms = 120_000;
        assert_eq!(cfg.validate().len(), 3);
    }

    #[test]
    fn test_save_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.workspaces.count = 6;
        cfg.settings.data_dir = Some(dir.path().join("data"));
        cfg.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), cfg);
        assert_eq!(Config::read_or_default(&dir.path().join("missing.toml")).unwrap(), Config::default());
    }
}
