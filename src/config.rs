use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Environment variables checked, in order, for the Gemini API key.
pub const API_KEY_VARS: &[&str] = &["API_KEY", "VITE_API_KEY", "GEMINI_API_KEY"];

/// Display preference requested in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    /// Follow the terminal's color scheme.
    #[default]
    Auto,
    Dark,
    Light,
}

/// Application configuration, loaded from `debatbot.toml`.
///
/// `api_key` and `prefers_dark` are never read from the file: they come from
/// the process environment in [`AppConfig::load`] and can be set directly in
/// tests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: String,
    pub api_base_url: String,
    /// 0 disables the timeout.
    pub request_timeout_secs: u64,
    pub appearance: Appearance,
    pub log_dir: String,
    pub enable_dashboard: bool,
    pub dashboard_port: u16,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub prefers_dark: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            request_timeout_secs: 30,
            appearance: Appearance::Auto,
            log_dir: "logs".to_string(),
            enable_dashboard: false,
            dashboard_port: 3000,
            api_key: None,
            prefers_dark: false,
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./debatbot.toml` -> `~/debatbot.toml` -> defaults,
    /// then resolve the API key and color-scheme preference from the environment.
    pub fn load() -> Self {
        let mut cfg = Self::load_file();
        cfg.api_key = api_key_from(|name| std::env::var(name).ok());
        cfg.prefers_dark = prefers_dark_scheme(std::env::var("COLORFGBG").ok().as_deref());
        cfg
    }

    fn load_file() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("debatbot.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("debatbot.toml"));
        }
        paths
    }

    /// Initial value of the dark-mode flag.
    pub fn initial_dark_mode(&self) -> bool {
        match self.appearance {
            Appearance::Dark => true,
            Appearance::Light => false,
            Appearance::Auto => self.prefers_dark,
        }
    }
}

/// First non-empty value among [`API_KEY_VARS`].
pub fn api_key_from<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Interpret a `COLORFGBG` value ("fg;bg" or "fg;other;bg"). The background
/// is dark for ANSI indices 0-6 and 8.
pub fn prefers_dark_scheme(colorfgbg: Option<&str>) -> bool {
    let Some(value) = colorfgbg else {
        return false;
    };
    match value.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()) {
        Some(bg) => bg <= 6 || bg == 8,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.api_base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.appearance, Appearance::Auto);
        assert_eq!(cfg.log_dir, "logs");
        assert!(!cfg.enable_dashboard);
        assert_eq!(cfg.dashboard_port, 3000);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_deserialize() {
        let toml_str = r#"
            model = "gemini-2.0-flash"
            appearance = "dark"
        "#;
        let cfg: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.model, "gemini-2.0-flash");
        assert_eq!(cfg.appearance, Appearance::Dark);
        // Other fields should be defaults
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.dashboard_port, 3000);
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let cfg: AppConfig = toml::from_str(r#"api_key = "leaked""#).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_api_key_lookup_order() {
        let env: HashMap<&str, &str> =
            [("VITE_API_KEY", "vite"), ("GEMINI_API_KEY", "gemini")].into();
        let key = api_key_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(key.as_deref(), Some("vite"));

        let env: HashMap<&str, &str> = [("API_KEY", "plain"), ("VITE_API_KEY", "vite")].into();
        let key = api_key_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(key.as_deref(), Some("plain"));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let key = api_key_from(|name| (name == "API_KEY").then(|| "   ".to_string()));
        assert!(key.is_none());
        assert!(api_key_from(|_| None).is_none());
    }

    #[test]
    fn test_prefers_dark_scheme() {
        assert!(prefers_dark_scheme(Some("15;0")));
        assert!(prefers_dark_scheme(Some("15;default;8")));
        assert!(!prefers_dark_scheme(Some("0;15")));
        assert!(!prefers_dark_scheme(Some("garbage")));
        assert!(!prefers_dark_scheme(None));
    }

    #[test]
    fn test_initial_dark_mode() {
        let mut cfg = AppConfig {
            prefers_dark: true,
            ..AppConfig::default()
        };
        assert!(cfg.initial_dark_mode());
        cfg.appearance = Appearance::Light;
        assert!(!cfg.initial_dark_mode());
        cfg.appearance = Appearance::Dark;
        cfg.prefers_dark = false;
        assert!(cfg.initial_dark_mode());
    }
}
