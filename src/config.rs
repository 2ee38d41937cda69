use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "MAILCAKE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub refresh_interval_secs: u64,
    pub filters: Filters,
    pub keybindings: Keybindings,
}

/// Backend category strings used by the category filter tabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub work_category: String,
    pub newsletter_category: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            work_category: "工作信件".to_string(),
            newsletter_category: "電子報".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub quit: Vec<String>,
    pub next_route: Vec<String>,
    pub prev_route: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub next_tab: Vec<String>,
    pub prev_tab: Vec<String>,
    pub toggle: Vec<String>,
    pub refresh: Vec<String>,
    pub resummarize: Vec<String>,
    pub view_email: Vec<String>,
    pub search: Vec<String>,
    pub toggle_selector: Vec<String>,
    pub logout: Vec<String>,
}

impl Default for Keybindings {
    fn default() -> Self {
        let keys = |k: &[&str]| k.iter().map(|s| s.to_string()).collect();
        Self {
            quit: keys(&["q", "ctrl-c"]),
            next_route: keys(&["Tab"]),
            prev_route: keys(&["BackTab"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            next_tab: keys(&["l", "Right"]),
            prev_tab: keys(&["h", "Left"]),
            toggle: keys(&["Enter", " "]),
            refresh: keys(&["r", "ctrl-r"]),
            resummarize: keys(&["s"]),
            view_email: keys(&["v"]),
            search: keys(&["/"]),
            toggle_selector: keys(&["m"]),
            logout: keys(&["X"]),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            refresh_interval_secs: 30,
            filters: Filters::default(),
            keybindings: Keybindings::default(),
        }
    }
}

pub fn parse_key_string(key_str: &str) -> (KeyCode, KeyModifiers) {
    // A lone "-" is the minus key, not a separator.
    if key_str == "-" {
        return (KeyCode::Char('-'), KeyModifiers::empty());
    }

    let mut parts: Vec<&str> = key_str.split('-').collect();
    let mut modifiers = KeyModifiers::empty();
    let base_key_str = parts.pop().unwrap_or("");

    for part in parts {
        match part.to_lowercase().as_str() {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "cmd" | "command" | "super" => modifiers.insert(KeyModifiers::SUPER),
            "meta" => modifiers.insert(KeyModifiers::META),
            _ => {}
        }
    }

    let mut chars = base_key_str.chars();
    let code = match base_key_str {
        "Backspace" => KeyCode::Backspace,
        "Enter" => KeyCode::Enter,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Tab" => KeyCode::Tab,
        "BackTab" => KeyCode::BackTab,
        "Esc" => KeyCode::Esc,
        _ => match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => KeyCode::Null,
        },
    };

    (code, modifiers)
}

pub fn matches_key(event: KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| {
        let (code, modifiers) = parse_key_string(b);
        event.code == code && event.modifiers.contains(modifiers)
    })
}

impl Config {
    /// Reads `settings.toml` from the working directory, then applies the
    /// `MAILCAKE_API_URL` override.
    pub fn load() -> Self {
        let mut config = Self::from_file("settings.toml");
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        config
    }

    fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}
