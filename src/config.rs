//! Configuration file support for framewm.
//!
//! Loads settings from ~/.config/framewm/config.toml if it exists,
//! otherwise uses the built-in palette and metrics.
//!
//! Also provides `LayoutConfig` - the runtime configuration struct with
//! resolved color values and decoration metrics.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::frame::Chrome;

// =============================================================================
// Runtime Configuration (resolved values)
// =============================================================================

/// Runtime configuration with resolved color values.
///
/// Built from the file-based config types at startup and handed to the
/// frame builder.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Decoration border width
    pub border_width: u32,
    /// Title bar height
    pub title_height: u32,
    /// Side length of a title bar button
    pub button_size: u32,
    /// Gap between buttons and around the title text
    pub padding: u32,
    /// Height reserved at the top of the screen for a panel
    pub bar_height: u32,
    pub title_bar_color: u32,
    pub border_color: u32,
    pub background_color: u32,
    pub foreground_color: u32,
    pub close_color: u32,
    pub expand_color: u32,
    pub split_color: u32,
    pub button_border_color: u32,
    /// Font family for title text
    pub title_font: String,
    /// Font size in points
    pub title_font_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            title_height: 16,
            button_size: 8,
            padding: 4,
            bar_height: 20,
            title_bar_color: 0xeaffff,     // Pale cyan
            border_color: 0x55aaaa,        // Teal
            background_color: 0xffffea,    // Pale yellow
            foreground_color: 0x000000,    // Black
            close_color: 0xffaaaa,         // Pink
            expand_color: 0xeeee9e,        // Yellow
            split_color: 0x88cc88,         // Green
            button_border_color: 0x000000, // Black
            title_font: "monospace".to_string(),
            title_font_size: 9,
        }
    }
}

impl LayoutConfig {
    /// Resolve a file config, keeping the default for any unparseable color
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        let colors = &config.colors;
        let appearance = &config.appearance;

        let color = |value: &str, name: &str, fallback: u32| {
            parse_color(value).unwrap_or_else(|| {
                log::warn!("Invalid color {:?} for {}, using default", value, name);
                fallback
            })
        };

        Self {
            border_width: appearance.border_width,
            title_height: appearance.title_height,
            button_size: appearance.button_size,
            padding: appearance.padding,
            bar_height: appearance.bar_height,
            title_bar_color: color(&colors.title_bar, "title_bar", defaults.title_bar_color),
            border_color: color(&colors.border, "border", defaults.border_color),
            background_color: color(&colors.background, "background", defaults.background_color),
            foreground_color: color(&colors.foreground, "foreground", defaults.foreground_color),
            close_color: color(&colors.button_close, "button_close", defaults.close_color),
            expand_color: color(&colors.button_expand, "button_expand", defaults.expand_color),
            split_color: color(&colors.button_split, "button_split", defaults.split_color),
            button_border_color: color(
                &colors.button_border,
                "button_border",
                defaults.button_border_color,
            ),
            title_font: appearance.title_font.clone(),
            title_font_size: appearance.title_font_size,
        }
    }

    /// Decoration metrics used for frame geometry
    pub fn chrome(&self) -> Chrome {
        Chrome {
            border_width: self.border_width,
            title_height: self.title_height,
            button_size: self.button_size,
            padding: self.padding,
            bar_height: self.bar_height,
        }
    }
}

// =============================================================================
// File-based Configuration (TOML parsing)
// =============================================================================

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub appearance: AppearanceConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
    pub exec: ExecConfig,
}

/// Exec keybindings (key combo -> command to run)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExecConfig {
    #[serde(flatten)]
    pub bindings: HashMap<String, String>,
}

/// Decoration metrics and title font
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub border_width: u32,
    pub title_height: u32,
    pub button_size: u32,
    pub padding: u32,
    pub bar_height: u32,
    pub title_font: String,
    pub title_font_size: u32,
}

/// Color settings (hex strings like "#55aaaa")
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub title_bar: String,
    pub border: String,
    pub background: String,
    pub foreground: String,
    pub button_close: String,
    pub button_expand: String,
    pub button_split: String,
    pub button_border: String,
}

/// Keybinding configuration (strings like "Mod4+1")
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Option<String>,
    pub workspace_1: Option<String>,
    pub workspace_2: Option<String>,
    pub workspace_3: Option<String>,
    pub workspace_4: Option<String>,
    pub workspace_5: Option<String>,
    pub workspace_6: Option<String>,
    pub workspace_7: Option<String>,
    pub workspace_8: Option<String>,
    pub workspace_9: Option<String>,
}

/// Parsed keybinding (ready for X11 grab)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedBinding {
    pub keysym: u32,
    pub modifiers: u16,
}

/// Window manager action bound to a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WmAction {
    Spawn(String),
    /// Zero-based workspace index
    SwitchWorkspace(usize),
    Quit,
}

impl Config {
    /// Load config from default path (~/.config/framewm/config.toml)
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("framewm")
            .join("config.toml")
    }

    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Parse keybindings into action -> ParsedBinding map
    pub fn parse_keybindings(&self) -> HashMap<WmAction, ParsedBinding> {
        let mut bindings = HashMap::new();

        let mut insert = |action: WmAction, key_str: &Option<String>| {
            if let Some(s) = key_str {
                match parse_key_binding(s) {
                    Some(parsed) => {
                        bindings.insert(action, parsed);
                    }
                    None => log::warn!("Failed to parse keybinding: {}", s),
                }
            }
        };

        let kb = &self.keybindings;
        insert(WmAction::Quit, &kb.quit);
        let workspaces = [
            &kb.workspace_1,
            &kb.workspace_2,
            &kb.workspace_3,
            &kb.workspace_4,
            &kb.workspace_5,
            &kb.workspace_6,
            &kb.workspace_7,
            &kb.workspace_8,
            &kb.workspace_9,
        ];
        for (index, key) in workspaces.into_iter().enumerate() {
            insert(WmAction::SwitchWorkspace(index), key);
        }

        for (key_combo, command) in &self.exec.bindings {
            match parse_key_binding(key_combo) {
                Some(parsed) => {
                    bindings.insert(WmAction::Spawn(command.clone()), parsed);
                }
                None => log::warn!("Failed to parse exec keybinding: {}", key_combo),
            }
        }

        bindings
    }
}

/// Parse a key binding string like "Mod4+Shift+e" into keysym and modifiers
pub fn parse_key_binding(s: &str) -> Option<ParsedBinding> {
    let parts: Vec<&str> = s.split('+').map(str::trim).collect();
    let (key_part, modifier_parts) = parts.split_last()?;

    // X11 modifier masks
    const SHIFT_MASK: u16 = 1;
    const CONTROL_MASK: u16 = 4;
    const MOD1_MASK: u16 = 8; // Alt
    const MOD4_MASK: u16 = 64; // Super/Win

    let mut modifiers: u16 = 0;
    for part in modifier_parts {
        match part.to_lowercase().as_str() {
            "mod4" | "super" | "win" => modifiers |= MOD4_MASK,
            "shift" => modifiers |= SHIFT_MASK,
            "control" | "ctrl" => modifiers |= CONTROL_MASK,
            "mod1" | "alt" => modifiers |= MOD1_MASK,
            _ => log::warn!("Unknown modifier: {}", part),
        }
    }

    let keysym = key_to_keysym(key_part)?;
    Some(ParsedBinding { keysym, modifiers })
}

/// Convert key name to X11 keysym.
///
/// Single printable characters map to their Latin-1 keysym, which equals
/// the lowercase character code.
fn key_to_keysym(key: &str) -> Option<u32> {
    let lower = key.to_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_graphic() {
            return Some(c as u32);
        }
    }

    match lower.as_str() {
        "return" | "enter" => Some(0xff0d),
        "tab" => Some(0xff09),
        "escape" | "esc" => Some(0xff1b),
        "space" => Some(0x20),
        "backspace" => Some(0xff08),
        "delete" => Some(0xffff),
        "left" => Some(0xff51),
        "up" => Some(0xff52),
        "right" => Some(0xff53),
        "down" => Some(0xff54),
        "home" => Some(0xff50),
        "end" => Some(0xff57),
        "print" => Some(0xff61),
        f if f.starts_with('f') => match f[1..].parse::<u32>() {
            Ok(n @ 1..=12) => Some(0xffbe + n - 1),
            _ => {
                log::warn!("Unknown key: {}", key);
                None
            }
        },
        _ => {
            log::warn!("Unknown key: {}", key);
            None
        }
    }
}

/// Parse hex color string (e.g., "#55aaaa" or "55aaaa") to u32
pub fn parse_color(s: &str) -> Option<u32> {
    let s = s.trim_start_matches('#');
    if s.is_empty() || s.len() > 6 {
        return None;
    }
    u32::from_str_radix(s, 16).ok()
}

impl Default for ExecConfig {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        bindings.insert("Mod4+Return".to_string(), "xfce4-terminal".to_string());
        bindings.insert("Mod4+d".to_string(), "dmenu_run".to_string());
        Self { bindings }
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            border_width: layout.border_width,
            title_height: layout.title_height,
            button_size: layout.button_size,
            padding: layout.padding,
            bar_height: layout.bar_height,
            title_font: layout.title_font,
            title_font_size: layout.title_font_size,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            title_bar: "#eaffff".to_string(),
            border: "#55aaaa".to_string(),
            background: "#ffffea".to_string(),
            foreground: "#000000".to_string(),
            button_close: "#ffaaaa".to_string(),
            button_expand: "#eeee9e".to_string(),
            button_split: "#88cc88".to_string(),
            button_border: "#000000".to_string(),
        }
    }
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        let workspace = |n: u32| Some(format!("Mod4+{}", n));
        Self {
            quit: Some("Mod4+Shift+e".to_string()),
            workspace_1: workspace(1),
            workspace_2: workspace(2),
            workspace_3: workspace(3),
            workspace_4: workspace(4),
            workspace_5: workspace(5),
            workspace_6: workspace(6),
            workspace_7: workspace(7),
            workspace_8: workspace(8),
            workspace_9: workspace(9),
        }
    }
}
