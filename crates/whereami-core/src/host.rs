//! Host plugin boundary
//!
//! The host runtime (keyword dispatch, result-list rendering, clipboard
//! and URL actions) lives outside this system; this module defines the
//! types exchanged across that boundary and builds result entries from
//! resolution outcomes. The contract: every query is answered with a
//! non-empty entry list. Failures become normal entries with an error
//! icon and a short cause, never a panic reaching the host.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::DisplayConfig;
use crate::error::Error;
use crate::location::{CopyFormat, Location, copy_text};

/// Action attached to a result entry, executed by the host on selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// Copy the given text to the clipboard
    CopyToClipboard(String),
    /// Open the given URL in the default handler
    OpenUrl(String),
    /// No action
    None,
}

/// One row in the host's result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub icon: PathBuf,
    pub title: String,
    pub subtitle: String,
    pub action: EntryAction,
}

/// Resolves logical icon names ("icon", "error", "loading") to asset paths
pub trait IconResolver: Send + Sync {
    /// Resolve a logical name, falling back to a default asset when
    /// the named one is missing
    fn resolve(&self, name: &str) -> PathBuf;
}

/// Directory-backed icon resolver
///
/// Looks up `<root>/<name>.png` and falls back to the default asset
/// when the file does not exist.
pub struct DirIconResolver {
    root: PathBuf,
    default: PathBuf,
}

impl DirIconResolver {
    pub fn new(root: impl AsRef<Path>, default: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            default: default.as_ref().to_path_buf(),
        }
    }
}

impl IconResolver for DirIconResolver {
    fn resolve(&self, name: &str) -> PathBuf {
        let candidate = self.root.join(format!("{}.png", name));
        if candidate.exists() {
            candidate
        } else {
            self.default.clone()
        }
    }
}

/// User preferences attached to a query by the host
///
/// The host forwards preferences as boolean-like strings plus an
/// enumerated copy-format selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPreferences {
    pub show_region: bool,
    pub show_flag: bool,
    pub show_ip: bool,
    pub copy_format: CopyFormat,
}

impl QueryPreferences {
    /// Parse preferences from the host's string map
    ///
    /// Missing or unparseable values fall back to defaults; the host
    /// is not trusted to send well-formed preferences.
    pub fn from_host_values(values: &HashMap<String, String>) -> Self {
        let flag = |key: &str| {
            values
                .get(key)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false)
        };

        Self {
            show_region: flag("show_region"),
            show_flag: flag("show_flag"),
            show_ip: flag("show_ip"),
            copy_format: values
                .get("copy_format")
                .and_then(|v| CopyFormat::from_str(v).ok())
                .unwrap_or_default(),
        }
    }

    /// Preferences from resolver configuration (daemon path)
    pub fn from_display_config(config: &DisplayConfig) -> Self {
        Self {
            show_region: config.show_region,
            show_flag: config.show_flag,
            show_ip: config.show_ip,
            copy_format: config.copy_format,
        }
    }
}

/// Flag emoji for a 2-letter country code (regional indicator pair)
fn flag_emoji(country_code: &str) -> Option<String> {
    let code = country_code.trim().to_uppercase();
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    code.chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

/// Title line for a resolved location under the given preferences
fn location_title(location: &Location, prefs: &QueryPreferences) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(city) = location.city.as_deref() {
        parts.push(city);
    }
    if prefs.show_region
        && let Some(region) = location.region.as_deref()
    {
        parts.push(region);
    }
    if let Some(country) = location.country_label() {
        parts.push(country);
    }

    let mut title = if parts.is_empty() {
        location
            .source_ip
            .clone()
            .unwrap_or_else(|| "Unknown location".to_string())
    } else {
        parts.join(", ")
    };

    if prefs.show_flag
        && let Some(code) = location.country_code.as_deref()
        && let Some(flag) = flag_emoji(code)
    {
        title = format!("{} {}", flag, title);
    }

    title
}

/// Build the result list for a resolved location
pub fn render_location(
    location: &Location,
    prefs: &QueryPreferences,
    icons: &dyn IconResolver,
) -> Vec<ResultEntry> {
    let mut entries = Vec::new();

    let action = match copy_text(location, prefs.copy_format) {
        Ok(text) => EntryAction::CopyToClipboard(text),
        // Partial data renders fine; only the copy action degrades
        Err(_) => EntryAction::None,
    };

    entries.push(ResultEntry {
        icon: icons.resolve("icon"),
        title: location_title(location, prefs),
        subtitle: match &action {
            EntryAction::CopyToClipboard(_) => "Press Enter to copy".to_string(),
            _ => format!("Resolved by {}", location.provider),
        },
        action,
    });

    if let Some((lat, lon)) = location.coordinates() {
        entries.push(ResultEntry {
            icon: icons.resolve("icon"),
            title: "Open in Google Maps".to_string(),
            subtitle: "View this location on the map".to_string(),
            action: EntryAction::OpenUrl(format!("https://www.google.com/maps?q={},{}", lat, lon)),
        });
    }

    if prefs.show_ip
        && let Some(ip) = location.source_ip.as_deref()
    {
        entries.push(ResultEntry {
            icon: icons.resolve("icon"),
            title: format!("Public IP: {}", ip),
            subtitle: "Press Enter to copy".to_string(),
            action: EntryAction::CopyToClipboard(ip.to_string()),
        });
    }

    entries
}

/// Placeholder entry shown while a fetch is in flight
pub fn render_pending(icons: &dyn IconResolver) -> Vec<ResultEntry> {
    vec![ResultEntry {
        icon: icons.resolve("loading"),
        title: "Resolving location…".to_string(),
        subtitle: "This takes a moment".to_string(),
        action: EntryAction::None,
    }]
}

/// Error entry for a terminally failed resolution
pub fn render_error(error: &Error, icons: &dyn IconResolver) -> Vec<ResultEntry> {
    vec![ResultEntry {
        icon: icons.resolve("error"),
        title: "Could not resolve location".to_string(),
        subtitle: error.user_message(),
        action: EntryAction::None,
    }]
}
