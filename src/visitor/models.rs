//! Data models for visitor collection

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Placeholder for an attribute that could not be read
pub const UNKNOWN: &str = "unknown";

/// Coarse device class derived from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width and height in CSS pixels, rendered as `WxH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width = width
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid width '{width}': {e}"))?;
        let height = height
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid height '{height}': {e}"))?;
        Ok(Self { width, height })
    }
}

/// Raw client attributes read by the collector.
///
/// These are the values a browser exposes through `navigator`, `screen`,
/// `window` and `document`. Any of them may be missing; the collector
/// substitutes sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientEnvironment {
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub platform: Option<String>,
    pub screen: Option<Dimensions>,
    pub window: Option<Dimensions>,
    pub timezone: Option<String>,
    pub referrer: Option<String>,
    pub url: Option<String>,
}

impl ClientEnvironment {
    /// Defaults taken from the host: `LANG`, the compile target and the timezone
    pub fn from_host() -> Self {
        Self {
            language: std::env::var("LANG").ok().and_then(|v| language_tag(&v)),
            platform: Some(host_platform()),
            timezone: resolve_timezone(std::env::var("TZ").ok()),
            ..Default::default()
        }
    }

    /// Read a JSON snapshot of a client environment
    pub async fn load_snapshot(path: &Path) -> anyhow::Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// `TZ` when set, otherwise the zone configured on the host
pub fn resolve_timezone(tz_var: Option<String>) -> Option<String> {
    tz_var
        .map(|tz| tz.trim().trim_start_matches(':').to_string())
        .filter(|tz| !tz.is_empty())
        .or_else(|| iana_time_zone::get_timezone().ok())
}

/// Convert a POSIX locale (`en_US.UTF-8`) into a language tag (`en-US`)
pub fn language_tag(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

fn host_platform() -> String {
    let arch = std::env::consts::ARCH;
    match std::env::consts::OS {
        "linux" => format!("Linux {arch}"),
        "macos" => "MacIntel".to_string(),
        "windows" => "Win32".to_string(),
        other => format!("{other} {arch}"),
    }
}

/// Flat record of one visit, posted as-is to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    /// Capture time, ISO-8601 UTC with millisecond precision
    pub timestamp: String,
    pub device_type: DeviceType,
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    /// `WxH`
    pub screen_resolution: String,
    /// `WxH`
    pub window_size: String,
    /// IANA timezone name
    pub timezone: String,
    pub referrer: String,
    pub url: String,
    /// Public address from the IP lookup, [`UNKNOWN`] on failure
    pub ip: String,
}
