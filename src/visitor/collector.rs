//! Visitor info collector
//!
//! Builds exactly one [`VisitorRecord`] per call. Every attribute lookup is
//! guarded on its own: a missing value becomes a sentinel and a failed IP
//! lookup becomes `"unknown"`, so collection itself cannot fail.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error_chain;
use crate::visitor::device::classify_device;
use crate::visitor::ip_lookup::IpLookup;
use crate::visitor::models::{ClientEnvironment, VisitorRecord, UNKNOWN};

pub struct VisitorCollector {
    ip_lookup: Arc<dyn IpLookup>,
}

impl VisitorCollector {
    pub fn new(ip_lookup: Arc<dyn IpLookup>) -> Self {
        Self { ip_lookup }
    }

    /// Collect one record, stamped with the current time
    pub async fn collect(&self, env: &ClientEnvironment) -> VisitorRecord {
        self.collect_at(env, Utc::now()).await
    }

    /// Collect one record stamped with `now`
    pub async fn collect_at(&self, env: &ClientEnvironment, now: DateTime<Utc>) -> VisitorRecord {
        let user_agent = or_unknown("user_agent", env.user_agent.as_deref());

        let ip = match self.ip_lookup.lookup().await {
            Ok(ip) => ip,
            Err(err) => {
                warn!(error = %error_chain(&err), "Could not get IP, recording '{UNKNOWN}'");
                UNKNOWN.to_string()
            }
        };

        let record = VisitorRecord {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            device_type: classify_device(&user_agent),
            language: or_unknown("language", env.language.as_deref()),
            platform: or_unknown("platform", env.platform.as_deref()),
            screen_resolution: or_unknown(
                "screen_resolution",
                env.screen.map(|d| d.to_string()).as_deref(),
            ),
            window_size: or_unknown("window_size", env.window.map(|d| d.to_string()).as_deref()),
            timezone: or_unknown("timezone", env.timezone.as_deref()),
            referrer: env.referrer.clone().unwrap_or_default(),
            url: env.url.clone().unwrap_or_default(),
            user_agent,
            ip,
        };

        debug!(?record, "Collected visitor data");
        record
    }
}

fn or_unknown(field: &'static str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None => {
            debug!(field, "Attribute unavailable, recording '{UNKNOWN}'");
            UNKNOWN.to_string()
        }
    }
}
