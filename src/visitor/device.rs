//! Device classification from the user agent string

use regex::Regex;
use std::sync::LazyLock;

use crate::visitor::models::DeviceType;

static TABLET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)tablet|ipad|playbook|silk").expect("tablet pattern is valid")
});

static MOBILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mobile|iphone|ipod|android|blackberry|opera mini|iemobile")
        .expect("mobile pattern is valid")
});

/// Classify a user agent as tablet, mobile or desktop.
///
/// Tablet patterns are checked first: iPad and Android tablet agents often
/// carry mobile tokens too.
pub fn classify_device(user_agent: &str) -> DeviceType {
    if TABLET_PATTERN.is_match(user_agent) {
        DeviceType::Tablet
    } else if MOBILE_PATTERN.is_match(user_agent) {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}
