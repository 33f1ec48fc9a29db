//! Client platform detection.

use serde::{Deserialize, Serialize};

const MOBILE_MARKERS: [&str; 8] = [
    "Android",
    "webOS",
    "iPhone",
    "iPad",
    "iPod",
    "BlackBerry",
    "IEMobile",
    "Opera Mini",
];

const IOS_MARKERS: [&str; 3] = ["iPad", "iPhone", "iPod"];

/// What kind of device is rendering the gallery.
///
/// ```
/// use keepsake_gallery::Platform;
///
/// let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
/// let platform = Platform::from_user_agent(ua);
/// assert!(platform.is_mobile());
/// assert!(platform.is_ios());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    mobile: bool,
    ios: bool,
}

impl Platform {
    /// Create a platform fingerprint directly.
    pub fn new(mobile: bool, ios: bool) -> Self {
        Self { mobile, ios }
    }

    /// Desktop browser.
    pub fn desktop() -> Self {
        Self::default()
    }

    /// Classify a `User-Agent` string.
    pub fn from_user_agent(user_agent: &str) -> Self {
        Self {
            mobile: MOBILE_MARKERS.iter().any(|m| user_agent.contains(m)),
            ios: IOS_MARKERS.iter().any(|m| user_agent.contains(m)),
        }
    }

    /// Phone or tablet.
    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    /// Apple mobile device.
    pub fn is_ios(&self) -> bool {
        self.ios
    }
}
