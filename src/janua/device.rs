//! Client device classification from the raw User-Agent string.
//!
//! A device is summarized as a class (`mobile` | `desktop`) and a display
//! name of the form `"<OS> – <Browser> <Version>"`, degrading to whichever
//! side is recognizable and finally to `"Unknown Device"` (or
//! `"Bot/Crawler"` when the agent self-identifies as a bot).

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceProfile {
    pub name: String,
    pub class: DeviceClass,
}

/// Derive a device profile from a raw User-Agent value.
#[must_use]
pub fn profile(raw_user_agent: &str) -> DeviceProfile {
    let lower = raw_user_agent.to_lowercase();

    let class = if is_mobile(&lower) {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    };

    let os = os_name(&lower);
    let browser = browser(&lower);

    let name = match (os, browser) {
        (Some(os), Some((browser, Some(version)))) => format!("{os} – {browser} {version}"),
        (Some(os), Some((browser, None))) => format!("{os} – {browser}"),
        (Some(os), None) => os.to_string(),
        (None, Some((browser, Some(version)))) => format!("{browser} {version}"),
        (None, Some((browser, None))) => browser.to_string(),
        (None, None) => {
            if lower.contains("bot") {
                "Bot/Crawler".to_string()
            } else {
                "Unknown Device".to_string()
            }
        }
    };

    DeviceProfile { name, class }
}

fn is_mobile(lower: &str) -> bool {
    const MARKERS: [&str; 7] = [
        "mobile",
        "iphone",
        "ipad",
        "ipod",
        "windows phone",
        "opera mini",
        "blackberry",
    ];
    MARKERS.iter().any(|marker| lower.contains(marker))
}

fn os_name(lower: &str) -> Option<&'static str> {
    // Android agents also contain "linux"; iOS agents also contain "mac os x".
    // Order matters.
    if lower.contains("windows phone") {
        Some("Windows Phone")
    } else if lower.contains("windows") {
        Some("Windows")
    } else if lower.contains("android") {
        Some("Android")
    } else if lower.contains("iphone") || lower.contains("ipad") || lower.contains("ipod") {
        Some("iOS")
    } else if lower.contains("mac os x") || lower.contains("macintosh") {
        Some("macOS")
    } else if lower.contains("cros") {
        Some("ChromeOS")
    } else if lower.contains("linux") {
        Some("Linux")
    } else {
        None
    }
}

fn browser(lower: &str) -> Option<(&'static str, Option<String>)> {
    // Chromium derivatives embed "chrome/" so the specific markers go first.
    if lower.contains("edg/") {
        Some(("Edge", version_after(lower, "edg/")))
    } else if lower.contains("opr/") {
        Some(("Opera", version_after(lower, "opr/")))
    } else if lower.contains("firefox/") {
        Some(("Firefox", version_after(lower, "firefox/")))
    } else if lower.contains("crios/") {
        Some(("Chrome", version_after(lower, "crios/")))
    } else if lower.contains("chrome/") {
        Some(("Chrome", version_after(lower, "chrome/")))
    } else if lower.contains("safari/") {
        // Safari reports its version in a separate "Version/x" token
        Some(("Safari", version_after(lower, "version/")))
    } else {
        None
    }
}

/// Extract the version token following `marker`, dropping empty and "0"
/// placeholder values. Versions are digits and dots, so scanning the
/// lowercased agent is lossless.
fn version_after(lower: &str, marker: &str) -> Option<String> {
    let start = lower.find(marker)? + marker.len();
    let version: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if version.is_empty() || version == "0" {
        None
    } else {
        Some(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const GOOGLEBOT: &str =
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[test]
    fn desktop_chrome_on_windows() {
        let profile = profile(CHROME_WINDOWS);
        assert_eq!(profile.class, DeviceClass::Desktop);
        assert_eq!(profile.name, "Windows – Chrome 120.0.0.0");
    }

    #[test]
    fn mobile_safari_on_iphone() {
        let profile = profile(SAFARI_IPHONE);
        assert_eq!(profile.class, DeviceClass::Mobile);
        assert_eq!(profile.name, "iOS – Safari 17.0");
    }

    #[test]
    fn mobile_chrome_on_android() {
        let profile = profile(CHROME_ANDROID);
        assert_eq!(profile.class, DeviceClass::Mobile);
        assert_eq!(profile.name, "Android – Chrome 120.0.0.0");
    }

    #[test]
    fn os_only_when_browser_unknown() {
        let profile = profile("Mozilla/5.0 (Windows NT 10.0; Win64; x64)");
        assert_eq!(profile.class, DeviceClass::Desktop);
        assert_eq!(profile.name, "Windows");
    }

    #[test]
    fn browser_only_when_os_unknown() {
        let profile = profile("Chrome/99.0");
        assert_eq!(profile.name, "Chrome 99.0");
    }

    #[test]
    fn zero_version_is_elided() {
        let profile = profile("Mozilla/5.0 (Windows NT 10.0) Chrome/0");
        assert_eq!(profile.name, "Windows – Chrome");
    }

    #[test]
    fn empty_agent_is_unknown_desktop() {
        let profile = profile("");
        assert_eq!(profile.class, DeviceClass::Desktop);
        assert_eq!(profile.name, "Unknown Device");
    }

    #[test]
    fn bot_overrides_unknown() {
        let profile = profile(GOOGLEBOT);
        assert_eq!(profile.name, "Bot/Crawler");
    }

    #[test]
    fn curl_is_unknown_not_bot() {
        let profile = profile("curl/8.4.0");
        assert_eq!(profile.name, "Unknown Device");
    }

    #[test]
    fn device_class_as_str() {
        assert_eq!(DeviceClass::Mobile.as_str(), "mobile");
        assert_eq!(DeviceClass::Desktop.as_str(), "desktop");
    }
}
