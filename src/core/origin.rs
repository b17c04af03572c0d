//! Network origin captured alongside a new ticket

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a request came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    pub ip_address: Option<String>,
    /// System name typed in by the user, if any
    pub system_name: Option<String>,
    /// Client hint used to label the device when no system name is known
    pub user_agent: Option<String>,
}

impl RequestOrigin {
    #[must_use]
    pub fn new(ip_address: Option<String>) -> Self {
        Self {
            ip_address,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system_name(mut self, system_name: impl Into<String>) -> Self {
        self.system_name = Some(system_name.into());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Pick the client address from proxy headers, falling back to the socket
///
/// Only the first (client-most) entry of `X-Forwarded-For` is used.
#[must_use]
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote_addr: Option<&str>,
) -> Option<String> {
    forwarded_for
        .and_then(|v| v.split(',').map(str::trim).find(|s| !s.is_empty()))
        .or_else(|| real_ip.map(str::trim).filter(|s| !s.is_empty()))
        .or_else(|| remote_addr.map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Synthesize a device label such as `WIN10-PC-03151422` from a user agent
///
/// The suffix is the month, day, hour and minute of `now`. Mobile
/// platforms are checked before desktop ones because their user agents
/// also mention "Mac OS X" or "Linux".
#[must_use]
pub fn infer_system_name(user_agent: &str, now: DateTime<Utc>) -> String {
    let ua = user_agent.to_lowercase();
    let stamp = now.format("%m%d%H%M");

    let prefix = if ua.contains("windows nt 10.0") {
        "WIN10-PC"
    } else if ua.contains("windows nt 6.3") {
        "WIN8-PC"
    } else if ua.contains("windows nt 6.1") {
        "WIN7-PC"
    } else if ua.contains("windows") {
        "WINDOWS-PC"
    } else if ua.contains("iphone") {
        "IPHONE"
    } else if ua.contains("ipad") {
        "IPAD"
    } else if ua.contains("android") {
        "ANDROID"
    } else if ua.contains("mac os x") || ua.contains("macos") {
        "MACOS"
    } else if ua.contains("linux") {
        "LINUX"
    } else {
        "DEVICE"
    };

    format!("{prefix}-{stamp}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 22, 0).unwrap()
    }

    #[test]
    fn test_infer_windows_versions() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
        assert_eq!(infer_system_name(ua, at()), "WIN10-PC-03151422");
        assert!(infer_system_name("Windows NT 6.1", at()).starts_with("WIN7-PC-"));
        assert!(infer_system_name("Windows NT 5.1", at()).starts_with("WINDOWS-PC-"));
    }

    #[test]
    fn test_infer_mobile_before_desktop() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert!(infer_system_name(iphone, at()).starts_with("IPHONE-"));

        let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";
        assert!(infer_system_name(android, at()).starts_with("ANDROID-"));

        let mac = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2)";
        assert!(infer_system_name(mac, at()).starts_with("MACOS-"));

        assert!(infer_system_name("X11; Linux x86_64", at()).starts_with("LINUX-"));
        assert!(infer_system_name("curl/8.4.0", at()).starts_with("DEVICE-"));
    }

    #[test]
    fn test_resolve_client_ip_precedence() {
        assert_eq!(
            resolve_client_ip(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2"), Some("127.0.0.1")),
            Some("203.0.113.7".to_string())
        );
        assert_eq!(
            resolve_client_ip(None, Some("10.0.0.2"), Some("127.0.0.1")),
            Some("10.0.0.2".to_string())
        );
        assert_eq!(
            resolve_client_ip(Some(" "), None, Some("127.0.0.1")),
            Some("127.0.0.1".to_string())
        );
        assert_eq!(resolve_client_ip(None, None, None), None);
    }
}
