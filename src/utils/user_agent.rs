//! User agent parsing via woothee.

use woothee::parser::Parser;

/// Browser, OS and device family parsed out of a `User-Agent` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UaInfo {
    pub browser: Option<String>,
    pub os: Option<String>,
    /// Woothee category: `pc`, `smartphone`, `mobilephone`, `crawler`, ...
    pub device: Option<String>,
}

impl UaInfo {
    pub fn is_crawler(&self) -> bool {
        self.device.as_deref() == Some("crawler")
    }
}

/// Parses a user agent string into its browser/OS/device families.
///
/// Unknown or empty fields come back as `None`; an unparseable string yields
/// an all-`None` result rather than an error.
pub fn parse_user_agent(ua: &str) -> UaInfo {
    if ua.is_empty() {
        return UaInfo::default();
    }

    let parser = Parser::new();
    match parser.parse(ua) {
        Some(result) => UaInfo {
            browser: known(result.name),
            os: known(result.os),
            device: known(result.category),
        },
        None => UaInfo::default(),
    }
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_owned())
    }
}
