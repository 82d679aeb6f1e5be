//! Referrer and campaign-tag parsing for click attribution.

use url::Url;

/// Extracts the registrable host from a referrer URL, lowercased and with a
/// leading `www.` stripped so `www.google.com` and `google.com` group
/// together in breakdowns.
pub fn referrer_domain(referrer: &str) -> Option<String> {
    let url = Url::parse(referrer).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_owned())
    }
}

/// The five standard UTM campaign tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmTags {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmTags {
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.medium.is_none()
            && self.campaign.is_none()
            && self.term.is_none()
            && self.content.is_none()
    }
}

/// Pulls UTM tags out of a raw query string.
///
/// Values are percent-decoded; empty values are ignored and the first
/// occurrence of a repeated key wins.
pub fn extract_utm(query: &str) -> UtmTags {
    let mut tags = UtmTags::default();

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "utm_source" if tags.source.is_none() => tags.source = Some(value.into_owned()),
            "utm_medium" if tags.medium.is_none() => tags.medium = Some(value.into_owned()),
            "utm_campaign" if tags.campaign.is_none() => tags.campaign = Some(value.into_owned()),
            "utm_term" if tags.term.is_none() => tags.term = Some(value.into_owned()),
            "utm_content" if tags.content.is_none() => tags.content = Some(value.into_owned()),
            _ => {}
        }
    }

    tags
}
