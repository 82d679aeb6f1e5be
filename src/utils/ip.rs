//! Client IP extraction and outward masking.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use axum::http::HeaderMap;

/// Extracts the client IP from proxy headers, falling back to the peer
/// address.
///
/// `X-Forwarded-For` wins (first entry, set by the outermost proxy), then
/// `X-Real-IP`, then the socket peer. Header values that do not parse as an
/// IP address are skipped rather than trusted.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first) = value.split(',').next()
        && let Ok(addr) = first.trim().parse::<IpAddr>()
    {
        return Some(addr.to_string());
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && let Ok(addr) = value.trim().parse::<IpAddr>()
    {
        return Some(addr.to_string());
    }

    peer.map(|p| p.ip().to_string())
}

/// Masks an IP address for outward reads.
///
/// IPv4 keeps the first two octets (`192.168.1.100` becomes
/// `192.168.xxx.xxx`); IPv6 keeps the first four groups and masks the rest.
/// Strings that do not parse as an IP come back fully masked, never echoed.
pub fn mask_ip(ip: &str) -> String {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            let octets = v4.octets();
            format!("{}.{}.xxx.xxx", octets[0], octets[1])
        }
        Ok(IpAddr::V6(v6)) => mask_ipv6(v6),
        Err(_) => "xxx.xxx.xxx.xxx".to_string(),
    }
}

fn mask_ipv6(addr: Ipv6Addr) -> String {
    let segments = addr.segments();
    format!(
        "{:x}:{:x}:{:x}:{:x}:xxxx:xxxx:xxxx:xxxx",
        segments[0], segments[1], segments[2], segments[3]
    )
}
