//! Client IP resolution from proxy headers
//!
//! Picks one best-guess client address from the forwarding headers a request
//! arrives with. Headers are consulted in a fixed priority order and the first
//! one carrying a value decides:
//! - `x-forwarded-for` is split into its hops and prefers the first private
//!   hop, falling back to the leftmost hop
//! - every other header is taken verbatim
//!
//! No IP syntax validation happens here. Whatever string a header carries is
//! accepted as the address and classified with simple prefix rules.

use axum::http::HeaderMap;

use crate::models::IpInfo;

/// Forwarding headers in the order they are trusted, highest first
pub const HEADER_PRIORITY: [&str; 7] = [
    "true-client-ip",
    "cf-connecting-ip",
    "x-real-ip",
    "x-client-ip",
    "x-forwarded-for",
    "forwarded",
    "via",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

pub const DEFAULT_IP: &str = "127.0.0.1";
pub const DEFAULT_SOURCE: &str = "default";

/// Resolve the client IP from request headers.
///
/// Repeated lines of one header are read as a single comma-joined value.
pub fn resolve_client_ip(headers: &HeaderMap) -> IpInfo {
    let values: Vec<(&str, String)> = HEADER_PRIORITY
        .iter()
        .map(|name| (*name, header_value(headers, name)))
        .collect();

    resolve_with(|name| {
        values
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| value.as_str())
    })
}

/// All lines of `name` joined with `", "`, empty when the header is absent.
///
/// Bytes outside UTF-8 are replaced rather than dropping the whole value.
pub fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get_all(name)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the client IP from any header lookup.
///
/// `lookup` returns the raw value of a lowercase header name, or `None` when
/// the header is absent.
pub fn resolve_with<'a, F>(lookup: F) -> IpInfo
where
    F: Fn(&str) -> Option<&'a str>,
{
    for name in HEADER_PRIORITY {
        let value = lookup(name).unwrap_or("").trim();
        if value.is_empty() {
            continue;
        }

        let candidate = if name == X_FORWARDED_FOR {
            pick_forwarded_for(value)
        } else {
            Some(value)
        };

        if let Some(ip) = candidate {
            return IpInfo {
                ip: ip.to_string(),
                is_private: is_private_ip(ip),
                source: name.to_string(),
            };
        }
    }

    IpInfo {
        ip: DEFAULT_IP.to_string(),
        is_private: true,
        source: DEFAULT_SOURCE.to_string(),
    }
}

/// First private hop of an `X-Forwarded-For` chain, else its first hop.
///
/// Empty hops are skipped; a chain made only of empty hops yields `None`.
fn pick_forwarded_for(value: &str) -> Option<&str> {
    let hops: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    hops.iter()
        .copied()
        .find(|hop| is_private_ip(hop))
        .or_else(|| hops.first().copied())
}

/// Classify an address string as private using prefix rules.
///
/// Covers RFC 1918, link-local, IPv4 loopback, IPv6 loopback and unique-local
/// ranges. Matching is case-sensitive and does not parse the address.
pub fn is_private_ip(ip: &str) -> bool {
    if ip.starts_with("10.") || ip.starts_with("192.168.") || ip.starts_with("169.254.") {
        return true;
    }

    if let Some(rest) = ip.strip_prefix("172.") {
        let second = rest.split('.').next().unwrap_or("");
        let in_range = second.len() == 2
            && second
                .parse::<u8>()
                .is_ok_and(|octet| (16..=31).contains(&octet));
        if in_range && rest.len() > second.len() {
            return true;
        }
    }

    ip == "127.0.0.1" || ip.starts_with("::1") || ip.starts_with("fc00:") || ip.starts_with("fd")
}
