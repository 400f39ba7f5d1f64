use std::net::Ipv6Addr;

use url::{Host, Url};

use super::result::{RejectCause, RejectReason, ValidationResult};

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

const BLOCKED_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "::1", "169.254.169.254"];

const BLOCKED_SUFFIXES: [&str; 2] = [".local", ".internal"];

/// Classification of a hostname made only of digits and dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipv4Literal {
    Malformed,
    Private,
    Public,
}

/// Validate a raw probe target.
///
/// Accepts only absolute `http`/`https` URLs whose host is not a loopback,
/// metadata, mDNS/internal name, IPv4 literal or private IPv6 literal. No network access happens
/// here; the check is a pure function of `raw_url`.
pub fn validate(raw_url: &str) -> ValidationResult {
    let url = match Url::parse(raw_url.trim()) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Rejecting unparsable target {raw_url:?}: {e}");
            return rejected(RejectCause::Unparsable);
        }
    };

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return rejected(RejectCause::UnsupportedScheme);
    }

    let host = match url.host() {
        Some(host) => host,
        None => return rejected(RejectCause::Unparsable),
    };

    if let Host::Ipv6(addr) = host {
        if let Some(cause) = classify_ipv6(addr) {
            log::debug!("Rejecting IPv6 host {addr} ({cause:?})");
            return rejected(cause);
        }
    }

    let hostname = normalize_hostname(url.host_str().unwrap_or_default());

    if is_blocked_hostname(&hostname) {
        return rejected(RejectCause::BlockedHost);
    }

    if looks_like_ipv4(&hostname) {
        let class = classify_ipv4(&hostname);
        log::debug!("Rejecting IPv4 literal host {hostname} ({class:?})");
        // Every numeric host is refused; the classification only decides
        // which cause gets reported.
        return rejected(match class {
            Ipv4Literal::Malformed => RejectCause::MalformedIpv4,
            Ipv4Literal::Private => RejectCause::PrivateIpv4,
            Ipv4Literal::Public => RejectCause::Ipv4Literal,
        });
    }

    ValidationResult::Accepted { canonical_url: url }
}

fn rejected(cause: RejectCause) -> ValidationResult {
    ValidationResult::Rejected {
        reason: RejectReason::InvalidUrl,
        cause,
    }
}

/// Lower-case, strip IPv6 brackets and a single trailing root dot.
fn normalize_hostname(host: &str) -> String {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = host.strip_suffix('.').unwrap_or(host);
    host.to_ascii_lowercase()
}

fn is_blocked_hostname(hostname: &str) -> bool {
    BLOCKED_HOSTS.contains(&hostname)
        || BLOCKED_SUFFIXES
            .iter()
            .any(|suffix| hostname.ends_with(suffix))
}

fn looks_like_ipv4(hostname: &str) -> bool {
    !hostname.is_empty() && hostname.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Reject causes for IPv6 literals that reach the local host or a private
/// network. `[::]` connects to loopback on Linux, so it counts as blocked.
fn classify_ipv6(addr: Ipv6Addr) -> Option<RejectCause> {
    if addr.is_unspecified() || addr.is_loopback() {
        return Some(RejectCause::BlockedHost);
    }
    // Mapped (::ffff:a.b.c.d) and compatible (::a.b.c.d) forms are IPv4
    // literals in disguise.
    if addr.to_ipv4().is_some() {
        return Some(RejectCause::Ipv4Literal);
    }
    if addr.is_unique_local() || addr.is_unicast_link_local() {
        return Some(RejectCause::PrivateIpv6);
    }
    None
}

/// Parse a dotted quad and check it against the private and reserved blocks.
pub fn classify_ipv4(hostname: &str) -> Ipv4Literal {
    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() != 4 {
        return Ipv4Literal::Malformed;
    }

    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(&parts) {
        match part.parse::<u8>() {
            Ok(value) => *slot = value,
            Err(_) => return Ipv4Literal::Malformed,
        }
    }

    let private = match octets {
        [0, ..] | [10, ..] | [127, ..] => true,
        [192, 168, ..] | [169, 254, ..] => true,
        [172, b, ..] => (16..=31).contains(&b),
        _ => false,
    };

    if private {
        Ipv4Literal::Private
    } else {
        Ipv4Literal::Public
    }
}
