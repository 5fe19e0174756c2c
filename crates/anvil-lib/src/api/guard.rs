//! Outbound URL policy: HTTPS only, and never an address inside the local network.

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Download(format!("Invalid URL {}: {}", raw, e)))?;

    if !url.scheme().eq_ignore_ascii_case("https") {
        return Err(Error::Download(format!(
            "Blocked URL with unsupported scheme: {}",
            raw
        )));
    }

    let blocked = match url.host() {
        None => {
            return Err(Error::Download(format!("Blocked URL with missing host: {}", raw)));
        }
        Some(Host::Domain(domain)) => domain.is_empty(),
        Some(Host::Ipv4(ip)) => is_disallowed_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_disallowed_ip(IpAddr::V6(ip)),
    };
    if blocked {
        return Err(Error::Download(format!(
            "Blocked URL targeting disallowed address: {}",
            raw
        )));
    }
    Ok(url)
}

pub fn is_disallowed_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_disallowed_v4(v4),
            None => is_disallowed_v6(v6),
        },
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 0.0.0.0/8
        || a == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (b & 0xc0) == 64)
        // 240.0.0.0/4 reserved
        || a >= 240
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}
