//! Conversions between socket addresses and the integer form the ledger stores.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address-family tag for IPv4 peers.
pub const IP_TYPE_V4: u8 = 4;
/// Address-family tag for IPv6 peers.
pub const IP_TYPE_V6: u8 = 6;

/// Encode an IP address as the `(ip, ip_type)` pair stored on chain.
pub fn ip_to_int(ip: IpAddr) -> (u128, u8) {
    match ip {
        IpAddr::V4(v4) => (u128::from(u32::from(v4)), IP_TYPE_V4),
        IpAddr::V6(v6) => (u128::from(v6), IP_TYPE_V6),
    }
}

/// Decode an on-chain `(ip, ip_type)` pair. Returns `None` for an unknown
/// family tag or an IPv4 value wider than 32 bits.
pub fn int_to_ip(ip: u128, ip_type: u8) -> Option<IpAddr> {
    match ip_type {
        IP_TYPE_V4 => u32::try_from(ip).ok().map(|v| IpAddr::V4(Ipv4Addr::from(v))),
        IP_TYPE_V6 => Some(IpAddr::V6(Ipv6Addr::from(ip))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_to_int() {
        let ip: IpAddr = "192.122.31.4".parse().unwrap();
        let (value, ip_type) = ip_to_int(ip);
        assert_eq!(value, 3_229_228_804);
        assert_eq!(ip_type, IP_TYPE_V4);
        assert_eq!(int_to_ip(value, ip_type), Some(ip));
    }

    #[test]
    fn test_ipv6_to_int() {
        let ip: IpAddr = "::1".parse().unwrap();
        assert_eq!(ip_to_int(ip), (1, IP_TYPE_V6));
        assert_eq!(int_to_ip(1, IP_TYPE_V6), Some(ip));
    }

    #[test]
    fn test_int_to_ip_rejects_bad_family() {
        assert_eq!(int_to_ip(1, 5), None);
        assert_eq!(int_to_ip(u128::from(u32::MAX) + 1, IP_TYPE_V4), None);
    }
}
