// Network State - Validation Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Input sanitizing helpers for values reported by the connection manager.

use super::error::{Error, Result};

const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Sanitize raw bytes into displayable UTF-8.
///
/// Invalid sequences and control characters below U+0020 become U+FFFD.
pub fn validate_utf8(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .map(|c| if (c as u32) < 0x20 { REPLACEMENT_CHARACTER } else { c })
        .collect()
}

/// Decode an ASCII hex dump (e.g. "48656c6c6f") into raw SSID bytes.
pub fn decode_hex_ssid(ssid_hex: &str) -> Result<Vec<u8>> {
    hex::decode(ssid_hex).map_err(|e| Error::InvalidHexSsid(format!("{}: {}", ssid_hex, e)))
}

/// Prefix length of a dotted-quad netmask, or -1 if the mask is not canonical.
pub fn netmask_prefix_length(netmask: &str) -> i32 {
    let mut count = 0;
    let mut prefix_len = 0;
    for token in netmask.split('.').filter(|t| !t.is_empty()) {
        if count == 4 {
            return -1;
        }
        if prefix_len / 8 != count {
            // A partial octet was already seen; everything after must be zero.
            if token != "0" {
                return -1;
            }
        } else {
            prefix_len += match token {
                "255" => 8,
                "254" => 7,
                "252" => 6,
                "248" => 5,
                "240" => 4,
                "224" => 3,
                "192" => 2,
                "128" => 1,
                "0" => 0,
                _ => return -1,
            };
        }
        count += 1;
    }
    if count < 4 {
        return -1;
    }
    prefix_len
}

/// Dotted-quad netmask for a prefix length, or an empty string if out of range.
pub fn netmask_from_prefix(prefix_len: i32) -> String {
    if !(0..=32).contains(&prefix_len) {
        return String::new();
    }
    let mask: u32 = if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len)
    };
    let [a, b, c, d] = mask.to_be_bytes();
    format!("{}.{}.{}.{}", a, b, c, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_utf8() {
        assert_eq!(validate_utf8(b"Hello"), "Hello");
        assert_eq!(validate_utf8("Caf\u{e9}".as_bytes()), "Caf\u{e9}");
        assert_eq!(validate_utf8(b"ab\x01c"), "ab\u{FFFD}c");
        assert_eq!(validate_utf8(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_decode_hex_ssid() {
        assert_eq!(decode_hex_ssid("48656c6c6f").unwrap(), b"Hello");
        assert_eq!(decode_hex_ssid("48656C6C6F").unwrap(), b"Hello");
        assert!(decode_hex_ssid("4865zz").is_err());
        assert!(decode_hex_ssid("486").is_err());
    }

    #[test]
    fn test_prefix_length_canonical() {
        assert_eq!(netmask_prefix_length("255.255.255.0"), 24);
        assert_eq!(netmask_prefix_length("255.255.128.0"), 17);
        assert_eq!(netmask_prefix_length("255.255.255.255"), 32);
        assert_eq!(netmask_prefix_length("0.0.0.0"), 0);
        assert_eq!(netmask_prefix_length("255.240.0.0"), 12);
    }

    #[test]
    fn test_netmask_from_prefix() {
        assert_eq!(netmask_from_prefix(24), "255.255.255.0");
        assert_eq!(netmask_from_prefix(17), "255.255.128.0");
        assert_eq!(netmask_from_prefix(0), "0.0.0.0");
        assert_eq!(netmask_from_prefix(32), "255.255.255.255");
        assert_eq!(netmask_from_prefix(33), "");
        assert_eq!(netmask_prefix_length(&netmask_from_prefix(20)), 20);
    }

    #[test]
    fn test_prefix_length_invalid() {
        assert_eq!(netmask_prefix_length("255.224.255.0"), -1);
        assert_eq!(netmask_prefix_length("255.255.255"), -1);
        assert_eq!(netmask_prefix_length("255.255.255.0.0"), -1);
        assert_eq!(netmask_prefix_length("255.255.100.0"), -1);
        assert_eq!(netmask_prefix_length(""), -1);
        assert_eq!(netmask_prefix_length("not.a.net.mask"), -1);
    }
}
