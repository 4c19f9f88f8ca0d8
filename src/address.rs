//! Six-octet hardware addresses and their textual form.
//!
//! Keys of the learning table are plain byte strings; no canonicalization is
//! applied. The textual codec is fixed: `xx:xx:xx:xx:xx:xx`, lowercase hex on
//! output, either case accepted on input.
//!
//! ```
//! use mactable::MacAddress;
//!
//! let addr: MacAddress = "00:1A:2b:3c:4d:5e".parse().unwrap();
//! assert_eq!(addr.to_string(), "00:1a:2b:3c:4d:5e");
//! assert!("00:1a:2b:3c:4d".parse::<MacAddress>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{ParseAddressError, ParseAddressErrorKind};

/// Number of octets in a hardware address.
pub const ADDRESS_LEN: usize = 6;

/// Length of the textual form `xx:xx:xx:xx:xx:xx`.
pub const ADDRESS_TEXT_LEN: usize = ADDRESS_LEN * 3 - 1;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A six-octet Ethernet hardware address.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct MacAddress(pub [u8; ADDRESS_LEN]);

impl MacAddress {
    /// The broadcast address.
    pub const BROADCAST: MacAddress = MacAddress([0xff; ADDRESS_LEN]);

    /// Construct an address from its six octets.
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> MacAddress {
        MacAddress([a, b, c, d, e, f])
    }

    /// Construct an address from a slice, returning `None` unless it is
    /// exactly six octets long.
    pub fn from_slice(data: &[u8]) -> Option<MacAddress> {
        let bytes: [u8; ADDRESS_LEN] = data.try_into().ok()?;
        Some(MacAddress(bytes))
    }

    /// Return the raw octets.
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Query whether the address is an unicast address.
    pub fn is_unicast(&self) -> bool {
        !(self.is_broadcast() || self.is_multicast())
    }

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the "multicast" bit in the OUI is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Query whether the "locally administered" bit in the OUI is set.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

impl From<[u8; ADDRESS_LEN]> for MacAddress {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        MacAddress(bytes)
    }
}

impl From<MacAddress> for [u8; ADDRESS_LEN] {
    fn from(addr: MacAddress) -> Self {
        addr.0
    }
}

impl AsRef<[u8]> for MacAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = [0u8; ADDRESS_TEXT_LEN];
        for (n, octet) in self.0.iter().enumerate() {
            let at = n * 3;
            text[at] = HEX_DIGITS[(octet >> 4) as usize];
            text[at + 1] = HEX_DIGITS[(octet & 0x0f) as usize];
            if n != ADDRESS_LEN - 1 {
                text[at + 2] = b':';
            }
        }
        // Only ASCII hex digits and ':' were written.
        f.write_str(std::str::from_utf8(&text).map_err(|_| fmt::Error)?)
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

impl FromStr for MacAddress {
    type Err = ParseAddressError;

    /// Parse `xx:xx:xx:xx:xx:xx`. Short input, trailing input, a bad digit
    /// or a bad separator are all rejected.
    fn from_str(s: &str) -> Result<MacAddress, ParseAddressError> {
        let data = s.as_bytes();
        if data.len() != ADDRESS_TEXT_LEN {
            return Err(ParseAddressError::new(
                ParseAddressErrorKind::Length,
                data.len(),
            ));
        }

        let mut octets = [0u8; ADDRESS_LEN];
        for (n, octet) in octets.iter_mut().enumerate() {
            let at = n * 3;
            let hi = hex_value(data[at])
                .ok_or(ParseAddressError::new(ParseAddressErrorKind::InvalidDigit, at))?;
            let lo = hex_value(data[at + 1]).ok_or(ParseAddressError::new(
                ParseAddressErrorKind::InvalidDigit,
                at + 1,
            ))?;
            *octet = (hi << 4) | lo;
            if n != ADDRESS_LEN - 1 && data[at + 2] != b':' {
                return Err(ParseAddressError::new(
                    ParseAddressErrorKind::Separator,
                    at + 2,
                ));
            }
        }
        Ok(MacAddress(octets))
    }
}
