//! CashAddr checks and payment URI derivation.
//!
//! The derivation here is the only one: the host publisher and the
//! companion receiver both call [`payment_uri`], so they cannot diverge.

use once_cell::sync::Lazy;
use regex::Regex;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

static CASHADDR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+):([qpzry9x8gf2tvdw0s3jn54khce6mua7l]{42,})$").expect("static regex")
});

/// Decides whether a prefixed address is acceptable as a payment target.
pub trait AddressValidator: Send + Sync {
    fn is_valid(&self, address: &str) -> bool;
}

impl<F> AddressValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, address: &str) -> bool { self(address) }
}

/// Lowercase `prefix:payload` CashAddr with a valid checksum, restricted to the allowed prefixes.
#[derive(Debug, Clone)]
pub struct CashAddrValidator {
    prefixes: Vec<String>,
}

impl CashAddrValidator {
    pub fn new(prefixes: &[&str]) -> Self {
        Self { prefixes: prefixes.iter().map(|p| p.to_string()).collect() }
    }

    pub fn for_prefix(prefix: &str) -> Self { Self::new(&[prefix]) }
}

impl AddressValidator for CashAddrValidator {
    fn is_valid(&self, address: &str) -> bool {
        let Some(caps) = CASHADDR.captures(address) else { return false };
        let (prefix, payload) = (&caps[1], &caps[2]);
        if !self.prefixes.iter().any(|p| p == prefix) {
            return false;
        }
        // Version byte must be P2PKH (q) or P2SH (p).
        if !payload.starts_with('q') && !payload.starts_with('p') {
            return false;
        }
        checksum_ok(prefix, payload)
    }
}

fn polymod(values: impl Iterator<Item = u8>) -> u64 {
    const GENERATORS: [u64; 5] = [0x98f2bc8e61, 0x79b76d99e2, 0xf33e5fb3c4, 0xae2eabe2a8, 0x1e4f43e470];
    let mut c: u64 = 1;
    for d in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (i, g) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 == 1 {
                c ^= g;
            }
        }
    }
    c ^ 1
}

fn checksum_ok(prefix: &str, payload: &str) -> bool {
    let mut data = Vec::with_capacity(payload.len());
    for ch in payload.bytes() {
        match CHARSET.iter().position(|&c| c == ch) {
            Some(v) => data.push(v as u8),
            None => return false,
        }
    }
    let values = prefix.bytes().map(|b| b & 0x1f).chain(std::iter::once(0)).chain(data);
    polymod(values) == 0
}

/// Drop a leading `network:` prefix. Applying it twice is the same as once.
pub fn strip_network_prefix(address: &str) -> &str {
    match address.find(':') {
        Some(i) => &address[i + 1..],
        None => address,
    }
}

/// `uri_prefix` followed by the bare address.
pub fn payment_uri(address: &str, uri_prefix: &str) -> String {
    format!("{uri_prefix}{}", strip_network_prefix(address))
}

/// Prepend `prefix:` unless the address already carries it.
pub fn with_prefix(address: &str, prefix: &str) -> String {
    if address.starts_with(prefix) && address[prefix.len()..].starts_with(':') {
        address.to_string()
    } else {
        format!("{prefix}:{address}")
    }
}
