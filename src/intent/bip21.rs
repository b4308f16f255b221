//! Simplified BIP21 for eCash: `ecash:<address>[?amount=<XEC>]`.
//!
//! - The scheme must equal the configured BIP21 prefix (`ecash:` by default), ignoring case.
//! - A bare address gets the network address prefix (`ecash:` / `ectest:`).
//! - `amount` is XEC; 1 XEC = 100 sats, rounded to the nearest sat.
//! - Every other query parameter is ignored.

use serde::Serialize;
use url::Url;

use super::address::{with_prefix, AddressValidator};
use crate::config::BridgeConfig;

/// Minor units per XEC.
pub const SATS_PER_XEC: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Network-prefixed address.
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sats: Option<u64>,
}

/// Parse a payment URI. `None` means the URI is not acceptable.
pub fn parse_bip21(uri: &str, config: &BridgeConfig, validator: &dyn AddressValidator) -> Option<PaymentRequest> {
    let url = Url::parse(uri).ok()?;
    let scheme = config.bip21_prefix().trim_end_matches(':');
    if !url.scheme().eq_ignore_ascii_case(scheme) {
        return None;
    }

    let address = with_prefix(url.path(), config.address_prefix());
    if !validator.is_valid(&address) {
        return None;
    }

    let sats = url
        .query_pairs()
        .find(|(key, _)| key == "amount")
        .and_then(|(_, value)| xec_to_sats(&value));

    Some(PaymentRequest { address, sats })
}

/// Positive finite decimal XEC to sats. Anything else yields `None`.
pub fn xec_to_sats(value: &str) -> Option<u64> {
    let xec: f64 = value.trim().parse().ok()?;
    if !xec.is_finite() || xec <= 0.0 {
        return None;
    }
    let sats = (xec * SATS_PER_XEC).round();
    if sats > u64::MAX as f64 {
        return None;
    }
    Some(sats as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::intent::address::CashAddrValidator;

    const ADDR: &str = "qpm2qsznhks23z7629mms6s4cwef74vcwva87rkuu2";

    fn mainnet() -> CashAddrValidator { CashAddrValidator::for_prefix("ecash") }

    fn config(network: Network) -> BridgeConfig { BridgeConfig::new(network) }

    #[test]
    fn parses_address_and_amount() {
        let req = parse_bip21(&format!("ecash:{ADDR}?amount=100.42"), &config(Network::Mainnet), &mainnet()).expect("valid");
        assert_eq!(req.address, format!("ecash:{ADDR}"));
        assert_eq!(req.sats, Some(10042));
    }

    #[test]
    fn amount_rounds_to_nearest_sat() {
        assert_eq!(xec_to_sats("0.005"), Some(1));
        assert_eq!(xec_to_sats("1.004"), Some(100));
        assert_eq!(xec_to_sats("5"), Some(500));
    }

    #[test]
    fn bad_amounts_are_dropped_not_fatal() {
        for amount in ["0", "-1", "abc", "", "inf", "NaN"] {
            let uri = format!("ecash:{ADDR}?amount={amount}");
            let req = parse_bip21(&uri, &config(Network::Mainnet), &mainnet()).expect("address still valid");
            assert_eq!(req.sats, None, "amount {amount:?}");
        }
    }

    #[test]
    fn other_params_are_ignored() {
        let uri = format!("ecash:{ADDR}?label=coffee&amount=2&message=hi");
        let req = parse_bip21(&uri, &config(Network::Mainnet), &mainnet()).expect("valid");
        assert_eq!(req.sats, Some(200));
    }

    #[test]
    fn rejects_wrong_scheme_and_bad_address() {
        assert!(parse_bip21(&format!("bitcoin:{ADDR}"), &config(Network::Mainnet), &mainnet()).is_none());
        assert!(parse_bip21(&format!("ecash://{ADDR}"), &config(Network::Mainnet), &mainnet()).is_none());
        assert!(parse_bip21("ecash:qnotanaddress", &config(Network::Mainnet), &mainnet()).is_none());
        assert!(parse_bip21("not a uri", &config(Network::Mainnet), &mainnet()).is_none());
    }

    #[test]
    fn testnet_uses_its_own_scheme() {
        let testnet = CashAddrValidator::for_prefix("ectest");
        let uri = "ectest:qpm2qsznhks23z7629mms6s4cwef74vcwvmvqr33lm?amount=1";
        let req = parse_bip21(uri, &config(Network::Testnet), &testnet).expect("valid");
        assert_eq!(req.address, "ectest:qpm2qsznhks23z7629mms6s4cwef74vcwvmvqr33lm");
        assert_eq!(req.sats, Some(100));

        assert!(parse_bip21(&format!("ecash:{ADDR}"), &config(Network::Testnet), &testnet).is_none());
    }

    #[test]
    fn configured_prefix_replaces_network_default() {
        let config = config(Network::Testnet).with_bip21_prefix("ecash:");
        let testnet = CashAddrValidator::for_prefix("ectest");
        let uri = "ECASH:ectest:qpm2qsznhks23z7629mms6s4cwef74vcwvmvqr33lm";
        let req = parse_bip21(uri, &config, &testnet).expect("valid");
        assert_eq!(req.address, "ectest:qpm2qsznhks23z7629mms6s4cwef74vcwvmvqr33lm");
        assert!(parse_bip21("ectest:qpm2qsznhks23z7629mms6s4cwef74vcwvmvqr33lm", &config, &testnet).is_none());
    }
}
