//! Input validation helpers
//!
//! Format checks only; nothing here talks to a chain.

use bip39::{Language, Mnemonic};

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate an EVM address (`0x` followed by 40 hex digits)
pub fn validate_address(address: &str) -> bool {
    address.len() == 42 && address.starts_with("0x") && is_hex_of_len(&address[2..], 40)
}

/// Validate a secp256k1 private key in hex, with or without `0x`
pub fn validate_private_key(private_key: &str) -> bool {
    let hex_key = strip_hex_prefix(private_key);
    if !is_hex_of_len(hex_key, 64) {
        return false;
    }
    match hex::decode(hex_key) {
        Ok(bytes) => k256::SecretKey::from_slice(&bytes).is_ok(),
        Err(_) => false,
    }
}

/// Parse an English BIP-39 mnemonic, checking its wordlist and checksum
pub fn parse_mnemonic(mnemonic: &str) -> Option<Mnemonic> {
    Mnemonic::parse_in_normalized(Language::English, mnemonic).ok()
}

/// Validate a BIP-39 mnemonic phrase
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    parse_mnemonic(mnemonic).is_some()
}

/// Parse a strictly positive, finite decimal amount
pub fn parse_amount(amount: &str) -> Option<f64> {
    amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Validate an amount value
pub fn validate_amount(amount: &str) -> bool {
    parse_amount(amount).is_some()
}

/// Validate a transaction hash (optional `0x`, 64 hex digits)
pub fn validate_transaction_hash(tx_hash: &str) -> bool {
    is_hex_of_len(strip_hex_prefix(tx_hash), 64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_address() {
        assert!(validate_address("0x1234567890123456789012345678901234567890"));
        assert!(validate_address("0xABCDEFabcdef1234567890123456789012345678"));
        assert!(!validate_address("1234567890123456789012345678901234567890"));
        assert!(!validate_address("0x123"));
        assert!(!validate_address("0xZZ34567890123456789012345678901234567890"));
    }

    #[test]
    fn test_validate_private_key() {
        let key = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        assert!(validate_private_key(key));
        assert!(validate_private_key(&format!("0x{}", key)));
        assert!(!validate_private_key(&"0".repeat(64)));
        assert!(!validate_private_key("abc"));
    }

    #[test]
    fn test_validate_mnemonic() {
        let phrase = "abandon ".repeat(11) + "about";
        assert!(validate_mnemonic(&phrase));
        assert!(validate_mnemonic(&format!("  {}\n", phrase)));
        assert!(!validate_mnemonic("too short phrase"));

        // right length and wordlist, wrong checksum
        assert!(!validate_mnemonic(&"abandon ".repeat(12)));
        assert!(!validate_mnemonic(&("zzzz ".repeat(11) + "qqqq")));
        assert!(!validate_mnemonic(&("Abandon ".repeat(11) + "about")));
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("1.5"));
        assert!(validate_amount("100"));
        assert!(!validate_amount("0"));
        assert!(!validate_amount("-1"));
        assert!(!validate_amount("abc"));
        assert!(!validate_amount("inf"));
    }

    #[test]
    fn test_validate_transaction_hash() {
        assert!(validate_transaction_hash(&"a".repeat(64)));
        assert!(validate_transaction_hash(&format!("0x{}", "a".repeat(64))));
        assert!(!validate_transaction_hash("0x1234"));
    }
}
