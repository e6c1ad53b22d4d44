use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const SHORT_PREFIX_LEN: usize = 6;
const SHORT_SUFFIX_LEN: usize = 4;

/// Account or contract address as handed out by the wallet.
///
/// The wallet is the authority on address formats, so the value is kept
/// verbatim and only shortened for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x1234...abcd` form used for button labels and the page title.
    pub fn short_form(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= SHORT_PREFIX_LEN + SHORT_SUFFIX_LEN {
            return self.0.clone();
        }
        let prefix: String = chars[..SHORT_PREFIX_LEN].iter().collect();
        let suffix: String = chars[chars.len() - SHORT_SUFFIX_LEN..].iter().collect();
        format!("{prefix}...{suffix}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Chain identifier. Travels over the wallet interface as a `0x`-prefixed
/// hex quantity (`0x2105` for Base mainnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = HexQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_hex_quantity(s)?;
        u64::try_from(value)
            .map(ChainId)
            .map_err(|_| HexQuantityError::Overflow(s.to_string()))
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexQuantityError {
    #[error("hex quantity '{0}' is missing the 0x prefix")]
    MissingPrefix(String),
    #[error("hex quantity '{0}' has no digits")]
    Empty(String),
    #[error("hex quantity '{0}' contains non-hex characters")]
    InvalidDigit(String),
    #[error("hex quantity '{0}' does not fit the target integer")]
    Overflow(String),
}

/// Parses a `0x`-prefixed hex quantity as returned by `eth_chainId` and
/// `eth_getBalance`.
pub fn parse_hex_quantity(raw: &str) -> Result<u128, HexQuantityError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| HexQuantityError::MissingPrefix(raw.to_string()))?;
    if digits.is_empty() {
        return Err(HexQuantityError::Empty(raw.to_string()));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexQuantityError::InvalidDigit(raw.to_string()));
    }
    u128::from_str_radix(digits, 16).map_err(|_| HexQuantityError::Overflow(raw.to_string()))
}

pub fn format_hex_quantity(value: u128) -> String {
    format!("{value:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_keeps_prefix_and_suffix() {
        let address = Address::from("0x6F446e3A8159B325a3CBd71e00dE7A067EB1B620");
        assert_eq!(address.short_form(), "0x6F44...B620");
    }

    #[test]
    fn short_form_leaves_short_values_alone() {
        assert_eq!(Address::from("0x1234").short_form(), "0x1234");
    }

    #[test]
    fn chain_id_uses_hex_on_the_wire() {
        let chain: ChainId = "0x2105".parse().expect("chain id");
        assert_eq!(chain, ChainId(8453));
        assert_eq!(chain.to_string(), "0x2105");
        assert_eq!(
            serde_json::to_string(&chain).expect("serialize"),
            "\"0x2105\""
        );
    }

    #[test]
    fn rejects_malformed_quantities() {
        assert_eq!(
            parse_hex_quantity("2105"),
            Err(HexQuantityError::MissingPrefix("2105".into()))
        );
        assert_eq!(
            parse_hex_quantity("0x"),
            Err(HexQuantityError::Empty("0x".into()))
        );
        assert_eq!(
            parse_hex_quantity("0xzz"),
            Err(HexQuantityError::InvalidDigit("0xzz".into()))
        );
        assert!(matches!(
            "0x1ffffffffffffffff".parse::<ChainId>(),
            Err(HexQuantityError::Overflow(_))
        ));
    }

    #[test]
    fn parses_one_ether_balance() {
        assert_eq!(
            parse_hex_quantity("0xde0b6b3a7640000"),
            Ok(1_000_000_000_000_000_000)
        );
        assert_eq!(format_hex_quantity(1_000_000_000_000_000_000), "0xde0b6b3a7640000");
    }
}
