//! Hex quantity parsing and decimal scaling of on-chain integers.

use alloy_primitives::U256;

/// Strip an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Lowercase `0x`-prefixed form of a hex string (hashes, addresses)
pub fn canonical_hex(value: &str) -> String {
    format!("0x{}", strip_hex_prefix(value.trim()).to_lowercase())
}

pub fn parse_hex_u64(hex_str: &str) -> Result<u64, String> {
    let digits = strip_hex_prefix(hex_str.trim());
    if digits.is_empty() {
        return Err(format!("empty hex quantity '{}'", hex_str));
    }
    u64::from_str_radix(digits, 16).map_err(|e| format!("failed to parse hex '{}' to u64: {}", hex_str, e))
}

pub fn parse_hex_u256(hex_str: &str) -> Result<U256, String> {
    let digits = strip_hex_prefix(hex_str.trim());
    if digits.is_empty() {
        return Err(format!("empty hex quantity '{}'", hex_str));
    }
    if digits.len() > 64 {
        return Err(format!("hex quantity '{}' exceeds 256 bits", hex_str));
    }
    U256::from_str_radix(digits, 16).map_err(|e| format!("failed to parse hex '{}' to u256: {}", hex_str, e))
}

/// Render `value / 10^decimals` as an exact decimal string.
///
/// Trailing fractional zeros are trimmed, so `10^18` at 18 decimals is `"1"`
/// and `1.5 * 10^18` is `"1.5"`. Decimals too large for a 256-bit power of ten
/// fall back to the unscaled integer.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let divisor = match U256::from(10u8).checked_pow(U256::from(decimals)) {
        Some(divisor) => divisor,
        None => return value.to_string(),
    };

    let integer = value / divisor;
    let fraction = value % divisor;
    if fraction.is_zero() {
        return integer.to_string();
    }

    let padded = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", integer, padded.trim_end_matches('0'))
}
