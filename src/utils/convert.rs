use anyhow::{anyhow, Context, Result};

/// Canonical form of an account address: trimmed, lowercase
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Parse a chain id given either as decimal (`137`) or `0x` hex (`0x89`)
pub fn parse_chain_id(value: &str) -> Result<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .with_context(|| format!("Invalid hex chain id: {}", value)),
        None if value.is_empty() => Err(anyhow!("Empty chain id")),
        None => value
            .parse::<u64>()
            .with_context(|| format!("Invalid chain id: {}", value)),
    }
}
