use crate::blockchain::units::{canonical_hex, parse_hex_u256, strip_hex_prefix};
use crate::error::DecodeError;
use crate::models::{RawLog, TransferEvent};

/// Token Transfer event signature: keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_EVENT_SIGNATURE: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// Decode a log as a token transfer.
///
/// Returns `Ok(None)` when the primary topic is not the Transfer signature.
/// A log that carries the signature but cannot be parsed is a `DecodeError`.
pub fn decode_transfer(log: &RawLog) -> Result<Option<TransferEvent>, DecodeError> {
    match log.topics.first() {
        Some(topic) if normalize_address(topic) == normalize_address(TRANSFER_EVENT_SIGNATURE) => {}
        _ => return Ok(None),
    }

    // [signature, from, to]
    if log.topics.len() != 3 {
        return Err(DecodeError::TopicCount {
            expected: 3,
            got: log.topics.len(),
        });
    }

    let from = extract_address_from_topic(&log.topics[1])?;
    let to = extract_address_from_topic(&log.topics[2])?;
    let raw_value = extract_amount_from_data(&log.data)?;

    Ok(Some(TransferEvent {
        contract: canonical_address(&log.address),
        from,
        to,
        raw_value,
        log_index: log.log_index,
    }))
}

/// Every transfer event in `logs`, in log order; undecodable entries are skipped
pub fn decode_all_transfers(logs: &[RawLog]) -> Vec<TransferEvent> {
    logs.iter()
        .filter_map(|entry| match decode_transfer(entry) {
            Ok(event) => event,
            Err(e) => {
                log::debug!(
                    "Skipping malformed transfer log {} in {}: {}",
                    entry.log_index,
                    entry.transaction_hash,
                    e
                );
                None
            }
        })
        .collect()
}

/// Normalize an address (or any hex word) to lowercase without 0x prefix
pub fn normalize_address(address: &str) -> String {
    strip_hex_prefix(address.trim()).to_lowercase()
}

/// Lowercase `0x`-prefixed form used in every result this crate returns
pub fn canonical_address(address: &str) -> String {
    canonical_hex(address)
}

/// Case-insensitive address comparison
pub fn addresses_equal(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Validate that an address is 20 hex-encoded bytes
pub fn validate_address(address: &str) -> Result<(), DecodeError> {
    let normalized = normalize_address(address);

    if normalized.len() != 40 {
        return Err(DecodeError::InvalidTopic(format!(
            "Address must be 40 characters long, got {}",
            normalized.len()
        )));
    }

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidTopic(
            "Address contains non-hexadecimal characters".to_string(),
        ));
    }

    Ok(())
}

/// The address sits right-aligned in the low 20 bytes of a 32-byte topic
fn extract_address_from_topic(topic: &str) -> Result<String, DecodeError> {
    let normalized_topic = normalize_address(topic);

    if normalized_topic.len() != 64 {
        return Err(DecodeError::InvalidTopic(format!(
            "Topic should be 64 characters, got {}",
            normalized_topic.len()
        )));
    }

    let address = &normalized_topic[24..64];
    validate_address(address)?;

    Ok(format!("0x{}", address))
}

fn extract_amount_from_data(data: &str) -> Result<alloy_primitives::U256, DecodeError> {
    if strip_hex_prefix(data.trim()).is_empty() {
        return Err(DecodeError::EmptyData);
    }
    parse_hex_u256(data).map_err(DecodeError::InvalidData)
}
