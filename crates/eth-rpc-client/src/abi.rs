//! Minimal ABI call-data encoding and return-data decoding.
//!
//! The contract surface Strongbox consumes is small and static: every
//! argument and return value is a 32-byte word, except the token name and
//! symbol which come back as dynamic strings. Selectors are precomputed
//! constants; nothing here hashes signatures at runtime.

use strongbox_core::RpcError;

/// One ABI head word
pub type Word = [u8; 32];

/// Left-pad a 20-byte address into a word.
pub fn word_from_address(addr: [u8; 20]) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&addr);
    word
}

/// Encode a u128 quantity into a big-endian word.
pub fn word_from_u128(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a u64 quantity into a big-endian word.
pub fn word_from_u64(value: u64) -> Word {
    word_from_u128(value as u128)
}

/// Build 0x-prefixed calldata from a selector and head words.
pub fn calldata(selector: [u8; 4], words: &[Word]) -> String {
    let mut out = String::with_capacity(10 + words.len() * 64);
    out.push_str("0x");
    out.push_str(&hex::encode(selector));
    for word in words {
        out.push_str(&hex::encode(word));
    }
    out
}

/// Decode 0x-prefixed hex into bytes.
pub fn hex_to_bytes(data: &str) -> Result<Vec<u8>, RpcError> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped).map_err(|e| RpcError::Parse(format!("invalid hex: {}", e)))
}

/// The word at head position `index` of ABI return data.
pub fn word_at(data: &[u8], index: usize) -> Result<Word, RpcError> {
    let start = index * 32;
    let end = start + 32;
    if data.len() < end {
        return Err(RpcError::Parse(format!(
            "return data too short: {} bytes, need word {}",
            data.len(),
            index
        )));
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[start..end]);
    Ok(word)
}

/// Decode a uint word into u64, rejecting values that overflow.
pub fn u64_from_word(word: &Word) -> Result<u64, RpcError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(RpcError::Parse("uint exceeds u64".to_string()));
    }
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(raw))
}

/// Decode a uint word into u128, rejecting values that overflow.
pub fn u128_from_word(word: &Word) -> Result<u128, RpcError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(RpcError::Parse("uint exceeds u128".to_string()));
    }
    let mut raw = [0u8; 16];
    raw.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(raw))
}

/// Decode a single ABI-encoded dynamic string return value.
///
/// Layout: word 0 is the offset to the tail, the tail starts with a length
/// word followed by the UTF-8 bytes.
pub fn string_from_return(data: &[u8]) -> Result<String, RpcError> {
    let offset = u64_from_word(&word_at(data, 0)?)? as usize;
    if data.len() < offset + 32 {
        return Err(RpcError::Parse("string offset out of range".to_string()));
    }
    let mut len_word = [0u8; 32];
    len_word.copy_from_slice(&data[offset..offset + 32]);
    let len = u64_from_word(&len_word)? as usize;
    let start = offset + 32;
    if data.len() < start + len {
        return Err(RpcError::Parse("string length out of range".to_string()));
    }
    String::from_utf8(data[start..start + len].to_vec())
        .map_err(|e| RpcError::Parse(format!("string not utf-8: {}", e)))
}

/// Parse a 0x-prefixed JSON-RPC quantity ("0x1a2b") into u64.
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(stripped, 16)
        .map_err(|e| RpcError::Parse(format!("invalid quantity {}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calldata_layout() {
        // balanceOf(address) for 0x00..ff
        let mut addr = [0u8; 20];
        addr[19] = 0xff;
        let data = calldata([0x70, 0xa0, 0x82, 0x31], &[word_from_address(addr)]);
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x70a08231"));
        assert!(data.ends_with("00ff"));
    }

    #[test]
    fn test_address_left_padding() {
        let word = word_from_address([0x11; 20]);
        assert!(word[..12].iter().all(|b| *b == 0));
        assert!(word[12..].iter().all(|b| *b == 0x11));
    }

    #[test]
    fn test_uint_roundtrip() {
        let word = word_from_u128(1_000_000_000_000_000_000_000);
        assert_eq!(u128_from_word(&word).unwrap(), 1_000_000_000_000_000_000_000);

        let word = word_from_u64(86_400);
        assert_eq!(u64_from_word(&word).unwrap(), 86_400);
    }

    #[test]
    fn test_uint_overflow_rejected() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(u64_from_word(&word).is_err());
        assert!(u128_from_word(&word).is_err());
    }

    #[test]
    fn test_string_decoding() {
        // "DLK" encoded as a dynamic string return
        let mut data = Vec::new();
        data.extend_from_slice(&word_from_u64(32));
        data.extend_from_slice(&word_from_u64(3));
        let mut tail = [0u8; 32];
        tail[..3].copy_from_slice(b"DLK");
        data.extend_from_slice(&tail);
        assert_eq!(string_from_return(&data).unwrap(), "DLK");
    }

    #[test]
    fn test_string_decoding_rejects_truncated() {
        let mut data = Vec::new();
        data.extend_from_slice(&word_from_u64(32));
        assert!(string_from_return(&data).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x2105").unwrap(), 8453);
        assert!(parse_quantity("0xzz").is_err());
    }
}
