/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD.
///
/// Binary layouts routinely carry strings from sources that do not
/// guarantee valid UTF-8. A lossy decode keeps the parse going; callers
/// that need the exact bytes should read a buffer instead.
#[must_use]
pub fn decode_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode a null-terminated string.
///
/// Returns the bytes before the first `0x00`. When no terminator is
/// present the final byte of the input is dropped, matching the legacy
/// behavior where the last byte was always assumed to be the terminator.
///
/// | Input              | Result |
/// |--------------------|--------|
/// | `[97, 98, 0, 99]`  | `"ab"` |
/// | `[97, 98]`         | `"a"`  |
/// | `[0]`              | `""`   |
/// | `[]`               | `""`   |
#[must_use]
pub fn decode_cstring(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or_else(|| bytes.len().saturating_sub(1));
    decode_string(&bytes[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_utf8() {
        assert_eq!(decode_string("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn string_replaces_invalid_utf8() {
        assert_eq!(decode_string(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn cstring_stops_at_first_null() {
        assert_eq!(decode_cstring(&[97, 98, 0, 99]), "ab");
        assert_eq!(decode_cstring(&[97, 0, 98, 0]), "a");
    }

    #[test]
    fn cstring_without_terminator_drops_last_byte() {
        assert_eq!(decode_cstring(&[97, 98]), "a");
        assert_eq!(decode_cstring(&[97]), "");
    }

    #[test]
    fn cstring_empty_inputs() {
        assert_eq!(decode_cstring(&[0]), "");
        assert_eq!(decode_cstring(&[]), "");
    }
}
