//! The fixed header banner and the repeating printable body pattern written
//! into every test file, plus the pure functions used by both the writer and
//! the verifier to agree on what a given byte offset should contain.

/// The printable alphabet the body pattern repeats.
pub const BODY_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of bytes read at each verification sample point.
pub const SAMPLE_LEN: usize = 64;

/// Returns the fixed ASCII header banner, terminated by `\n`.
#[must_use]
pub fn header_line() -> &'static str {
    "FILEDO FAKE-CAPACITY TEST FILE -- DO NOT EDIT\n"
}

/// Fills `buf` with the body pattern as it would appear starting at body
/// offset `start` (i.e. the byte distance past the header).
pub fn fill_body_pattern(buf: &mut [u8], start: u64) {
    let alphabet = BODY_ALPHABET.as_bytes();
    let len = alphabet.len() as u64;
    for (i, slot) in buf.iter_mut().enumerate() {
        let body_offset = start + i as u64;
        let idx = (body_offset % len) as usize;
        *slot = alphabet[idx];
    }
}

/// Returns the expected pattern bytes for the `len`-byte slice of a file
/// starting at absolute file offset `file_offset`, given the file's header
/// length. Offsets inside the header are not valid inputs; callers only use
/// this past the header.
#[must_use]
pub fn expected_pattern_slice(file_offset: u64, len: usize, header_len: u64) -> Vec<u8> {
    debug_assert!(file_offset >= header_len);
    let mut buf = vec![0_u8; len];
    fill_body_pattern(&mut buf, file_offset - header_len);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_ends_with_newline() {
        assert!(header_line().ends_with('\n'));
    }

    #[test]
    fn pattern_repeats_after_alphabet_length() {
        let header_len = header_line().len() as u64;
        let alphabet_len = BODY_ALPHABET.len() as u64;
        let first = expected_pattern_slice(header_len, 1, header_len);
        let wrapped = expected_pattern_slice(header_len + alphabet_len, 1, header_len);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn consecutive_offsets_match_whole_slice() {
        let header_len = header_line().len() as u64;
        let whole = expected_pattern_slice(header_len, 10, header_len);
        for (i, expected_byte) in whole.iter().enumerate() {
            let single = expected_pattern_slice(header_len + i as u64, 1, header_len);
            assert_eq!(single[0], *expected_byte);
        }
    }
}
