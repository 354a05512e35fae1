//! Incremental UTF-8 decoding for [`Sequence::from_utf8`](crate::Sequence::from_utf8).

use std::sync::Arc;

/// Decodes one `char` per pull. Each invalid byte decodes to [`char::REPLACEMENT_CHARACTER`] and
/// advances the cursor by exactly one byte.
pub(crate) struct Utf8Decoder {
    bytes: Arc<[u8]>,
    pos: usize,
}

impl Utf8Decoder {
    pub(crate) fn new(bytes: Arc<[u8]>) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Iterator for Utf8Decoder {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.pos..).filter(|rest| !rest.is_empty())?;
        let (ch, width) = decode_first(rest);
        self.pos += width;
        Some(ch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bytes.len() - self.pos;
        (remaining.div_ceil(4), Some(remaining))
    }
}

/// Decodes the first code point of non-empty `bytes`, returning it with its encoded width.
fn decode_first(bytes: &[u8]) -> (char, usize) {
    // A code point is at most four bytes long.
    let window = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(text) => text,
        Err(err) => std::str::from_utf8(&window[..err.valid_up_to()]).unwrap_or_default(),
    };
    match valid.chars().next() {
        Some(ch) => (ch, ch.len_utf8()),
        None => (char::REPLACEMENT_CHARACTER, 1),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(bytes: &[u8]) -> String {
        Utf8Decoder::new(Arc::from(bytes)).collect()
    }

    #[test]
    fn test_valid_text() {
        assert_eq!("héllo, 世界 🦀", decode("héllo, 世界 🦀".as_bytes()));
    }

    #[test]
    fn test_invalid_bytes_emit_one_replacement_each() {
        assert_eq!("a\u{FFFD}\u{FFFD}b", decode(b"a\xff\xfeb"));
        // Truncated three-byte sequence at the end.
        assert_eq!("x\u{FFFD}\u{FFFD}", decode(b"x\xe4\xb8"));
        // Lone continuation byte before a valid multi-byte char.
        assert_eq!("\u{FFFD}世", decode(b"\x80\xe4\xb8\x96"));
    }

    #[test]
    fn test_empty() {
        assert_eq!("", decode(b""));
    }
}
