/// A half-open byte range within a single file.
///
/// Offsets are **UTF-8 byte offsets** into the text the tree was parsed from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TextRange {
  pub start: u32,
  pub end: u32,
}

impl TextRange {
  pub const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  pub fn as_usize(&self) -> std::ops::Range<usize> {
    self.start as usize..self.end as usize
  }
}

#[derive(Clone, Copy, Debug)]
struct WideChar {
  byte: u32,
  utf16: u32,
  byte_len: u32,
  utf16_len: u32,
}

/// Maps UTF-16 code unit offsets to UTF-8 byte offsets.
///
/// The TypeScript language service reports positions in UTF-16 code units,
/// while every tree in this crate is addressed by byte offsets.
#[derive(Clone, Debug)]
pub struct Utf16Index {
  wide_chars: Vec<WideChar>,
  len: u32,
}

impl Utf16Index {
  pub fn new(text: &str) -> Self {
    let mut wide_chars = Vec::new();
    let mut utf16 = 0u32;
    for (byte, ch) in text.char_indices() {
      let byte = byte as u32;
      let byte_len = ch.len_utf8() as u32;
      let utf16_len = ch.len_utf16() as u32;
      if byte_len > 1 {
        wide_chars.push(WideChar {
          byte,
          utf16,
          byte_len,
          utf16_len,
        });
      }
      utf16 += utf16_len;
    }
    Self {
      wide_chars,
      len: text.len() as u32,
    }
  }

  /// Converts a UTF-16 offset to a byte offset. Offsets inside a multi-byte
  /// character snap to its first byte; offsets past the end clamp to the text
  /// length.
  pub fn byte_of_utf16(&self, utf16: u32) -> u32 {
    let idx = self.wide_chars.partition_point(|w| w.utf16 <= utf16);
    let byte = match idx.checked_sub(1).map(|i| self.wide_chars[i]) {
      None => utf16,
      Some(w) if utf16 < w.utf16 + w.utf16_len => w.byte,
      Some(w) => w.byte + w.byte_len + (utf16 - w.utf16 - w.utf16_len),
    };
    byte.min(self.len)
  }
}
