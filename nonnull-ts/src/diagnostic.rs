use crate::project::Generation;
use std::fmt;
use std::path::PathBuf;

/// A file known to a [`crate::Project`]. Ids are interned per path and stay
/// the same across generations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// A diagnostic message and its nested explanations, flattened depth first.
///
/// The first entry is the headline; the last entry is the most specific
/// explanation the compiler gave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MessageChain(pub Vec<String>);

impl MessageChain {
  pub fn new(message: impl Into<String>) -> Self {
    Self(vec![message.into()])
  }

  pub fn leaf(&self) -> &str {
    self.0.last().map(String::as_str).unwrap_or_default()
  }

  pub fn flatten(&self) -> String {
    self.0.join("\n")
  }
}

impl fmt::Display for MessageChain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, message) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("\n")?;
        for _ in 0..i {
          f.write_str("  ")?;
        }
      }
      f.write_str(message)?;
    }
    Ok(())
  }
}

/// A diagnostic as reported by an [`crate::Analyzer`]: addressed by path and
/// UTF-16 offset, the way the TypeScript language service reports positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDiagnostic {
  pub path: PathBuf,
  pub start: u32,
  /// 1-based.
  pub line: u32,
  pub code: u32,
  pub message: MessageChain,
}

/// A diagnostic grounded in one generation of a project file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub file: FileId,
  /// Generation of `file` the offset was computed against.
  pub generation: Generation,
  /// UTF-8 byte offset.
  pub start: u32,
  pub line: u32,
  pub code: u32,
  pub message: MessageChain,
}

impl Diagnostic {
  pub fn key(&self) -> DiagnosticKey {
    DiagnosticKey {
      message: self.message.flatten(),
      line: self.line,
      file: self.file,
    }
  }
}

/// Identity of a diagnostic across generations. Offsets shift as edits land,
/// so they are not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagnosticKey {
  pub message: String,
  pub line: u32,
  pub file: FileId,
}

/// Decides whether a diagnostic reports a possibly absent value.
#[derive(Clone, Debug)]
pub struct AbsentValueFilter {
  keywords: Vec<String>,
}

pub const DEFAULT_KEYWORDS: &[&str] = &["undefined", "null"];

impl Default for AbsentValueFilter {
  fn default() -> Self {
    Self::new(DEFAULT_KEYWORDS.iter().copied())
  }
}

impl AbsentValueFilter {
  /// Empty keywords are ignored. A filter without keywords matches nothing.
  pub fn new<I, S>(keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut keywords: Vec<String> = keywords
      .into_iter()
      .map(Into::into)
      .filter(|k| !k.is_empty())
      .collect();
    keywords.dedup();
    Self { keywords }
  }

  pub fn keywords(&self) -> &[String] {
    &self.keywords
  }

  pub fn matches(&self, message: &MessageChain) -> bool {
    let leaf = message.leaf();
    self.keywords.iter().any(|k| leaf.contains(k.as_str()))
  }
}
