//! Textual application of a [`Fix`].
//!
//! Edits are computed from the node's source text rather than its structure:
//! a node may end in a statement terminator followed by trivia, and the
//! assertion has to land before the terminator with everything after it kept
//! in place.

use crate::error::EditError;
use crate::project::Generation;
use crate::project::NodeRef;
use crate::project::Project;
use crate::project::SourceHost;
use crate::resolve::Fix;
use crate::resolve::FixAction;
use syntax_ts::TextRange;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
  pub range: TextRange,
  pub replacement: String,
}

impl TextEdit {
  pub fn insert(offset: u32, text: impl Into<String>) -> Self {
    Self {
      range: TextRange::new(offset, offset),
      replacement: text.into(),
    }
  }

  /// `text` with this edit applied. Out-of-range edits leave it unchanged.
  pub fn apply_to(&self, text: &str) -> String {
    let mut out = text.to_string();
    let range = self.range.as_usize();
    if out.get(range.clone()).is_some() {
      out.replace_range(range, &self.replacement);
    }
    out
  }
}

pub fn plan(text: &str, fix: &Fix) -> Result<TextEdit, EditError> {
  let node_text = text.get(fix.range.as_usize()).ok_or(EditError::OutOfBounds {
    start: fix.range.start,
    end: fix.range.end,
  })?;
  Ok(match fix.action {
    FixAction::Append => {
      let trimmed = node_text.trim_end();
      let at = match trimmed.strip_suffix(';') {
        Some(body) => body.len(),
        None => node_text.len(),
      };
      TextEdit::insert(fix.range.start + at as u32, "!")
    }
    FixAction::ExpandShorthand => {
      TextEdit::insert(fix.range.end, format!(": {node_text}!"))
    }
  })
}

/// Plans `fix` against the generation `at` refers to and applies it.
/// Returns the edit and the file's new generation.
pub fn apply<H: SourceHost>(
  project: &mut Project<H>,
  at: NodeRef,
  fix: &Fix,
) -> Result<(TextEdit, Generation), EditError> {
  let edit = plan(project.text_at(at)?, fix)?;
  let generation = project.apply(at, &edit)?;
  Ok((edit, generation))
}

#[cfg(test)]
mod tests {
  use super::*;
  use syntax_ts::NodeId;

  fn fix(text: &str, needle: &str, action: FixAction) -> Fix {
    let start = text.find(needle).unwrap() as u32;
    Fix {
      node: NodeId(0),
      range: TextRange::new(start, start + needle.len() as u32),
      action,
    }
  }

  #[test]
  fn appends_after_expression() {
    let text = "const a = obj[\"k\"];";
    let edit = plan(text, &fix(text, "obj[\"k\"]", FixAction::Append)).unwrap();
    assert_eq!(edit.apply_to(text), "const a = obj[\"k\"]!;");
  }

  #[test]
  fn inserts_before_terminator_and_keeps_trivia() {
    let text = "return value; // trailing\n";
    let edit = plan(text, &fix(text, "return value; ", FixAction::Append)).unwrap();
    assert_eq!(edit, TextEdit::insert(12, "!"));
    assert_eq!(edit.apply_to(text), "return value!; // trailing\n");
  }

  #[test]
  fn expands_shorthand_property() {
    let text = "return {nice};";
    let edit = plan(text, &fix(text, "nice", FixAction::ExpandShorthand)).unwrap();
    assert_eq!(edit.apply_to(text), "return {nice: nice!};");
  }

  #[test]
  fn rejects_ranges_outside_the_text() {
    let bad = Fix {
      node: NodeId(0),
      range: TextRange::new(3, 10),
      action: FixAction::Append,
    };
    assert!(matches!(
      plan("abc", &bad),
      Err(EditError::OutOfBounds { start: 3, end: 10 })
    ));
  }
}
