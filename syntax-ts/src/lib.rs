//! Syntax trees for TypeScript and TSX sources.
//!
//! [`parse`] runs the tree-sitter TypeScript grammar, lowers the result into a
//! compact arena ([`SyntaxTree`]) and binds identifiers to their declarations
//! within the file. Parsing is error tolerant: a file with syntax errors still
//! yields a tree, with [`SyntaxTree::has_errors`] set.

use std::path::Path;

mod bind;
pub mod error;
pub mod kind;
pub mod loc;
mod lower;
pub mod tree;

pub use error::SyntaxError;
pub use error::SyntaxResult;
pub use kind::SyntaxKind;
pub use loc::TextRange;
pub use loc::Utf16Index;
pub use tree::Node;
pub use tree::NodeId;
pub use tree::SyntaxTree;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Dialect {
  #[default]
  TypeScript,
  /// TypeScript with JSX. Also used for plain JavaScript files, which the
  /// TSX grammar accepts.
  Tsx,
}

impl Dialect {
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("tsx" | "jsx" | "js" | "mjs" | "cjs") => Dialect::Tsx,
      _ => Dialect::TypeScript,
    }
  }

  fn name(self) -> &'static str {
    match self {
      Dialect::TypeScript => "typescript",
      Dialect::Tsx => "tsx",
    }
  }

  fn language(self) -> tree_sitter::Language {
    match self {
      Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
      Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
  }
}

pub fn parse(source: &str, dialect: Dialect) -> SyntaxResult<SyntaxTree> {
  if u32::try_from(source.len()).is_err() {
    return Err(SyntaxError::TooLarge { len: source.len() });
  }
  let mut parser = tree_sitter::Parser::new();
  parser
    .set_language(&dialect.language())
    .map_err(|err| SyntaxError::Language {
      dialect: dialect.name(),
      message: err.to_string(),
    })?;
  let raw = parser.parse(source, None).ok_or(SyntaxError::Cancelled)?;
  let mut tree = lower::lower(&raw);
  bind::bind(&mut tree, source);
  Ok(tree)
}
