use crate::diagnostic::FileId;
use crate::project::Generation;
use std::io;
use std::path::PathBuf;
use syntax_ts::SyntaxError;
use syntax_ts::SyntaxKind;
use thiserror::Error;

/// Failures that abort a run.
#[derive(Debug, Error)]
pub enum FixError {
  #[error(transparent)]
  Analyzer(#[from] AnalyzerError),
  #[error("failed to read {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to write {}: {source}", .path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to parse {}: {source}", .path.display())]
  Syntax {
    path: PathBuf,
    #[source]
    source: SyntaxError,
  },
  #[error("unknown file {0:?}")]
  UnknownFile(FileId),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
  #[error("analyzer failed: {0}")]
  Failed(String),
  #[error("analyzer crashed: {message}")]
  Crashed { message: String },
  #[error(transparent)]
  Io(#[from] io::Error),
}

/// Why a single diagnostic could not be fixed. The driver records the
/// diagnostic and never retries it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Unfixable {
  #[error("no element access, return statement or identifier at the reported position")]
  NoCandidate,
  #[error("return statements are never wrapped")]
  ReturnStatement,
  #[error("`{name}` has no value declaration in this file")]
  NoDeclaration { name: String },
  #[error("`{name}` is the binding name itself; an assertion cannot follow it")]
  BindingName { name: String },
  #[error("declarations of `{name}` refer back to themselves")]
  DeclarationCycle { name: String },
  #[error("{kind} declaration of `{name}` has no initializer")]
  MissingInitializer { kind: SyntaxKind, name: String },
  #[error("file could not be parsed: {0}")]
  Parse(SyntaxError),
  #[error(transparent)]
  Edit(#[from] EditError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
  #[error("edit was planned against generation {found} but the file is at generation {current}")]
  Stale {
    current: Generation,
    found: Generation,
  },
  #[error("file {0:?} is not loaded")]
  NotLoaded(FileId),
  #[error("range {start}..{end} is outside the text or splits a character")]
  OutOfBounds { start: u32, end: u32 },
}
