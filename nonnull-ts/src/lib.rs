//! Inserts TypeScript non-null assertions (`expr!`) until no fixable
//! "possibly undefined/null" diagnostic remains.
//!
//! The crate is split along the lines of the remediation loop:
//!
//! - [`resolve`] picks the node to assert for one diagnostic, following
//!   identifiers back to their declarations.
//! - [`mutate`] turns a chosen node into a text edit and applies it.
//! - [`driver`] queries an [`Analyzer`], walks its diagnostics, and reloads
//!   after every pass until a fixed point is reached.
//! - [`project`] owns source texts and parsed trees. Every edit bumps the
//!   file's [`Generation`], which invalidates node references and diagnostic
//!   offsets taken before it.
//!
//! ```
//! use nonnull_ts::mutate;
//! use nonnull_ts::resolve::{resolve, Target};
//! use syntax_ts::{parse, Dialect};
//!
//! let text = "declare const obj: Record<string, string[] | undefined>;\nconst a = obj[\"k\"];\n";
//! let tree = parse(text, Dialect::TypeScript).unwrap();
//! let offset = text.find("obj[").unwrap() as u32;
//! let fix = resolve(&tree, text, tree.root(), Target::StartsAt(offset)).unwrap();
//! let edit = mutate::plan(text, &fix).unwrap();
//! assert_eq!(edit.apply_to(text), text.replace("obj[\"k\"];", "obj[\"k\"]!;"));
//! ```

pub mod analyzer;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod mutate;
pub mod project;
pub mod resolve;

pub use analyzer::Analyzer;
pub use diagnostic::AbsentValueFilter;
pub use diagnostic::Diagnostic;
pub use diagnostic::DiagnosticKey;
pub use diagnostic::FileId;
pub use diagnostic::MessageChain;
pub use diagnostic::RawDiagnostic;
pub use driver::Driver;
pub use driver::RunReport;
pub use error::AnalyzerError;
pub use error::EditError;
pub use error::FixError;
pub use error::Unfixable;
pub use project::DiskHost;
pub use project::Generation;
pub use project::MemoryHost;
pub use project::NodeRef;
pub use project::Project;
pub use project::SourceHost;
