use crate::diagnostic::RawDiagnostic;
use crate::error::AnalyzerError;

/// Source of compiler diagnostics for a loaded project.
///
/// Every call must reflect the files as currently persisted by the project's
/// [`crate::SourceHost`]; the driver persists its edits before asking again.
/// Diagnostics are expected in a stable order, grouped by file.
pub trait Analyzer {
  fn diagnostics(&mut self) -> Result<Vec<RawDiagnostic>, AnalyzerError>;
}

impl<A: Analyzer + ?Sized> Analyzer for &mut A {
  fn diagnostics(&mut self) -> Result<Vec<RawDiagnostic>, AnalyzerError> {
    (**self).diagnostics()
  }
}
