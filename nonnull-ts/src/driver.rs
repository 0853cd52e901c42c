//! The fixed-point loop.
//!
//! Each generation asks the analyzer for diagnostics, walks them once
//! (fixing at most one per file, since an edit makes the rest of that file's
//! offsets stale), persists the edits, and reloads. The run stops after a
//! pass that fixed nothing. Diagnostics that could not be fixed are recorded
//! by identity and never attempted again, so every pass either edits a file
//! or leaves the project unchanged.

use crate::analyzer::Analyzer;
use crate::diagnostic::AbsentValueFilter;
use crate::diagnostic::Diagnostic;
use crate::diagnostic::DiagnosticKey;
use crate::error::FixError;
use crate::error::Unfixable;
use crate::mutate;
use crate::project::Project;
use crate::project::SourceHost;
use crate::resolve::resolve;
use crate::resolve::FixAction;
use crate::resolve::Target;
use ahash::HashSet;
use ahash::HashSetExt;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedFix {
  pub path: PathBuf,
  pub line: u32,
  /// Byte offset the diagnostic was reported at.
  pub offset: u32,
  pub code: u32,
  pub message: String,
  /// Grammar name of the node that was asserted.
  pub node: &'static str,
  pub action: FixAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedDiagnostic {
  pub path: PathBuf,
  pub line: u32,
  pub code: u32,
  pub message: String,
  pub reason: String,
}

/// Result of one Scanning pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassOutcome {
  pub fixes: Vec<AppliedFix>,
  pub skipped: Vec<SkippedDiagnostic>,
  /// Candidates left for the next generation because their file was edited
  /// earlier in this pass.
  pub deferred: usize,
}

impl PassOutcome {
  pub fn made_progress(&self) -> bool {
    !self.fixes.is_empty()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub generations: u32,
  pub fixes: Vec<AppliedFix>,
  pub skipped: Vec<SkippedDiagnostic>,
  /// Matching diagnostics reported at the start of each generation.
  pub matching: Vec<usize>,
  /// Matching diagnostics still reported by the last generation.
  pub remaining: usize,
}

pub struct Driver<A, H> {
  analyzer: A,
  project: Project<H>,
  filter: AbsentValueFilter,
  skip: HashSet<DiagnosticKey>,
}

impl<A: Analyzer, H: SourceHost> Driver<A, H> {
  pub fn new(analyzer: A, host: H) -> Self {
    Self {
      analyzer,
      project: Project::new(host),
      filter: AbsentValueFilter::default(),
      skip: HashSet::new(),
    }
  }

  pub fn with_filter(mut self, filter: AbsentValueFilter) -> Self {
    self.filter = filter;
    self
  }

  pub fn project_mut(&mut self) -> &mut Project<H> {
    &mut self.project
  }

  pub fn is_skipped(&self, key: &DiagnosticKey) -> bool {
    self.skip.contains(key)
  }

  fn is_candidate(&self, diagnostic: &Diagnostic) -> bool {
    self.filter.matches(&diagnostic.message) && !self.skip.contains(&diagnostic.key())
  }

  fn path_of(&self, diagnostic: &Diagnostic) -> PathBuf {
    self
      .project
      .path(diagnostic.file)
      .map(|p| p.to_path_buf())
      .unwrap_or_default()
  }

  /// One Scanning pass over `diagnostics`, which must come from the project's
  /// current generation or earlier.
  pub fn scan(&mut self, diagnostics: &[Diagnostic]) -> Result<PassOutcome, FixError> {
    let mut outcome = PassOutcome::default();
    let mut cursor = 0;
    while let Some(diagnostic) = diagnostics.get(cursor) {
      cursor += 1;
      if !self.is_candidate(diagnostic) {
        continue;
      }
      if self.project.generation(diagnostic.file) != Some(diagnostic.generation) {
        outcome.deferred += 1;
        continue;
      }

      let path = self.path_of(diagnostic);
      info!(
        file = %path.display(),
        line = diagnostic.line,
        offset = diagnostic.start,
        message = diagnostic.message.leaf(),
        "attempting fix"
      );
      match self.attempt(diagnostic)? {
        Ok((node, action)) => {
          outcome.fixes.push(AppliedFix {
            path,
            line: diagnostic.line,
            offset: diagnostic.start,
            code: diagnostic.code,
            message: diagnostic.message.leaf().to_string(),
            node,
            action,
          });
          // Offsets of the file's remaining diagnostics no longer line up.
          while let Some(next) = diagnostics.get(cursor) {
            if next.file != diagnostic.file {
              break;
            }
            if self.is_candidate(next) {
              outcome.deferred += 1;
            }
            cursor += 1;
          }
        }
        Err(reason) => {
          warn!(
            file = %path.display(),
            line = diagnostic.line,
            %reason,
            "skipping diagnostic"
          );
          self.skip.insert(diagnostic.key());
          outcome.skipped.push(SkippedDiagnostic {
            path,
            line: diagnostic.line,
            code: diagnostic.code,
            message: diagnostic.message.leaf().to_string(),
            reason: reason.to_string(),
          });
        }
      }
    }
    Ok(outcome)
  }

  /// Resolves and applies a fix for one diagnostic. The outer error is fatal,
  /// the inner one is recorded against the diagnostic.
  fn attempt(
    &mut self,
    diagnostic: &Diagnostic,
  ) -> Result<Result<(&'static str, FixAction), Unfixable>, FixError> {
    let snapshot = match self.project.snapshot(diagnostic.file) {
      Ok(snapshot) => snapshot,
      Err(err) => return per_diagnostic(err).map(Err),
    };
    let tree = snapshot.tree;
    let resolved = resolve(
      tree,
      snapshot.text,
      tree.root(),
      Target::StartsAt(diagnostic.start),
    )
    .map(|fix| (fix, snapshot.node_ref(fix.node), tree.node(fix.node).raw_kind));
    let (fix, at, raw_kind) = match resolved {
      Ok(resolved) => resolved,
      Err(reason) => return Ok(Err(reason)),
    };
    Ok(
      mutate::apply(&mut self.project, at, &fix)
        .map(|_| (raw_kind, fix.action))
        .map_err(Unfixable::from),
    )
  }

  /// Runs generations until a pass makes no fix.
  pub fn run(&mut self) -> Result<RunReport, FixError> {
    let mut report = RunReport::default();
    loop {
      let raw = self.analyzer.diagnostics()?;
      let diagnostics = self.project.ingest(raw)?;
      report.generations += 1;
      let matching = diagnostics
        .iter()
        .filter(|d| self.filter.matches(&d.message))
        .count();
      info!(
        generation = report.generations,
        diagnostics = diagnostics.len(),
        matching,
        "diagnostics loaded"
      );
      report.matching.push(matching);

      let outcome = self.scan(&diagnostics)?;
      let progressed = outcome.made_progress();
      report.fixes.extend(outcome.fixes);
      report.skipped.extend(outcome.skipped);
      if !progressed {
        report.remaining = matching;
        break;
      }

      let written = self.project.persist()?;
      info!(files = written.len(), "reloading after edits");
      self.project.discard();
    }
    info!(
      generations = report.generations,
      fixes = report.fixes.len(),
      skipped = report.skipped.len(),
      remaining = report.remaining,
      "fixed point reached"
    );
    Ok(report)
  }
}

/// Splits failures that only concern the diagnostic being fixed from those
/// that end the run.
fn per_diagnostic(err: FixError) -> Result<Unfixable, FixError> {
  match err {
    FixError::Syntax { source, .. } => Ok(Unfixable::Parse(source)),
    err => Err(err),
  }
}
