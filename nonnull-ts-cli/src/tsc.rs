use crate::tsconfig::ProjectConfig;
use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use nonnull_ts::Analyzer;
use nonnull_ts::AnalyzerError;
use nonnull_ts::MessageChain;
use nonnull_ts::RawDiagnostic;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

const DIAGNOSTICS_SCRIPT: &str = include_str!("../scripts/diagnostics.js");

/// Runs the TypeScript compiler under Node.js and reports pre-emit
/// diagnostics for the project's own source files.
#[derive(Debug, Clone)]
pub struct TscAnalyzer {
  node_path: PathBuf,
  tsconfig: PathBuf,
  root_dir: PathBuf,
  typescript_lib: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TscOutput {
  #[serde(default)]
  pub typescript_version: Option<String>,
  pub diagnostics: Vec<TscDiagnostic>,
  #[serde(default)]
  pub crash: Option<TscCrash>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TscDiagnostic {
  pub file: String,
  /// UTF-16 offset.
  pub start: u32,
  /// 1-based.
  pub line: u32,
  pub code: u32,
  pub messages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TscCrash {
  pub message: String,
  #[serde(default)]
  pub stack: Option<String>,
}

impl TscAnalyzer {
  pub fn new(node_path: PathBuf, config: &ProjectConfig, typescript_lib: Option<PathBuf>) -> Self {
    Self {
      node_path,
      tsconfig: config.tsconfig_path.clone(),
      root_dir: config.root_dir.clone(),
      typescript_lib,
    }
  }

  pub fn available(&self) -> bool {
    match Command::new(&self.node_path).arg("--version").output() {
      Ok(output) => output.status.success(),
      Err(_) => false,
    }
  }

  pub fn run(&self) -> Result<TscOutput> {
    let mut cmd = Command::new(&self.node_path);
    cmd.current_dir(&self.root_dir);
    cmd.arg("-e").arg(DIAGNOSTICS_SCRIPT);
    cmd.env("NONNULL_TS_TSCONFIG", &self.tsconfig);
    match &self.typescript_lib {
      Some(lib) => cmd.env("NONNULL_TS_LIB", lib),
      None => cmd.env_remove("NONNULL_TS_LIB"),
    };

    let output = cmd
      .output()
      .with_context(|| format!("spawn node at {}", self.node_path.display()))?;

    if !output.status.success() {
      return Err(anyhow!(
        "diagnostics script exited with status {}: stdout={} stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
      ));
    }

    let parsed: TscOutput =
      serde_json::from_slice(&output.stdout).context("parse tsc JSON output")?;
    if let Some(version) = &parsed.typescript_version {
      debug!(version = %version, diagnostics = parsed.diagnostics.len(), "tsc finished");
    }
    Ok(parsed)
  }
}

impl Analyzer for TscAnalyzer {
  fn diagnostics(&mut self) -> std::result::Result<Vec<RawDiagnostic>, AnalyzerError> {
    let output = self
      .run()
      .map_err(|err| AnalyzerError::Failed(format!("{err:#}")))?;
    if let Some(crash) = output.crash {
      let mut message = crash.message;
      if let Some(stack) = crash.stack {
        message.push('\n');
        message.push_str(&stack);
      }
      return Err(AnalyzerError::Crashed { message });
    }
    Ok(
      output
        .diagnostics
        .into_iter()
        .map(|diag| RawDiagnostic {
          path: PathBuf::from(diag.file),
          start: diag.start,
          line: diag.line,
          code: diag.code,
          message: MessageChain(diag.messages),
        })
        .collect(),
    )
  }
}
