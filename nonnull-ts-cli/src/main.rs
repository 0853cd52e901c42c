use clap::ArgAction;
use clap::Parser;
use nonnull_ts::AbsentValueFilter;
use nonnull_ts::DiskHost;
use nonnull_ts::Driver;
use nonnull_ts::RunReport;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing::warn;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

mod tsc;
mod tsconfig;

use tsc::TscAnalyzer;

#[derive(Parser)]
#[command(
  author,
  version,
  about = "Insert non-null assertions until TypeScript stops reporting possibly-absent values"
)]
struct Cli {
  /// Path to tsconfig.json, or a directory containing one.
  #[arg(default_value = "tsconfig.json")]
  project: PathBuf,

  /// Node.js executable used to run the TypeScript compiler.
  #[arg(long, default_value = "node")]
  node: PathBuf,

  /// TypeScript `lib` directory. Defaults to the nearest
  /// `node_modules/typescript/lib` above the project.
  #[arg(long, value_name = "DIR")]
  typescript: Option<PathBuf>,

  /// Text identifying a possibly-absent value in a diagnostic message.
  /// Repeatable; replaces the defaults (`undefined`, `null`).
  #[arg(long = "keyword", value_name = "TEXT")]
  keywords: Vec<String>,

  /// Print the run report as JSON.
  #[arg(long)]
  json: bool,

  /// Increase log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
  #[arg(short, long, action = ArgAction::Count)]
  verbose: u8,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);
  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {err}");
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: u8) {
  let env_filter = match verbose {
    0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    1 => EnvFilter::new("debug"),
    _ => EnvFilter::new("trace"),
  };
  let builder = fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr);
  if let Err(err) = builder.try_init() {
    eprintln!("failed to install tracing subscriber: {err}");
  }
}

fn run(cli: Cli) -> Result<(), String> {
  let config = tsconfig::load_project_config(&cli.project)?;
  info!(tsconfig = %config.tsconfig_path.display(), "loaded project");
  if !config.strict_null_checks {
    warn!(
      tsconfig = %config.tsconfig_path.display(),
      "strictNullChecks is not enabled; the compiler will not report possibly-absent values"
    );
  }

  let typescript = match cli.typescript {
    Some(dir) => Some(check_typescript_dir(&dir)?),
    None => tsconfig::find_typescript_lib(&config.root_dir),
  };
  match &typescript {
    Some(lib) => info!(typescript = %lib.display(), "using TypeScript"),
    None => warn!(
      root = %config.root_dir.display(),
      "no {} found above the project; relying on Node module resolution",
      tsconfig::TYPESCRIPT_LIB
    ),
  }

  let analyzer = TscAnalyzer::new(cli.node.clone(), &config, typescript);
  if !analyzer.available() {
    return Err(format!("failed to run node at {}", cli.node.display()));
  }

  let filter = if cli.keywords.is_empty() {
    AbsentValueFilter::default()
  } else {
    AbsentValueFilter::new(cli.keywords)
  };
  let report = Driver::new(analyzer, DiskHost)
    .with_filter(filter)
    .run()
    .map_err(|err| err.to_string())?;

  if cli.json {
    let serialized = serde_json::to_string_pretty(&report)
      .map_err(|err| format!("failed to serialize JSON: {err}"))?;
    println!("{serialized}");
  } else {
    print_summary(&report);
  }
  Ok(())
}

fn check_typescript_dir(dir: &Path) -> Result<PathBuf, String> {
  let entry = dir.join(tsconfig::TYPESCRIPT_ENTRY);
  if !entry.is_file() {
    return Err(format!("{} does not exist", entry.display()));
  }
  dir
    .canonicalize()
    .map_err(|err| format!("failed to resolve {}: {err}", dir.display()))
}

fn print_summary(report: &RunReport) {
  for fix in &report.fixes {
    println!(
      "fixed {}:{} ({}): {}",
      fix.path.display(),
      fix.line,
      fix.node,
      fix.message
    );
  }
  for skipped in &report.skipped {
    println!(
      "skipped {}:{}: {} ({})",
      skipped.path.display(),
      skipped.line,
      skipped.message,
      skipped.reason
    );
  }
  println!(
    "{} fixed, {} skipped, {} remaining after {} generation(s)",
    report.fixes.len(),
    report.skipped.len(),
    report.remaining,
    report.generations
  );
}
