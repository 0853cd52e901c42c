use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// Relative path, below an ancestor directory, of the TypeScript compiler the
/// analyzer runs.
pub const TYPESCRIPT_LIB: &str = "node_modules/typescript/lib";
pub const TYPESCRIPT_ENTRY: &str = "typescript.js";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
  pub tsconfig_path: PathBuf,
  pub root_dir: PathBuf,
  /// Effective `strictNullChecks`, after `extends` and `strict`.
  pub strict_null_checks: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
  #[serde(default)]
  extends: Option<Extends>,
  #[serde(default)]
  compiler_options: RawCompilerOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
  One(String),
  Many(Vec<String>),
}

impl Extends {
  fn into_vec(self) -> Vec<String> {
    match self {
      Extends::One(one) => vec![one],
      Extends::Many(many) => many,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
  #[serde(default)]
  strict: Option<bool>,
  #[serde(default)]
  strict_null_checks: Option<bool>,
}

pub fn load_project_config(project: &Path) -> Result<ProjectConfig, String> {
  let tsconfig_path = resolve_tsconfig_path(project)?;
  let root_dir = tsconfig_path
    .parent()
    .ok_or_else(|| format!("invalid tsconfig path {}", tsconfig_path.display()))?
    .to_path_buf();
  let mut visited = HashSet::new();
  let raw = load_raw_config(&tsconfig_path, &mut visited)?;
  let options = raw.compiler_options;
  let strict_null_checks = options
    .strict_null_checks
    .or(options.strict)
    .unwrap_or(false);

  Ok(ProjectConfig {
    tsconfig_path,
    root_dir,
    strict_null_checks,
  })
}

fn resolve_tsconfig_path(project: &Path) -> Result<PathBuf, String> {
  let candidate = if project.is_dir() {
    project.join("tsconfig.json")
  } else {
    project.to_path_buf()
  };
  let absolute = if candidate.is_absolute() {
    candidate
  } else {
    std::env::current_dir()
      .map_err(|err| format!("failed to resolve current directory: {err}"))?
      .join(candidate)
  };
  absolute
    .canonicalize()
    .map_err(|err| format!("failed to read tsconfig {}: {err}", absolute.display()))
}

fn load_raw_config(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<RawTsConfig, String> {
  let canonical = path
    .canonicalize()
    .map_err(|err| format!("failed to read tsconfig {}: {err}", path.display()))?;
  if !visited.insert(canonical.clone()) {
    return Err(format!(
      "cycle detected while resolving tsconfig extends: {}",
      canonical.display()
    ));
  }

  let text = fs::read_to_string(&canonical)
    .map_err(|err| format!("failed to read {}: {err}", canonical.display()))?;
  let mut current: RawTsConfig = json5::from_str(&text)
    .map_err(|err| format!("failed to parse {}: {err}", canonical.display()))?;

  let Some(extends) = current.extends.take() else {
    return Ok(current);
  };

  let config_dir = canonical
    .parent()
    .ok_or_else(|| format!("invalid tsconfig path {}", canonical.display()))?;
  // Later bases override earlier ones; the extending file overrides them all.
  let mut merged = RawTsConfig::default();
  for extends in extends.into_vec() {
    let extends_path = resolve_extends_path(config_dir, &extends)?;
    let base = load_raw_config(&extends_path, visited)?;
    merged = merge_raw_configs(merged, base);
  }
  visited.remove(&canonical);
  Ok(merge_raw_configs(merged, current))
}

fn resolve_extends_path(config_dir: &Path, extends: &str) -> Result<PathBuf, String> {
  if extends.starts_with('.') || Path::new(extends).is_absolute() {
    return resolve_extends_file(&resolve_path_relative_to(config_dir, Path::new(extends)));
  }

  for ancestor in config_dir.ancestors() {
    let base = ancestor.join("node_modules").join(extends);
    if let Ok(resolved) = resolve_extends_file(&base) {
      return Ok(resolved);
    }
  }

  Err(format!(
    "failed to resolve tsconfig extends '{extends}' from {}",
    config_dir.display()
  ))
}

fn resolve_extends_file(candidate: &Path) -> Result<PathBuf, String> {
  let mut attempts = vec![candidate.to_path_buf()];
  if candidate.extension().is_none() {
    attempts.push(candidate.with_extension("json"));
  }
  if candidate.is_dir() {
    attempts.push(candidate.join("tsconfig.json"));
  }

  for attempt in attempts {
    if attempt.is_file() {
      return attempt.canonicalize().map_err(|err| {
        format!(
          "failed to read extended tsconfig {}: {err}",
          attempt.display()
        )
      });
    }
  }

  Err(format!(
    "extended tsconfig {} does not exist",
    candidate.display()
  ))
}

fn merge_raw_configs(base: RawTsConfig, overlay: RawTsConfig) -> RawTsConfig {
  RawTsConfig {
    extends: None,
    compiler_options: RawCompilerOptions {
      strict: overlay.compiler_options.strict.or(base.compiler_options.strict),
      strict_null_checks: overlay
        .compiler_options
        .strict_null_checks
        .or(base.compiler_options.strict_null_checks),
    },
  }
}

fn resolve_path_relative_to(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}

/// Walks up from `start` to the first ancestor that has the TypeScript
/// compiler installed below it and returns its `lib` directory.
pub fn find_typescript_lib(start: &Path) -> Option<PathBuf> {
  start.ancestors().find_map(|ancestor| {
    let lib = ancestor.join(TYPESCRIPT_LIB);
    lib.join(TYPESCRIPT_ENTRY).is_file().then_some(lib)
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
  }

  #[test]
  fn directory_argument_means_its_tsconfig() {
    let dir = TempDir::new().unwrap();
    write(
      dir.path(),
      "tsconfig.json",
      "{\n  // comments are allowed\n  \"compilerOptions\": { \"strict\": true, },\n}\n",
    );
    let config = load_project_config(dir.path()).unwrap();
    assert!(config.strict_null_checks);
    assert_eq!(config.root_dir, dir.path().canonicalize().unwrap());
    assert!(config.tsconfig_path.ends_with("tsconfig.json"));
  }

  #[test]
  fn explicit_option_beats_strict() {
    let dir = TempDir::new().unwrap();
    let path = write(
      dir.path(),
      "tsconfig.json",
      r#"{ "compilerOptions": { "strict": true, "strictNullChecks": false } }"#,
    );
    assert!(!load_project_config(&path).unwrap().strict_null_checks);
  }

  #[test]
  fn extends_chains_are_followed() {
    let dir = TempDir::new().unwrap();
    write(
      dir.path(),
      "node_modules/@tsconfig/strictest/tsconfig.json",
      r#"{ "compilerOptions": { "strict": true } }"#,
    );
    write(
      dir.path(),
      "base.json",
      r#"{ "extends": "@tsconfig/strictest/tsconfig.json", "compilerOptions": { "strict": false } }"#,
    );
    let path = write(
      dir.path(),
      "app/tsconfig.json",
      r#"{ "extends": ["../base"], "compilerOptions": { "strictNullChecks": true } }"#,
    );
    let config = load_project_config(&path).unwrap();
    assert!(config.strict_null_checks);

    let plain = write(dir.path(), "plain/tsconfig.json", r#"{ "extends": "../base.json" }"#);
    assert!(!load_project_config(&plain).unwrap().strict_null_checks);
  }

  #[test]
  fn shared_bases_are_not_cycles() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.json", r#"{ "compilerOptions": { "strict": true } }"#);
    write(dir.path(), "a.json", r#"{ "extends": "./common.json" }"#);
    let path = write(
      dir.path(),
      "tsconfig.json",
      r#"{ "extends": ["./a.json", "./common.json"] }"#,
    );
    assert!(load_project_config(&path).unwrap().strict_null_checks);
  }

  #[test]
  fn extends_cycles_are_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.json", r#"{ "extends": "./b.json" }"#);
    write(dir.path(), "b.json", r#"{ "extends": "./a.json" }"#);
    let err = load_project_config(&dir.path().join("a.json")).unwrap_err();
    assert!(err.contains("cycle detected"), "{err}");
  }

  #[test]
  fn missing_and_malformed_configs_fail() {
    let dir = TempDir::new().unwrap();
    let err = load_project_config(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.contains("failed to read tsconfig"), "{err}");

    let bad = write(dir.path(), "bad.json", "{ compilerOptions: ");
    let err = load_project_config(&bad).unwrap_err();
    assert!(err.contains("failed to parse"), "{err}");
  }

  #[test]
  fn typescript_lib_is_found_in_an_ancestor() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/typescript/lib/typescript.js", "");
    let nested = dir.path().join("packages/app/src");
    fs::create_dir_all(&nested).unwrap();
    assert_eq!(
      find_typescript_lib(&nested),
      Some(dir.path().join(TYPESCRIPT_LIB))
    );

    let empty = TempDir::new().unwrap();
    assert_eq!(find_typescript_lib(empty.path()), None);
  }
}
