//! Source texts and syntax trees, stamped with per-file generations.
//!
//! A [`NodeRef`] or [`Diagnostic`] carries the generation of the file it was
//! taken from. Applying an edit bumps that generation, so anything computed
//! against the old text is rejected instead of being applied at a shifted
//! offset.

use crate::diagnostic::Diagnostic;
use crate::diagnostic::FileId;
use crate::diagnostic::RawDiagnostic;
use crate::error::EditError;
use crate::error::FixError;
use crate::mutate::TextEdit;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use syntax_ts::Dialect;
use syntax_ts::NodeId;
use syntax_ts::SyntaxTree;
use syntax_ts::Utf16Index;
use tracing::debug;
use tracing::info;

/// Reads and writes source files on behalf of a [`Project`].
pub trait SourceHost {
  fn read(&self, path: &Path) -> io::Result<String>;
  fn write(&self, path: &Path, text: &str) -> io::Result<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiskHost;

impl SourceHost for DiskHost {
  fn read(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }

  fn write(&self, path: &Path, text: &str) -> io::Result<()> {
    fs::write(path, text)
  }
}

/// In-memory file system. Clones share the same files, so an analyzer and a
/// project can observe each other's writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
  files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
}

impl MemoryHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
    self.files.lock().insert(path.into(), text.into());
  }

  pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
    self.files.lock().get(path.as_ref()).cloned()
  }
}

impl SourceHost for MemoryHost {
  fn read(&self, path: &Path) -> io::Result<String> {
    self.get(path).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
      )
    })
  }

  fn write(&self, path: &Path, text: &str) -> io::Result<()> {
    self.insert(path, text);
    Ok(())
  }
}

/// Version of one file's text. Starts at zero and only ever increases during
/// a run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Generation(pub u32);

impl Generation {
  pub fn next(self) -> Self {
    Generation(self.0 + 1)
  }
}

impl fmt::Display for Generation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A node of one specific generation of a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeRef {
  pub file: FileId,
  pub generation: Generation,
  pub node: NodeId,
}

/// Borrowed view of a file's current text and tree.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
  pub file: FileId,
  pub generation: Generation,
  pub text: &'a str,
  pub tree: &'a SyntaxTree,
}

impl Snapshot<'_> {
  pub fn node_ref(&self, node: NodeId) -> NodeRef {
    NodeRef {
      file: self.file,
      generation: self.generation,
      node,
    }
  }
}

#[derive(Debug)]
struct FileState {
  path: PathBuf,
  generation: Generation,
  text: Option<String>,
  offsets: Option<Utf16Index>,
  tree: Option<SyntaxTree>,
  dirty: bool,
}

pub struct Project<H> {
  host: H,
  ids: BTreeMap<PathBuf, FileId>,
  files: Vec<FileState>,
}

impl<H: SourceHost> Project<H> {
  pub fn new(host: H) -> Self {
    Self {
      host,
      ids: BTreeMap::new(),
      files: Vec::new(),
    }
  }

  pub fn intern(&mut self, path: &Path) -> FileId {
    if let Some(id) = self.ids.get(path) {
      return *id;
    }
    let id = FileId(self.files.len() as u32);
    self.ids.insert(path.to_path_buf(), id);
    self.files.push(FileState {
      path: path.to_path_buf(),
      generation: Generation::default(),
      text: None,
      offsets: None,
      tree: None,
      dirty: false,
    });
    id
  }

  pub fn path(&self, file: FileId) -> Option<&Path> {
    self.files.get(file.index()).map(|f| f.path.as_path())
  }

  pub fn generation(&self, file: FileId) -> Option<Generation> {
    self.files.get(file.index()).map(|f| f.generation)
  }

  pub fn text(&self, file: FileId) -> Option<&str> {
    self.files.get(file.index())?.text.as_deref()
  }

  pub fn is_dirty(&self, file: FileId) -> bool {
    self.files.get(file.index()).is_some_and(|f| f.dirty)
  }

  fn load(&mut self, file: FileId) -> Result<&mut FileState, FixError> {
    let host = &self.host;
    let state = self
      .files
      .get_mut(file.index())
      .ok_or(FixError::UnknownFile(file))?;
    if state.text.is_none() {
      let text = host.read(&state.path).map_err(|source| FixError::Read {
        path: state.path.clone(),
        source,
      })?;
      state.text = Some(text);
    }
    Ok(state)
  }

  /// Grounds analyzer output in the current generation of each file,
  /// converting UTF-16 offsets to byte offsets. Order is preserved.
  pub fn ingest(&mut self, raw: Vec<RawDiagnostic>) -> Result<Vec<Diagnostic>, FixError> {
    let mut diagnostics = Vec::with_capacity(raw.len());
    for raw in raw {
      let file = self.intern(&raw.path);
      let state = self.load(file)?;
      let text = state.text.as_deref().unwrap_or_default();
      let offsets = state.offsets.get_or_insert_with(|| Utf16Index::new(text));
      diagnostics.push(Diagnostic {
        file,
        generation: state.generation,
        start: offsets.byte_of_utf16(raw.start),
        line: raw.line,
        code: raw.code,
        message: raw.message,
      });
    }
    Ok(diagnostics)
  }

  /// Current text and tree of `file`, parsing on first use in a generation.
  pub fn snapshot(&mut self, file: FileId) -> Result<Snapshot<'_>, FixError> {
    let state = self.load(file)?;
    if state.tree.is_none() {
      let text = state.text.as_deref().unwrap_or_default();
      let tree = syntax_ts::parse(text, Dialect::from_path(&state.path)).map_err(|source| {
        FixError::Syntax {
          path: state.path.clone(),
          source,
        }
      })?;
      if tree.has_errors() {
        debug!(
          path = %state.path.display(),
          "file has syntax errors; continuing with a recovered tree"
        );
      }
      state.tree = Some(tree);
    }
    let state = &self.files[file.index()];
    match (state.text.as_deref(), state.tree.as_ref()) {
      (Some(text), Some(tree)) => Ok(Snapshot {
        file,
        generation: state.generation,
        text,
        tree,
      }),
      _ => Err(FixError::UnknownFile(file)),
    }
  }

  /// Text of the generation `at` refers to.
  pub fn text_at(&self, at: NodeRef) -> Result<&str, EditError> {
    let state = self
      .files
      .get(at.file.index())
      .ok_or(EditError::NotLoaded(at.file))?;
    if state.generation != at.generation {
      return Err(EditError::Stale {
        current: state.generation,
        found: at.generation,
      });
    }
    state.text.as_deref().ok_or(EditError::NotLoaded(at.file))
  }

  /// Applies `edit` to the generation `at` refers to and starts a new one.
  pub fn apply(&mut self, at: NodeRef, edit: &TextEdit) -> Result<Generation, EditError> {
    self.text_at(at)?;
    let state = &mut self.files[at.file.index()];
    let text = state.text.as_mut().ok_or(EditError::NotLoaded(at.file))?;
    let range = edit.range.as_usize();
    if range.start > range.end
      || range.end > text.len()
      || !text.is_char_boundary(range.start)
      || !text.is_char_boundary(range.end)
    {
      return Err(EditError::OutOfBounds {
        start: edit.range.start,
        end: edit.range.end,
      });
    }
    text.replace_range(range, &edit.replacement);
    state.tree = None;
    state.offsets = None;
    state.generation = state.generation.next();
    state.dirty = true;
    Ok(state.generation)
  }

  /// Writes every edited file through the host, in path order.
  pub fn persist(&mut self) -> Result<Vec<PathBuf>, FixError> {
    let mut written = Vec::new();
    for id in self.ids.values() {
      let state = &mut self.files[id.index()];
      if !state.dirty {
        continue;
      }
      let text = state.text.as_deref().unwrap_or_default();
      self
        .host
        .write(&state.path, text)
        .map_err(|source| FixError::Write {
          path: state.path.clone(),
          source,
        })?;
      state.dirty = false;
      info!(path = %state.path.display(), generation = %state.generation, "persisted");
      written.push(state.path.clone());
    }
    Ok(written)
  }

  /// Forgets every text and tree and starts a new generation for every file,
  /// so nothing from before survives a reload. Unpersisted edits are lost.
  pub fn discard(&mut self) {
    for state in &mut self.files {
      state.text = None;
      state.offsets = None;
      state.tree = None;
      state.dirty = false;
      state.generation = state.generation.next();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diagnostic::MessageChain;
  use syntax_ts::TextRange;

  fn project_with(path: &str, text: &str) -> (MemoryHost, Project<MemoryHost>, FileId) {
    let host = MemoryHost::new();
    host.insert(path, text);
    let mut project = Project::new(host.clone());
    let file = project.intern(Path::new(path));
    (host, project, file)
  }

  fn insert_at(offset: u32, text: &str) -> TextEdit {
    TextEdit {
      range: TextRange::new(offset, offset),
      replacement: text.to_string(),
    }
  }

  #[test]
  fn ingest_converts_utf16_offsets() {
    let (_, mut project, file) = project_with("/p/a.ts", "const s = \"😀\"; x;\n");
    let diagnostics = project
      .ingest(vec![RawDiagnostic {
        path: PathBuf::from("/p/a.ts"),
        start: 15,
        line: 1,
        code: 2532,
        message: MessageChain::new("Object is possibly 'undefined'."),
      }])
      .unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].file, file);
    assert_eq!(diagnostics[0].start, 17);
    assert_eq!(diagnostics[0].generation, Generation(0));
  }

  #[test]
  fn edits_bump_generation_and_reject_stale_refs() {
    let (_, mut project, file) = project_with("/p/a.ts", "let x = y;\n");
    let snapshot = project.snapshot(file).unwrap();
    let at = snapshot.node_ref(snapshot.tree.root());
    assert_eq!(project.apply(at, &insert_at(9, "!")).unwrap(), Generation(1));
    assert_eq!(project.text(file), Some("let x = y!;\n"));
    assert!(project.is_dirty(file));
    assert_eq!(
      project.apply(at, &insert_at(9, "!")),
      Err(EditError::Stale {
        current: Generation(1),
        found: Generation(0),
      })
    );
  }

  #[test]
  fn out_of_bounds_edits_leave_text_untouched() {
    let (_, mut project, file) = project_with("/p/a.ts", "é;");
    let generation = project.snapshot(file).unwrap().generation;
    let at = NodeRef {
      file,
      generation,
      node: NodeId(0),
    };
    assert!(matches!(
      project.apply(at, &insert_at(1, "!")),
      Err(EditError::OutOfBounds { .. })
    ));
    assert!(matches!(
      project.apply(at, &insert_at(40, "!")),
      Err(EditError::OutOfBounds { .. })
    ));
    assert_eq!(project.text(file), Some("é;"));
    assert_eq!(project.generation(file), Some(Generation(0)));
  }

  #[test]
  fn persist_writes_dirty_files_and_discard_reloads() {
    let (host, mut project, file) = project_with("/p/a.ts", "a;\n");
    let other = project.intern(Path::new("/p/b.ts"));
    host.insert("/p/b.ts", "b;\n");
    let snapshot = project.snapshot(file).unwrap();
    let at = snapshot.node_ref(snapshot.tree.root());
    project.apply(at, &insert_at(1, "!")).unwrap();
    project.snapshot(other).unwrap();

    let written = project.persist().unwrap();
    assert_eq!(written, vec![PathBuf::from("/p/a.ts")]);
    assert_eq!(host.get("/p/a.ts").as_deref(), Some("a!;\n"));
    assert!(project.persist().unwrap().is_empty());

    host.insert("/p/a.ts", "changed;\n");
    project.discard();
    assert_eq!(project.text(file), None);
    assert_eq!(project.generation(file), Some(Generation(2)));
    assert_eq!(project.generation(other), Some(Generation(1)));
    assert_eq!(project.snapshot(file).unwrap().text, "changed;\n");
    assert_eq!(project.intern(Path::new("/p/a.ts")), file);
  }

  #[test]
  fn missing_files_are_fatal() {
    let host = MemoryHost::new();
    let mut project = Project::new(host);
    let err = project
      .ingest(vec![RawDiagnostic {
        path: PathBuf::from("/nope.ts"),
        start: 0,
        line: 1,
        code: 1,
        message: MessageChain::default(),
      }])
      .unwrap_err();
    assert!(matches!(err, FixError::Read { .. }));
  }
}
