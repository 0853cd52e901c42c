//! Choosing where to put the assertion for a diagnostic.
//!
//! Candidates are searched in tiers. Within a tier the deepest matching node
//! wins; among equally deep nodes the first in document order wins.
//!
//! 1. Element access (`x[i]`): asserted directly.
//! 2. Return statement: never wrapped, resolution fails.
//! 3. Identifier: escalated through the declaration it binds to.
//!    - property assignment or JSX attribute: resolve again inside the
//!      initializer, following the value back to where it is produced;
//!    - destructuring element, parameter, loop or catch binding: assert the
//!      identifier where it is used;
//!    - object-literal shorthand: expand `{foo}` into `{foo: foo!}`;
//!    - anything else: resolve again inside the declaration itself.
//!
//! Resolution never edits anything; it only names a node and an action.

use crate::error::Unfixable;
use ahash::HashSet;
use ahash::HashSetExt;
use serde::Serialize;
use syntax_ts::NodeId;
use syntax_ts::SyntaxKind;
use syntax_ts::SyntaxTree;
use syntax_ts::TextRange;
use tracing::debug;
use tracing::warn;

/// Which nodes a resolution pass may select.
///
/// Nodes directly inside a non-null assertion are never selected, so an
/// expression is not asserted twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
  /// Nodes starting at this byte offset.
  StartsAt(u32),
  /// Any node below the search root. Identifiers naming `skip` are excluded,
  /// so searching inside a declaration does not select its own name.
  Unwrapped { skip: Option<NodeId> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAction {
  /// Suffix the node with `!`.
  Append,
  /// Rewrite `{foo}` as `{foo: foo!}`.
  ExpandShorthand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fix {
  pub node: NodeId,
  pub range: TextRange,
  pub action: FixAction,
}

pub fn resolve(
  tree: &SyntaxTree,
  text: &str,
  root: NodeId,
  target: Target,
) -> Result<Fix, Unfixable> {
  Resolver::new(tree, text).resolve(root, target)
}

pub struct Resolver<'a> {
  tree: &'a SyntaxTree,
  text: &'a str,
  visited: HashSet<NodeId>,
}

impl<'a> Resolver<'a> {
  pub fn new(tree: &'a SyntaxTree, text: &'a str) -> Self {
    Self {
      tree,
      text,
      visited: HashSet::new(),
    }
  }

  fn is_target(&self, id: NodeId, target: Target) -> bool {
    let node = self.tree.node(id);
    let wrapped = node
      .parent
      .is_some_and(|p| self.tree.node(p).is(SyntaxKind::NonNullAssertion));
    if wrapped {
      return false;
    }
    match target {
      Target::StartsAt(offset) => node.range.start == offset,
      Target::Unwrapped { skip } => {
        skip.is_none() || !node.is(SyntaxKind::Identifier) || node.declaration != skip
      }
    }
  }

  fn deepest(&self, root: NodeId, target: Target, kind: SyntaxKind) -> Option<NodeId> {
    let mut best: Option<NodeId> = None;
    for id in self.tree.descendants(root) {
      let node = self.tree.node(id);
      if !node.is(kind) || !self.is_target(id, target) {
        continue;
      }
      if best.map_or(true, |b| node.depth > self.tree.node(b).depth) {
        best = Some(id);
      }
    }
    best
  }

  fn fix(&self, node: NodeId, action: FixAction) -> Fix {
    Fix {
      node,
      range: self.tree.node(node).range,
      action,
    }
  }

  fn name(&self, id: NodeId) -> String {
    self.tree.text_of(id, self.text).to_string()
  }

  pub fn resolve(&mut self, root: NodeId, target: Target) -> Result<Fix, Unfixable> {
    if let Some(access) = self.deepest(root, target, SyntaxKind::ElementAccess) {
      debug!(range = ?self.tree.node(access).range, "selected element access");
      return Ok(self.fix(access, FixAction::Append));
    }
    if self
      .deepest(root, target, SyntaxKind::ReturnStatement)
      .is_some()
    {
      debug!("diagnostic points at a return statement");
      return Err(Unfixable::ReturnStatement);
    }
    match self.deepest(root, target, SyntaxKind::Identifier) {
      Some(ident) => self.escalate(ident),
      None => Err(Unfixable::NoCandidate),
    }
  }

  fn escalate(&mut self, ident: NodeId) -> Result<Fix, Unfixable> {
    let tree = self.tree;
    let name = self.name(ident);
    let Some(decl) = tree.node(ident).declaration else {
      warn!(name = %name, "identifier has no value declaration");
      return Err(Unfixable::NoDeclaration { name });
    };
    let decl_node = tree.node(decl);
    debug!(
      name = %name,
      declaration = %decl_node.kind,
      raw = decl_node.raw_kind,
      "following declaration"
    );
    match decl_node.kind {
      SyntaxKind::PropertyAssignment | SyntaxKind::JsxAttribute => {
        let Some(value) = decl_node.value else {
          return Err(Unfixable::MissingInitializer {
            kind: decl_node.kind,
            name,
          });
        };
        self.enter(decl, &name)?;
        self.resolve(value, Target::Unwrapped { skip: None })
      }
      SyntaxKind::BindingElement | SyntaxKind::Parameter | SyntaxKind::Identifier => {
        if decl == ident || tree.is_ancestor_of(decl, ident) {
          return Err(Unfixable::BindingName { name });
        }
        Ok(self.fix(ident, FixAction::Append))
      }
      SyntaxKind::ShorthandProperty => Ok(self.fix(decl, FixAction::ExpandShorthand)),
      _ => {
        self.enter(decl, &name)?;
        self.resolve(decl, Target::Unwrapped { skip: Some(decl) })
      }
    }
  }

  fn enter(&mut self, decl: NodeId, name: &str) -> Result<(), Unfixable> {
    if self.visited.insert(decl) {
      Ok(())
    } else {
      Err(Unfixable::DeclarationCycle {
        name: name.to_string(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mutate;
  use syntax_ts::parse;
  use syntax_ts::Dialect;

  /// Resolves at the `nth` occurrence of `needle` (plus `delta` bytes) and
  /// returns the text after applying the fix.
  fn fix_at(text: &str, needle: &str, nth: usize, delta: usize) -> Result<String, Unfixable> {
    let dialect = if text.contains("/>") {
      Dialect::Tsx
    } else {
      Dialect::TypeScript
    };
    let tree = parse(text, dialect).unwrap();
    let offset = text
      .match_indices(needle)
      .nth(nth)
      .map(|(i, _)| i + delta)
      .unwrap() as u32;
    let fix = resolve(&tree, text, tree.root(), Target::StartsAt(offset))?;
    Ok(mutate::plan(text, &fix).unwrap().apply_to(text))
  }

  #[test]
  fn element_access_is_asserted() {
    assert_eq!(
      fix_at("const a = obj[\"k\"];\n", "obj", 0, 0).unwrap(),
      "const a = obj[\"k\"]!;\n"
    );
  }

  #[test]
  fn element_access_beats_identifier() {
    assert_eq!(
      fix_at("const n = rows[i].length;\n", "rows", 0, 0).unwrap(),
      "const n = rows[i]!.length;\n"
    );
  }

  #[test]
  fn innermost_element_access_wins() {
    assert_eq!(
      fix_at("const v = m[a][b];\n", "m[", 0, 0).unwrap(),
      "const v = m[a]![b];\n"
    );
  }

  #[test]
  fn return_statements_are_unfixable() {
    assert_eq!(
      fix_at("function f() {\n  return g();\n}\n", "return", 0, 0),
      Err(Unfixable::ReturnStatement)
    );
  }

  #[test]
  fn property_initializer_is_followed() {
    let text = "function f(x?: string) { return {y: x}; }\n";
    assert_eq!(
      fix_at(text, "y:", 0, 0).unwrap(),
      "function f(x?: string) { return {y: x!}; }\n"
    );
  }

  #[test]
  fn jsx_attribute_initializer_is_followed() {
    let text = "function C(p: {v?: string}) { const label = p.v; return <A title={label} />; }\n";
    let fixed = fix_at(text, "title", 0, 0);
    // `label` is declared by a plain variable declarator, so resolution
    // continues inside it and lands on `p`, a parameter used there.
    assert_eq!(
      fixed.unwrap(),
      "function C(p: {v?: string}) { const label = p!.v; return <A title={label} />; }\n"
    );
  }

  #[test]
  fn jsx_attribute_initializer_is_asserted_in_place() {
    let text = "function C(x?: string) { return <A title={x} />; }\n";
    assert_eq!(
      fix_at(text, "title", 0, 0).unwrap(),
      "function C(x?: string) { return <A title={x!} />; }\n"
    );
  }

  #[test]
  fn parameter_use_sites_are_asserted() {
    assert_eq!(
      fix_at("function f(s?: string) { s.trim(); }\n", "s.", 0, 0).unwrap(),
      "function f(s?: string) { s!.trim(); }\n"
    );
  }

  #[test]
  fn destructured_use_sites_are_asserted() {
    let text = "const {a} = o;\na.x;\n";
    assert_eq!(fix_at(text, "a.x", 0, 0).unwrap(), "const {a} = o;\na!.x;\n");
  }

  #[test]
  fn binding_names_are_unfixable() {
    assert_eq!(
      fix_at("const {foo} = bar;\n", "foo", 0, 0),
      Err(Unfixable::BindingName {
        name: "foo".to_string()
      })
    );
  }

  #[test]
  fn shorthand_property_is_expanded() {
    let text = "function f(x: {nice?: string}) {\n  const {nice} = x;\n  return {nice};\n}\n";
    assert_eq!(
      fix_at(text, "{nice}", 1, 1).unwrap(),
      "function f(x: {nice?: string}) {\n  const {nice} = x;\n  return {nice: nice!};\n}\n"
    );
  }

  #[test]
  fn other_declarations_are_searched_for_a_better_node() {
    let text = "const cache: Record<string, number[]> = {};\nconst hit = cache[key];\nuse(hit);\n";
    assert_eq!(
      fix_at(text, "hit)", 0, 0).unwrap(),
      "const cache: Record<string, number[]> = {};\nconst hit = cache[key]!;\nuse(hit);\n"
    );
  }

  #[test]
  fn undeclared_identifiers_are_unfixable() {
    assert_eq!(
      fix_at("use(globalThing);\n", "globalThing", 0, 0),
      Err(Unfixable::NoDeclaration {
        name: "globalThing".to_string()
      })
    );
  }

  #[test]
  fn declaration_cycles_terminate() {
    let text = "let a = b;\nlet b = a;\nuse(a);\n";
    assert_eq!(
      fix_at(text, "a)", 0, 0),
      Err(Unfixable::DeclarationCycle {
        name: "a".to_string()
      })
    );
  }

  #[test]
  fn asserted_nodes_are_not_selected_again() {
    let text = "const a = obj[\"k\"]!;\n";
    assert_eq!(
      fix_at(text, "obj", 0, 0),
      Err(Unfixable::NoDeclaration {
        name: "obj".to_string()
      })
    );
  }

  #[test]
  fn nothing_at_offset_is_unfixable() {
    assert_eq!(fix_at("let x = 1;\n", "1", 0, 0), Err(Unfixable::NoCandidate));
  }
}
