//! Lexical binding: links identifiers to the node that declares them.
//!
//! Binding runs in two passes over the arena, the way a declare/resolve pair
//! of visitors would:
//!
//! 1. Declare. Walk the tree keeping a scope stack; every binding name gets
//!    its `declaration` set and is entered into the scope it belongs to. `var`
//!    declarations and function declarations go to the nearest function scope,
//!    everything else to the current scope.
//! 2. Resolve. Walk again; every identifier that is not itself a binding name
//!    is looked up through the scope chain. Because declaration finished
//!    first, hoisted names are visible throughout their scope. Temporal dead
//!    zones are not modelled.
//!
//! Names that are not declared in this file (globals, imports from other
//! modules' exports, member properties) stay unresolved.

use crate::kind::SyntaxKind;
use crate::tree::NodeId;
use crate::tree::SyntaxTree;
use ahash::HashMap;
use ahash::HashMapExt;

#[derive(Debug)]
struct Scope {
  parent: Option<usize>,
  is_function: bool,
  bindings: HashMap<String, NodeId>,
}

fn function_scope_kind(raw: &str) -> bool {
  matches!(
    raw,
    "function_declaration"
      | "generator_function_declaration"
      | "function_expression"
      | "generator_function"
      | "arrow_function"
      | "method_definition"
      | "function_signature"
      | "method_signature"
      | "abstract_method_signature"
      | "call_signature"
      | "construct_signature"
      | "function_type"
      | "constructor_type"
  )
}

fn block_scope_kind(raw: &str) -> bool {
  matches!(
    raw,
    "statement_block"
      | "for_statement"
      | "for_in_statement"
      | "catch_clause"
      | "switch_body"
      | "class_body"
  )
}

pub(crate) fn bind(tree: &mut SyntaxTree, source: &str) {
  if tree.is_empty() {
    return;
  }
  let mut binder = Binder {
    tree,
    source,
    scopes: vec![Scope {
      parent: None,
      is_function: true,
      bindings: HashMap::new(),
    }],
    scope_of: HashMap::new(),
  };
  let root = binder.tree.root();
  binder.scope_of.insert(root, 0);
  binder.declare(root, 0);
  binder.resolve(root, 0);
}

struct Binder<'a> {
  tree: &'a mut SyntaxTree,
  source: &'a str,
  scopes: Vec<Scope>,
  scope_of: HashMap<NodeId, usize>,
}

impl Binder<'_> {
  fn text(&self, id: NodeId) -> &str {
    self.tree.text_of(id, self.source)
  }

  fn function_scope_of(&self, mut scope: usize) -> usize {
    while !self.scopes[scope].is_function {
      match self.scopes[scope].parent {
        Some(parent) => scope = parent,
        None => break,
      }
    }
    scope
  }

  fn new_scope(&mut self, parent: usize, is_function: bool) -> usize {
    self.scopes.push(Scope {
      parent: Some(parent),
      is_function,
      bindings: HashMap::new(),
    });
    self.scopes.len() - 1
  }

  fn add_binding(&mut self, name: NodeId, declaration: NodeId, scope: usize) {
    let text = self.text(name).to_string();
    if text.is_empty() {
      return;
    }
    self.tree.node_mut(name).declaration = Some(declaration);
    self.scopes[scope].bindings.insert(text, declaration);
  }

  /// Declares every name bound by `pattern`. Simple names are attributed to
  /// `declaration` (or to themselves when there is none); names inside a
  /// binding element are attributed to the innermost element.
  fn bind_pattern(&mut self, pattern: NodeId, declaration: Option<NodeId>, scope: usize) {
    let node = self.tree.node(pattern);
    match (node.kind, node.raw_kind) {
      (SyntaxKind::Identifier, _) => {
        self.add_binding(pattern, declaration.unwrap_or(pattern), scope);
      }
      (SyntaxKind::BindingElement, _) => {
        if let Some(target) = node.name {
          self.bind_pattern(target, Some(pattern), scope);
        }
      }
      (_, "object_pattern" | "array_pattern") => {
        for i in 0..node.children.len() {
          let child = self.tree.node(pattern).children[i];
          self.bind_pattern(child, declaration, scope);
        }
      }
      _ => {}
    }
  }

  fn for_loop_declares(&self, id: NodeId) -> bool {
    let text = self.text(id);
    let rest = text.strip_prefix("for").unwrap_or(text).trim_start();
    let rest = rest.strip_prefix("await").unwrap_or(rest).trim_start();
    let rest = rest.strip_prefix('(').unwrap_or(rest).trim_start();
    ["const", "let", "var"].iter().any(|kw| {
      rest
        .strip_prefix(kw)
        .is_some_and(|after| after.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '['))
    })
  }

  fn declare(&mut self, id: NodeId, scope: usize) {
    let node = self.tree.node(id);
    let raw = node.raw_kind;
    let kind = node.kind;
    let name = node.name;

    match raw {
      "function_declaration" | "generator_function_declaration" => {
        if let Some(name) = name {
          let target = self.function_scope_of(scope);
          self.add_binding(name, id, target);
        }
      }
      "class_declaration" | "abstract_class_declaration" => {
        if let Some(name) = name {
          self.add_binding(name, id, scope);
        }
      }
      "variable_declarator" => {
        let is_var = node
          .parent
          .is_some_and(|p| self.tree.node(p).raw_kind == "variable_declaration");
        let target = if is_var {
          self.function_scope_of(scope)
        } else {
          scope
        };
        if let Some(name) = name {
          self.bind_pattern(name, Some(id), target);
        }
      }
      "import_specifier" => {
        if let Some(name) = name {
          self.add_binding(name, id, scope);
        }
      }
      "import_clause" | "namespace_import" => {
        for i in 0..node.children.len() {
          let child = self.tree.node(id).children[i];
          if self.tree.node(child).raw_kind == "identifier" {
            self.add_binding(child, id, scope);
          }
        }
      }
      _ => {}
    }

    let inner = if function_scope_kind(raw) {
      self.new_scope(scope, true)
    } else if block_scope_kind(raw) {
      self.new_scope(scope, false)
    } else {
      scope
    };
    if inner != scope {
      self.scope_of.insert(id, inner);
    }

    match raw {
      "function_expression" | "generator_function" => {
        if let Some(name) = name {
          self.add_binding(name, id, inner);
        }
      }
      "for_in_statement" if self.for_loop_declares(id) => {
        if let Some(left) = name {
          self.bind_pattern(left, None, inner);
        }
      }
      "catch_clause" => {
        if let Some(param) = name {
          self.bind_pattern(param, None, inner);
        }
      }
      _ => {}
    }
    if kind == SyntaxKind::Parameter {
      if let Some(pattern) = name {
        self.bind_pattern(pattern, Some(id), scope);
      }
    }

    for i in 0..self.tree.node(id).children.len() {
      let child = self.tree.node(id).children[i];
      self.declare(child, inner);
    }
  }

  fn lookup(&self, name: &str, mut scope: usize) -> Option<NodeId> {
    loop {
      if let Some(decl) = self.scopes[scope].bindings.get(name) {
        return Some(*decl);
      }
      scope = self.scopes[scope].parent?;
    }
  }

  fn resolve(&mut self, id: NodeId, scope: usize) {
    let inner = self.scope_of.get(&id).copied().unwrap_or(scope);
    let node = self.tree.node(id);
    if node.kind == SyntaxKind::Identifier && node.declaration.is_none() {
      let declaration = match node.raw_kind {
        "identifier" | "shorthand_property_identifier_pattern" => {
          self.lookup(self.text(id), inner)
        }
        "shorthand_property_identifier" => node
          .parent
          .filter(|p| self.tree.node(*p).kind == SyntaxKind::ShorthandProperty),
        "property_identifier" | "private_property_identifier" => node.parent.filter(|p| {
          let owner = self.tree.node(*p);
          owner.name == Some(id)
            && matches!(
              owner.raw_kind,
              "pair" | "jsx_attribute" | "public_field_definition" | "method_definition"
            )
        }),
        _ => None,
      };
      self.tree.node_mut(id).declaration = declaration;
    }

    for i in 0..self.tree.node(id).children.len() {
      let child = self.tree.node(id).children[i];
      self.resolve(child, inner);
    }
  }
}
