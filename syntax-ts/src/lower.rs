//! Lowering from the tree-sitter concrete tree into the [`SyntaxTree`] arena.
//!
//! Only named grammar nodes are kept. Shorthand tokens that stand for two
//! things at once get a synthesized wrapper with the same span, so the
//! engine can tell the property (or binding) apart from the name inside it:
//!
//! - `{foo}` in an object literal: `ShorthandProperty(Identifier)`.
//! - `{foo}` in a destructuring pattern and `[foo]` in an array pattern:
//!   `BindingElement(Identifier)`.
//! - `foo => ...`: `Parameter(Identifier)`.

use crate::kind::SyntaxKind;
use crate::loc::TextRange;
use crate::tree::Node;
use crate::tree::NodeId;
use crate::tree::SyntaxTree;
use tree_sitter::TreeCursor;

pub(crate) fn lower(tree: &tree_sitter::Tree) -> SyntaxTree {
  let mut lowering = Lowering { nodes: Vec::new() };
  let mut cursor = tree.walk();
  lowering.lower_current(&mut cursor, None, None);
  SyntaxTree {
    nodes: lowering.nodes,
    has_errors: tree.root_node().has_error(),
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
  Name,
  Value,
}

fn role_of(parent_raw: &str, field: &str) -> Option<Role> {
  match (parent_raw, field) {
    ("pair_pattern", "value") => Some(Role::Name),
    ("pair_pattern", _) => None,
    (_, "name" | "key" | "pattern" | "alias") => Some(Role::Name),
    ("object_assignment_pattern" | "assignment_pattern" | "for_in_statement", "left") => {
      Some(Role::Name)
    }
    ("catch_clause", "parameter") => Some(Role::Name),
    (_, "value") => Some(Role::Value),
    ("object_assignment_pattern" | "assignment_pattern", "right") => Some(Role::Value),
    _ => None,
  }
}

fn wrapper_for(raw: &str, parent_raw: Option<&str>, field: Option<&str>) -> Option<SyntaxKind> {
  match (raw, parent_raw, field) {
    ("shorthand_property_identifier", Some("object"), _) => Some(SyntaxKind::ShorthandProperty),
    ("shorthand_property_identifier_pattern", Some("object_pattern"), _) => {
      Some(SyntaxKind::BindingElement)
    }
    ("identifier", Some("array_pattern"), _) => Some(SyntaxKind::BindingElement),
    ("identifier", Some("arrow_function"), Some("parameter")) => Some(SyntaxKind::Parameter),
    _ => None,
  }
}

struct Lowering {
  nodes: Vec<Node>,
}

impl Lowering {
  fn push(
    &mut self,
    kind: SyntaxKind,
    raw_kind: &'static str,
    range: TextRange,
    parent: Option<NodeId>,
  ) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    let depth = parent.map_or(0, |p| self.nodes[p.index()].depth + 1);
    self.nodes.push(Node {
      kind,
      raw_kind,
      range,
      parent,
      children: Vec::new(),
      depth,
      name: None,
      value: None,
      declaration: None,
    });
    if let Some(parent) = parent {
      self.nodes[parent.index()].children.push(id);
    }
    id
  }

  fn lower_current(
    &mut self,
    cursor: &mut TreeCursor,
    parent: Option<NodeId>,
    field: Option<&'static str>,
  ) -> Option<NodeId> {
    let ts_node = cursor.node();
    if !ts_node.is_named() || ts_node.is_missing() {
      return None;
    }
    let raw = ts_node.kind();
    let range = TextRange::new(ts_node.start_byte() as u32, ts_node.end_byte() as u32);
    let parent_raw = parent.map(|p| self.nodes[p.index()].raw_kind);

    let outer = wrapper_for(raw, parent_raw, field).map(|kind| self.push(kind, raw, range, parent));
    let id = self.push(SyntaxKind::from_raw(raw), raw, range, outer.or(parent));
    if let Some(outer) = outer {
      self.nodes[outer.index()].name = Some(id);
    }

    if cursor.goto_first_child() {
      let mut positional = Vec::new();
      loop {
        let child_field = cursor.field_name();
        if let Some(child) = self.lower_current(cursor, Some(id), child_field) {
          if let Some(child_field) = child_field {
            self.link(id, child, child_field);
          }
          if self.nodes[child.index()].raw_kind != "comment" {
            positional.push(child);
          }
        }
        if !cursor.goto_next_sibling() {
          break;
        }
      }
      cursor.goto_parent();
      self.link_positional(id, &positional);
    }

    Some(outer.unwrap_or(id))
  }

  fn link(&mut self, parent: NodeId, child: NodeId, field: &str) {
    let node = &mut self.nodes[parent.index()];
    match role_of(node.raw_kind, field) {
      Some(Role::Name) => node.name = Some(child),
      Some(Role::Value) => node.value = Some(child),
      None => {}
    }
  }

  /// Grammar nodes whose parts carry no field names.
  fn link_positional(&mut self, parent: NodeId, children: &[NodeId]) {
    let node = &mut self.nodes[parent.index()];
    match node.raw_kind {
      "jsx_attribute" => {
        node.name = children.first().copied();
        node.value = children.get(1).copied();
      }
      "rest_pattern" => node.name = children.first().copied(),
      _ => {}
    }
  }
}
