use crate::kind::SyntaxKind;
use crate::loc::TextRange;

/// Index of a node in its [`SyntaxTree`]. Ids are allocated in pre-order, so
/// comparing ids compares document order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, Debug)]
pub struct Node {
  pub kind: SyntaxKind,
  /// Grammar node name, e.g. `variable_declarator`. Synthesized wrappers reuse
  /// the name of the token they wrap.
  pub raw_kind: &'static str,
  pub range: TextRange,
  pub parent: Option<NodeId>,
  pub children: Vec<NodeId>,
  pub depth: u32,
  /// Binding or key child of a declaration-like node.
  pub name: Option<NodeId>,
  /// Initializer child of a declaration-like node.
  pub value: Option<NodeId>,
  /// For identifiers: the node introducing the binding the identifier refers
  /// to, if it could be found in this file.
  pub declaration: Option<NodeId>,
}

impl Node {
  pub fn is(&self, kind: SyntaxKind) -> bool {
    self.kind == kind
  }
}

/// Arena of lowered syntax nodes for a single source file.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
  pub(crate) nodes: Vec<Node>,
  pub(crate) has_errors: bool,
}

impl SyntaxTree {
  pub fn root(&self) -> NodeId {
    NodeId(0)
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.index()]
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Whether the parser had to recover from syntax errors.
  pub fn has_errors(&self) -> bool {
    self.has_errors
  }

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.node(id).parent
  }

  pub fn text_of<'a>(&self, id: NodeId, source: &'a str) -> &'a str {
    source
      .get(self.node(id).range.as_usize())
      .unwrap_or_default()
  }

  /// `id` and everything below it, in pre-order.
  pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
    Descendants {
      tree: self,
      stack: vec![id],
    }
  }

  /// Parents of `id`, nearest first, excluding `id` itself.
  pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(self.parent(id), move |id| self.parent(*id))
  }

  pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
    self.ancestors(id).any(|a| a == ancestor)
  }

  pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.index()]
  }
}

pub struct Descendants<'a> {
  tree: &'a SyntaxTree,
  stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
  type Item = NodeId;

  fn next(&mut self) -> Option<NodeId> {
    let id = self.stack.pop()?;
    self
      .stack
      .extend(self.tree.node(id).children.iter().rev().copied());
    Some(id)
  }
}
