use syntax_ts::parse;
use syntax_ts::Dialect;
use syntax_ts::NodeId;
use syntax_ts::SyntaxKind;
use syntax_ts::SyntaxTree;

fn find(tree: &SyntaxTree, source: &str, kind: SyntaxKind, text: &str) -> NodeId {
  tree
    .descendants(tree.root())
    .find(|id| tree.node(*id).kind == kind && tree.text_of(*id, source) == text)
    .unwrap_or_else(|| panic!("no {kind} with text {text:?}"))
}

#[test]
fn element_access_and_non_null() {
  let source = "const a = obj[\"k\"];\nconst b = c!;\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  assert!(!tree.has_errors());
  find(&tree, source, SyntaxKind::ElementAccess, "obj[\"k\"]");
  let assertion = find(&tree, source, SyntaxKind::NonNullAssertion, "c!");
  let inner = tree.node(assertion).children[0];
  assert_eq!(tree.text_of(inner, source), "c");
  assert_eq!(tree.parent(inner), Some(assertion));
}

#[test]
fn shorthand_property_is_wrapped() {
  let source = "const o = {nice};\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  let prop = find(&tree, source, SyntaxKind::ShorthandProperty, "nice");
  let name = tree.node(prop).name.unwrap();
  assert_eq!(tree.node(name).kind, SyntaxKind::Identifier);
  assert_eq!(tree.node(name).range, tree.node(prop).range);
  assert_eq!(tree.parent(name), Some(prop));
  assert!(tree.node(name).depth > tree.node(prop).depth);
}

#[test]
fn property_assignment_links_key_and_value() {
  let source = "const o = {y: x};\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  let pair = find(&tree, source, SyntaxKind::PropertyAssignment, "y: x");
  let node = tree.node(pair);
  assert_eq!(tree.text_of(node.name.unwrap(), source), "y");
  assert_eq!(tree.text_of(node.value.unwrap(), source), "x");
}

#[test]
fn jsx_attribute_links_name_and_initializer() {
  let source = "const e = <Comp foo={bar} />;\n";
  let tree = parse(source, Dialect::Tsx).unwrap();
  let attr = find(&tree, source, SyntaxKind::JsxAttribute, "foo={bar}");
  let node = tree.node(attr);
  assert_eq!(tree.text_of(node.name.unwrap(), source), "foo");
  assert_eq!(tree.text_of(node.value.unwrap(), source), "{bar}");
}

#[test]
fn destructuring_entries_are_binding_elements() {
  let source = "const {a, b: c, d = 1} = o;\nconst [e] = arr;\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  for (text, name) in [("a", "a"), ("b: c", "c"), ("d = 1", "d"), ("e", "e")] {
    let element = find(&tree, source, SyntaxKind::BindingElement, text);
    let target = tree.node(element).name.unwrap();
    assert_eq!(tree.text_of(target, source), name);
  }
}

#[test]
fn arrow_shorthand_parameter_is_wrapped() {
  let source = "const f = p => p;\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  let param = tree
    .descendants(tree.root())
    .find(|id| tree.node(*id).kind == SyntaxKind::Parameter)
    .unwrap();
  assert_eq!(tree.text_of(param, source), "p");
}

#[test]
fn ids_follow_document_order() {
  let source = "a[0]; b[1];\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  let first = find(&tree, source, SyntaxKind::ElementAccess, "a[0]");
  let second = find(&tree, source, SyntaxKind::ElementAccess, "b[1]");
  assert!(first < second);
  let order: Vec<_> = tree.descendants(tree.root()).collect();
  let mut sorted = order.clone();
  sorted.sort();
  assert_eq!(order, sorted);
}

#[test]
fn broken_source_still_parses() {
  let source = "const a = ;\nlet b = c[0];\n";
  let tree = parse(source, Dialect::TypeScript).unwrap();
  assert!(tree.has_errors());
  assert!(tree
    .descendants(tree.root())
    .any(|id| tree.node(id).kind == SyntaxKind::ElementAccess));
}

#[test]
fn dialect_follows_extension() {
  use std::path::Path;
  assert_eq!(Dialect::from_path(Path::new("a/b.ts")), Dialect::TypeScript);
  assert_eq!(Dialect::from_path(Path::new("a/b.tsx")), Dialect::Tsx);
  assert_eq!(Dialect::from_path(Path::new("b.js")), Dialect::Tsx);
  assert_eq!(Dialect::from_path(Path::new("b.d.ts")), Dialect::TypeScript);
}
