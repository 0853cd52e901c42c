/// The closed set of node kinds the remediation engine distinguishes.
///
/// Everything the engine does not need to tell apart lowers to
/// [`SyntaxKind::Other`]; the grammar's own name is kept in
/// [`crate::Node::raw_kind`] for logging and for the binder.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SyntaxKind {
  /// `x[i]`.
  ElementAccess,
  ReturnStatement,
  Identifier,
  /// `key: value` inside an object literal.
  PropertyAssignment,
  /// `name={value}` on a JSX element.
  JsxAttribute,
  /// One entry of an object or array destructuring pattern.
  BindingElement,
  Parameter,
  /// `{foo}` inside an object literal, sugar for `{foo: foo}`.
  ShorthandProperty,
  /// `expr!`.
  NonNullAssertion,
  Other,
}

impl SyntaxKind {
  pub fn from_raw(raw: &str) -> Self {
    match raw {
      "subscript_expression" => SyntaxKind::ElementAccess,
      "return_statement" => SyntaxKind::ReturnStatement,
      "identifier"
      | "property_identifier"
      | "private_property_identifier"
      | "shorthand_property_identifier"
      | "shorthand_property_identifier_pattern" => SyntaxKind::Identifier,
      "pair" => SyntaxKind::PropertyAssignment,
      "jsx_attribute" => SyntaxKind::JsxAttribute,
      "pair_pattern" | "object_assignment_pattern" | "assignment_pattern" | "rest_pattern" => {
        SyntaxKind::BindingElement
      }
      "required_parameter" | "optional_parameter" => SyntaxKind::Parameter,
      "non_null_expression" => SyntaxKind::NonNullAssertion,
      _ => SyntaxKind::Other,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      SyntaxKind::ElementAccess => "element access",
      SyntaxKind::ReturnStatement => "return statement",
      SyntaxKind::Identifier => "identifier",
      SyntaxKind::PropertyAssignment => "property assignment",
      SyntaxKind::JsxAttribute => "JSX attribute",
      SyntaxKind::BindingElement => "binding element",
      SyntaxKind::Parameter => "parameter",
      SyntaxKind::ShorthandProperty => "shorthand property",
      SyntaxKind::NonNullAssertion => "non-null assertion",
      SyntaxKind::Other => "other",
    }
  }
}

impl std::fmt::Display for SyntaxKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
