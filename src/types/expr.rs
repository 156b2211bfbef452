//! Type expressions read from annotation nodes
//!
//! Parameter, return and class-field annotations are converted straight from
//! their tree-sitter-python `type` nodes. Annotations that only exist as text
//! (string forward references, docstring types) are parsed with the same
//! grammar first, so there is a single notion of what a type looks like.

use crate::syntax::{first_error, node_text, parse_source, string_value};
use std::fmt;
use tree_sitter::Node;

/// Deepest nesting of brackets, unions and parentheses accepted in one
/// annotation
pub const MAX_TYPE_DEPTH: usize = 64;

/// Parsed type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// Possibly dotted name: `str`, `typing.List`
    Name(String),
    /// Generic application: `List[int]`
    Subscript { base: String, args: Vec<TypeExpr> },
    /// PEP 604 union: `int | None`
    Union(Vec<TypeExpr>),
    /// String literal, a forward reference or a `Literal` value
    Str(String),
    /// Numeric literal inside `Literal[...]`
    Number(String),
    /// `...` as in `Tuple[int, ...]`
    Ellipsis,
    /// Bracketed list as in `Callable[[int], str]`, or `()`
    List(Vec<TypeExpr>),
    /// Call expression such as `Field(gt=0)` in `Annotated` metadata;
    /// arguments are not kept
    Call(String),
}

impl TypeExpr {
    /// Last segment of a dotted name
    pub fn simple_name(path: &str) -> &str {
        path.rsplit('.').next().unwrap_or(path)
    }

    /// Build an expression from an annotation node, normally the `type`
    /// child of a parameter, return type or class field.
    ///
    /// Error offsets are byte offsets from the start of `node`.
    pub fn from_node(node: &Node, source: &str) -> Result<TypeExpr, TypeExprError> {
        let builder = ExprBuilder {
            source,
            origin: node.start_byte(),
        };
        if let Some(broken) = first_error(node) {
            return Err(builder.error(&broken, "invalid syntax"));
        }
        builder.build(node, 0)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Subscript { base, args } => {
                write!(f, "{base}[")?;
                join(f, args, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Union(items) => join(f, items, " | "),
            TypeExpr::Str(value) => write!(f, "{value:?}"),
            TypeExpr::Number(value) => f.write_str(value),
            TypeExpr::Ellipsis => f.write_str("..."),
            TypeExpr::Call(callee) => write!(f, "{callee}(...)"),
            TypeExpr::List(items) => {
                f.write_str("[")?;
                join(f, items, ", ")?;
                f.write_str("]")
            }
        }
    }
}

/// Failure to read a type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExprError {
    pub message: String,
    /// Byte offset into the annotation
    pub offset: usize,
}

impl TypeExprError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

impl fmt::Display for TypeExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for TypeExprError {}

/// Parse annotation text that is not part of a syntax tree, such as a string
/// forward reference or a type written in a docstring.
///
/// The text is parsed as the annotation of `_: <text>`; anything other than a
/// single bare annotation is rejected.
pub fn parse_type_expr(text: &str) -> Result<TypeExpr, TypeExprError> {
    const PREFIX: &str = "_: ";

    let text = text.trim();
    if text.is_empty() {
        return Err(TypeExprError::new("empty annotation", 0));
    }
    let source = format!("{PREFIX}{text}\n");
    let tree = parse_source(&source, "<annotation>")
        .map_err(|err| TypeExprError::new(err.to_string(), 0))?;
    let root = tree.root_node();
    if let Some(broken) = first_error(&root) {
        return Err(TypeExprError::new(
            "invalid syntax",
            broken.start_byte().saturating_sub(PREFIX.len()),
        ));
    }

    let annotation = match significant_children(&root).as_slice() {
        [statement] if statement.kind() == "expression_statement" => {
            match significant_children(statement).as_slice() {
                [assignment]
                    if assignment.kind() == "assignment"
                        && assignment.child_by_field_name("right").is_none() =>
                {
                    assignment.child_by_field_name("type")
                }
                _ => None,
            }
        }
        _ => None,
    };
    let annotation =
        annotation.ok_or_else(|| TypeExprError::new("not a single type expression", 0))?;

    ExprBuilder {
        source: &source,
        origin: PREFIX.len(),
    }
    .build(&annotation, 0)
}

/// Named children that carry code, without comments and line continuations
fn significant_children<'tree>(node: &Node<'tree>) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "comment" | "line_continuation"))
        .collect()
}

struct ExprBuilder<'s> {
    source: &'s str,
    /// Start byte of the annotation; error offsets are relative to it
    origin: usize,
}

impl ExprBuilder<'_> {
    fn text(&self, node: &Node) -> &str {
        node_text(node, self.source)
    }

    fn error(&self, node: &Node, message: impl Into<String>) -> TypeExprError {
        TypeExprError::new(message, node.start_byte().saturating_sub(self.origin))
    }

    fn unsupported(&self, node: &Node) -> TypeExprError {
        self.error(node, format!("unsupported `{}` in annotation", node.kind()))
    }

    fn only_child<'tree>(&self, node: &Node<'tree>) -> Result<Node<'tree>, TypeExprError> {
        match significant_children(node).as_slice() {
            [child] => Ok(*child),
            _ => Err(self.unsupported(node)),
        }
    }

    fn build_all(&self, nodes: &[Node], depth: usize) -> Result<Vec<TypeExpr>, TypeExprError> {
        nodes.iter().map(|node| self.build(node, depth)).collect()
    }

    fn build(&self, node: &Node, depth: usize) -> Result<TypeExpr, TypeExprError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(self.error(
                node,
                format!("annotation nested deeper than {MAX_TYPE_DEPTH} levels"),
            ));
        }

        match node.kind() {
            "type" => {
                let inner = self.only_child(node)?;
                self.build(&inner, depth)
            }
            "parenthesized_expression" => {
                let inner = self.only_child(node)?;
                self.build(&inner, depth + 1)
            }
            "identifier" | "none" | "true" | "false" | "attribute" | "member_type" => {
                self.dotted_name(node).map(TypeExpr::Name)
            }
            // `List[int]` in annotation position
            "generic_type" => {
                let children = significant_children(node);
                let [base, parameters] = children.as_slice() else {
                    return Err(self.unsupported(node));
                };
                if parameters.kind() != "type_parameter" {
                    return Err(self.unsupported(node));
                }
                Ok(TypeExpr::Subscript {
                    base: self.dotted_name(base)?,
                    args: self.build_all(&significant_children(parameters), depth + 1)?,
                })
            }
            // `typing.List[int]`, or any subscript read as an expression
            "subscript" => {
                let value = node
                    .child_by_field_name("value")
                    .ok_or_else(|| self.unsupported(node))?;
                let mut cursor = node.walk();
                let indices: Vec<Node> = node.children_by_field_name("subscript", &mut cursor).collect();
                Ok(TypeExpr::Subscript {
                    base: self.dotted_name(&value)?,
                    args: self.build_all(&indices, depth + 1)?,
                })
            }
            "union_type" | "binary_operator" => {
                let members = self.union_members(node)?;
                Ok(TypeExpr::Union(self.build_all(&members, depth + 1)?))
            }
            "string" | "concatenated_string" => string_value(node, self.source)
                .map(TypeExpr::Str)
                .ok_or_else(|| self.error(node, "formatted string in annotation")),
            "integer" | "float" => Ok(TypeExpr::Number(self.text(node).to_string())),
            "unary_operator" => {
                let operator = node.child_by_field_name("operator").map(|op| self.text(&op));
                let argument = node
                    .child_by_field_name("argument")
                    .filter(|arg| matches!(arg.kind(), "integer" | "float"));
                match (operator, argument) {
                    (Some("-"), Some(argument)) => {
                        Ok(TypeExpr::Number(format!("-{}", self.text(&argument))))
                    }
                    (Some("+"), Some(argument)) => {
                        Ok(TypeExpr::Number(self.text(&argument).to_string()))
                    }
                    _ => Err(self.unsupported(node)),
                }
            }
            "ellipsis" => Ok(TypeExpr::Ellipsis),
            "list" | "tuple" => Ok(TypeExpr::List(
                self.build_all(&significant_children(node), depth + 1)?,
            )),
            "call" => {
                let function = node
                    .child_by_field_name("function")
                    .ok_or_else(|| self.unsupported(node))?;
                Ok(TypeExpr::Call(self.dotted_name(&function)?))
            }
            _ => Err(self.unsupported(node)),
        }
    }

    /// Operands of a chain of `|`, left to right
    fn union_members<'tree>(&self, node: &Node<'tree>) -> Result<Vec<Node<'tree>>, TypeExprError> {
        let mut members = Vec::new();
        let mut pending = vec![*node];
        while let Some(current) = pending.pop() {
            let current = if current.kind() == "type" {
                self.only_child(&current)?
            } else {
                current
            };
            match current.kind() {
                "union_type" => {
                    pending.extend(significant_children(&current).into_iter().rev());
                }
                "binary_operator" => {
                    let operator = current.child_by_field_name("operator").map(|op| self.text(&op));
                    let left = current.child_by_field_name("left");
                    let right = current.child_by_field_name("right");
                    match (operator, left, right) {
                        (Some("|"), Some(left), Some(right)) => {
                            pending.push(right);
                            pending.push(left);
                        }
                        _ => return Err(self.unsupported(&current)),
                    }
                }
                _ => members.push(current),
            }
        }
        Ok(members)
    }

    /// `a.b.c` from an identifier, an attribute chain or a `member_type`
    fn dotted_name(&self, node: &Node) -> Result<String, TypeExprError> {
        let mut segments = Vec::new();
        let mut current = *node;
        loop {
            match current.kind() {
                "identifier" | "none" | "true" | "false" => {
                    segments.push(self.text(&current));
                    break;
                }
                "attribute" => {
                    let object = current.child_by_field_name("object");
                    let attribute = current.child_by_field_name("attribute");
                    let (Some(object), Some(attribute)) = (object, attribute) else {
                        return Err(self.unsupported(&current));
                    };
                    segments.push(self.text(&attribute));
                    current = object;
                }
                "member_type" => {
                    let children = significant_children(&current);
                    let [object, attribute] = children.as_slice() else {
                        return Err(self.unsupported(&current));
                    };
                    segments.push(self.text(attribute));
                    current = *object;
                }
                "type" => current = self.only_child(&current)?,
                _ => {
                    return Err(self.error(
                        node,
                        format!("`{}` is not a type name", self.text(node).trim()),
                    ))
                }
            }
        }
        segments.reverse();
        Ok(segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(n: &str) -> TypeExpr {
        TypeExpr::Name(n.to_string())
    }

    fn nested_list(depth: usize) -> String {
        format!("{}int{}", "List[".repeat(depth), "]".repeat(depth))
    }

    /// Expression of the first parameter annotation of the first function
    fn parameter_expr(source: &str) -> Result<TypeExpr, TypeExprError> {
        let tree = parse_source(source, "test.py").unwrap();
        let function = tree.root_node().named_child(0).unwrap();
        let parameters = function.child_by_field_name("parameters").unwrap();
        let parameter = parameters.named_child(0).unwrap();
        let annotation = parameter.child_by_field_name("type").unwrap();
        TypeExpr::from_node(&annotation, source)
    }

    #[test]
    fn test_parse_nested_generics() {
        let expr = parse_type_expr("List[Dict[str, str]]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "List".into(),
                args: vec![TypeExpr::Subscript {
                    base: "Dict".into(),
                    args: vec![name("str"), name("str")],
                }],
            }
        );
    }

    #[test]
    fn test_parse_pep604_union_with_dotted_names() {
        let expr = parse_type_expr("typing.Optional[int] | None").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Union(vec![
                TypeExpr::Subscript {
                    base: "typing.Optional".into(),
                    args: vec![name("int")],
                },
                name("None"),
            ])
        );
    }

    #[test]
    fn test_long_union_is_flat() {
        let expr = parse_type_expr("int | str | bytes | None").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Union(vec![name("int"), name("str"), name("bytes"), name("None")])
        );
    }

    #[test]
    fn test_parse_literal_and_forward_refs() {
        let expr = parse_type_expr("Literal['a', \"b\", -1]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "Literal".into(),
                args: vec![
                    TypeExpr::Str("a".into()),
                    TypeExpr::Str("b".into()),
                    TypeExpr::Number("-1".into()),
                ],
            }
        );
        assert_eq!(parse_type_expr("'User'").unwrap(), TypeExpr::Str("User".into()));
    }

    #[test]
    fn test_parse_callable_and_ellipsis() {
        let expr = parse_type_expr("Callable[[int, str], bool]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "Callable".into(),
                args: vec![TypeExpr::List(vec![name("int"), name("str")]), name("bool")],
            }
        );
        let tuple = parse_type_expr("Tuple[int, ...]").unwrap();
        assert_eq!(
            tuple,
            TypeExpr::Subscript {
                base: "Tuple".into(),
                args: vec![name("int"), TypeExpr::Ellipsis],
            }
        );
    }

    #[test]
    fn test_annotated_metadata_calls() {
        let expr = parse_type_expr("Annotated[int, Field(gt=0, description=\"n\")]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "Annotated".into(),
                args: vec![name("int"), TypeExpr::Call("Field".into())],
            }
        );
    }

    #[test]
    fn test_multiline_annotation() {
        let expr = parse_type_expr("Dict[\n    str,\n    int,\n]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "Dict".into(),
                args: vec![name("str"), name("int")],
            }
        );
    }

    #[test]
    fn test_comments_inside_parameter_annotation() {
        let expr = parameter_expr(
            "def f(x: Dict[\n    str,  # key\n    int,  # value\n]) -> str:\n    pass\n",
        )
        .unwrap();
        assert_eq!(
            expr,
            TypeExpr::Subscript {
                base: "Dict".into(),
                args: vec![name("str"), name("int")],
            }
        );
    }

    #[test]
    fn test_parameter_annotation_nodes() {
        let expr = parameter_expr("def f(x: typing.Optional[\"Model\"] | None):\n    pass\n").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Union(vec![
                TypeExpr::Subscript {
                    base: "typing.Optional".into(),
                    args: vec![TypeExpr::Str("Model".into())],
                },
                name("None"),
            ])
        );
    }

    #[test]
    fn test_nesting_limit() {
        assert!(parse_type_expr(&nested_list(MAX_TYPE_DEPTH)).is_ok());

        let err = parse_type_expr(&nested_list(MAX_TYPE_DEPTH + 1)).unwrap_err();
        assert_eq!(
            err.message,
            format!("annotation nested deeper than {MAX_TYPE_DEPTH} levels")
        );
    }

    #[test]
    fn test_very_deep_annotation_is_an_error() {
        let source = format!("def f(x: {}):\n    pass\n", nested_list(3000));
        let err = parameter_expr(&source).unwrap_err();
        assert!(err.message.starts_with("annotation nested deeper than"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_type_expr("List[").is_err());
        assert!(parse_type_expr("Dict[str,, int]").is_err());
        assert!(parse_type_expr("List[]").is_err());
        assert!(parse_type_expr("str int").is_err());
        assert!(parse_type_expr("a + b").is_err());
        assert!(parse_type_expr("f\"{x}\"").is_err());
        assert!(parse_type_expr("").is_err());
    }

    #[test]
    fn test_text_must_be_a_single_annotation() {
        assert!(parse_type_expr("int = 3").is_err());
        assert!(parse_type_expr("int\nimport os").is_err());
        assert!(parse_type_expr("int; x = 1").is_err());
        assert!(parse_type_expr("int  # trailing comment").is_ok());
    }

    #[test]
    fn test_display_round_trips_shape() {
        let expr = parse_type_expr("Dict[str, List[int]] | None").unwrap();
        assert_eq!(expr.to_string(), "Dict[str, List[int]] | None");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeExpr::simple_name("typing.List"), "List");
        assert_eq!(TypeExpr::simple_name("str"), "str");
    }
}
