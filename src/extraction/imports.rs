use crate::syntax::node_text;
use tree_sitter::Node;

/// Module names imported at module level that mention `mcp`, in source
/// order without repeats (`from mcp.server.fastmcp import FastMCP`,
/// `import fastmcp`).
pub fn collect_mcp_imports(root: &Node, source: &str) -> Vec<String> {
    let mut modules: Vec<String> = Vec::new();
    let mut push = |module: &str| {
        let is_mcp = module
            .split('.')
            .any(|segment| segment.to_ascii_lowercase().contains("mcp"));
        if is_mcp && !modules.iter().any(|m| m == module) {
            modules.push(module.to_string());
        }
    };

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "import_from_statement" => {
                if let Some(module) = statement.child_by_field_name("module_name") {
                    push(node_text(&module, source));
                }
            }
            "import_statement" => {
                let mut names = statement.walk();
                for name in statement.children_by_field_name("name", &mut names) {
                    let dotted = match name.kind() {
                        "aliased_import" => name.child_by_field_name("name"),
                        _ => Some(name),
                    };
                    if let Some(dotted) = dotted {
                        push(node_text(&dotted, source));
                    }
                }
            }
            _ => {}
        }
    }
    modules
}
