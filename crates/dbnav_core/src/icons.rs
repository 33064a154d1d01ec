use serde::{Deserialize, Serialize};

/// Icon shown next to a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeIcon {
    Server,
    Database,
    Folder,
    Table,
    View,
    StoredProcedure,
    Function,
    Index,
    Trigger,
    Key,
    Constraint,
    Column,
    Statistic,
    Security,
    Document,
}

impl NodeIcon {
    pub fn name(&self) -> &'static str {
        match self {
            NodeIcon::Server => "server",
            NodeIcon::Database => "database",
            NodeIcon::Folder => "folder",
            NodeIcon::Table => "table",
            NodeIcon::View => "view",
            NodeIcon::StoredProcedure => "stored-procedure",
            NodeIcon::Function => "function",
            NodeIcon::Index => "index",
            NodeIcon::Trigger => "trigger",
            NodeIcon::Key => "key",
            NodeIcon::Constraint => "constraint",
            NodeIcon::Column => "column",
            NodeIcon::Statistic => "statistic",
            NodeIcon::Security => "security",
            NodeIcon::Document => "document",
        }
    }
}

// Most specific first: an index folder under `Tables\dbo.Orders\Indexes` must
// resolve to `Index`, not `Table`.
const PATH_RULES: &[(&str, NodeIcon)] = &[
    ("index", NodeIcon::Index),
    ("trigger", NodeIcon::Trigger),
    ("statistic", NodeIcon::Statistic),
    ("constraint", NodeIcon::Constraint),
    ("key", NodeIcon::Key),
    ("column", NodeIcon::Column),
    ("procedure", NodeIcon::StoredProcedure),
    ("function", NodeIcon::Function),
    ("view", NodeIcon::View),
    ("table", NodeIcon::Table),
    ("security", NodeIcon::Security),
    ("user", NodeIcon::Security),
    ("role", NodeIcon::Security),
];

const PROCEDURE_PREFIXES: &[&str] = &["sp_", "usp_"];
const FUNCTION_PREFIXES: &[&str] = &["fn_", "ufn_"];

fn match_path(lowered: &str) -> Option<NodeIcon> {
    PATH_RULES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, icon)| *icon)
}

/// Icon for a folder node, from its full path.
pub fn folder_icon(path: &str) -> NodeIcon {
    match_path(&path.to_lowercase()).unwrap_or(NodeIcon::Folder)
}

/// Icon for an object leaf, from its name and the folder it lives in.
///
/// Name prefixes win over the folder because procedures are often listed
/// under generic folders.
pub fn item_icon(name: &str, folder: &str) -> NodeIcon {
    let name = name.to_lowercase();

    if PROCEDURE_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return NodeIcon::StoredProcedure;
    }
    if FUNCTION_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return NodeIcon::Function;
    }

    match_path(&folder.to_lowercase()).unwrap_or(NodeIcon::Document)
}
