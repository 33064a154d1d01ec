use crate::{NodeIcon, NodeId};

/// Fetch progress of a database node's children.
///
/// `Loaded` and `Empty` are terminal for the lifetime of the tree; `Unloaded`
/// and `Failed` are fetched again on the next touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Empty,
    Failed,
}

impl LoadState {
    pub fn needs_fetch(&self) -> bool {
        matches!(self, LoadState::Unloaded | LoadState::Failed)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderKind {
    /// Synthetic root standing for the connected server.
    Server,
    /// A database; its children are fetched lazily.
    Database,
    /// Any folder produced by the tree builder.
    Group,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub id: NodeId,
    pub name: String,
    pub kind: FolderKind,
    pub icon: NodeIcon,
    pub children: Vec<TreeNode>,
    pub expanded: bool,
    pub load_state: LoadState,
}

impl FolderNode {
    /// Synthetic root for `server`. Its id is [`NodeId::root`], outside the
    /// path namespace of its databases.
    pub fn server(server: &str, databases: &[String]) -> Self {
        Self {
            id: NodeId::root(),
            name: server.to_string(),
            kind: FolderKind::Server,
            icon: NodeIcon::Server,
            children: databases
                .iter()
                .map(|name| TreeNode::Folder(FolderNode::database(name)))
                .collect(),
            expanded: true,
            load_state: LoadState::Loaded,
        }
    }

    /// Database ids are the bare database name, not prefixed by the server.
    pub fn database(name: &str) -> Self {
        Self {
            id: NodeId::new(name),
            name: name.to_string(),
            kind: FolderKind::Database,
            icon: NodeIcon::Database,
            children: Vec::new(),
            expanded: false,
            load_state: LoadState::Unloaded,
        }
    }

    pub fn group(id: NodeId, name: String, icon: NodeIcon, children: Vec<TreeNode>) -> Self {
        Self {
            id,
            name,
            kind: FolderKind::Group,
            icon,
            children,
            expanded: false,
            load_state: LoadState::Loaded,
        }
    }

    pub fn is_database(&self) -> bool {
        self.kind == FolderKind::Database
    }

    pub fn is_server(&self) -> bool {
        self.kind == FolderKind::Server
    }

    pub fn child_named(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    pub id: NodeId,
    pub name: String,
    pub icon: NodeIcon,
}

/// A node of the object browser tree.
///
/// Folders are never leaves, even when they have no children yet.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Folder(FolderNode),
    Leaf(LeafNode),
}

impl TreeNode {
    pub fn id(&self) -> &NodeId {
        match self {
            TreeNode::Folder(folder) => &folder.id,
            TreeNode::Leaf(leaf) => &leaf.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Folder(folder) => &folder.name,
            TreeNode::Leaf(leaf) => &leaf.name,
        }
    }

    pub fn icon(&self) -> NodeIcon {
        match self {
            TreeNode::Folder(folder) => folder.icon,
            TreeNode::Leaf(leaf) => leaf.icon,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf(_))
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, TreeNode::Folder(folder) if folder.expanded)
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Folder(folder) => &folder.children,
            TreeNode::Leaf(_) => &[],
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            TreeNode::Folder(folder) => Some(folder),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderNode> {
        match self {
            TreeNode::Folder(folder) => Some(folder),
            TreeNode::Leaf(_) => None,
        }
    }

    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        if self.id() == id {
            return Some(self);
        }

        self.children()
            .iter()
            .filter(|child| child.id() == id || id.is_descendant_of(child.id()))
            .find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut TreeNode> {
        if self.id() == id {
            return Some(self);
        }

        match self {
            TreeNode::Leaf(_) => None,
            TreeNode::Folder(folder) => folder
                .children
                .iter_mut()
                .filter(|child| child.id() == id || id.is_descendant_of(child.id()))
                .find_map(|child| child.find_mut(id)),
        }
    }

    /// Ids of this node and every descendant, in pre-order.
    pub fn subtree_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id().clone());
        for child in self.children() {
            child.collect_ids(out);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(TreeNode::node_count).sum::<usize>()
    }
}
