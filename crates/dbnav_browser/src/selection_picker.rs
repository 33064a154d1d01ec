use crate::lazy_tree::{LazyTree, RootLoad};
use dbnav_core::{
    Connection, FolderKind, LoadState, NavigationState, NavigatorConfig, NodeId, Notifier,
    ObjectGateway, TreeNode,
};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

/// A selected object, as submitted in a policy payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTarget {
    /// First folder below the database, e.g. `Tables`.
    pub object_type: String,
    pub object_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseTargets {
    pub database_name: String,
    pub selections: Vec<ObjectTarget>,
}

/// Selection grouped per database, in the order databases were first met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTargets {
    pub databases: Vec<DatabaseTargets>,
}

impl PolicyTargets {
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

/// Multi-select variant of the server tree.
///
/// Keeps a set of selected node paths, which may include paths of databases
/// that have not been loaded yet. Checking a node selects its whole subtree,
/// loading databases first so the subtree is complete.
pub struct SelectionPicker {
    tree: LazyTree,
    state: Arc<NavigationState>,
    selection: BTreeSet<NodeId>,
    selection_tx: watch::Sender<Vec<NodeId>>,
    connection_rx: watch::Receiver<Option<Connection>>,
}

impl SelectionPicker {
    pub fn new(
        state: Arc<NavigationState>,
        gateway: Arc<dyn ObjectGateway>,
        notifier: Arc<dyn Notifier>,
        config: &NavigatorConfig,
    ) -> Self {
        let mut connection_rx = state.subscribe_connection();
        connection_rx.mark_unchanged();
        let (selection_tx, _) = watch::channel(Vec::new());

        Self {
            tree: LazyTree::new(
                state.clone(),
                gateway,
                notifier,
                config.discard_stale_responses,
            ),
            state,
            selection: BTreeSet::new(),
            selection_tx,
            connection_rx,
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.root()
    }

    pub fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        self.tree.find(id)
    }

    pub fn database_load_state(&self, database: &str) -> Option<LoadState> {
        self.tree.load_state(&NodeId::new(database))
    }

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selection.contains(id)
    }

    /// Visible selection: every selected path below database level.
    pub fn selected_objects(&self) -> Vec<NodeId> {
        self.selection
            .iter()
            .filter(|id| !id.is_root() && !id.is_database_level())
            .cloned()
            .collect()
    }

    /// Receives the visible selection after every change.
    pub fn subscribe_selection(&self) -> watch::Receiver<Vec<NodeId>> {
        self.selection_tx.subscribe()
    }

    /// Builds the server tree. Unlike the sidebar this leaves the
    /// database-list-loaded flag alone.
    pub async fn load_tree(&mut self) {
        if self.tree.load_root().await == RootLoad::Loaded {
            self.apply_selections_to_tree().await;
        }
        self.publish();
    }

    /// Replaces the selection, e.g. with the paths of a saved policy.
    pub async fn set_initial_selections<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.selection = paths.into_iter().filter(|id| !id.is_empty()).collect();
        self.apply_selections_to_tree().await;
        self.publish();
    }

    /// Expands the ancestors of every selected path so the selection is
    /// visible. Paths the tree cannot resolve stay selected.
    pub async fn apply_selections_to_tree(&mut self) {
        if self.tree.root().is_none() {
            return;
        }

        let paths: Vec<NodeId> = self.selection.iter().cloned().collect();
        for path in paths {
            let segments: Vec<String> = path.segments().map(str::to_string).collect();
            let ancestors = &segments[..segments.len().saturating_sub(1)];
            self.tree.expand_path(ancestors).await;
        }
    }

    /// Checks or unchecks a node together with its whole subtree.
    pub async fn on_node_selection_changed(&mut self, id: &NodeId, checked: bool) {
        let Some(kind) = self.tree.find(id).map(node_kind) else {
            debug!("Ignoring selection of unknown node {}", id);
            return;
        };

        if checked {
            match kind {
                Some(FolderKind::Database) => {
                    self.tree.load_database(id).await;
                }
                Some(FolderKind::Server) => {
                    for database in self.tree.database_ids() {
                        self.tree.load_database(&database).await;
                    }
                }
                Some(FolderKind::Group) | None => {}
            }
            let added = self.subtree_ids(id);
            self.selection.extend(added);
        } else {
            let removed = self.subtree_ids(id);
            let databases: Vec<&NodeId> =
                removed.iter().filter(|id| id.is_database_level()).collect();
            self.selection.retain(|selected| {
                !removed.contains(selected)
                    && !databases.iter().any(|db| selected.is_descendant_of(db))
            });
        }

        self.publish();
    }

    fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.tree
            .find(id)
            .map(TreeNode::subtree_ids)
            .unwrap_or_default()
    }

    /// Whether every node currently in the tree is selected.
    pub fn is_everything_selected(&self) -> bool {
        match self.tree.root() {
            Some(root) => root
                .subtree_ids()
                .iter()
                .all(|id| self.selection.contains(id)),
            None => false,
        }
    }

    /// Groups selected objects per database for submission.
    ///
    /// The server root, database paths, intermediate folders and paths with
    /// fewer than three segments are left out. Paths that are not in the tree
    /// (e.g. restored before their database was loaded) count as objects.
    pub fn get_form_data(&self) -> PolicyTargets {
        let mut groups: IndexMap<&str, Vec<ObjectTarget>> = IndexMap::new();

        for path in &self.selection {
            if path.is_root() {
                continue;
            }
            if let Some(TreeNode::Folder(_)) = self.tree.find(path) {
                continue;
            }

            let segments: Vec<&str> = path.segments().collect();
            let [database, object_type, .., object_name] = segments.as_slice() else {
                continue;
            };

            groups.entry(*database).or_default().push(ObjectTarget {
                object_type: object_type.to_string(),
                object_name: object_name.to_string(),
            });
        }

        PolicyTargets {
            databases: groups
                .into_iter()
                .map(|(database, selections)| DatabaseTargets {
                    database_name: database.to_string(),
                    selections,
                })
                .collect(),
        }
    }

    /// A policy needs at least one selected node.
    pub fn validate(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Starts over when the connection changed since the last call.
    pub async fn process_pending(&mut self) {
        if !self.connection_rx.has_changed().unwrap_or(false) {
            return;
        }
        self.connection_rx.mark_unchanged();

        debug!("Connection changed, resetting picker");
        self.selection.clear();
        self.tree.clear();
        if self.state.connection().is_some() {
            self.load_tree().await;
        } else {
            self.publish();
        }
    }

    fn publish(&self) {
        self.selection_tx.send_replace(self.selected_objects());
        self.state.set_is_all_index(self.is_everything_selected());
    }
}

fn node_kind(node: &TreeNode) -> Option<FolderKind> {
    node.as_folder().map(|folder| folder.kind)
}
