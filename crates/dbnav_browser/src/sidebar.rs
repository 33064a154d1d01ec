use crate::lazy_tree::{LazyTree, RootLoad};
use dbnav_core::{
    Connection, ConventionClassifier, FolderKind, HierarchyUpdate, LoadState, NavigationState,
    NavigatorConfig, NodeId, Notifier, ObjectGateway, PathClassifier, TreeNode,
};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};

/// What a click on a node amounts to, decided before the tree is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToggleAction {
    SelectLeaf,
    ExpandDatabase,
    CollapseDatabase,
    ToggleServer(bool),
    ToggleFolder(bool),
}

/// Sidebar tree of the connected server.
///
/// Writes the user's position into [`NavigationState`] as nodes are clicked,
/// and re-expands itself when the connection changes or a breadcrumb is
/// clicked. Call [`process_pending`](Self::process_pending) or
/// [`handle_next_event`](Self::handle_next_event) to react to those.
pub struct SidebarNavigator {
    tree: LazyTree,
    state: Arc<NavigationState>,
    classifier: Box<dyn PathClassifier>,
    connection_rx: watch::Receiver<Option<Connection>>,
    breadcrumb_rx: broadcast::Receiver<usize>,
}

impl SidebarNavigator {
    pub fn new(
        state: Arc<NavigationState>,
        gateway: Arc<dyn ObjectGateway>,
        notifier: Arc<dyn Notifier>,
        config: &NavigatorConfig,
    ) -> Self {
        let mut connection_rx = state.subscribe_connection();
        connection_rx.mark_unchanged();
        let breadcrumb_rx = state.on_breadcrumb_click();

        Self {
            tree: LazyTree::new(
                state.clone(),
                gateway,
                notifier,
                config.discard_stale_responses,
            ),
            state,
            classifier: Box::new(ConventionClassifier),
            connection_rx,
            breadcrumb_rx,
        }
    }

    pub fn with_classifier(mut self, classifier: impl PathClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
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

    /// Rebuilds the tree from the gateway's database list.
    ///
    /// Sets the database-list-loaded flag accordingly and, when the restored
    /// hierarchy points into this server, expands back to it.
    pub async fn load_databases(&mut self) {
        match self.tree.load_root().await {
            RootLoad::Loaded => {
                self.state.set_database_list_loaded(true);
                self.restore_position().await;
            }
            RootLoad::Stale => {}
            RootLoad::Empty | RootLoad::Failed | RootLoad::NoConnection => {
                self.state.set_database_list_loaded(false);
            }
        }
    }

    async fn restore_position(&mut self) {
        let hierarchy = self.state.hierarchy();
        let Some(database) = hierarchy.get(1) else {
            return;
        };
        if self.tree.server_name() != hierarchy.first().map(String::as_str) {
            debug!("Restored hierarchy belongs to another server, not expanding");
            return;
        }
        if self.tree.find(&NodeId::new(database.as_str())).is_none() {
            debug!("Restored database {} no longer exists", database);
            return;
        }
        self.expand_to_hierarchy(hierarchy.len() - 1).await;
    }

    /// Handles a click on a node.
    pub async fn toggle_node(&mut self, id: &NodeId) {
        let Some(action) = self.action_for(id) else {
            debug!("Ignoring click on unknown node {}", id);
            return;
        };

        match action {
            ToggleAction::SelectLeaf => self.select_leaf(id),
            ToggleAction::ExpandDatabase => self.select_and_expand_database(id).await,
            ToggleAction::CollapseDatabase => self.collapse_database(id),
            ToggleAction::ToggleServer(expand) => {
                self.tree.set_expanded(id, expand);
            }
            ToggleAction::ToggleFolder(expand) => self.toggle_folder(id, expand),
        }
    }

    fn action_for(&self, id: &NodeId) -> Option<ToggleAction> {
        let action = match self.tree.find(id)? {
            TreeNode::Leaf(_) => ToggleAction::SelectLeaf,
            TreeNode::Folder(folder) => match folder.kind {
                FolderKind::Database if folder.expanded => ToggleAction::CollapseDatabase,
                FolderKind::Database => ToggleAction::ExpandDatabase,
                FolderKind::Server => ToggleAction::ToggleServer(!folder.expanded),
                FolderKind::Group => ToggleAction::ToggleFolder(!folder.expanded),
            },
        };
        Some(action)
    }

    /// Publishes a clicked object as the current position.
    ///
    /// Order matters to subscribers: hierarchy, database, table, index, and
    /// finally the index refresh notification when an index was resolved.
    fn select_leaf(&mut self, id: &NodeId) {
        let Some(server) = self.state.server_name() else {
            debug!("No connection, ignoring selection of {}", id);
            return;
        };

        let hierarchy: Vec<String> = std::iter::once(server)
            .chain(id.segments().map(str::to_string))
            .collect();

        let selection = self.classifier.classify(&hierarchy);
        let database = hierarchy.get(1).cloned();
        debug!(
            "Selected {} (table {:?}, index {:?})",
            id, selection.table, selection.index
        );

        self.state.set_hierarchy(hierarchy);
        self.state.set_selected_database(database, HierarchyUpdate::Keep);
        self.state.set_selected_table_name(selection.table);

        let has_index = selection.index.is_some();
        self.state.set_selected_index_name(selection.index);
        if has_index {
            self.state.trigger_index_refresh();
        }
    }

    /// Expands a database node and makes it the selected database.
    ///
    /// Only database nodes couple expansion with selection; deeper folders
    /// just toggle.
    ///
    /// The selection is written once the load has completed, and not at all
    /// when the connection changed in the meantime.
    pub async fn select_and_expand_database(&mut self, id: &NodeId) {
        let generation = self.state.connection_generation();
        let loaded = self.lazy_load_database_children_if_needed(id).await;

        if !self.tree.is_current(generation) {
            debug!("Connection changed while expanding {}, not selecting it", id);
            return;
        }

        self.state
            .set_selected_database(Some(id.as_str().to_string()), HierarchyUpdate::Rewrite);
        if loaded.is_some_and(|state| state.is_settled()) {
            self.tree.set_expanded(id, true);
        }
    }

    fn collapse_database(&mut self, id: &NodeId) {
        self.tree.set_expanded(id, false);
        self.state.set_selected_database(None, HierarchyUpdate::Rewrite);
    }

    fn toggle_folder(&mut self, id: &NodeId, expand: bool) {
        self.tree.set_expanded(id, expand);
        if !expand {
            return;
        }

        let Some(server) = self.state.server_name() else {
            return;
        };
        let hierarchy: Vec<String> = std::iter::once(server)
            .chain(id.segments().map(str::to_string))
            .collect();
        let database = hierarchy.get(1).cloned();

        self.state.set_hierarchy(hierarchy);
        self.state.set_selected_database(database, HierarchyUpdate::Keep);
    }

    /// Fetches a database's objects once; later calls are no-ops.
    ///
    /// Failed fetches are retried on the next call.
    pub async fn lazy_load_database_children_if_needed(
        &mut self,
        database: &NodeId,
    ) -> Option<LoadState> {
        self.tree.load_database(database).await
    }

    /// Expands the tree along the current hierarchy, down to `level`.
    ///
    /// Level 0 is the server. Databases met on the way are loaded first.
    /// Expansion stops at the first name the tree does not contain.
    pub async fn expand_to_hierarchy(&mut self, level: usize) {
        let hierarchy = self.state.hierarchy();
        let Some(server) = hierarchy.first() else {
            return;
        };
        if self.tree.server_name() != Some(server.as_str()) {
            debug!("Hierarchy starts at {}, not this tree's server", server);
            return;
        }

        let end = (level + 1).min(hierarchy.len());
        self.tree.expand_path(&hierarchy[1..end]).await;
    }

    async fn on_connection_changed(&mut self) {
        self.tree.clear();
        if self.state.connection().is_some() {
            self.load_databases().await;
        } else {
            self.state.set_database_list_loaded(false);
        }
    }

    /// Handles every connection change and breadcrumb click queued so far.
    pub async fn process_pending(&mut self) {
        if self.connection_rx.has_changed().unwrap_or(false) {
            self.connection_rx.mark_unchanged();
            self.on_connection_changed().await;
        }

        loop {
            match self.breadcrumb_rx.try_recv() {
                Ok(level) => self.expand_to_hierarchy(level).await,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Skipped {} breadcrumb clicks", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Waits for the next connection change or breadcrumb click and handles it.
    ///
    /// Returns `false` once the navigation state has been dropped.
    pub async fn handle_next_event(&mut self) -> bool {
        tokio::select! {
            changed = self.connection_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
                self.connection_rx.mark_unchanged();
                self.on_connection_changed().await;
            }
            click = self.breadcrumb_rx.recv() => match click {
                Ok(level) => self.expand_to_hierarchy(level).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Skipped {} breadcrumb clicks", skipped);
                }
                Err(RecvError::Closed) => return false,
            },
        }
        true
    }
}
