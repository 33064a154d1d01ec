use dbnav_core::{
    FolderNode, LoadState, NavigationState, NodeId, Notice, Notifier, ObjectGateway, TreeNode,
    build_object_tree,
};
use log::{debug, error, info};
use std::sync::Arc;

/// Outcome of fetching the database list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootLoad {
    Loaded,
    Empty,
    Failed,
    NoConnection,
    Stale,
}

/// Server tree whose database nodes are filled in on demand.
///
/// Shared by the sidebar and the selection picker; each owns its own instance
/// so their expansion and load state never interfere. Gateway errors are
/// caught here, reported through the notifier and turned into node state.
pub(crate) struct LazyTree {
    state: Arc<NavigationState>,
    gateway: Arc<dyn ObjectGateway>,
    notifier: Arc<dyn Notifier>,
    discard_stale: bool,
    root: Option<TreeNode>,
}

impl LazyTree {
    pub(crate) fn new(
        state: Arc<NavigationState>,
        gateway: Arc<dyn ObjectGateway>,
        notifier: Arc<dyn Notifier>,
        discard_stale: bool,
    ) -> Self {
        Self {
            state,
            gateway,
            notifier,
            discard_stale,
            root: None,
        }
    }

    pub(crate) fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub(crate) fn clear(&mut self) {
        self.root = None;
    }

    pub(crate) fn server_name(&self) -> Option<&str> {
        self.root.as_ref().map(TreeNode::name)
    }

    pub(crate) fn find(&self, id: &NodeId) -> Option<&TreeNode> {
        self.root.as_ref()?.find(id)
    }

    fn folder_mut(&mut self, id: &NodeId) -> Option<&mut FolderNode> {
        self.root.as_mut()?.find_mut(id)?.as_folder_mut()
    }

    fn database_mut(&mut self, id: &NodeId) -> Option<&mut FolderNode> {
        self.folder_mut(id).filter(|folder| folder.is_database())
    }

    pub(crate) fn database_ids(&self) -> Vec<NodeId> {
        self.root
            .as_ref()
            .map(|root| root.children().iter().map(|c| c.id().clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn load_state(&self, database: &NodeId) -> Option<LoadState> {
        self.find(database)
            .and_then(TreeNode::as_folder)
            .filter(|folder| folder.is_database())
            .map(|folder| folder.load_state)
    }

    pub(crate) fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> bool {
        match self.folder_mut(id) {
            Some(folder) => {
                folder.expanded = expanded;
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        !self.discard_stale || self.state.connection_generation() == generation
    }

    /// Replaces the tree with a server root listing every database.
    pub(crate) async fn load_root(&mut self) -> RootLoad {
        let Some(connection) = self.state.connection() else {
            self.root = None;
            return RootLoad::NoConnection;
        };

        let generation = self.state.connection_generation();
        debug!("Listing databases on {}", connection.server);
        let result = self.gateway.list_databases(&connection).await;

        if !self.is_current(generation) {
            debug!(
                "Discarding database list for {}: connection changed",
                connection.server
            );
            return RootLoad::Stale;
        }

        match result {
            Ok(list) if !list.databases.is_empty() => {
                info!(
                    "Loaded {} databases on {}",
                    list.databases.len(),
                    connection.server
                );
                self.root = Some(TreeNode::Folder(FolderNode::server(
                    &connection.server,
                    &list.databases,
                )));
                RootLoad::Loaded
            }
            Ok(_) => {
                info!("No databases found on {}", connection.server);
                self.root = None;
                self.notifier.notify(Notice::info(format!(
                    "No databases found on {}",
                    connection.server
                )));
                RootLoad::Empty
            }
            Err(e) => {
                error!("Failed to list databases on {}: {}", connection.server, e);
                self.root = None;
                self.notifier
                    .notify(Notice::error(format!("Failed to load databases: {}", e)));
                RootLoad::Failed
            }
        }
    }

    /// Fetches a database's objects unless they are already loaded.
    ///
    /// Returns the node's load state afterwards, or `None` if `database` is not
    /// a database node of this tree.
    pub(crate) async fn load_database(&mut self, database: &NodeId) -> Option<LoadState> {
        let folder = self.database_mut(database)?;
        if !folder.load_state.needs_fetch() {
            return Some(folder.load_state);
        }
        folder.load_state = LoadState::Loading;

        let Some(connection) = self.state.connection() else {
            self.database_mut(database)?.load_state = LoadState::Unloaded;
            return Some(LoadState::Unloaded);
        };

        let generation = self.state.connection_generation();
        debug!("Listing objects of {} on {}", database, connection.server);
        let result = self
            .gateway
            .list_database_objects(&connection, database.as_str())
            .await;
        let current = self.is_current(generation);

        let folder = self.database_mut(database)?;

        if !current {
            debug!("Discarding object list for {}: connection changed", database);
            folder.load_state = LoadState::Unloaded;
            return Some(LoadState::Unloaded);
        }

        let notice = match result {
            Ok(records) if records.is_empty() => {
                folder.children.clear();
                folder.load_state = LoadState::Empty;
                folder.expanded = true;
                info!("No objects found in {}", database);
                Some(Notice::info(format!("No objects found in {}", database)))
            }
            Ok(records) => {
                folder.children = build_object_tree(&records, database);
                folder.load_state = LoadState::Loaded;
                folder.expanded = true;
                info!("Loaded {} objects in {}", records.len(), database);
                None
            }
            Err(e) => {
                folder.load_state = LoadState::Failed;
                folder.expanded = false;
                error!("Failed to list objects of {}: {}", database, e);
                Some(Notice::error(format!(
                    "Failed to load objects of {}: {}",
                    database, e
                )))
            }
        };

        if let Some(notice) = notice {
            self.notifier.notify(notice);
        }

        self.load_state(database)
    }

    /// Expands a node, loading it first when it is a database.
    async fn open(&mut self, id: &NodeId) {
        if self.database_mut(id).is_some() {
            let state = self.load_database(id).await;
            if state.is_some_and(|s| s.is_settled()) {
                self.set_expanded(id, true);
            }
        } else {
            self.set_expanded(id, true);
        }
    }

    fn child_named(&self, parent: &NodeId, name: &str) -> Option<NodeId> {
        self.find(parent)?
            .as_folder()?
            .child_named(name)
            .map(|child| child.id().clone())
    }

    /// Expands the root and then each named descendant in turn.
    ///
    /// `names` starts at the database level. Walking stops silently at the
    /// first name with no matching child; the deepest node reached is
    /// returned.
    pub(crate) async fn expand_path(&mut self, names: &[String]) -> Option<NodeId> {
        let mut current = self.root.as_ref()?.id().clone();
        self.open(&current).await;

        for name in names {
            let Some(next) = self.child_named(&current, name) else {
                debug!("No node named {} under {}, stopping expansion", name, current);
                break;
            };
            current = next;
            self.open(&current).await;
        }

        Some(current)
    }
}
