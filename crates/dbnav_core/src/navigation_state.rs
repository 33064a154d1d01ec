use crate::{Connection, JsonFileStore, KeyValueStore, MemoryStore, NavError, NavigatorConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};

pub const KEY_CONNECTION: &str = "nav.connection";
pub const KEY_SELECTED_DATABASE: &str = "nav.selected_database";
pub const KEY_HIERARCHY: &str = "nav.hierarchy";
pub const KEY_ALL_INDEX: &str = "nav.all_index";
pub const KEY_SELECTED_TABLE: &str = "nav.selected_table";
pub const KEY_SELECTED_INDEX: &str = "nav.selected_index";

const NOTIFICATION_CAPACITY: usize = 16;

/// How `set_selected_database` treats the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyUpdate {
    /// Rewrite the hierarchy to `[server, database]`.
    Rewrite,
    /// Leave the hierarchy alone; the caller sets it explicitly.
    Keep,
}

/// Shared record of where the user is in the remote object hierarchy.
///
/// Components receive it as an `Arc` at construction and only mutate it
/// through the setters below. Every observable field is a `watch` channel;
/// the breadcrumb and index-refresh channels are `broadcast` notifications
/// and carry no state.
///
/// Persistence is best-effort: storage failures are logged and the in-memory
/// value still changes.
pub struct NavigationState {
    connection: watch::Sender<Option<Connection>>,
    selected_database: watch::Sender<Option<String>>,
    selected_table: watch::Sender<Option<String>>,
    selected_index: watch::Sender<Option<String>>,
    hierarchy: watch::Sender<Vec<String>>,
    database_list_loaded: watch::Sender<bool>,
    all_index: watch::Sender<bool>,
    breadcrumb_clicks: broadcast::Sender<usize>,
    index_refresh: broadcast::Sender<()>,
    generation: AtomicU64,
    store: Arc<dyn KeyValueStore>,
}

impl NavigationState {
    /// Creates an empty state writing through to `store`, ignoring anything
    /// already persisted there.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            connection: watch::channel(None).0,
            selected_database: watch::channel(None).0,
            selected_table: watch::channel(None).0,
            selected_index: watch::channel(None).0,
            hierarchy: watch::channel(Vec::new()).0,
            database_list_loaded: watch::channel(false).0,
            all_index: watch::channel(false).0,
            breadcrumb_clicks: broadcast::channel(NOTIFICATION_CAPACITY).0,
            index_refresh: broadcast::channel(NOTIFICATION_CAPACITY).0,
            generation: AtomicU64::new(0),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Creates a state rehydrated from whatever `store` holds.
    ///
    /// Missing or undecodable entries are treated as absent.
    pub fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let state = Self::new(store);

        let connection: Option<Connection> = state.load(KEY_CONNECTION);
        let selected_database: Option<String> = state.load(KEY_SELECTED_DATABASE);
        let hierarchy: Vec<String> = state.load(KEY_HIERARCHY).unwrap_or_default();
        let all_index: bool = state.load(KEY_ALL_INDEX).unwrap_or(false);
        let selected_table: Option<String> = state.load(KEY_SELECTED_TABLE);
        let selected_index: Option<String> = state.load(KEY_SELECTED_INDEX);

        log::debug!(
            "Restored navigation state: connected={}, database={:?}, depth={}",
            connection.is_some(),
            selected_database,
            hierarchy.len()
        );

        state.connection.send_replace(connection);
        state.selected_database.send_replace(selected_database);
        state.hierarchy.send_replace(hierarchy);
        state.all_index.send_replace(all_index);
        state.selected_table.send_replace(selected_table);
        state.selected_index.send_replace(selected_index);

        state
    }

    /// Opens the file store named by `config` (or the default data file) and
    /// restores from it, falling back to memory when no file can be opened.
    pub fn from_config(config: &NavigatorConfig) -> Self {
        let store = match &config.storage_file {
            Some(path) => JsonFileStore::open(path),
            None => JsonFileStore::new(),
        };

        match store {
            Ok(store) => Self::restore(Arc::new(store)),
            Err(e) => {
                log::warn!("Navigation state will not persist: {}", e);
                Self::in_memory()
            }
        }
    }

    // --- connection ---

    pub fn connection(&self) -> Option<Connection> {
        self.connection.borrow().clone()
    }

    pub fn server_name(&self) -> Option<String> {
        self.connection.borrow().as_ref().map(|c| c.server.clone())
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<Option<Connection>> {
        self.connection.subscribe()
    }

    /// Counter bumped on every connection change. Gateway callers compare it
    /// before and after a request to detect responses for an old connection.
    pub fn connection_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn set_connection(&self, connection: Connection) {
        self.persist(KEY_CONNECTION, &connection);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.connection.send_replace(Some(connection));
    }

    /// Drops the connection and everything derived from it.
    pub fn clear_connection(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        self.forget(KEY_CONNECTION);
        self.connection.send_replace(None);

        self.set_selected_database(None, HierarchyUpdate::Keep);
        self.set_hierarchy(Vec::new());
        self.set_selected_table_name(None);
        self.set_selected_index_name(None);
        self.set_database_list_loaded(false);
    }

    // --- selected database ---

    pub fn selected_database(&self) -> Option<String> {
        self.selected_database.borrow().clone()
    }

    pub fn subscribe_selected_database(&self) -> watch::Receiver<Option<String>> {
        self.selected_database.subscribe()
    }

    pub fn set_selected_database(&self, name: Option<String>, update: HierarchyUpdate) {
        self.persist_optional(KEY_SELECTED_DATABASE, name.as_ref());
        replace_if_changed(&self.selected_database, name.clone());

        if update == HierarchyUpdate::Keep {
            return;
        }

        // The hierarchy may only name a database below a server segment.
        let hierarchy = match self.server_name() {
            Some(server) => {
                let mut parts = vec![server];
                parts.extend(name);
                parts
            }
            None => Vec::new(),
        };
        self.set_hierarchy(hierarchy);
    }

    // --- hierarchy ---

    pub fn hierarchy(&self) -> Vec<String> {
        self.hierarchy.borrow().clone()
    }

    pub fn subscribe_hierarchy(&self) -> watch::Receiver<Vec<String>> {
        self.hierarchy.subscribe()
    }

    /// Replaces the whole hierarchy. Never merged with the previous value.
    pub fn set_hierarchy(&self, parts: Vec<String>) {
        self.persist(KEY_HIERARCHY, &parts);
        replace_if_changed(&self.hierarchy, parts);
    }

    // --- table / index ---

    pub fn selected_table_name(&self) -> Option<String> {
        self.selected_table.borrow().clone()
    }

    pub fn subscribe_selected_table_name(&self) -> watch::Receiver<Option<String>> {
        self.selected_table.subscribe()
    }

    pub fn set_selected_table_name(&self, name: Option<String>) {
        self.persist_optional(KEY_SELECTED_TABLE, name.as_ref());
        replace_if_changed(&self.selected_table, name);
    }

    pub fn selected_index_name(&self) -> Option<String> {
        self.selected_index.borrow().clone()
    }

    pub fn subscribe_selected_index_name(&self) -> watch::Receiver<Option<String>> {
        self.selected_index.subscribe()
    }

    pub fn set_selected_index_name(&self, name: Option<String>) {
        self.persist_optional(KEY_SELECTED_INDEX, name.as_ref());
        replace_if_changed(&self.selected_index, name);
    }

    // --- flags ---

    /// `false` means "not ready to query", not "the server has no databases".
    pub fn is_database_list_loaded(&self) -> bool {
        *self.database_list_loaded.borrow()
    }

    pub fn subscribe_database_list_loaded(&self) -> watch::Receiver<bool> {
        self.database_list_loaded.subscribe()
    }

    pub fn set_database_list_loaded(&self, loaded: bool) {
        replace_if_changed(&self.database_list_loaded, loaded);
    }

    pub fn is_all_index(&self) -> bool {
        *self.all_index.borrow()
    }

    pub fn subscribe_all_index(&self) -> watch::Receiver<bool> {
        self.all_index.subscribe()
    }

    pub fn set_is_all_index(&self, all: bool) {
        self.persist(KEY_ALL_INDEX, &all);
        replace_if_changed(&self.all_index, all);
    }

    // --- notifications ---

    /// Asks the sidebar to re-expand down to hierarchy `level`.
    pub fn trigger_breadcrumb_click(&self, level: usize) {
        // No receivers just means no sidebar is mounted.
        let _ = self.breadcrumb_clicks.send(level);
    }

    pub fn on_breadcrumb_click(&self) -> broadcast::Receiver<usize> {
        self.breadcrumb_clicks.subscribe()
    }

    /// Fired when an index leaf is clicked, and only then.
    pub fn trigger_index_refresh(&self) {
        let _ = self.index_refresh.send(());
    }

    pub fn on_index_refresh(&self) -> broadcast::Receiver<()> {
        self.index_refresh.subscribe()
    }

    // --- persistence ---

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring undecodable value for {}: {}", key, e);
                None
            }
        }
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(NavError::from)
            .and_then(|json| self.store.set(key, &json));

        if let Err(e) = result {
            log::warn!("Failed to persist {}: {}", key, e);
        }
    }

    fn persist_optional<T: Serialize>(&self, key: &str, value: Option<&T>) {
        match value {
            Some(value) => self.persist(key, value),
            None => self.forget(key),
        }
    }

    fn forget(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("Failed to remove {}: {}", key, e);
        }
    }
}

fn replace_if_changed<T: PartialEq>(sender: &watch::Sender<T>, value: T) -> bool {
    sender.send_if_modified(|current| {
        if *current == value {
            return false;
        }
        *current = value;
        true
    })
}
