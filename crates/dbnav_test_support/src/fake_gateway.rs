use async_trait::async_trait;
use dbnav_core::{Connection, DatabaseList, NavError, ObjectGateway, ObjectRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

type RequestHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone)]
enum FakeListing {
    Objects(Vec<ObjectRecord>),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeGatewayStats {
    pub database_list_calls: usize,
    /// Database names passed to `list_database_objects`, in call order.
    pub object_requests: Vec<String>,
    /// Servers seen by any call, in call order.
    pub servers: Vec<String>,
}

impl FakeGatewayStats {
    pub fn object_requests_for(&self, database: &str) -> usize {
        self.object_requests.iter().filter(|d| *d == database).count()
    }
}

#[derive(Default)]
struct FakeGatewayState {
    databases: RwLock<Vec<String>>,
    database_list_error: RwLock<Option<String>>,
    listings: RwLock<HashMap<String, FakeListing>>,
    database_list_calls: AtomicUsize,
    object_requests: Mutex<Vec<String>>,
    servers: Mutex<Vec<String>>,
    on_object_request: RwLock<Option<RequestHook>>,
}

/// Scriptable `ObjectGateway` that records every call.
///
/// Databases without a scripted listing return an empty object list.
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<FakeGatewayState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_databases<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *rwlock_write(&self.state.databases) = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_database_list_error(self, message: impl Into<String>) -> Self {
        *rwlock_write(&self.state.database_list_error) = Some(message.into());
        self
    }

    pub fn with_objects(self, database: impl Into<String>, records: Vec<ObjectRecord>) -> Self {
        self.set_objects(database, records);
        self
    }

    pub fn with_object_error(self, database: impl Into<String>, message: impl Into<String>) -> Self {
        self.set_object_error(database, message);
        self
    }

    pub fn set_objects(&self, database: impl Into<String>, records: Vec<ObjectRecord>) {
        rwlock_write(&self.state.listings).insert(database.into(), FakeListing::Objects(records));
    }

    pub fn set_object_error(&self, database: impl Into<String>, message: impl Into<String>) {
        rwlock_write(&self.state.listings)
            .insert(database.into(), FakeListing::Error(message.into()));
    }

    pub fn clear_database_list_error(&self) {
        *rwlock_write(&self.state.database_list_error) = None;
    }

    /// Runs `hook` with the database name while an object request is in
    /// flight, before the response is returned.
    pub fn on_object_request(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *rwlock_write(&self.state.on_object_request) = Some(Box::new(hook));
    }

    pub fn stats(&self) -> FakeGatewayStats {
        FakeGatewayStats {
            database_list_calls: self.state.database_list_calls.load(Ordering::Relaxed),
            object_requests: mutex_lock(&self.state.object_requests).clone(),
            servers: mutex_lock(&self.state.servers).clone(),
        }
    }

    pub fn as_gateway_arc(self) -> Arc<dyn ObjectGateway> {
        Arc::new(self)
    }
}

#[async_trait]
impl ObjectGateway for FakeGateway {
    async fn list_databases(&self, connection: &Connection) -> Result<DatabaseList, NavError> {
        self.state.database_list_calls.fetch_add(1, Ordering::Relaxed);
        mutex_lock(&self.state.servers).push(connection.server.clone());

        if let Some(message) = rwlock_read(&self.state.database_list_error).clone() {
            return Err(NavError::gateway(message));
        }

        Ok(DatabaseList {
            databases: rwlock_read(&self.state.databases).clone(),
        })
    }

    async fn list_database_objects(
        &self,
        connection: &Connection,
        database: &str,
    ) -> Result<Vec<ObjectRecord>, NavError> {
        mutex_lock(&self.state.object_requests).push(database.to_string());
        mutex_lock(&self.state.servers).push(connection.server.clone());

        if let Some(hook) = rwlock_read(&self.state.on_object_request).as_ref() {
            hook(database);
        }

        match rwlock_read(&self.state.listings).get(database).cloned() {
            Some(FakeListing::Objects(records)) => Ok(records),
            Some(FakeListing::Error(message)) => Err(NavError::gateway(message)),
            None => Ok(Vec::new()),
        }
    }
}

fn mutex_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
