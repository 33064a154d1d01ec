use crate::{Connection, NavError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One row of a database's object listing.
///
/// `folder` is a backslash-delimited path such as `Tables\dbo.Orders\Indexes`;
/// `item` is the bare object name placed inside that folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub folder: String,
    pub item: String,
}

impl ObjectRecord {
    pub fn new(folder: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            item: item.into(),
        }
    }
}

/// Response body of the database listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseList {
    #[serde(default)]
    pub databases: Vec<String>,
}

/// Remote source of the server's object hierarchy.
///
/// The transport is owned elsewhere; implementations only need to turn a
/// connection into database names and per-database object records. Calls have
/// no cancellation, so a caller that no longer wants a response has to discard
/// it itself.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    async fn list_databases(&self, connection: &Connection) -> Result<DatabaseList, NavError>;

    async fn list_database_objects(
        &self,
        connection: &Connection,
        database: &str,
    ) -> Result<Vec<ObjectRecord>, NavError>;
}
