use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Credentials for the server currently being browsed.
///
/// Owned by `NavigationState`; every other component reads it through the
/// store. The password is kept as a `SecretString` so it never shows up in
/// logs through `Debug`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub server: String,
    pub username: String,

    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_connection_id: Option<String>,
}

impl Connection {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            connection_id: None,
            inner_connection_id: None,
        }
    }

    pub fn with_connection_id(mut self, id: impl Into<String>) -> Self {
        self.connection_id = Some(id.into());
        self
    }

    pub fn with_inner_connection_id(mut self, id: impl Into<String>) -> Self {
        self.inner_connection_id = Some(id.into());
        self
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            username: self.username.clone(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            connection_id: self.connection_id.clone(),
            inner_connection_id: self.inner_connection_id.clone(),
        }
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.server == other.server
            && self.username == other.username
            && self.password.expose_secret() == other.password.expose_secret()
            && self.connection_id == other.connection_id
            && self.inner_connection_id == other.inner_connection_id
    }
}

impl Eq for Connection {}

fn serialize_secret<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<SecretString, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::from(raw))
}
