use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used by the backend between folder path segments.
pub const PATH_SEPARATOR: char = '\\';

/// Canonical identity of a tree node: its backslash-joined path.
///
/// Paths are rooted at the database (`Sales\Tables\dbo.Orders`), never at the
/// server. The synthetic server root has the empty id, so a database named
/// like its server cannot collide with it. Two nodes are the same entity iff
/// their ids are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Joins segments with the separator, skipping empty ones.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            let segment = segment.as_ref();
            if segment.is_empty() {
                continue;
            }
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(segment);
        }
        Self(path)
    }

    /// Id of the synthetic server root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Returns the id of a direct child named `name`.
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            return Self(name.to_string());
        }
        Self(format!("{}{}{}", self.0, PATH_SEPARATOR, name))
    }

    pub fn parent(&self) -> Option<Self> {
        let (parent, _) = self.0.rsplit_once(PATH_SEPARATOR)?;
        Some(Self(parent.to_string()))
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// First path segment, which is the database for every non-root node.
    pub fn database(&self) -> Option<&str> {
        self.segments().next()
    }

    /// True for single-segment ids, i.e. database nodes.
    pub fn is_database_level(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(PATH_SEPARATOR)
    }

    pub fn is_descendant_of(&self, ancestor: &NodeId) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(ancestor.as_str())
            && self.0[ancestor.0.len()..].starts_with(PATH_SEPARATOR)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_segments_skips_empty_parts() {
        let id = NodeId::from_segments(["Sales", "", "Tables", "dbo.Orders"]);
        assert_eq!(id.as_str(), "Sales\\Tables\\dbo.Orders");
        assert_eq!(id.depth(), 3);
    }

    #[test]
    fn child_of_empty_id_has_no_leading_separator() {
        assert_eq!(NodeId::default().child("Tables").as_str(), "Tables");
        assert_eq!(
            NodeId::new("Sales").child("Tables").as_str(),
            "Sales\\Tables"
        );
    }

    #[test]
    fn parent_and_name() {
        let id = NodeId::new("Sales\\Tables\\dbo.Orders");
        assert_eq!(id.name(), "dbo.Orders");
        assert_eq!(id.parent(), Some(NodeId::new("Sales\\Tables")));
        assert_eq!(NodeId::new("Sales").parent(), None);
        assert_eq!(id.database(), Some("Sales"));
    }

    #[test]
    fn database_level_detection() {
        assert!(NodeId::new("Sales").is_database_level());
        assert!(!NodeId::new("Sales\\Tables").is_database_level());
        assert!(!NodeId::default().is_database_level());
        assert!(NodeId::root().is_root());
        assert!(!NodeId::new("Sales").is_root());
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        let db = NodeId::new("Sales");
        assert!(NodeId::new("Sales\\Tables").is_descendant_of(&db));
        assert!(!NodeId::new("SalesArchive\\Tables").is_descendant_of(&db));
        assert!(!db.is_descendant_of(&db));
    }
}
