//!
//! The topology observed from the system under test. The engine only reads
//! these values; callers build them directly or load a JSON snapshot.
//!

use crate::ThisError;
use serde::{Deserialize, Deserializer, Serialize};

///
/// SnapshotError
///

#[derive(Debug, ThisError)]
pub enum SnapshotError {
    #[error("json error: {0}")]
    CannotParseJson(String),
}

///
/// ActualNode
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActualNode {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub node_type: Option<String>,

    #[serde(
        default,
        rename = "isReal",
        alias = "is_real",
        deserialize_with = "flag_text"
    )]
    pub is_real: Option<String>,
}

impl ActualNode {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    #[must_use]
    pub fn with_real(mut self, is_real: bool) -> Self {
        self.is_real = Some(is_real.to_string());
        self
    }
}

///
/// ActualCall
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActualCall {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl ActualCall {
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// A call whose id is `"{source}-{target}"`.
    #[must_use]
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let (source, target) = (source.into(), target.into());

        Self {
            id: format!("{source}-{target}"),
            source,
            target,
        }
    }
}

///
/// ActualTopology
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActualTopology {
    #[serde(default)]
    pub nodes: Vec<ActualNode>,

    #[serde(default)]
    pub calls: Vec<ActualCall>,
}

impl ActualTopology {
    #[must_use]
    pub const fn new(nodes: Vec<ActualNode>, calls: Vec<ActualCall>) -> Self {
        Self { nodes, calls }
    }

    /// Load a `{ "nodes": [...], "calls": [...] }` snapshot.
    pub fn from_json(src: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(src).map_err(|e| SnapshotError::CannotParseJson(e.to_string()))
    }
}

// isReal arrives as a JSON bool or as text depending on the collector
fn flag_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(b) => b.to_string(),
        Flag::Text(s) => s,
    }))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_accepts_bool_and_text_flags() {
        let json = r#"{
            "nodes": [
                { "id": "1", "name": "User", "type": "USER", "isReal": false },
                { "id": "2", "name": "svc", "type": "Tomcat", "isReal": "true" },
                { "id": "3" }
            ],
            "calls": [{ "id": "1-2", "source": "1", "target": "2" }]
        }"#;

        let topo = ActualTopology::from_json(json).unwrap();

        assert_eq!(topo.nodes[0].is_real.as_deref(), Some("false"));
        assert_eq!(topo.nodes[1].is_real.as_deref(), Some("true"));
        assert_eq!(topo.nodes[2], ActualNode::new("3"));
        assert_eq!(topo.calls[0], ActualCall::between("1", "2"));
    }

    #[test]
    fn null_flag_is_absent() {
        let json = r#"{ "nodes": [{ "id": "1", "isReal": null }] }"#;
        let topo = ActualTopology::from_json(json).unwrap();

        assert_eq!(topo.nodes[0].is_real, None);
        assert!(topo.calls.is_empty());
    }

    #[test]
    fn call_without_endpoints_is_rejected() {
        let json = r#"{ "calls": [{ "id": "1-2" }] }"#;
        let err = ActualTopology::from_json(json).unwrap_err();

        assert!(matches!(err, SnapshotError::CannotParseJson(_)));
    }

    #[test]
    fn builder_sets_fields() {
        let node = ActualNode::new("2")
            .with_name("svc")
            .with_type("Tomcat")
            .with_real(true);

        assert_eq!(node.name.as_deref(), Some("svc"));
        assert_eq!(node.node_type.as_deref(), Some("Tomcat"));
        assert_eq!(node.is_real.as_deref(), Some("true"));
    }
}
