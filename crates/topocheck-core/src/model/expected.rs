use crate::{
    config::{
        ConfigError,
        schema::{CallSpec, ConfigSchemaError, NodeSpec, PatternSpec, TemplateModel},
    },
    pattern::PatternValue,
};
use std::collections::BTreeSet;

///
/// ExpectedNode
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedNode {
    pub id: PatternValue,
    pub name: Option<PatternValue>,
    pub node_type: Option<PatternValue>,
    pub is_real: Option<PatternValue>,
}

impl ExpectedNode {
    fn compile(index: usize, spec: &NodeSpec) -> Result<Self, ConfigError> {
        let at = |field: &str| format!("nodes[{index}].{field}");

        Ok(Self {
            id: compile(&at("id"), &spec.id)?,
            name: compile_opt(&at("name"), spec.name.as_ref())?,
            node_type: compile_opt(&at("type"), spec.node_type.as_ref())?,
            is_real: compile_opt(&at("isReal"), spec.is_real.as_ref())?,
        })
    }

    fn patterns(&self) -> impl Iterator<Item = &PatternValue> {
        std::iter::once(&self.id).chain(
            [&self.name, &self.node_type, &self.is_real]
                .into_iter()
                .flatten(),
        )
    }
}

///
/// ExpectedCall
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedCall {
    pub id: PatternValue,
    pub source: Option<PatternValue>,
    pub target: Option<PatternValue>,
}

impl ExpectedCall {
    fn compile(index: usize, spec: &CallSpec) -> Result<Self, ConfigError> {
        let at = |field: &str| format!("calls[{index}].{field}");

        Ok(Self {
            id: compile(&at("id"), &spec.id)?,
            source: compile_opt(&at("source"), spec.source.as_ref())?,
            target: compile_opt(&at("target"), spec.target.as_ref())?,
        })
    }

    fn patterns(&self) -> impl Iterator<Item = &PatternValue> {
        std::iter::once(&self.id).chain([&self.source, &self.target].into_iter().flatten())
    }
}

fn compile(location: &str, spec: &PatternSpec) -> Result<PatternValue, ConfigError> {
    PatternValue::compile(spec).map_err(|err| ConfigError::pattern(location, err))
}

fn compile_opt(
    location: &str,
    spec: Option<&PatternSpec>,
) -> Result<Option<PatternValue>, ConfigError> {
    spec.map(|s| compile(location, s)).transpose()
}

///
/// ExpectedTopology
///
/// Immutable once built. Literal ids are checked for duplicates up front;
/// literal call endpoints must name a literal node id whenever every node id
/// is literal (otherwise endpoints are checked during matching).
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExpectedTopology {
    nodes: Vec<ExpectedNode>,
    calls: Vec<ExpectedCall>,
}

impl ExpectedTopology {
    pub fn new(nodes: Vec<ExpectedNode>, calls: Vec<ExpectedCall>) -> Result<Self, ConfigError> {
        let topology = Self { nodes, calls };
        topology.check_structure()?;

        Ok(topology)
    }

    /// Compile every field of a validated template model.
    pub fn compile(model: &TemplateModel) -> Result<Self, ConfigError> {
        let nodes = model
            .nodes
            .iter()
            .enumerate()
            .map(|(i, spec)| ExpectedNode::compile(i, spec))
            .collect::<Result<Vec<_>, _>>()?;

        let calls = model
            .calls
            .iter()
            .enumerate()
            .map(|(i, spec)| ExpectedCall::compile(i, spec))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(nodes, calls)
    }

    #[must_use]
    pub fn nodes(&self) -> &[ExpectedNode] {
        &self.nodes
    }

    #[must_use]
    pub fn calls(&self) -> &[ExpectedCall] {
        &self.calls
    }

    /// Every variable name referenced anywhere in the template.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .flat_map(ExpectedNode::patterns)
            .chain(self.calls.iter().flat_map(ExpectedCall::patterns))
            .flat_map(PatternValue::variables)
            .collect()
    }

    fn check_structure(&self) -> Result<(), ConfigSchemaError> {
        let node_ids = unique_literal_ids("node", self.nodes.iter().map(|n| &n.id))?;
        unique_literal_ids("call", self.calls.iter().map(|c| &c.id))?;

        if node_ids.len() != self.nodes.len() {
            return Ok(());
        }

        for (i, call) in self.calls.iter().enumerate() {
            for (field, endpoint) in [("source", &call.source), ("target", &call.target)] {
                if let Some(node) = endpoint.as_ref().and_then(PatternValue::as_literal)
                    && !node_ids.contains(node)
                {
                    return Err(ConfigSchemaError::ValidationError(format!(
                        "calls[{i}].{field} '{node}' does not name an expected node"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn unique_literal_ids<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a PatternValue>,
) -> Result<BTreeSet<&'a str>, ConfigSchemaError> {
    let mut seen = BTreeSet::new();

    for id in ids.filter_map(PatternValue::as_literal) {
        if id.is_empty() {
            return Err(ConfigSchemaError::ValidationError(format!(
                "{kind} id must not be empty"
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigSchemaError::ValidationError(format!(
                "{kind} id '{id}' appears more than once"
            )));
        }
    }

    Ok(seen)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Template;

    fn compile_toml(src: &str) -> Result<ExpectedTopology, ConfigError> {
        ExpectedTopology::compile(&Template::from_toml(src)?)
    }

    #[test]
    fn template_compiles_in_order() {
        let topo = compile_toml(
            r#"
            [[nodes]]
            id = "1"
            name = "User"
            is_real = false

            [[nodes]]
            id = "2"
            name = "${project}-pid:${pid}"

            [[calls]]
            id = "1-2"
            source = "1"
            target = "2"
        "#,
        )
        .unwrap();

        assert_eq!(topo.nodes().len(), 2);
        assert_eq!(topo.nodes()[0].is_real, Some(PatternValue::Literal("false".into())));
        assert!(matches!(topo.nodes()[1].name, Some(PatternValue::Template(_))));
        assert_eq!(topo.variables(), BTreeSet::from(["pid", "project"]));
    }

    #[test]
    fn bad_pattern_reports_its_location() {
        let err = compile_toml(
            r#"
            [[nodes]]
            id = "1"

            [[nodes]]
            id = "2"
            name = "${unterminated"
        "#,
        )
        .unwrap_err();

        assert!(matches!(&err, ConfigError::Pattern { location, .. } if location == "nodes[1].name"));
    }

    #[test]
    fn duplicate_literal_node_id_fails() {
        let err = compile_toml(
            r#"
            [[nodes]]
            id = "1"

            [[nodes]]
            id = "1"
        "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("appears more than once"));
    }

    #[test]
    fn empty_literal_id_fails() {
        compile_toml("[[calls]]\nid = \"\"").expect_err("expected empty call id to fail");
    }

    #[test]
    fn dangling_literal_endpoint_fails() {
        let err = compile_toml(
            r#"
            [[nodes]]
            id = "1"

            [[calls]]
            id = "1-9"
            source = "1"
            target = "9"
        "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("calls[0].target '9'"));
    }

    #[test]
    fn endpoints_are_not_checked_when_node_ids_are_patterns() {
        compile_toml(
            r#"
            [[nodes]]
            id = { regex = "[0-9]+" }

            [[calls]]
            id = "1-9"
            source = "1"
            target = "9"
        "#,
        )
        .expect("pattern node ids defer endpoint checks to matching");
    }
}
