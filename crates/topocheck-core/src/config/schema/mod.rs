mod log;
mod pattern;

pub use log::*;
pub use pattern::*;

use crate::{ThisError, pattern::is_variable_name};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// ConfigSchemaError
///

#[derive(Debug, ThisError)]
pub enum ConfigSchemaError {
    #[error("validation error: {0}")]
    ValidationError(String),
}

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigSchemaError>;
}

///
/// TemplateModel
///
/// The expected topology exactly as written in the template file.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateModel {
    // applied to the calling thread only when the template declares it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,

    #[serde(default)]
    pub variables: VariablesConfig,

    #[serde(default)]
    pub nodes: Vec<NodeSpec>,

    #[serde(default)]
    pub calls: Vec<CallSpec>,
}

impl Validate for TemplateModel {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if let Some(log) = &self.log {
            log.validate()?;
        }
        self.variables.validate()?;

        for (i, node) in self.nodes.iter().enumerate() {
            node.validate().map_err(|err| in_entity("node", i, err))?;
        }
        for (i, call) in self.calls.iter().enumerate() {
            call.validate().map_err(|err| in_entity("call", i, err))?;
        }

        Ok(())
    }
}

fn in_entity(kind: &str, index: usize, err: ConfigSchemaError) -> ConfigSchemaError {
    let ConfigSchemaError::ValidationError(msg) = err;

    ConfigSchemaError::ValidationError(format!("{kind} #{index}: {msg}"))
}

///
/// VariablesConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VariablesConfig {
    // names whose bindings reset at every entity pairing
    #[serde(default)]
    pub per_entity: BTreeSet<String>,
}

impl Validate for VariablesConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        for name in &self.per_entity {
            if !is_variable_name(name) {
                return Err(ConfigSchemaError::ValidationError(format!(
                    "variables.per_entity: '{name}' is not a valid variable name"
                )));
            }
        }

        Ok(())
    }
}

///
/// NodeSpec
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub id: PatternSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PatternSpec>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<PatternSpec>,

    #[serde(default, alias = "isReal", skip_serializing_if = "Option::is_none")]
    pub is_real: Option<PatternSpec>,
}

impl NodeSpec {
    #[must_use]
    pub fn new(id: impl Into<PatternSpec>) -> Self {
        Self {
            id: id.into(),
            name: None,
            node_type: None,
            is_real: None,
        }
    }
}

impl Validate for NodeSpec {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.id.validate()?;
        for spec in [&self.name, &self.node_type, &self.is_real]
            .into_iter()
            .flatten()
        {
            spec.validate()?;
        }

        Ok(())
    }
}

///
/// CallSpec
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CallSpec {
    pub id: PatternSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PatternSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<PatternSpec>,
}

impl CallSpec {
    #[must_use]
    pub fn new(id: impl Into<PatternSpec>) -> Self {
        Self {
            id: id.into(),
            source: None,
            target: None,
        }
    }
}

impl Validate for CallSpec {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.id.validate()?;
        for spec in [&self.source, &self.target].into_iter().flatten() {
            spec.validate()?;
        }

        Ok(())
    }
}

///
/// TESTS
///
