pub mod schema;

use crate::{ThisError, pattern::PatternError};
use schema::{ConfigSchemaError, TemplateModel, Validate};

///
/// ConfigError
/// Errors raised while turning template text into a compiled topology.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// TOML could not be parsed into the expected structure.
    #[error("toml error: {0}")]
    CannotParseToml(String),

    /// A template model could not be rendered as TOML.
    #[error("toml serialize error: {0}")]
    CannotSerializeToml(String),

    /// Wrapper for data schema-level errors.
    #[error(transparent)]
    ConfigSchema(#[from] ConfigSchemaError),

    /// A field value could not be classified as a pattern.
    #[error("{location}: {source}")]
    Pattern {
        location: String,
        #[source]
        source: PatternError,
    },
}

impl ConfigError {
    pub(crate) fn pattern(location: impl Into<String>, source: PatternError) -> Self {
        Self::Pattern {
            location: location.into(),
            source,
        }
    }
}

///
/// Template
///

pub struct Template;

impl Template {
    /// Parse and validate a template from a TOML string.
    pub fn from_toml(src: &str) -> Result<TemplateModel, ConfigError> {
        let model: TemplateModel =
            toml::from_str(src).map_err(|e| ConfigError::CannotParseToml(e.to_string()))?;

        model.validate()?;

        Ok(model)
    }

    /// Render a template model back to TOML.
    pub fn to_toml(model: &TemplateModel) -> Result<String, ConfigError> {
        toml::to_string_pretty(model).map_err(|e| ConfigError::CannotSerializeToml(e.to_string()))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_toml_is_reported() {
        let err = Template::from_toml("[[nodes]\nid = ").expect_err("expected bad toml to fail");
        assert!(matches!(err, ConfigError::CannotParseToml(_)));
    }

    #[test]
    fn schema_violation_is_reported() {
        let err = Template::from_toml("[log]\nmax_entries = 1000000")
            .expect_err("expected oversized log to fail");

        assert!(matches!(err, ConfigError::ConfigSchema(_)));
    }

    #[test]
    fn model_survives_toml_round_trip() {
        let src = r#"
            [[nodes]]
            id = "1"
            name = { regex = "User.*" }

            [[calls]]
            id = "1-2"
            source = "1"
        "#;

        let model = Template::from_toml(src).unwrap();
        let rendered = Template::to_toml(&model).unwrap();

        assert_eq!(Template::from_toml(&rendered).unwrap(), model);
    }

    #[test]
    fn serialize_and_parse_failures_are_distinct() {
        let parse = ConfigError::CannotParseToml("bad".into());
        let serialize = ConfigError::CannotSerializeToml("bad".into());

        assert_eq!(parse.to_string(), "toml error: bad");
        assert_eq!(serialize.to_string(), "toml serialize error: bad");
    }
}
