use super::{ConfigSchemaError, Validate};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

///
/// PatternSpec
///
/// Raw form of one template field as written in TOML: either a scalar
/// (string, bool or number) or a single-rule table such as
/// `{ regex = "Tomcat.*" }`.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Scalar(Scalar),
    Rule(PatternRule),
}

impl PatternSpec {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(s.into()))
    }

    #[must_use]
    pub fn regex(s: impl Into<String>) -> Self {
        Self::Rule(PatternRule {
            regex: Some(s.into()),
            ..Default::default()
        })
    }
}

impl From<&str> for PatternSpec {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl Validate for PatternSpec {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        match self {
            Self::Scalar(_) => Ok(()),
            Self::Rule(rule) => rule.validate(),
        }
    }
}

///
/// Scalar
/// Bools and numbers are matched by their text form.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            // debug form keeps the fraction: 1.0 stays "1.0"
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

///
/// PatternRule
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ne: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ge: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub le: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
}

///
/// RuleSpec
/// The single rule a validated `PatternRule` carries.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RuleSpec<'a> {
    Regex(&'a str),
    NotEqual(&'a Scalar),
    Greater(&'a Scalar),
    GreaterOrEqual(&'a Scalar),
    Less(&'a Scalar),
    LessOrEqual(&'a Scalar),
    NotNull,
}

impl PatternRule {
    /// Return the one rule this table declares.
    pub fn single(&self) -> Result<RuleSpec<'_>, ConfigSchemaError> {
        let mut rules = Vec::new();

        if let Some(re) = &self.regex {
            rules.push(RuleSpec::Regex(re));
        }
        if let Some(v) = &self.ne {
            rules.push(RuleSpec::NotEqual(v));
        }
        if let Some(v) = &self.gt {
            rules.push(RuleSpec::Greater(v));
        }
        if let Some(v) = &self.ge {
            rules.push(RuleSpec::GreaterOrEqual(v));
        }
        if let Some(v) = &self.lt {
            rules.push(RuleSpec::Less(v));
        }
        if let Some(v) = &self.le {
            rules.push(RuleSpec::LessOrEqual(v));
        }
        match self.not_null {
            Some(true) => rules.push(RuleSpec::NotNull),
            Some(false) => {
                return Err(ConfigSchemaError::ValidationError(
                    "not_null may only be set to true".into(),
                ));
            }
            None => {}
        }

        match rules.as_slice() {
            [rule] => Ok(*rule),
            [] => Err(ConfigSchemaError::ValidationError(
                "pattern table declares no rule".into(),
            )),
            _ => Err(ConfigSchemaError::ValidationError(format!(
                "pattern table declares {} rules, expected exactly one",
                rules.len()
            ))),
        }
    }
}

impl Validate for PatternRule {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.single().map(|_| ())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Holder {
        field: PatternSpec,
    }

    fn parse(src: &str) -> PatternSpec {
        toml::from_str::<Holder>(src).unwrap().field
    }

    #[test]
    fn scalars_parse_to_their_variants() {
        assert_eq!(parse("field = \"User\""), PatternSpec::text("User"));
        assert_eq!(parse("field = false"), PatternSpec::Scalar(Scalar::Bool(false)));
        assert_eq!(parse("field = 42"), PatternSpec::Scalar(Scalar::Integer(42)));
    }

    #[test]
    fn scalar_text_form() {
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Integer(-3).to_string(), "-3");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
    }

    #[test]
    fn rule_table_parses() {
        let spec = parse("field = { regex = \"Tomcat|Jetty\" }");
        assert_eq!(spec, PatternSpec::regex("Tomcat|Jetty"));

        let PatternSpec::Rule(rule) = parse("field = { gt = 10 }") else {
            panic!("expected rule");
        };
        assert_eq!(rule.single().unwrap(), RuleSpec::Greater(&Scalar::Integer(10)));
    }

    #[test]
    fn unknown_rule_is_rejected() {
        toml::from_str::<Holder>("field = { matches = \"x\" }")
            .expect_err("expected unknown rule key to fail");
    }

    #[test]
    fn rule_table_needs_exactly_one_rule() {
        let empty = PatternRule::default();
        empty.validate().expect_err("expected empty rule table to fail");

        let two = PatternRule {
            regex: Some("a".into()),
            ne: Some(Scalar::Text("b".into())),
            ..Default::default()
        };
        two.validate().expect_err("expected two rules to fail");
    }

    #[test]
    fn not_null_false_is_rejected() {
        let rule = PatternRule {
            not_null: Some(false),
            ..Default::default()
        };

        rule.validate().expect_err("expected not_null = false to fail");
    }
}
