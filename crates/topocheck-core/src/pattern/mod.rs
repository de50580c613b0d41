//!
//! Expected field values and how a candidate string is tested against them.
//!
//! Patterns are classified once, when the template is compiled; matching
//! never fails on syntax. The only hard faults at match time are binding
//! conflicts and comparisons against variables nobody has bound yet.
//!

pub mod template;

use crate::{
    ThisError,
    binding::{BindingConflict, BindingContext},
    config::schema::{PatternSpec, RuleSpec, Scalar},
};
use derive_more::Display;
use regex::Regex;
use std::fmt::{self, Display as FmtDisplay};
use template::TemplateString;

/// Variable names are ASCII alphanumerics plus `_`, `.` and `-`.
#[must_use]
pub fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

///
/// PatternError
/// Raised while compiling a template field.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PatternError {
    #[error("adjacent variables need a fixed separator in '{text}'")]
    AdjacentVariables { text: String },

    #[error("empty variable reference in '{text}'")]
    EmptyVariableName { text: String },

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("invalid variable name '{name}' in '{text}'")]
    InvalidVariableName { text: String, name: String },

    #[error("comparison operand '{operand}' is not a number")]
    NotNumeric { operand: String },

    #[error("unterminated variable reference in '{text}'")]
    UnterminatedVariable { text: String },

    #[error(transparent)]
    Rule(#[from] RuleError),
}

///
/// RuleError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{0}")]
pub struct RuleError(pub String);

///
/// PatternFault
/// Hard failure while matching, as opposed to an ordinary non-match.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PatternFault {
    #[error(transparent)]
    Conflict(#[from] BindingConflict),

    #[error("variable '{variable}' has no bound value")]
    Unresolved { variable: String },
}

///
/// Comparison
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Comparison {
    #[display("ne")]
    NotEqual,
    #[display("gt")]
    Greater,
    #[display("ge")]
    GreaterOrEqual,
    #[display("lt")]
    Less,
    #[display("le")]
    LessOrEqual,
}

impl Comparison {
    const fn is_numeric(self) -> bool {
        !matches!(self, Self::NotEqual)
    }

    fn holds(self, actual: &str, operand: &str) -> bool {
        let numbers = || {
            let a = actual.trim().parse::<f64>().ok()?;
            let b = operand.trim().parse::<f64>().ok()?;
            Some((a, b))
        };

        match self {
            Self::NotEqual => actual != operand,
            Self::Greater => numbers().is_some_and(|(a, b)| a > b),
            Self::GreaterOrEqual => numbers().is_some_and(|(a, b)| a >= b),
            Self::Less => numbers().is_some_and(|(a, b)| a < b),
            Self::LessOrEqual => numbers().is_some_and(|(a, b)| a <= b),
        }
    }
}

///
/// RegexPattern
/// Compiled with implicit anchors so only full-string matches count.
///

#[derive(Clone, Debug)]
pub struct RegexPattern {
    source: String,
    compiled: Regex,
}

impl RegexPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        let compiled =
            Regex::new(&format!("^(?:{source})$")).map_err(|e| PatternError::InvalidRegex {
                pattern: source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, candidate: &str) -> bool {
        self.compiled.is_match(candidate)
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RegexPattern {}

///
/// PatternValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PatternValue {
    Literal(String),
    Regex(RegexPattern),
    Variable(String),
    Template(TemplateString),
    NotNull,
    Compare(Comparison, TemplateString),
}

impl PatternValue {
    /// Classify a plain string field: literal, `${var}` or composite template.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let template = TemplateString::parse(text)?;

        if let Some(literal) = template.literal() {
            return Ok(Self::Literal(literal));
        }
        if let Some(name) = template.single_variable() {
            return Ok(Self::Variable(name.to_string()));
        }

        Ok(Self::Template(template))
    }

    pub fn regex(source: &str) -> Result<Self, PatternError> {
        RegexPattern::new(source).map(Self::Regex)
    }

    pub fn compare(op: Comparison, operand: &str) -> Result<Self, PatternError> {
        let operand = TemplateString::parse(operand)?;

        if op.is_numeric()
            && let Some(text) = operand.literal()
            && text.trim().parse::<f64>().is_err()
        {
            return Err(PatternError::NotNumeric { operand: text });
        }

        Ok(Self::Compare(op, operand))
    }

    /// Compile a raw template field.
    pub fn compile(spec: &PatternSpec) -> Result<Self, PatternError> {
        match spec {
            PatternSpec::Scalar(Scalar::Text(text)) => Self::parse(text),
            PatternSpec::Scalar(other) => Ok(Self::Literal(other.to_string())),
            PatternSpec::Rule(rule) => {
                let rule = rule.single().map_err(|e| RuleError(e.to_string()))?;

                match rule {
                    RuleSpec::Regex(src) => Self::regex(src),
                    RuleSpec::NotEqual(v) => Self::compare(Comparison::NotEqual, &v.to_string()),
                    RuleSpec::Greater(v) => Self::compare(Comparison::Greater, &v.to_string()),
                    RuleSpec::GreaterOrEqual(v) => {
                        Self::compare(Comparison::GreaterOrEqual, &v.to_string())
                    }
                    RuleSpec::Less(v) => Self::compare(Comparison::Less, &v.to_string()),
                    RuleSpec::LessOrEqual(v) => {
                        Self::compare(Comparison::LessOrEqual, &v.to_string())
                    }
                    RuleSpec::NotNull => Ok(Self::NotNull),
                }
            }
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Names of the variables this pattern reads or binds.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Self::Variable(name) => vec![name.as_str()],
            Self::Template(t) | Self::Compare(_, t) => t.variables().collect(),
            Self::Literal(_) | Self::Regex(_) | Self::NotNull => Vec::new(),
        }
    }

    /// Test `candidate` (absent when the actual field is missing).
    ///
    /// Binds unbound variables as a side effect of a successful match.
    pub fn matches(
        &self,
        candidate: Option<&str>,
        ctx: &mut BindingContext,
    ) -> Result<bool, PatternFault> {
        match (self, candidate) {
            (Self::NotNull, c) => Ok(c.is_some_and(|c| !c.is_empty())),
            (_, None) => Ok(false),
            (Self::Literal(expected), Some(c)) => Ok(expected == c),
            (Self::Regex(re), Some(c)) => Ok(re.is_match(c)),
            (Self::Variable(name), Some(c)) => {
                ctx.bind_or_check(name, c)?;
                Ok(true)
            }
            (Self::Template(t), Some(c)) => t.unify(c, ctx),
            (Self::Compare(op, operand), Some(c)) => {
                let operand = operand.render(ctx)?;
                Ok(op.holds(c, &operand))
            }
        }
    }
}

impl FmtDisplay for PatternValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "'{s}'"),
            Self::Regex(re) => write!(f, "regex '{}'", re.as_str()),
            Self::Variable(name) => write!(f, "${{{name}}}"),
            Self::Template(t) => write!(f, "template '{t}'"),
            Self::NotNull => f.write_str("not null"),
            Self::Compare(op, operand) => write!(f, "{op} '{operand}'"),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BindingContext {
        BindingContext::default()
    }

    #[test]
    fn strings_are_classified() {
        assert_eq!(PatternValue::parse("User").unwrap(), PatternValue::Literal("User".into()));
        assert_eq!(PatternValue::parse("${pid}").unwrap(), PatternValue::Variable("pid".into()));
        assert!(matches!(
            PatternValue::parse("${project}-pid").unwrap(),
            PatternValue::Template(_)
        ));
    }

    #[test]
    fn scalars_compile_to_literal_text() {
        let flag = PatternValue::compile(&PatternSpec::Scalar(Scalar::Bool(false))).unwrap();
        assert_eq!(flag, PatternValue::Literal("false".into()));

        let version = PatternValue::compile(&PatternSpec::Scalar(Scalar::Float(1.0))).unwrap();
        assert!(version.matches(Some("1.0"), &mut ctx()).unwrap());
        assert!(!version.matches(Some("1"), &mut ctx()).unwrap());
    }

    #[test]
    fn literal_requires_equality() {
        let p = PatternValue::parse("Tomcat").unwrap();

        assert!(p.matches(Some("Tomcat"), &mut ctx()).unwrap());
        assert!(!p.matches(Some("Tomcat2"), &mut ctx()).unwrap());
        assert!(!p.matches(None, &mut ctx()).unwrap());
    }

    #[test]
    fn regex_requires_full_match() {
        let p = PatternValue::regex("Tomcat").unwrap();
        assert!(p.matches(Some("Tomcat"), &mut ctx()).unwrap());
        assert!(!p.matches(Some("Tomcat2"), &mut ctx()).unwrap());
        assert!(!p.matches(Some("MyTomcat"), &mut ctx()).unwrap());

        let alt = PatternValue::regex("Tomcat|Jetty").unwrap();
        assert!(alt.matches(Some("Jetty"), &mut ctx()).unwrap());
        assert!(!alt.matches(Some("TomcatJetty"), &mut ctx()).unwrap());
    }

    #[test]
    fn invalid_regex_is_rejected_at_compile_time() {
        let err = PatternValue::regex("(unclosed").unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
    }

    #[test]
    fn variable_binds_then_compares() {
        let p = PatternValue::parse("${pid}").unwrap();
        let mut ctx = ctx();

        assert!(p.matches(Some("27960"), &mut ctx).unwrap());
        assert!(p.matches(Some("27960"), &mut ctx).unwrap());

        let err = p.matches(Some("27961"), &mut ctx).unwrap_err();
        assert!(matches!(err, PatternFault::Conflict(c) if c.bound == "27960" && c.found == "27961"));
    }

    #[test]
    fn absent_value_never_binds() {
        let p = PatternValue::parse("${pid}").unwrap();
        let mut ctx = ctx();

        assert!(!p.matches(None, &mut ctx).unwrap());
        assert!(ctx.is_empty());
    }

    #[test]
    fn not_null_accepts_any_present_value() {
        let p = PatternValue::NotNull;

        assert!(p.matches(Some("x"), &mut ctx()).unwrap());
        assert!(!p.matches(Some(""), &mut ctx()).unwrap());
        assert!(!p.matches(None, &mut ctx()).unwrap());
    }

    #[test]
    fn numeric_comparisons() {
        let gt = PatternValue::compare(Comparison::Greater, "10").unwrap();
        assert!(gt.matches(Some("11"), &mut ctx()).unwrap());
        assert!(!gt.matches(Some("10"), &mut ctx()).unwrap());
        assert!(!gt.matches(Some("ten"), &mut ctx()).unwrap());

        let le = PatternValue::compare(Comparison::LessOrEqual, "2.5").unwrap();
        assert!(le.matches(Some("2.5"), &mut ctx()).unwrap());
        assert!(!le.matches(Some("3"), &mut ctx()).unwrap());
    }

    #[test]
    fn numeric_operand_is_checked_at_compile_time() {
        let err = PatternValue::compare(Comparison::GreaterOrEqual, "many").unwrap_err();
        assert!(matches!(err, PatternError::NotNumeric { .. }));

        PatternValue::compare(Comparison::GreaterOrEqual, "${floor}")
            .expect("variable operands are checked at match time");
    }

    #[test]
    fn not_equal_resolves_variable_operands() {
        let ne = PatternValue::compare(Comparison::NotEqual, "${project}").unwrap();
        let mut ctx = ctx();

        let err = ne.matches(Some("projectA"), &mut ctx).unwrap_err();
        assert_eq!(
            err,
            PatternFault::Unresolved {
                variable: "project".into()
            }
        );

        ctx.bind_or_check("project", "projectA").unwrap();
        assert!(!ne.matches(Some("projectA"), &mut ctx).unwrap());
        assert!(ne.matches(Some("projectB"), &mut ctx).unwrap());
    }

    #[test]
    fn rule_tables_compile() {
        let spec = PatternSpec::regex("Tomcat.*");
        assert!(matches!(PatternValue::compile(&spec).unwrap(), PatternValue::Regex(_)));

        let bad = PatternSpec::Rule(crate::config::schema::PatternRule::default());
        assert!(matches!(PatternValue::compile(&bad), Err(PatternError::Rule(_))));
    }

    #[test]
    fn display_describes_the_expectation() {
        assert_eq!(PatternValue::parse("User").unwrap().to_string(), "'User'");
        assert_eq!(PatternValue::parse("${pid}").unwrap().to_string(), "${pid}");
        assert_eq!(PatternValue::regex("a|b").unwrap().to_string(), "regex 'a|b'");
        assert_eq!(
            PatternValue::compare(Comparison::Greater, "3").unwrap().to_string(),
            "gt '3'"
        );
    }

    #[test]
    fn variable_names() {
        assert!(is_variable_name("SERVICE_NAME"));
        assert!(is_variable_name("svc.host-1"));
        assert!(!is_variable_name(""));
        assert!(!is_variable_name("a b"));
        assert!(!is_variable_name("a}"));
    }
}
