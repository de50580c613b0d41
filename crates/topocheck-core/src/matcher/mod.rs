//!
//! Pairing expected entities with actual ones and driving a verification pass.
//!
//! A pass walks the expected nodes in template order, then the expected calls.
//! Each expected entity is paired by id (direct lookup for literal ids, an
//! ordered scan for pattern ids) and its remaining fields are compared. The
//! first failure ends the pass.
//!

mod call;
mod index;
mod node;

pub use call::CallMatcher;
pub use node::NodeMatcher;

use crate::{
    Error,
    binding::{BindingContext, VariableScopes},
    config::{
        ConfigError, Template,
        schema::{TemplateModel, Validate},
    },
    diagnostics::{EntityKind, Field, VerifyError},
    log,
    log::Topic,
    model::{ActualTopology, ExpectedTopology},
    pattern::{PatternFault, PatternValue},
};
use index::ActualIndex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// MatchResult
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchResult {
    Matched,
    Mismatch {
        field: Field,
        expected: String,
        actual: Option<String>,
    },
}

impl MatchResult {
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched)
    }
}

///
/// ActualEntity
///

pub(crate) trait ActualEntity {
    fn id(&self) -> &str;
}

///
/// Expectation
/// An expected entity: its correspondence key plus the fields checked after
/// pairing, in comparison order.
///

pub(crate) trait Expectation {
    type Actual: ActualEntity;

    const KIND: EntityKind;

    fn id(&self) -> &PatternValue;

    fn fields<'a>(
        &'a self,
        actual: &'a Self::Actual,
    ) -> Vec<(Field, Option<&'a PatternValue>, Option<&'a str>)>;
}

/// Compare one expected entity with one actual entity: id first, then the
/// remaining fields, stopping at the first mismatch.
///
/// Bindings made along the way stay in `ctx`, including those from fields
/// that matched before a later field failed.
pub(crate) fn match_entity<E: Expectation>(
    expected: &E,
    actual: &E::Actual,
    ctx: &mut BindingContext,
) -> Result<MatchResult, VerifyError> {
    let id = actual.id();
    let id_matched = expected
        .id()
        .matches(Some(id), ctx)
        .map_err(|fault| fault_to_error(E::KIND, id.to_string(), Field::Id, fault))?;

    if !id_matched {
        return Ok(MatchResult::Mismatch {
            field: Field::Id,
            expected: expected.id().to_string(),
            actual: Some(id.to_string()),
        });
    }

    match_fields(expected, actual, ctx)
}

fn match_fields<E: Expectation>(
    expected: &E,
    actual: &E::Actual,
    ctx: &mut BindingContext,
) -> Result<MatchResult, VerifyError> {
    for (field, pattern, value) in expected.fields(actual) {
        let Some(pattern) = pattern else {
            continue;
        };

        let matched = pattern
            .matches(value, ctx)
            .map_err(|fault| fault_to_error(E::KIND, actual.id().to_string(), field, fault))?;

        if !matched {
            return Ok(MatchResult::Mismatch {
                field,
                expected: pattern.to_string(),
                actual: value.map(ToString::to_string),
            });
        }
    }

    Ok(MatchResult::Matched)
}

pub(crate) fn fault_to_error(
    kind: EntityKind,
    id: String,
    field: Field,
    fault: PatternFault,
) -> VerifyError {
    match fault {
        PatternFault::Conflict(conflict) => VerifyError::BindingConflict {
            kind,
            id,
            field,
            variable: conflict.variable,
            bound: conflict.bound,
            found: conflict.found,
        },
        PatternFault::Unresolved { variable } => VerifyError::UnresolvedVariable {
            kind,
            id,
            field,
            variable,
        },
    }
}

///
/// Verified
/// Outcome of a successful pass.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Verified {
    pub nodes: usize,
    pub calls: usize,
    pub bindings: BTreeMap<String, String>,
}

impl Verified {
    /// Value a pass-scoped variable was bound to.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
}

///
/// TopoMatcher
///
/// Built once from an expected topology and reused across test cases; every
/// `verify` call starts from empty bindings.
///

#[derive(Clone, Debug)]
pub struct TopoMatcher {
    expected: ExpectedTopology,
    scopes: Arc<VariableScopes>,
}

impl TopoMatcher {
    #[must_use]
    pub fn new(expected: ExpectedTopology, scopes: VariableScopes) -> Self {
        Self {
            expected,
            scopes: Arc::new(scopes),
        }
    }

    /// Build a matcher from template TOML.
    pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
        let model = Template::from_toml(src)?;

        Self::from_model(&model)
    }

    /// Build a matcher from a template model.
    ///
    /// A template that declares `[log]` reconfigures the calling thread's log;
    /// one that does not leaves the current settings alone.
    pub fn from_model(model: &TemplateModel) -> Result<Self, ConfigError> {
        model.validate()?;
        if let Some(config) = &model.log {
            log::configure(config);
        }

        let expected = ExpectedTopology::compile(model)?;
        let scopes = VariableScopes::per_entity(model.variables.per_entity.iter().cloned());

        let referenced = expected.variables();
        for name in scopes.entity_names() {
            if !referenced.contains(name) {
                log!(
                    Topic::Config,
                    Warn,
                    "per-entity variable '{name}' is never referenced"
                );
            }
        }

        log!(
            Topic::Config,
            Info,
            "template loaded: {} nodes, {} calls, {} variables",
            expected.nodes().len(),
            expected.calls().len(),
            referenced.len()
        );

        Ok(Self::new(expected, scopes))
    }

    #[must_use]
    pub const fn expected(&self) -> &ExpectedTopology {
        &self.expected
    }

    /// Verify an actual topology against the template.
    pub fn verify(&self, actual: &ActualTopology) -> Result<Verified, VerifyError> {
        log!(
            Topic::Verify,
            Info,
            "verifying {} nodes, {} calls",
            actual.nodes.len(),
            actual.calls.len()
        );

        let mut ctx = BindingContext::new(Arc::clone(&self.scopes));
        let result = self.run(actual, &mut ctx);

        match &result {
            Ok(_) => log!(Topic::Verify, Ok, "topology matches"),
            Err(err) => log!(Topic::Verify, Warn, "{} failure: {err}", err.kind()),
        }

        result.map(|(nodes, calls)| Verified {
            nodes,
            calls,
            bindings: ctx.into_pass_bindings(),
        })
    }

    /// Load a JSON snapshot and verify it.
    pub fn verify_json(&self, src: &str) -> Result<Verified, Error> {
        let actual = ActualTopology::from_json(src)?;

        Ok(self.verify(&actual)?)
    }

    fn run(
        &self,
        actual: &ActualTopology,
        ctx: &mut BindingContext,
    ) -> Result<(usize, usize), VerifyError> {
        let nodes = pair_all(self.expected.nodes(), &actual.nodes, ctx)?;
        let calls = pair_all(self.expected.calls(), &actual.calls, ctx)?;

        let node_ids: BTreeSet<&str> = actual.nodes.iter().map(|n| n.id.as_str()).collect();
        for call in &calls {
            for (field, node) in [(Field::Source, &call.source), (Field::Target, &call.target)] {
                if !node_ids.contains(node.as_str()) {
                    return Err(VerifyError::DanglingEndpoint {
                        call: call.id.clone(),
                        field,
                        node: node.clone(),
                    });
                }
            }
        }

        Ok((nodes.len(), calls.len()))
    }
}

/// Pair every expected entity with an actual one, in template order.
fn pair_all<'a, E: Expectation>(
    expected: &[E],
    actual: &'a [E::Actual],
    ctx: &mut BindingContext,
) -> Result<Vec<&'a E::Actual>, VerifyError> {
    let mut index = ActualIndex::build(E::KIND, actual)?;
    let mut paired = Vec::with_capacity(expected.len());

    for exp in expected {
        ctx.enter_entity();

        let check = |found: &E::Actual, ctx: &mut BindingContext| check_pair(exp, found, ctx);
        let found = match exp.id().as_literal() {
            Some(id) => match index.take_exact(id) {
                Some(found) => check(found, ctx).map(|()| Some(found))?,
                None => None,
            },
            None => index.take_matching(exp.id(), ctx, check)?,
        };

        let Some(found) = found else {
            return Err(VerifyError::MissingEntity {
                kind: E::KIND,
                id: exp.id().to_string(),
            });
        };

        log!(
            Topic::Match,
            Debug,
            "{} {} paired with '{}'",
            E::KIND,
            exp.id(),
            found.id()
        );
        paired.push(found);
    }

    if let Some(id) = index.leftover() {
        return Err(VerifyError::UnexpectedEntity {
            kind: E::KIND,
            id: id.to_string(),
        });
    }

    Ok(paired)
}

// a mismatch on an id-paired entity becomes the pass failure
fn check_pair<E: Expectation>(
    expected: &E,
    actual: &E::Actual,
    ctx: &mut BindingContext,
) -> Result<(), VerifyError> {
    match match_entity(expected, actual, ctx)? {
        MatchResult::Matched => Ok(()),
        MatchResult::Mismatch {
            field,
            expected,
            actual: value,
        } => Err(VerifyError::FieldMismatch {
            kind: E::KIND,
            id: actual.id().to_string(),
            field,
            expected,
            actual: value,
        }),
    }
}

///
/// TESTS
///
