//!
//! Variable bindings for one verification pass.
//!
//! The first occurrence of a variable binds it; every later occurrence must
//! agree. Pass-scoped variables live for the whole `verify` call, while
//! entity-scoped ones are cleared each time a new expected entity is paired.
//!

use crate::{
    ThisError, log,
    log::Topic,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

///
/// BindingConflict
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("variable '{variable}' is bound to '{bound}' but found '{found}'")]
pub struct BindingConflict {
    pub variable: String,
    pub bound: String,
    pub found: String,
}

///
/// Binding
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Binding {
    /// First occurrence; the value is now recorded.
    Bound,
    /// Already bound to the same value.
    Agreed,
}

///
/// VariableScopes
/// Names declared entity-scoped; everything else is pass-scoped.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VariableScopes {
    per_entity: BTreeSet<String>,
}

impl VariableScopes {
    #[must_use]
    pub fn per_entity<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            per_entity: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_per_entity(&self, name: &str) -> bool {
        self.per_entity.contains(name)
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.per_entity.iter().map(String::as_str)
    }
}

///
/// BindingContext
///

#[derive(Clone, Debug, Default)]
pub struct BindingContext {
    scopes: Arc<VariableScopes>,
    pass: BTreeMap<String, String>,
    entity: BTreeMap<String, String>,
}

impl BindingContext {
    #[must_use]
    pub fn new(scopes: Arc<VariableScopes>) -> Self {
        Self {
            scopes,
            pass: BTreeMap::new(),
            entity: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.scope(name).get(name).map(String::as_str)
    }

    /// Bind `name` if it is unbound, otherwise require agreement.
    pub fn bind_or_check(&mut self, name: &str, value: &str) -> Result<Binding, BindingConflict> {
        if let Some(bound) = self.get(name) {
            if bound == value {
                return Ok(Binding::Agreed);
            }

            return Err(BindingConflict {
                variable: name.to_string(),
                bound: bound.to_string(),
                found: value.to_string(),
            });
        }

        log!(Topic::Binding, Debug, "bound {name} = '{value}'");
        self.scope_mut(name)
            .insert(name.to_string(), value.to_string());

        Ok(Binding::Bound)
    }

    /// Start pairing a new entity: entity-scoped bindings are dropped.
    pub fn enter_entity(&mut self) {
        self.entity.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pass.len() + self.entity.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pass.is_empty() && self.entity.is_empty()
    }

    /// Pass-scoped bindings, consuming the context.
    #[must_use]
    pub fn into_pass_bindings(self) -> BTreeMap<String, String> {
        self.pass
    }

    fn scope(&self, name: &str) -> &BTreeMap<String, String> {
        if self.scopes.is_per_entity(name) {
            &self.entity
        } else {
            &self.pass
        }
    }

    fn scope_mut(&mut self, name: &str) -> &mut BTreeMap<String, String> {
        if self.scopes.is_per_entity(name) {
            &mut self.entity
        } else {
            &mut self.pass
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_binds_and_later_use_compares() {
        let mut ctx = BindingContext::default();

        assert_eq!(ctx.bind_or_check("project", "projectB"), Ok(Binding::Bound));
        assert_eq!(ctx.bind_or_check("project", "projectB"), Ok(Binding::Agreed));

        let err = ctx.bind_or_check("project", "projectA").unwrap_err();
        assert_eq!(err.variable, "project");
        assert_eq!(err.bound, "projectB");
        assert_eq!(err.found, "projectA");
        assert_eq!(ctx.get("project"), Some("projectB"));
    }

    #[test]
    fn entity_scoped_bindings_reset_per_entity() {
        let scopes = Arc::new(VariableScopes::per_entity(["pid"]));
        let mut ctx = BindingContext::new(scopes);

        ctx.bind_or_check("pid", "27960").unwrap();
        ctx.bind_or_check("project", "projectB").unwrap();
        ctx.bind_or_check("pid", "27961")
            .expect_err("same entity must agree on pid");

        ctx.enter_entity();
        assert_eq!(ctx.get("pid"), None);
        assert_eq!(ctx.get("project"), Some("projectB"));
        assert_eq!(ctx.bind_or_check("pid", "27961"), Ok(Binding::Bound));
    }

    #[test]
    fn only_pass_bindings_are_reported() {
        let scopes = Arc::new(VariableScopes::per_entity(["pid"]));
        let mut ctx = BindingContext::new(scopes);

        ctx.bind_or_check("pid", "1").unwrap();
        ctx.bind_or_check("host", "h").unwrap();
        assert_eq!(ctx.len(), 2);

        let pass = ctx.into_pass_bindings();
        assert_eq!(pass.len(), 1);
        assert_eq!(pass.get("host").map(String::as_str), Some("h"));
    }

    #[test]
    fn conflict_message_names_both_values() {
        let err = BindingConflict {
            variable: "project".into(),
            bound: "projectA".into(),
            found: "projectB".into(),
        };

        assert_eq!(
            err.to_string(),
            "variable 'project' is bound to 'projectA' but found 'projectB'"
        );
    }
}
