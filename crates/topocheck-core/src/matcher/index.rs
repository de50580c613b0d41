use super::{ActualEntity, fault_to_error};
use crate::{
    binding::BindingContext,
    diagnostics::{EntityKind, Field, VerifyError},
    pattern::{PatternFault, PatternValue},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// ActualIndex
///
/// Actual entities keyed by id. Iteration is in id order, which keeps
/// pattern-id pairing independent of how the caller ordered its collections.
///

pub(crate) struct ActualIndex<'a, A> {
    kind: EntityKind,
    entries: BTreeMap<&'a str, &'a A>,
    consumed: BTreeSet<&'a str>,
}

impl<'a, A: ActualEntity> ActualIndex<'a, A> {
    pub fn build(kind: EntityKind, items: &'a [A]) -> Result<Self, VerifyError> {
        let mut entries = BTreeMap::new();

        for item in items {
            if entries.insert(item.id(), item).is_some() {
                return Err(VerifyError::DuplicateActualId {
                    kind,
                    id: item.id().to_string(),
                });
            }
        }

        Ok(Self {
            kind,
            entries,
            consumed: BTreeSet::new(),
        })
    }

    /// Pair a literal expected id.
    pub fn take_exact(&mut self, id: &str) -> Option<&'a A> {
        let (&key, &entity) = self.entries.get_key_value(id)?;

        self.consumed.insert(key).then_some(entity)
    }

    /// Pair a pattern id with the first unconsumed entity, in id order, whose
    /// id matches and which passes `check`.
    ///
    /// Each candidate is tried against a scratch copy of `ctx`; only the
    /// winner's bindings are kept. A candidate whose id conflicts with an
    /// existing binding is passed over, but if nothing pairs, that conflict
    /// is the failure. A field mismatch moves on to the next candidate; any
    /// other failure from `check` ends the scan.
    pub fn take_matching<F>(
        &mut self,
        pattern: &PatternValue,
        ctx: &mut BindingContext,
        mut check: F,
    ) -> Result<Option<&'a A>, VerifyError>
    where
        F: FnMut(&'a A, &mut BindingContext) -> Result<(), VerifyError>,
    {
        let mut id_conflict = None;
        let mut first_mismatch = None;

        for (&id, &entity) in &self.entries {
            if self.consumed.contains(id) {
                continue;
            }

            let mut trial = ctx.clone();
            match pattern.matches(Some(id), &mut trial) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(fault @ PatternFault::Conflict(_)) => {
                    id_conflict.get_or_insert_with(|| {
                        fault_to_error(self.kind, id.to_string(), Field::Id, fault)
                    });
                    continue;
                }
                Err(fault @ PatternFault::Unresolved { .. }) => {
                    return Err(fault_to_error(self.kind, pattern.to_string(), Field::Id, fault));
                }
            }

            match check(entity, &mut trial) {
                Ok(()) => {
                    *ctx = trial;
                    self.consumed.insert(id);
                    return Ok(Some(entity));
                }
                Err(err @ VerifyError::FieldMismatch { .. }) => {
                    first_mismatch.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        match id_conflict.or(first_mismatch) {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }

    /// Lowest unconsumed id, if any.
    pub fn leftover(&self) -> Option<&'a str> {
        self.entries
            .keys()
            .find(|id| !self.consumed.contains(*id))
            .copied()
    }
}

///
/// TESTS
///
