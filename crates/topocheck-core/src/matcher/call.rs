use super::{ActualEntity, Expectation, MatchResult, match_entity};
use crate::{
    binding::BindingContext,
    diagnostics::{EntityKind, Field, VerifyError},
    model::{ActualCall, ExpectedCall},
    pattern::PatternValue,
};

impl ActualEntity for ActualCall {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Expectation for ExpectedCall {
    type Actual = ActualCall;

    const KIND: EntityKind = EntityKind::Call;

    fn id(&self) -> &PatternValue {
        &self.id
    }

    fn fields<'a>(
        &'a self,
        actual: &'a ActualCall,
    ) -> Vec<(Field, Option<&'a PatternValue>, Option<&'a str>)> {
        vec![
            (Field::Source, self.source.as_ref(), Some(actual.source.as_str())),
            (Field::Target, self.target.as_ref(), Some(actual.target.as_str())),
        ]
    }
}

///
/// CallMatcher
///

pub struct CallMatcher;

impl CallMatcher {
    /// Compare one expected call with one actual call: id, source, target.
    pub fn matches(
        expected: &ExpectedCall,
        actual: &ActualCall,
        ctx: &mut BindingContext,
    ) -> Result<MatchResult, VerifyError> {
        match_entity(expected, actual, ctx)
    }
}

///
/// TESTS
///
