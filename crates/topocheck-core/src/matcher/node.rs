use super::{ActualEntity, Expectation, MatchResult, match_entity};
use crate::{
    binding::BindingContext,
    diagnostics::{EntityKind, Field, VerifyError},
    model::{ActualNode, ExpectedNode},
    pattern::PatternValue,
};

impl ActualEntity for ActualNode {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Expectation for ExpectedNode {
    type Actual = ActualNode;

    const KIND: EntityKind = EntityKind::Node;

    fn id(&self) -> &PatternValue {
        &self.id
    }

    fn fields<'a>(
        &'a self,
        actual: &'a ActualNode,
    ) -> Vec<(Field, Option<&'a PatternValue>, Option<&'a str>)> {
        vec![
            (Field::Name, self.name.as_ref(), actual.name.as_deref()),
            (Field::Type, self.node_type.as_ref(), actual.node_type.as_deref()),
            (Field::IsReal, self.is_real.as_ref(), actual.is_real.as_deref()),
        ]
    }
}

///
/// NodeMatcher
///

pub struct NodeMatcher;

impl NodeMatcher {
    /// Compare one expected node with one actual node: id, name, type, isReal.
    pub fn matches(
        expected: &ExpectedNode,
        actual: &ActualNode,
        ctx: &mut BindingContext,
    ) -> Result<MatchResult, VerifyError> {
        match_entity(expected, actual, ctx)
    }
}

///
/// TESTS
///
