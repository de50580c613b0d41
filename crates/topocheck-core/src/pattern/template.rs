//!
//! Composite `${var}` templates.
//!
//! A template is split at parse time into alternating fixed and variable
//! segments. Matching walks the candidate left to right; every variable takes
//! the shortest substring that still lets the rest of the template match.
//!

use super::{PatternError, PatternFault, is_variable_name};
use crate::binding::{BindingConflict, BindingContext};
use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

///
/// Segment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Fixed(String),
    Variable(String),
}

///
/// TemplateString
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateString {
    text: String,
    segments: Vec<Segment>,
}

impl TemplateString {
    /// Parse `text`, where `${name}` is a variable and `$$` a literal `$`.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut fixed = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != '$' {
                fixed.push(c);
                continue;
            }

            match chars.peek().map(|&(_, next)| next) {
                Some('$') => {
                    chars.next();
                    fixed.push('$');
                }
                Some('{') => {
                    let start = i + 2;
                    let end = text[start..]
                        .find('}')
                        .map(|offset| start + offset)
                        .ok_or_else(|| PatternError::UnterminatedVariable {
                            text: text.to_string(),
                        })?;

                    let name = &text[start..end];
                    if name.is_empty() {
                        return Err(PatternError::EmptyVariableName {
                            text: text.to_string(),
                        });
                    }
                    if !is_variable_name(name) {
                        return Err(PatternError::InvalidVariableName {
                            text: text.to_string(),
                            name: name.to_string(),
                        });
                    }

                    if !fixed.is_empty() {
                        segments.push(Segment::Fixed(std::mem::take(&mut fixed)));
                    } else if matches!(segments.last(), Some(Segment::Variable(_))) {
                        return Err(PatternError::AdjacentVariables {
                            text: text.to_string(),
                        });
                    }
                    segments.push(Segment::Variable(name.to_string()));

                    while chars.next_if(|&(j, _)| j <= end).is_some() {}
                }
                _ => fixed.push('$'),
            }
        }

        if !fixed.is_empty() {
            segments.push(Segment::Fixed(fixed));
        }

        Ok(Self {
            text: text.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in order of appearance (repeats included).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Fixed(_) => None,
        })
    }

    /// The unescaped text, when the template has no variables.
    #[must_use]
    pub fn literal(&self) -> Option<String> {
        self.segments
            .iter()
            .map(|seg| match seg {
                Segment::Fixed(text) => Some(text.as_str()),
                Segment::Variable(_) => None,
            })
            .collect::<Option<String>>()
    }

    /// The variable name, when the template is exactly one `${name}`.
    #[must_use]
    pub fn single_variable(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [Segment::Variable(name)] => Some(name),
            _ => None,
        }
    }

    /// Substitute bound values; every variable must already be bound.
    pub fn render(&self, ctx: &BindingContext) -> Result<String, PatternFault> {
        let mut out = String::new();

        for seg in &self.segments {
            match seg {
                Segment::Fixed(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = ctx.get(name).ok_or_else(|| PatternFault::Unresolved {
                        variable: name.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }

        Ok(out)
    }

    /// Match `candidate`, binding unbound variables on success.
    ///
    /// Returns `Ok(false)` when the candidate has no decomposition at all,
    /// and a conflict when it only decomposes against existing bindings.
    pub fn unify(&self, candidate: &str, ctx: &mut BindingContext) -> Result<bool, PatternFault> {
        if let Some(captures) = self.capture(candidate, Some(&*ctx)) {
            for (name, value) in captures {
                ctx.bind_or_check(name, value)?;
            }

            return Ok(true);
        }

        let Some(captures) = self.capture(candidate, None) else {
            return Ok(false);
        };

        let mut seen: Vec<(&str, &str)> = Vec::new();
        for (name, value) in captures {
            let bound = seen
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .or_else(|| ctx.get(name));

            if let Some(bound) = bound
                && bound != value
            {
                return Err(BindingConflict {
                    variable: name.to_string(),
                    bound: bound.to_string(),
                    found: value.to_string(),
                }
                .into());
            }
            seen.push((name, value));
        }

        Ok(false)
    }

    // -------------------------------------------------------------
    // Decomposition
    // -------------------------------------------------------------

    // With `ctx`, only decompositions agreeing with existing bindings count.
    fn capture<'s, 'c>(
        &'s self,
        candidate: &'c str,
        ctx: Option<&BindingContext>,
    ) -> Option<Vec<(&'s str, &'c str)>> {
        let mut walk = Walk {
            candidate,
            ctx,
            captures: Vec::new(),
            dead: BTreeSet::new(),
            // a repeated name makes the outcome depend on earlier captures
            memo: ctx.is_none() || !self.repeats_variable(),
        };

        self.walk(0, 0, &mut walk).then_some(walk.captures)
    }

    fn walk<'s, 'c>(&'s self, seg: usize, pos: usize, w: &mut Walk<'s, 'c, '_>) -> bool {
        if w.memo && w.dead.contains(&(seg, pos)) {
            return false;
        }

        let found = self.step(seg, pos, w);
        if !found && w.memo {
            w.dead.insert((seg, pos));
        }

        found
    }

    fn step<'s, 'c>(&'s self, seg: usize, pos: usize, w: &mut Walk<'s, 'c, '_>) -> bool {
        let candidate = w.candidate;
        let rest = &candidate[pos..];

        match self.segments.get(seg) {
            None => rest.is_empty(),
            Some(Segment::Fixed(text)) => {
                rest.starts_with(text.as_str()) && self.walk(seg + 1, pos + text.len(), w)
            }
            Some(Segment::Variable(name)) => {
                for end in self.capture_ends(seg, pos, candidate) {
                    let value = &candidate[pos..end];

                    if let Some(ctx) = w.ctx {
                        let known = w
                            .captures
                            .iter()
                            .find(|(n, _)| *n == name.as_str())
                            .map(|(_, v)| *v)
                            .or_else(|| ctx.get(name));

                        if known.is_some_and(|k| k != value) {
                            continue;
                        }
                    }

                    w.captures.push((name.as_str(), value));
                    if self.walk(seg + 1, end, w) {
                        return true;
                    }
                    w.captures.pop();
                }

                false
            }
        }
    }

    fn repeats_variable(&self) -> bool {
        let mut seen = BTreeSet::new();

        !self.variables().all(|name| seen.insert(name))
    }

    // Candidate end offsets for the variable at `seg`, shortest first.
    fn capture_ends(&self, seg: usize, pos: usize, candidate: &str) -> Vec<usize> {
        let Some(Segment::Fixed(next)) = self.segments.get(seg + 1) else {
            return vec![candidate.len()];
        };

        let mut ends = Vec::new();
        let mut from = pos;
        while let Some(offset) = candidate[from..].find(next.as_str()) {
            let at = from + offset;
            ends.push(at);
            from = at + candidate[at..].chars().next().map_or(1, char::len_utf8);
        }

        ends
    }
}

///
/// Walk
/// Search state for one decomposition attempt.
///

struct Walk<'s, 'c, 'x> {
    candidate: &'c str,
    ctx: Option<&'x BindingContext>,
    captures: Vec<(&'s str, &'c str)>,
    // (segment, offset) states known not to complete
    dead: BTreeSet<(usize, usize)>,
    memo: bool,
}

impl Display for TemplateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

///
/// TESTS
///
