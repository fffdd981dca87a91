#![forbid(unsafe_code)]

//! Sequence validation against a reference sequence.
//!
//! [`SequenceValidator`] wraps an injectable [`SequenceRule`]. The rule may
//! be a native comparison ([`ExactMatch`], the default), a closure, or an
//! interpreted [`RuleProgram`] built from a textual rule description.
//!
//! # Contract
//!
//! The default outcome is exact positional equality: `true` iff both
//! sequences have the same length and agree at every index. No partial
//! credit, no subsequence matching.
//!
//! # Failure Modes
//!
//! A fallible rule that returns [`RuleError`], or that panics, is reported as
//! a failed match (`false`) and logged at `warn`. Neither propagates, so the
//! widget can always present a result.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::RuleError;
use crate::node_field::NodeIndex;
use crate::sequence::Sequence;

/// A strategy deciding whether `candidate` satisfies `reference`.
pub trait SequenceRule: Send + Sync {
    /// Evaluate the rule.
    fn evaluate(&self, candidate: &[NodeIndex], reference: &[NodeIndex])
    -> Result<bool, RuleError>;

    /// Short name for diagnostics.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Native positional equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactMatch;

impl SequenceRule for ExactMatch {
    fn evaluate(
        &self,
        candidate: &[NodeIndex],
        reference: &[NodeIndex],
    ) -> Result<bool, RuleError> {
        Ok(candidate == reference)
    }

    fn name(&self) -> &str {
        "exact"
    }
}

/// Adapts a closure into a [`SequenceRule`].
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F> FnRule<F>
where
    F: Fn(&[NodeIndex], &[NodeIndex]) -> Result<bool, RuleError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> SequenceRule for FnRule<F>
where
    F: Fn(&[NodeIndex], &[NodeIndex]) -> Result<bool, RuleError> + Send + Sync,
{
    fn evaluate(
        &self,
        candidate: &[NodeIndex],
        reference: &[NodeIndex],
    ) -> Result<bool, RuleError> {
        (self.f)(candidate, reference)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Interpreted rules
// ---------------------------------------------------------------------------

/// One check of a [`RuleProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCheck {
    /// `len(candidate) == len(reference)`.
    LengthEq,
    /// `candidate[i] == reference[i]` for every `i` in the shorter of the two.
    EachEq,
}

impl RuleCheck {
    fn parse(directive: &str) -> Result<Self, RuleError> {
        match directive {
            "length_eq" => Ok(Self::LengthEq),
            "each_eq" => Ok(Self::EachEq),
            other => Err(RuleError::Parse {
                directive: other.to_string(),
            }),
        }
    }

    fn holds(self, candidate: &[NodeIndex], reference: &[NodeIndex]) -> bool {
        match self {
            Self::LengthEq => candidate.len() == reference.len(),
            Self::EachEq => candidate.iter().zip(reference).all(|(c, r)| c == r),
        }
    }
}

/// A rule described as data: every listed check must hold.
///
/// Descriptions list checks separated by `;`, e.g. `"length_eq; each_eq"`,
/// which is exactly positional equality. Blank entries are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleProgram {
    checks: Vec<RuleCheck>,
}

impl RuleProgram {
    /// Description of the default positional-equality rule.
    pub const EXACT: &'static str = "length_eq; each_eq";

    /// Parse a rule description.
    pub fn parse(description: &str) -> Result<Self, RuleError> {
        let checks = description
            .split(';')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(RuleCheck::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { checks })
    }

    /// The positional-equality program.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            checks: vec![RuleCheck::LengthEq, RuleCheck::EachEq],
        }
    }

    #[must_use]
    pub fn checks(&self) -> &[RuleCheck] {
        &self.checks
    }
}

impl SequenceRule for RuleProgram {
    fn evaluate(
        &self,
        candidate: &[NodeIndex],
        reference: &[NodeIndex],
    ) -> Result<bool, RuleError> {
        if self.checks.is_empty() {
            return Err(RuleError::Evaluation {
                reason: "rule program has no checks".to_string(),
            });
        }
        Ok(self
            .checks
            .iter()
            .all(|check| check.holds(candidate, reference)))
    }

    fn name(&self) -> &str {
        "program"
    }
}

// ---------------------------------------------------------------------------
// SequenceValidator
// ---------------------------------------------------------------------------

/// Compares completed sequences using an injected rule.
pub struct SequenceValidator {
    rule: Box<dyn SequenceRule>,
}

impl std::fmt::Debug for SequenceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceValidator")
            .field("rule", &self.rule.name())
            .finish()
    }
}

impl Default for SequenceValidator {
    fn default() -> Self {
        Self::new(ExactMatch)
    }
}

impl SequenceValidator {
    pub fn new(rule: impl SequenceRule + 'static) -> Self {
        Self {
            rule: Box::new(rule),
        }
    }

    /// Evaluate `candidate` against `reference`. Rule failures count as a
    /// mismatch.
    #[must_use]
    pub fn validate(&self, candidate: &Sequence, reference: &Sequence) -> bool {
        evaluate_rule(self.rule.as_ref(), candidate, reference)
    }

    #[must_use]
    pub fn rule_name(&self) -> &str {
        self.rule.name()
    }
}

/// Run `rule`, folding errors and panics into `false`.
pub fn evaluate_rule(rule: &dyn SequenceRule, candidate: &Sequence, reference: &Sequence) -> bool {
    let _span = tracing::debug_span!(
        "patlock.validate",
        rule = %rule.name(),
        candidate_len = candidate.len(),
        reference_len = reference.len(),
    )
    .entered();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        rule.evaluate(candidate.as_slice(), reference.as_slice())
    }));
    match outcome {
        Ok(Ok(matched)) => {
            tracing::debug!(target: "patlock.validate", matched, "sequence evaluated");
            matched
        }
        Ok(Err(err)) => {
            tracing::warn!(
                target: "patlock.validate",
                rule = %rule.name(),
                error = %err,
                "rule evaluation failed; treating as mismatch"
            );
            false
        }
        Err(_) => {
            tracing::warn!(
                target: "patlock.validate",
                rule = %rule.name(),
                "rule panicked; treating as mismatch"
            );
            false
        }
    }
}
