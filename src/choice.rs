// Probability-weighted selection.
//
// The single shared stochastic primitive: every random decision in the
// pipeline — next tone, rhythm template, sample successor, concrete pitch —
// funnels through `weighted_choice` or `uniform_choice`, so the whole
// composition stays reproducible from one seeded generator.

use crate::error::{Error, Result};
use rand::Rng;

/// A candidate with a non-negative selection weight. Weights need not be
/// normalised; only their ratios matter.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: f64,
}

/// Draw one candidate, with probability proportional to its weight.
///
/// Cumulative boundaries are computed in input order and a uniform value
/// in `[0, total)` selects the first candidate whose boundary exceeds it.
/// A zero-weight candidate is unreachable but not rejected. An empty
/// slice — or one whose weights sum to zero, which leaves every candidate
/// unreachable — is an `EmptyDistribution` error.
pub fn weighted_choice<'a, T>(
    candidates: &'a [Weighted<T>],
    rng: &mut impl Rng,
) -> Result<&'a Weighted<T>> {
    if candidates.is_empty() {
        return Err(Error::EmptyDistribution("no candidates to draw from".into()));
    }
    let total: f64 = candidates.iter().map(|c| c.weight).sum();
    if total <= 0.0 {
        return Err(Error::EmptyDistribution(
            "candidate weights sum to zero".into(),
        ));
    }
    let draw = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += candidate.weight;
        if cumulative > draw {
            return Ok(candidate);
        }
    }
    // Float rounding can leave the draw at the final boundary.
    Ok(&candidates[candidates.len() - 1])
}

/// Draw one item uniformly. Callers needing deterministic behaviour over
/// set-like inputs sort before calling.
pub fn uniform_choice<'a, T>(items: &'a [T], rng: &mut impl Rng) -> Result<&'a T> {
    if items.is_empty() {
        return Err(Error::EmptyDistribution("no items to draw from".into()));
    }
    Ok(&items[rng.random_range(0..items.len())])
}
