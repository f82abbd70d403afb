//! Heterogeneous batch construction.
//!
//! A [`WorkloadComposer`] turns a ratio map (kind → fraction of the batch) and
//! a target count into a shuffled list of [`OperationDescriptor`]s:
//!
//! 1. each kind gets `floor(count * ratio)` descriptors
//! 2. whatever is left over goes to the first kind in the mix
//! 3. the list is shuffled, with a seeded RNG when a seed is configured
//!
//! Ratios are validated when the composer is built. An invalid mix is the only
//! error that aborts a run, and it is raised before any invocation starts.

use crate::constants::RATIO_EPSILON;
use crate::core::{LoadError, OperationDescriptor, OperationKind};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One entry of a workload mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindMix {
    /// Kind of the descriptors this entry produces
    pub kind: OperationKind,
    /// Fraction of the batch, between 0.0 and 1.0
    pub ratio: f64,
    /// Payload copied into every descriptor of this kind
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl KindMix {
    /// Entry with an empty payload.
    pub fn new(kind: impl Into<OperationKind>, ratio: f64) -> Self {
        Self {
            kind: kind.into(),
            ratio,
            params: Value::Null,
        }
    }

    /// Set the payload handed to every descriptor of this kind.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

/// Builds shuffled, ratio-matched batches of descriptors.
#[derive(Debug, Clone)]
pub struct WorkloadComposer {
    mix: Vec<KindMix>,
    seed: Option<u64>,
}

impl WorkloadComposer {
    /// Validate `mix` and build a composer.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidWorkload`] when the mix is empty, a ratio is
    /// negative or not finite, a kind appears twice, or the ratios sum above 1.0.
    pub fn new(mix: Vec<KindMix>) -> Result<Self> {
        validate_mix(&mix)?;
        Ok(Self {
            mix,
            seed: None,
        })
    }

    /// Shuffle deterministically from `seed`; `None` seeds from OS entropy.
    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// The validated mix.
    #[must_use]
    pub fn mix(&self) -> &[KindMix] {
        &self.mix
    }

    /// Number of descriptors each kind receives for a batch of `count`.
    ///
    /// Always sums to `count`.
    pub fn plan(&self, count: usize) -> Vec<(OperationKind, usize)> {
        // Ratios may sum to slightly above 1.0, so shares are capped by what is left
        let mut remaining = count;
        let mut plan: Vec<(OperationKind, usize)> = self
            .mix
            .iter()
            .map(|entry| {
                let share = (count as f64 * entry.ratio + RATIO_EPSILON).floor() as usize;
                let share = share.min(remaining);
                remaining -= share;
                (entry.kind.clone(), share)
            })
            .collect();

        if let Some((_, first)) = plan.first_mut() {
            *first += remaining;
        }
        plan
    }

    /// Build a shuffled batch of `count` descriptors.
    ///
    /// Case ids are `<kind>_<index>`, numbered per kind from 0, so they are
    /// unique within the batch.
    pub fn compose(&self, count: usize) -> Vec<OperationDescriptor> {
        let plan = self.plan(count);
        let mut descriptors = Vec::with_capacity(count);

        for ((kind, share), entry) in plan.iter().zip(&self.mix) {
            descriptors.extend((0..*share).map(|i| {
                OperationDescriptor::new(format!("{kind}_{i}"), kind.clone(), entry.params.clone())
            }));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        descriptors.shuffle(&mut rng);

        tracing::debug!(
            count,
            kinds = self.mix.len(),
            seeded = self.seed.is_some(),
            "Composed workload"
        );
        descriptors
    }
}

fn validate_mix(mix: &[KindMix]) -> Result<(), LoadError> {
    let invalid = |reason: String| LoadError::InvalidWorkload { reason };

    if mix.is_empty() {
        return Err(invalid("at least one operation kind is required".to_string()));
    }

    let mut seen = HashSet::new();
    for entry in mix {
        if !entry.ratio.is_finite() || entry.ratio < 0.0 {
            return Err(invalid(format!(
                "ratio for '{}' must be a finite, non-negative number (got {})",
                entry.kind, entry.ratio
            )));
        }
        if !seen.insert(&entry.kind) {
            return Err(invalid(format!("kind '{}' appears more than once", entry.kind)));
        }
    }

    let total: f64 = mix.iter().map(|entry| entry.ratio).sum();
    if total > 1.0 + RATIO_EPSILON {
        return Err(invalid(format!("ratios sum to {total:.3}, which is above 1.0")));
    }
    Ok(())
}
