//! Verification plans: the data that drives the probe engine.
//!
//! A plan is an ordered list of [`VerificationStep`]s. Each step describes
//! one HTTP request, how the secret is attached to it and how its response
//! is classified. Provider differences live entirely in plan data.

mod predicate;
mod step;

use serde::{Deserialize, Serialize};

pub use self::predicate::{Extraction, Predicate, Source, first_text, is_empty};
pub use self::step::{AuthMode, VerificationStep, WarningStatus, render_template};
use crate::Provider;

/// The ordered steps a probe executes for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationPlan {
    pub provider: Provider,
    pub steps: Vec<VerificationStep>,
}

impl VerificationPlan {
    /// Creates an empty plan for a provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: VerificationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
