//! Interactive state for the slider-driven surfaces.
//!
//! Each parameter change is stamped with a revision. Results are published
//! only for the newest revision, so a slow evaluation that finishes after a
//! newer one never overwrites it. A rejected change keeps the last valid
//! result on display.

use tracing::{debug, info, warn};

use super::engine::run_projection;
use super::error::DomainError;
use super::types::{EconomicConstants, ParameterPatch, ParameterSet, ProjectionResult};

/// A parameter snapshot queued for evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Submission {
    pub revision: u64,
    pub params: ParameterSet,
}

impl Submission {
    pub fn evaluate(&self, constants: &EconomicConstants) -> Result<ProjectionResult, DomainError> {
        run_projection(&self.params, constants)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Published,
    Rejected(DomainError),
    Stale { revision: u64, latest: u64 },
}

#[derive(Debug, Clone)]
pub struct Session {
    constants: EconomicConstants,
    latest_revision: u64,
    published_revision: u64,
    params: ParameterSet,
    result: ProjectionResult,
    last_error: Option<DomainError>,
}

impl Session {
    pub fn new(constants: EconomicConstants, params: ParameterSet) -> Result<Self, DomainError> {
        let result = run_projection(&params, &constants)?;
        Ok(Self {
            constants,
            latest_revision: 0,
            published_revision: 0,
            params,
            result,
            last_error: None,
        })
    }

    pub fn constants(&self) -> &EconomicConstants {
        &self.constants
    }

    /// Parameters behind the currently displayed result.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn result(&self) -> &ProjectionResult {
        &self.result
    }

    pub fn revision(&self) -> u64 {
        self.published_revision
    }

    pub fn last_error(&self) -> Option<&DomainError> {
        self.last_error.as_ref()
    }

    pub fn submit(&mut self, params: ParameterSet) -> Submission {
        self.latest_revision += 1;
        debug!(revision = self.latest_revision, "parameters submitted");
        Submission {
            revision: self.latest_revision,
            params,
        }
    }

    pub fn complete(
        &mut self,
        submission: Submission,
        outcome: Result<ProjectionResult, DomainError>,
    ) -> Completion {
        if submission.revision != self.latest_revision {
            warn!(
                revision = submission.revision,
                latest = self.latest_revision,
                "discarding stale projection"
            );
            return Completion::Stale {
                revision: submission.revision,
                latest: self.latest_revision,
            };
        }

        match outcome {
            Ok(result) => {
                self.params = submission.params;
                self.result = result;
                self.published_revision = submission.revision;
                self.last_error = None;
                info!(revision = submission.revision, "projection published");
                Completion::Published
            }
            Err(err) => {
                warn!(
                    revision = submission.revision,
                    error = %err,
                    "parameters rejected, keeping last valid projection"
                );
                self.last_error = Some(err.clone());
                Completion::Rejected(err)
            }
        }
    }

    pub fn apply(&mut self, params: ParameterSet) -> Result<&ProjectionResult, DomainError> {
        let submission = self.submit(params);
        let outcome = submission.evaluate(&self.constants);
        match self.complete(submission, outcome) {
            Completion::Rejected(err) => Err(err),
            Completion::Published | Completion::Stale { .. } => Ok(&self.result),
        }
    }

    pub fn apply_patch(&mut self, patch: &ParameterPatch) -> Result<&ProjectionResult, DomainError> {
        let params = patch.apply_to(&self.params);
        self.apply(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Field, Payback, Preset};

    fn session() -> Session {
        Session::new(EconomicConstants::default(), ParameterSet::default()).expect("valid defaults")
    }

    #[test]
    fn new_session_evaluates_initial_parameters() {
        let session = session();
        assert_eq!(session.revision(), 0);
        assert_eq!(session.result().steps, 3);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn apply_patch_changes_only_the_named_field() {
        let mut session = session();
        let patch = ParameterPatch {
            retention: Some(100.0),
            ..ParameterPatch::default()
        };
        let result = session.apply_patch(&patch).expect("valid change").clone();

        assert_eq!(session.params().retention, 100.0);
        assert_eq!(session.params().monthly_spend, 100_000.0);
        assert_eq!(session.revision(), 1);
        assert_eq!(
            result.months[11].total_users,
            session.result().months[11].total_users
        );
    }

    #[test]
    fn rejected_change_keeps_last_valid_result() {
        let mut session = session();
        session
            .apply(Preset::Conservative.params())
            .expect("valid preset");
        let before = session.result().clone();

        let patch = ParameterPatch {
            conversion_rate: Some(0.0),
            ..ParameterPatch::default()
        };
        let err = session.apply_patch(&patch).expect_err("out of range");
        assert!(matches!(
            err,
            DomainError::OutOfRange {
                field: Field::ConversionRate,
                ..
            }
        ));
        assert_eq!(session.result(), &before);
        assert_eq!(session.params(), &Preset::Conservative.params());
        assert_eq!(session.last_error(), Some(&err));
        assert_eq!(session.revision(), 1);
    }

    #[test]
    fn later_submission_wins_over_slower_earlier_one() {
        let mut session = session();
        let constants = *session.constants();

        let slow = session.submit(Preset::AggressiveScale.params());
        let fast = session.submit(Preset::Conservative.params());

        let fast_outcome = fast.evaluate(&constants);
        assert_eq!(session.complete(fast, fast_outcome), Completion::Published);

        let slow_outcome = slow.evaluate(&constants);
        assert_eq!(
            session.complete(slow, slow_outcome),
            Completion::Stale {
                revision: 1,
                latest: 2
            }
        );

        assert_eq!(session.params(), &Preset::Conservative.params());
        assert_eq!(session.revision(), 2);
        assert_eq!(
            session.result().kpis.all_in_payback,
            Payback::Within {
                month: 6,
                days: 180
            }
        );
    }

    #[test]
    fn stale_error_does_not_replace_newer_result() {
        let mut session = session();
        let constants = *session.constants();

        let mut broken = ParameterSet::default();
        broken.usage_days = 0;
        let stale = session.submit(broken);
        let current = session.submit(Preset::AggressiveScale.params());

        let outcome = current.evaluate(&constants);
        session.complete(current, outcome);
        let outcome = stale.evaluate(&constants);
        assert!(matches!(
            session.complete(stale, outcome),
            Completion::Stale { .. }
        ));
        assert!(session.last_error().is_none());
        assert_eq!(session.result().steps, 16);
    }
}
