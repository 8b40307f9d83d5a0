//! Per-check accounting of alert emissions.

use serde::Serialize;
use tracing::error;

use pharmacy_core::error::AppError;
use pharmacy_core::result::AppResult;
use pharmacy_entity::notification::AlertSubject;

use super::emitter::Emission;

/// Counts of what a group of alert checks did.
///
/// Alert failures never propagate to the mutation that triggered them; they
/// are logged and counted here instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertOutcome {
    /// Notification rows written.
    pub created: usize,
    /// Alerts skipped because an earlier one covers them.
    pub suppressed: usize,
    /// Checks that failed.
    pub failed: usize,
}

impl AlertOutcome {
    /// Fold the result of one check in, logging a failure with its subject.
    pub fn record(&mut self, check: &'static str, subject: AlertSubject, result: AppResult<Emission>) {
        match result {
            Ok(Emission::Created(n)) => self.created += n,
            Ok(Emission::Suppressed) => self.suppressed += 1,
            Ok(Emission::Skipped) => {}
            Err(e) => {
                error!(
                    check,
                    subject = ?subject,
                    error = %e,
                    "Alert check failed"
                );
                self.failed += 1;
            }
        }
    }

    /// Count a failure that happened before any check could run.
    pub fn record_failure(&mut self, check: &'static str, error: &AppError) {
        error!(check, error = %error, "Alert check failed");
        self.failed += 1;
    }

    pub fn merge(&mut self, other: AlertOutcome) {
        self.created += other.created;
        self.suppressed += other.suppressed;
        self.failed += other.failed;
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl std::ops::Add for AlertOutcome {
    type Output = AlertOutcome;

    fn add(mut self, rhs: AlertOutcome) -> AlertOutcome {
        self.merge(rhs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_result() {
        let mut outcome = AlertOutcome::default();
        outcome.record("low_stock", AlertSubject::System, Ok(Emission::Created(3)));
        outcome.record("low_stock", AlertSubject::System, Ok(Emission::Suppressed));
        outcome.record("low_stock", AlertSubject::System, Ok(Emission::Skipped));
        outcome.record(
            "low_stock",
            AlertSubject::System,
            Err(AppError::database("connection reset")),
        );
        assert_eq!(
            outcome,
            AlertOutcome {
                created: 3,
                suppressed: 1,
                failed: 1
            }
        );
        assert!(outcome.has_failures());
    }

    #[test]
    fn test_add_merges() {
        let a = AlertOutcome {
            created: 1,
            suppressed: 0,
            failed: 0,
        };
        let b = AlertOutcome {
            created: 2,
            suppressed: 1,
            failed: 1,
        };
        assert_eq!((a + b).created, 3);
        assert_eq!((a + b).failed, 1);
    }
}
