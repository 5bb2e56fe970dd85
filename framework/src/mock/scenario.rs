//! The per-test invocation ledger
//!
//! A [`Scenario`] records every mock invocation of one test execution in
//! call order and answers the verification questions: was this invoked (at
//! most once per recorded call), was it invoked in sequence, was it never
//! invoked, and are there unverified calls left. Verification failures are
//! returned as [`AttestError::Verification`] values carrying the complete
//! diagnostic message; they never corrupt the ledger, so later verifications
//! still see consistent state.

use crate::error::AttestError;

use super::invocation::Invocation;
use super::matcher::InvocationMatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerificationStatus {
    Unverified,
    Verified,
    VerifiedInSequence,
}

#[derive(Debug)]
struct Observed {
    invocation: Invocation,
    status: VerificationStatus,
}

/// Ordered, append-only log of the invocations observed during one test
#[derive(Debug, Default)]
pub struct Scenario {
    observed: Vec<Observed>,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an invocation to the log. No side effect beyond storage.
    pub fn register_invocation(&mut self, invocation: Invocation) {
        self.observed.push(Observed {
            invocation,
            status: VerificationStatus::Unverified,
        });
    }

    /// All recorded invocations, in call order
    pub fn observed_invocations(&self) -> Vec<&Invocation> {
        self.observed.iter().map(|o| &o.invocation).collect()
    }

    /// Clear the log and the verification ledger
    pub fn reset(&mut self) {
        self.observed.clear();
    }

    /// Verify that a matching invocation was observed and consume it.
    ///
    /// Scans from the start of the log; the first unverified match is marked
    /// verified, so repeated verifications of the same single call fail the
    /// second time.
    pub fn verify_invoked(&mut self, matcher: &InvocationMatcher) -> Result<(), AttestError> {
        for observed in self.observed.iter_mut() {
            if observed.status == VerificationStatus::Unverified
                && matcher.matches(&observed.invocation)
            {
                observed.status = VerificationStatus::Verified;
                return Ok(());
            }
        }
        Err(AttestError::verification(
            self.not_invoked_error_message(matcher),
        ))
    }

    /// Verify that a matching invocation was observed, consume it, and check
    /// that it was not preceded by a later in-sequence verification.
    ///
    /// Using this for several expectations asserts that the calls happened
    /// in the same order as the verifications.
    pub fn verify_invoked_in_sequence(
        &mut self,
        matcher: &InvocationMatcher,
    ) -> Result<(), AttestError> {
        let index = self.observed.iter().position(|observed| {
            observed.status == VerificationStatus::Unverified
                && matcher.matches(&observed.invocation)
        });
        let index = match index {
            Some(index) => index,
            None => {
                return Err(AttestError::verification(
                    self.not_invoked_error_message(matcher),
                ))
            }
        };
        if let Some(later) = self.observed[index + 1..]
            .iter()
            .find(|observed| observed.status == VerificationStatus::VerifiedInSequence)
        {
            let message = format!(
                "Invocation of {} was expected to be performed after {} but actually occurred before it.\n\nObserved scenario:\n{}",
                self.observed[index].invocation,
                later.invocation,
                self.observed_invocations_report()
            );
            return Err(AttestError::verification(message));
        }
        self.observed[index].status = VerificationStatus::VerifiedInSequence;
        Ok(())
    }

    /// Verify that no invocation, consumed or not, matches.
    pub fn verify_not_invoked(&self, matcher: &InvocationMatcher) -> Result<(), AttestError> {
        for observed in &self.observed {
            if matcher.matches(&observed.invocation) {
                let message = format!(
                    "Expected no invocation of {}, but it did occur.\nat {}\n\nObserved scenario:\n{}",
                    matcher.describe(),
                    observed.invocation.invoked_at(),
                    self.observed_invocations_report()
                );
                return Err(AttestError::verification(message));
            }
        }
        Ok(())
    }

    /// Verify that every recorded invocation has been consumed by an
    /// explicit verification. This is a state check, not a scan for a
    /// particular call.
    pub fn verify_no_more_invocations(&self) -> Result<(), AttestError> {
        let unverified: Vec<&Invocation> = self
            .observed
            .iter()
            .filter(|observed| observed.status == VerificationStatus::Unverified)
            .map(|observed| &observed.invocation)
            .collect();
        if unverified.is_empty() {
            return Ok(());
        }
        let mut message =
            String::from("No more invocations expected, yet observed following calls:\n");
        for (index, invocation) in unverified.iter().enumerate() {
            message.push_str(&format!(
                "{}. {}  at {}\n",
                index + 1,
                invocation,
                invocation.invoked_at()
            ));
        }
        message.push_str(&format!(
            "\nObserved scenario:\n{}",
            self.observed_invocations_report()
        ));
        Err(AttestError::verification(message))
    }

    /// Numbered report of every observed invocation
    pub fn observed_invocations_report(&self) -> String {
        if self.observed.is_empty() {
            return "<no invocations observed>\n".to_string();
        }
        let mut report = String::new();
        for (index, observed) in self.observed.iter().enumerate() {
            let marker = match observed.status {
                VerificationStatus::Unverified => "",
                VerificationStatus::Verified => "  (verified)",
                VerificationStatus::VerifiedInSequence => "  (verified in sequence)",
            };
            report.push_str(&format!(
                "{}. {}  at {}{}\n",
                index + 1,
                observed.invocation,
                observed.invocation.invoked_at(),
                marker
            ));
        }
        report
    }

    /// Suggest verification statements for the invocations that have not
    /// been consumed yet
    pub fn suggested_asserts_report(&self) -> String {
        let mut report = String::new();
        for observed in &self.observed {
            if observed.status != VerificationStatus::Unverified {
                continue;
            }
            report.push_str(&format!(
                "{}.verify(\"{}\").invoked();\n",
                observed.invocation.mock_name(),
                observed.invocation.signature().method
            ));
        }
        report
    }

    /// Invocations of the same mock and method whose arguments did not match
    fn similar_invocations(&self, matcher: &InvocationMatcher) -> Vec<&Invocation> {
        self.observed
            .iter()
            .map(|observed| &observed.invocation)
            .filter(|invocation| {
                invocation.mock_name() == matcher.mock_name()
                    && invocation.signature() == matcher.signature()
                    && !matcher.matches(invocation)
            })
            .collect()
    }

    fn not_invoked_error_message(&self, matcher: &InvocationMatcher) -> String {
        let mut message = format!(
            "Expected invocation of {}, but it didn't occur.\n",
            matcher.describe()
        );
        let similar = self.similar_invocations(matcher);
        if !similar.is_empty() {
            message.push_str("\nInvocations with a matching method but different arguments:\n");
            for (index, invocation) in similar.iter().enumerate() {
                message.push_str(&format!(
                    "{}. {}  at {}\n",
                    index + 1,
                    invocation,
                    invocation.invoked_at()
                ));
            }
        }
        message.push_str(&format!(
            "\nObserved scenario:\n{}",
            self.observed_invocations_report()
        ));
        message
    }
}
