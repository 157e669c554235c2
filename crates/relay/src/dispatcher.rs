use std::sync::Arc;

use jiff::{tz::TimeZone, Timestamp};
use tracing::{error, info, warn};

use crate::{
    captcha::HumanVerificationGate,
    formatter::NotificationFormatter,
    metrics::{SPILLS_DELIVERED, SPILLS_RECEIVED, SPILLS_REJECTED, SPILL_DELIVERY_FAILURES},
    sink::NotificationSink,
    types::{Rejection, SpillOutcome, SpillRequest, SpillResponse},
    validation::InputValidator,
};

/// Runs a spill through captcha, validation, formatting and delivery, in that order
pub struct RelayDispatcher {
    gate: HumanVerificationGate,
    validator: InputValidator,
    formatter: NotificationFormatter,
    sink: Arc<dyn NotificationSink>,
    support_email: String,
}

impl RelayDispatcher {
    pub fn new(
        gate: HumanVerificationGate,
        validator: InputValidator,
        sink: Arc<dyn NotificationSink>,
        time_zone: TimeZone,
        support_email: String,
    ) -> Self {
        let formatter = NotificationFormatter::new(sink.kind(), time_zone);
        Self { gate, validator, formatter, sink, support_email }
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    /// Handle one spill. Every path ends in an explicit status and body.
    pub async fn handle(&self, request: SpillRequest) -> SpillResponse {
        let outcome = self.process(request).await;
        record_outcome(&outcome, self.sink.name());
        outcome.into()
    }

    /// Reply for a body that could not be read in full (over the size limit or cut off).
    ///
    /// Nothing has been verified yet, so this is the same reply as an absent body.
    pub fn reject_unreadable(&self) -> SpillResponse {
        SPILLS_RECEIVED.inc();
        let outcome = SpillOutcome::Rejected(Rejection::MissingBody);
        record_outcome(&outcome, self.sink.name());
        outcome.into()
    }

    pub async fn process(&self, request: SpillRequest) -> SpillOutcome {
        SPILLS_RECEIVED.inc();

        let payload = match InputValidator::parse_payload(&request.body) {
            Ok(payload) => payload,
            Err(rejection) => return SpillOutcome::Rejected(rejection),
        };

        if !self.gate.verify(&payload).await {
            return SpillOutcome::Rejected(Rejection::CaptchaFailed);
        }

        let submission = match self.validator.validate(&payload) {
            Ok(submission) => submission,
            Err(rejection) => return SpillOutcome::Rejected(rejection),
        };

        let Some(source_address) = request.source_address else {
            error!("Transport did not provide a client address, refusing to relay spill");
            return self.failed();
        };

        let notification = self.formatter.format(&submission, source_address, Timestamp::now());

        match self.sink.deliver(&notification).await {
            Ok(()) => {
                info!(sink = self.sink.name(), "Spill delivered");
                SpillOutcome::Delivered
            }
            Err(e) => {
                error!(sink = self.sink.name(), error = %e, "Failed to deliver spill");
                self.failed()
            }
        }
    }

    fn failed(&self) -> SpillOutcome {
        SpillOutcome::Failed { support_email: self.support_email.clone() }
    }
}

fn record_outcome(outcome: &SpillOutcome, sink: &str) {
    match outcome {
        SpillOutcome::Delivered => SPILLS_DELIVERED.inc(),
        SpillOutcome::Rejected(rejection) => {
            SPILLS_REJECTED.with_label_values(&[rejection.reason()]).inc();
            warn!(reason = rejection.reason(), "Spill rejected");
        }
        SpillOutcome::Failed { .. } => SPILL_DELIVERY_FAILURES.with_label_values(&[sink]).inc(),
    }
}
