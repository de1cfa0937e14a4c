//! Quiz session — the explicit state object each transition operates on.
//!
//! Transitions here are synchronous and never touch the network. Steps that
//! need the OTP gateway are split into a `prepare`/`begin` half that validates
//! and claims the session, and a completion half that records the gateway's
//! answer, so no lock is held across a provider call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::LeadRecord;
use super::step::QuizStep;
use super::validation::Field;
use crate::dispatch::{DispatchHandle, LeadDispatcher};
use crate::error::{QuizError, ValidationError};
use crate::variant::AbVariant;

/// Where the visitor is inside the Phone step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhonePhase {
    EnteringPhone,
    /// A code was sent to `phone` (as typed, trimmed).
    AwaitingCode { phone: String },
}

impl Default for PhonePhase {
    fn default() -> Self {
        Self::EnteringPhone
    }
}

/// One visitor's pass through the quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: Uuid,
    pub step: QuizStep,
    pub record: LeadRecord,
    pub phone_phase: PhonePhase,
    /// Set while a verify-and-submit is in flight.
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(variant: AbVariant) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            step: QuizStep::default(),
            record: LeadRecord::with_variant(variant),
            phone_phase: PhonePhase::default(),
            submitting: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn variant(&self) -> Option<AbVariant> {
        self.record.ab_variant
    }

    fn invalid(&self, action: &str) -> QuizError {
        QuizError::InvalidAction {
            step: self.step.to_string(),
            action: action.to_string(),
        }
    }

    fn expect_step(&self, step: QuizStep, action: &str) -> Result<(), QuizError> {
        if self.step == step {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn advance(&mut self) -> QuizStep {
        if let Some(next) = self.step.next() {
            debug_assert!(self.step.can_transition_to(next));
            self.step = next;
        }
        self.updated_at = Utc::now();
        self.step
    }

    /// Answer the current multiple-choice or free-text step.
    ///
    /// Validation failures leave the step unchanged. The Phone step is not
    /// answered here; it goes through the OTP actions.
    pub fn answer(&mut self, value: &str) -> Result<QuizStep, QuizError> {
        match self.step {
            QuizStep::Homeowner => self.answer_homeowner(value),
            QuizStep::ProjectType => self.choose_project_type(value),
            QuizStep::Name => self.fill(Field::Name, value),
            QuizStep::City => self.fill(Field::City, value),
            QuizStep::Zip => self.fill(Field::Zip, value),
            QuizStep::Email => self.fill(Field::Email, value),
            QuizStep::Phone | QuizStep::Complete => Err(self.invalid("answer")),
        }
    }

    fn answer_homeowner(&mut self, value: &str) -> Result<QuizStep, QuizError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => {
                self.record.homeowner = "yes".to_string();
                Ok(self.advance())
            }
            "no" => Err(QuizError::Refused(
                "We primarily work with homeowners.".to_string(),
            )),
            _ => Err(ValidationError {
                field: "homeowner",
                placeholder: "Please choose yes or no".to_string(),
            }
            .into()),
        }
    }

    fn choose_project_type(&mut self, value: &str) -> Result<QuizStep, QuizError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError {
                field: "project_type",
                placeholder: "Please choose a project type".to_string(),
            }
            .into());
        }
        self.record.project_type = value.to_string();
        tracing::debug!(session = %self.id, project_type = %value, "Project type selected");
        Ok(self.advance())
    }

    fn fill(&mut self, field: Field, raw: &str) -> Result<QuizStep, QuizError> {
        let value = field.validate(raw)?;
        match field {
            Field::Name => self.record.name = value,
            Field::City => self.record.city = value,
            Field::Zip => self.record.zip = value,
            Field::Email => self.record.email = value,
            Field::Phone | Field::Code => return Err(self.invalid("fill")),
        }
        Ok(self.advance())
    }

    // ── Phone step ──────────────────────────────────────────────────────

    /// Validate a phone number for "send code". Returns the trimmed number.
    pub fn prepare_send(&self, phone: &str) -> Result<String, QuizError> {
        self.expect_step(QuizStep::Phone, "send_code")?;
        if self.phone_phase != PhonePhase::EnteringPhone {
            return Err(self.invalid("send_code"));
        }
        Ok(Field::Phone.validate(phone)?)
    }

    /// The gateway accepted the send; switch to code entry.
    pub fn code_sent(&mut self, phone: String) {
        self.phone_phase = PhonePhase::AwaitingCode { phone };
        self.updated_at = Utc::now();
    }

    /// Number to resend a code to.
    pub fn prepare_resend(&self) -> Result<String, QuizError> {
        self.expect_step(QuizStep::Phone, "resend_code")?;
        match &self.phone_phase {
            PhonePhase::AwaitingCode { phone } => Ok(phone.clone()),
            PhonePhase::EnteringPhone => Err(self.invalid("resend_code")),
        }
    }

    /// Validate the code and claim the session for verification.
    ///
    /// Returns `(phone, code)` and sets the in-flight flag; a second call
    /// before [`finish_verify`](Self::finish_verify) or
    /// [`verification_failed`](Self::verification_failed) is refused.
    pub fn begin_verify(&mut self, code: &str) -> Result<(String, String), QuizError> {
        self.expect_step(QuizStep::Phone, "verify_code")?;
        if self.submitting {
            tracing::warn!(session = %self.id, "Submission already in progress");
            return Err(QuizError::AlreadySubmitting);
        }
        let phone = match &self.phone_phase {
            PhonePhase::AwaitingCode { phone } => phone.clone(),
            PhonePhase::EnteringPhone => return Err(self.invalid("verify_code")),
        };
        let code = Field::Code.validate(code)?;
        self.submitting = true;
        self.updated_at = Utc::now();
        Ok((phone, code))
    }

    /// The gateway rejected the code; stay on code entry so the visitor can
    /// retry or resend.
    pub fn verification_failed(&mut self) {
        self.submitting = false;
        self.updated_at = Utc::now();
    }

    /// The gateway approved the code: record the phone, submit the lead and
    /// move to the confirmation step.
    pub fn finish_verify(
        &mut self,
        phone: String,
        dispatcher: &LeadDispatcher,
    ) -> Result<DispatchHandle, QuizError> {
        self.expect_step(QuizStep::Phone, "finish_verify")?;
        let pending = matches!(
            &self.phone_phase,
            PhonePhase::AwaitingCode { phone: p } if *p == phone
        );
        if !pending {
            self.submitting = false;
            return Err(self.invalid("finish_verify"));
        }
        self.record.phone = phone;
        self.record.phone_verified = true;

        let result = dispatcher.dispatch(&self.record);
        self.submitting = false;
        let handle = result?;

        self.advance();
        tracing::info!(session = %self.id, "Lead submitted, quiz complete");
        Ok(handle)
    }

    /// Abandon the pending code and return to phone entry. Refused while a
    /// verification is in flight.
    pub fn change_phone(&mut self) -> Result<(), QuizError> {
        self.expect_step(QuizStep::Phone, "change_phone")?;
        if self.submitting {
            return Err(QuizError::AlreadySubmitting);
        }
        self.phone_phase = PhonePhase::EnteringPhone;
        self.record.phone.clear();
        self.record.phone_verified = false;
        self.updated_at = Utc::now();
        Ok(())
    }
}
