//! QuizEngine — drives sessions through the OTP gateway and the dispatcher.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::session::QuizSession;
use super::store::SessionStore;
use crate::dispatch::LeadDispatcher;
use crate::error::QuizError;
use crate::otp::OtpService;
use crate::variant::AbVariant;

/// Coordinates session transitions with the external calls they need.
pub struct QuizEngine {
    store: Arc<SessionStore>,
    otp: Arc<dyn OtpService>,
    dispatcher: Arc<LeadDispatcher>,
}

impl QuizEngine {
    pub fn new(
        store: Arc<SessionStore>,
        otp: Arc<dyn OtpService>,
        dispatcher: Arc<LeadDispatcher>,
    ) -> Self {
        Self {
            store,
            otp,
            dispatcher,
        }
    }

    /// Start a session, keeping the visitor's stored variant when it is valid.
    pub async fn start(&self, stored_variant: Option<&str>) -> QuizSession {
        let variant = AbVariant::assign(stored_variant);
        self.store.insert(QuizSession::new(variant)).await
    }

    pub async fn get(&self, id: Uuid) -> Result<QuizSession, QuizError> {
        self.store.get(id).await
    }

    /// Answer the current step.
    pub async fn answer(&self, id: Uuid, value: &str) -> Result<QuizSession, QuizError> {
        let (result, session) = self.store.update(id, |s| s.answer(value)).await?;
        let step = result?;
        info!(session = %id, step = %step, progress = step.progress(), "Quiz advanced");
        Ok(session)
    }

    /// Validate the number and ask the gateway to text a code.
    pub async fn send_code(&self, id: Uuid, phone: &str) -> Result<QuizSession, QuizError> {
        let (result, _) = self.store.update(id, |s| s.prepare_send(phone)).await?;
        let phone = result?;

        self.otp.send_code(&phone).await?;

        let (result, session) = self
            .store
            .update(id, |s| {
                s.code_sent(phone);
                Ok(())
            })
            .await?;
        result?;
        Ok(session)
    }

    /// Send another code to the number already on file. The client retries;
    /// the gateway never does.
    pub async fn resend_code(&self, id: Uuid) -> Result<QuizSession, QuizError> {
        let (result, session) = self.store.update(id, |s| s.prepare_resend()).await?;
        let phone = result?;

        self.otp.send_code(&phone).await?;
        info!(session = %id, "Verification code resent");
        Ok(session)
    }

    /// Check the code; on approval submit the lead and finish the quiz.
    pub async fn verify_code(&self, id: Uuid, code: &str) -> Result<QuizSession, QuizError> {
        let (result, _) = self.store.update(id, |s| s.begin_verify(code)).await?;
        let (phone, code) = result?;

        if let Err(e) = self.otp.check_code(&phone, &code).await {
            warn!(session = %id, error = %e, "Verification error");
            self.store
                .update(id, |s| {
                    s.verification_failed();
                    Ok(())
                })
                .await?
                .0?;
            return Err(e.into());
        }

        let (result, session) = self
            .store
            .update(id, |s| s.finish_verify(phone, &self.dispatcher))
            .await?;
        // Submissions run on their own; the handle is not awaited.
        drop(result?);
        Ok(session)
    }

    /// Drop the pending code and return to phone entry.
    pub async fn change_phone(&self, id: Uuid) -> Result<QuizSession, QuizError> {
        let (result, session) = self.store.update(id, |s| s.change_phone()).await?;
        result?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::dispatch::tests::RecordingSink;
    use crate::error::{OtpError, ProviderError};
    use crate::otp::gateway::tests::ScriptedProvider;
    use crate::otp::{
        OtpGateway, Verification, VerificationCheck, VerifyChannel, VerifyProvider,
    };
    use crate::quiz::session::PhonePhase;
    use crate::quiz::step::QuizStep;

    /// Holds every check until released.
    #[derive(Default)]
    struct GatedProvider {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl VerifyProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn start_verification(
            &self,
            _to: &str,
            _channel: VerifyChannel,
        ) -> Result<Verification, ProviderError> {
            Ok(Verification {
                status: "pending".into(),
                sid: None,
            })
        }

        async fn check_verification(
            &self,
            _to: &str,
            _code: &str,
        ) -> Result<VerificationCheck, ProviderError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(VerificationCheck {
                status: "approved".into(),
            })
        }
    }

    struct Harness {
        engine: QuizEngine,
        provider: Arc<ScriptedProvider>,
        primary: Arc<RecordingSink>,
        backup: Arc<RecordingSink>,
    }

    fn harness(provider: ScriptedProvider) -> Harness {
        let provider = Arc::new(provider);
        let primary = RecordingSink::new("primary");
        let backup = RecordingSink::new("backup");
        let engine = QuizEngine::new(
            SessionStore::new(Duration::from_secs(600)),
            Arc::new(OtpGateway::new(provider.clone())),
            Arc::new(LeadDispatcher::new(primary.clone(), Some(backup.clone()))),
        );
        Harness {
            engine,
            provider,
            primary,
            backup,
        }
    }

    async fn to_phone_step(engine: &QuizEngine) -> Uuid {
        let id = engine.start(Some("A")).await.id;
        for answer in ["yes", "garage_floor", "Dana", "Roanoke", "24011", "dana@example.com"] {
            engine.answer(id, answer).await.unwrap();
        }
        id
    }

    async fn settle(sink: &RecordingSink, expected: usize) {
        for _ in 0..50 {
            if sink.count() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn full_funnel_submits_lead_once() {
        let h = harness(ScriptedProvider::default());
        let id = to_phone_step(&h.engine).await;

        let session = h.engine.send_code(id, "(540) 123-4567").await.unwrap();
        assert_eq!(
            session.phone_phase,
            PhonePhase::AwaitingCode {
                phone: "(540) 123-4567".into()
            }
        );

        let session = h.engine.verify_code(id, "123456").await.unwrap();
        assert_eq!(session.step, QuizStep::Complete);
        assert!(session.record.phone_verified);
        assert_eq!(session.variant(), Some(AbVariant::A));

        settle(&h.primary, 1).await;
        settle(&h.backup, 1).await;
        assert_eq!(h.primary.count(), 1);
        assert_eq!(h.backup.count(), 1);
        let sent = h.primary.seen.lock().unwrap()[0].clone();
        assert_eq!(sent.phone, "(540) 123-4567");
        assert_eq!(sent.ab_variant, "A");

        assert_eq!(
            *h.provider.calls.lock().unwrap(),
            vec!["send +15401234567", "check +15401234567 123456"]
        );
    }

    #[tokio::test]
    async fn rejected_code_stays_on_code_entry() {
        let h = harness(ScriptedProvider {
            check_status: Some("pending".into()),
            ..Default::default()
        });
        let id = to_phone_step(&h.engine).await;
        h.engine.send_code(id, "5401234567").await.unwrap();

        let err = h.engine.verify_code(id, "000000").await.unwrap_err();
        assert!(matches!(err, QuizError::Otp(OtpError::Rejected { .. })));

        let session = h.engine.get(id).await.unwrap();
        assert_eq!(session.step, QuizStep::Phone);
        assert!(!session.submitting);
        assert!(matches!(session.phone_phase, PhonePhase::AwaitingCode { .. }));
        assert_eq!(h.primary.count(), 0);

        // Resend is still available.
        h.engine.resend_code(id).await.unwrap();
        assert_eq!(h.provider.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn send_failure_keeps_phone_entry() {
        let h = harness(ScriptedProvider {
            send_error: Some(ProviderError {
                code: Some(60200),
                http_status: Some(400),
                message: "Invalid parameter `To`".into(),
            }),
            ..Default::default()
        });
        let id = to_phone_step(&h.engine).await;

        let err = h.engine.send_code(id, "5401234567").await.unwrap_err();
        assert!(matches!(err, QuizError::Otp(OtpError::InvalidPhone)));
        assert_eq!(
            h.engine.get(id).await.unwrap().phone_phase,
            PhonePhase::EnteringPhone
        );
    }

    #[tokio::test]
    async fn short_phone_never_reaches_gateway() {
        let h = harness(ScriptedProvider::default());
        let id = to_phone_step(&h.engine).await;

        let err = h.engine.send_code(id, "540-1234").await.unwrap_err();
        assert!(matches!(err, QuizError::Validation(_)));
        assert!(h.provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn change_phone_then_send_again() {
        let h = harness(ScriptedProvider::default());
        let id = to_phone_step(&h.engine).await;
        h.engine.send_code(id, "5401234567").await.unwrap();

        let session = h.engine.change_phone(id).await.unwrap();
        assert_eq!(session.phone_phase, PhonePhase::EnteringPhone);

        h.engine.send_code(id, "5409876543").await.unwrap();
        let session = h.engine.verify_code(id, "123456").await.unwrap();
        assert_eq!(session.record.phone, "5409876543");
    }

    #[tokio::test]
    async fn change_phone_waits_for_in_flight_verify() {
        let provider = Arc::new(GatedProvider::default());
        let primary = RecordingSink::new("primary");
        let engine = Arc::new(QuizEngine::new(
            SessionStore::new(Duration::from_secs(600)),
            Arc::new(OtpGateway::new(provider.clone())),
            Arc::new(LeadDispatcher::new(primary.clone(), None)),
        ));
        let id = to_phone_step(&engine).await;
        engine.send_code(id, "5401111111").await.unwrap();

        let verify = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.verify_code(id, "123456").await }
        });
        provider.entered.notified().await;

        let err = engine.change_phone(id).await.unwrap_err();
        assert!(matches!(err, QuizError::AlreadySubmitting));
        let session = engine.get(id).await.unwrap();
        assert!(session.submitting);
        assert_eq!(
            session.phone_phase,
            PhonePhase::AwaitingCode {
                phone: "5401111111".into()
            }
        );

        provider.release.notify_one();
        let session = verify.await.unwrap().unwrap();
        assert_eq!(session.step, QuizStep::Complete);
        assert_eq!(session.record.phone, "5401111111");
        assert!(!session.submitting);

        settle(&primary, 1).await;
        assert_eq!(primary.count(), 1);
    }

    #[tokio::test]
    async fn stored_variant_is_reused() {
        let h = harness(ScriptedProvider::default());
        let session = h.engine.start(Some("B")).await;
        assert_eq!(session.variant(), Some(AbVariant::B));
    }
}
