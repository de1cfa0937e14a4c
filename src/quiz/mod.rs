//! Quiz state machine — the multi-step lead form.
//!
//! A visitor walks a fixed, forward-only sequence of steps. Each free-text
//! answer is validated with a regex before it is stored in the session's
//! [`LeadRecord`]. The phone step hands off to the OTP gateway; an approved
//! code submits the lead and moves the session to the confirmation step.

pub mod engine;
pub mod record;
pub mod routes;
pub mod session;
pub mod step;
pub mod store;
pub mod validation;

pub use engine::QuizEngine;
pub use record::LeadRecord;
pub use routes::{QuizRouteState, SessionView, quiz_routes};
pub use session::{PhonePhase, QuizSession};
pub use step::QuizStep;
pub use store::{SessionStore, spawn_expiry_task};
pub use validation::Field;
