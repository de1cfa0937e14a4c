//! OTP gateway — phone verification through a hosted SMS provider.
//!
//! Two stateless operations, "send code" and "check code", each normalizing
//! the phone number and proxying to a [`VerifyProvider`]. Provider error codes
//! are translated into [`OtpError`](crate::error::OtpError) variants with fixed
//! user-facing messages at the gateway boundary.

pub mod client;
pub mod gateway;
pub mod phone;
pub mod provider;
pub mod routes;
pub mod twilio;

pub use client::HttpOtpClient;
pub use gateway::{CheckOutcome, OtpGateway, OtpService, SendOutcome};
pub use provider::{Verification, VerificationCheck, VerifyChannel, VerifyProvider};
pub use routes::{OtpRouteState, otp_routes};
pub use twilio::TwilioVerify;
