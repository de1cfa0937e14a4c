//! Lead funnel — quiz, phone verification and lead hand-off.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod otp;
pub mod quiz;
pub mod server;
pub mod variant;
