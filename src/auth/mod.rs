//! Phone sign-in: OTP issue/verification, sessions and request extractors.

pub mod otp;
pub mod phone;
pub mod routes;
pub mod session;

pub use otp::{OtpStore, OtpVerdict};
pub use phone::normalize_phone;
pub use routes::router;
pub use session::{AdminUser, AuthUser, Session, SessionStore};
