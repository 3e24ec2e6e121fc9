//! One-time codes for phone verification.
//!
//! Codes live in a moka TTL cache keyed by E.164 phone number. Every read
//! that decides a code's fate goes through a single entry compute, so a code
//! can be accepted at most once even under concurrent verification.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::ops::compute::Op;
use rand::Rng;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::payments::constant_time_eq;

/// Digits in a generated code
pub const CODE_LENGTH: usize = 6;

/// Wrong guesses allowed before a code is discarded
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: u32,
}

/// Outcome of a verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerdict {
    Accepted,
    Mismatch { attempts_left: u32 },
    Expired,
    TooManyAttempts,
    NotFound,
}

#[derive(Clone)]
pub struct OtpStore {
    codes: Cache<String, OtpRecord>,
    ttl: chrono::Duration,
    resend_cooldown: chrono::Duration,
}

impl OtpStore {
    pub fn new(ttl: Duration, resend_cooldown: Duration) -> Self {
        Self {
            codes: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(5)),
            resend_cooldown: chrono::Duration::from_std(resend_cooldown)
                .unwrap_or_else(|_| chrono::Duration::seconds(30)),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Random numeric code of [`CODE_LENGTH`] digits
    pub fn generate_code() -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }

    /// Issue a fresh code for `phone`, replacing any previous one
    pub async fn issue(&self, phone: &str) -> Result<String> {
        self.issue_at(phone, Utc::now()).await
    }

    pub async fn issue_at(&self, phone: &str, now: DateTime<Utc>) -> Result<String> {
        let code = Self::generate_code();
        let record = OtpRecord {
            code: code.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
            failed_attempts: 0,
        };
        let cooldown = self.resend_cooldown;
        let mut wait_seconds = None;

        self.codes
            .entry_by_ref(phone)
            .and_compute_with(|existing| {
                let op = match existing {
                    Some(entry) if now - entry.value().issued_at < cooldown => {
                        let remaining = cooldown - (now - entry.value().issued_at);
                        wait_seconds = Some(remaining.num_seconds().max(1));
                        Op::Nop
                    }
                    _ => Op::Put(record),
                };
                std::future::ready(op)
            })
            .await;

        match wait_seconds {
            Some(seconds) => Err(AppError::RateLimited(format!(
                "Please wait {} seconds before requesting a new code",
                seconds
            ))),
            None => Ok(code),
        }
    }

    /// Drop the pending code for `phone` (e.g. when delivery failed)
    pub async fn discard(&self, phone: &str) {
        self.codes.invalidate(phone).await;
    }

    pub async fn verify(&self, phone: &str, code: &str) -> OtpVerdict {
        self.verify_at(phone, code, Utc::now()).await
    }

    /// Check `code` for `phone` at time `now`; an accepted code is consumed
    pub async fn verify_at(&self, phone: &str, code: &str, now: DateTime<Utc>) -> OtpVerdict {
        let mut verdict = OtpVerdict::NotFound;

        self.codes
            .entry_by_ref(phone)
            .and_compute_with(|existing| {
                let op = match existing {
                    None => Op::Nop,
                    Some(entry) => {
                        let record = entry.into_value();
                        if record.expires_at <= now {
                            verdict = OtpVerdict::Expired;
                            Op::Remove
                        } else if constant_time_eq(record.code.as_bytes(), code.as_bytes()) {
                            verdict = OtpVerdict::Accepted;
                            Op::Remove
                        } else {
                            let failed_attempts = record.failed_attempts + 1;
                            if failed_attempts >= MAX_ATTEMPTS {
                                verdict = OtpVerdict::TooManyAttempts;
                                Op::Remove
                            } else {
                                verdict = OtpVerdict::Mismatch {
                                    attempts_left: MAX_ATTEMPTS - failed_attempts,
                                };
                                Op::Put(OtpRecord {
                                    failed_attempts,
                                    ..record
                                })
                            }
                        }
                    }
                };
                std::future::ready(op)
            })
            .await;

        verdict
    }
}
