//! Environment configuration
//!
//! Everything is read once at startup. `.env` is loaded through dotenvy when
//! present; real environment variables win over it.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::auth::normalize_phone;
use crate::notify::WhatsAppConfig;
use crate::payments::{PhonePeConfig, RazorpayConfig};
use crate::pricing::PricingPolicy;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v19.0";
const DEFAULT_RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";
const DEFAULT_PHONEPE_BASE_URL: &str = "https://api.phonepe.com/apis/hermes";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{group} is partially configured; missing {missing:?}")]
    Partial {
        group: &'static str,
        missing: Vec<&'static str>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend `{}`", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    /// Base for URLs handed to payment gateways (redirects, callbacks)
    pub public_base_url: String,
    pub whatsapp: Option<WhatsAppConfig>,
    pub razorpay: Option<RazorpayConfig>,
    pub phonepe: Option<PhonePeConfig>,
    /// E.164 numbers with admin rights
    pub admin_phones: HashSet<String>,
    pub otp_ttl: Duration,
    pub otp_resend_cooldown: Duration,
    pub session_ttl: Duration,
    pub pending_booking_ttl: Duration,
    pub pricing: PricingPolicy,
    pub sentry_dsn: Option<String>,
    pub analytics_id: Option<String>,
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let store_backend = env.parse_or("STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = env.get("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let bind_addr = env.parse_or(
            "BIND_ADDR",
            DEFAULT_BIND_ADDR
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    key: "BIND_ADDR",
                    value: DEFAULT_BIND_ADDR.to_string(),
                    reason: e.to_string(),
                })?,
        )?;
        let public_base_url = env
            .get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();

        let whatsapp = env
            .group(
                "WhatsApp",
                &[
                    "WHATSAPP_TOKEN",
                    "WHATSAPP_PHONE_NUMBER_ID",
                    "WHATSAPP_OTP_TEMPLATE",
                    "WHATSAPP_BOOKING_TEMPLATE",
                ],
            )?
            .map(|values| WhatsAppConfig {
                api_base: env
                    .get("WHATSAPP_API_BASE")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_API_BASE.to_string()),
                token: values[0].clone(),
                phone_number_id: values[1].clone(),
                otp_template: values[2].clone(),
                booking_template: values[3].clone(),
                language: env
                    .get("WHATSAPP_TEMPLATE_LANGUAGE")
                    .unwrap_or_else(|| "en".to_string()),
            });

        let razorpay = env
            .group("Razorpay", &["RAZORPAY_KEY_ID", "RAZORPAY_KEY_SECRET"])?
            .map(|values| RazorpayConfig {
                api_base: env
                    .get("RAZORPAY_API_BASE")
                    .unwrap_or_else(|| DEFAULT_RAZORPAY_API_BASE.to_string()),
                key_id: values[0].clone(),
                key_secret: values[1].clone(),
            });

        let phonepe = env
            .group(
                "PhonePe",
                &["PHONEPE_MERCHANT_ID", "PHONEPE_SALT_KEY", "PHONEPE_SALT_INDEX"],
            )?
            .map(|values| PhonePeConfig {
                base_url: env
                    .get("PHONEPE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PHONEPE_BASE_URL.to_string()),
                merchant_id: values[0].clone(),
                salt_key: values[1].clone(),
                salt_index: values[2].clone(),
                redirect_url: format!("{}/bookings/payment-return", public_base_url),
                callback_url: format!("{}/api/payments/phonepe/callback", public_base_url),
            });

        let admin_phones = match env.get("ADMIN_PHONES") {
            Some(raw) => parse_admin_phones(&raw)?,
            None => HashSet::new(),
        };

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            service_fee_rate: env.parse_or::<Decimal>("SERVICE_FEE_RATE", defaults.service_fee_rate)?,
            pet_fee: env.parse_or::<Decimal>("PET_FEE", defaults.pet_fee)?,
            currency: defaults.currency,
        };
        if pricing.service_fee_rate < Decimal::ZERO || pricing.service_fee_rate > Decimal::ONE {
            return Err(ConfigError::Invalid {
                key: "SERVICE_FEE_RATE",
                value: pricing.service_fee_rate.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }
        if pricing.pet_fee < Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "PET_FEE",
                value: pricing.pet_fee.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            store_backend,
            database_url,
            public_base_url,
            whatsapp,
            razorpay,
            phonepe,
            admin_phones,
            otp_ttl: env.duration_or("OTP_TTL_SECONDS", 300, 1)?,
            otp_resend_cooldown: env.duration_or("OTP_RESEND_COOLDOWN_SECONDS", 30, 1)?,
            session_ttl: env.duration_or("SESSION_TTL_HOURS", 24 * 30, 3600)?,
            pending_booking_ttl: env.duration_or("PENDING_BOOKING_TTL_MINUTES", 30, 60)?,
            pricing,
            sentry_dsn: env.get("SENTRY_DSN"),
            analytics_id: env.get("ANALYTICS_ID"),
        })
    }

    pub fn is_admin(&self, phone: &str) -> bool {
        self.admin_phones.contains(phone)
    }
}

fn parse_admin_phones(raw: &str) -> Result<HashSet<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            normalize_phone(s).ok_or_else(|| ConfigError::Invalid {
                key: "ADMIN_PHONES",
                value: s.to_string(),
                reason: "not a phone number".to_string(),
            })
        })
        .collect()
}

/// Upper bound for every configured TTL; cache builders reject much larger values
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// `key` counted in units of `unit_secs` seconds, capped at [`MAX_TTL`]
    fn duration_or(
        &self,
        key: &'static str,
        default: u64,
        unit_secs: u64,
    ) -> Result<Duration, ConfigError> {
        let count = self.parse_or(key, default)?;
        count
            .checked_mul(unit_secs)
            .map(Duration::from_secs)
            .filter(|ttl| *ttl <= MAX_TTL)
            .ok_or_else(|| ConfigError::Invalid {
                key,
                value: count.to_string(),
                reason: "must be at most 10 years".to_string(),
            })
    }

    /// All-or-nothing group of variables
    fn group(
        &self,
        group: &'static str,
        keys: &[&'static str],
    ) -> Result<Option<Vec<String>>, ConfigError> {
        let values: Vec<Option<String>> = keys.iter().map(|k| self.get(k)).collect();
        let missing: Vec<&'static str> = keys
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect();

        if missing.len() == keys.len() {
            Ok(None)
        } else if missing.is_empty() {
            Ok(Some(values.into_iter().flatten().collect()))
        } else {
            Err(ConfigError::Partial { group, missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_memory_defaults() {
        let config = load(&[("STORE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.pricing.service_fee_rate, dec!(0.12));
        assert_eq!(config.pricing.pet_fee, dec!(500));
        assert_eq!(config.otp_ttl, Duration::from_secs(300));
        assert_eq!(config.pending_booking_ttl, Duration::from_secs(30 * 60));
        assert!(config.whatsapp.is_none());
        assert!(config.razorpay.is_none());
        assert!(config.phonepe.is_none());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        assert!(load(&[("DATABASE_URL", "postgres://localhost/rentals")]).is_ok());
    }

    #[test]
    fn test_partial_group_rejected() {
        let err = load(&[
            ("STORE_BACKEND", "memory"),
            ("WHATSAPP_TOKEN", "secret"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1234"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Partial {
                group: "WhatsApp",
                missing: vec!["WHATSAPP_OTP_TEMPLATE", "WHATSAPP_BOOKING_TEMPLATE"],
            }
        );
    }

    #[test]
    fn test_gateways_and_admins() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("PUBLIC_BASE_URL", "https://stays.example.in/"),
            ("RAZORPAY_KEY_ID", "rzp_test_1"),
            ("RAZORPAY_KEY_SECRET", "secret"),
            ("PHONEPE_MERCHANT_ID", "M1"),
            ("PHONEPE_SALT_KEY", "salt"),
            ("PHONEPE_SALT_INDEX", "1"),
            ("ADMIN_PHONES", "98765 43210, +919000000001"),
        ])
        .unwrap();

        assert_eq!(config.razorpay.as_ref().unwrap().key_id, "rzp_test_1");
        let phonepe = config.phonepe.as_ref().unwrap();
        assert_eq!(
            phonepe.callback_url,
            "https://stays.example.in/api/payments/phonepe/callback"
        );
        assert!(config.is_admin("+919876543210"));
        assert!(config.is_admin("+919000000001"));
        assert!(!config.is_admin("+919000000002"));
    }

    #[test]
    fn test_oversized_ttls_are_rejected() {
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("SESSION_TTL_HOURS", "18446744073709551615")]),
            Err(ConfigError::Invalid { key: "SESSION_TTL_HOURS", .. })
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("PENDING_BOOKING_TTL_MINUTES", "999999999")]),
            Err(ConfigError::Invalid { key: "PENDING_BOOKING_TTL_MINUTES", .. })
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("OTP_TTL_SECONDS", "400000000")]),
            Err(ConfigError::Invalid { key: "OTP_TTL_SECONDS", .. })
        ));

        let config = load(&[("STORE_BACKEND", "memory"), ("SESSION_TTL_HOURS", "87600")]).unwrap();
        assert_eq!(config.session_ttl, MAX_TTL);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("SERVICE_FEE_RATE", "1.5")]),
            Err(ConfigError::Invalid { key: "SERVICE_FEE_RATE", .. })
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "memory"), ("OTP_TTL_SECONDS", "soon")]),
            Err(ConfigError::Invalid { key: "OTP_TTL_SECONDS", .. })
        ));
        assert!(matches!(
            load(&[("STORE_BACKEND", "sqlite")]),
            Err(ConfigError::Invalid { key: "STORE_BACKEND", .. })
        ));
    }
}
