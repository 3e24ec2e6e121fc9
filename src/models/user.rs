//! User profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Profile from the `user_profiles` table, keyed by verified phone number
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub phone: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub marketing_consent: bool,
    pub whatsapp_consent: bool,
    #[sqlx(json)]
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub newsletter: bool,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
}

/// Partial profile edit; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub marketing_consent: Option<bool>,
    pub whatsapp_consent: Option<bool>,
    pub preferences: Option<UserPreferences>,
}

impl ProfileUpdate {
    pub fn apply(self, profile: &mut UserProfile) {
        if let Some(v) = self.full_name {
            profile.full_name = Some(v);
        }
        if let Some(v) = self.email {
            profile.email = Some(v);
        }
        if let Some(v) = self.bio {
            profile.bio = Some(v);
        }
        if let Some(v) = self.marketing_consent {
            profile.marketing_consent = v;
        }
        if let Some(v) = self.whatsapp_consent {
            profile.whatsapp_consent = v;
        }
        if let Some(v) = self.preferences {
            profile.preferences = v;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                return Err(format!("Invalid email address: {}", email));
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > 500 {
                return Err("Bio must be at most 500 characters".to_string());
            }
        }
        Ok(())
    }
}

/// Cheap shape check; deliverability is the mail provider's problem
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("guest@example.com"));
        assert!(!looks_like_email("guest@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("guest example@example.com"));
        assert!(!looks_like_email("guest"));
    }

    #[test]
    fn test_profile_update_validation() {
        let update = ProfileUpdate {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ProfileUpdate {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = ProfileUpdate {
            full_name: Some("Asha".to_string()),
            email: Some("asha@example.in".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
