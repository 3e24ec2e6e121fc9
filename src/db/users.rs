//! User profile queries

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ProfileUpdate, UserProfile};

pub async fn find_profile_by_phone(pool: &PgPool, phone: &str) -> Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            id, phone, full_name, email, bio, marketing_consent,
            whatsapp_consent, preferences, created_at, updated_at
        FROM user_profiles
        WHERE phone = $1
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            id, phone, full_name, email, bio, marketing_consent,
            whatsapp_consent, preferences, created_at, updated_at
        FROM user_profiles
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

/// Insert-or-return on the unique phone column
pub async fn create_profile(pool: &PgPool, phone: &str) -> Result<UserProfile> {
    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO user_profiles (id, phone)
        VALUES ($1, $2)
        ON CONFLICT (phone) DO UPDATE SET phone = EXCLUDED.phone
        RETURNING
            id, phone, full_name, email, bio, marketing_consent,
            whatsapp_consent, preferences, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(phone)
    .fetch_one(pool)
    .await?;

    Ok(profile)
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<Option<UserProfile>> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT
            id, phone, full_name, email, bio, marketing_consent,
            whatsapp_consent, preferences, created_at, updated_at
        FROM user_profiles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(mut profile) = current else {
        return Ok(None);
    };
    update.apply(&mut profile);

    let profile = sqlx::query_as::<_, UserProfile>(
        r#"
        UPDATE user_profiles
        SET full_name = $2,
            email = $3,
            bio = $4,
            marketing_consent = $5,
            whatsapp_consent = $6,
            preferences = $7,
            updated_at = now()
        WHERE id = $1
        RETURNING
            id, phone, full_name, email, bio, marketing_consent,
            whatsapp_consent, preferences, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(&profile.bio)
    .bind(profile.marketing_consent)
    .bind(profile.whatsapp_consent)
    .bind(Json(&profile.preferences))
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(profile))
}
