//! Favourites, newsletter and activity log queries

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityEntry, Favorite, NewsletterSubscription, Property};

pub async fn add_favorite(pool: &PgPool, user_id: Uuid, property_id: Uuid) -> Result<Favorite> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM properties WHERE id = $1)")
        .bind(property_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound);
    }

    sqlx::query(
        r#"
        INSERT INTO user_favorites (user_id, property_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, property_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(property_id)
    .execute(pool)
    .await?;

    let favorite = sqlx::query_as::<_, Favorite>(
        r#"
        SELECT user_id, property_id, created_at
        FROM user_favorites
        WHERE user_id = $1 AND property_id = $2
        "#,
    )
    .bind(user_id)
    .bind(property_id)
    .fetch_one(pool)
    .await?;

    Ok(favorite)
}

pub async fn remove_favorite(pool: &PgPool, user_id: Uuid, property_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND property_id = $2")
        .bind(user_id)
        .bind(property_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_favorites(pool: &PgPool, user_id: Uuid) -> Result<Vec<Property>> {
    let properties = sqlx::query_as::<_, Property>(
        r#"
        SELECT
            p.id, p.name, p.location, p.description, p.category, p.aesthetic_tags,
            p.max_guests, p.bedrooms, p.bathrooms, p.price_per_night, p.image_urls,
            p.features, p.testimonials, p.pets_allowed, p.is_active,
            p.created_at, p.updated_at
        FROM user_favorites f
        JOIN properties p ON p.id = f.property_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(properties)
}

/// Idempotent on the lowercased email; a later signed-in subscribe claims the row
pub async fn subscribe_newsletter(
    pool: &PgPool,
    email: &str,
    user_id: Option<Uuid>,
) -> Result<NewsletterSubscription> {
    let subscription = sqlx::query_as::<_, NewsletterSubscription>(
        r#"
        INSERT INTO newsletter_subscriptions (id, email, user_id)
        VALUES ($1, lower($2), $3)
        ON CONFLICT (email) DO UPDATE
            SET user_id = COALESCE(newsletter_subscriptions.user_id, EXCLUDED.user_id)
        RETURNING id, email, user_id, subscribed_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(subscription)
}

pub async fn log_activity(
    pool: &PgPool,
    user_id: Uuid,
    action: Activity,
    detail: Option<serde_json::Value>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_activity_log (id, user_id, action, detail)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(detail)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_activity(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<ActivityEntry>> {
    let entries = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT id, user_id, action, detail, created_at
        FROM user_activity_log
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
