//! Property queries

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewProperty, Property, PropertyFilter, PropertyUpdate};

/// Active properties matching the filter, cheapest first.
///
/// Mirrors `PropertyFilter::matches`.
pub async fn list_properties(pool: &PgPool, filter: &PropertyFilter) -> Result<Vec<Property>> {
    let properties = sqlx::query_as::<_, Property>(
        r#"
        SELECT
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed, is_active,
            created_at, updated_at
        FROM properties
        WHERE is_active
          AND ($1::text IS NULL OR lower(category) = lower($1))
          AND ($2::text IS NULL OR strpos(lower(location), lower($2)) > 0)
          AND ($3::int IS NULL OR max_guests >= $3)
          AND ($4::bool IS NOT TRUE OR pets_allowed)
          AND ($5::numeric IS NULL OR price_per_night >= $5)
          AND ($6::numeric IS NULL OR price_per_night <= $6)
        ORDER BY price_per_night, name
        "#,
    )
    .bind(filter.category.as_deref())
    .bind(filter.location.as_deref())
    .bind(filter.guests)
    .bind(filter.pets)
    .bind(filter.min_price)
    .bind(filter.max_price)
    .fetch_all(pool)
    .await?;

    Ok(properties)
}

pub async fn get_property(pool: &PgPool, id: Uuid) -> Result<Option<Property>> {
    let property = sqlx::query_as::<_, Property>(
        r#"
        SELECT
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed, is_active,
            created_at, updated_at
        FROM properties
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(property)
}

pub async fn create_property(pool: &PgPool, new: NewProperty) -> Result<Property> {
    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties (
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed, is_active,
            created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.location)
    .bind(&new.description)
    .bind(&new.category)
    .bind(&new.aesthetic_tags)
    .bind(new.max_guests)
    .bind(new.bedrooms)
    .bind(new.bathrooms)
    .bind(new.price_per_night)
    .bind(&new.image_urls)
    .bind(Json(&new.features))
    .bind(Json(&new.testimonials))
    .bind(new.pets_allowed)
    .fetch_one(pool)
    .await?;

    Ok(property)
}

/// Partial update: the row is locked, patched in Rust, then written back whole
pub async fn update_property(
    pool: &PgPool,
    id: Uuid,
    update: PropertyUpdate,
) -> Result<Option<Property>> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, Property>(
        r#"
        SELECT
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed, is_active,
            created_at, updated_at
        FROM properties
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(mut property) = current else {
        return Ok(None);
    };
    update.apply(&mut property);

    let property = sqlx::query_as::<_, Property>(
        r#"
        UPDATE properties
        SET name = $2,
            location = $3,
            description = $4,
            category = $5,
            aesthetic_tags = $6,
            max_guests = $7,
            bedrooms = $8,
            bathrooms = $9,
            price_per_night = $10,
            image_urls = $11,
            features = $12,
            testimonials = $13,
            pets_allowed = $14,
            is_active = $15,
            updated_at = now()
        WHERE id = $1
        RETURNING
            id, name, location, description, category, aesthetic_tags,
            max_guests, bedrooms, bathrooms, price_per_night, image_urls,
            features, testimonials, pets_allowed, is_active,
            created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&property.name)
    .bind(&property.location)
    .bind(&property.description)
    .bind(&property.category)
    .bind(&property.aesthetic_tags)
    .bind(property.max_guests)
    .bind(property.bedrooms)
    .bind(property.bathrooms)
    .bind(property.price_per_night)
    .bind(&property.image_urls)
    .bind(Json(&property.features))
    .bind(Json(&property.testimonials))
    .bind(property.pets_allowed)
    .bind(property.is_active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(property))
}
