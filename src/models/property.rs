//! Rental property models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Rental property from the `properties` table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub description: String,
    pub category: String,
    pub aesthetic_tags: Vec<String>,
    pub max_guests: i32,
    pub bedrooms: i32,
    pub bathrooms: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_night: Decimal,
    pub image_urls: Vec<String>,
    #[sqlx(json)]
    pub features: Vec<PropertyFeature>,
    #[sqlx(json)]
    pub testimonials: Vec<Testimonial>,
    pub pets_allowed: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Amenity or highlight shown on the property page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeature {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Guest review quoted on the property page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub author: String,
    pub rating: u8,
    pub quote: String,
}

/// Listing filters; every field narrows the result set when present
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub guests: Option<i32>,
    #[serde(default)]
    pub pets: Option<bool>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub min_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_price: Option<Decimal>,
}

impl PropertyFilter {
    /// In-process version of the listing predicate (the Postgres query mirrors it)
    pub fn matches(&self, property: &Property) -> bool {
        if !property.is_active {
            return false;
        }
        if let Some(category) = &self.category {
            if !property.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !property
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(guests) = self.guests {
            if property.max_guests < guests {
                return false;
            }
        }
        if self.pets == Some(true) && !property.pets_allowed {
            return false;
        }
        if let Some(min) = self.min_price {
            if property.price_per_night < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if property.price_per_night > max {
                return false;
            }
        }
        true
    }

    /// Key used by the listing cache
    pub fn cache_key(&self) -> String {
        format!(
            "properties:{}:{}:{}:{}:{}:{}",
            self.category.as_deref().unwrap_or("*").to_lowercase(),
            self.location.as_deref().unwrap_or("*").to_lowercase(),
            self.guests.map(|g| g.to_string()).unwrap_or_default(),
            self.pets.map(|p| p.to_string()).unwrap_or_default(),
            self.min_price.map(|p| p.to_string()).unwrap_or_default(),
            self.max_price.map(|p| p.to_string()).unwrap_or_default(),
        )
    }
}

/// Admin payload for creating a property
#[derive(Debug, Clone, Deserialize)]
pub struct NewProperty {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub aesthetic_tags: Vec<String>,
    pub max_guests: i32,
    #[serde(default = "default_one")]
    pub bedrooms: i32,
    #[serde(default = "default_one")]
    pub bathrooms: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_night: Decimal,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub features: Vec<PropertyFeature>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub pets_allowed: bool,
}

fn default_one() -> i32 {
    1
}

/// Admin payload for a partial property update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub aesthetic_tags: Option<Vec<String>>,
    pub max_guests: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price_per_night: Option<Decimal>,
    pub image_urls: Option<Vec<String>>,
    pub features: Option<Vec<PropertyFeature>>,
    pub testimonials: Option<Vec<Testimonial>>,
    pub pets_allowed: Option<bool>,
    pub is_active: Option<bool>,
}

impl PropertyUpdate {
    /// Apply the present fields onto `property`
    pub fn apply(self, property: &mut Property) {
        if let Some(v) = self.name {
            property.name = v;
        }
        if let Some(v) = self.location {
            property.location = v;
        }
        if let Some(v) = self.description {
            property.description = v;
        }
        if let Some(v) = self.category {
            property.category = v;
        }
        if let Some(v) = self.aesthetic_tags {
            property.aesthetic_tags = v;
        }
        if let Some(v) = self.max_guests {
            property.max_guests = v;
        }
        if let Some(v) = self.bedrooms {
            property.bedrooms = v;
        }
        if let Some(v) = self.bathrooms {
            property.bathrooms = v;
        }
        if let Some(v) = self.price_per_night {
            property.price_per_night = v;
        }
        if let Some(v) = self.image_urls {
            property.image_urls = v;
        }
        if let Some(v) = self.features {
            property.features = v;
        }
        if let Some(v) = self.testimonials {
            property.testimonials = v;
        }
        if let Some(v) = self.pets_allowed {
            property.pets_allowed = v;
        }
        if let Some(v) = self.is_active {
            property.is_active = v;
        }
    }
}

/// Shared validation for create and update payloads
pub fn validate_property_fields(
    max_guests: i32,
    price_per_night: Decimal,
    testimonials: &[Testimonial],
) -> Result<(), String> {
    if max_guests < 1 {
        return Err("max_guests must be at least 1".to_string());
    }
    if price_per_night < Decimal::ZERO {
        return Err("price_per_night must not be negative".to_string());
    }
    if testimonials.iter().any(|t| !(1..=5).contains(&t.rating)) {
        return Err("testimonial rating must be between 1 and 5".to_string());
    }
    Ok(())
}
