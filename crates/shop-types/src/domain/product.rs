use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{self, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: String,
    pub description: String,
    pub quantity: u32,
    pub tags: BTreeSet<String>,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(
        id: String,
        description: String,
        quantity: i64,
        tags: BTreeSet<String>,
        unit_price_cents: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validation::require("id", &id)?;
        validation::require("description", &description)?;
        let quantity = validation::quantity_at_least("quantity", quantity, 1)?;
        let unit_price_cents = validation::non_negative_cents("unit_price_cents", unit_price_cents)?;
        Ok(Self {
            id,
            description,
            quantity,
            tags,
            unit_price_cents,
            created_at,
            updated_at: None,
        })
    }

    /// Replaces every mutable field with the update's values.
    pub fn apply(&mut self, update: &ProductUpdate) {
        self.description = update.description.clone();
        self.quantity = update.quantity;
        self.tags = update.tags.clone();
        self.unit_price_cents = update.unit_price_cents;
        self.updated_at = Some(update.updated_at);
    }
}

/// Full replacement of a product's mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductUpdate {
    pub id: String,
    pub description: String,
    pub quantity: u32,
    pub tags: BTreeSet<String>,
    pub unit_price_cents: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProductUpdate {
    pub fn new(
        id: String,
        description: String,
        quantity: i64,
        tags: BTreeSet<String>,
        unit_price_cents: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validation::require("id", &id)?;
        validation::require("description", &description)?;
        let quantity = validation::quantity_at_least("quantity", quantity, 1)?;
        let unit_price_cents = validation::non_negative_cents("unit_price_cents", unit_price_cents)?;
        Ok(Self {
            id,
            description,
            quantity,
            tags,
            unit_price_cents,
            updated_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateProductRequest {
    /// Generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub description: String,
    pub quantity: i64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateProductRequest {
    pub id: String,
    pub description: String,
    pub quantity: i64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub unit_price_cents: i64,
}

/// Stock taken from a product by a successful check-and-decrement.
///
/// The unit price is captured when the stock is taken, so a later price change
/// does not alter what the order is charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}
