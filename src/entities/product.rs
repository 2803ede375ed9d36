use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    #[validate(length(
        min = 3,
        max = 255,
        message = "name must be between 3 and 255 characters"
    ))]
    pub name: String,

    /// Product description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Unit price, always positive and held at 2 decimal places
    pub price: Decimal,

    /// Units on hand, never negative
    pub stock: i32,

    /// Product category
    #[validate(length(
        min = 1,
        max = 100,
        message = "category must be between 1 and 100 characters"
    ))]
    pub category: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
