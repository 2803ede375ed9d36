use std::sync::Arc;

use crate::{
    db::DbPool,
    entities::product::{self, Column as ProductColumn, Entity as Product},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

/// Candidate for insertion. Carries exactly the caller-supplied fields; id and
/// timestamps are assigned at persistence time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
}

/// Filters for the list operation; all optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub name: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub stock_min: Option<i32>,
}

pub(crate) fn check_name(name: &str) -> Result<(), String> {
    let len = name.chars().count();
    if !(3..=255).contains(&len) {
        return Err("name must be between 3 and 255 characters".to_string());
    }
    Ok(())
}

pub(crate) fn check_category(category: &str) -> Result<(), String> {
    let len = category.chars().count();
    if !(1..=100).contains(&len) {
        return Err("category must be between 1 and 100 characters".to_string());
    }
    Ok(())
}

pub(crate) fn check_stock(stock: i32) -> Result<(), String> {
    if stock < 0 {
        return Err("stock cannot be negative".to_string());
    }
    Ok(())
}

/// Rounds a price to 2 decimal places and enforces strict positivity on the
/// rounded value, so a sub-cent price cannot round down to zero and slip past
/// the invariant.
pub(crate) fn normalize_price(price: Decimal) -> Result<Decimal, String> {
    let rounded = price.round_dp(2);
    if rounded <= Decimal::ZERO {
        return Err("price must be greater than 0".to_string());
    }
    Ok(rounded)
}

fn validate_new(input: NewProduct) -> Result<NewProduct, ServiceError> {
    check_name(&input.name).map_err(ServiceError::ValidationError)?;
    check_category(&input.category).map_err(ServiceError::ValidationError)?;
    check_stock(input.stock).map_err(ServiceError::ValidationError)?;
    let price = normalize_price(input.price).map_err(ServiceError::ValidationError)?;

    Ok(NewProduct { price, ..input })
}

/// Repository for product records
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// List products with optional filters and offset/limit pagination.
    /// The returned total ignores the page window.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProductFilter,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = Product::find();

        if let Some(category) = &filter.category {
            query = query.filter(ProductColumn::Category.eq(category));
        }

        if let Some(name) = &filter.name {
            // Substring match, case-insensitive on every backend
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(ProductColumn::Name)))
                    .like(format!("%{}%", name.to_lowercase())),
            );
        }

        if let Some(price_min) = filter.price_min {
            query = query.filter(ProductColumn::Price.gte(price_min));
        }

        if let Some(price_max) = filter.price_max {
            query = query.filter(ProductColumn::Price.lte(price_max));
        }

        if let Some(stock_min) = filter.stock_min {
            query = query.filter(ProductColumn::Stock.gte(stock_min));
        }

        query = query.order_by_desc(ProductColumn::CreatedAt);

        let total = query.clone().count(&*self.db).await?;
        let items = query.offset(skip).limit(limit).all(&*self.db).await?;

        Ok((items, total))
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with ID {id} not found")))
    }

    /// Create a new product
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        let input = validate_new(input)?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            stock: Set(input.stock),
            category: Set(input.category),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(&*self.db).await?;
        info!(product_id = %created.id, "Product created");

        Ok(created)
    }

    /// Update a product; only the provided fields are touched
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProduct,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut model: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            check_name(&name).map_err(ServiceError::ValidationError)?;
            model.name = Set(name);
        }

        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }

        if let Some(price) = input.price {
            let price = normalize_price(price).map_err(ServiceError::ValidationError)?;
            model.price = Set(price);
        }

        if let Some(stock) = input.stock {
            check_stock(stock).map_err(ServiceError::ValidationError)?;
            model.stock = Set(stock);
        }

        if let Some(category) = input.category {
            check_category(&category).map_err(ServiceError::ValidationError)?;
            model.category = Set(category);
        }

        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&*self.db).await?;
        info!(product_id = %updated.id, "Product updated");

        Ok(updated)
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        let existing = self.get(id).await?;
        existing.clone().delete(&*self.db).await?;
        info!(product_id = %id, "Product deleted");

        Ok(existing)
    }

    /// Insert a batch of already-validated rows in one statement. Callers are
    /// responsible for having validated every row against the creation
    /// contract.
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub async fn bulk_create(&self, rows: Vec<NewProduct>) -> Result<u64, ServiceError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let count = rows.len() as u64;
        let now = Utc::now();
        let models: Vec<product::ActiveModel> = rows
            .into_iter()
            .map(|row| product::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(row.name),
                description: Set(row.description),
                price: Set(row.price),
                stock: Set(row.stock),
                category: Set(row.category),
                created_at: Set(now),
                updated_at: Set(None),
            })
            .collect();

        Product::insert_many(models).exec(&*self.db).await?;
        info!(inserted = count, "Bulk insert flushed");

        Ok(count)
    }

    /// Full unpaginated product set for the exporters
    #[instrument(skip(self))]
    pub async fn export_all(&self) -> Result<Vec<product::Model>, ServiceError> {
        Product::find()
            .order_by_asc(ProductColumn::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }
}
