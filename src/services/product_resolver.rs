use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::dto::PurchaseOrderItemInput;
use crate::errors::ServiceError;
use crate::models::{location_entity, product_entity, store_entity, ProductState};

const MAX_UNIQUE_ATTEMPTS: u32 = 100;

/// Turns order lines into catalog product ids, creating ad-hoc products where a line names
/// a product instead of referencing one.
///
/// One resolver serves one order; the owning store is looked up once and reused.
#[derive(Debug, Clone)]
pub struct ProductResolver {
    organization_id: i64,
    location_id: i64,
    store_id: Option<i64>,
}

impl ProductResolver {
    pub fn new(organization_id: i64, location_id: i64) -> Self {
        Self {
            organization_id,
            location_id,
            store_id: None,
        }
    }

    pub async fn resolve<C>(
        &mut self,
        conn: &C,
        line: &PurchaseOrderItemInput,
    ) -> Result<i64, ServiceError>
    where
        C: ConnectionTrait,
    {
        if let Some(product_id) = line.product_id.filter(|id| *id > 0) {
            return Ok(product_id);
        }

        let name = line
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ServiceError::invalid_request(
                    "Each item needs either a product_id or a product_name",
                )
            })?;

        let store_id = self.resolve_store(conn).await?;
        let now = Utc::now();
        let stamp = now.timestamp_millis();

        let slug = unique_slug(conn, &format!("{}-{}", slugify(name), stamp)).await?;
        let sku = match line.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sku) => sku.to_string(),
            None => unique_sku(conn, &format!("GEN-{}", stamp)).await?,
        };

        let product = product_entity::ActiveModel {
            store_id: Set(store_id),
            name: Set(name.to_string()),
            slug: Set(slug),
            sku: Set(sku),
            description: Set(line.product_description.clone()),
            base_price: Set(Decimal::ZERO),
            stock_quantity: Set(0),
            state: Set(ProductState::Active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;

        info!(
            product_id = product.id,
            store_id,
            slug = %product.slug,
            "Created ad-hoc product for purchase order line"
        );
        Ok(product.id)
    }

    /// Store of the receiving location, else the organization's first store.
    async fn resolve_store<C>(&mut self, conn: &C) -> Result<i64, ServiceError>
    where
        C: ConnectionTrait,
    {
        if let Some(store_id) = self.store_id {
            return Ok(store_id);
        }

        let location_store = location_entity::Entity::find_by_id(self.location_id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .and_then(|location| location.store_id);

        let store_id = match location_store {
            Some(store_id) => store_id,
            None => store_entity::Entity::find()
                .filter(store_entity::Column::OrganizationId.eq(self.organization_id))
                .order_by_asc(store_entity::Column::Id)
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?
                .map(|store| store.id)
                .ok_or_else(|| {
                    ServiceError::invalid_request(format!(
                        "No store found for organization {}",
                        self.organization_id
                    ))
                })?,
        };

        self.store_id = Some(store_id);
        Ok(store_id)
    }
}

/// Lowercase ASCII slug. Runs of anything else collapse into a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("product");
    }
    slug
}

async fn unique_slug<C: ConnectionTrait>(conn: &C, base: &str) -> Result<String, ServiceError> {
    unique_value(conn, base, product_entity::Column::Slug).await
}

async fn unique_sku<C: ConnectionTrait>(conn: &C, base: &str) -> Result<String, ServiceError> {
    unique_value(conn, base, product_entity::Column::Sku).await
}

async fn unique_value<C: ConnectionTrait>(
    conn: &C,
    base: &str,
    column: product_entity::Column,
) -> Result<String, ServiceError> {
    let mut candidate = base.to_string();
    for attempt in 2..=MAX_UNIQUE_ATTEMPTS + 1 {
        let taken = product_entity::Entity::find()
            .filter(column.eq(candidate.as_str()))
            .count(conn)
            .await
            .map_err(ServiceError::db_error)?;
        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, attempt);
    }
    Err(ServiceError::ConstraintViolation(format!(
        "Could not find a free value for {}",
        base
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Widget", "widget")]
    #[case("  Blue Widget  (XL) ", "blue-widget-xl")]
    #[case("A--B__C", "a-b-c")]
    #[case("Café crème", "caf-cr-me")]
    #[case("***", "product")]
    #[case("", "product")]
    fn slugify_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }
}
