use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::{Deserialize, Serialize};

use crate::dto::PurchaseOrderFilter;
use crate::errors::ServiceError;
use crate::models::{
    location_entity,
    purchase_order_entity::{self, Column, Entity as PurchaseOrderEntity},
};
use crate::repositories::{PurchaseOrderDetails, PurchaseOrderRepository};

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database pool.
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

/// Query to get a specific purchase order by ID, hydrated
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPurchaseOrderQuery {
    pub organization_id: Option<i64>,
    pub purchase_order_id: i64,
}

#[async_trait]
impl Query for GetPurchaseOrderQuery {
    type Result = Option<PurchaseOrderDetails>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let Some(organization_id) = self.organization_id else {
            return db_pool.find_details(self.purchase_order_id).await;
        };

        let order = PurchaseOrderEntity::find_by_id(self.purchase_order_id)
            .filter(Column::OrganizationId.eq(organization_id))
            .one(db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        match order {
            Some(order) => Ok(db_pool.hydrate(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Filtered listing, newest `order_date` first.
///
/// Equality and range filters run in SQL. The free-text search is applied after hydration so
/// that it is case-sensitive on every backend and can see the supplier name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListPurchaseOrdersQuery {
    pub organization_id: Option<i64>,
    pub filter: PurchaseOrderFilter,
}

#[async_trait]
impl Query for ListPurchaseOrdersQuery {
    type Result = Vec<PurchaseOrderDetails>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let filter = &self.filter;
        let mut query = PurchaseOrderEntity::find();

        if let Some(organization_id) = self.organization_id {
            query = query.filter(Column::OrganizationId.eq(organization_id));
        }
        if let Some(store_id) = filter.store_id {
            query = query
                .join(JoinType::InnerJoin, purchase_order_entity::Relation::Location.def())
                .filter(location_entity::Column::StoreId.eq(store_id));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(Column::SupplierId.eq(supplier_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(Column::LocationId.eq(location_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(Column::OrderDate.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(Column::OrderDate.lte(end));
        }
        if let Some(min_total) = filter.min_total {
            query = query.filter(Column::TotalAmount.gte(min_total));
        }
        if let Some(max_total) = filter.max_total {
            query = query.filter(Column::TotalAmount.lte(max_total));
        }

        let orders = query
            .order_by_desc(Column::OrderDate)
            .order_by_desc(Column::Id)
            .all(db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut details = db_pool.hydrate(orders).await?;
        if let Some(term) = filter.search_term() {
            details.retain(|order| order.search_haystacks().any(|text| text.contains(term)));
        }
        Ok(details)
    }
}

/// Orders waiting on goods. There is no separate `pending` status; this is `approved`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListPendingPurchaseOrdersQuery {
    pub organization_id: Option<i64>,
}

#[async_trait]
impl Query for ListPendingPurchaseOrdersQuery {
    type Result = Vec<PurchaseOrderDetails>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        ListPurchaseOrdersQuery {
            organization_id: self.organization_id,
            filter: PurchaseOrderFilter::pending(),
        }
        .execute(db_pool)
        .await
    }
}
