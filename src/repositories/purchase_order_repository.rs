use async_trait::async_trait;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::errors::ServiceError;
use crate::models::{
    location_entity, product_entity, product_variant_entity, purchase_order_entity,
    purchase_order_item_entity, supplier_entity,
};

/// A purchase order with its supplier, location and lines joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderDetails {
    #[serde(flatten)]
    pub order: purchase_order_entity::Model,
    pub supplier: Option<supplier_entity::Model>,
    pub location: Option<location_entity::Model>,
    pub items: Vec<PurchaseOrderLineDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLineDetails {
    #[serde(flatten)]
    pub item: purchase_order_item_entity::Model,
    pub product: Option<product_entity::Model>,
    pub variant: Option<product_variant_entity::Model>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptProgress {
    pub ordered: i64,
    pub received: i64,
    pub remaining: i64,
}

impl PurchaseOrderDetails {
    pub fn id(&self) -> i64 {
        self.order.id
    }

    pub fn item(&self, item_id: i64) -> Option<&purchase_order_item_entity::Model> {
        self.items
            .iter()
            .map(|line| &line.item)
            .find(|item| item.id == item_id)
    }

    pub fn receipt_progress(&self) -> ReceiptProgress {
        self.items
            .iter()
            .fold(ReceiptProgress::default(), |mut acc, line| {
                acc.ordered += i64::from(line.item.quantity_ordered);
                acc.received += i64::from(line.item.quantity_received);
                acc.remaining += i64::from(line.item.quantity_outstanding());
                acc
            })
    }

    /// True when the order has lines and every line is fully received.
    pub fn is_fully_received(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|line| line.item.is_fully_received())
    }

    /// Text the listing search runs against.
    pub(crate) fn search_haystacks(&self) -> impl Iterator<Item = &str> {
        [
            self.order.internal_reference.as_deref(),
            self.order.supplier_reference.as_deref(),
            self.order.notes.as_deref(),
            self.supplier.as_ref().map(|s| s.name.as_str()),
        ]
        .into_iter()
        .flatten()
    }
}

/// Eager loading of the relations every purchase order read returns.
///
/// Implemented for any sea-orm connection, so the engine hydrates inside its own transaction
/// and the query side hydrates against the pool.
#[async_trait]
pub trait PurchaseOrderRepository {
    /// Loads relations for a batch of orders with one query per relation. Input order is kept.
    async fn hydrate(
        &self,
        orders: Vec<purchase_order_entity::Model>,
    ) -> Result<Vec<PurchaseOrderDetails>, ServiceError>;

    async fn find_details(&self, id: i64) -> Result<Option<PurchaseOrderDetails>, ServiceError>;
}

#[async_trait]
impl<C> PurchaseOrderRepository for C
where
    C: ConnectionTrait + Send + Sync,
{
    async fn hydrate(
        &self,
        orders: Vec<purchase_order_entity::Model>,
    ) -> Result<Vec<PurchaseOrderDetails>, ServiceError> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let supplier_ids: BTreeSet<i64> = orders.iter().map(|o| o.supplier_id).collect();
        let location_ids: BTreeSet<i64> = orders.iter().map(|o| o.location_id).collect();

        let suppliers: HashMap<i64, supplier_entity::Model> = supplier_entity::Entity::find()
            .filter(supplier_entity::Column::Id.is_in(supplier_ids))
            .all(self)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let locations: HashMap<i64, location_entity::Model> = location_entity::Entity::find()
            .filter(location_entity::Column::Id.is_in(location_ids))
            .all(self)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let items = purchase_order_item_entity::Entity::find()
            .filter(purchase_order_item_entity::Column::PurchaseOrderId.is_in(order_ids))
            .order_by_asc(purchase_order_item_entity::Column::Id)
            .all(self)
            .await
            .map_err(ServiceError::db_error)?;

        let product_ids: BTreeSet<i64> = items.iter().map(|i| i.product_id).collect();
        let variant_ids: BTreeSet<i64> = items.iter().filter_map(|i| i.product_variant_id).collect();

        let products: HashMap<i64, product_entity::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            product_entity::Entity::find()
                .filter(product_entity::Column::Id.is_in(product_ids))
                .all(self)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let variants: HashMap<i64, product_variant_entity::Model> = if variant_ids.is_empty() {
            HashMap::new()
        } else {
            product_variant_entity::Entity::find()
                .filter(product_variant_entity::Column::Id.is_in(variant_ids))
                .all(self)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|v| (v.id, v))
                .collect()
        };

        let mut lines_by_order: HashMap<i64, Vec<PurchaseOrderLineDetails>> = HashMap::new();
        for item in items {
            let line = PurchaseOrderLineDetails {
                product: products.get(&item.product_id).cloned(),
                variant: item
                    .product_variant_id
                    .and_then(|id| variants.get(&id).cloned()),
                item,
            };
            lines_by_order
                .entry(line.item.purchase_order_id)
                .or_default()
                .push(line);
        }

        Ok(orders
            .into_iter()
            .map(|order| PurchaseOrderDetails {
                supplier: suppliers.get(&order.supplier_id).cloned(),
                location: locations.get(&order.location_id).cloned(),
                items: lines_by_order.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    async fn find_details(&self, id: i64) -> Result<Option<PurchaseOrderDetails>, ServiceError> {
        let order = purchase_order_entity::Entity::find_by_id(id)
            .one(self)
            .await
            .map_err(ServiceError::db_error)?;

        match order {
            Some(order) => Ok(self.hydrate(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }
}
