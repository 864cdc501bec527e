use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::db::with_transaction;
use crate::errors::ServiceError;
use crate::models::{
    inventory_movement_entity, stock_level_entity, MovementType, SourceOrderType,
};

/// Natural key of a stock level. The variant leg may be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub location_id: i64,
}

impl StockKey {
    pub fn new(product_id: i64, product_variant_id: Option<i64>, location_id: i64) -> Self {
        Self {
            product_id,
            product_variant_id,
            location_id,
        }
    }
}

/// On-hand after applying `delta`, floored at zero.
pub fn clamp_on_hand(current: i32, delta: i32) -> i32 {
    current.saturating_add(delta).max(0)
}

/// A movement about to be appended to the ledger. `quantity` is positive; the direction
/// comes from `movement_type`.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub organization_id: i64,
    pub key: StockKey,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub source_order_type: SourceOrderType,
    pub source_order_id: i64,
    pub reason: Option<String>,
    pub created_by_user_id: Option<i64>,
}

/// Owns `stock_levels` and appends to `inventory_movements`.
///
/// Nothing else in the crate writes either table. The `*_in` functions take any connection so
/// callers can fold ledger writes into their own transaction.
#[derive(Clone)]
pub struct StockLedger {
    db_pool: Arc<DatabaseConnection>,
}

impl StockLedger {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    /// Applies `delta` to the level for `key` in a transaction of its own.
    #[instrument(skip(self))]
    pub async fn apply_delta(
        &self,
        key: StockKey,
        delta: i32,
    ) -> Result<stock_level_entity::Model, ServiceError> {
        with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move { Self::apply_delta_in(txn, key, delta).await })
        })
        .await
    }

    /// Current level for `key`, if any movement ever touched it.
    #[instrument(skip(self))]
    pub async fn stock_level(
        &self,
        key: StockKey,
    ) -> Result<Option<stock_level_entity::Model>, ServiceError> {
        Self::find_level(self.db_pool.as_ref(), &key, false).await
    }

    /// Movements posted by a purchase order, oldest first.
    #[instrument(skip(self))]
    pub async fn movements_for_order(
        &self,
        purchase_order_id: i64,
    ) -> Result<Vec<inventory_movement_entity::Model>, ServiceError> {
        Self::movements_for_order_in(self.db_pool.as_ref(), purchase_order_id).await
    }

    pub async fn movements_for_order_in<C>(
        conn: &C,
        purchase_order_id: i64,
    ) -> Result<Vec<inventory_movement_entity::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        inventory_movement_entity::Entity::find()
            .filter(
                inventory_movement_entity::Column::SourceOrderType.eq(SourceOrderType::Purchase),
            )
            .filter(inventory_movement_entity::Column::SourceOrderId.eq(purchase_order_id))
            .order_by_asc(inventory_movement_entity::Column::Id)
            .all(conn)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Net quantity a purchase order has put into each stock key so far: its `stock_in`
    /// movements minus its `stock_out` movements. Keys are in first-movement order.
    pub async fn net_posted_for_order_in<C>(
        conn: &C,
        purchase_order_id: i64,
    ) -> Result<Vec<(StockKey, i32)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut net: Vec<(StockKey, i32)> = Vec::new();
        for movement in Self::movements_for_order_in(conn, purchase_order_id).await? {
            let Some(location_id) = movement.location_id() else {
                continue;
            };
            let key = StockKey::new(movement.product_id, movement.product_variant_id, location_id);
            let signed = movement.movement_type.signed(movement.quantity);
            match net.iter_mut().find(|(seen, _)| *seen == key) {
                Some((_, total)) => *total += signed,
                None => net.push((key, signed)),
            }
        }
        Ok(net)
    }

    /// First-match lookup of the level for `key`. On Postgres the row is locked when `lock` is
    /// set.
    pub async fn find_level<C>(
        conn: &C,
        key: &StockKey,
        lock: bool,
    ) -> Result<Option<stock_level_entity::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut query = stock_level_entity::Entity::find()
            .filter(stock_level_entity::Column::ProductId.eq(key.product_id))
            .filter(stock_level_entity::Column::LocationId.eq(key.location_id));

        query = match key.product_variant_id {
            Some(variant_id) => {
                query.filter(stock_level_entity::Column::ProductVariantId.eq(variant_id))
            }
            None => query.filter(stock_level_entity::Column::ProductVariantId.is_null()),
        };

        if lock && conn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }

        query
            .order_by_asc(stock_level_entity::Column::Id)
            .one(conn)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Applies `delta` to the level for `key`, creating the level on first touch.
    ///
    /// On-hand never goes below zero; an outbound delta larger than the stock simply empties
    /// it. Reserved is left alone. Not idempotent: each call applies its delta.
    pub async fn apply_delta_in<C>(
        conn: &C,
        key: StockKey,
        delta: i32,
    ) -> Result<stock_level_entity::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();

        match Self::find_level(conn, &key, true).await? {
            Some(level) => {
                let on_hand = clamp_on_hand(level.quantity_on_hand, delta);
                if i64::from(level.quantity_on_hand) + i64::from(delta) < 0 {
                    debug!(
                        stock_level_id = level.id,
                        on_hand = level.quantity_on_hand,
                        delta,
                        "Outbound delta exceeds stock on hand; clamping at zero"
                    );
                }

                let mut active: stock_level_entity::ActiveModel = level.into();
                active.quantity_on_hand = Set(on_hand);
                active.updated_at = Set(now);
                active.update(conn).await.map_err(ServiceError::db_error)
            }
            None => {
                let level = stock_level_entity::ActiveModel {
                    product_id: Set(key.product_id),
                    product_variant_id: Set(key.product_variant_id),
                    location_id: Set(key.location_id),
                    quantity_on_hand: Set(delta.max(0)),
                    quantity_reserved: Set(0),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                level.insert(conn).await.map_err(ServiceError::db_error)
            }
        }
    }

    /// Appends a movement and applies its signed quantity to the matching stock level.
    pub async fn record_movement_in<C>(
        conn: &C,
        movement: NewMovement,
    ) -> Result<(inventory_movement_entity::Model, stock_level_entity::Model), ServiceError>
    where
        C: ConnectionTrait,
    {
        if movement.quantity <= 0 {
            return Err(ServiceError::invalid_request(format!(
                "Movement quantity must be positive, got {}",
                movement.quantity
            )));
        }

        let (from_location_id, to_location_id) = match movement.movement_type {
            MovementType::StockIn => (None, Some(movement.key.location_id)),
            MovementType::StockOut => (Some(movement.key.location_id), None),
        };

        let row = inventory_movement_entity::ActiveModel {
            organization_id: Set(movement.organization_id),
            product_id: Set(movement.key.product_id),
            product_variant_id: Set(movement.key.product_variant_id),
            from_location_id: Set(from_location_id),
            to_location_id: Set(to_location_id),
            quantity: Set(movement.quantity),
            movement_type: Set(movement.movement_type),
            source_order_type: Set(movement.source_order_type),
            source_order_id: Set(movement.source_order_id),
            reason: Set(movement.reason),
            created_by_user_id: Set(movement.created_by_user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;

        let level = Self::apply_delta_in(
            conn,
            movement.key,
            movement.movement_type.signed(movement.quantity),
        )
        .await?;

        counter!("procurement.inventory_movements.appended", 1);
        debug!(
            movement_id = row.id,
            product_id = row.product_id,
            movement_type = %row.movement_type,
            quantity = row.quantity,
            on_hand = level.quantity_on_hand,
            "Inventory movement recorded"
        );

        Ok((row, level))
    }
}
