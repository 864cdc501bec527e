use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::db::with_transaction;
use crate::dto::{
    CreatePurchaseOrderInput, PurchaseOrderFilter, PurchaseOrderItemInput, ReceiptLineOutcome,
    ReceiptOutcome, ReceiveItemInput, UpdatePurchaseOrderInput,
};
use crate::errors::ServiceError;
use crate::models::{
    location_entity, purchase_order_entity, purchase_order_item_entity, supplier_entity,
    MovementType, PurchaseOrderStatus, SourceOrderType,
};
use crate::queries::purchase_order_queries::{
    GetPurchaseOrderQuery, ListPendingPurchaseOrdersQuery, ListPurchaseOrdersQuery, Query,
};
use crate::repositories::{PurchaseOrderDetails, PurchaseOrderRepository};
use crate::services::order_locks::OrderLocks;
use crate::services::order_numbers::next_order_number;
use crate::services::product_resolver::ProductResolver;
use crate::services::stock_ledger::{NewMovement, StockKey, StockLedger};

const CANCEL_REVERSAL_REASON: &str = "purchase order cancelled";

/// Money fields of an order. `total = subtotal - discount + tax + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Subtotal is `sum(quantity * unit_price)`; line-level discount and tax are informational.
    pub fn compute<I>(lines: I, discount: Decimal, tax: Decimal, shipping: Decimal) -> Self
    where
        I: IntoIterator<Item = (i32, Decimal)>,
    {
        let subtotal = lines
            .into_iter()
            .map(|(quantity, unit_price)| Decimal::from(quantity) * unit_price)
            .sum();
        Self::with_subtotal(subtotal, discount, tax, shipping)
    }

    pub fn with_subtotal(
        subtotal: Decimal,
        discount: Decimal,
        tax: Decimal,
        shipping: Decimal,
    ) -> Self {
        Self {
            subtotal,
            discount,
            tax,
            shipping,
            total: subtotal - discount + tax + shipping,
        }
    }

    fn of_lines(
        items: &[PurchaseOrderItemInput],
        discount: Decimal,
        tax: Decimal,
        shipping: Decimal,
    ) -> Self {
        Self::compute(
            items.iter().map(|item| (item.quantity, item.unit_price)),
            discount,
            tax,
            shipping,
        )
    }

    fn ensure_non_negative(&self) -> Result<(), ServiceError> {
        if self.total < Decimal::ZERO {
            return Err(ServiceError::invalid_request(format!(
                "Discount {} exceeds order value {}",
                self.discount,
                self.subtotal + self.tax + self.shipping
            )));
        }
        Ok(())
    }
}

/// Purchase order lifecycle: create, update, approve, cancel, receive, remove.
///
/// Every write runs in one transaction. Receive and Cancel additionally hold the per-order
/// lock and, on Postgres, `FOR UPDATE` on the order row.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DatabaseConnection>,
    config: EngineConfig,
    locks: OrderLocks,
}

impl PurchaseOrderService {
    pub fn new(db_pool: Arc<DatabaseConnection>, config: EngineConfig) -> Self {
        Self {
            db_pool,
            config,
            locks: OrderLocks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stock_ledger(&self) -> StockLedger {
        StockLedger::new(self.db_pool.clone())
    }

    /// Creates an order in `draft` (or the requested status), resolving ad-hoc products.
    #[instrument(
        skip(self, input),
        fields(supplier_id = input.supplier_id, location_id = input.location_id)
    )]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: CreatePurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.validate()?;
        for item in &input.items {
            item.validate()?;
        }
        let organization_id = ctx.require_organization()?;
        let user_id = ctx.user_id;

        let order = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                ensure_location(txn, organization_id, input.location_id).await?;
                ensure_supplier(txn, organization_id, input.supplier_id).await?;

                let totals = OrderTotals::of_lines(
                    &input.items,
                    input.discount_amount.unwrap_or_default(),
                    input.tax_amount.unwrap_or_default(),
                    input.shipping_cost.unwrap_or_default(),
                );
                totals.ensure_non_negative()?;

                let mut resolver = ProductResolver::new(organization_id, input.location_id);
                let mut product_ids = Vec::with_capacity(input.items.len());
                for item in &input.items {
                    product_ids.push(resolver.resolve(txn, item).await?);
                }

                let now = Utc::now();
                let order_number = next_order_number(txn, now).await?;

                let order = purchase_order_entity::ActiveModel {
                    organization_id: Set(organization_id),
                    order_number: Set(order_number),
                    supplier_id: Set(input.supplier_id),
                    location_id: Set(input.location_id),
                    status: Set(input.status.unwrap_or_default()),
                    internal_reference: Set(input.internal_reference),
                    supplier_reference: Set(input.supplier_reference),
                    notes: Set(input.notes),
                    subtotal_amount: Set(totals.subtotal),
                    discount_amount: Set(totals.discount),
                    tax_amount: Set(totals.tax),
                    shipping_cost: Set(totals.shipping),
                    total_amount: Set(totals.total),
                    order_date: Set(now),
                    expected_delivery_date: Set(input.expected_delivery_date),
                    approved_date: Set(None),
                    cancelled_date: Set(None),
                    received_date: Set(None),
                    created_by_user_id: Set(user_id),
                    approved_by_user_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(ServiceError::db_error)?;

                insert_items(txn, order.id, &input.items, &product_ids).await?;
                Ok(order)
            })
        })
        .await?;

        counter!("procurement.purchase_orders.created", 1);
        info!(
            purchase_order_id = order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "Purchase order created"
        );

        self.hydrate(order).await
    }

    /// Applies the supplied fields. Replacement items recompute the subtotal; any money change
    /// recomputes the total.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdatePurchaseOrderInput,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        input.validate()?;
        if let Some(items) = &input.items {
            if items.is_empty() {
                return Err(ServiceError::invalid_request(
                    "Replacement items must contain at least one line",
                ));
            }
            for item in items {
                item.validate()?;
            }
        }
        let scope = ctx.organization_id;
        let config = self.config;

        let order = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let order = load_order(txn, id, scope, true).await?;
                ensure_mutable(&config, &order, "update")?;

                let organization_id = order.organization_id;
                let location_id = input.location_id.unwrap_or(order.location_id);
                if let Some(location_id) = input.location_id {
                    ensure_location(txn, organization_id, location_id).await?;
                }
                if let Some(supplier_id) = input.supplier_id {
                    ensure_supplier(txn, organization_id, supplier_id).await?;
                }

                let discount = input.discount_amount.unwrap_or(order.discount_amount);
                let tax = input.tax_amount.unwrap_or(order.tax_amount);
                let shipping = input.shipping_cost.unwrap_or(order.shipping_cost);
                let totals = match &input.items {
                    Some(items) => OrderTotals::of_lines(items, discount, tax, shipping),
                    None => {
                        OrderTotals::with_subtotal(order.subtotal_amount, discount, tax, shipping)
                    }
                };
                if input.touches_money() {
                    totals.ensure_non_negative()?;
                }

                if let Some(items) = &input.items {
                    purchase_order_item_entity::Entity::delete_many()
                        .filter(purchase_order_item_entity::Column::PurchaseOrderId.eq(id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut resolver = ProductResolver::new(organization_id, location_id);
                    let mut product_ids = Vec::with_capacity(items.len());
                    for item in items {
                        product_ids.push(resolver.resolve(txn, item).await?);
                    }
                    insert_items(txn, id, items, &product_ids).await?;
                }

                let touches_money = input.touches_money();
                let mut active: purchase_order_entity::ActiveModel = order.into();
                if let Some(supplier_id) = input.supplier_id {
                    active.supplier_id = Set(supplier_id);
                }
                if input.location_id.is_some() {
                    active.location_id = Set(location_id);
                }
                if let Some(status) = input.status {
                    active.status = Set(status);
                }
                if let Some(reference) = input.internal_reference {
                    active.internal_reference = Set(Some(reference));
                }
                if let Some(reference) = input.supplier_reference {
                    active.supplier_reference = Set(Some(reference));
                }
                if let Some(notes) = input.notes {
                    active.notes = Set(Some(notes));
                }
                if let Some(date) = input.expected_delivery_date {
                    active.expected_delivery_date = Set(Some(date));
                }
                if touches_money {
                    active.subtotal_amount = Set(totals.subtotal);
                    active.discount_amount = Set(totals.discount);
                    active.tax_amount = Set(totals.tax);
                    active.shipping_cost = Set(totals.shipping);
                    active.total_amount = Set(totals.total);
                }
                active.updated_at = Set(Utc::now());

                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await?;

        info!(purchase_order_id = order.id, "Purchase order updated");
        self.hydrate(order).await
    }

    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let scope = ctx.organization_id;
        let user_id = ctx.user_id;
        let config = self.config;

        let order = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let order = load_order(txn, id, scope, true).await?;
                ensure_mutable(&config, &order, "approve")?;

                let now = Utc::now();
                let mut active: purchase_order_entity::ActiveModel = order.into();
                active.status = Set(PurchaseOrderStatus::Approved);
                active.approved_date = Set(Some(now));
                active.approved_by_user_id = Set(user_id);
                active.updated_at = Set(now);
                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await?;

        info!(purchase_order_id = order.id, "Purchase order approved");
        self.hydrate(order).await
    }

    /// Moves the order to `cancelled`. Received stock stays put unless
    /// `engine.reverse_on_cancel` is set, in which case whatever the order still has on the
    /// ledger (its `stock_in` minus earlier reversals, per stock key) is posted back out as
    /// `stock_out`.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let scope = ctx.organization_id;
        let user_id = ctx.user_id;
        let config = self.config;

        let guard = self.locks.acquire(id).await;
        let (order, reversed) = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let order = load_order(txn, id, scope, true).await?;
                ensure_mutable(&config, &order, "cancel")?;

                let mut reversed = 0usize;
                if config.reverse_on_cancel {
                    let outstanding = StockLedger::net_posted_for_order_in(txn, order.id).await?;
                    for (key, quantity) in outstanding.into_iter().filter(|(_, net)| *net > 0) {
                        StockLedger::record_movement_in(
                            txn,
                            NewMovement {
                                organization_id: order.organization_id,
                                key,
                                movement_type: MovementType::StockOut,
                                quantity,
                                source_order_type: SourceOrderType::Purchase,
                                source_order_id: order.id,
                                reason: Some(CANCEL_REVERSAL_REASON.to_string()),
                                created_by_user_id: user_id,
                            },
                        )
                        .await?;
                        reversed += 1;
                    }
                }

                let now = Utc::now();
                let mut active: purchase_order_entity::ActiveModel = order.into();
                active.status = Set(PurchaseOrderStatus::Cancelled);
                active.cancelled_date = Set(Some(now));
                active.updated_at = Set(now);
                let order = active.update(txn).await.map_err(ServiceError::db_error)?;
                Ok((order, reversed))
            })
        })
        .await?;
        drop(guard);

        info!(
            purchase_order_id = order.id,
            reversed_keys = reversed,
            "Purchase order cancelled"
        );
        self.hydrate(order).await
    }

    /// Records arriving goods.
    ///
    /// Each line's `quantity_received` is advanced with an atomic increment, capped at the
    /// outstanding quantity when `engine.clamp_over_receipt` is on. Every applied quantity is
    /// posted as a `stock_in` movement into the order's location. The order flips to
    /// `received` once every line is complete in the stored state; a `cancelled` order stays
    /// cancelled.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn receive(
        &self,
        ctx: &RequestContext,
        id: i64,
        items: Vec<ReceiveItemInput>,
    ) -> Result<ReceiptOutcome, ServiceError> {
        if let Some(bad) = items.iter().find(|item| item.quantity_received < 0) {
            return Err(ServiceError::invalid_request(format!(
                "Quantity received for item {} must not be negative, got {}",
                bad.id, bad.quantity_received
            )));
        }
        let scope = ctx.organization_id;
        let user_id = ctx.user_id;
        let config = self.config;

        let guard = self.locks.acquire(id).await;
        let (order, lines, movements) = with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let order = load_order(txn, id, scope, true).await?;
                ensure_mutable(&config, &order, "receive")?;

                let mut received: HashMap<i64, (i32, i32)> = load_items(txn, order.id)
                    .await?
                    .into_iter()
                    .map(|item| (item.id, (item.quantity_ordered, item.quantity_received)))
                    .collect();

                let mut lines = Vec::with_capacity(items.len());
                for request in &items {
                    let (ordered, so_far) = received.get_mut(&request.id).ok_or_else(|| {
                        ServiceError::not_found(format!(
                            "Purchase order item {} not found on purchase order {}",
                            request.id, id
                        ))
                    })?;

                    let applied = if config.clamp_over_receipt {
                        request.quantity_received.min((*ordered - *so_far).max(0))
                    } else {
                        request.quantity_received
                    };
                    let outcome = ReceiptLineOutcome {
                        item_id: request.id,
                        requested: request.quantity_received,
                        applied,
                        rejected: request.quantity_received - applied,
                    };

                    if applied > 0 {
                        purchase_order_item_entity::Entity::update_many()
                            .col_expr(
                                purchase_order_item_entity::Column::QuantityReceived,
                                Expr::col(purchase_order_item_entity::Column::QuantityReceived)
                                    .add(applied),
                            )
                            .col_expr(
                                purchase_order_item_entity::Column::UpdatedAt,
                                Expr::value(Utc::now()),
                            )
                            .filter(purchase_order_item_entity::Column::Id.eq(request.id))
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        *so_far += applied;
                    }
                    if outcome.was_clamped() {
                        counter!("procurement.receipts.over_receipt_clamped", 1);
                        warn!(
                            purchase_order_id = id,
                            item_id = request.id,
                            requested = outcome.requested,
                            applied = outcome.applied,
                            "Receipt exceeds outstanding quantity; excess rejected"
                        );
                    }
                    lines.push(outcome);
                }

                let fresh = load_items(txn, order.id).await?;
                let by_id: HashMap<i64, &purchase_order_item_entity::Model> =
                    fresh.iter().map(|item| (item.id, item)).collect();

                let mut movements = Vec::new();
                for line in lines.iter().filter(|line| line.applied > 0) {
                    let item = by_id.get(&line.item_id).ok_or_else(|| {
                        ServiceError::not_found(format!(
                            "Purchase order item {} not found on purchase order {}",
                            line.item_id, id
                        ))
                    })?;
                    let (movement, _) = StockLedger::record_movement_in(
                        txn,
                        NewMovement {
                            organization_id: order.organization_id,
                            key: StockKey::new(
                                item.product_id,
                                item.product_variant_id,
                                order.location_id,
                            ),
                            movement_type: MovementType::StockIn,
                            quantity: line.applied,
                            source_order_type: SourceOrderType::Purchase,
                            source_order_id: order.id,
                            reason: Some(format!(
                                "Received against purchase order {}",
                                order.order_number
                            )),
                            created_by_user_id: user_id,
                        },
                    )
                    .await?;
                    movements.push(movement);
                }

                let all_received =
                    !fresh.is_empty() && fresh.iter().all(|item| item.is_fully_received());
                let becomes_received = all_received
                    && !matches!(
                        order.status,
                        PurchaseOrderStatus::Received | PurchaseOrderStatus::Cancelled
                    );

                let now = Utc::now();
                let mut active: purchase_order_entity::ActiveModel = order.into();
                if becomes_received {
                    active.status = Set(PurchaseOrderStatus::Received);
                    active.received_date = Set(Some(now));
                }
                active.updated_at = Set(now);
                let order = active.update(txn).await.map_err(ServiceError::db_error)?;

                Ok((order, lines, movements))
            })
        })
        .await?;
        drop(guard);

        counter!("procurement.receipts.posted", 1);
        info!(
            purchase_order_id = order.id,
            movements = movements.len(),
            status = %order.status,
            "Purchase order receipt posted"
        );

        Ok(ReceiptOutcome {
            order: self.hydrate(order).await?,
            lines,
            movements,
        })
    }

    /// Hard delete of the order and its lines. Posted movements and stock levels stay.
    #[instrument(skip(self))]
    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> Result<(), ServiceError> {
        let scope = ctx.organization_id;

        with_transaction(self.db_pool.as_ref(), move |txn| {
            Box::pin(async move {
                let order = load_order(txn, id, scope, true).await?;
                purchase_order_item_entity::Entity::delete_many()
                    .filter(purchase_order_item_entity::Column::PurchaseOrderId.eq(order.id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                purchase_order_entity::Entity::delete_by_id(order.id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                Ok(())
            })
        })
        .await?;

        warn!(purchase_order_id = id, "Purchase order removed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_one(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        GetPurchaseOrderQuery {
            organization_id: ctx.organization_id,
            purchase_order_id: id,
        }
        .execute(self.db_pool.as_ref())
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Purchase order {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        ctx: &RequestContext,
        filter: PurchaseOrderFilter,
    ) -> Result<Vec<PurchaseOrderDetails>, ServiceError> {
        ListPurchaseOrdersQuery {
            organization_id: ctx.organization_id,
            filter,
        }
        .execute(self.db_pool.as_ref())
        .await
    }

    /// Orders awaiting receipt, i.e. `approved`.
    #[instrument(skip(self))]
    pub async fn find_pending(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<PurchaseOrderDetails>, ServiceError> {
        ListPendingPurchaseOrdersQuery {
            organization_id: ctx.organization_id,
        }
        .execute(self.db_pool.as_ref())
        .await
    }

    async fn hydrate(
        &self,
        order: purchase_order_entity::Model,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let id = order.id;
        self.db_pool
            .hydrate(vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found(format!("Purchase order {} not found", id)))
    }
}

fn ensure_mutable(
    config: &EngineConfig,
    order: &purchase_order_entity::Model,
    action: &str,
) -> Result<(), ServiceError> {
    if config.enforce_terminal_states && order.status.is_terminal() {
        return Err(ServiceError::invalid_request(format!(
            "Cannot {} purchase order {}: status is {}",
            action, order.id, order.status
        )));
    }
    Ok(())
}

async fn load_order<C>(
    conn: &C,
    id: i64,
    organization_id: Option<i64>,
    lock: bool,
) -> Result<purchase_order_entity::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = purchase_order_entity::Entity::find_by_id(id);
    if let Some(organization_id) = organization_id {
        query = query.filter(purchase_order_entity::Column::OrganizationId.eq(organization_id));
    }
    if lock && conn.get_database_backend() == DbBackend::Postgres {
        query = query.lock_exclusive();
    }
    query
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("Purchase order {} not found", id)))
}

async fn load_items<C>(
    conn: &C,
    purchase_order_id: i64,
) -> Result<Vec<purchase_order_item_entity::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    purchase_order_item_entity::Entity::find()
        .filter(purchase_order_item_entity::Column::PurchaseOrderId.eq(purchase_order_id))
        .order_by_asc(purchase_order_item_entity::Column::Id)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

async fn ensure_location<C>(
    conn: &C,
    organization_id: i64,
    location_id: i64,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    location_entity::Entity::find_by_id(location_id)
        .filter(location_entity::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| {
            ServiceError::invalid_request(format!(
                "Location {} not found for organization {}",
                location_id, organization_id
            ))
        })
}

async fn ensure_supplier<C>(
    conn: &C,
    organization_id: i64,
    supplier_id: i64,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    supplier_entity::Entity::find_by_id(supplier_id)
        .filter(supplier_entity::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| {
            ServiceError::invalid_request(format!(
                "Supplier {} not found for organization {}",
                supplier_id, organization_id
            ))
        })
}

async fn insert_items<C>(
    conn: &C,
    purchase_order_id: i64,
    items: &[PurchaseOrderItemInput],
    product_ids: &[i64],
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    for (item, product_id) in items.iter().zip(product_ids) {
        purchase_order_item_entity::ActiveModel {
            purchase_order_id: Set(purchase_order_id),
            product_id: Set(*product_id),
            product_variant_id: Set(item.product_variant_id),
            quantity_ordered: Set(item.quantity),
            quantity_received: Set(0),
            unit_cost: Set(item.unit_price),
            discount_amount: Set(item.discount_amount.unwrap_or_default()),
            tax_amount: Set(item.tax_amount.unwrap_or_default()),
            batch_number: Set(item.batch_number.clone()),
            manufacturing_date: Set(item.manufacturing_date),
            expiration_date: Set(item.expiration_date),
            notes: Set(item.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(ServiceError::db_error)?;
    }
    Ok(())
}
