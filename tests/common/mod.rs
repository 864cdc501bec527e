#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use procurement_ledger::{
    config::EngineConfig,
    context::RequestContext,
    db::{self, DbConfig},
    dto::{CreatePurchaseOrderInput, PurchaseOrderItemInput},
    models::{
        location_entity, product_entity, product_variant_entity, store_entity, supplier_entity,
        ProductState,
    },
    repositories::PurchaseOrderDetails,
    services::{PurchaseOrderService, StockKey, StockLedger},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tempfile::TempDir;

pub const ORG: i64 = 1;
pub const OTHER_ORG: i64 = 2;
pub const USER: i64 = 77;

/// Ids seeded into every fresh database.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub store_id: i64,
    pub location_id: i64,
    /// Location of `ORG` with no store of its own.
    pub storeless_location_id: i64,
    pub supplier_id: i64,
    pub second_supplier_id: i64,
    pub product_id: i64,
    pub second_product_id: i64,
    pub variant_id: i64,
    pub other_org_location_id: i64,
    pub other_org_supplier_id: i64,
}

/// Engine backed by a fresh in-memory SQLite database with the real migrations applied.
pub struct TestEngine {
    pub db: Arc<DatabaseConnection>,
    pub service: PurchaseOrderService,
    pub ledger: StockLedger,
    pub fx: Fixture,
    _dir: Option<TempDir>,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        Self::assemble(empty_database().await, config, None).await
    }

    /// Engine on a SQLite file with a multi-connection pool, so transactions from
    /// different tasks really overlap.
    pub async fn on_disk(config: EngineConfig) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
        let pool = db::establish_connection_with_config(&DbConfig {
            url,
            max_connections: 4,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("failed to open file database");
        db::run_migrations(&pool).await.expect("migrations");
        Self::assemble(pool, config, Some(dir)).await
    }

    async fn assemble(pool: DatabaseConnection, config: EngineConfig, dir: Option<TempDir>) -> Self {
        let db = Arc::new(pool);
        let fx = seed(&db).await;
        Self {
            service: PurchaseOrderService::new(db.clone(), config),
            ledger: StockLedger::new(db.clone()),
            db,
            fx,
            _dir: dir,
        }
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(ORG, Some(USER))
    }

    pub fn key(&self, product_id: i64) -> StockKey {
        StockKey::new(product_id, None, self.fx.location_id)
    }

    pub fn order_input(&self, items: Vec<PurchaseOrderItemInput>) -> CreatePurchaseOrderInput {
        CreatePurchaseOrderInput {
            supplier_id: self.fx.supplier_id,
            location_id: self.fx.location_id,
            items,
            ..Default::default()
        }
    }

    /// Draft order for `quantity` units of the seeded product at 5.00 each.
    pub async fn order_for(&self, quantity: i32) -> PurchaseOrderDetails {
        self.service
            .create(
                &self.ctx(),
                self.order_input(vec![PurchaseOrderItemInput::for_product(
                    self.fx.product_id,
                    quantity,
                    Decimal::new(500, 2),
                )]),
            )
            .await
            .expect("create purchase order")
    }

    pub async fn on_hand(&self, product_id: i64) -> i32 {
        self.ledger
            .stock_level(self.key(product_id))
            .await
            .expect("stock level")
            .map(|level| level.quantity_on_hand)
            .unwrap_or(0)
    }

    pub async fn count<E>(&self, _entity: E) -> u64
    where
        E: EntityTrait,
        E::Model: Sync,
    {
        E::find().count(self.db.as_ref()).await.expect("count rows")
    }
}

pub async fn empty_database() -> DatabaseConnection {
    let pool = db::establish_connection_with_config(&DbConfig::sqlite_in_memory())
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool).await.expect("migrations");
    db::check_connection(&pool).await.expect("ping test database");
    pool
}

async fn seed(db: &DatabaseConnection) -> Fixture {
    let store_id = insert_store(db, ORG, "Main store").await;
    let location_id = insert_location(db, ORG, Some(store_id), "Central warehouse").await;
    let storeless_location_id = insert_location(db, ORG, None, "Overflow yard").await;
    let supplier_id = insert_supplier(db, ORG, "Acme Components").await;
    let second_supplier_id = insert_supplier(db, ORG, "Globex Supply").await;
    let product_id = insert_product(db, store_id, "Bolt", "bolt", "BOLT-1").await;
    let second_product_id = insert_product(db, store_id, "Nut", "nut", "NUT-1").await;
    let variant_id = insert_variant(db, product_id, "Bolt M8", "BOLT-1-M8").await;

    let other_store_id = insert_store(db, OTHER_ORG, "Elsewhere store").await;
    let other_org_location_id =
        insert_location(db, OTHER_ORG, Some(other_store_id), "Elsewhere warehouse").await;
    let other_org_supplier_id = insert_supplier(db, OTHER_ORG, "Elsewhere Supplier").await;

    Fixture {
        store_id,
        location_id,
        storeless_location_id,
        supplier_id,
        second_supplier_id,
        product_id,
        second_product_id,
        variant_id,
        other_org_location_id,
        other_org_supplier_id,
    }
}

pub async fn insert_store(db: &DatabaseConnection, organization_id: i64, name: &str) -> i64 {
    store_entity::ActiveModel {
        organization_id: Set(organization_id),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert store")
    .id
}

pub async fn insert_location(
    db: &DatabaseConnection,
    organization_id: i64,
    store_id: Option<i64>,
    name: &str,
) -> i64 {
    location_entity::ActiveModel {
        organization_id: Set(organization_id),
        store_id: Set(store_id),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert location")
    .id
}

pub async fn insert_supplier(db: &DatabaseConnection, organization_id: i64, name: &str) -> i64 {
    supplier_entity::ActiveModel {
        organization_id: Set(organization_id),
        name: Set(name.to_string()),
        email: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert supplier")
    .id
}

pub async fn insert_product(
    db: &DatabaseConnection,
    store_id: i64,
    name: &str,
    slug: &str,
    sku: &str,
) -> i64 {
    let now = Utc::now();
    product_entity::ActiveModel {
        store_id: Set(store_id),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        sku: Set(sku.to_string()),
        description: Set(None),
        base_price: Set(Decimal::new(999, 2)),
        stock_quantity: Set(0),
        state: Set(ProductState::Active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert product")
    .id
}

pub async fn insert_variant(
    db: &DatabaseConnection,
    product_id: i64,
    name: &str,
    sku: &str,
) -> i64 {
    product_variant_entity::ActiveModel {
        product_id: Set(product_id),
        name: Set(name.to_string()),
        sku: Set(sku.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert variant")
    .id
}
