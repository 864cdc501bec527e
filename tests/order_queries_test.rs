mod common;

use chrono::{Duration, Utc};
use procurement_ledger::{
    context::RequestContext,
    dto::{CreatePurchaseOrderInput, PurchaseOrderFilter, PurchaseOrderItemInput},
    models::{purchase_order_entity, PurchaseOrderStatus},
    queries::{
        GetPurchaseOrderQuery, ListPendingPurchaseOrdersQuery, ListPurchaseOrdersQuery, Query,
    },
    repositories::PurchaseOrderDetails,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};

use common::{TestEngine, OTHER_ORG};

struct Catalog {
    engine: TestEngine,
    /// Acme, central warehouse, total 10.00, internal reference `REF-Alpha`.
    alpha: PurchaseOrderDetails,
    /// Globex, overflow yard, total 30.00, supplier reference `SUP-9`.
    globex: PurchaseOrderDetails,
    /// Acme, central warehouse, total 50.00, approved, notes `rush delivery`.
    rush: PurchaseOrderDetails,
    /// Belongs to the other organization.
    foreign: PurchaseOrderDetails,
}

impl Catalog {
    async fn seed() -> Self {
        let engine = TestEngine::new().await;
        let ctx = engine.ctx();

        let alpha = engine
            .service
            .create(
                &ctx,
                CreatePurchaseOrderInput {
                    internal_reference: Some("REF-Alpha".into()),
                    ..engine.order_input(vec![PurchaseOrderItemInput::for_product(
                        engine.fx.product_id,
                        2,
                        dec!(5.00),
                    )])
                },
            )
            .await
            .unwrap();

        let globex = engine
            .service
            .create(
                &ctx,
                CreatePurchaseOrderInput {
                    supplier_id: engine.fx.second_supplier_id,
                    location_id: engine.fx.storeless_location_id,
                    supplier_reference: Some("SUP-9".into()),
                    items: vec![PurchaseOrderItemInput::for_product(
                        engine.fx.second_product_id,
                        3,
                        dec!(10.00),
                    )],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let rush = engine
            .service
            .create(
                &ctx,
                CreatePurchaseOrderInput {
                    notes: Some("rush delivery".into()),
                    ..engine.order_input(vec![PurchaseOrderItemInput::for_product(
                        engine.fx.product_id,
                        10,
                        dec!(5.00),
                    )])
                },
            )
            .await
            .unwrap();
        let rush = engine.service.approve(&ctx, rush.id()).await.unwrap();

        let foreign_ctx = RequestContext::new(OTHER_ORG, None);
        let foreign = engine
            .service
            .create(
                &foreign_ctx,
                CreatePurchaseOrderInput {
                    supplier_id: engine.fx.other_org_supplier_id,
                    location_id: engine.fx.other_org_location_id,
                    internal_reference: Some("REF-Alpha".into()),
                    items: vec![PurchaseOrderItemInput::ad_hoc("Gasket", 1, dec!(2.00))],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        engine.service.approve(&foreign_ctx, foreign.id()).await.unwrap();

        Self {
            engine,
            alpha,
            globex,
            rush,
            foreign,
        }
    }

    async fn list(&self, filter: PurchaseOrderFilter) -> Vec<i64> {
        self.engine
            .service
            .find_all(&self.engine.ctx(), filter)
            .await
            .unwrap()
            .iter()
            .map(PurchaseOrderDetails::id)
            .collect()
    }
}

#[tokio::test]
async fn unfiltered_listing_is_newest_first_within_the_organization() {
    let catalog = Catalog::seed().await;

    let ids = catalog.list(PurchaseOrderFilter::default()).await;

    assert_eq!(
        ids,
        vec![catalog.rush.id(), catalog.globex.id(), catalog.alpha.id()]
    );
    assert!(!ids.contains(&catalog.foreign.id()));
}

#[tokio::test]
async fn listing_returns_hydrated_orders() {
    let catalog = Catalog::seed().await;

    let orders = catalog
        .engine
        .service
        .find_all(&catalog.engine.ctx(), PurchaseOrderFilter::default())
        .await
        .unwrap();
    let globex = orders
        .iter()
        .find(|order| order.id() == catalog.globex.id())
        .unwrap();

    assert_eq!(globex.supplier.as_ref().unwrap().name, "Globex Supply");
    assert_eq!(globex.location.as_ref().unwrap().name, "Overflow yard");
    assert_eq!(globex.items.len(), 1);
    assert_eq!(globex.items[0].product.as_ref().unwrap().name, "Nut");
    assert_eq!(globex.order.total_amount, dec!(30.00));
}

#[tokio::test]
async fn filters_by_supplier_location_and_status() {
    let catalog = Catalog::seed().await;
    let fx = catalog.engine.fx;

    let by_supplier = catalog
        .list(PurchaseOrderFilter {
            supplier_id: Some(fx.supplier_id),
            ..Default::default()
        })
        .await;
    assert_eq!(by_supplier, vec![catalog.rush.id(), catalog.alpha.id()]);

    let by_location = catalog
        .list(PurchaseOrderFilter {
            location_id: Some(fx.storeless_location_id),
            ..Default::default()
        })
        .await;
    assert_eq!(by_location, vec![catalog.globex.id()]);

    let drafts = catalog
        .list(PurchaseOrderFilter {
            status: Some(PurchaseOrderStatus::Draft),
            ..Default::default()
        })
        .await;
    assert_eq!(drafts, vec![catalog.globex.id(), catalog.alpha.id()]);
}

#[tokio::test]
async fn store_filter_goes_through_the_order_location() {
    let catalog = Catalog::seed().await;

    let in_store = catalog
        .list(PurchaseOrderFilter {
            store_id: Some(catalog.engine.fx.store_id),
            ..Default::default()
        })
        .await;

    // The overflow yard has no store, so the Globex order never matches a store filter.
    assert_eq!(in_store, vec![catalog.rush.id(), catalog.alpha.id()]);
}

#[tokio::test]
async fn filters_by_total_range() {
    let catalog = Catalog::seed().await;

    let mid = catalog
        .list(PurchaseOrderFilter {
            min_total: Some(dec!(10.00)),
            max_total: Some(dec!(30.00)),
            ..Default::default()
        })
        .await;
    assert_eq!(mid, vec![catalog.globex.id(), catalog.alpha.id()]);

    let large = catalog
        .list(PurchaseOrderFilter {
            min_total: Some(dec!(31)),
            ..Default::default()
        })
        .await;
    assert_eq!(large, vec![catalog.rush.id()]);
}

#[tokio::test]
async fn filters_by_order_date_window() {
    let catalog = Catalog::seed().await;
    let now = Utc::now();

    let mut backdated: purchase_order_entity::ActiveModel = catalog.alpha.order.clone().into();
    backdated.order_date = Set(now - Duration::days(30));
    backdated.update(catalog.engine.db.as_ref()).await.unwrap();

    let recent = catalog
        .list(PurchaseOrderFilter {
            start_date: Some(now - Duration::days(1)),
            ..Default::default()
        })
        .await;
    assert_eq!(recent, vec![catalog.rush.id(), catalog.globex.id()]);

    let old = catalog
        .list(PurchaseOrderFilter {
            start_date: Some(now - Duration::days(60)),
            end_date: Some(now - Duration::days(7)),
            ..Default::default()
        })
        .await;
    assert_eq!(old, vec![catalog.alpha.id()]);
}

#[tokio::test]
async fn search_is_case_sensitive_over_references_notes_and_supplier() {
    let catalog = Catalog::seed().await;
    let search = |term: &str| PurchaseOrderFilter {
        search: Some(term.to_string()),
        ..Default::default()
    };

    assert_eq!(catalog.list(search("Alpha")).await, vec![catalog.alpha.id()]);
    assert!(catalog.list(search("alpha")).await.is_empty());
    assert_eq!(catalog.list(search("SUP-9")).await, vec![catalog.globex.id()]);
    assert_eq!(catalog.list(search("rush")).await, vec![catalog.rush.id()]);
    assert_eq!(catalog.list(search("Globex")).await, vec![catalog.globex.id()]);
    assert_eq!(
        catalog.list(search("Acme")).await,
        vec![catalog.rush.id(), catalog.alpha.id()]
    );
    assert_eq!(catalog.list(search("")).await.len(), 3);
}

#[tokio::test]
async fn pending_orders_are_the_approved_ones() {
    let catalog = Catalog::seed().await;
    let ctx = catalog.engine.ctx();

    let pending = catalog.engine.service.find_pending(&ctx).await.unwrap();
    let ids: Vec<i64> = pending.iter().map(PurchaseOrderDetails::id).collect();
    assert_eq!(ids, vec![catalog.rush.id()]);
    assert!(pending
        .iter()
        .all(|order| order.order.status == PurchaseOrderStatus::Approved));

    catalog
        .engine
        .service
        .cancel(&ctx, catalog.rush.id())
        .await
        .unwrap();
    assert!(catalog.engine.service.find_pending(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn queries_without_organization_see_every_tenant() {
    let catalog = Catalog::seed().await;
    let db = catalog.engine.db.as_ref();

    let everything = ListPurchaseOrdersQuery::default().execute(db).await.unwrap();
    assert_eq!(everything.len(), 4);

    let pending = ListPendingPurchaseOrdersQuery::default().execute(db).await.unwrap();
    let ids: Vec<i64> = pending.iter().map(PurchaseOrderDetails::id).collect();
    assert_eq!(ids, vec![catalog.foreign.id(), catalog.rush.id()]);

    let scoped = GetPurchaseOrderQuery {
        organization_id: Some(OTHER_ORG),
        purchase_order_id: catalog.alpha.id(),
    }
    .execute(db)
    .await
    .unwrap();
    assert!(scoped.is_none());

    let unscoped = GetPurchaseOrderQuery {
        organization_id: None,
        purchase_order_id: catalog.foreign.id(),
    }
    .execute(db)
    .await
    .unwrap()
    .unwrap();
    assert_eq!(unscoped.order.organization_id, OTHER_ORG);
    assert_eq!(unscoped.items[0].product.as_ref().unwrap().name, "Gasket");
}

#[test]
fn page_window_is_one_based_and_bounded() {
    assert_eq!(PurchaseOrderFilter::default().page_window(), (0, 20));

    let third = PurchaseOrderFilter {
        page: Some(3),
        limit: Some(25),
        ..Default::default()
    };
    assert_eq!(third.page_window(), (50, 25));

    let silly = PurchaseOrderFilter {
        page: Some(0),
        limit: Some(10_000),
        ..Default::default()
    };
    assert_eq!(silly.page_window(), (0, 100));
}
