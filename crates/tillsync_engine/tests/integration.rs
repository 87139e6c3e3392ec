//! Integration tests for the sync engine and entity façade.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tillsync_engine::{
    Catalog, ManualConnectivity, MemoryRemote, PushOutcome, RemoteCall, RemoteError, SkipReason,
    SyncConfig, SyncEngine, SyncError, TableOutcome,
};
use tillsync_model::{Category, Product, Receipt, Record, ShopkeeperProfile, Table};
use tillsync_store::{FileStore, LocalStore, MemoryStore};

type Engine = SyncEngine<MemoryStore, MemoryRemote>;

fn row(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn setup(
    config: SyncConfig,
    online: bool,
) -> (Catalog<MemoryStore, MemoryRemote>, ManualConnectivity) {
    let signal = ManualConnectivity::new(online);
    let engine = SyncEngine::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryRemote::new()),
        &signal,
    );
    (Catalog::new(Arc::new(engine)), signal)
}

fn category(name: &str) -> Category {
    Category {
        name: name.into(),
        ..Category::default()
    }
}

fn upserted(engine: &Engine) -> Vec<(Table, String)> {
    engine
        .remote()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RemoteCall::Upsert { table, mut ids } => Some((table, ids.remove(0))),
            _ => None,
        })
        .collect()
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn offline_writes_are_listed_and_queued() {
    let (catalog, _signal) = setup(SyncConfig::default(), false);

    let tea = catalog.products().save(Product::new("Tea", 2.5)).unwrap();
    let drinks = catalog.categories().save(category("Drinks")).unwrap();
    assert!(!tea.sync.is_scheduled());
    assert!(!drinks.sync.is_scheduled());

    assert_eq!(catalog.products().list().unwrap(), vec![tea.entity.clone()]);
    assert_eq!(catalog.categories().list().unwrap(), vec![drinks.entity.clone()]);

    let queue = catalog.engine().store().sync_queue().unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|item| !item.synced));
    assert!(catalog.engine().remote().calls().is_empty());
}

#[tokio::test]
async fn queued_writes_are_pushed_in_order_once_online() {
    let (catalog, signal) = setup(SyncConfig::default(), false);
    let engine = Arc::clone(catalog.engine());

    let a = catalog.categories().save(category("A")).unwrap().entity;
    let b = catalog.products().save(Product::new("B", 1.0)).unwrap().entity;

    signal.set_online(true);
    let outcome = engine.push().await;
    assert!(matches!(outcome, PushOutcome::Drained { applied: 2 }));

    assert_eq!(
        upserted(&engine),
        vec![(Table::Categories, a.id.clone()), (Table::Products, b.id.clone())]
    );
    assert!(engine.store().sync_queue().unwrap().is_empty());
    assert_eq!(engine.remote().row(Table::Products, &b.id).unwrap()["name"], "B");

    let stats = engine.stats();
    assert_eq!(stats.pushes_completed, 1);
    assert_eq!(stats.items_pushed, 2);
}

#[tokio::test]
async fn concurrent_push_is_a_noop() {
    let (catalog, _signal) = setup(SyncConfig::default(), true);
    let engine = Arc::clone(catalog.engine());
    engine
        .store()
        .save(Table::Categories, row(json!({"id": "c1", "name": "A"})))
        .unwrap();

    engine.remote().hold();
    let first = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.push().await })
    };
    tokio::task::yield_now().await;
    assert!(engine.state().is_active());

    let second = engine.push().await;
    assert_eq!(second.skip_reason(), Some(SkipReason::AlreadyRunning));
    assert_eq!(engine.store().sync_queue().unwrap().len(), 1);

    engine.remote().release();
    assert!(matches!(first.await.unwrap(), PushOutcome::Drained { applied: 1 }));
    assert!(!engine.state().is_active());
    assert_eq!(engine.remote().calls().len(), 1);
}

#[tokio::test]
async fn writes_during_a_push_wait_for_the_next_one() {
    let (catalog, _signal) = setup(SyncConfig::default(), true);
    let engine = Arc::clone(catalog.engine());

    engine.remote().hold();
    let first = catalog.categories().save(category("A")).unwrap();
    assert!(first.sync.is_scheduled());
    tokio::task::yield_now().await;

    let late = engine
        .store()
        .save(Table::Categories, row(json!({"id": "late", "name": "B"})))
        .unwrap();

    engine.remote().release();
    assert!(matches!(first.sync.wait().await, PushOutcome::Drained { applied: 1 }));

    let pending = engine.store().sync_queue().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, late.id);

    assert!(matches!(engine.push().await, PushOutcome::Drained { applied: 1 }));
    assert!(engine.store().sync_queue().unwrap().is_empty());
}

#[tokio::test]
async fn push_stops_at_first_failure() {
    let (catalog, signal) = setup(SyncConfig::default(), false);
    let engine = Arc::clone(catalog.engine());

    catalog.categories().save(category("A")).unwrap();
    let b = catalog.products().save(Product::new("B", 1.0)).unwrap().entity;
    catalog.categories().save(category("C")).unwrap();

    engine
        .remote()
        .fail_table(Table::Products, RemoteError::status(503, "unavailable"));
    signal.set_online(true);

    let outcome = engine.push().await;
    assert_eq!(outcome.applied(), 1);
    match outcome.error() {
        Some(SyncError::RemoteApply { table, source, .. }) => {
            assert_eq!(*table, Table::Products);
            assert!(source.is_retryable());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let pending = engine.store().sync_queue().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].entity_id(), Some(b.id.as_str()));
    assert_eq!(engine.remote().calls().len(), 2);

    engine.remote().heal_table(Table::Products);
    assert!(matches!(engine.push().await, PushOutcome::Drained { applied: 2 }));
}

#[tokio::test]
async fn deletes_follow_table_policy_remotely() {
    let (catalog, _signal) = setup(SyncConfig::default(), true);
    let engine = Arc::clone(catalog.engine());

    let tea = catalog.products().save(Product::new("Tea", 2.5)).unwrap();
    let snacks = catalog.categories().save(category("Snacks")).unwrap();
    tea.sync.wait().await;
    snacks.sync.wait().await;
    assert!(engine.remote().row(Table::Products, &tea.entity.id).is_some());

    catalog.products().delete(&tea.entity.id).unwrap().wait().await;
    catalog.categories().delete(&snacks.entity.id).unwrap().wait().await;

    let remote_tea = engine.remote().row(Table::Products, &tea.entity.id).unwrap();
    assert_eq!(remote_tea["is_active"], false);
    assert!(engine.remote().row(Table::Categories, &snacks.entity.id).is_none());

    let local_tea = catalog.products().get(&tea.entity.id).unwrap().unwrap();
    assert!(!local_tea.is_active);
    assert!(catalog.categories().get(&snacks.entity.id).unwrap().is_none());
    assert!(engine.store().sync_queue().unwrap().is_empty());
}

#[tokio::test]
async fn pull_overwrites_and_isolates_failing_tables() {
    let config = SyncConfig::new().with_pull_tables([
        Table::Categories,
        Table::Products,
        Table::Shopkeepers,
    ]);
    let (catalog, _signal) = setup(config, true);
    let engine = Arc::clone(catalog.engine());

    engine
        .store()
        .apply_remote(Table::Categories, vec![row(json!({"id": "c1", "name": "Local"}))])
        .unwrap();
    engine.remote().seed(
        Table::Categories,
        [
            row(json!({"id": "c1", "name": "Remote"})),
            row(json!({"id": "c2", "name": "New"})),
        ],
    );
    engine.remote().seed(
        Table::Shopkeepers,
        [row(json!({"id": "s1", "name": "Alice", "phone": "555-1"}))],
    );
    engine
        .remote()
        .fail_table(Table::Products, RemoteError::Transport("reset".into()));

    let report = engine.pull().await;
    assert_eq!(report.failed_tables(), vec![Table::Products]);
    assert_eq!(report.rows(), 3);
    assert!(!report.is_complete());

    let categories = catalog.categories().list().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(catalog.categories().get("c1").unwrap().unwrap().name, "Remote");
    assert_eq!(catalog.shopkeepers().list().unwrap()[0].role, "customer");

    assert!(engine.store().sync_queue().unwrap().is_empty());
    assert_eq!(engine.stats().pulls_completed, 1);
}

#[tokio::test]
async fn pull_can_preserve_pending_rows() {
    let config = SyncConfig::new()
        .with_pull_tables([Table::Categories])
        .with_opportunistic_push(false)
        .with_preserve_pending_on_pull(true);
    let (catalog, _signal) = setup(config, true);
    let engine = Arc::clone(catalog.engine());

    catalog
        .categories()
        .save(Category {
            id: "c1".into(),
            name: "Local".into(),
            ..Category::default()
        })
        .unwrap();
    engine.remote().seed(
        Table::Categories,
        [
            row(json!({"id": "c1", "name": "Remote"})),
            row(json!({"id": "c2", "name": "Other"})),
        ],
    );

    let report = engine.pull().await;
    assert!(matches!(
        report.tables[0].1,
        TableOutcome::Fetched {
            rows: 1,
            preserved: 1
        }
    ));
    assert_eq!(catalog.categories().get("c1").unwrap().unwrap().name, "Local");
    assert!(catalog.categories().get("c2").unwrap().is_some());
}

#[tokio::test]
async fn manual_sync_requires_connectivity() {
    let (catalog, signal) = setup(SyncConfig::default(), false);
    let engine = Arc::clone(catalog.engine());
    catalog.categories().save(category("Drinks")).unwrap();

    assert!(matches!(engine.manual_sync().await, Err(SyncError::Offline)));
    assert!(engine.remote().calls().is_empty());

    engine
        .remote()
        .seed(Table::Products, [row(json!({"id": "p1", "name": "Tea", "price": 2.0}))]);
    signal.set_online(true);

    let result = engine.manual_sync().await.unwrap();
    assert!(result.success());
    assert_eq!(result.push.applied(), 1);
    assert!(catalog.products().get("p1").unwrap().is_some());

    let calls = engine.remote().calls();
    assert!(matches!(calls[0], RemoteCall::Upsert { .. }));
    assert!(calls[1..]
        .iter()
        .all(|call| matches!(call, RemoteCall::SelectAll { .. })));
    assert_eq!(calls.len(), 1 + Table::ALL.len());
}

#[tokio::test]
async fn reconnect_triggers_push() {
    let (catalog, signal) = setup(SyncConfig::default(), false);
    let engine = Arc::clone(catalog.engine());
    let saved = catalog.categories().save(category("Drinks")).unwrap().entity;

    engine.start();
    signal.set_online(true);

    let store = Arc::clone(engine.store());
    assert!(wait_until(|| store.sync_queue().map(|q| q.is_empty()).unwrap_or(false)).await);
    assert!(engine.remote().row(Table::Categories, &saved.id).is_some());

    engine.stop();
    assert!(!engine.is_running());
}

#[tokio::test]
async fn reconnect_push_can_be_disabled() {
    let (catalog, signal) = setup(SyncConfig::new().with_push_on_reconnect(false), false);
    let engine = Arc::clone(catalog.engine());
    catalog.categories().save(category("Drinks")).unwrap();

    engine.start();
    signal.set_online(true);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(engine.remote().calls().is_empty());
    assert_eq!(engine.store().sync_queue().unwrap().len(), 1);
}

#[tokio::test]
async fn connection_status_tracks_the_signal() {
    let (catalog, signal) = setup(SyncConfig::default(), true);
    let engine = catalog.engine();
    assert!(engine.connection_status());

    signal.set_online(false);
    assert!(!engine.connection_status());
    signal.set_online(true);
    assert!(engine.connection_status());
}

#[tokio::test]
async fn shopkeeper_merge_refreshes_only_updated_at() {
    let (catalog, _signal) = setup(SyncConfig::default(), false);

    let created = catalog
        .create_or_update_shopkeeper(ShopkeeperProfile {
            name: "Alice".into(),
            phone: "555-1".into(),
            email: Some("alice@example.com".into()),
            ..ShopkeeperProfile::default()
        })
        .unwrap()
        .entity;
    assert_eq!(created.role, "customer");
    assert!(created.is_active);

    tokio::time::sleep(Duration::from_millis(5)).await;
    let merged = catalog
        .create_or_update_shopkeeper(ShopkeeperProfile {
            name: "Alice".into(),
            phone: "555-1".into(),
            email: Some("new@example.com".into()),
            address: Some("1 High Street".into()),
            role: Some("supplier".into()),
        })
        .unwrap()
        .entity;

    assert_eq!(merged.id, created.id);
    assert_eq!(merged.email.as_deref(), Some("alice@example.com"));
    assert_eq!(merged.address, None);
    assert_eq!(merged.role, "customer");
    assert_eq!(merged.created_at, created.created_at);
    assert!(merged.updated_at > created.updated_at);

    let other = catalog
        .create_or_update_shopkeeper(ShopkeeperProfile {
            name: "Alice".into(),
            phone: "555-2".into(),
            role: Some("supplier".into()),
            ..ShopkeeperProfile::default()
        })
        .unwrap()
        .entity;
    assert_ne!(other.id, created.id);
    assert_eq!(other.role, "supplier");
    assert_eq!(catalog.shopkeepers().list().unwrap().len(), 2);
}

#[tokio::test]
async fn receipt_numbers_continue_after_pull() {
    let config = SyncConfig::new().with_pull_tables([Table::Receipts]);
    let (catalog, _signal) = setup(config, true);
    let engine = Arc::clone(catalog.engine());
    engine.remote().seed(
        Table::Receipts,
        [
            row(json!({"id": "r1", "receipt_number": "RCP001", "total_amount": 5.0})),
            row(json!({"id": "r2", "receipt_number": "RCP002", "total_amount": 7.5})),
        ],
    );
    engine.pull().await;

    let written = catalog.receipts().save(Receipt::default()).unwrap();
    assert_eq!(written.entity.receipt_number.as_deref(), Some("RCP003"));
    written.sync.wait().await;

    let remote = engine.remote().row(Table::Receipts, &written.entity.id).unwrap();
    assert_eq!(remote["receipt_number"], "RCP003");
}

#[tokio::test]
async fn file_store_keeps_queue_state_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("till.db");
    let signal = ManualConnectivity::new(false);

    let saved = {
        let engine = SyncEngine::new(
            SyncConfig::default(),
            Arc::new(FileStore::open(&path).unwrap()),
            Arc::new(MemoryRemote::new()),
            &signal,
        );
        let catalog = Catalog::new(Arc::new(engine));
        catalog.receipts().save(Receipt::default()).unwrap().entity
    };

    let remote = Arc::new(MemoryRemote::new());
    let engine = SyncEngine::new(
        SyncConfig::default(),
        Arc::new(FileStore::open(&path).unwrap()),
        Arc::clone(&remote),
        &signal,
    );
    assert_eq!(engine.store().sync_queue().unwrap().len(), 1);

    signal.set_online(true);
    assert!(matches!(engine.push().await, PushOutcome::Drained { applied: 1 }));
    assert_eq!(
        remote.row(Table::Receipts, &saved.id).unwrap()["receipt_number"],
        "RCP001"
    );

    let reopened = FileStore::open(&path).unwrap();
    assert!(reopened.sync_queue().unwrap().is_empty());
    assert_eq!(reopened.snapshot().queue_counts().synced, 1);
}
