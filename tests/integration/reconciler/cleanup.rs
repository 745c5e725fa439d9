use crate::integration::mocks::{MockDocumentStore, MockNotifier};
use indexer_reconciler::{
	models::{Collection, Dataset, Network, RepairQueue, DEFAULT_CLEANUP_WINDOW},
	services::{
		notification::LogNotifier,
		reconciler::{read_repair_queue, CleanupResult, NetworkStores, Reconciler, ReconcilerError},
		store::{MemoryDocumentStore, StoreError},
	},
	utils::tests::builders::{seed_consistent_range, seed_frontier, HeightFixtureBuilder},
};
use serde_json::json;
use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

#[tokio::test]
async fn test_cleanup_uses_default_window_below_frontier() {
	let store = Arc::new(MemoryDocumentStore::new());
	seed_consistent_range(store.as_ref(), 10_000, 10_001)
		.await
		.unwrap();
	seed_frontier(store.as_ref(), 20_000).await.unwrap();

	let mut notifier = MockNotifier::new();
	notifier.expect_notify().times(0);

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store(Network::Mainnet, store.clone()),
		Arc::new(notifier),
	);

	let result = reconciler.cleanup(Network::Mainnet).await.unwrap();
	assert_eq!(DEFAULT_CLEANUP_WINDOW, 10_000);
	assert_eq!(
		result,
		CleanupResult {
			start: 10_000,
			stop: 20_000,
			coarse_ok: true,
			scanned: 0,
			failed: vec![],
			enqueued: 0,
		}
	);
}

#[tokio::test]
async fn test_cleanup_queues_only_failing_heights() {
	let store = Arc::new(MemoryDocumentStore::new());
	let broken = [1_000u64, 1_100, 1_200];
	for height in 1_000..=1_200u64 {
		let tx = format!("tx-{}", height);
		let mut builder = HeightFixtureBuilder::new()
			.height(height)
			.transactions(&[tx.as_str()]);
		if broken.contains(&height) {
			builder = builder.drop_record(Dataset::Transactions, tx.as_str());
		}
		builder.build().seed(store.as_ref()).await.unwrap();
	}
	seed_frontier(store.as_ref(), 1_200).await.unwrap();

	let mut notifier = MockNotifier::new();
	notifier
		.expect_notify()
		.withf(|message| message.contains("Reasons: ['transaction_hashes: missing 1']"))
		.times(3)
		.returning(|_| Ok(()));

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store_and_window(Network::Mainnet, store.clone(), 200),
		Arc::new(notifier),
	);

	let result = reconciler.cleanup(Network::Mainnet).await.unwrap();
	assert_eq!(result.start, 1_000);
	assert_eq!(result.stop, 1_200);
	assert!(!result.coarse_ok);
	assert_eq!(result.scanned, 201);
	assert_eq!(result.failed, broken.to_vec());
	assert_eq!(result.enqueued, 3);
	assert_eq!(
		read_repair_queue(store.as_ref()).await.unwrap(),
		broken.into_iter().collect::<RepairQueue>()
	);
}

#[tokio::test]
async fn test_cleanup_default_window_scans_every_height_when_coarse_check_fails() {
	let store = Arc::new(MemoryDocumentStore::new());
	let healthy: Vec<u64> = (10_500..20_000u64)
		.step_by(500)
		.filter(|height| *height != 15_000)
		.collect();
	for height in healthy.iter().copied() {
		HeightFixtureBuilder::new()
			.height(height)
			.build()
			.seed(store.as_ref())
			.await
			.unwrap();
	}
	for height in [10_000u64, 20_000] {
		let tx = format!("tx-{}", height);
		HeightFixtureBuilder::new()
			.height(height)
			.transactions(&[tx.as_str()])
			.drop_record(Dataset::Transactions, tx.as_str())
			.build()
			.seed(store.as_ref())
			.await
			.unwrap();
	}
	HeightFixtureBuilder::new()
		.height(15_000)
		.without_special_event()
		.build()
		.seed(store.as_ref())
		.await
		.unwrap();
	seed_frontier(store.as_ref(), 20_000).await.unwrap();

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store(Network::Mainnet, store.clone()),
		Arc::new(LogNotifier),
	);

	let result = reconciler.cleanup(Network::Mainnet).await.unwrap();
	let expected_failed: Vec<u64> = (10_000..=20_000u64)
		.filter(|height| !healthy.contains(height))
		.collect();
	assert_eq!(result.start, 10_000);
	assert_eq!(result.stop, 20_000);
	assert!(!result.coarse_ok);
	assert_eq!(result.scanned, 10_001);
	assert_eq!(result.failed, expected_failed);
	assert_eq!(result.enqueued, expected_failed.len());
	assert_eq!(
		read_repair_queue(store.as_ref()).await.unwrap(),
		expected_failed.into_iter().collect::<RepairQueue>()
	);
}

#[tokio::test]
async fn test_cleanup_rerun_requeues_idempotently() {
	let store = Arc::new(MemoryDocumentStore::new());
	for height in 0..=20u64 {
		let mut builder = HeightFixtureBuilder::new().height(height);
		if height == 0 {
			builder = builder.without_special_event();
		}
		builder.build().seed(store.as_ref()).await.unwrap();
	}
	seed_frontier(store.as_ref(), 20).await.unwrap();

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store_and_window(Network::Testnet, store.clone(), 20),
		Arc::new(LogNotifier),
	);

	let first = reconciler.cleanup(Network::Testnet).await.unwrap();
	let second = reconciler.cleanup(Network::Testnet).await.unwrap();
	assert_eq!(first.failed, vec![0]);
	assert_eq!(first.enqueued, 1);
	assert_eq!(second.failed, vec![0]);
	assert_eq!(second.enqueued, 0);
	assert_eq!(
		read_repair_queue(store.as_ref()).await.unwrap(),
		[0].into_iter().collect::<RepairQueue>()
	);
}

#[tokio::test]
async fn test_cleanup_store_failure_aborts_sweep() {
	let mut store = MockDocumentStore::new();
	store
		.expect_find_one()
		.withf(|collection, id| {
			*collection == Collection::Helpers && *id == json!("heartbeat_last_processed_block")
		})
		.returning(|_, _| Ok(Some(json!({"_id": "heartbeat_last_processed_block", "height": 500}))));
	store
		.expect_find_one()
		.withf(|collection, _| *collection != Collection::Helpers)
		.returning(|_, _| Err(StoreError::read_error("timeout", None, None)));
	store
		.expect_find()
		.returning(|_, _, _| Err(StoreError::read_error("timeout", None, None)));

	let mut notifier = MockNotifier::new();
	notifier.expect_notify().times(0);

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store_and_window(Network::Mainnet, Arc::new(store), 100),
		Arc::new(notifier),
	);

	let result = reconciler.cleanup(Network::Mainnet).await;
	assert!(matches!(result, Err(ReconcilerError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_cleanup_all_sweeps_each_network() {
	let mainnet = Arc::new(MemoryDocumentStore::new());
	let testnet = Arc::new(MemoryDocumentStore::new());
	seed_consistent_range(mainnet.as_ref(), 90, 101).await.unwrap();
	seed_frontier(mainnet.as_ref(), 100).await.unwrap();
	for height in 40..=50u64 {
		let mut builder = HeightFixtureBuilder::new().height(height);
		if height == 40 {
			builder = builder.without_special_event();
		}
		builder.build().seed(testnet.as_ref()).await.unwrap();
	}
	seed_frontier(testnet.as_ref(), 50).await.unwrap();

	let notified = Arc::new(AtomicUsize::new(0));
	let counter = notified.clone();
	let mut notifier = MockNotifier::new();
	notifier
		.expect_notify()
		.withf(|message| message.starts_with("testnet: Repairing block 40."))
		.returning(move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});

	let reconciler = Reconciler::new(
		NetworkStores::new()
			.with_store_and_window(Network::Mainnet, mainnet, 10)
			.with_store_and_window(Network::Testnet, testnet.clone(), 10),
		Arc::new(notifier),
	);

	let results = reconciler.cleanup_all().await;
	assert_eq!(results.len(), 2);
	assert!(results[0].1.as_ref().unwrap().coarse_ok);
	assert_eq!(results[1].1.as_ref().unwrap().failed, vec![40]);
	assert_eq!(notified.load(Ordering::SeqCst), 1);
	assert!(read_repair_queue(testnet.as_ref()).await.unwrap().contains(40));
}
