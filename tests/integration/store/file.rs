use indexer_reconciler::{
	models::{Collection, ContentKind, Dataset, Network},
	services::{
		notification::LogNotifier,
		reconciler::{check_range, diagnose_height, NetworkStores, Reconciler, ReconcilerError},
		store::{heights_with_logged_content, DocumentStore, FileDocumentStore},
	},
	utils::tests::builders::{seed_consistent_range, seed_frontier, HeightFixtureBuilder},
};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_check_range_against_file_store() {
	let dir = TempDir::new().unwrap();
	let store = FileDocumentStore::new(dir.path().to_path_buf());
	HeightFixtureBuilder::new()
		.height(500)
		.transactions(&["tx-a", "tx-b"])
		.impacted_addresses(&["addr-a"])
		.account_reward("reward-a")
		.logged_events(&["event-a"])
		.transfers(&["transfer-a"])
		.drop_record(Dataset::TokensLoggedEvents, "event-a")
		.build()
		.seed(&store)
		.await
		.unwrap();

	let outcome = check_range(&store, 500, 501).await.unwrap();
	assert!(!outcome.ok);
	assert_eq!(
		outcome.reason_strings(500),
		vec!["tokens_logged_events: missing 1".to_string()]
	);

	for collection in [
		Collection::Blocks,
		Collection::BlocksLog,
		Collection::Transactions,
		Collection::ImpactedAddresses,
		Collection::InvolvedAccountsTransfer,
		Collection::SpecialEvents,
	] {
		assert!(dir
			.path()
			.join(format!("{}.json", collection.name()))
			.exists());
	}
	assert!(!dir.path().join("tokens_logged_events.json").exists());
}

#[tokio::test]
async fn test_diagnose_height_against_file_store() {
	let dir = TempDir::new().unwrap();
	let store = FileDocumentStore::new(dir.path().to_path_buf());
	HeightFixtureBuilder::new()
		.height(3)
		.transactions(&["tx-1", "tx-2"])
		.drop_record(Dataset::Transactions, "tx-2")
		.build()
		.seed(&store)
		.await
		.unwrap();

	let diagnoses = diagnose_height(&store, 3).await.unwrap();
	let transactions = diagnoses
		.iter()
		.find(|d| d.dataset == Dataset::Transactions)
		.unwrap();
	assert!(!transactions.is_consistent());
	assert_eq!(transactions.expected.len(), 2);
	assert_eq!(transactions.present, 1);
	assert!(diagnoses
		.iter()
		.filter(|d| d.dataset != Dataset::Transactions)
		.all(|d| d.is_consistent()));
}

#[tokio::test]
async fn test_heights_with_logged_content_against_file_store() {
	let dir = TempDir::new().unwrap();
	let store = FileDocumentStore::new(dir.path().to_path_buf());
	seed_consistent_range(&store, 10, 15).await.unwrap();
	HeightFixtureBuilder::new()
		.height(20)
		.build()
		.seed(&store)
		.await
		.unwrap();

	let heights = heights_with_logged_content(&store, ContentKind::TransactionHashes, 1, 3)
		.await
		.unwrap();
	assert_eq!(heights, vec![11, 12, 13]);
	assert!(
		heights_with_logged_content(&store, ContentKind::TokensLoggedEvents, 0, 10)
			.await
			.unwrap()
			.is_empty()
	);
}

#[tokio::test]
async fn test_cleanup_against_file_store() {
	let dir = TempDir::new().unwrap();
	let store = Arc::new(FileDocumentStore::new(dir.path().to_path_buf()));
	for height in 0..=10u64 {
		let mut builder = HeightFixtureBuilder::new().height(height);
		if height == 4 {
			builder = builder.without_special_event();
		}
		builder.build().seed(store.as_ref()).await.unwrap();
	}
	seed_frontier(store.as_ref(), 10).await.unwrap();

	let reconciler = Reconciler::new(
		NetworkStores::new().with_store_and_window(Network::Mainnet, store.clone(), 6),
		Arc::new(LogNotifier),
	);

	let result = reconciler.cleanup(Network::Mainnet).await.unwrap();
	assert_eq!(result.start, 4);
	assert!(!result.coarse_ok);
	assert_eq!(result.failed, vec![4]);
	assert!(store
		.find_one(Collection::Helpers, &serde_json::json!("special_purpose_block_request"))
		.await
		.unwrap()
		.is_some());
}

#[tokio::test]
async fn test_corrupt_collection_file_is_store_unavailable() {
	let dir = TempDir::new().unwrap();
	tokio::fs::write(dir.path().join("blocks.json"), "{not json")
		.await
		.unwrap();
	let store = FileDocumentStore::new(dir.path().to_path_buf());

	let result = check_range(&store, 0, 1).await;
	assert!(matches!(result, Err(ReconcilerError::StoreUnavailable(_))));
}
