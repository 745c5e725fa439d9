use indexer_reconciler::{
	models::{Dataset, Network, NotificationConfig},
	services::{
		notification::{notifier_from_config, Notifier, WebhookNotifier},
		reconciler::{read_repair_queue, NetworkStores, Reconciler},
		store::MemoryDocumentStore,
	},
	utils::tests::builders::HeightFixtureBuilder,
};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_lookup_block_posts_repair_message_to_webhook() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/hooks/reconciler")
		.match_header("content-type", "application/json")
		.match_body(Matcher::Json(json!({
			"text": "mainnet: Repairing block 12,345. Reasons: ['special_events: missing 1']"
		})))
		.with_status(200)
		.expect(1)
		.create_async()
		.await;

	let store = Arc::new(MemoryDocumentStore::new());
	HeightFixtureBuilder::new()
		.height(12_345)
		.without_special_event()
		.build()
		.seed(store.as_ref())
		.await
		.unwrap();

	let config = NotificationConfig {
		webhook_url: Some(format!("{}/hooks/reconciler", server.url())),
		max_retries: 0,
	};
	let notifier = notifier_from_config(&config).unwrap();
	let reconciler = Reconciler::new(
		NetworkStores::new().with_store(Network::Mainnet, store.clone()),
		notifier,
	);

	let result = reconciler.lookup_block(Network::Mainnet, 12_345).await.unwrap();
	assert!(!result.ok);
	assert!(result.newly_queued);
	mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_server_error_does_not_undo_queueing() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(500)
		.expect_at_least(1)
		.create_async()
		.await;

	let store = Arc::new(MemoryDocumentStore::new());
	HeightFixtureBuilder::new()
		.height(8)
		.transactions(&["tx-8"])
		.drop_record(Dataset::Transactions, "tx-8")
		.build()
		.seed(store.as_ref())
		.await
		.unwrap();

	let notifier = WebhookNotifier::new(&server.url(), 0).unwrap();
	let reconciler = Reconciler::new(
		NetworkStores::new().with_store(Network::Testnet, store.clone()),
		Arc::new(notifier),
	);

	let result = reconciler.lookup_block(Network::Testnet, 8).await.unwrap();
	assert!(!result.ok);
	assert!(result.newly_queued);
	assert!(read_repair_queue(store.as_ref()).await.unwrap().contains(8));
	mock.assert_async().await;
}

#[tokio::test]
async fn test_webhook_retries_transient_failures() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(503)
		.expect(2)
		.create_async()
		.await;

	let notifier = WebhookNotifier::new(&server.url(), 1).unwrap();
	let result = notifier.notify("testnet: Repairing block 1. Reasons: []").await;
	assert!(result.is_err());
	mock.assert_async().await;
}
