//! File-based document store.
//!
//! Each collection is a JSON array stored at `{storage_path}/{collection}.json`.
//! Every write holds an exclusive advisory lock on `{collection}.lock` for the
//! whole read-modify-write, so store instances in different processes sharing
//! a directory never lose each other's updates. Collections are persisted
//! through a uniquely named temporary file renamed over the target, so readers
//! never observe a partially written collection.

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use serde_json::Value;
use std::{
	collections::HashMap,
	fs::OpenOptions,
	io::{ErrorKind, Write},
	path::PathBuf,
	sync::Arc,
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::{
	models::Collection,
	services::store::{
		document::{add_to_set_in, replace_in, DocumentStore},
		error::StoreError,
		filter::{Filter, FindOptions},
	},
};

/// File-based implementation of the document store
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
	/// Directory holding one JSON file per collection
	storage_path: PathBuf,
	/// Keeps writers of this instance from piling up on the file lock
	write_lock: Arc<Mutex<()>>,
}

impl FileDocumentStore {
	/// Creates a new file-based store rooted at `storage_path`
	pub fn new(storage_path: PathBuf) -> Self {
		FileDocumentStore {
			storage_path,
			write_lock: Arc::new(Mutex::new(())),
		}
	}

	fn collection_path(&self, collection: Collection) -> PathBuf {
		self.storage_path
			.join(format!("{}.json", collection.name()))
	}

	fn lock_path(&self, collection: Collection) -> PathBuf {
		self.storage_path
			.join(format!("{}.lock", collection.name()))
	}

	fn metadata(&self, collection: Collection) -> Option<HashMap<String, String>> {
		Some(HashMap::from([
			("collection".to_string(), collection.name().to_string()),
			(
				"path".to_string(),
				self.collection_path(collection).display().to_string(),
			),
		]))
	}

	/// Parses collection file content; blank content is an empty collection
	fn parse(&self, collection: Collection, content: &str) -> Result<Vec<Value>, StoreError> {
		if content.trim().is_empty() {
			return Ok(Vec::new());
		}

		serde_json::from_str(content).map_err(|e| {
			StoreError::parse_error(
				"Failed to parse collection",
				Some(e.into()),
				self.metadata(collection),
			)
		})
	}

	fn read_failed(&self, collection: Collection, e: std::io::Error) -> StoreError {
		StoreError::read_error("Failed to read collection", Some(e.into()), self.metadata(collection))
	}

	fn write_failed(&self, collection: Collection, message: &str, e: std::io::Error) -> StoreError {
		StoreError::write_error(message.to_string(), Some(e.into()), self.metadata(collection))
	}

	/// Loads a collection; a missing or blank file is an empty collection
	async fn load(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
		match tokio::fs::read_to_string(self.collection_path(collection)).await {
			Ok(content) => self.parse(collection, &content),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
			Err(e) => Err(self.read_failed(collection, e)),
		}
	}

	/// Blocking variant of [`Self::load`], used while the collection lock is held
	fn load_blocking(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
		match std::fs::read_to_string(self.collection_path(collection)) {
			Ok(content) => self.parse(collection, &content),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
			Err(e) => Err(self.read_failed(collection, e)),
		}
	}

	/// Persists a collection through a temporary file and a rename
	fn save_blocking(&self, collection: Collection, documents: &[Value]) -> Result<(), StoreError> {
		let json = serde_json::to_string_pretty(documents).map_err(|e| {
			StoreError::parse_error(
				"Failed to serialize collection",
				Some(e.into()),
				self.metadata(collection),
			)
		})?;

		let mut temp = NamedTempFile::new_in(&self.storage_path)
			.map_err(|e| self.write_failed(collection, "Failed to write collection", e))?;
		temp.write_all(json.as_bytes())
			.and_then(|_| temp.as_file().sync_all())
			.map_err(|e| self.write_failed(collection, "Failed to write collection", e))?;
		temp.persist(self.collection_path(collection))
			.map_err(|e| self.write_failed(collection, "Failed to replace collection", e.error))?;
		Ok(())
	}

	/// Runs `update` on a collection under its exclusive file lock
	///
	/// `update` returns its result and whether the collection changed; only a
	/// changed collection is written back.
	fn update_blocking<T, F>(&self, collection: Collection, update: F) -> Result<T, StoreError>
	where
		F: FnOnce(&mut Vec<Value>) -> Result<(T, bool), StoreError>,
	{
		std::fs::create_dir_all(&self.storage_path)
			.map_err(|e| self.write_failed(collection, "Failed to create storage directory", e))?;

		let lock_file = OpenOptions::new()
			.create(true)
			.truncate(false)
			.write(true)
			.open(self.lock_path(collection))
			.map_err(|e| self.write_failed(collection, "Failed to open collection lock", e))?;
		let mut lock = FileLock::new(lock_file);
		let _held = lock
			.write()
			.map_err(|e| self.write_failed(collection, "Failed to lock collection", e))?;

		let mut documents = self.load_blocking(collection)?;
		let (result, changed) = update(&mut documents)?;
		if changed {
			self.save_blocking(collection, &documents)?;
		}
		Ok(result)
	}

	/// Runs [`Self::update_blocking`] off the async runtime
	async fn update<T, F>(&self, collection: Collection, update: F) -> Result<T, StoreError>
	where
		T: Send + 'static,
		F: FnOnce(&mut Vec<Value>) -> Result<(T, bool), StoreError> + Send + 'static,
	{
		let _guard = self.write_lock.lock().await;
		let store = self.clone();
		tokio::task::spawn_blocking(move || store.update_blocking(collection, update))
			.await
			.map_err(|e| {
				StoreError::write_error(
					"Collection update did not complete",
					Some(e.into()),
					self.metadata(collection),
				)
			})?
	}
}

impl Default for FileDocumentStore {
	/// Initializes storage with the default path "data"
	fn default() -> Self {
		FileDocumentStore::new(PathBuf::from("data"))
	}
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
	async fn find(
		&self,
		collection: Collection,
		filter: &Filter,
		options: &FindOptions,
	) -> Result<Vec<Value>, StoreError> {
		let documents = self.load(collection).await?;
		let matching = documents
			.into_iter()
			.filter(|document| filter.matches(document))
			.collect();
		Ok(options.apply(matching))
	}

	async fn replace_one(&self, collection: Collection, document: Value) -> Result<(), StoreError> {
		self.update(collection, move |documents| {
			replace_in(collection, documents, document)?;
			Ok(((), true))
		})
		.await
	}

	async fn add_to_set(
		&self,
		collection: Collection,
		id: &str,
		field: &str,
		value: Value,
	) -> Result<bool, StoreError> {
		let id = id.to_string();
		let field = field.to_string();
		self.update(collection, move |documents| {
			let inserted = add_to_set_in(collection, documents, &id, &field, value)?;
			Ok((inserted, inserted))
		})
		.await
	}
}
