//! Collections, content kinds and the datasets derived from the block log.
//!
//! The mapping "content kind -> dataset -> link field -> exclusion filter" is a
//! closed table expressed through [`ContentKind::dataset`] and
//! [`Dataset::spec`]. Adding a kind means adding a variant and a table row.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// Collections of the indexer store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
	Blocks,
	BlocksLog,
	Transactions,
	ImpactedAddresses,
	TokensLoggedEvents,
	InvolvedAccountsTransfer,
	SpecialEvents,
	Helpers,
}

impl Collection {
	/// Name of the collection in the store
	pub fn name(&self) -> &'static str {
		match self {
			Collection::Blocks => "blocks",
			Collection::BlocksLog => "blocks_log",
			Collection::Transactions => "transactions",
			Collection::ImpactedAddresses => "impacted_addresses",
			Collection::TokensLoggedEvents => "tokens_logged_events",
			Collection::InvolvedAccountsTransfer => "involved_accounts_transfer",
			Collection::SpecialEvents => "special_events",
			Collection::Helpers => "helpers",
		}
	}
}

impl fmt::Display for Collection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// List-valued content the block log records per height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
	TransactionHashes,
	ImpactedAddresses,
	TokensLoggedEvents,
	InvolvedAccountsTransfer,
}

impl ContentKind {
	/// Every content kind, in reporting order
	pub const ALL: [ContentKind; 4] = [
		ContentKind::TransactionHashes,
		ContentKind::ImpactedAddresses,
		ContentKind::TokensLoggedEvents,
		ContentKind::InvolvedAccountsTransfer,
	];

	/// Name of the list field in a block log document
	pub fn log_field(&self) -> &'static str {
		match self {
			ContentKind::TransactionHashes => "transaction_hashes",
			ContentKind::ImpactedAddresses => "impacted_addresses",
			ContentKind::TokensLoggedEvents => "tokens_logged_events",
			ContentKind::InvolvedAccountsTransfer => "involved_accounts_transfer",
		}
	}

	/// Dataset holding the records this kind enumerates
	pub fn dataset(&self) -> Dataset {
		match self {
			ContentKind::TransactionHashes => Dataset::Transactions,
			ContentKind::ImpactedAddresses => Dataset::ImpactedAddresses,
			ContentKind::TokensLoggedEvents => Dataset::TokensLoggedEvents,
			ContentKind::InvolvedAccountsTransfer => Dataset::InvolvedAccountsTransfer,
		}
	}
}

impl fmt::Display for ContentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.log_field())
	}
}

impl FromStr for ContentKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ContentKind::ALL
			.into_iter()
			.find(|kind| kind.log_field() == s.trim())
			.ok_or_else(|| format!("unknown content kind '{}'", s))
	}
}

/// Records excluded from comparison when `field == value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusion {
	pub field: &'static str,
	pub value: &'static str,
}

/// Static description of how a dataset links back to a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
	pub collection: Collection,
	/// Dotted path of the field holding the block height
	pub link_field: &'static str,
	pub exclusion: Option<Exclusion>,
}

/// Datasets derived from the block log by external consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
	Transactions,
	ImpactedAddresses,
	TokensLoggedEvents,
	InvolvedAccountsTransfer,
	SpecialEvents,
}

impl Dataset {
	/// Every dataset, in reporting order
	pub const ALL: [Dataset; 5] = [
		Dataset::Transactions,
		Dataset::ImpactedAddresses,
		Dataset::TokensLoggedEvents,
		Dataset::InvolvedAccountsTransfer,
		Dataset::SpecialEvents,
	];

	/// Where the dataset lives and how its records are linked to a height
	pub const fn spec(&self) -> DatasetSpec {
		match self {
			Dataset::Transactions => DatasetSpec {
				collection: Collection::Transactions,
				link_field: "block_info.height",
				exclusion: None,
			},
			Dataset::ImpactedAddresses => DatasetSpec {
				collection: Collection::ImpactedAddresses,
				link_field: "block_height",
				// Rewards are never logged by the producer
				exclusion: Some(Exclusion {
					field: "effect_type",
					value: "Account Reward",
				}),
			},
			Dataset::TokensLoggedEvents => DatasetSpec {
				collection: Collection::TokensLoggedEvents,
				link_field: "block_height",
				exclusion: None,
			},
			Dataset::InvolvedAccountsTransfer => DatasetSpec {
				collection: Collection::InvolvedAccountsTransfer,
				link_field: "block_height",
				exclusion: None,
			},
			Dataset::SpecialEvents => DatasetSpec {
				collection: Collection::SpecialEvents,
				link_field: "_id",
				exclusion: None,
			},
		}
	}

	/// Content kind enumerating this dataset in the block log, if any
	///
	/// Special events are not enumerated: exactly one record keyed by the
	/// height is expected.
	pub fn content_kind(&self) -> Option<ContentKind> {
		ContentKind::ALL
			.into_iter()
			.find(|kind| kind.dataset() == *self)
	}

	/// Label used in violation reports
	pub fn label(&self) -> &'static str {
		match self.content_kind() {
			Some(kind) => kind.log_field(),
			None => "special_events",
		}
	}
}

impl fmt::Display for Dataset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Identifier of a stored record
///
/// Most identifiers are strings (hashes, composite keys); special events are
/// keyed by the height itself. Heights sort before keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
	Height(u64),
	Key(String),
}

impl RecordId {
	/// Extracts an identifier from a JSON value, if it has a supported shape
	pub fn from_value(value: &serde_json::Value) -> Option<Self> {
		match value {
			serde_json::Value::Number(n) => n.as_u64().map(RecordId::Height),
			serde_json::Value::String(s) => Some(RecordId::Key(s.clone())),
			_ => None,
		}
	}

	/// Converts the identifier back into a JSON value
	pub fn to_value(&self) -> serde_json::Value {
		match self {
			RecordId::Height(h) => serde_json::Value::from(*h),
			RecordId::Key(k) => serde_json::Value::from(k.as_str()),
		}
	}
}

impl Ord for RecordId {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(RecordId::Height(a), RecordId::Height(b)) => a.cmp(b),
			(RecordId::Key(a), RecordId::Key(b)) => a.cmp(b),
			(RecordId::Height(_), RecordId::Key(_)) => Ordering::Less,
			(RecordId::Key(_), RecordId::Height(_)) => Ordering::Greater,
		}
	}
}

impl PartialOrd for RecordId {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for RecordId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordId::Height(h) => write!(f, "{}", h),
			RecordId::Key(k) => f.write_str(k),
		}
	}
}

impl From<u64> for RecordId {
	fn from(height: u64) -> Self {
		RecordId::Height(height)
	}
}

impl From<&str> for RecordId {
	fn from(key: &str) -> Self {
		RecordId::Key(key.to_string())
	}
}

impl From<String> for RecordId {
	fn from(key: String) -> Self {
		RecordId::Key(key)
	}
}
