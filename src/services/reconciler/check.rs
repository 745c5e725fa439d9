//! Height reconciliation.
//!
//! Compares what the block log says should exist for a height with what the
//! derived datasets actually hold. Sub-checks run concurrently; their results
//! are folded into a [`CheckOutcome`] in a fixed order once all of them are
//! back.

use futures::future::try_join_all;
use std::{collections::BTreeMap, fmt};

use crate::{
	models::{Dataset, RecordId},
	services::{
		reconciler::error::ReconcilerError,
		store::{
			actual_content_ids, block_heights_in_range, count_matching_ids, expected_content_ids,
			log_heights_in_range, DocumentStore, StoreError,
		},
	},
	utils::metrics::{CONTENT_MISMATCHES, STRUCTURAL_MISMATCHES},
};

/// Inconsistency found while checking a height
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
	/// Block and block log heights disagree over the checked range
	///
	/// Advisory only: the log may lag behind the blocks.
	StructuralMismatch { blocks: Vec<u64>, logged: Vec<u64> },
	/// Expected and stored identifiers of a dataset differ
	///
	/// `missing` is the expected count minus the stored count and may be zero
	/// or negative when the sets differ without the counts differing.
	ContentMismatch { dataset: Dataset, missing: i64 },
}

impl Violation {
	/// Returns true if the violation fails the height
	pub fn is_failure(&self) -> bool {
		matches!(self, Violation::ContentMismatch { .. })
	}
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Violation::StructuralMismatch { .. } => {
				f.write_str("blocks_in_range != blocks_log_in_range")
			}
			Violation::ContentMismatch { dataset, missing } => {
				write!(f, "{}: missing {}", dataset.label(), missing)
			}
		}
	}
}

/// Verdict of [`check_range`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
	/// False if any dataset disagrees with the block log
	pub ok: bool,
	/// Violations keyed by height; only heights with violations appear
	pub reasons: BTreeMap<u64, Vec<Violation>>,
}

impl CheckOutcome {
	/// A passing outcome without violations
	pub fn passed() -> Self {
		Self {
			ok: true,
			reasons: BTreeMap::new(),
		}
	}

	fn record(&mut self, height: u64, violation: Violation) {
		if violation.is_failure() {
			self.ok = false;
		}
		self.reasons.entry(height).or_default().push(violation);
	}

	/// Violations recorded for `height`
	pub fn reasons_at(&self, height: u64) -> &[Violation] {
		self.reasons
			.get(&height)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}

	/// Violations recorded for `height`, rendered for humans
	pub fn reason_strings(&self, height: u64) -> Vec<String> {
		self.reasons_at(height)
			.iter()
			.map(ToString::to_string)
			.collect()
	}
}

/// Expected and stored identifiers of one dataset at one height
async fn compare_dataset<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
	dataset: Dataset,
) -> Result<(Vec<RecordId>, Vec<RecordId>), StoreError> {
	let expected = match dataset.content_kind() {
		Some(kind) => expected_content_ids(store, height, kind).await?,
		// Exactly one special event keyed by the height
		None => vec![RecordId::Height(height)],
	};
	let actual = actual_content_ids(store, height, dataset).await?;
	Ok((expected, actual))
}

/// Checks derived datasets against the block log
///
/// The structural comparison covers `[start, stop)`, but every dataset
/// comparison targets the single height `start`: callers wanting a verdict for
/// each height of a range must call this once per height. Only dataset
/// mismatches fail the check; a structural mismatch is recorded at `start` as
/// an advisory.
///
/// # Arguments
/// * `store` - Store of the network being checked
/// * `start` - First height of the range and the height under test
/// * `stop` - End of the range (exclusive)
///
/// # Returns
/// * `Result<CheckOutcome, ReconcilerError>` - Verdict, or the store error that
///   aborted the check
pub async fn check_range<S: DocumentStore + ?Sized>(
	store: &S,
	start: u64,
	stop: u64,
) -> Result<CheckOutcome, ReconcilerError> {
	let comparisons = Dataset::ALL
		.into_iter()
		.map(|dataset| compare_dataset(store, start, dataset));

	let (blocks, logged, compared) = futures::try_join!(
		block_heights_in_range(store, start, stop),
		log_heights_in_range(store, start, stop),
		try_join_all(comparisons),
	)?;

	let mut outcome = CheckOutcome::passed();

	if blocks != logged {
		tracing::warn!(
			start,
			stop,
			blocks = blocks.len(),
			logged = logged.len(),
			"Block heights and block log heights disagree"
		);
		STRUCTURAL_MISMATCHES.inc();
		outcome.record(start, Violation::StructuralMismatch { blocks, logged });
	}

	for (dataset, (expected, actual)) in Dataset::ALL.into_iter().zip(compared) {
		if expected != actual {
			let missing = expected.len() as i64 - actual.len() as i64;
			tracing::debug!(height = start, %dataset, missing, "Dataset disagrees with block log");
			CONTENT_MISMATCHES.with_label_values(&[dataset.label()]).inc();
			outcome.record(start, Violation::ContentMismatch { dataset, missing });
		}
	}

	Ok(outcome)
}

/// Detailed view of one dataset at one height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDiagnosis {
	pub dataset: Dataset,
	/// Identifiers the block log expects
	pub expected: Vec<RecordId>,
	/// Identifiers linked to the height in the dataset
	pub linked: Vec<RecordId>,
	/// How many expected identifiers exist in the dataset, linked anywhere
	pub present: u64,
}

impl DatasetDiagnosis {
	pub fn is_consistent(&self) -> bool {
		self.expected == self.linked
	}

	/// Expected identifiers not linked to the height
	pub fn unlinked(&self) -> Vec<&RecordId> {
		self.expected
			.iter()
			.filter(|id| self.linked.binary_search(id).is_err())
			.collect()
	}

	/// Linked identifiers the block log does not list
	pub fn unexpected(&self) -> Vec<&RecordId> {
		self.linked
			.iter()
			.filter(|id| self.expected.binary_search(id).is_err())
			.collect()
	}
}

/// Diagnoses every dataset at `height`
///
/// Distinguishes records that are missing altogether from records that exist
/// but are linked to another height.
pub async fn diagnose_height<S: DocumentStore + ?Sized>(
	store: &S,
	height: u64,
) -> Result<Vec<DatasetDiagnosis>, ReconcilerError> {
	let diagnoses = Dataset::ALL.into_iter().map(|dataset| async move {
		let (expected, linked) = compare_dataset(store, height, dataset).await?;
		let present = count_matching_ids(store, &expected, dataset).await?;
		Ok::<_, StoreError>(DatasetDiagnosis {
			dataset,
			expected,
			linked,
			present,
		})
	});
	Ok(try_join_all(diagnoses).await?)
}
