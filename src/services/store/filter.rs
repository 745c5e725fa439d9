//! Query model understood by every [`DocumentStore`](super::DocumentStore).
//!
//! A [`Filter`] is a conjunction of clauses evaluated against JSON documents;
//! field names are dotted paths (`block_info.height`). [`FindOptions`] adds
//! an ascending sort, skip and limit.

use serde_json::Value;
use std::cmp::Ordering;

/// Single predicate on a document field
#[derive(Debug, Clone, PartialEq)]
enum Clause {
	/// Field equals the value
	Eq { field: String, value: Value },
	/// Field differs from the value; a missing field counts as different
	Ne { field: String, value: Value },
	/// Field is present (any value, including null)
	Exists { field: String },
	/// Field is an unsigned integer within `[start, stop)`
	Range { field: String, start: u64, stop: u64 },
	/// Field equals one of the values
	In { field: String, values: Vec<Value> },
}

impl Clause {
	fn matches(&self, document: &Value) -> bool {
		match self {
			Clause::Eq { field, value } => field_value(document, field) == Some(value),
			Clause::Ne { field, value } => field_value(document, field) != Some(value),
			Clause::Exists { field } => field_value(document, field).is_some(),
			Clause::Range { field, start, stop } => field_value(document, field)
				.and_then(Value::as_u64)
				.is_some_and(|v| *start <= v && v < *stop),
			Clause::In { field, values } => {
				field_value(document, field).is_some_and(|v| values.contains(v))
			}
		}
	}
}

/// Conjunction of clauses; an empty filter matches every document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
	clauses: Vec<Clause>,
}

impl Filter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.clauses.push(Clause::Eq {
			field: field.into(),
			value: value.into(),
		});
		self
	}

	pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.clauses.push(Clause::Ne {
			field: field.into(),
			value: value.into(),
		});
		self
	}

	pub fn exists(mut self, field: impl Into<String>) -> Self {
		self.clauses.push(Clause::Exists {
			field: field.into(),
		});
		self
	}

	/// Restricts an integer field to the closed-open interval `[start, stop)`
	pub fn range(mut self, field: impl Into<String>, start: u64, stop: u64) -> Self {
		self.clauses.push(Clause::Range {
			field: field.into(),
			start,
			stop,
		});
		self
	}

	pub fn is_in(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
		self.clauses.push(Clause::In {
			field: field.into(),
			values,
		});
		self
	}

	/// Returns true if the document satisfies every clause
	pub fn matches(&self, document: &Value) -> bool {
		self.clauses.iter().all(|clause| clause.matches(document))
	}
}

/// Sorting and pagination applied after filtering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
	/// Field to sort ascending on; store order is unspecified when unset
	pub sort_by: Option<String>,
	pub skip: usize,
	pub limit: Option<usize>,
}

impl FindOptions {
	pub fn sort(mut self, field: impl Into<String>) -> Self {
		self.sort_by = Some(field.into());
		self
	}

	pub fn skip(mut self, skip: usize) -> Self {
		self.skip = skip;
		self
	}

	pub fn limit(mut self, limit: usize) -> Self {
		self.limit = Some(limit);
		self
	}

	/// Applies sort, skip and limit to already filtered documents
	pub fn apply(&self, mut documents: Vec<Value>) -> Vec<Value> {
		if let Some(field) = &self.sort_by {
			documents.sort_by(|a, b| {
				compare_values(
					field_value(a, field).unwrap_or(&Value::Null),
					field_value(b, field).unwrap_or(&Value::Null),
				)
			});
		}
		documents
			.into_iter()
			.skip(self.skip)
			.take(self.limit.unwrap_or(usize::MAX))
			.collect()
	}
}

/// Resolves a dotted field path inside a document
pub fn field_value<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.')
		.try_fold(document, |current, segment| current.get(segment))
}

fn type_rank(value: &Value) -> u8 {
	match value {
		Value::Null => 0,
		Value::Bool(_) => 1,
		Value::Number(_) => 2,
		Value::String(_) => 3,
		Value::Array(_) => 4,
		Value::Object(_) => 5,
	}
}

/// Total order over JSON values: null, booleans, numbers, strings, arrays, objects
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => match (x.as_u64(), y.as_u64()) {
			(Some(x), Some(y)) => x.cmp(&y),
			_ => x
				.as_f64()
				.partial_cmp(&y.as_f64())
				.unwrap_or(Ordering::Equal),
		},
		(Value::String(x), Value::String(y)) => x.cmp(y),
		(Value::Bool(x), Value::Bool(y)) => x.cmp(y),
		_ => type_rank(a).cmp(&type_rank(b)),
	}
}
