use thiserror::Error;

use crate::protocol::{EXPLORER_ERROR, INTERNAL_ERROR, INVALID_PARAMS};

/// Typed error variants for the catalog explorer.
///
/// There is no "not found" variant: lookups and searches report misses as
/// empty result lists.
#[derive(Debug, Error)]
pub enum ExplorerError {
	#[error("Explorer not initialized: call explorer/initialize or catalog/load first")]
	NotInitialized,
	#[error("Record index {index} out of range (catalog has {len} records)")]
	InvalidIndex { index: usize, len: usize },
	#[error("Catalog has too few records to rank (need at least 2)")]
	EmptyCollection,
	#[error("No source record: pass a source index or view a record first")]
	NoSource,
	#[error("Allocation failed: {0}")]
	Allocation(String),
	#[error("Invalid params: {0}")]
	InvalidParams(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl ExplorerError {
	/// Return a machine-readable error code string for this error variant.
	pub fn code(&self) -> &str {
		match self {
			Self::NotInitialized => "EXPLORER_NOT_INITIALIZED",
			Self::InvalidIndex { .. } => "EXPLORER_INVALID_INDEX",
			Self::EmptyCollection => "EXPLORER_EMPTY_COLLECTION",
			Self::NoSource => "EXPLORER_NO_SOURCE",
			Self::Allocation(_) => "EXPLORER_ALLOCATION",
			Self::InvalidParams(_) => "EXPLORER_INVALID_PARAMS",
			Self::Io(_) => "EXPLORER_IO",
			Self::Json(_) => "EXPLORER_JSON",
		}
	}

	/// JSON-RPC error code for replies carrying this error.
	pub fn json_rpc_code(&self) -> i32 {
		match self {
			Self::InvalidParams(_) => INVALID_PARAMS,
			Self::Allocation(_) => INTERNAL_ERROR,
			_ => EXPLORER_ERROR,
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"explorerCode": self.code(),
			"message": self.to_string(),
		})
	}
}
