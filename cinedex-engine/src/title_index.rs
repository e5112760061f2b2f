// ---------------------------------------------------------------------------
// TitleIndex — open-addressed hash table from lowercased title to records
// ---------------------------------------------------------------------------
//
// Linear probing over a power-of-two slot array. Capacity is chosen once per
// build and never changes afterwards; crossing the load-factor threshold only
// logs a warning. Records sharing a lowercased title share one slot, whose
// index list keeps insertion order.
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::ExplorerError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sizing knobs for [`TitleIndex::build`].
///
/// Capacity is `next_power_of_two(max(min_capacity, capacity_factor * n))`,
/// clamped down to the largest power of two not above `capacity_ceiling`
/// when one is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
	pub min_capacity: usize,
	pub capacity_factor: usize,
	pub capacity_ceiling: Option<usize>,
	/// Fraction of occupied slots (0-1) at which a warning is emitted.
	pub load_factor_warn: f64,
}

impl Default for IndexConfig {
	fn default() -> Self {
		Self {
			min_capacity: 16,
			capacity_factor: 2,
			capacity_ceiling: None,
			load_factor_warn: 0.80,
		}
	}
}

impl IndexConfig {
	/// Accept a load-factor warning threshold only within `0..=1`. NaN is
	/// rejected.
	pub fn check_load_factor_warn(threshold: f64) -> Result<f64, String> {
		if (0.0..=1.0).contains(&threshold) {
			Ok(threshold)
		} else {
			Err(format!("load factor warning must be within 0..=1, got {threshold}"))
		}
	}

	/// Slot count for `records` records, or `None` when it does not fit in
	/// `usize`.
	pub fn capacity_for(&self, records: usize) -> Option<usize> {
		let desired = records
			.checked_mul(self.capacity_factor)?
			.max(self.min_capacity)
			.max(1);
		let capacity = desired.checked_next_power_of_two()?;
		Some(match self.capacity_ceiling {
			Some(ceiling) => capacity.min(prev_power_of_two(ceiling.max(1))),
			None => capacity,
		})
	}
}

fn prev_power_of_two(n: usize) -> usize {
	1 << (usize::BITS - 1 - n.leading_zeros())
}

/// djb2: `h = h * 33 + byte`, seeded with 5381, wrapping.
pub fn title_hash(key: &str) -> u64 {
	key.bytes()
		.fold(5381u64, |h, b| h.wrapping_mul(33).wrapping_add(u64::from(b)))
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct HashSlot {
	/// `None` marks an unoccupied slot.
	key: Option<String>,
	values: Vec<usize>,
}

/// Occupancy figures for the current table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
	pub capacity: usize,
	pub occupied: usize,
	pub indexed: usize,
	pub failed: usize,
	pub load_factor: f64,
	pub load_warning: bool,
}

// ---------------------------------------------------------------------------
// TitleIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
	config: IndexConfig,
	slots: Vec<HashSlot>,
	occupied: usize,
	indexed: usize,
	failed: usize,
	load_warning: bool,
}

impl TitleIndex {
	pub fn new(config: IndexConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// Drop any previous table and index every record with a non-empty title.
	///
	/// Only allocation failure is an error. Records that cannot be placed
	/// because every slot was probed are logged and counted in
	/// [`IndexStats::failed`].
	pub fn build(&mut self, catalog: &Catalog) -> Result<IndexStats, ExplorerError> {
		self.slots = Vec::new();
		self.occupied = 0;
		self.indexed = 0;
		self.failed = 0;
		self.load_warning = false;

		let capacity = self.config.capacity_for(catalog.len()).ok_or_else(|| {
			ExplorerError::Allocation(format!("title index capacity overflows for {} records", catalog.len()))
		})?;
		let mut slots: Vec<HashSlot> = Vec::new();
		slots
			.try_reserve_exact(capacity)
			.map_err(|e| ExplorerError::Allocation(format!("title index with {capacity} slots: {e}")))?;
		slots.resize_with(capacity, HashSlot::default);
		self.slots = slots;

		for (i, record) in catalog.records().iter().enumerate() {
			if record.title_lower.is_empty() {
				continue;
			}
			if !self.insert(&record.title_lower, i) {
				self.failed += 1;
				tracing::warn!(record = i, title = %record.title, "Title index full; record not indexed");
			}
		}

		let stats = self.stats();
		tracing::info!(
			capacity = stats.capacity,
			occupied = stats.occupied,
			indexed = stats.indexed,
			failed = stats.failed,
			"Title index built"
		);
		Ok(stats)
	}

	/// Place `record_index` under `key`. Returns `false` when the probe
	/// wrapped around without finding the key or a free slot.
	fn insert(&mut self, key: &str, record_index: usize) -> bool {
		let mask = self.slots.len() - 1;
		let start = (title_hash(key) as usize) & mask;
		let mut idx = start;
		loop {
			if self.slots[idx].key.is_none() {
				self.slots[idx].key = Some(key.to_owned());
				self.occupied += 1;
				self.check_load();
			}
			let slot = &mut self.slots[idx];
			if slot.key.as_deref() == Some(key) {
				slot.values.push(record_index);
				self.indexed += 1;
				return true;
			}
			idx = (idx + 1) & mask;
			if idx == start {
				return false;
			}
		}
	}

	fn check_load(&mut self) {
		if !self.load_warning && self.load_factor() >= self.config.load_factor_warn {
			self.load_warning = true;
			tracing::warn!(
				capacity = self.slots.len(),
				occupied = self.occupied,
				threshold = self.config.load_factor_warn,
				"Title index load factor threshold reached; rebuild with a larger capacity"
			);
		}
	}

	fn find_slot(&self, key: &str) -> Option<&HashSlot> {
		if self.slots.is_empty() {
			return None;
		}
		let mask = self.slots.len() - 1;
		let start = (title_hash(key) as usize) & mask;
		let mut idx = start;
		loop {
			let slot = &self.slots[idx];
			match slot.key.as_deref() {
				None => return None,
				Some(k) if k == key => return Some(slot),
				Some(_) => {}
			}
			idx = (idx + 1) & mask;
			if idx == start {
				return None;
			}
		}
	}

	/// Records whose lowercased title is exactly `title_lower`, in insertion
	/// order. Empty when there is none.
	pub fn lookup(&self, title_lower: &str) -> &[usize] {
		self.find_slot(title_lower)
			.map(|slot| slot.values.as_slice())
			.unwrap_or_default()
	}

	/// Records whose lowercased title contains `needle_lower`, in slot order,
	/// each index at most once. An empty needle matches nothing.
	pub fn partial_search(&self, needle_lower: &str) -> Vec<usize> {
		if needle_lower.is_empty() {
			return Vec::new();
		}
		let mut seen = HashSet::new();
		let mut results = Vec::new();
		for slot in &self.slots {
			let Some(key) = slot.key.as_deref() else {
				continue;
			};
			if !key.contains(needle_lower) {
				continue;
			}
			for &index in &slot.values {
				if seen.insert(index) {
					results.push(index);
				}
			}
		}
		results
	}

	pub fn capacity(&self) -> usize {
		self.slots.len()
	}

	pub fn load_factor(&self) -> f64 {
		if self.slots.is_empty() {
			0.0
		} else {
			self.occupied as f64 / self.slots.len() as f64
		}
	}

	pub fn stats(&self) -> IndexStats {
		IndexStats {
			capacity: self.slots.len(),
			occupied: self.occupied,
			indexed: self.indexed,
			failed: self.failed,
			load_factor: self.load_factor(),
			load_warning: self.load_warning,
		}
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
