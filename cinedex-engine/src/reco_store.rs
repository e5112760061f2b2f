// ---------------------------------------------------------------------------
// RecommendationStore — top-N cache of scored candidates for one source
// ---------------------------------------------------------------------------

use crate::catalog::Catalog;
use crate::error::ExplorerError;
use crate::scoring;
use crate::splay::{NodeView, RootView, SplayTree, TieBreak};

/// Number of candidates kept when the caller does not ask for a size.
pub const DEFAULT_TOPN: usize = 20;

/// Splay-tree backed recommendation cache.
///
/// Rebuilt per source record; reads (`collect_descending`, `peek`) never
/// modify it, `access` only reshapes it.
#[derive(Debug, Clone, Default)]
pub struct RecommendationStore {
	tree: SplayTree,
	source: Option<usize>,
}

impl RecommendationStore {
	pub fn new(tie_break: TieBreak) -> Self {
		Self {
			tree: SplayTree::new(tie_break),
			source: None,
		}
	}

	/// Replace the contents with the top `topn` candidates for
	/// `source_index` (`topn == 0` keeps every candidate).
	///
	/// Candidates are inserted best first. On error the previous contents
	/// are left untouched. Returns the number of inserted candidates.
	pub fn build_from_source(
		&mut self,
		catalog: &Catalog,
		source_index: usize,
		topn: usize,
	) -> Result<usize, ExplorerError> {
		let ranked = scoring::generate(catalog, source_index)?;
		let take = if topn == 0 { ranked.len() } else { topn.min(ranked.len()) };

		self.tree.clear();
		for entry in &ranked[..take] {
			self.tree.insert(entry.score, entry.record_index);
		}
		self.source = Some(source_index);

		tracing::debug!(source = source_index, inserted = take, "Recommendation store rebuilt");
		Ok(take)
	}

	pub fn insert(&mut self, score: i64, record_index: usize) -> i64 {
		self.tree.insert(score, record_index)
	}

	pub fn access(&mut self, score: i64) {
		self.tree.access(score);
	}

	pub fn collect_descending(&self, limit: usize) -> Vec<usize> {
		self.tree.collect_descending(limit)
	}

	pub fn entries_descending(&self, limit: usize) -> Vec<NodeView> {
		self.tree.entries_descending(limit)
	}

	pub fn peek(&self) -> Option<RootView> {
		self.tree.root()
	}

	/// The source record the store was last built for.
	pub fn source(&self) -> Option<usize> {
		self.source
	}

	pub fn len(&self) -> usize {
		self.tree.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tree.is_empty()
	}

	pub fn clear(&mut self) {
		self.tree.clear();
		self.source = None;
	}
}
