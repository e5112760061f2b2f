// ---------------------------------------------------------------------------
// Explorer — orchestration state behind the JSON-RPC surface
// ---------------------------------------------------------------------------
//
// Owns the catalog and everything derived from it: the title index (rebuilt
// on every load), the recommendation store (rebuilt per source) and the
// browsing session. Query strings are normalized here, so the index and the
// attribute scans only ever see trimmed ASCII-lowercase input.
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::attribute_search;
use crate::catalog::{Catalog, Record};
use crate::error::ExplorerError;
use crate::reco_store::{RecommendationStore, DEFAULT_TOPN};
use crate::scoring::{self, ScoreEntry};
use crate::session::Session;
use crate::splay::TieBreak;
use crate::title_index::{IndexConfig, IndexStats, TitleIndex};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
	/// Store size used when a build request does not name one.
	pub default_topn: usize,
	pub index: IndexConfig,
	pub tie_break: TieBreak,
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			default_topn: DEFAULT_TOPN,
			index: IndexConfig::default(),
			tie_break: TieBreak::default(),
		}
	}
}

/// Trim and ASCII-lowercase a user query.
pub fn normalize_query(raw: &str) -> String {
	raw.trim().to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Explorer
// ---------------------------------------------------------------------------

pub struct Explorer {
	config: ExplorerConfig,
	catalog: Catalog,
	titles: TitleIndex,
	recommendations: RecommendationStore,
	session: Session,
}

impl Explorer {
	pub fn new(config: ExplorerConfig) -> Self {
		Self {
			titles: TitleIndex::new(config.index),
			recommendations: RecommendationStore::new(config.tie_break),
			catalog: Catalog::default(),
			session: Session::default(),
			config,
		}
	}

	pub fn config(&self) -> &ExplorerConfig {
		&self.config
	}

	// -- Catalog -----------------------------------------------------------

	/// Replace the record set. The title index is rebuilt from scratch and
	/// the recommendation store and session are reset, since their indices
	/// referred to the old records. On error nothing changes.
	pub fn load(&mut self, catalog: Catalog) -> Result<IndexStats, ExplorerError> {
		let mut titles = TitleIndex::new(self.config.index);
		let stats = titles.build(&catalog)?;

		self.catalog = catalog;
		self.titles = titles;
		self.recommendations.clear();
		self.session = Session::default();

		tracing::info!(records = self.catalog.len(), "Catalog loaded");
		Ok(stats)
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn record(&self, index: usize) -> Result<&Record, ExplorerError> {
		self.catalog.require(index)
	}

	// -- Session -----------------------------------------------------------

	pub fn session(&self) -> &Session {
		&self.session
	}

	/// Open a record: returns it and remembers it as the last viewed one.
	pub fn view(&mut self, index: usize) -> Result<&Record, ExplorerError> {
		self.session.view(&self.catalog, index)?;
		self.catalog.require(index)
	}

	// -- Recommendations ---------------------------------------------------

	pub fn generate(&self, source: usize) -> Result<Vec<ScoreEntry>, ExplorerError> {
		scoring::generate(&self.catalog, source)
	}

	/// Rebuild the store for `source`, or for the last viewed record when
	/// `source` is `None`.
	pub fn build_recommendations(
		&mut self,
		source: Option<usize>,
		topn: Option<usize>,
	) -> Result<usize, ExplorerError> {
		let source = self.session.resolve_source(source)?;
		let topn = topn.unwrap_or(self.config.default_topn);
		self.recommendations.build_from_source(&self.catalog, source, topn)
	}

	pub fn recommendations(&self) -> &RecommendationStore {
		&self.recommendations
	}

	pub fn recommendations_mut(&mut self) -> &mut RecommendationStore {
		&mut self.recommendations
	}

	// -- Title index -------------------------------------------------------

	pub fn lookup_title(&self, title: &str) -> &[usize] {
		self.titles.lookup(&normalize_query(title))
	}

	pub fn partial_title_search(&self, needle: &str) -> Vec<usize> {
		self.titles.partial_search(&normalize_query(needle))
	}

	pub fn index_stats(&self) -> IndexStats {
		self.titles.stats()
	}

	// -- Attribute search --------------------------------------------------

	pub fn search_director(&self, director: &str, partial: bool) -> Vec<usize> {
		let needle = normalize_query(director);
		if partial {
			attribute_search::by_director_partial(&self.catalog, &needle)
		} else {
			attribute_search::by_director(&self.catalog, &needle)
		}
	}

	pub fn search_genre(&self, genre: &str, partial: bool) -> Vec<usize> {
		let needle = normalize_query(genre);
		if partial {
			attribute_search::by_genre_partial(&self.catalog, &needle)
		} else {
			attribute_search::by_genre(&self.catalog, &needle)
		}
	}

	pub fn search_year(&self, year: i32) -> Vec<usize> {
		attribute_search::by_release_year(&self.catalog, year)
	}
}

impl Default for Explorer {
	fn default() -> Self {
		Self::new(ExplorerConfig::default())
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{RecordInput, YearInput};

	fn rec(title: &str, genres: &[&str], director: &str, year: i64) -> RecordInput {
		RecordInput {
			title: title.to_string(),
			genres: genres.iter().map(|g| g.to_string()).collect(),
			director: director.to_string(),
			release_year: Some(YearInput::Number(year)),
			..Default::default()
		}
	}

	fn loaded() -> Explorer {
		let mut explorer = Explorer::default();
		explorer
			.load(Catalog::from_inputs(vec![
				rec("Alpha", &["drama", "comedy"], "X", 2000),
				rec("Beta", &["drama"], "x", 2001),
				rec("Gamma", &[], "y", 1990),
				rec("alpha", &["horror"], "", 0),
			]))
			.unwrap();
		explorer
	}

	#[test]
	fn load_builds_title_index() {
		let explorer = loaded();
		assert_eq!(explorer.lookup_title("  ALPHA "), &[0, 3]);
		assert_eq!(explorer.partial_title_search("MMA"), vec![2]);
		assert_eq!(explorer.index_stats().indexed, 4);
	}

	#[test]
	fn build_uses_last_viewed_when_no_source_given() {
		let mut explorer = loaded();
		assert!(matches!(explorer.build_recommendations(None, None), Err(ExplorerError::NoSource)));

		explorer.view(0).unwrap();
		assert_eq!(explorer.build_recommendations(None, Some(1)).unwrap(), 1);
		assert_eq!(explorer.recommendations().collect_descending(10), vec![1]);
		assert_eq!(explorer.recommendations().source(), Some(0));
	}

	#[test]
	fn default_topn_caps_store() {
		let mut explorer = Explorer::new(ExplorerConfig {
			default_topn: 2,
			..Default::default()
		});
		explorer
			.load(Catalog::from_inputs(
				(0..10).map(|i| rec(&format!("t{i}"), &["drama"], "", 2000 + i)).collect(),
			))
			.unwrap();
		assert_eq!(explorer.build_recommendations(Some(0), None).unwrap(), 2);
		assert_eq!(explorer.recommendations().collect_descending(10), vec![1, 2]);
	}

	#[test]
	fn reload_resets_store_and_session() {
		let mut explorer = loaded();
		explorer.view(1).unwrap();
		explorer.build_recommendations(None, None).unwrap();
		explorer
			.load(Catalog::from_inputs(vec![rec("Solo", &[], "", 2000)]))
			.unwrap();
		assert!(explorer.recommendations().is_empty());
		assert_eq!(explorer.session().last_viewed(), None);
		assert!(explorer.lookup_title("alpha").is_empty());
		assert_eq!(explorer.lookup_title("solo"), &[0]);
	}

	#[test]
	fn attribute_searches_normalize_queries() {
		let explorer = loaded();
		assert_eq!(explorer.search_director(" X ", false), vec![0, 1]);
		assert_eq!(explorer.search_director("Y", true), vec![2]);
		assert_eq!(explorer.search_genre("DRAMA", false), vec![0, 1]);
		assert_eq!(explorer.search_genre("or", true), vec![3]);
		assert_eq!(explorer.search_year(2001), vec![1]);
	}

	#[test]
	fn blank_queries_match_nothing() {
		let explorer = loaded();
		assert!(explorer.partial_title_search("   ").is_empty());
		assert!(explorer.lookup_title("").is_empty());
		assert!(explorer.search_director("   ", true).is_empty());
		assert!(explorer.search_genre("", true).is_empty());
	}

	#[test]
	fn view_rejects_out_of_range() {
		let mut explorer = loaded();
		assert!(matches!(explorer.view(9), Err(ExplorerError::InvalidIndex { index: 9, len: 4 })));
	}
}
