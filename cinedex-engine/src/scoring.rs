// ---------------------------------------------------------------------------
// Scoring — affinity between one source record and the rest of the catalog
// ---------------------------------------------------------------------------
//
// Pure functions. Every candidate gets an integer affinity built from genre
// overlap, director match and release-year distance; the candidate list is
// returned best first under a total, deterministic order.
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use serde::Serialize;

use crate::catalog::{Catalog, Record};
use crate::error::ExplorerError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Weight of each shared genre.
pub const GENRE_WEIGHT: i64 = 100;
/// Bonus for a shared, known director.
pub const DIRECTOR_WEIGHT: i64 = 50;
/// Year distance used when either release year is unknown.
pub const UNKNOWN_YEAR_DIFF: i64 = 1000;

// ---------------------------------------------------------------------------
// ScoreEntry
// ---------------------------------------------------------------------------

/// One ranked candidate. Only lives for the duration of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
	pub record_index: usize,
	pub score: i64,
	pub genre_overlap: i64,
	pub year_diff: i64,
	pub director_match: i64,
}

// ---------------------------------------------------------------------------
// Individual signals
// ---------------------------------------------------------------------------

/// Number of distinct source genres that also appear in the candidate's genres.
pub fn genre_overlap(source: &Record, candidate: &Record) -> i64 {
	source
		.genres
		.iter()
		.enumerate()
		.filter(|(i, g)| !source.genres[..*i].iter().any(|seen| seen.eq_ignore_ascii_case(g)))
		.filter(|(_, g)| candidate.genres.iter().any(|c| c.eq_ignore_ascii_case(g)))
		.count() as i64
}

/// 1 when both directors are known and equal ignoring ASCII case.
pub fn director_match(source: &Record, candidate: &Record) -> i64 {
	let (a, b) = (&source.director_lower, &candidate.director_lower);
	i64::from(!a.is_empty() && !b.is_empty() && a.eq_ignore_ascii_case(b))
}

/// Absolute release-year distance, or [`UNKNOWN_YEAR_DIFF`] when either year
/// is not positive.
pub fn year_diff(source: &Record, candidate: &Record) -> i64 {
	if source.release_year > 0 && candidate.release_year > 0 {
		(i64::from(source.release_year) - i64::from(candidate.release_year)).abs()
	} else {
		UNKNOWN_YEAR_DIFF
	}
}

/// Score a single candidate against the source.
pub fn score_pair(source: &Record, candidate: &Record, candidate_index: usize) -> ScoreEntry {
	let overlap = genre_overlap(source, candidate);
	let director = director_match(source, candidate);
	let years = year_diff(source, candidate);
	ScoreEntry {
		record_index: candidate_index,
		score: overlap * GENRE_WEIGHT + director * DIRECTOR_WEIGHT - years,
		genre_overlap: overlap,
		year_diff: years,
		director_match: director,
	}
}

/// Best-first ordering: score, then genre overlap, then director match
/// (all descending), then smaller year difference, then lower record index.
pub fn rank_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
	b.score
		.cmp(&a.score)
		.then_with(|| b.genre_overlap.cmp(&a.genre_overlap))
		.then_with(|| b.director_match.cmp(&a.director_match))
		.then_with(|| a.year_diff.cmp(&b.year_diff))
		.then_with(|| a.record_index.cmp(&b.record_index))
}

// ---------------------------------------------------------------------------
// Ranked list
// ---------------------------------------------------------------------------

/// Score every record other than `source_index` and return them best first.
pub fn generate(catalog: &Catalog, source_index: usize) -> Result<Vec<ScoreEntry>, ExplorerError> {
	let source = catalog.require(source_index)?;
	if catalog.len() <= 1 {
		return Err(ExplorerError::EmptyCollection);
	}

	let mut ranked: Vec<ScoreEntry> = catalog
		.records()
		.iter()
		.enumerate()
		.filter(|(i, _)| *i != source_index)
		.map(|(i, candidate)| score_pair(source, candidate, i))
		.collect();
	ranked.sort_by(rank_order);
	Ok(ranked)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
