// ---------------------------------------------------------------------------
// Attribute search — linear scans over director, genre and release year
// ---------------------------------------------------------------------------
//
// Deliberately O(n) with no secondary index. Every search returns matching
// record indices in ascending order; empty needles and non-positive years
// match nothing.
// ---------------------------------------------------------------------------

use crate::catalog::{Catalog, Record};

/// Shared scan: indices of every record satisfying `pred`.
fn collect_matching(catalog: &Catalog, pred: impl Fn(&Record) -> bool) -> Vec<usize> {
	catalog
		.records()
		.iter()
		.enumerate()
		.filter(|(_, record)| pred(record))
		.map(|(i, _)| i)
		.collect()
}

pub fn by_director(catalog: &Catalog, director_lower: &str) -> Vec<usize> {
	if director_lower.is_empty() {
		return Vec::new();
	}
	collect_matching(catalog, |r| r.director_lower == director_lower)
}

pub fn by_director_partial(catalog: &Catalog, director_substr_lower: &str) -> Vec<usize> {
	if director_substr_lower.is_empty() {
		return Vec::new();
	}
	collect_matching(catalog, |r| r.director_lower.contains(director_substr_lower))
}

pub fn by_genre(catalog: &Catalog, genre_lower: &str) -> Vec<usize> {
	if genre_lower.is_empty() {
		return Vec::new();
	}
	collect_matching(catalog, |r| r.genres.iter().any(|g| g == genre_lower))
}

pub fn by_genre_partial(catalog: &Catalog, genre_substr_lower: &str) -> Vec<usize> {
	if genre_substr_lower.is_empty() {
		return Vec::new();
	}
	collect_matching(catalog, |r| {
		r.genres.iter().any(|g| g.contains(genre_substr_lower))
	})
}

pub fn by_release_year(catalog: &Catalog, year: i32) -> Vec<usize> {
	if year <= 0 {
		return Vec::new();
	}
	collect_matching(catalog, |r| r.release_year == year)
}
