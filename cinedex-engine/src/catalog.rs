// ---------------------------------------------------------------------------
// Catalog — the record set every index and ranking works over
// ---------------------------------------------------------------------------
//
// Records are addressed by their position in the catalog. Lowercased title,
// director and genre strings are derived once at load time so the hot paths
// (scoring, hashing, attribute scans) never re-normalize.
// ---------------------------------------------------------------------------

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Release year as it appears in source data: either a number or a string
/// such as `"2019"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearInput {
	Number(i64),
	Text(String),
}

impl YearInput {
	/// Resolve to a year, 0 meaning unknown. Strings parse their leading
	/// integer (`"2019 (remaster)"` -> 2019).
	fn resolve(&self) -> i32 {
		match self {
			Self::Number(n) => i32::try_from(*n).unwrap_or(0),
			Self::Text(s) => parse_leading_int(s),
		}
	}
}

fn parse_leading_int(s: &str) -> i32 {
	let trimmed = s.trim_start();
	let (negative, digits) = match trimmed.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
	};
	let end = digits
		.find(|c: char| !c.is_ascii_digit())
		.unwrap_or(digits.len());
	let value = digits[..end].parse::<i32>().unwrap_or(0);
	if negative { -value } else { value }
}

/// One record as handed over by the ingestion side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordInput {
	pub show_id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub title: String,
	pub director: String,
	pub cast: String,
	pub country: String,
	pub date_added: String,
	pub release_year: Option<YearInput>,
	pub rating: String,
	pub duration: String,
	/// Comma-separated genre list.
	pub listed_in: String,
	/// Explicit genre list; wins over `listed_in` when non-empty.
	pub genres: Vec<String>,
	pub description: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A normalized catalog record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
	pub show_id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub title: String,
	pub director: String,
	pub cast: String,
	pub country: String,
	pub date_added: String,
	/// 0 when unknown.
	pub release_year: i32,
	pub rating: String,
	pub duration: String,
	pub description: String,
	/// Trimmed, ASCII-lowercased, empties dropped.
	pub genres: Vec<String>,
	#[serde(skip)]
	pub title_lower: String,
	#[serde(skip)]
	pub director_lower: String,
}

impl From<RecordInput> for Record {
	fn from(input: RecordInput) -> Self {
		let genres = if input.genres.is_empty() {
			normalize_genres(input.listed_in.split(','))
		} else {
			normalize_genres(input.genres.iter().map(String::as_str))
		};
		let title = input.title.trim().to_string();
		let director = input.director.trim().to_string();
		Self {
			title_lower: title.to_ascii_lowercase(),
			director_lower: director.to_ascii_lowercase(),
			release_year: input.release_year.as_ref().map_or(0, YearInput::resolve),
			show_id: input.show_id,
			kind: input.kind,
			title,
			director,
			cast: input.cast,
			country: input.country,
			date_added: input.date_added,
			rating: input.rating,
			duration: input.duration,
			description: input.description,
			genres,
		}
	}
}

/// Trim, lowercase and drop empties and repeats. First occurrence wins.
fn normalize_genres<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
	let mut genres: Vec<String> = Vec::new();
	for genre in raw.map(str::trim).filter(|g| !g.is_empty()) {
		let genre = genre.to_ascii_lowercase();
		if !genres.contains(&genre) {
			genres.push(genre);
		}
	}
	genres
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Randomly indexable, immutable record collection.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	records: Vec<Record>,
}

impl Catalog {
	pub fn from_inputs(inputs: Vec<RecordInput>) -> Self {
		Self {
			records: inputs.into_iter().map(Record::from).collect(),
		}
	}

	/// Load a JSON array of [`RecordInput`] objects from disk.
	pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ExplorerError> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)?;
		let inputs: Vec<RecordInput> = serde_json::from_str(&raw)?;
		tracing::info!(path = %path.display(), records = inputs.len(), "Catalog file loaded");
		Ok(Self::from_inputs(inputs))
	}

	pub fn get(&self, index: usize) -> Option<&Record> {
		self.records.get(index)
	}

	/// Like [`Catalog::get`], but out-of-range is an error.
	pub fn require(&self, index: usize) -> Result<&Record, ExplorerError> {
		self.records.get(index).ok_or(ExplorerError::InvalidIndex {
			index,
			len: self.records.len(),
		})
	}

	pub fn records(&self) -> &[Record] {
		&self.records
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
