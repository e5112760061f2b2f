// ---------------------------------------------------------------------------
// ExplorerServer — JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to Explorer
// operations: a `run()` loop, a `dispatch()` match, `with_explorer` /
// `with_explorer_mut` accessors, and free-standing handlers per method.
// Requests are handled strictly one at a time.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};
use std::path::Path;

use serde::Serialize;
use serde_json::json;

use crate::catalog::Catalog;
use crate::error::ExplorerError;
use crate::explorer::{Explorer, ExplorerConfig};
use crate::protocol::*;
use crate::scoring::ScoreEntry;
use crate::title_index::IndexConfig;
use crate::transport::NdjsonTransport;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct ExplorerServer {
	transport: NdjsonTransport,
	/// Settings from the command line; `explorer/initialize` params are
	/// layered on top of these.
	base_config: ExplorerConfig,
	explorer: Option<Explorer>,
}

impl ExplorerServer {
	/// The explorer is created lazily by `explorer/initialize`,
	/// `catalog/load` or [`ExplorerServer::preload`].
	pub fn new(transport: NdjsonTransport, base_config: ExplorerConfig) -> Self {
		Self {
			transport,
			base_config,
			explorer: None,
		}
	}

	/// Load a catalog file before serving requests.
	pub fn preload(&mut self, path: &Path) -> Result<(), ExplorerError> {
		let catalog = Catalog::load_json(path)?;
		self.explorer_or_default().load(catalog)?;
		Ok(())
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), ExplorerError> {
		let stdin = io::stdin();
		let reader = stdin.lock();

		for line_result in reader.lines() {
			let line = line_result?;
			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			match serde_json::from_str::<JsonRpcRequest>(trimmed) {
				Ok(request) => self.dispatch(request),
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport
						.write_error(0, PARSE_ERROR, "Parse error: invalid JSON", None);
				}
			}
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		tracing::debug!(id, method = %req.method, "Dispatching request");

		let result = match req.method.as_str() {
			// -- Lifecycle -----------------------------------------------
			"explorer/initialize" => self.handle_initialize(req.params),

			// -- Catalog -------------------------------------------------
			"catalog/load" => handle_load(self.explorer_or_default(), req.params),
			"catalog/loadFile" => handle_load_file(self.explorer_or_default(), req.params),
			"catalog/size" => {
				self.with_explorer(|e| Ok(json!({ "count": e.catalog().len() })))
			}
			"catalog/get" => self.with_explorer(|e| handle_get(e, req.params)),

			// -- Session -------------------------------------------------
			"session/view" => self.with_explorer_mut(|e| handle_view(e, req.params)),
			"session/get" => self.with_explorer(|e| {
				Ok(json!({ "lastViewed": e.session().last_viewed() }))
			}),

			// -- Recommendations -----------------------------------------
			"recommend/generate" => self.with_explorer(|e| handle_generate(e, req.params)),
			"recommend/build" => self.with_explorer_mut(|e| handle_build(e, req.params)),
			"recommend/collect" => self.with_explorer(|e| handle_collect(e, req.params)),
			"recommend/access" => self.with_explorer_mut(|e| handle_access(e, req.params)),
			"recommend/peek" => {
				self.with_explorer(|e| Ok(json!({ "root": e.recommendations().peek() })))
			}
			"recommend/clear" => self.with_explorer_mut(|e| {
				e.recommendations_mut().clear();
				Ok(json!({}))
			}),

			// -- Title index ---------------------------------------------
			"index/lookup" => self.with_explorer(|e| handle_lookup(e, req.params)),
			"index/partialSearch" => self.with_explorer(|e| handle_partial_search(e, req.params)),
			"index/stats" => self.with_explorer(|e| Ok(json!({ "stats": e.index_stats() }))),

			// -- Attribute search ----------------------------------------
			"search/director" => self.with_explorer(|e| handle_search_director(e, req.params)),
			"search/genre" => self.with_explorer(|e| handle_search_genre(e, req.params)),
			"search/year" => self.with_explorer(|e| handle_search_year(e, req.params)),

			// -- Unknown -------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => self.transport.write_explorer_error(id, &e),
		}
	}

	// ── Explorer accessors ────────────────────────────────────────────────

	fn with_explorer<F>(&self, f: F) -> Result<serde_json::Value, ExplorerError>
	where
		F: FnOnce(&Explorer) -> Result<serde_json::Value, ExplorerError>,
	{
		match &self.explorer {
			Some(e) => f(e),
			None => Err(ExplorerError::NotInitialized),
		}
	}

	fn with_explorer_mut<F>(&mut self, f: F) -> Result<serde_json::Value, ExplorerError>
	where
		F: FnOnce(&mut Explorer) -> Result<serde_json::Value, ExplorerError>,
	{
		match &mut self.explorer {
			Some(e) => f(e),
			None => Err(ExplorerError::NotInitialized),
		}
	}

	fn explorer_or_default(&mut self) -> &mut Explorer {
		let config = self.base_config;
		self.explorer.get_or_insert_with(|| Explorer::new(config))
	}

	// ── Initialize ────────────────────────────────────────────────────────

	fn handle_initialize(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, ExplorerError> {
		let p: InitializeParams = parse_optional_params(params)?;

		let mut config = self.base_config;
		if let Some(topn) = p.default_topn {
			config.default_topn = topn;
		}
		if let Some(min) = p.min_capacity {
			config.index.min_capacity = min;
		}
		if let Some(factor) = p.capacity_factor {
			config.index.capacity_factor = factor;
		}
		if p.capacity_ceiling.is_some() {
			config.index.capacity_ceiling = p.capacity_ceiling;
		}
		if let Some(threshold) = p.load_factor_warn {
			config.index.load_factor_warn =
				IndexConfig::check_load_factor_warn(threshold).map_err(ExplorerError::InvalidParams)?;
		}
		if let Some(tie_break) = p.tie_break {
			config.tie_break = tie_break;
		}

		self.explorer = Some(Explorer::new(config));
		tracing::info!(?config, "Explorer initialized");
		Ok(json!({ "config": config }))
	}
}

// ---------------------------------------------------------------------------
// Param parsing
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, ExplorerError> {
	serde_json::from_value(params).map_err(|e| ExplorerError::InvalidParams(e.to_string()))
}

/// Like [`parse_params`], but a missing/`null` params object means defaults.
fn parse_optional_params<T: serde::de::DeserializeOwned + Default>(
	params: serde_json::Value,
) -> Result<T, ExplorerError> {
	if params.is_null() {
		return Ok(T::default());
	}
	parse_params(params)
}

// ---------------------------------------------------------------------------
// Presentation helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordSummary<'a> {
	index: usize,
	title: &'a str,
	release_year: i32,
	#[serde(skip_serializing_if = "Option::is_none")]
	score: Option<i64>,
}

fn summarize(explorer: &Explorer, index: usize, score: Option<i64>) -> RecordSummary<'_> {
	let record = explorer.catalog().get(index);
	RecordSummary {
		index,
		title: record.map_or("", |r| r.title.as_str()),
		release_year: record.map_or(0, |r| r.release_year),
		score,
	}
}

fn summarize_all(explorer: &Explorer, indices: &[usize]) -> serde_json::Value {
	let summaries: Vec<RecordSummary<'_>> =
		indices.iter().map(|&i| summarize(explorer, i, None)).collect();
	json!({ "matches": summaries, "count": summaries.len() })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RankedSummary<'a> {
	#[serde(flatten)]
	entry: ScoreEntry,
	title: &'a str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_load(
	explorer: &mut Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: LoadParams = parse_params(params)?;
	let stats = explorer.load(Catalog::from_inputs(p.records))?;
	Ok(json!({ "count": explorer.catalog().len(), "index": stats }))
}

fn handle_load_file(
	explorer: &mut Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: LoadFileParams = parse_params(params)?;
	let stats = explorer.load(Catalog::load_json(&p.path)?)?;
	Ok(json!({ "count": explorer.catalog().len(), "index": stats }))
}

fn handle_get(explorer: &Explorer, params: serde_json::Value) -> Result<serde_json::Value, ExplorerError> {
	let p: IndexParams = parse_params(params)?;
	Ok(json!({ "record": explorer.record(p.index)? }))
}

fn handle_view(
	explorer: &mut Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: IndexParams = parse_params(params)?;
	Ok(json!({ "record": explorer.view(p.index)? }))
}

fn handle_generate(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: GenerateParams = parse_params(params)?;
	let ranked = explorer.generate(p.source)?;
	let limit = p.limit.unwrap_or(ranked.len());
	let summaries: Vec<RankedSummary<'_>> = ranked
		.iter()
		.take(limit)
		.map(|entry| RankedSummary {
			entry: *entry,
			title: explorer
				.catalog()
				.get(entry.record_index)
				.map_or("", |r| r.title.as_str()),
		})
		.collect();
	Ok(json!({ "recommendations": summaries, "total": ranked.len() }))
}

fn handle_build(
	explorer: &mut Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: BuildParams = parse_optional_params(params)?;
	let inserted = explorer.build_recommendations(p.source, p.topn)?;
	Ok(json!({
		"inserted": inserted,
		"source": explorer.recommendations().source(),
	}))
}

fn handle_collect(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: CollectParams = parse_optional_params(params)?;
	let limit = p.limit.unwrap_or(usize::MAX);
	let summaries: Vec<RecordSummary<'_>> = explorer
		.recommendations()
		.entries_descending(limit)
		.into_iter()
		.map(|node| summarize(explorer, node.record_index, Some(node.score)))
		.collect();
	Ok(json!({
		"recommendations": summaries,
		"source": explorer.recommendations().source(),
	}))
}

fn handle_access(
	explorer: &mut Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: AccessParams = parse_params(params)?;
	explorer.recommendations_mut().access(p.score);
	Ok(json!({ "root": explorer.recommendations().peek() }))
}

fn handle_lookup(explorer: &Explorer, params: serde_json::Value) -> Result<serde_json::Value, ExplorerError> {
	let p: TitleParams = parse_params(params)?;
	Ok(summarize_all(explorer, explorer.lookup_title(&p.title)))
}

fn handle_partial_search(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: NeedleParams = parse_params(params)?;
	Ok(summarize_all(explorer, &explorer.partial_title_search(&p.needle)))
}

fn handle_search_director(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: DirectorParams = parse_params(params)?;
	Ok(summarize_all(explorer, &explorer.search_director(&p.director, p.partial)))
}

fn handle_search_genre(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: GenreParams = parse_params(params)?;
	Ok(summarize_all(explorer, &explorer.search_genre(&p.genre, p.partial)))
}

fn handle_search_year(
	explorer: &Explorer,
	params: serde_json::Value,
) -> Result<serde_json::Value, ExplorerError> {
	let p: YearParams = parse_params(params)?;
	Ok(summarize_all(explorer, &explorer.search_year(p.year)))
}
