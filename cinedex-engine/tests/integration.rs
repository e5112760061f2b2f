// ---------------------------------------------------------------------------
// Integration tests for cinedex-engine JSON-RPC 2.0 / NDJSON protocol
// ---------------------------------------------------------------------------
//
// Each test spawns a fresh cinedex-engine binary and talks to it over
// stdin/stdout using newline-delimited JSON-RPC 2.0 messages.
// ---------------------------------------------------------------------------

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

struct EngineProcess {
	child: Child,
	reader: BufReader<std::process::ChildStdout>,
	next_id: AtomicU64,
}

impl EngineProcess {
	fn spawn() -> Self {
		Self::spawn_with_args(&[])
	}

	fn spawn_with_args(args: &[&str]) -> Self {
		let bin = env!("CARGO_BIN_EXE_cinedex-engine");
		let mut child = Command::new(bin)
			.args(args)
			.env_remove("RUST_LOG")
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.spawn()
			.expect("failed to spawn cinedex-engine");

		let stdout = child.stdout.take().expect("no stdout");
		let reader = BufReader::new(stdout);

		Self {
			child,
			reader,
			next_id: AtomicU64::new(1),
		}
	}

	fn write_raw(&mut self, line: &str) {
		let stdin = self.child.stdin.as_mut().expect("no stdin");
		stdin.write_all(line.as_bytes()).unwrap();
		stdin.write_all(b"\n").unwrap();
		stdin.flush().unwrap();
	}

	fn read_message(&mut self) -> Value {
		loop {
			let mut buf = String::new();
			let bytes_read = self
				.reader
				.read_line(&mut buf)
				.expect("failed to read from stdout");
			if bytes_read == 0 {
				panic!("unexpected EOF while waiting for a response");
			}
			let buf = buf.trim();
			if buf.is_empty() {
				continue;
			}
			return serde_json::from_str(buf)
				.unwrap_or_else(|e| panic!("invalid JSON from engine: {e}\nline: {buf}"));
		}
	}

	fn send(&mut self, method: &str, params: Value) -> RpcResponse {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let request = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});
		self.write_raw(&serde_json::to_string(&request).unwrap());

		let parsed = self.read_message();
		let resp_id = parsed["id"].as_u64().expect("response id is not u64");
		assert_eq!(resp_id, id, "response id mismatch");
		if let Some(error) = parsed.get("error") {
			return RpcResponse::Error(error.clone());
		}
		RpcResponse::Ok(parsed.get("result").cloned().unwrap_or(Value::Null))
	}

	fn call(&mut self, method: &str, params: Value) -> Value {
		match self.send(method, params) {
			RpcResponse::Ok(v) => v,
			RpcResponse::Error(e) => panic!("expected success, got error: {e}"),
		}
	}

	fn call_err(&mut self, method: &str, params: Value) -> Value {
		match self.send(method, params) {
			RpcResponse::Error(e) => e,
			RpcResponse::Ok(v) => panic!("expected error, got success: {v}"),
		}
	}

	/// Load the three-record catalog used by most tests.
	fn load_abc(&mut self) -> Value {
		self.call("catalog/load", json!({ "records": abc_records() }))
	}
}

impl Drop for EngineProcess {
	fn drop(&mut self) {
		drop(self.child.stdin.take());
		let _ = self.child.wait();
	}
}

#[derive(Debug)]
enum RpcResponse {
	Ok(Value),
	Error(Value),
}

fn abc_records() -> Value {
	json!([
		{ "title": "A", "genres": ["Drama", "Comedy"], "director": "X", "releaseYear": 2000 },
		{ "title": "B", "genres": ["drama"], "director": "x", "releaseYear": "2001" },
		{ "title": "C", "director": "Y", "releaseYear": 1990 },
	])
}

fn indices(result: &Value) -> Vec<u64> {
	result["matches"]
		.as_array()
		.expect("matches array")
		.iter()
		.map(|m| m["index"].as_u64().unwrap())
		.collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn requests_before_load_are_rejected() {
	let mut engine = EngineProcess::spawn();
	let err = engine.call_err("catalog/size", json!({}));
	assert_eq!(err["code"], -32000);
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_NOT_INITIALIZED");
}

#[test]
fn initialize_applies_overrides() {
	let mut engine = EngineProcess::spawn();
	let result = engine.call(
		"explorer/initialize",
		json!({ "defaultTopn": 5, "capacityCeiling": 64, "tieBreak": "sequence" }),
	);
	assert_eq!(result["config"]["defaultTopn"], 5);
	assert_eq!(result["config"]["index"]["capacityCeiling"], 64);
	assert_eq!(result["config"]["tieBreak"], "sequence");
	assert_eq!(engine.call("catalog/size", json!({}))["count"], 0);
}

#[test]
fn initialize_rejects_bad_threshold() {
	let mut engine = EngineProcess::spawn();
	let err = engine.call_err("explorer/initialize", json!({ "loadFactorWarn": 1.5 }));
	assert_eq!(err["code"], -32602);
}

#[test]
fn bad_threshold_flag_stops_startup() {
	let output = Command::new(env!("CARGO_BIN_EXE_cinedex-engine"))
		.args(["--load-factor-warn", "1.5"])
		.env_remove("CINEDEX_LOAD_FACTOR_WARN")
		.stdin(Stdio::null())
		.output()
		.expect("failed to run cinedex-engine");
	assert!(!output.status.success());
	assert!(output.stdout.is_empty());
}

#[test]
fn unknown_method_is_reported() {
	let mut engine = EngineProcess::spawn();
	let err = engine.call_err("catalog/explode", json!({}));
	assert_eq!(err["code"], -32601);
}

#[test]
fn malformed_json_gets_parse_error() {
	let mut engine = EngineProcess::spawn();
	engine.write_raw("{not json");
	let msg = engine.read_message();
	assert_eq!(msg["id"], 0);
	assert_eq!(msg["error"]["code"], -32700);

	// The server keeps serving afterwards.
	engine.load_abc();
	assert_eq!(engine.call("catalog/size", json!({}))["count"], 3);
}

// ---------------------------------------------------------------------------
// Catalog and session
// ---------------------------------------------------------------------------

#[test]
fn load_reports_count_and_index_stats() {
	let mut engine = EngineProcess::spawn();
	let result = engine.load_abc();
	assert_eq!(result["count"], 3);
	assert_eq!(result["index"]["capacity"], 16);
	assert_eq!(result["index"]["indexed"], 3);
	assert_eq!(result["index"]["loadWarning"], false);

	let record = engine.call("catalog/get", json!({ "index": 1 }));
	assert_eq!(record["record"]["title"], "B");
	assert_eq!(record["record"]["releaseYear"], 2001);
}

#[test]
fn load_file_reads_json_catalog() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.json");
	std::fs::write(&path, abc_records().to_string()).unwrap();

	let mut engine = EngineProcess::spawn();
	let result = engine.call("catalog/loadFile", json!({ "path": path.to_str().unwrap() }));
	assert_eq!(result["count"], 3);

	let err = engine.call_err("catalog/loadFile", json!({ "path": dir.path().join("missing.json").to_str().unwrap() }));
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_IO");
	// Failed reload leaves the previous catalog in place.
	assert_eq!(engine.call("catalog/size", json!({}))["count"], 3);
}

#[test]
fn catalog_flag_preloads_before_serving() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("catalog.json");
	std::fs::write(&path, abc_records().to_string()).unwrap();

	let mut engine = EngineProcess::spawn_with_args(&["--catalog", path.to_str().unwrap()]);
	assert_eq!(engine.call("catalog/size", json!({}))["count"], 3);
}

#[test]
fn invalid_index_is_rejected() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();
	let err = engine.call_err("catalog/get", json!({ "index": 3 }));
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_INVALID_INDEX");
	let err = engine.call_err("session/view", json!({ "index": 99 }));
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_INVALID_INDEX");
	assert_eq!(engine.call("session/get", json!({}))["lastViewed"], Value::Null);
}

#[test]
fn missing_params_are_invalid() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();
	let err = engine.call_err("catalog/get", json!({}));
	assert_eq!(err["code"], -32602);
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_INVALID_PARAMS");
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[test]
fn generate_ranks_by_similarity() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();
	let result = engine.call("recommend/generate", json!({ "source": 0 }));
	assert_eq!(result["total"], 2);
	let recs = result["recommendations"].as_array().unwrap();
	assert_eq!(recs[0]["recordIndex"], 1);
	assert_eq!(recs[0]["title"], "B");
	assert_eq!(recs[0]["score"], 149);
	assert_eq!(recs[0]["genreOverlap"], 1);
	assert_eq!(recs[0]["directorMatch"], 1);
	assert_eq!(recs[1]["recordIndex"], 2);
	assert_eq!(recs[1]["score"], -10);

	let limited = engine.call("recommend/generate", json!({ "source": 0, "limit": 1 }));
	assert_eq!(limited["recommendations"].as_array().unwrap().len(), 1);
	assert_eq!(limited["total"], 2);
}

#[test]
fn generate_needs_two_records() {
	let mut engine = EngineProcess::spawn();
	engine.call("catalog/load", json!({ "records": [{ "title": "Solo" }] }));
	let err = engine.call_err("recommend/generate", json!({ "source": 0 }));
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_EMPTY_COLLECTION");
}

#[test]
fn build_top_one_keeps_best_match() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();
	let built = engine.call("recommend/build", json!({ "source": 0, "topn": 1 }));
	assert_eq!(built["inserted"], 1);
	assert_eq!(built["source"], 0);

	let collected = engine.call("recommend/collect", json!({}));
	let recs = collected["recommendations"].as_array().unwrap();
	assert_eq!(recs.len(), 1);
	assert_eq!(recs[0]["index"], 1);
	assert_eq!(recs[0]["title"], "B");
	assert_eq!(recs[0]["releaseYear"], 2001);
	assert_eq!(recs[0]["score"], 149);
}

#[test]
fn build_from_last_viewed_and_splay_access() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();

	let err = engine.call_err("recommend/build", json!({}));
	assert_eq!(err["data"]["explorerCode"], "EXPLORER_NO_SOURCE");

	engine.call("session/view", json!({ "index": 0 }));
	let built = engine.call("recommend/build", json!({ "topn": 0 }));
	assert_eq!(built["inserted"], 2);

	// Last insert (C) sits at the root with B to its right.
	let peek = engine.call("recommend/peek", json!({}));
	assert_eq!(peek["root"]["root"]["recordIndex"], 2);
	assert_eq!(peek["root"]["right"]["recordIndex"], 1);

	let accessed = engine.call("recommend/access", json!({ "score": 149 }));
	assert_eq!(accessed["root"]["root"]["recordIndex"], 1);
	assert_eq!(accessed["root"]["left"]["recordIndex"], 2);

	// Access reshapes the tree but not the ranking.
	let collected = engine.call("recommend/collect", json!({ "limit": 5 }));
	let order: Vec<u64> = collected["recommendations"]
		.as_array()
		.unwrap()
		.iter()
		.map(|r| r["index"].as_u64().unwrap())
		.collect();
	assert_eq!(order, vec![1, 2]);

	engine.call("recommend/clear", json!({}));
	assert_eq!(engine.call("recommend/peek", json!({}))["root"], Value::Null);
}

// ---------------------------------------------------------------------------
// Title index and attribute search
// ---------------------------------------------------------------------------

#[test]
fn title_lookup_is_case_insensitive() {
	let mut engine = EngineProcess::spawn();
	engine.call(
		"catalog/load",
		json!({ "records": [
			{ "title": "The Matrix" },
			{ "title": "Heat" },
			{ "title": "the matrix" },
		] }),
	);
	let exact = engine.call("index/lookup", json!({ "title": "  THE MATRIX " }));
	assert_eq!(indices(&exact), vec![0, 2]);
	assert_eq!(exact["count"], 2);

	let missing = engine.call("index/lookup", json!({ "title": "Ronin" }));
	assert!(indices(&missing).is_empty());

	let partial = engine.call("index/partialSearch", json!({ "needle": "EA" }));
	assert_eq!(indices(&partial), vec![1]);

	let blank = engine.call("index/partialSearch", json!({ "needle": "   " }));
	assert!(indices(&blank).is_empty());

	let stats = engine.call("index/stats", json!({}));
	assert_eq!(stats["stats"]["occupied"], 2);
	assert_eq!(stats["stats"]["indexed"], 3);
}

#[test]
fn attribute_searches() {
	let mut engine = EngineProcess::spawn();
	engine.load_abc();

	let director = engine.call("search/director", json!({ "director": "x" }));
	assert_eq!(indices(&director), vec![0, 1]);

	let genre = engine.call("search/genre", json!({ "genre": "COMEDY" }));
	assert_eq!(indices(&genre), vec![0]);

	let partial = engine.call("search/genre", json!({ "genre": "ram", "partial": true }));
	assert_eq!(indices(&partial), vec![0, 1]);

	let year = engine.call("search/year", json!({ "year": 1990 }));
	assert_eq!(indices(&year), vec![2]);
	assert_eq!(year["matches"][0]["title"], "C");

	let empty = engine.call("search/director", json!({ "director": "   " }));
	assert!(indices(&empty).is_empty());
}
