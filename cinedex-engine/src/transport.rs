use std::io::{self, Write};

use serde::Serialize;

use crate::error::ExplorerError;

#[derive(Serialize)]
struct Reply<'a> {
	jsonrpc: &'static str,
	id: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	result: Option<&'a serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<ErrorBody<'a>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
	code: i32,
	message: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	data: Option<&'a serde_json::Value>,
}

/// Writes one JSON-RPC reply per line. Each reply is serialized in full
/// before a single write, so a failed serialization never leaves half a line
/// on the stream.
pub struct NdjsonTransport<W = io::Stdout> {
	out: W,
}

impl Default for NdjsonTransport {
	fn default() -> Self {
		Self::new()
	}
}

impl NdjsonTransport {
	pub fn new() -> Self {
		Self { out: io::stdout() }
	}
}

impl<W: Write> NdjsonTransport<W> {
	pub fn with_writer(out: W) -> Self {
		Self { out }
	}

	pub fn into_inner(self) -> W {
		self.out
	}

	pub fn write_response(&mut self, id: u64, result: serde_json::Value) {
		self.write_reply(&Reply {
			jsonrpc: "2.0",
			id,
			result: Some(&result),
			error: None,
		});
	}

	pub fn write_error(
		&mut self,
		id: u64,
		code: i32,
		message: impl AsRef<str>,
		data: Option<serde_json::Value>,
	) {
		self.write_reply(&Reply {
			jsonrpc: "2.0",
			id,
			result: None,
			error: Some(ErrorBody {
				code,
				message: message.as_ref(),
				data: data.as_ref(),
			}),
		});
	}

	/// Error reply for a failed explorer operation, with the
	/// `{explorerCode, message}` payload attached as `data`.
	pub fn write_explorer_error(&mut self, id: u64, err: &ExplorerError) {
		tracing::debug!(id, code = err.code(), "Request failed: {}", err);
		self.write_error(id, err.json_rpc_code(), err.to_string(), Some(err.to_json_rpc_error()));
	}

	fn write_reply(&mut self, reply: &Reply<'_>) {
		let mut line = match serde_json::to_vec(reply) {
			Ok(line) => line,
			Err(e) => {
				tracing::error!(id = reply.id, "Failed to serialize reply: {}", e);
				return;
			}
		};
		line.push(b'\n');
		if let Err(e) = self.out.write_all(&line).and_then(|()| self.out.flush()) {
			tracing::error!(id = reply.id, "Failed to write reply: {}", e);
		}
	}
}
