use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::explorer::ExplorerConfig;
use crate::reco_store::DEFAULT_TOPN;
use crate::splay::TieBreak;
use crate::title_index::IndexConfig;

#[derive(Parser, Debug)]
#[command(name = "cinedex-engine", about = "Movie catalog explorer over JSON-RPC 2.0 / NDJSON stdio")]
pub struct CliArgs {
	/// JSON catalog (array of records) to load before serving requests
	#[arg(long, env = "CINEDEX_CATALOG")]
	pub catalog: Option<PathBuf>,

	/// Recommendations kept per build when a request names no size (0 = all)
	#[arg(long, default_value_t = DEFAULT_TOPN, env = "CINEDEX_TOPN")]
	pub topn: usize,

	/// Smallest title index capacity
	#[arg(long, default_value = "16", env = "CINEDEX_MIN_CAPACITY")]
	pub min_capacity: usize,

	/// Title index slots per record, before rounding up to a power of two
	#[arg(long, default_value = "2", env = "CINEDEX_CAPACITY_FACTOR")]
	pub capacity_factor: usize,

	/// Upper bound on title index capacity
	#[arg(long, env = "CINEDEX_CAPACITY_CEILING")]
	pub capacity_ceiling: Option<usize>,

	/// Load factor (0-1) at which the title index logs a warning
	#[arg(long, default_value = "0.8", env = "CINEDEX_LOAD_FACTOR_WARN", value_parser = parse_load_factor_warn)]
	pub load_factor_warn: f64,

	/// How equal scores are kept apart in the recommendation tree
	#[arg(long, value_enum, default_value = "nudge", env = "CINEDEX_TIE_BREAK")]
	pub tie_break: TieBreakArg,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "info", env = "CINEDEX_LOG_LEVEL")]
	pub log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreakArg {
	/// Bump a colliding score by one
	Nudge,
	/// Order equal scores by insertion
	Sequence,
}

impl From<TieBreakArg> for TieBreak {
	fn from(arg: TieBreakArg) -> Self {
		match arg {
			TieBreakArg::Nudge => TieBreak::Nudge,
			TieBreakArg::Sequence => TieBreak::Sequence,
		}
	}
}

fn parse_load_factor_warn(raw: &str) -> Result<f64, String> {
	let threshold: f64 = raw.parse().map_err(|e| format!("{e}"))?;
	IndexConfig::check_load_factor_warn(threshold)
}

impl CliArgs {
	pub fn explorer_config(&self) -> ExplorerConfig {
		ExplorerConfig {
			default_topn: self.topn,
			index: IndexConfig {
				min_capacity: self.min_capacity,
				capacity_factor: self.capacity_factor,
				capacity_ceiling: self.capacity_ceiling,
				load_factor_warn: self.load_factor_warn,
			},
			tie_break: self.tie_break.into(),
		}
	}
}
