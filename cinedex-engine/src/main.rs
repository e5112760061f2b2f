use anyhow::{Context, Result};
use clap::Parser;
use cinedex_engine::config::CliArgs;
use cinedex_engine::server::ExplorerServer;
use cinedex_engine::transport::NdjsonTransport;

fn main() -> Result<()> {
	let args = CliArgs::parse();

	// Logs go to stderr; stdout carries the JSON-RPC stream
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let config = args.explorer_config();
	tracing::debug!(?config, "Explorer configuration");

	let transport = NdjsonTransport::new();
	let mut server = ExplorerServer::new(transport, config);

	if let Some(path) = &args.catalog {
		tracing::info!(path = %path.display(), "Preloading catalog");
		server
			.preload(path)
			.with_context(|| format!("failed to load catalog {}", path.display()))?;
	}

	tracing::info!("cinedex-engine ready");
	server.run()?;
	Ok(())
}
