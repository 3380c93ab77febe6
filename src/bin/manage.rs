//! Chronicle management CLI
//!
//! `manage migrate` creates the schema, `manage check` validates settings and
//! connectivity, and `manage runserver` serves the JSON API.

use anyhow::Context;
use chronicle::conf::{EnvSource, Settings, SettingsBuilder, TomlFileSource};
use chronicle::db::{pool, schema};
use chronicle::server::{App, HttpServer, shutdown_signal};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "chronicle.toml";

#[derive(Parser)]
#[command(name = "manage")]
#[command(about = "Chronicle management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (default: ./chronicle.toml when present)
	#[arg(short, long, value_name = "FILE", global = true)]
	config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Create the database schema
	Migrate,

	/// Start the HTTP server
	Runserver {
		/// Address to bind, overriding server.host and server.port
		#[arg(value_name = "ADDRESS")]
		address: Option<SocketAddr>,
	},

	/// Validate settings and check the database and media root
	Check,
}

fn load_settings(config: Option<&PathBuf>) -> anyhow::Result<Settings> {
	let file = match config {
		Some(path) => TomlFileSource::new(path),
		None => TomlFileSource::optional(DEFAULT_CONFIG_FILE),
	};
	SettingsBuilder::new()
		.add_source(file)
		.add_source(EnvSource::new())
		.build()
		.context("failed to load settings")
}

/// `RUST_LOG` wins over `logging.filter`
fn init_tracing(settings: &Settings) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.logging.filter))
		.unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
	let pool = pool::connect(&settings.database)
		.await
		.context("failed to connect to the database")?;
	schema::create_schema(&pool)
		.await
		.context("failed to create the schema")?;
	tracing::info!(database = %settings.database.url, "schema is up to date");
	Ok(())
}

async fn runserver(settings: &Settings, address: Option<SocketAddr>) -> anyhow::Result<()> {
	let addr = match address {
		Some(addr) => addr,
		None => settings.bind_addr()?,
	};
	let pool = pool::connect(&settings.database)
		.await
		.context("failed to connect to the database")?;
	schema::create_schema(&pool)
		.await
		.context("failed to create the schema")?;

	HttpServer::new(App::new(settings, pool))
		.with_max_body_bytes(settings.server.max_body_bytes)
		.listen_with_shutdown(addr, shutdown_signal())
		.await?;
	tracing::info!("server stopped");
	Ok(())
}

async fn check(settings: &Settings) -> anyhow::Result<()> {
	let pool = pool::connect(&settings.database)
		.await
		.context("failed to connect to the database")?;
	pool.close().await;

	tokio::fs::create_dir_all(&settings.media.root)
		.await
		.with_context(|| {
			format!(
				"media root {} is not writable",
				settings.media.root.display()
			)
		})?;

	println!("System check identified no issues.");
	Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let settings = load_settings(cli.config.as_ref())?;
	init_tracing(&settings);

	match cli.command {
		Commands::Migrate => migrate(&settings).await,
		Commands::Runserver { address } => runserver(&settings, address).await,
		Commands::Check => check(&settings).await,
	}
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	if let Err(e) = run(cli).await {
		eprintln!("Error: {:#}", e);
		process::exit(1);
	}
}
