use std::{fs, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use homebook_config::Config;
use homebook_service::{
	AddAddressRequest, AddressBook, AddressSearchEngine, HttpGeocodingGateway, PgAddressStore,
	SearchOutcome, SearchSettings,
};
use homebook_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = homebook_cli::VERSION,
	rename_all = "kebab",
	styles = homebook_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Geocode a free-text query and print the resolved locations.
	Search { query: String },
	/// Print every address, grouped by country unless `--flat` is given.
	List {
		#[arg(long)]
		flat: bool,
	},
	/// Print the current address, if any.
	Current,
	SetCurrent { address_id: Uuid },
	ClearCurrent { address_id: Uuid },
	/// Create an address from a JSON request file.
	Add {
		#[arg(long, value_name = "FILE")]
		request: PathBuf,
	},
	Delete { address_id: Uuid },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = homebook_config::load(&args.config)?;

	init_tracing(&config);

	match args.command {
		Command::Search { query } => search(&config, &query).await,
		Command::List { flat: true } => print_json(&open(&config).await?.list().await?),
		Command::List { flat: false } =>
			print_json(&open(&config).await?.list_by_country().await?),
		Command::Current => print_json(&open(&config).await?.current().await?),
		Command::SetCurrent { address_id } =>
			print_json(&open(&config).await?.set_current(address_id).await?),
		Command::ClearCurrent { address_id } =>
			print_json(&open(&config).await?.clear_current(address_id).await?),
		Command::Add { request } => {
			let raw = fs::read_to_string(&request)?;
			let req: AddAddressRequest = serde_json::from_str(&raw)?;

			print_json(&open(&config).await?.create(req).await?)
		},
		Command::Delete { address_id } =>
			print_json(&open(&config).await?.delete(address_id).await?),
	}
}

async fn open(config: &Config) -> color_eyre::Result<AddressBook> {
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	tracing::debug!("Address store ready.");

	Ok(AddressBook::new(config, Arc::new(PgAddressStore::new(db))))
}

async fn search(config: &Config, query: &str) -> color_eyre::Result<()> {
	let gateway = HttpGeocodingGateway::new(config.providers.geocoding.clone());
	let engine = AddressSearchEngine::new(Arc::new(gateway), SearchSettings::from_config(config));

	match engine.search(query).await {
		SearchOutcome::Completed(_) => print_json(&engine.snapshot()),
		SearchOutcome::Cancelled => Err(eyre::eyre!("Search was cancelled.")),
		SearchOutcome::Failed { message } => Err(eyre::eyre!("Search failed: {message}")),
	}
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: ?Sized + Serialize,
{
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
