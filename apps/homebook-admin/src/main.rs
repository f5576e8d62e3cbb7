use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = homebook_admin::Args::parse();

	homebook_admin::run(args).await
}
