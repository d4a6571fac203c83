use clap::Parser;

use folio_worker::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	folio_worker::run(Args::parse()).await
}
