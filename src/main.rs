use anyhow::Result;
use clap::Parser;
use research_digest::cli;
use research_digest::launch;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = args.into_config()?;
    cli::init_tracing(&config);

    let outcome = launch(&config).await?;
    println!("{}", cli::render_outcome(&outcome));
    Ok(())
}
