use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = rtl_cli::Args::parse();
    let level = if args.verbose { "debug" } else { "info" };

    let mut filter = EnvFilter::from_default_env();
    for target in ["rtl", "rtl_cli", "rtl_pipeline", "rtl_css"] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    rtl_cli::run(args).await
}
