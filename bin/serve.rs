use catalog_ingest::logging::{init_logging, DEFAULT_FILTER};
use catalog_ingest::CatalogConfig;
use clap::{Arg, Command};
use std::net::SocketAddr;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("serve")
        .about("Serve the product catalog over HTTP")
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML config file; defaults apply when omitted")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .help("Listen address, overrides config and CATALOG_BIND")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .get_matches();

    init_logging(DEFAULT_FILTER)?;

    let mut config = CatalogConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(bind) = matches.get_one::<SocketAddr>("bind") {
        config.bind = *bind;
    }

    catalog_ingest::server::serve(&config).await?;
    Ok(())
}
