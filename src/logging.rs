use crate::{CatalogError, CatalogResult};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "catalog_ingest=info,tower_http=info";

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`;
/// `CATALOG_LOG_JSON=1` switches to JSON lines.
pub fn init_logging(default_filter: &str) -> CatalogResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = std::env::var("CATALOG_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| CatalogError::Config(format!("failed to initialize tracing: {e}")))
}
