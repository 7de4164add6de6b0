//! Serves a directory with caching headers, byte ranges and the diagnostics endpoint.
//!
//! ```text
//! cargo run -p strand-web --example static_server -- ./www 127.0.0.1:8080
//! curl -i http://127.0.0.1:8080/index.html -H 'Range: bytes=0-99'
//! curl 'http://127.0.0.1:8080/monitor?Type=ThreadPool'
//! ```

use std::time::Duration;

use strand_web::Server;
use strand_web::cache::CachePolicy;
use tracing::{Level, error};

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let root = args.next().unwrap_or_else(|| ".".into());
    let address = args.next().unwrap_or_else(|| "127.0.0.1:8080".into());

    let server = match Server::builder()
        .address(address)
        .root(root)
        .log_dir("logs")
        .max_level(Level::DEBUG)
        .cache_policy(CachePolicy::new(Duration::from_secs(3600)))
        .build()
    {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            eprintln!("invalid server configuration: {e}");
            return;
        }
    };

    server.start().await;
}
