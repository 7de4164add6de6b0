//! Static resource delivery and diagnostics for the strand framework.
//!
//! Built on the `strand-http` codec, this crate answers requests for files
//! under a root directory with conditional (`304`) and partial (`206`)
//! responses, and exposes process diagnostics on a single endpoint.
//!
//! # Example
//!
//! ```no_run
//! use strand_web::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .address("127.0.0.1:8080")
//!         .root("./www")
//!         .build()
//!         .unwrap();
//!
//!     server.start().await;
//! }
//! ```
//!
//! # Modules
//!
//! - [`cache`]: entity tags and `If-None-Match` / `If-Modified-Since` validation
//! - [`range`]: single byte `Range` parsing and resolution
//! - [`content_type`]: extension to MIME type lookup
//! - [`store`]: the resource store abstraction and its `tokio::fs` implementation
//! - [`static_files`]: the request orchestrator tying the above together
//! - [`diagnostics`]: runtime snapshots and log tails
//! - [`monitor`]: per-path request statistics

pub mod cache;
pub mod content_type;
pub mod diagnostics;
pub mod monitor;
pub mod range;
pub mod static_files;
pub mod store;

mod server;

pub use server::DEFAULT_LOG_DIR;
pub use server::DEFAULT_MONITOR_PATH;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use static_files::StaticError;
pub use static_files::StaticFiles;
