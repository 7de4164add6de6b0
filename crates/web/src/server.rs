//! Server bootstrap: static files under a root directory plus the diagnostics endpoint.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Local;
use http::{HeaderValue, Method, StatusCode, header};
use strand_http::connection::ServerConnection;
use strand_http::handler::Handler;
use strand_http::protocol::{HttpRequest, HttpResponse};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::cache::CachePolicy;
use crate::diagnostics::{AccessLog, Diagnostics, LogFiles, ProcessRuntime, TaskCounters};
use crate::monitor::RequestMonitor;
use crate::static_files::{StaticError, StaticFiles};

pub const DEFAULT_MONITOR_PATH: &str = "/monitor";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    root: Option<PathBuf>,
    monitor_path: String,
    log_dir: PathBuf,
    max_level: Level,
    cache_policy: CachePolicy,
    access_log: bool,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            address: None,
            root: None,
            monitor_path: DEFAULT_MONITOR_PATH.to_owned(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            max_level: Level::INFO,
            cache_policy: CachePolicy::default(),
            access_log: true,
        }
    }

    /// Address resolution errors are reported by [`build`](Self::build).
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Directory the static files are served from.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn monitor_path(mut self, monitor_path: impl Into<String>) -> Self {
        self.monitor_path = monitor_path.into();
        self
    }

    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn max_level(mut self, max_level: Level) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Whether served requests are appended to `access.log`, on by default.
    pub fn access_log(mut self, enabled: bool) -> Self {
        self.access_log = enabled;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        let root = self.root.ok_or(ServerBuildError::MissingRoot)?;

        let monitor = Arc::new(RequestMonitor::new());
        let tasks = Arc::new(TaskCounters::default());
        let runtime = Arc::new(ProcessRuntime::new(Arc::clone(&monitor), Arc::clone(&tasks)));

        Ok(Server {
            address,
            static_files: StaticFiles::new(root).cache_policy(self.cache_policy),
            diagnostics: Diagnostics::new(runtime, LogFiles::new(self.log_dir.clone())),
            monitor_path: self.monitor_path,
            log_dir: self.log_dir,
            max_level: self.max_level,
            access_log_enabled: self.access_log,
            access_log: None,
            monitor,
            tasks,
        })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error("root directory must be set")]
    MissingRoot,
    #[error("invalid address: {0}")]
    InvalidAddress(#[source] io::Error),
}

#[derive(Debug)]
pub struct Server {
    address: Vec<SocketAddr>,
    static_files: StaticFiles,
    diagnostics: Diagnostics,
    monitor_path: String,
    log_dir: PathBuf,
    max_level: Level,
    access_log_enabled: bool,
    access_log: Option<AccessLog>,
    monitor: Arc<RequestMonitor>,
    tasks: Arc<TaskCounters>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    pub async fn start(mut self) {
        let subscriber = FmtSubscriber::builder().with_max_level(self.max_level).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            warn!(cause = %e, "tracing subscriber already installed");
        }

        if self.access_log_enabled {
            match AccessLog::open(&self.log_dir).await {
                Ok(access_log) => self.access_log = Some(access_log),
                Err(e) => warn!(cause = %e, log_dir = %self.log_dir.display(), "access log disabled"),
            }
        }

        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        let handler = Arc::new(self);
        loop {
            let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            handler.tasks.task_spawned();

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = ServerConnection::new(reader, writer);
                match connection.process(Arc::clone(&handler)).await {
                    Ok(()) => {
                        info!("finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!("service has error, cause {}, connection shutdown", e);
                    }
                }
                handler.tasks.task_finished();
            });
        }
    }

    async fn dispatch(&self, req: &HttpRequest) -> Result<HttpResponse, StaticError> {
        if req.path() == self.monitor_path {
            return Ok(self.diagnostics.respond(req).await);
        }

        if *req.method() != Method::GET {
            let mut response = HttpResponse::new(StatusCode::METHOD_NOT_ALLOWED);
            response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET"));
            return Ok(response);
        }

        match self.static_files.serve(req).await {
            Ok(response) => Ok(response),
            Err(StaticError::ResourceNotFound { path }) => {
                info!(path = %path, "resource not found");
                Ok(HttpResponse::new(StatusCode::NOT_FOUND))
            }
            Err(e) => Err(e),
        }
    }

    async fn log_access(&self, req: &HttpRequest, status: Option<StatusCode>, elapsed_ms: u128) {
        let Some(access_log) = &self.access_log else {
            return;
        };
        let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let line = format!(
            "{} {} {} {} {}ms",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            req.method(),
            req.uri(),
            status.as_u16(),
            elapsed_ms
        );
        if let Err(e) = access_log.append(&line).await {
            warn!(cause = %e, "failed to write access log");
        }
    }
}

#[async_trait]
impl Handler for Server {
    type Error = StaticError;

    async fn call(&self, req: HttpRequest) -> Result<HttpResponse, Self::Error> {
        let started = Instant::now();
        let result = self.dispatch(&req).await;
        let elapsed = started.elapsed();

        // misses are not tracked, so unknown paths cannot grow the monitor
        if result.as_ref().is_ok_and(|response| is_resolved(response.status())) {
            self.monitor.record(req.path(), elapsed);
        }
        self.log_access(&req, result.as_ref().ok().map(HttpResponse::status), elapsed.as_millis()).await;
        result
    }
}

fn is_resolved(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_MODIFIED
}
