//! Diagnostics endpoint.
//!
//! A request carries the parameter `Type` naming a [`Category`]. The matching
//! [`RuntimeInfo`] result is serialized to JSON and escaped onto a single
//! line: `\` becomes `\/`, then CR becomes `\r`, then LF becomes `\n`.
//!
//! | Type          | body                                        |
//! |---------------|---------------------------------------------|
//! | `JVM`         | process properties                          |
//! | `CPU`         | processor count and load average            |
//! | `Memory`      | memory figures                              |
//! | `Objects`     | object histogram filtered by `Param1`       |
//! | `ObjectCount` | number of histogram entries, decimal        |
//! | `Threads`     | per-thread detail                           |
//! | `ThreadCount` | number of threads, decimal                  |
//! | `ThreadPool`  | worker pool counters                        |
//! | `RequestInfo` | per-path request statistics                 |
//! | `Log`         | last `Param2` lines of log `Param1`, as is  |
//!
//! Anything else, and any failure, yields an empty body.

mod logs;
mod runtime;

use std::fmt;
use std::sync::Arc;

use http::{HeaderValue, header};
use serde::Serialize;
use strand_http::protocol::{HttpRequest, HttpResponse, Params};
use tracing::{debug, warn};

pub use logs::{ACCESS_LOG, AccessLog, LogCategory, LogFiles};
pub use runtime::{
    MemoryInfo, ObjectInfo, ProcessRuntime, ProcessorInfo, RuntimeInfo, TaskCounters, ThreadDetail, ThreadPoolInfo,
};

const TYPE_PARAM: &str = "Type";
const FIRST_PARAM: &str = "Param1";
const SECOND_PARAM: &str = "Param2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Jvm,
    Cpu,
    Memory,
    Objects,
    ObjectCount,
    Threads,
    ThreadCount,
    ThreadPool,
    RequestInfo,
    Log,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        let category = match name {
            "JVM" => Self::Jvm,
            "CPU" => Self::Cpu,
            "Memory" => Self::Memory,
            "Objects" => Self::Objects,
            "ObjectCount" => Self::ObjectCount,
            "Threads" => Self::Threads,
            "ThreadCount" => Self::ThreadCount,
            "ThreadPool" => Self::ThreadPool,
            "RequestInfo" => Self::RequestInfo,
            "Log" => Self::Log,
            _ => return None,
        };
        Some(category)
    }
}

/// Produces diagnostics snapshots from a runtime handle and the log directory.
pub struct Diagnostics {
    runtime: Arc<dyn RuntimeInfo>,
    logs: LogFiles,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").field("logs", &self.logs).finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(runtime: Arc<dyn RuntimeInfo>, logs: LogFiles) -> Self {
        Self { runtime, logs }
    }

    /// Answers a diagnostics request with `200` and the snapshot as body.
    pub async fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let mut response = HttpResponse::ok(self.snapshot(request.params()).await);
        response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }

    pub async fn snapshot(&self, params: &Params) -> String {
        let Some(category) = params.get(TYPE_PARAM).and_then(Category::parse) else {
            debug!(kind = ?params.get(TYPE_PARAM), "unknown diagnostics category");
            return String::new();
        };

        if category == Category::Log {
            return self.log_tail(params).await;
        }

        // the runtime reads blocking sources such as `/proc`
        let runtime = Arc::clone(&self.runtime);
        let filter = params.get(FIRST_PARAM).unwrap_or_default().to_owned();
        match tokio::task::spawn_blocking(move || collect(runtime.as_ref(), category, &filter)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(cause = %e, ?category, "diagnostics collection failed");
                String::new()
            }
        }
    }

    async fn log_tail(&self, params: &Params) -> String {
        let Some(category) = params.get(FIRST_PARAM).and_then(LogCategory::parse) else {
            debug!(category = ?params.get(FIRST_PARAM), "unknown log category");
            return String::new();
        };
        let Some(lines) = params.get(SECOND_PARAM).and_then(|lines| lines.parse::<usize>().ok()) else {
            debug!(lines = ?params.get(SECOND_PARAM), "invalid log line count");
            return String::new();
        };

        match self.logs.tail(category, lines).await {
            Ok(tail) => tail,
            Err(e) => {
                warn!(cause = %e, ?category, "failed to read log file");
                String::new()
            }
        }
    }
}

fn collect(runtime: &dyn RuntimeInfo, category: Category, filter: &str) -> String {
    match category {
        Category::Jvm => to_json_line(&runtime.properties()),
        Category::Cpu => to_json_line(&runtime.processor()),
        Category::Memory => to_json_line(&runtime.memory()),
        Category::Objects => to_json_line(&runtime.objects(filter)),
        Category::ObjectCount => runtime.objects("").len().to_string(),
        Category::Threads => to_json_line(&runtime.threads()),
        Category::ThreadCount => runtime.threads().len().to_string(),
        Category::ThreadPool => to_json_line(&runtime.thread_pool()),
        Category::RequestInfo => to_json_line(&runtime.requests()),
        Category::Log => String::new(),
    }
}

/// Serializes `value` and escapes it onto a single line.
fn to_json_line<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => escape(&json),
        Err(e) => {
            warn!(cause = %e, "failed to serialize diagnostics");
            String::new()
        }
    }
}

fn escape(json: &str) -> String {
    json.replace('\\', "\\/").replace('\r', "\\r").replace('\n', "\\n")
}
