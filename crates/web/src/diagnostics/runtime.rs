//! Runtime introspection behind [`RuntimeInfo`].
//!
//! [`ProcessRuntime`] is the implementation for the running process. On Linux
//! it reads `/proc`; elsewhere the values it cannot obtain are reported as
//! zero or empty. A Rust process has no managed heap, so the object histogram
//! is always empty.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::monitor::{RequestAnalysis, RequestMonitor};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessorInfo {
    pub processor_count: usize,
    pub system_load_average: f64,
}

/// Memory figures in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryInfo {
    pub total_memory: u64,
    pub free_memory: u64,
    pub resident_memory: u64,
    pub max_resident_memory: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectInfo {
    pub name: String,
    pub count: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThreadDetail {
    pub name: String,
    pub id: u64,
    pub priority: i64,
    pub thread_group: String,
    pub stack_trace: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThreadPoolInfo {
    pub active_count: usize,
    pub core_pool_size: usize,
    pub finished_task_count: u64,
    pub task_count: u64,
    pub queue_size: usize,
}

/// Read-only view of the process, passed explicitly to [`Diagnostics`](super::Diagnostics).
#[cfg_attr(test, mockall::automock)]
pub trait RuntimeInfo: Send + Sync {
    /// Process properties: platform, executable, working directory, environment.
    fn properties(&self) -> BTreeMap<String, String>;

    fn processor(&self) -> ProcessorInfo;

    fn memory(&self) -> MemoryInfo;

    /// Live objects by type name, restricted to names containing `filter`.
    fn objects(&self, filter: &str) -> BTreeMap<String, ObjectInfo>;

    fn threads(&self) -> Vec<ThreadDetail>;

    fn thread_pool(&self) -> ThreadPoolInfo;

    fn requests(&self) -> Vec<RequestAnalysis>;
}

/// Connection task counters maintained by the server accept loop.
#[derive(Debug, Default)]
pub struct TaskCounters {
    spawned: AtomicU64,
    finished: AtomicU64,
}

impl TaskCounters {
    pub fn task_spawned(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }
}

/// [`RuntimeInfo`] for the current process and tokio runtime.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    monitor: Arc<RequestMonitor>,
    tasks: Arc<TaskCounters>,
}

impl ProcessRuntime {
    pub fn new(monitor: Arc<RequestMonitor>, tasks: Arc<TaskCounters>) -> Self {
        Self { monitor, tasks }
    }
}

impl RuntimeInfo for ProcessRuntime {
    fn properties(&self) -> BTreeMap<String, String> {
        let mut properties = std::env::vars().collect::<BTreeMap<_, _>>();
        properties.insert("os.name".into(), std::env::consts::OS.into());
        properties.insert("os.arch".into(), std::env::consts::ARCH.into());
        properties.insert("os.family".into(), std::env::consts::FAMILY.into());
        properties.insert("process.id".into(), std::process::id().to_string());
        if let Ok(exe) = std::env::current_exe() {
            properties.insert("process.executable".into(), exe.display().to_string());
        }
        if let Ok(dir) = std::env::current_dir() {
            properties.insert("process.working_dir".into(), dir.display().to_string());
        }
        properties
    }

    fn processor(&self) -> ProcessorInfo {
        let processor_count = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let system_load_average = read_proc("/proc/loadavg")
            .and_then(|loadavg| loadavg.split_whitespace().next().and_then(|load| load.parse().ok()))
            .unwrap_or(0.0);
        ProcessorInfo { processor_count, system_load_average }
    }

    fn memory(&self) -> MemoryInfo {
        let meminfo = read_proc("/proc/meminfo").unwrap_or_default();
        let status = read_proc("/proc/self/status").unwrap_or_default();
        MemoryInfo {
            total_memory: kib_field(&meminfo, "MemTotal:"),
            free_memory: kib_field(&meminfo, "MemAvailable:"),
            resident_memory: kib_field(&status, "VmRSS:"),
            max_resident_memory: kib_field(&status, "VmHWM:"),
        }
    }

    fn objects(&self, _filter: &str) -> BTreeMap<String, ObjectInfo> {
        BTreeMap::new()
    }

    fn threads(&self) -> Vec<ThreadDetail> {
        let thread_group = read_proc("/proc/self/comm").map(|comm| comm.trim().to_owned()).unwrap_or_default();
        let Ok(entries) = fs::read_dir("/proc/self/task") else {
            return Vec::new();
        };

        let mut threads = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let id = entry.file_name().to_str()?.parse::<u64>().ok()?;
                thread_detail(&entry.path(), id, &thread_group)
            })
            .collect::<Vec<_>>();
        threads.sort_by_key(|thread| thread.id);
        threads
    }

    fn thread_pool(&self) -> ThreadPoolInfo {
        let mut info = ThreadPoolInfo {
            finished_task_count: self.tasks.finished(),
            task_count: self.tasks.spawned(),
            ..ThreadPoolInfo::default()
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let metrics = handle.metrics();
            info.active_count = metrics.num_alive_tasks();
            info.core_pool_size = metrics.num_workers();
            info.queue_size = metrics.global_queue_depth();
        }
        info
    }

    fn requests(&self) -> Vec<RequestAnalysis> {
        self.monitor.snapshot()
    }
}

fn read_proc(path: impl AsRef<Path>) -> Option<String> {
    match fs::read_to_string(path.as_ref()) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(path = %path.as_ref().display(), cause = %e, "proc file unavailable");
            None
        }
    }
}

/// Reads a `Name:   1234 kB` line and returns the value in bytes.
fn kib_field(content: &str, name: &str) -> u64 {
    content
        .lines()
        .find_map(|line| line.strip_prefix(name))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(0, |kib| kib * 1024)
}

fn thread_detail(task_dir: &Path, id: u64, thread_group: &str) -> Option<ThreadDetail> {
    let name = read_proc(task_dir.join("comm"))?.trim().to_owned();
    let stat = read_proc(task_dir.join("stat"))?;
    let (state, priority) = parse_stat(&stat)?;
    Some(ThreadDetail {
        name,
        id,
        priority,
        thread_group: thread_group.to_owned(),
        stack_trace: String::new(),
        state: state_name(state).to_owned(),
    })
}

/// Extracts the state and priority fields of a `/proc/<pid>/task/<tid>/stat` line.
///
/// The command name is parenthesized and may itself contain spaces or
/// parentheses, so fields are counted from the last `)`.
fn parse_stat(stat: &str) -> Option<(char, i64)> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    // state is field 3, priority field 18
    let priority = fields.nth(14)?.parse().ok()?;
    Some((state, priority))
}

fn state_name(state: char) -> &'static str {
    match state {
        'R' => "Running",
        'S' => "Sleeping",
        'D' => "DiskSleep",
        'Z' => "Zombie",
        'T' => "Stopped",
        't' => "TracingStop",
        'I' => "Idle",
        'X' => "Dead",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn stat_line_with_odd_command_name() {
        let stat = "4242 (tokio (rt) 1) S 1 4242 4242 0 -1 4194368 83 0 0 0 1 0 0 0 20 0 9 0 1234 0 0";
        assert_eq!(parse_stat(stat), Some(('S', 20)));
        assert_eq!(parse_stat("garbage"), None);
    }

    #[test]
    fn meminfo_fields_in_bytes() {
        let meminfo = indoc! {"
            MemTotal:       16314520 kB
            MemFree:          612340 kB
            MemAvailable:    9804112 kB
        "};
        assert_eq!(kib_field(meminfo, "MemTotal:"), 16_314_520 * 1024);
        assert_eq!(kib_field(meminfo, "MemAvailable:"), 9_804_112 * 1024);
        assert_eq!(kib_field(meminfo, "SwapTotal:"), 0);
    }

    #[test]
    fn process_runtime_reports_requests_and_tasks() {
        let monitor = Arc::new(RequestMonitor::new());
        let tasks = Arc::new(TaskCounters::default());
        monitor.record("/a", std::time::Duration::from_millis(1));
        tasks.task_spawned();
        tasks.task_spawned();
        tasks.task_finished();

        let runtime = ProcessRuntime::new(monitor, tasks);
        assert_eq!(runtime.requests().len(), 1);
        assert!(runtime.objects("").is_empty());
        assert!(runtime.processor().processor_count >= 1);
        assert_eq!(runtime.properties().get("os.name").map(String::as_str), Some(std::env::consts::OS));

        let pool = runtime.thread_pool();
        assert_eq!((pool.task_count, pool.finished_task_count), (2, 1));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn lists_live_threads_on_linux() {
        let runtime = ProcessRuntime::new(Arc::default(), Arc::default());
        let threads = runtime.threads();

        assert!(!threads.is_empty());
        assert!(threads.iter().any(|thread| thread.id == u64::from(std::process::id())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn thread_pool_reads_tokio_metrics() {
        let runtime = ProcessRuntime::new(Arc::default(), Arc::default());
        assert_eq!(runtime.thread_pool().core_pool_size, 2);
    }
}
