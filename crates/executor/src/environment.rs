use execstream_protocol::TableContent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use sysinfo::System;

/// Point-in-time description of the host a worker runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub workspace: String,
    pub cpu_count: usize,
    pub process_count: usize,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub uptime_seconds: u64,
}

impl HostSnapshot {
    pub fn capture(workspace: &Path) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os: System::long_os_version()
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
            kernel: System::kernel_version().unwrap_or_default(),
            workspace: workspace.display().to_string(),
            cpu_count: sys.cpus().len(),
            process_count: sys.processes().len(),
            memory_used_mb: sys.used_memory() / 1024 / 1024,
            memory_total_mb: sys.total_memory() / 1024 / 1024,
            uptime_seconds: System::uptime(),
        }
    }

    /// Two-column table suitable for a `table` event.
    pub fn to_table(&self) -> TableContent {
        let rows = vec![
            vec![json!("Hostname"), json!(self.hostname)],
            vec![json!("OS"), json!(self.os)],
            vec![json!("Kernel"), json!(self.kernel)],
            vec![json!("Workspace"), json!(self.workspace)],
            vec![json!("CPUs"), json!(self.cpu_count)],
            vec![json!("Processes"), json!(self.process_count)],
            vec![
                json!("Memory"),
                json!(format!("{}/{} MB", self.memory_used_mb, self.memory_total_mb)),
            ],
            vec![json!("Uptime"), json!(format!("{}s", self.uptime_seconds))],
        ];

        let mut metadata = serde_json::Map::new();
        metadata.insert("title".to_string(), json!("System information"));

        TableContent {
            header: vec![json!("Property"), json!("Value")],
            rows,
            metadata,
        }
    }
}
