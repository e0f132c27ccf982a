use std::cmp::Ordering;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use sysinfo::{Disks, System};
use tracing::{debug, warn};

use super::{
    render_report, CpuReading, DiskReading, MemoryReading, NetworkReading, ProcessReading,
    Readings, ReportSource,
};
use crate::i18n::Texts;

const TOP_PROCESSES: usize = 5;
const EXTERNAL_IP_URL: &str = "https://api.ipify.org?format=json";
const EXTERNAL_IP_TIMEOUT: Duration = Duration::from_secs(5);
const NOT_AVAILABLE: &str = "N/A";

#[derive(Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// Takes readings from the local machine with sysinfo.
pub struct SystemCollector {
    monitor_all_disks: bool,
    texts: &'static Texts,
    client: reqwest::Client,
    external_ip_url: String,
}

impl SystemCollector {
    pub fn new(monitor_all_disks: bool, texts: &'static Texts) -> Self {
        Self {
            monitor_all_disks,
            texts,
            client: reqwest::Client::new(),
            external_ip_url: EXTERNAL_IP_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_external_ip_url(mut self, url: &str) -> Self {
        self.external_ip_url = url.to_string();
        self
    }

    async fn network_reading(&self) -> NetworkReading {
        let hostname = System::host_name();
        let local_ip = match &hostname {
            Some(name) => local_ip(name).await,
            None => None,
        };
        NetworkReading {
            hostname: hostname.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            local_ip: local_ip.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            external_ip: external_ip(&self.client, &self.external_ip_url)
                .await
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }

    /// Blocking: CPU usage needs two samples taken apart.
    fn collect(monitor_all_disks: bool) -> Readings {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_processes();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu();
        sys.refresh_processes();
        sys.refresh_memory();

        let processes = process_readings(&sys);

        Readings {
            network: None,
            cpu: cpu_reading(&sys),
            memory: memory_reading(&sys),
            disks: disk_readings(monitor_all_disks),
            top_cpu: top_by(&processes, |a, b| {
                b.cpu_percent
                    .partial_cmp(&a.cpu_percent)
                    .unwrap_or(Ordering::Equal)
            }),
            top_memory: top_by(&processes, |a, b| b.memory_bytes.cmp(&a.memory_bytes)),
        }
    }
}

#[async_trait]
impl ReportSource for SystemCollector {
    async fn build_report(&self, display_name: &str) -> Result<String> {
        let monitor_all_disks = self.monitor_all_disks;
        let mut readings = tokio::task::spawn_blocking(move || Self::collect(monitor_all_disks))
            .await
            .context("System metrics collection panicked")?;
        readings.network = Some(self.network_reading().await);

        debug!(
            "Collected readings: cpu={} memory={} disks={} processes={}",
            readings.cpu.is_some(),
            readings.memory.is_some(),
            readings.disks.as_ref().map_or(0, Vec::len),
            readings.top_cpu.as_ref().map_or(0, Vec::len),
        );

        Ok(render_report(
            display_name,
            Local::now(),
            &readings,
            &self.texts.report,
        ))
    }
}

/// Address the host name resolves to, preferring a non-loopback IPv4 one.
async fn local_ip(hostname: &str) -> Option<String> {
    let addrs: Vec<IpAddr> = match tokio::net::lookup_host((hostname, 0)).await {
        Ok(addrs) => addrs.map(|a| a.ip()).collect(),
        Err(e) => {
            warn!("Failed to resolve local IP for {}: {}", hostname, e);
            return None;
        }
    };
    addrs
        .iter()
        .find(|ip| ip.is_ipv4() && !ip.is_loopback())
        .or_else(|| addrs.iter().find(|ip| ip.is_ipv4()))
        .or_else(|| addrs.first())
        .map(ToString::to_string)
}

async fn external_ip(client: &reqwest::Client, url: &str) -> Option<String> {
    let response = match client.get(url).timeout(EXTERNAL_IP_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!("External IP lookup returned HTTP {}", response.status());
            return None;
        }
        Err(e) => {
            warn!("Failed to get external IP: {}", e.without_url());
            return None;
        }
    };
    match response.json::<IpifyResponse>().await {
        Ok(body) => Some(body.ip),
        Err(e) => {
            warn!("Failed to decode external IP response: {}", e);
            None
        }
    }
}

fn cpu_reading(sys: &System) -> Option<CpuReading> {
    let cores = sys.cpus().len();
    if cores == 0 {
        return None;
    }
    Some(CpuReading {
        cores,
        load_percent: sys.global_cpu_info().cpu_usage(),
    })
}

fn memory_reading(sys: &System) -> Option<MemoryReading> {
    let total = sys.total_memory();
    if total == 0 {
        return None;
    }
    Some(MemoryReading {
        total,
        used: sys.used_memory(),
        available: sys.available_memory(),
    })
}

fn disk_readings(monitor_all_disks: bool) -> Option<Vec<DiskReading>> {
    let disks = Disks::new_with_refreshed_list();
    let all: Vec<DiskReading> = disks
        .list()
        .iter()
        .filter(|d| d.total_space() > 0)
        .map(|d| DiskReading {
            mount_point: d.mount_point().display().to_string(),
            total: d.total_space(),
            free: d.available_space(),
        })
        .collect();

    let selected = select_disks(all, monitor_all_disks);
    if selected.is_empty() {
        None
    } else {
        Some(selected)
    }
}

/// All disks, or just the system disk: the one mounted at `/` (or `C:\`), else the first.
fn select_disks(mut disks: Vec<DiskReading>, monitor_all_disks: bool) -> Vec<DiskReading> {
    if monitor_all_disks || disks.len() <= 1 {
        return disks;
    }
    let system_root = disks.iter().position(|d| {
        let mount = Path::new(&d.mount_point);
        mount == Path::new("/") || d.mount_point.eq_ignore_ascii_case("C:\\")
    });
    let keep = system_root.unwrap_or(0);
    vec![disks.swap_remove(keep)]
}

fn process_readings(sys: &System) -> Vec<ProcessReading> {
    let total_memory = sys.total_memory();
    sys.processes()
        .values()
        .map(|p| ProcessReading {
            pid: p.pid().as_u32(),
            name: p.name().to_string(),
            cpu_percent: p.cpu_usage(),
            memory_bytes: p.memory(),
            memory_percent: if total_memory == 0 {
                0.0
            } else {
                p.memory() as f64 / total_memory as f64 * 100.0
            },
        })
        .collect()
}

fn top_by<F>(processes: &[ProcessReading], cmp: F) -> Option<Vec<ProcessReading>>
where
    F: FnMut(&ProcessReading, &ProcessReading) -> Ordering,
{
    if processes.is_empty() {
        return None;
    }
    let mut sorted = processes.to_vec();
    sorted.sort_by(cmp);
    sorted.truncate(TOP_PROCESSES);
    Some(sorted)
}
