//! System report: readings taken from the host, rendered as Telegram HTML.
//!
//! Each section of the report is optional. A reading that could not be taken
//! is `None` and its section is left out instead of failing the whole report.

pub mod system;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::i18n::ReportTexts;

pub use system::SystemCollector;

/// Produces the human-readable report for a host.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn build_report(&self, display_name: &str) -> Result<String>;
}

/// Network identity of the host. Values that could not be read are `N/A`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkReading {
    pub hostname: String,
    pub local_ip: String,
    pub external_ip: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuReading {
    pub cores: usize,
    pub load_percent: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryReading {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl MemoryReading {
    pub fn used_percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskReading {
    pub mount_point: String,
    pub total: u64,
    pub free: u64,
}

impl DiskReading {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }

    pub fn used_percent(&self) -> f64 {
        percent(self.used(), self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReading {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub memory_percent: f64,
}

/// Everything a report can show. Missing readings drop their section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    pub network: Option<NetworkReading>,
    pub cpu: Option<CpuReading>,
    pub memory: Option<MemoryReading>,
    pub disks: Option<Vec<DiskReading>>,
    pub top_cpu: Option<Vec<ProcessReading>>,
    pub top_memory: Option<Vec<ProcessReading>>,
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Render a byte count with binary units and one decimal, e.g. `1.5 GB`.
pub fn format_bytes(bytes: u64, units: &[&str; 6]) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < units.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, units[unit])
}

fn escape(text: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_text(text)
}

fn branch(is_last: bool) -> &'static str {
    if is_last {
        "└"
    } else {
        "├"
    }
}

pub fn render_report(
    display_name: &str,
    taken_at: DateTime<Local>,
    readings: &Readings,
    texts: &ReportTexts,
) -> String {
    let mut out = format!("{}\n\n", texts.title);
    if !display_name.is_empty() {
        out.push_str(&format!("{} {}\n", texts.computer, escape(display_name)));
    }
    out.push_str(&format!(
        "{} {}\n\n",
        texts.time,
        taken_at.format("%d.%m.%Y %H:%M:%S")
    ));

    if let Some(net) = &readings.network {
        out.push_str(&format!("{}\n", texts.network));
        out.push_str(&format!("├ {}: {}\n", texts.hostname, escape(&net.hostname)));
        out.push_str(&format!("├ {}: {}\n", texts.local_ip, escape(&net.local_ip)));
        out.push_str(&format!(
            "└ {}: {}\n\n",
            texts.external_ip,
            escape(&net.external_ip)
        ));
    }

    if let Some(cpu) = &readings.cpu {
        out.push_str(&format!("{}\n", texts.cpu));
        out.push_str(&format!("├ {}: {}\n", texts.cores, cpu.cores));
        out.push_str(&format!("└ {}: {:.1}%\n\n", texts.load, cpu.load_percent));
    }

    if let Some(mem) = &readings.memory {
        out.push_str(&format!("{}\n", texts.memory));
        out.push_str(&format!(
            "├ {}: {}\n",
            texts.total,
            format_bytes(mem.total, &texts.units)
        ));
        out.push_str(&format!(
            "├ {}: {} ({:.1}%)\n",
            texts.used,
            format_bytes(mem.used, &texts.units),
            mem.used_percent()
        ));
        out.push_str(&format!(
            "└ {}: {}\n\n",
            texts.available,
            format_bytes(mem.available, &texts.units)
        ));
    }

    if let Some(disks) = readings.disks.as_ref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("{}\n", texts.disks));
        for (i, disk) in disks.iter().enumerate() {
            let is_last = i + 1 == disks.len();
            let indent = if is_last { "  " } else { "│ " };
            out.push_str(&format!(
                "{} <b>{}</b>\n",
                branch(is_last),
                escape(&disk.mount_point)
            ));
            out.push_str(&format!(
                "{}├ {}: {}\n",
                indent,
                texts.total,
                format_bytes(disk.total, &texts.units)
            ));
            out.push_str(&format!(
                "{}├ {}: {} ({:.1}%)\n",
                indent,
                texts.used,
                format_bytes(disk.used(), &texts.units),
                disk.used_percent()
            ));
            out.push_str(&format!(
                "{}└ {}: {}\n",
                indent,
                texts.free,
                format_bytes(disk.free, &texts.units)
            ));
            if !is_last {
                out.push('\n');
            }
        }
        out.push('\n');
    }

    if let Some(procs) = readings.top_cpu.as_ref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("{}\n", texts.top_cpu));
        for (i, p) in procs.iter().enumerate() {
            out.push_str(&format!(
                "{} {}: {:.1}% (PID: {})\n",
                branch(i + 1 == procs.len()),
                escape(&p.name),
                p.cpu_percent,
                p.pid
            ));
        }
        out.push('\n');
    }

    if let Some(procs) = readings.top_memory.as_ref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("{}\n", texts.top_memory));
        for (i, p) in procs.iter().enumerate() {
            out.push_str(&format!(
                "{} {}: {:.0} {} ({:.1}%)\n",
                branch(i + 1 == procs.len()),
                escape(&p.name),
                p.memory_bytes as f64 / 1024.0 / 1024.0,
                texts.units[2],
                p.memory_percent
            ));
        }
    }

    out.trim_end().to_string()
}
