//! Host probing at process start.
//!
//! The only load-bearing fact is whether a CUDA-capable accelerator is
//! present (it drives backend selection); the rest feeds the startup log
//! line.

use std::process::Command;

/// First GPU reported by nvidia-smi
#[derive(Debug, Clone)]
pub struct GpuInfo {
    pub name: String,
    pub memory_total_mb: u64,
}

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: String,
    pub cpu_count: usize,
    pub gpu: Option<GpuInfo>,
}

impl SystemInfo {
    /// Probe the host. Never fails; missing tools just mean no GPU.
    pub fn detect() -> Self {
        Self {
            os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0),
            gpu: detect_gpu(),
        }
    }

    pub fn has_accelerator(&self) -> bool {
        self.gpu.is_some()
    }
}

fn detect_gpu() -> Option<GpuInfo> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name,memory.total", "--format=csv,noheader,nounits"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_gpu_line(stdout.lines().next()?)
}

fn parse_gpu_line(line: &str) -> Option<GpuInfo> {
    let mut parts = line.split(',').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?;
    let memory_total_mb = parts.next()?.parse().ok()?;
    Some(GpuInfo {
        name: name.to_string(),
        memory_total_mb,
    })
}

/// One-shot summary logged at startup
pub fn format_startup_info(info: &SystemInfo) -> String {
    let gpu = match &info.gpu {
        Some(gpu) => format!("{} {}MB", gpu.name, gpu.memory_total_mb),
        None => "none".to_string(),
    };
    format!(
        "OS: {}\nCPU cores: {}\nGPU: {}",
        info.os, info.cpu_count, gpu
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gpu_line() {
        let gpu = parse_gpu_line("NVIDIA GeForce RTX 3090, 24576").unwrap();
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 3090");
        assert_eq!(gpu.memory_total_mb, 24576);
    }

    #[test]
    fn test_parse_garbage_line() {
        assert!(parse_gpu_line("").is_none());
        assert!(parse_gpu_line("no gpu here").is_none());
    }

    #[test]
    fn test_startup_info_without_gpu() {
        let info = SystemInfo {
            os: "linux x86_64".to_string(),
            cpu_count: 8,
            gpu: None,
        };
        let text = format_startup_info(&info);
        assert!(text.contains("CPU cores: 8"));
        assert!(text.contains("GPU: none"));
    }
}
