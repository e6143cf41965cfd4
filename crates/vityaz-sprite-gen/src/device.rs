//! Execution device selection for the diffusion backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const NVIDIA_DRIVER_PROC: &str = "/proc/driver/nvidia/version";

/// Where the model runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// CUDA-capable GPU
    Cuda,
    /// CPU fallback
    Cpu,
}

impl Device {
    /// Detect the best available device.
    ///
    /// `VITYAZ_DEVICE` (`cuda` or `cpu`) wins when set; otherwise CUDA is
    /// picked when an NVIDIA driver is visible and `CUDA_VISIBLE_DEVICES`
    /// does not hide every GPU.
    pub fn detect() -> Self {
        if let Ok(forced) = std::env::var("VITYAZ_DEVICE") {
            match forced.parse() {
                Ok(device) => return device,
                Err(e) => tracing::warn!("ignoring VITYAZ_DEVICE: {}", e),
            }
        }

        let visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        if cuda_available(visible.as_deref(), driver_present()) {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }

    pub fn is_accelerated(self) -> bool {
        self == Device::Cuda
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Device::Cuda),
            "cpu" => Ok(Device::Cpu),
            other => Err(format!("unknown device '{}'; use cuda or cpu", other)),
        }
    }
}

/// Device setting from config: a fixed device or auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cuda,
    Cpu,
}

impl DevicePreference {
    pub fn resolve(self) -> Device {
        match self {
            DevicePreference::Auto => Device::detect(),
            DevicePreference::Cuda => Device::Cuda,
            DevicePreference::Cpu => Device::Cpu,
        }
    }
}

fn cuda_available(visible_devices: Option<&str>, driver_present: bool) -> bool {
    if let Some(visible) = visible_devices {
        let visible = visible.trim();
        if visible.is_empty() || visible == "-1" {
            return false;
        }
    }
    driver_present
}

fn driver_present() -> bool {
    if Path::new(NVIDIA_DRIVER_PROC).exists() {
        return true;
    }
    let exe = if cfg!(windows) { "nvidia-smi.exe" } else { "nvidia-smi" };
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(exe).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("cuda".parse::<Device>(), Ok(Device::Cuda));
        assert_eq!(" CPU ".parse::<Device>(), Ok(Device::Cpu));
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_cuda_visibility() {
        assert!(cuda_available(None, true));
        assert!(cuda_available(Some("0,1"), true));
        assert!(!cuda_available(Some("-1"), true));
        assert!(!cuda_available(Some(""), true));
        assert!(!cuda_available(None, false));
    }

    #[test]
    fn test_fixed_preferences() {
        assert_eq!(DevicePreference::Cuda.resolve(), Device::Cuda);
        assert_eq!(DevicePreference::Cpu.resolve(), Device::Cpu);
        assert!(Device::Cuda.is_accelerated());
        assert!(!Device::Cpu.is_accelerated());
    }
}
