use std::fmt;
use std::io;
use std::path::PathBuf;

use nvml_wrapper::error::NvmlError;
use thiserror::Error;

/// A single device read performed during a sampling pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    VideoClock,
    MemoryClock,
    Temperature,
    PowerUsage,
    MemoryInfo,
    ThrottleReasons,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::VideoClock => "video clock speed",
            Metric::MemoryClock => "memory clock speed",
            Metric::Temperature => "gpu temperature",
            Metric::PowerUsage => "power usage",
            Metric::MemoryInfo => "memory information",
            Metric::ThrottleReasons => "throttle reasons",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("Unable to initialize NVML: {0}")]
    Init(#[source] NvmlError),

    #[error("Unable to get device at index {index}: {source}")]
    DeviceNotFound { index: u32, source: NvmlError },

    #[error("Unable to get uuid of device at index {index}: {source}")]
    Uuid { index: u32, source: NvmlError },

    #[error("Unable to get {metric} of device at index {index}: {source}")]
    Read {
        metric: Metric,
        index: u32,
        source: NvmlError,
    },

    #[error("Unable to shutdown NVML: {0}")]
    Shutdown(#[source] NvmlError),

    #[error("Unable to write sample: {0}")]
    Output(#[from] io::Error),

    #[error("Unable to register SIGHUP handler: {0}")]
    Signal(#[source] io::Error),

    #[error("Trigger channel closed")]
    TriggerClosed,

    #[error("Unable to load config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}
