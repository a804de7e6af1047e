// Memory figures as reported by the device, in bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub used: u64,
    pub free: u64,
    pub total: u64,
}

// Decoded clock throttle causes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrottleFlags {
    pub hw_break: bool,
    pub hw_slowdown: bool,
    pub hw_thermal: bool,
    pub sw_thermal: bool,
}

// One point-in-time reading of the device, raw device units
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Video clock, MHz
    pub video_clock: u32,
    /// Memory clock, MHz
    pub memory_clock: u32,
    /// GPU core temperature, °C
    pub temperature: u32,
    /// Power draw, mW
    pub power_usage: u32,
    pub memory: MemoryUsage,
    pub throttle: Option<ThrottleFlags>,
}

// Tags stamped on every emitted line, resolved once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub hostname: String,
    pub uuid: String,
}

pub const FALLBACK_HOSTNAME: &str = "localhost";

impl Identity {
    pub fn new(hostname: Option<String>, uuid: String) -> Self {
        let hostname = hostname
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string());
        Self { hostname, uuid }
    }

    /// Looks up the local hostname, falling back to `localhost`.
    pub fn resolve(uuid: String) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty());
        if hostname.is_none() {
            log::warn!("Unable to resolve hostname, using '{}'", FALLBACK_HOSTNAME);
        }
        Self::new(hostname, uuid)
    }
}
