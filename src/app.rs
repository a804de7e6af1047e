use crate::config::SamplerConfig;
use crate::data::Identity;
use crate::error::SamplerError;
use crate::format::{format_line, unix_nanos};
use crate::monitor::{DeviceHandle, GpuDevice, DEVICE_INDEX};
use crate::trigger::hangup_triggers;
use crossbeam_channel::Receiver;
use nvml_wrapper::Nvml;
use std::io::{self, Write};

/// Everything a sampling pass needs, built once at startup.
pub struct Sampler<D> {
    device: DeviceHandle<D>,
    identity: Identity,
    config: SamplerConfig,
}

impl<D: GpuDevice> Sampler<D> {
    pub fn new(device: DeviceHandle<D>, identity: Identity, config: SamplerConfig) -> Self {
        Self {
            device,
            identity,
            config,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Collects one sample and renders it, stamped with the current time.
    pub fn sample_line(&self) -> Result<String, SamplerError> {
        let sample = self.device.collect(self.config.throttle_reasons)?;
        Ok(format_line(&self.identity, &sample, unix_nanos()))
    }

    /// Blocks on `triggers` and writes one line per trigger to `out`.
    ///
    /// Only returns on failure: a failed read, a failed write, or the
    /// trigger source going away. Nothing is written for a failed pass.
    pub fn run<W: Write>(&self, triggers: &Receiver<()>, out: &mut W) -> Result<(), SamplerError> {
        loop {
            triggers.recv().map_err(|_| SamplerError::TriggerClosed)?;
            log::debug!("Trigger received, sampling device {}", self.device.index());

            let line = self.sample_line()?;
            writeln!(out, "{}", line)?;
            out.flush()?;
            log::debug!("Emitted {}", line);
        }
    }
}

/// Acquires device 0, resolves the identity tags, and serves SIGHUP
/// triggers on stdout until something fails.
pub fn run(nvml: &Nvml, config: SamplerConfig) -> Result<(), SamplerError> {
    let device = DeviceHandle::acquire(nvml, DEVICE_INDEX)?;
    let identity = Identity::resolve(device.uuid().to_string());
    let triggers = hangup_triggers()?;
    let throttle = config.throttle_reasons;
    let sampler = Sampler::new(device, identity, config);

    let identity = sampler.identity();
    log::info!(
        "Sampling device {} ({}) on {}, throttle fields {}",
        DEVICE_INDEX,
        identity.uuid,
        identity.hostname,
        if throttle { "on" } else { "off" }
    );
    log::info!("Waiting for SIGHUP (pid {})", std::process::id());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    sampler.run(&triggers, &mut out)
}
