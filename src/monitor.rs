use crate::data::{MemoryUsage, Sample, ThrottleFlags};
use crate::error::{Metric, SamplerError};
use nvml_wrapper::bitmasks::device::ThrottleReasons;
use nvml_wrapper::enum_wrappers::device::{Clock, TemperatureSensor};
use nvml_wrapper::error::NvmlError;
use nvml_wrapper::{Device, Nvml};

/// The device is fixed; multi-GPU hosts sample their first device only.
pub const DEVICE_INDEX: u32 = 0;

/// Reads the collector needs from a single accelerator.
pub trait GpuDevice {
    fn uuid(&self) -> Result<String, NvmlError>;
    fn clock(&self, clock: Clock) -> Result<u32, NvmlError>;
    fn temperature(&self) -> Result<u32, NvmlError>;
    fn power_usage(&self) -> Result<u32, NvmlError>;
    fn memory_usage(&self) -> Result<MemoryUsage, NvmlError>;
    fn throttle_reasons(&self) -> Result<ThrottleReasons, NvmlError>;
}

impl GpuDevice for Device<'_> {
    fn uuid(&self) -> Result<String, NvmlError> {
        Device::uuid(self)
    }

    fn clock(&self, clock: Clock) -> Result<u32, NvmlError> {
        self.clock_info(clock)
    }

    fn temperature(&self) -> Result<u32, NvmlError> {
        Device::temperature(self, TemperatureSensor::Gpu)
    }

    fn power_usage(&self) -> Result<u32, NvmlError> {
        Device::power_usage(self)
    }

    fn memory_usage(&self) -> Result<MemoryUsage, NvmlError> {
        let mem = self.memory_info()?;
        Ok(MemoryUsage {
            used: mem.used,
            free: mem.free,
            total: mem.total,
        })
    }

    fn throttle_reasons(&self) -> Result<ThrottleReasons, NvmlError> {
        self.current_throttle_reasons()
    }
}

/// Brings NVML up. Must be paired with [`release`].
pub fn init() -> Result<Nvml, SamplerError> {
    Nvml::init().map_err(SamplerError::Init)
}

/// Shuts NVML down, consuming the library handle.
pub fn release(nvml: Nvml) -> Result<(), SamplerError> {
    nvml.shutdown().map_err(SamplerError::Shutdown)
}

/// A device together with its index and UUID, looked up once.
pub struct DeviceHandle<D> {
    index: u32,
    uuid: String,
    device: D,
}

impl<'nvml> DeviceHandle<Device<'nvml>> {
    pub fn acquire(nvml: &'nvml Nvml, index: u32) -> Result<Self, SamplerError> {
        let device = nvml
            .device_by_index(index)
            .map_err(|source| SamplerError::DeviceNotFound { index, source })?;
        Self::from_device(device, index)
    }
}

impl<D: GpuDevice> DeviceHandle<D> {
    pub fn from_device(device: D, index: u32) -> Result<Self, SamplerError> {
        let uuid = device
            .uuid()
            .map_err(|source| SamplerError::Uuid { index, source })?;
        Ok(Self {
            index,
            uuid,
            device,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Reads every metric in a fixed order. The first failed read aborts
    /// the pass; no partial sample is ever returned.
    pub fn collect(&self, with_throttle: bool) -> Result<Sample, SamplerError> {
        let video_clock = self.read(Metric::VideoClock, |d| d.clock(Clock::Video))?;
        let memory_clock = self.read(Metric::MemoryClock, |d| d.clock(Clock::Memory))?;
        let temperature = self.read(Metric::Temperature, |d| d.temperature())?;
        let power_usage = self.read(Metric::PowerUsage, |d| d.power_usage())?;
        let memory = self.read(Metric::MemoryInfo, |d| d.memory_usage())?;
        let throttle = if with_throttle {
            let reasons = self.read(Metric::ThrottleReasons, |d| d.throttle_reasons())?;
            Some(decode_throttle(reasons))
        } else {
            None
        };

        Ok(Sample {
            video_clock,
            memory_clock,
            temperature,
            power_usage,
            memory,
            throttle,
        })
    }

    fn read<T>(
        &self,
        metric: Metric,
        f: impl FnOnce(&D) -> Result<T, NvmlError>,
    ) -> Result<T, SamplerError> {
        f(&self.device).map_err(|source| SamplerError::Read {
            metric,
            index: self.index,
            source,
        })
    }
}

pub fn decode_throttle(reasons: ThrottleReasons) -> ThrottleFlags {
    ThrottleFlags {
        hw_break: reasons.contains(ThrottleReasons::HW_POWER_BRAKE_SLOWDOWN),
        hw_slowdown: reasons.contains(ThrottleReasons::HW_SLOWDOWN),
        hw_thermal: reasons.contains(ThrottleReasons::HW_THERMAL_SLOWDOWN),
        sw_thermal: reasons.contains(ThrottleReasons::SW_THERMAL_SLOWDOWN),
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory device with scripted readings and an optional failing read.
    pub struct FakeDevice {
        pub uuid: Option<String>,
        pub video_clock: u32,
        pub memory_clock: u32,
        pub temperature: u32,
        pub power_usage: u32,
        pub memory: MemoryUsage,
        pub reasons: ThrottleReasons,
        pub fail_on: Option<Metric>,
        /// Fails `fail_on` only once this many reads of it have succeeded.
        pub fail_after: Cell<usize>,
        pub calls: RefCell<Vec<Metric>>,
    }

    impl Default for FakeDevice {
        fn default() -> Self {
            Self {
                uuid: Some("GPU-abcd".to_string()),
                video_clock: 1500,
                memory_clock: 800,
                temperature: 62,
                power_usage: 120000,
                memory: MemoryUsage {
                    used: 1000,
                    free: 9000,
                    total: 10000,
                },
                reasons: ThrottleReasons::empty(),
                fail_on: None,
                fail_after: Cell::new(0),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl FakeDevice {
        fn answer<T>(&self, metric: Metric, value: T) -> Result<T, NvmlError> {
            self.calls.borrow_mut().push(metric);
            if self.fail_on == Some(metric) {
                let left = self.fail_after.get();
                if left == 0 {
                    return Err(NvmlError::GpuLost);
                }
                self.fail_after.set(left - 1);
            }
            Ok(value)
        }
    }

    impl GpuDevice for FakeDevice {
        fn uuid(&self) -> Result<String, NvmlError> {
            self.uuid.clone().ok_or(NvmlError::NotSupported)
        }

        fn clock(&self, clock: Clock) -> Result<u32, NvmlError> {
            match clock {
                Clock::Video => self.answer(Metric::VideoClock, self.video_clock),
                Clock::Memory => self.answer(Metric::MemoryClock, self.memory_clock),
                _ => Err(NvmlError::NotSupported),
            }
        }

        fn temperature(&self) -> Result<u32, NvmlError> {
            self.answer(Metric::Temperature, self.temperature)
        }

        fn power_usage(&self) -> Result<u32, NvmlError> {
            self.answer(Metric::PowerUsage, self.power_usage)
        }

        fn memory_usage(&self) -> Result<MemoryUsage, NvmlError> {
            self.answer(Metric::MemoryInfo, self.memory)
        }

        fn throttle_reasons(&self) -> Result<ThrottleReasons, NvmlError> {
            self.answer(Metric::ThrottleReasons, self.reasons)
        }
    }
}
