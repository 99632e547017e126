#![no_std]
#![allow(clippy::single_match)]
extern crate alloc;

pub mod bridge;
pub mod clock;
pub mod config;
pub mod error;
pub mod fabric;
pub mod sample;
pub mod sensor;
pub mod soc;

pub use bridge::{BridgeEvent, BridgeInputs, WriteBridge};
pub use config::{ArbiterConfig, BridgeConfig, ClockConfig, MemoryRegion, RegionKind, SocConfig};
pub use error::{ConfigError, Result, SocError};
pub use fabric::CameraStatus;
pub use sample::Sample;
pub use sensor::{FrameTimer, SampleSource, SensorTiming, TestPattern};
pub use soc::CameraSoc;
