//! Synchronous memory-mapped bus shared by the host processor and the write bridge.

pub mod arbiter;
pub mod host_port;
pub mod memory;
pub mod reg_camera;

pub use arbiter::Arbiter;
pub use host_port::{HostOp, HostPort};
pub use memory::{CommittedWrite, FrameMemory};
pub use reg_camera::{CameraRegisters, CameraStatus};

/// Index of an arbiter port, and of the master behind it.
pub type PortId = usize;

/// Master to slave signals for one cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BusRequest {
    pub cycle: bool,
    pub strobe: bool,
    pub write_enable: bool,
    pub address: u32,
    pub data: u32,
    pub select: u8,
}

impl BusRequest {
    pub const IDLE: BusRequest = BusRequest {
        cycle: false,
        strobe: false,
        write_enable: false,
        address: 0,
        data: 0,
        select: 0,
    };

    pub const fn write(address: u32, data: u32, select: u8) -> Self {
        Self { cycle: true, strobe: true, write_enable: true, address, data, select }
    }

    pub const fn read(address: u32, select: u8) -> Self {
        Self { cycle: true, strobe: true, write_enable: false, address, data: 0, select }
    }

    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.cycle && self.strobe
    }
}

/// Slave to master signals for one cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BusResponse {
    pub acknowledge: bool,
    pub data: u32,
}

impl BusResponse {
    pub const NONE: BusResponse = BusResponse { acknowledge: false, data: 0 };

    pub const fn ack(data: u32) -> Self {
        Self { acknowledge: true, data }
    }
}

/// What a port is allowed to do to a slave.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    #[inline(always)]
    pub fn allows(&self, write: bool) -> bool {
        match self {
            Access::ReadOnly => !write,
            Access::WriteOnly => write,
            Access::ReadWrite => true,
        }
    }
}

/// A bus target clocked with its masters.
///
/// `cycle` is called exactly once per clock. The response is computed from the
/// slave's registers as they were at the start of the cycle; the registers then take
/// their next value before `cycle` returns.
pub trait BusSlave {
    fn cycle(&mut self, port: PortId, request: &BusRequest) -> BusResponse;
}
