use bitfield::bitfield;
use log::{debug, warn};

use crate::fabric::{BusRequest, BusResponse};

pub const REG_TRIGGER: u32 = 0x00;
pub const REG_RESET: u32 = 0x04;
pub const REG_STATUS: u32 = 0x08;
pub const CSR_SPAN: u32 = 0x0C;

bitfield! {
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct CameraStatus(u16);
    impl Debug;
    pub capturing, set_capturing: 0;
    pub frame_ready, set_frame_ready: 1;
    pub bridge_busy, set_bridge_busy: 2;
    pub overrun, set_overrun: 3;
    pub stall_timeout, set_stall_timeout: 4;
}

/// Per-cycle inputs folded into the status register.
#[derive(Debug, Copy, Clone, Default)]
pub struct StatusInputs {
    pub capturing: bool,
    pub bridge_busy: bool,
    pub frame_done: bool,
    pub overrun: bool,
    pub stall_timeout: bool,
}

/// Camera control block: trigger, reset and status, one word each.
///
/// Accesses complete in the cycle they are presented. A write to `TRIGGER` or
/// `RESET` raises the matching pulse for exactly the next cycle.
#[derive(Debug)]
pub struct CameraRegisters {
    base: u32,
    status: CameraStatus,
    trigger: bool,
    reset: bool,
}

impl CameraRegisters {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            status: CameraStatus(0),
            trigger: false,
            reset: false,
        }
    }

    #[inline(always)]
    pub fn decode(&self, address: u32) -> bool {
        address.wrapping_sub(self.base) < CSR_SPAN
    }

    #[inline(always)]
    pub fn status(&self) -> CameraStatus {
        self.status
    }

    #[inline(always)]
    pub fn trigger_pulse(&self) -> bool {
        self.trigger
    }

    #[inline(always)]
    pub fn reset_pulse(&self) -> bool {
        self.reset
    }

    /// One bus clock. Pass [`BusRequest::IDLE`] when the host is addressing
    /// something else.
    pub fn cycle(&mut self, request: &BusRequest, inputs: StatusInputs) -> BusResponse {
        let mut response = BusResponse::NONE;
        let mut trigger = false;
        let mut reset = false;

        if request.is_active() && self.decode(request.address) {
            let register = request.address - self.base;
            response = if request.write_enable {
                match register & !0b11 {
                    REG_TRIGGER => {
                        debug!("camera trigger");
                        trigger = true;
                    }
                    REG_RESET => {
                        debug!("camera reset");
                        reset = true;
                    }
                    _ => {
                        warn!("Attempted to write read-only register at: ${:08X}", request.address);
                    }
                }
                BusResponse::ack(0)
            } else {
                match register & !0b11 {
                    REG_STATUS => BusResponse::ack(self.status.0 as u32),
                    _ => {
                        warn!("Attempted to read from unreadable register at: ${:08X}", request.address);
                        BusResponse::ack(0)
                    }
                }
            };
        }

        let mut next = self.status;
        next.set_capturing(inputs.capturing);
        next.set_bridge_busy(inputs.bridge_busy);
        if inputs.frame_done {
            next.set_frame_ready(true);
        }
        if inputs.overrun {
            next.set_overrun(true);
        }
        if inputs.stall_timeout {
            next.set_stall_timeout(true);
        }
        if trigger {
            next.set_frame_ready(false);
        }
        if reset {
            next.set_frame_ready(false);
            next.set_overrun(false);
            next.set_stall_timeout(false);
        }

        self.status = next;
        self.trigger = trigger;
        self.reset = reset;
        response
    }
}
