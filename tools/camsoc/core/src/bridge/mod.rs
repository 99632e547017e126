//! Write bridge: producer samples in, one bus write per changed sample out.
//!
//! Per clock the detector decides whether the presented pair is new, the bus master
//! turns that decision into a transaction on the shared bus, and the sequencer
//! picks the address and moves on once the slave acknowledges. All three read only
//! state registered at the previous edge, then commit together.

pub mod detector;
pub mod master;
pub mod sequencer;

use log::trace;

pub use detector::WriteDetector;
pub use master::{BusMaster, Completion, MasterState};
pub use sequencer::AddressSequencer;

use crate::config::{BridgeConfig, MemoryRegion};
use crate::fabric::BusRequest;
use crate::sample::{mask, Sample};

/// Everything the bridge samples at a clock edge.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BridgeInputs {
    pub sample: Sample,
    /// Capture gate. While low the detector neither latches nor requests.
    pub enable: bool,
    pub frame_done: bool,
    /// Frame abandoned or about to start: the address restarts at 0 and the latch
    /// empties, with the same priority as `frame_done`.
    pub restart: bool,
    pub acknowledge: bool,
    /// The arbiter routed this bridge's request to the slave this cycle.
    pub granted: bool,
}

/// What happened during the cycle, for observers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BridgeEvent {
    pub write_request: bool,
    pub completion: Completion,
}

#[derive(Debug)]
pub struct WriteBridge {
    config: BridgeConfig,
    base: u32,
    detector: WriteDetector,
    master: BusMaster,
    sequencer: AddressSequencer,
    accepted: u64,
}

impl WriteBridge {
    pub fn new(config: &BridgeConfig, region: &MemoryRegion) -> Self {
        Self {
            config: *config,
            base: region.base,
            detector: WriteDetector::new(),
            master: BusMaster::new(config.select(), config.stall_limit),
            sequencer: AddressSequencer::new(config.stride, config.address_bits),
            accepted: 0,
        }
    }

    #[inline(always)]
    pub fn request(&self) -> BusRequest {
        self.master.request()
    }

    /// High while a transaction is outstanding. A well-behaved producer holds its
    /// pair steady until this drops; changes made meanwhile are only seen if they
    /// are still present afterwards.
    #[inline(always)]
    pub fn is_busy(&self) -> bool {
        !self.master.is_idle()
    }

    pub fn detector(&self) -> &WriteDetector {
        &self.detector
    }

    pub fn master(&self) -> &BusMaster {
        &self.master
    }

    pub fn sequencer(&self) -> &AddressSequencer {
        &self.sequencer
    }

    /// Writes acknowledged since construction.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn tick(&mut self, inputs: BridgeInputs) -> BridgeEvent {
        let sample = inputs.sample.masked(self.config.address_bits, self.config.data_bits);
        let target = mask(self.base.wrapping_add(self.sequencer.address()), self.config.address_bits);

        let write_request = self.detector.tick(sample, inputs.enable && self.master.is_idle());
        let completion = self.master.tick(
            write_request.then_some((target, sample.data)),
            inputs.acknowledge,
            inputs.granted,
        );
        self.sequencer.tick(completion == Completion::Accepted, inputs.frame_done || inputs.restart);
        if inputs.restart {
            self.detector.clear();
        }

        if write_request {
            trace!("write request {:?} -> ${:08X}", sample, target);
        }
        if completion == Completion::Accepted {
            self.accepted += 1;
        }

        BridgeEvent { write_request, completion }
    }
}
