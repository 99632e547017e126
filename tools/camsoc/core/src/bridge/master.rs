use log::{debug, warn};

use crate::fabric::BusRequest;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MasterState {
    Idle,
    BusRequest,
}

/// How the current cycle ended for the bus master.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    None,
    /// The slave acknowledged; the master is idle from the next cycle.
    Accepted,
    /// Opt-in stall limit expired; the write was dropped.
    TimedOut,
}

/// Write-only bus master. One transaction in flight at most.
///
/// Without a stall limit a slave that never acknowledges keeps the master in
/// [`MasterState::BusRequest`] forever, and with it the whole producer path.
#[derive(Debug)]
pub struct BusMaster {
    state: MasterState,
    address: u32,
    data: u32,
    select: u8,

    stall_cycles: u32,
    stall_limit: Option<u32>,
    timed_out: bool,
}

impl BusMaster {
    pub fn new(select: u8, stall_limit: Option<u32>) -> Self {
        Self {
            state: MasterState::Idle,
            address: 0,
            data: 0,
            select,
            stall_cycles: 0,
            stall_limit,
            timed_out: false,
        }
    }

    #[inline(always)]
    pub fn state(&self) -> MasterState {
        self.state
    }

    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.state == MasterState::Idle
    }

    /// Granted cycles the current transaction has gone unacknowledged.
    pub fn stall_cycles(&self) -> u32 {
        self.stall_cycles
    }

    /// Set once a stall limit has dropped a write.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Signals driven onto the bus this cycle.
    #[inline(always)]
    pub fn request(&self) -> BusRequest {
        match self.state {
            MasterState::Idle => BusRequest::IDLE,
            MasterState::BusRequest => BusRequest::write(self.address, self.data, self.select),
        }
    }

    /// One clock. `write` is `(address, data)` when the detector raised
    /// `write_request` this cycle. `granted` is high when the arbiter routed this
    /// master's request to the slave in this cycle; waiting for the grant does not
    /// count towards the stall limit.
    pub fn tick(&mut self, write: Option<(u32, u32)>, acknowledge: bool, granted: bool) -> Completion {
        match self.state {
            MasterState::Idle => {
                if let Some((address, data)) = write {
                    self.address = address;
                    self.data = data;
                    self.stall_cycles = 0;
                    self.state = MasterState::BusRequest;
                }
                Completion::None
            }
            MasterState::BusRequest => {
                if acknowledge {
                    self.state = MasterState::Idle;
                    return Completion::Accepted;
                }
                if !granted {
                    return Completion::None;
                }

                self.stall_cycles = self.stall_cycles.saturating_add(1);
                match self.stall_limit {
                    Some(limit) if self.stall_cycles >= limit => {
                        warn!(
                            "write of {:#x} to ${:08X} unacknowledged after {} cycles, dropping it",
                            self.data, self.address, self.stall_cycles
                        );
                        self.timed_out = true;
                        self.state = MasterState::Idle;
                        Completion::TimedOut
                    }
                    _ => {
                        if self.stall_cycles == 1 << 16 {
                            debug!("bus master stalled for {} cycles at ${:08X}", self.stall_cycles, self.address);
                        }
                        Completion::None
                    }
                }
            }
        }
    }
}
