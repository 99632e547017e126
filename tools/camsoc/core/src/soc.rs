//! Top level: the bus-clock domain (host, CSRs, arbiter, frame memory, write bridge)
//! and the pixel-clock domain (sensor timing), wired together only through
//! `camsoc-cdc` crossings.

use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

use camsoc_cdc::{PulseSink, PulseSource, Synchronizer};
use log::{debug, warn};
use rtrb::Consumer;

use crate::bridge::{BridgeInputs, Completion, WriteBridge};
use crate::clock::{ClockSet, DomainId, Edges};
use crate::config::{SocConfig, HOST_TIMEOUT_CYCLES};
use crate::error::{Result, SocError};
use crate::fabric::arbiter::Arbiter;
use crate::fabric::reg_camera::{StatusInputs, REG_RESET, REG_STATUS, REG_TRIGGER};
use crate::fabric::{
    Access, BusRequest, CameraRegisters, CameraStatus, CommittedWrite, FrameMemory, HostOp, HostPort, PortId,
};
use crate::sensor::{FrameTimer, SampleSource, SensorTiming, TestPattern};

pub const SYS: DomainId = 0;
pub const PIX: DomainId = 1;

pub const HOST_PORT: PortId = 0;
pub const BRIDGE_PORT: PortId = 1;

/// Bus cycles between status polls while waiting for a frame.
const POLL_INTERVAL: u64 = 16;

/// Registered values that one domain exposes to the other, sampled once per instant
/// before any domain commits.
#[derive(Debug, Copy, Clone, Default)]
struct Crossing {
    trigger: bool,
    reset: bool,
    frame_start: bool,
    frame_done: bool,
    capturing: bool,
}

/// Everything clocked by the bus clock.
pub struct SysDomain<S: SampleSource> {
    pub host: HostPort,
    pub csr: CameraRegisters,
    pub arbiter: Arbiter,
    pub memory: FrameMemory,
    pub bridge: WriteBridge,
    pub source: S,

    capture_enable: bool,
    frames: u32,

    trigger_out: PulseSource,
    reset_out: PulseSource,
    frame_start_in: PulseSink,
    frame_done_in: PulseSink,
    capturing_in: Synchronizer<2>,
}

impl<S: SampleSource> SysDomain<S> {
    /// Frames whose `frame_done` has reached this domain.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn capture_enabled(&self) -> bool {
        self.capture_enable
    }

    fn tick(&mut self, wires: &Crossing) {
        // combinational inputs, all from registers committed at the last edge
        let sample = self.source.sample();
        let frame_start = self.frame_start_in.pulse();
        let frame_done = self.frame_done_in.pulse();
        let capturing = self.capturing_in.output();
        let trigger = self.csr.trigger_pulse();
        let reset = self.csr.reset_pulse();
        let bridge_busy = self.bridge.is_busy();

        let host_request = self.host.request();
        let to_csr = host_request.is_active() && self.csr.decode(host_request.address);
        let host_to_memory = if to_csr { BusRequest::IDLE } else { host_request };

        let granted = self.arbiter.grant() == BRIDGE_PORT;
        let overruns = self.memory.overruns();
        let responses = self.arbiter.cycle(&[host_to_memory, self.bridge.request()], &mut self.memory);

        let event = self.bridge.tick(BridgeInputs {
            sample,
            enable: self.capture_enable,
            frame_done,
            // an aborted frame never raises frame_done
            restart: reset || frame_start,
            acknowledge: responses[BRIDGE_PORT].acknowledge,
            granted,
        });

        let status = StatusInputs {
            capturing,
            bridge_busy,
            frame_done,
            overrun: self.memory.overruns() > overruns,
            stall_timeout: event.completion == Completion::TimedOut,
        };
        let csr_response = self.csr.cycle(if to_csr { &host_request } else { &BusRequest::IDLE }, status);
        self.host.tick(if to_csr { csr_response } else { responses[HOST_PORT] });

        if reset || frame_done {
            if frame_done {
                self.frames += 1;
                debug!("frame {} done, {} writes accepted so far", self.frames, self.bridge.accepted());
            }
            self.capture_enable = false;
        } else if frame_start {
            debug!("frame start, capture enabled");
            self.capture_enable = true;
        }
        self.source.tick(frame_start);

        self.trigger_out.tick(trigger);
        self.reset_out.tick(reset);
        self.frame_start_in.tick(wires.frame_start);
        self.frame_done_in.tick(wires.frame_done);
        self.capturing_in.tick(wires.capturing);
    }
}

/// Everything clocked by the pixel clock.
pub struct PixDomain<T: SensorTiming> {
    pub sensor: T,

    trigger_in: PulseSink,
    reset_in: PulseSink,
    frame_start_out: PulseSource,
    frame_done_out: PulseSource,
}

impl<T: SensorTiming> PixDomain<T> {
    fn tick(&mut self, wires: &Crossing) {
        let outputs = self.sensor.outputs();
        let arm = self.trigger_in.pulse();
        let reset = self.reset_in.pulse();

        self.frame_start_out.tick(outputs.frame_start);
        self.frame_done_out.tick(outputs.frame_done);
        self.sensor.tick(arm, reset);

        self.trigger_in.tick(wires.trigger);
        self.reset_in.tick(wires.reset);
    }
}

pub struct CameraSoc<S: SampleSource = TestPattern, T: SensorTiming = FrameTimer> {
    config: SocConfig,
    clocks: ClockSet,
    pub sys: SysDomain<S>,
    pub pix: PixDomain<T>,
    commit_tap: Option<Consumer<CommittedWrite>>,
}

impl CameraSoc<TestPattern, FrameTimer> {
    /// SoC fed by the built-in test pattern and frame timer.
    pub fn with_test_pattern(config: SocConfig) -> Result<Self> {
        let source = TestPattern::new(config.frame_width, config.frame_height, config.pixel_hold);
        let sensor = FrameTimer::new(config.frame_width, config.frame_height, config.frame_blanking);
        Self::new(config, source, sensor)
    }
}

impl<S: SampleSource, T: SensorTiming> Debug for CameraSoc<S, T> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        f.debug_struct("CameraSoc")
            .field("now_ps", &self.clocks.now_ps())
            .field("sys_cycles", &self.clocks.cycles(SYS))
            .field("pix_cycles", &self.clocks.cycles(PIX))
            .field("bridge", &self.sys.bridge)
            .field("memory", &self.sys.memory)
            .field("status", &self.sys.csr.status())
            .finish()
    }
}

impl<S: SampleSource, T: SensorTiming> CameraSoc<S, T> {
    pub fn new(config: SocConfig, source: S, sensor: T) -> Result<Self> {
        config.validate()?;

        let clocks = ClockSet::new(&[config.clocks.sys_period_ps, config.clocks.pix_period_ps], config.clocks.seed)?;
        let arbiter = Arbiter::new(&config.arbiter, 2)?;
        let mut memory = FrameMemory::new(config.region, &config.bridge, &[Access::ReadOnly, Access::WriteOnly]);
        let commit_tap = config.commit_tap_capacity.map(|capacity| memory.attach_tap(capacity));

        debug!(
            "camera soc: frame {}x{} at ${:08X} ({:?}), csr at ${:08X}",
            config.frame_width, config.frame_height, config.region.base, config.region.kind, config.csr_base
        );

        Ok(Self {
            config,
            clocks,
            sys: SysDomain {
                host: HostPort::new(config.bridge.select()),
                csr: CameraRegisters::new(config.csr_base),
                arbiter,
                memory,
                bridge: WriteBridge::new(&config.bridge, &config.region),
                source,
                capture_enable: false,
                frames: 0,
                trigger_out: PulseSource::new(),
                reset_out: PulseSource::new(),
                frame_start_in: PulseSink::new(),
                frame_done_in: PulseSink::new(),
                capturing_in: Synchronizer::new(),
            },
            pix: PixDomain {
                sensor,
                trigger_in: PulseSink::new(),
                reset_in: PulseSink::new(),
                frame_start_out: PulseSource::new(),
                frame_done_out: PulseSource::new(),
            },
            commit_tap,
        })
    }

    pub fn config(&self) -> &SocConfig {
        &self.config
    }

    pub fn clocks(&self) -> &ClockSet {
        &self.clocks
    }

    pub fn sys_cycles(&self) -> u64 {
        self.clocks.cycles(SYS)
    }

    /// Consumer side of the commit tap, if one was configured. Handed out once.
    pub fn take_commit_consumer(&mut self) -> Option<Consumer<CommittedWrite>> {
        self.commit_tap.take()
    }

    fn crossing(&self) -> Crossing {
        Crossing {
            trigger: self.sys.trigger_out.crossing(),
            reset: self.sys.reset_out.crossing(),
            frame_start: self.pix.frame_start_out.crossing(),
            frame_done: self.pix.frame_done_out.crossing(),
            capturing: self.pix.sensor.outputs().capturing,
        }
    }

    /// Advance to the next clock edge of either domain.
    pub fn step(&mut self) -> Edges {
        let edges = self.clocks.next_edges();
        let wires = self.crossing();
        if edges.contains(SYS) {
            self.sys.tick(&wires);
        }
        if edges.contains(PIX) {
            self.pix.tick(&wires);
        }
        edges
    }

    pub fn run_sys_cycles(&mut self, cycles: u64) {
        let target = self.sys_cycles() + cycles;
        while self.sys_cycles() < target {
            self.step();
        }
    }

    fn decodes(&self, address: u32) -> bool {
        self.sys.csr.decode(address) || self.config.region.contains(address, self.config.bridge.stride)
    }

    fn host_access(&mut self, op: HostOp) -> Result<u32> {
        let address = op.address();
        if !self.decodes(address) {
            return Err(SocError::Unmapped { address });
        }

        self.sys.host.abort();
        self.sys.host.issue(op);
        let start = self.sys_cycles();
        loop {
            self.step();
            if let Some(data) = self.sys.host.take_completion() {
                return Ok(data);
            }
            if self.sys_cycles() - start >= HOST_TIMEOUT_CYCLES as u64 {
                warn!("host access to ${:08X} timed out", address);
                self.sys.host.abort();
                return Err(SocError::HostTimeout { address, cycles: HOST_TIMEOUT_CYCLES });
            }
        }
    }

    pub fn host_read(&mut self, address: u32) -> Result<u32> {
        self.host_access(HostOp::Read { address })
    }

    pub fn host_write(&mut self, address: u32, data: u32) -> Result<()> {
        self.host_access(HostOp::Write { address, data }).map(|_| ())
    }

    /// Take one picture.
    pub fn trigger(&mut self) -> Result<()> {
        self.host_write(self.config.csr_base + REG_TRIGGER, 1)
    }

    pub fn reset_camera(&mut self) -> Result<()> {
        self.host_write(self.config.csr_base + REG_RESET, 1)
    }

    pub fn status(&mut self) -> Result<CameraStatus> {
        let word = self.host_read(self.config.csr_base + REG_STATUS)?;
        Ok(CameraStatus(word as u16))
    }

    /// Bus cycles a triggered frame may take before `wait_frame_ready` gives up.
    pub fn frame_budget_cycles(&self) -> u64 {
        let clocks = &self.config.clocks;
        let pix_cycles = (self.config.pixels() + self.config.frame_blanking) as u64 + 16;
        let frame = (pix_cycles * clocks.pix_period_ps).div_ceil(clocks.sys_period_ps);
        let stream = self.config.pixels() as u64 * self.config.pixel_hold as u64;
        2 * frame.max(stream) + HOST_TIMEOUT_CYCLES as u64
    }

    /// Poll the status register until `frame_ready` is set.
    pub fn wait_frame_ready(&mut self, budget: u64) -> Result<CameraStatus> {
        let start = self.sys_cycles();
        loop {
            let status = self.status()?;
            if status.frame_ready() {
                return Ok(status);
            }
            if self.sys_cycles() - start >= budget {
                return Err(SocError::FrameTimeout { cycles: budget });
            }
            self.run_sys_cycles(POLL_INTERVAL);
        }
    }

    /// Read the frame region over the host bus, one sample per access.
    pub fn read_frame(&mut self) -> Result<Vec<u32>> {
        let base = self.config.region.base;
        let stride = self.config.bridge.stride;
        (0..self.config.pixels())
            .map(|i| self.host_read(base + i * stride))
            .collect()
    }

    /// Trigger, wait for the frame and read it back: the firmware's capture flow.
    pub fn capture_frame(&mut self) -> Result<Vec<u32>> {
        self.trigger()?;
        let budget = self.frame_budget_cycles();
        self.wait_frame_ready(budget)?;
        self.read_frame()
    }
}
