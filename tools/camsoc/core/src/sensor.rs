//! Signal-level stand-ins for the camera front end.
//!
//! The real capture, RGB conversion and timing blocks are vendor IP. These stubs
//! reproduce only their pins: deterministic generators that drive the same signals
//! with the same timing contract.

use log::debug;

use crate::sample::Sample;

/// Registered outputs of the sensor timing block for the current pixel cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SensorOutputs {
    pub frame_start: bool,
    pub frame_done: bool,
    pub capturing: bool,
}

/// Sensor capture control, clocked by the pixel clock.
pub trait SensorTiming {
    fn outputs(&self) -> SensorOutputs;
    /// Pixel clock edge. `arm` and `reset` are one-cycle pulses already in this domain.
    fn tick(&mut self, arm: bool, reset: bool);
}

/// Pixel stream as seen by the write bridge, clocked by the bus clock.
pub trait SampleSource {
    /// The pair presented this cycle.
    fn sample(&self) -> Sample;
    /// Bus clock edge. `frame_start` is a one-cycle pulse already in this domain.
    fn tick(&mut self, frame_start: bool);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TimerState {
    Idle,
    Active,
    Blanking,
}

/// One frame per trigger: `width * height` active pixel clocks, then `blanking`
/// clocks before `frame_done`.
#[derive(Debug)]
pub struct FrameTimer {
    pixels: u32,
    blanking: u32,
    state: TimerState,
    counter: u32,
    frames: u32,
}

impl FrameTimer {
    pub fn new(width: u32, height: u32, blanking: u32) -> Self {
        Self {
            pixels: (width * height).max(1),
            blanking: blanking.max(1),
            state: TimerState::Idle,
            counter: 0,
            frames: 0,
        }
    }

    /// Frames completed since construction.
    pub fn frames(&self) -> u32 {
        self.frames
    }
}

impl SensorTiming for FrameTimer {
    fn outputs(&self) -> SensorOutputs {
        SensorOutputs {
            frame_start: self.state == TimerState::Active && self.counter == 0,
            frame_done: self.state == TimerState::Blanking && self.counter == self.blanking - 1,
            capturing: self.state == TimerState::Active,
        }
    }

    fn tick(&mut self, arm: bool, reset: bool) {
        if reset {
            if self.state != TimerState::Idle {
                debug!("sensor reset mid-frame");
            }
            self.state = TimerState::Idle;
            self.counter = 0;
            return;
        }

        match self.state {
            TimerState::Idle => {
                if arm {
                    self.state = TimerState::Active;
                    self.counter = 0;
                }
            }
            TimerState::Active => {
                self.counter += 1;
                if self.counter == self.pixels {
                    self.state = TimerState::Blanking;
                    self.counter = 0;
                }
            }
            TimerState::Blanking => {
                self.counter += 1;
                if self.counter == self.blanking {
                    self.frames += 1;
                    self.state = TimerState::Idle;
                    self.counter = 0;
                }
            }
        }
    }
}

/// Deterministic pixel stream: pixel `i` carries [`TestPattern::value`], presented
/// for `hold` bus cycles each. Between frames the last pixel stays on the wires.
///
/// The integrator has to pick `hold` and the clocks so that the stream finishes
/// before the sensor's `frame_done` arrives, and `hold` must cover the bus round
/// trip of one write.
#[derive(Debug)]
pub struct TestPattern {
    pixels: u32,
    hold: u32,
    index: u32,
    held: u32,
    running: bool,
    current: Sample,
}

impl TestPattern {
    pub fn new(width: u32, height: u32, hold: u32) -> Self {
        Self {
            pixels: width * height,
            hold: hold.max(1),
            index: 0,
            held: 0,
            running: false,
            current: Sample::default(),
        }
    }

    /// Value of pixel `index`: a diagonal gradient that differs between neighbours.
    #[inline(always)]
    pub fn value(index: u32) -> u32 {
        index.wrapping_mul(37).wrapping_add(11) & 0xFF
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl SampleSource for TestPattern {
    fn sample(&self) -> Sample {
        self.current
    }

    fn tick(&mut self, frame_start: bool) {
        if frame_start {
            self.running = true;
            self.index = 0;
            self.held = 0;
            self.current = Sample::new(0, Self::value(0));
            return;
        }
        if !self.running {
            return;
        }

        self.held += 1;
        if self.held < self.hold {
            return;
        }
        self.held = 0;
        self.index += 1;
        if self.index == self.pixels {
            self.running = false;
        } else {
            self.current = Sample::new(self.index, Self::value(self.index));
        }
    }
}
