#![no_std]
//! Clock-domain crossing for single-cycle control events.
//!
//! A [`PulseSource`] lives in the sending domain and turns every rising edge of its
//! input into a flip of a registered toggle. A [`PulseSink`] lives in the receiving
//! domain, resamples that toggle through two flops and emits a one-cycle pulse each
//! time the resampled value changes. Nothing flows back: the bridge is blind, and the
//! sender must leave at least [`MIN_SPACING`] receiving-domain cycles between pulses.
//! Closer pulses can cancel out inside the synchronizer; that region is undefined.

use log::trace;

pub mod synchronizer;

pub use synchronizer::Synchronizer;

/// Safe spacing between two source pulses, in destination-domain cycles.
pub const MIN_SPACING: u32 = 4;

/// Sending half of a pulse bridge. Clocked by the source domain.
#[derive(Debug, Default, Clone)]
pub struct PulseSource {
    input_r: bool,
    toggle: bool,
}

impl PulseSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered level that the destination domain samples.
    #[inline(always)]
    pub fn crossing(&self) -> bool {
        self.toggle
    }

    /// Source clock edge. A level held high for several cycles counts once.
    #[inline(always)]
    pub fn tick(&mut self, input: bool) {
        if input && !self.input_r {
            self.toggle = !self.toggle;
            trace!("pulse source toggled to {}", self.toggle);
        }
        self.input_r = input;
    }
}

/// Receiving half of a pulse bridge. Clocked by the destination domain.
#[derive(Debug, Default, Clone)]
pub struct PulseSink {
    sync: Synchronizer<2>,
    last: bool,
}

impl PulseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-cycle pulse for the current destination cycle.
    #[inline(always)]
    pub fn pulse(&self) -> bool {
        self.sync.output() != self.last
    }

    /// Destination clock edge. `crossing` is the source's [`PulseSource::crossing`]
    /// as seen at this edge.
    #[inline(always)]
    pub fn tick(&mut self, crossing: bool) {
        self.last = self.sync.output();
        self.sync.tick(crossing);
    }
}

/// Both halves in one value, for callers that drive the two clocks themselves.
#[derive(Debug, Default, Clone)]
pub struct PulseBridge {
    pub source: PulseSource,
    pub sink: PulseSink,
}

impl PulseBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance whichever domains have an edge at this instant. The crossing wire is
    /// sampled before either side commits, so coincident edges are race free.
    pub fn tick(&mut self, source_edge: Option<bool>, dest_edge: bool) {
        let crossing = self.source.crossing();
        if let Some(input) = source_edge {
            self.source.tick(input);
        }
        if dest_edge {
            self.sink.tick(crossing);
        }
    }

    #[inline(always)]
    pub fn pulse(&self) -> bool {
        self.sink.pulse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two free-running clocks; yields (source_edge, dest_edge) per instant.
    struct TwoClocks {
        src_period: u64,
        dst_period: u64,
        src_next: u64,
        dst_next: u64,
        src_cycles: u64,
        dst_cycles: u64,
    }

    impl TwoClocks {
        fn new(src_period: u64, dst_period: u64, src_phase: u64, dst_phase: u64) -> Self {
            Self {
                src_period,
                dst_period,
                src_next: src_phase,
                dst_next: dst_phase,
                src_cycles: 0,
                dst_cycles: 0,
            }
        }

        fn next(&mut self) -> (bool, bool) {
            let now = self.src_next.min(self.dst_next);
            let src = self.src_next == now;
            let dst = self.dst_next == now;
            if src {
                self.src_next += self.src_period;
                self.src_cycles += 1;
            }
            if dst {
                self.dst_next += self.dst_period;
                self.dst_cycles += 1;
            }
            (src, dst)
        }
    }

    /// Fires `count` one-cycle source pulses spaced `MIN_SPACING` destination
    /// periods apart and returns (pulses seen, longest pulse in dest cycles).
    fn run(src_period: u64, dst_period: u64, src_phase: u64, dst_phase: u64, count: u32) -> (u32, u32) {
        let mut clocks = TwoClocks::new(src_period, dst_period, src_phase, dst_phase);
        let mut bridge = PulseBridge::new();

        let spacing = (MIN_SPACING as u64 * dst_period).div_ceil(src_period) + 1;
        let last_fire = spacing * count as u64;
        let mut fired = 0;
        let mut seen = 0;
        let mut run_length = 0;
        let mut longest = 0;

        while clocks.dst_cycles < (last_fire * src_period).div_ceil(dst_period) + 16 {
            let (src, dst) = clocks.next();
            let input = if src {
                let fire = fired < count && clocks.src_cycles % spacing == 0;
                if fire {
                    fired += 1;
                }
                Some(fire)
            } else {
                None
            };
            bridge.tick(input, dst);
            if dst {
                if bridge.pulse() {
                    if run_length == 0 {
                        seen += 1;
                    }
                    run_length += 1;
                    longest = longest.max(run_length);
                } else {
                    run_length = 0;
                }
            }
        }
        assert_eq!(fired, count);
        (seen, longest)
    }

    #[test]
    fn fast_to_slow_keeps_every_pulse_over_all_phases() {
        for phase in (0..40_000).step_by(1_250) {
            let (seen, longest) = run(10_000, 40_000, 0, phase, 12);
            assert_eq!(seen, 12, "phase {phase}");
            assert_eq!(longest, 1, "phase {phase}");
        }
    }

    #[test]
    fn slow_to_fast_emits_single_cycle_pulses() {
        for phase in (0..40_000).step_by(2_500) {
            let (seen, longest) = run(40_000, 7_000, phase, 0, 12);
            assert_eq!(seen, 12, "phase {phase}");
            assert_eq!(longest, 1, "phase {phase}");
        }
    }

    #[test]
    fn near_equal_unrelated_clocks() {
        for phase in (0..20_000).step_by(999) {
            let (seen, _) = run(20_000, 19_861, phase, 0, 25);
            assert_eq!(seen, 25, "phase {phase}");
        }
    }

    #[test]
    fn coincident_edges_are_counted_once() {
        let (seen, longest) = run(10_000, 10_000, 0, 0, 8);
        assert_eq!(seen, 8);
        assert_eq!(longest, 1);
    }

    #[test]
    fn held_input_produces_one_pulse() {
        let mut bridge = PulseBridge::new();
        let mut seen = 0;
        for cycle in 0..40 {
            bridge.tick(Some(cycle < 10), true);
            if bridge.pulse() {
                seen += 1;
            }
        }
        assert_eq!(seen, 1);
    }

    #[test]
    fn quiet_source_never_pulses() {
        let mut bridge = PulseBridge::new();
        for _ in 0..100 {
            bridge.tick(Some(false), true);
            assert!(!bridge.pulse());
        }
    }

    #[test]
    fn pulse_needs_two_destination_stages() {
        let mut bridge = PulseBridge::new();
        bridge.tick(Some(true), false);
        // first edge captures into stage 0, second into stage 1
        bridge.tick(None, true);
        assert!(!bridge.pulse());
        bridge.tick(None, true);
        assert!(bridge.pulse());
        bridge.tick(None, true);
        assert!(!bridge.pulse());
    }
}
