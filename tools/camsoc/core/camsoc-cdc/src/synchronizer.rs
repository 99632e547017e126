/// Multi-flop resampler for a level that crosses into this clock domain.
///
/// Only safe for signals that stay stable for several destination cycles (status
/// levels, toggles). Multi-bit values must not be pushed through independent
/// synchronizers; they can tear.
#[derive(Debug, Clone)]
pub struct Synchronizer<const STAGES: usize> {
    stages: [bool; STAGES],
}

impl<const STAGES: usize> Synchronizer<STAGES> {
    const AT_LEAST_TWO: () = assert!(STAGES >= 2, "a synchronizer needs at least two stages");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::AT_LEAST_TWO;
        Self { stages: [false; STAGES] }
    }

    /// Resynchronized level, valid for the whole current destination cycle.
    #[inline(always)]
    pub fn output(&self) -> bool {
        self.stages[STAGES - 1]
    }

    /// Destination clock edge: shift `input` into the first stage.
    #[inline(always)]
    pub fn tick(&mut self, input: bool) {
        for i in (1..STAGES).rev() {
            self.stages[i] = self.stages[i - 1];
        }
        self.stages[0] = input;
    }
}

impl<const STAGES: usize> Default for Synchronizer<STAGES> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_appears_after_stage_count_edges() {
        let mut sync = Synchronizer::<3>::new();
        sync.tick(true);
        assert!(!sync.output());
        sync.tick(true);
        assert!(!sync.output());
        sync.tick(true);
        assert!(sync.output());
    }

    #[test]
    fn falling_level_follows_with_same_latency() {
        let mut sync = Synchronizer::<2>::new();
        sync.tick(true);
        sync.tick(true);
        assert!(sync.output());
        sync.tick(false);
        assert!(sync.output());
        sync.tick(false);
        assert!(!sync.output());
    }
}
