use crate::sample::Sample;

/// Turns a level-valued `(address, data)` stream into write requests, one per
/// change.
///
/// The latch starts empty rather than holding a sentinel, so the first sample after
/// reset always counts as new, whatever its value.
#[derive(Debug, Default, Clone)]
pub struct WriteDetector {
    latched: Option<Sample>,
}

impl WriteDetector {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn latched(&self) -> Option<Sample> {
        self.latched
    }

    #[inline(always)]
    pub fn differs(&self, sample: Sample) -> bool {
        self.latched != Some(sample)
    }

    /// Forget the latched pair so the next enabled sample counts as new.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.latched = None;
    }

    /// One producer clock. Returns `write_request` for this cycle; when it is high
    /// the latch takes `sample` at the same edge. While `enable` is low nothing is
    /// latched and no request is raised.
    #[inline(always)]
    pub fn tick(&mut self, sample: Sample, enable: bool) -> bool {
        let write_request = enable && self.differs(sample);
        if write_request {
            self.latched = Some(sample);
        }
        write_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_always_new() {
        let mut detector = WriteDetector::new();
        assert!(detector.tick(Sample::default(), true));
        assert_eq!(detector.latched(), Some(Sample::default()));
    }

    #[test]
    fn request_only_on_change() {
        let mut detector = WriteDetector::new();
        let stream = [(0, 5), (1, 5), (1, 5), (1, 5), (2, 9), (2, 8), (2, 8)];
        let requests: [bool; 7] = stream.map(|(a, d)| detector.tick(Sample::new(a, d), true));
        assert_eq!(requests, [true, true, false, false, true, true, false]);
    }

    #[test]
    fn disabled_detector_keeps_latch() {
        let mut detector = WriteDetector::new();
        detector.tick(Sample::new(1, 1), true);
        assert!(!detector.tick(Sample::new(2, 2), false));
        assert_eq!(detector.latched(), Some(Sample::new(1, 1)));
        // the change is still pending once enabled again
        assert!(detector.tick(Sample::new(2, 2), true));
    }

    #[test]
    fn cleared_latch_forces_next_sample() {
        let mut detector = WriteDetector::new();
        detector.tick(Sample::new(3, 3), true);
        detector.clear();
        assert_eq!(detector.latched(), None);
        assert!(detector.tick(Sample::new(3, 3), true));
    }

    #[test]
    fn returning_to_an_older_value_is_a_change() {
        let mut detector = WriteDetector::new();
        detector.tick(Sample::new(0, 1), true);
        detector.tick(Sample::new(0, 2), true);
        assert!(detector.tick(Sample::new(0, 1), true));
    }
}
