use heapless::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_core::RngCore;

use crate::config::MAX_DOMAINS;
use crate::error::ConfigError;

/// Index of a clock domain within a [`ClockSet`].
pub type DomainId = usize;

#[derive(Debug, Copy, Clone)]
pub struct ClockDomain {
    pub period_ps: u64,
    next_edge_ps: u64,
    cycles: u64,
}

/// Domains that have a rising edge at the current instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Edges(u8);

impl Edges {
    #[inline(always)]
    pub fn contains(&self, domain: DomainId) -> bool {
        self.0 & (1 << domain) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Free-running, mutually asynchronous clocks on one picosecond time line.
#[derive(Debug, Clone)]
pub struct ClockSet {
    domains: Vec<ClockDomain, MAX_DOMAINS>,
    now_ps: u64,
}

impl ClockSet {
    /// Periods with random initial phases drawn from `seed`.
    pub fn new(periods_ps: &[u64], seed: u64) -> Result<Self, ConfigError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::from_rng(periods_ps, &mut rng)
    }

    pub fn from_rng<R: RngCore>(periods_ps: &[u64], rng: &mut R) -> Result<Self, ConfigError> {
        let mut clocks = Self { domains: Vec::new(), now_ps: 0 };
        for &period in periods_ps {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod);
            }
            let phase = rng.gen_range(0..period);
            clocks.push(period, phase)?;
        }
        Ok(clocks)
    }

    /// Explicit `(period, phase)` pairs.
    pub fn with_phases(clocks: &[(u64, u64)]) -> Result<Self, ConfigError> {
        let mut set = Self { domains: Vec::new(), now_ps: 0 };
        for &(period, phase) in clocks {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod);
            }
            set.push(period, phase)?;
        }
        Ok(set)
    }

    fn push(&mut self, period_ps: u64, phase_ps: u64) -> Result<(), ConfigError> {
        let domain = ClockDomain { period_ps, next_edge_ps: phase_ps, cycles: 0 };
        self.domains
            .push(domain)
            .map_err(|_| ConfigError::TooManyDomains { requested: self.domains.len() + 1, max: MAX_DOMAINS })
    }

    pub fn now_ps(&self) -> u64 {
        self.now_ps
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Edges seen so far by `domain`.
    pub fn cycles(&self, domain: DomainId) -> u64 {
        self.domains.get(domain).map_or(0, |d| d.cycles)
    }

    pub fn domain(&self, domain: DomainId) -> Option<&ClockDomain> {
        self.domains.get(domain)
    }

    /// Jump to the next instant at which any clock rises.
    pub fn next_edges(&mut self) -> Edges {
        let Some(now) = self.domains.iter().map(|d| d.next_edge_ps).min() else {
            return Edges::default();
        };
        self.now_ps = now;

        let mut edges = 0u8;
        for (id, domain) in self.domains.iter_mut().enumerate() {
            if domain.next_edge_ps == now {
                edges |= 1 << id;
                domain.next_edge_ps += domain.period_ps;
                domain.cycles += 1;
            }
        }
        Edges(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_follow_periods() {
        let mut clocks = ClockSet::with_phases(&[(10, 0), (25, 5)]).unwrap();
        let mut seen = alloc::vec::Vec::new();
        for _ in 0..6 {
            let edges = clocks.next_edges();
            seen.push((clocks.now_ps(), edges.contains(0), edges.contains(1)));
        }
        assert_eq!(
            seen,
            [
                (0, true, false),
                (5, false, true),
                (10, true, false),
                (20, true, false),
                (30, true, true),
                (40, true, false),
            ]
        );
        assert_eq!(clocks.cycles(0), 5);
        assert_eq!(clocks.cycles(1), 2);
    }

    #[test]
    fn random_phases_stay_within_period() {
        for seed in 0..32 {
            let mut clocks = ClockSet::new(&[20_000, 39_722], seed).unwrap();
            let first = clocks.next_edges();
            assert!(!first.is_empty());
            assert!(clocks.now_ps() < 39_722);
        }
    }

    #[test]
    fn same_seed_same_schedule() {
        let mut a = ClockSet::new(&[7, 11, 13], 99).unwrap();
        let mut b = ClockSet::new(&[7, 11, 13], 99).unwrap();
        for _ in 0..100 {
            assert_eq!(a.next_edges(), b.next_edges());
            assert_eq!(a.now_ps(), b.now_ps());
        }
    }

    #[test]
    fn rejects_zero_period_and_too_many_domains() {
        assert_eq!(ClockSet::with_phases(&[(0, 0)]).unwrap_err(), ConfigError::ZeroPeriod);
        assert!(ClockSet::with_phases(&[(1, 0); MAX_DOMAINS + 1]).is_err());
    }
}
