use heapless::Vec;
use log::debug;

use crate::config::{ArbiterConfig, ArbitrationPolicy, MAX_MASTERS};
use crate::error::ConfigError;
use crate::fabric::{BusRequest, BusResponse, BusSlave, PortId};

/// Shares one slave between up to [`MAX_MASTERS`] masters.
///
/// The grant is registered. It can only move at a clock edge, and only while the
/// current owner has `cycle` low, so a transaction is never split between owners.
/// A master that asks while another owns the bus waits at least one extra cycle for
/// the grant to land. Ports without the grant always see `acknowledge` low.
#[derive(Debug)]
pub struct Arbiter {
    policy: ArbitrationPolicy,
    ports: usize,
    grant: PortId,
}

impl Arbiter {
    pub fn new(config: &ArbiterConfig, ports: usize) -> Result<Self, ConfigError> {
        if ports == 0 || ports > MAX_MASTERS {
            return Err(ConfigError::TooManyPorts { requested: ports, max: MAX_MASTERS });
        }
        Ok(Self {
            policy: config.policy,
            ports,
            grant: 0,
        })
    }

    #[inline(always)]
    pub fn grant(&self) -> PortId {
        self.grant
    }

    /// One bus clock. `requests[i]` is what port `i` drives this cycle; missing ports
    /// count as idle.
    pub fn cycle<S: BusSlave>(&mut self, requests: &[BusRequest], slave: &mut S) -> Vec<BusResponse, MAX_MASTERS> {
        let owner = self.request(requests, self.grant);
        let response = slave.cycle(self.grant, &owner);

        let mut responses = Vec::new();
        for port in 0..self.ports {
            let routed = if port == self.grant { response } else { BusResponse::NONE };
            // ports <= MAX_MASTERS
            let _ = responses.push(routed);
        }

        if !owner.cycle {
            if let Some(next) = self.pick(requests) {
                if next != self.grant {
                    debug!("bus grant {} -> {}", self.grant, next);
                    self.grant = next;
                }
            }
        }

        responses
    }

    #[inline(always)]
    fn request(&self, requests: &[BusRequest], port: PortId) -> BusRequest {
        requests.get(port).copied().unwrap_or(BusRequest::IDLE)
    }

    fn pick(&self, requests: &[BusRequest]) -> Option<PortId> {
        match self.policy {
            ArbitrationPolicy::FixedPriority => (0..self.ports).find(|&port| self.request(requests, port).cycle),
            ArbitrationPolicy::RoundRobin => (1..=self.ports)
                .map(|offset| (self.grant + offset) % self.ports)
                .find(|&port| self.request(requests, port).cycle),
        }
    }
}
