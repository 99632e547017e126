use crate::fabric::{BusRequest, BusResponse};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HostOp {
    Read { address: u32 },
    Write { address: u32, data: u32 },
}

impl HostOp {
    pub fn address(&self) -> u32 {
        match self {
            HostOp::Read { address } | HostOp::Write { address, .. } => *address,
        }
    }
}

/// Stand-in for the processor's data bus master. Holds one access at a time and
/// keeps it on the bus until it is acknowledged.
#[derive(Debug)]
pub struct HostPort {
    select: u8,
    pending: Option<HostOp>,
    completed: Option<u32>,
}

impl HostPort {
    pub fn new(select: u8) -> Self {
        Self { select, pending: None, completed: None }
    }

    #[inline(always)]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Queue an access. Refused while another one is outstanding.
    pub fn issue(&mut self, op: HostOp) -> bool {
        if self.is_busy() {
            return false;
        }
        self.pending = Some(op);
        self.completed = None;
        true
    }

    /// Give up on the outstanding access without waiting for its acknowledge.
    pub fn abort(&mut self) -> Option<HostOp> {
        self.pending.take()
    }

    /// Read data (or 0 for a write) of the last finished access.
    pub fn take_completion(&mut self) -> Option<u32> {
        self.completed.take()
    }

    pub fn request(&self) -> BusRequest {
        match self.pending {
            None => BusRequest::IDLE,
            Some(HostOp::Read { address }) => BusRequest::read(address, self.select),
            Some(HostOp::Write { address, data }) => BusRequest::write(address, data, self.select),
        }
    }

    /// Host clock edge.
    pub fn tick(&mut self, response: BusResponse) {
        if self.pending.is_some() && response.acknowledge {
            self.pending = None;
            self.completed = Some(response.data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_request_until_acknowledged() {
        let mut host = HostPort::new(1);
        assert!(host.issue(HostOp::Read { address: 0x40 }));
        assert!(!host.issue(HostOp::Read { address: 0x44 }));

        for _ in 0..5 {
            host.tick(BusResponse::NONE);
            assert_eq!(host.request(), BusRequest::read(0x40, 1));
        }
        host.tick(BusResponse::ack(0x99));
        assert_eq!(host.request(), BusRequest::IDLE);
        assert_eq!(host.take_completion(), Some(0x99));
        assert_eq!(host.take_completion(), None);
    }

    #[test]
    fn abort_frees_the_port() {
        let mut host = HostPort::new(1);
        host.issue(HostOp::Write { address: 0, data: 1 });
        assert_eq!(host.abort(), Some(HostOp::Write { address: 0, data: 1 }));
        assert!(!host.is_busy());
    }
}
