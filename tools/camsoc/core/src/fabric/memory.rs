use alloc::vec;
use alloc::vec::Vec;
use bytemuck::bytes_of;
use heapless::Vec as PortVec;
use log::{error, trace, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::{BridgeConfig, MemoryRegion, MAX_MASTERS};
use crate::fabric::{Access, BusRequest, BusResponse, BusSlave, PortId};

/// A local-port write as it landed in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommittedWrite {
    pub address: u32,
    /// Offset actually written, after aliasing.
    pub offset: u32,
    pub data: u32,
    pub select: u8,
}

/// Frame buffer behind the arbiter.
///
/// Acknowledge is registered: a request seen in one cycle is acknowledged in the
/// next, and the store happens at the end of the request cycle.
pub struct FrameMemory {
    region: MemoryRegion,
    data_bytes: u32,
    storage: Vec<u8>,
    ports: PortVec<Access, MAX_MASTERS>,

    ack: bool,
    read_data: u32,

    overruns: u32,
    tap: Option<Producer<CommittedWrite>>,
}

impl core::fmt::Debug for FrameMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("FrameMemory")
            .field("region", &self.region)
            .field("size", &self.storage.len())
            .field("ports", &self.ports)
            .field("ack", &self.ack)
            .field("overruns", &self.overruns)
            .finish()
    }
}

impl FrameMemory {
    /// `ports[i]` is the access policy of arbiter port `i`; extra ports are ignored.
    pub fn new(region: MemoryRegion, bridge: &BridgeConfig, ports: &[Access]) -> Self {
        let size = region.size(bridge.stride) as usize;
        Self {
            region,
            data_bytes: bridge.data_bytes(),
            storage: vec![0; size],
            ports: ports.iter().copied().take(MAX_MASTERS).collect(),
            ack: false,
            read_data: 0,
            overruns: 0,
            tap: None,
        }
    }

    /// Mirror every committed local write into a ring buffer of `capacity` entries.
    pub fn attach_tap(&mut self, capacity: usize) -> Consumer<CommittedWrite> {
        let (producer, consumer) = RingBuffer::new(capacity);
        self.tap = Some(producer);
        consumer
    }

    pub fn region(&self) -> &MemoryRegion {
        &self.region
    }

    #[inline(always)]
    pub fn size(&self) -> u32 {
        self.storage.len() as u32
    }

    /// Writes that landed outside the region and wrapped back into it.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Storage contents without a bus cycle.
    pub fn bytes(&self) -> &[u8] {
        &self.storage
    }

    /// `len` bytes from `offset`, clamped to the region.
    pub fn peek(&self, offset: usize, len: usize) -> &[u8] {
        let start = offset.min(self.storage.len());
        let end = offset.saturating_add(len).min(self.storage.len());
        &self.storage[start..end]
    }

    #[inline(always)]
    fn port_access(&self, port: PortId) -> Access {
        self.ports.get(port).copied().unwrap_or(Access::ReadWrite)
    }

    /// Region offset for `address`. Out-of-range addresses alias, since the storage
    /// decodes only the offset.
    #[inline(always)]
    fn offset(&self, address: u32) -> (u32, bool) {
        let offset = address.wrapping_sub(self.region.base);
        if offset >= self.size() {
            (offset % self.size(), true)
        } else {
            (offset, false)
        }
    }

    fn store(&mut self, offset: u32, data: u32, select: u8) {
        let size = self.storage.len();
        let word = data.to_le();
        for (lane, byte) in bytes_of(&word).iter().enumerate().take(self.data_bytes as usize) {
            if select & (1 << lane) != 0 {
                self.storage[(offset as usize + lane) % size] = *byte;
            }
        }
    }

    fn load(&self, offset: u32, select: u8) -> u32 {
        let size = self.storage.len();
        let mut word = 0u32;
        for lane in 0..self.data_bytes as usize {
            if select & (1 << lane) != 0 {
                word |= (self.storage[(offset as usize + lane) % size] as u32) << (lane * 8);
            }
        }
        word
    }

    fn write(&mut self, port: PortId, request: &BusRequest) {
        if !self.port_access(port).allows(true) {
            warn!("Attempted to write read-only memory at: ${:08X} from port {}", request.address, port);
            return;
        }

        let (offset, aliased) = self.offset(request.address);
        if aliased {
            self.overruns += 1;
            warn!(
                "write at ${:08X} is past the {}-byte region, aliased to offset {:#x}",
                request.address,
                self.size(),
                offset
            );
        }
        self.store(offset, request.data, request.select);
        trace!("committed {:#x} at offset {:#x}", request.data, offset);

        if let Some(tap) = &mut self.tap {
            let write = CommittedWrite {
                address: request.address,
                offset,
                data: request.data,
                select: request.select,
            };
            if let Err(e) = tap.push(write) {
                error!("not enough slots in commit tap: {e}");
            }
        }
    }

    fn read(&mut self, port: PortId, request: &BusRequest) -> u32 {
        if !self.port_access(port).allows(false) {
            warn!("Attempted to read write-only memory at: ${:08X} from port {}", request.address, port);
            return 0;
        }
        let (offset, _) = self.offset(request.address);
        self.load(offset, request.select)
    }
}

impl BusSlave for FrameMemory {
    fn cycle(&mut self, port: PortId, request: &BusRequest) -> BusResponse {
        let response = if self.ack {
            BusResponse::ack(self.read_data)
        } else {
            BusResponse::NONE
        };

        if self.ack {
            // the master sees this ack and leaves; don't start a second access
            self.ack = false;
        } else if request.is_active() {
            self.read_data = if request.write_enable {
                self.write(port, request);
                0
            } else {
                self.read(port, request)
            };
            self.ack = true;
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionKind;

    const HOST: PortId = 0;
    const LOCAL: PortId = 1;

    fn memory(depth: u32, data_bits: u8) -> FrameMemory {
        let bridge = BridgeConfig { data_bits, stride: data_bits as u32 / 8, ..Default::default() };
        let region = MemoryRegion { base: 0x1000, depth, kind: RegionKind::Io };
        FrameMemory::new(region, &bridge, &[Access::ReadOnly, Access::WriteOnly])
    }

    /// Hold `request` until acknowledged; returns the response and cycles taken.
    fn transact(mem: &mut FrameMemory, port: PortId, request: BusRequest) -> (BusResponse, u32) {
        for cycle in 1..16 {
            let response = mem.cycle(port, &request);
            if response.acknowledge {
                mem.cycle(port, &BusRequest::IDLE);
                return (response, cycle);
            }
        }
        panic!("no acknowledge");
    }

    #[test]
    fn acknowledge_is_registered() {
        let mut mem = memory(8, 8);
        let (_, cycles) = transact(&mut mem, LOCAL, BusRequest::write(0x1003, 0xAB, 1));
        assert_eq!(cycles, 2);
        assert_eq!(mem.bytes()[3], 0xAB);
    }

    #[test]
    fn write_visible_to_later_read() {
        let mut mem = memory(8, 8);
        transact(&mut mem, LOCAL, BusRequest::write(0x1002, 0x5A, 1));
        let (response, _) = transact(&mut mem, HOST, BusRequest::read(0x1002, 1));
        assert_eq!(response.data, 0x5A);
    }

    #[test]
    fn host_port_is_read_only() {
        let mut mem = memory(8, 8);
        let (response, _) = transact(&mut mem, HOST, BusRequest::write(0x1000, 0xFF, 1));
        assert!(response.acknowledge);
        assert_eq!(mem.bytes()[0], 0);
    }

    #[test]
    fn local_port_is_write_only() {
        let mut mem = memory(8, 8);
        transact(&mut mem, LOCAL, BusRequest::write(0x1000, 0x11, 1));
        let (response, _) = transact(&mut mem, LOCAL, BusRequest::read(0x1000, 1));
        assert_eq!(response.data, 0);
    }

    #[test]
    fn overrun_aliases_into_region() {
        let mut mem = memory(8, 8);
        transact(&mut mem, LOCAL, BusRequest::write(0x1009, 0x77, 1));
        assert_eq!(mem.overruns(), 1);
        assert_eq!(mem.bytes()[1], 0x77);
    }

    #[test]
    fn select_mask_limits_lanes() {
        let mut mem = memory(4, 32);
        transact(&mut mem, LOCAL, BusRequest::write(0x1004, 0xDDCC_BBAA, 0b0101));
        assert_eq!(mem.peek(4, 4), &[0xAA, 0x00, 0xCC, 0x00]);
        let (response, _) = transact(&mut mem, HOST, BusRequest::read(0x1004, 0b1111));
        assert_eq!(response.data, 0x00CC_00AA);
    }

    #[test]
    fn tap_sees_committed_writes() {
        let mut mem = memory(8, 8);
        let mut tap = mem.attach_tap(4);
        transact(&mut mem, LOCAL, BusRequest::write(0x1001, 0x42, 1));
        transact(&mut mem, HOST, BusRequest::write(0x1001, 0x43, 1));
        let write = tap.pop().unwrap();
        assert_eq!(write.offset, 1);
        assert_eq!(write.data, 0x42);
        assert!(tap.pop().is_err());
    }

    #[test]
    fn full_tap_drops_without_stalling() {
        let mut mem = memory(8, 8);
        let mut tap = mem.attach_tap(1);
        transact(&mut mem, LOCAL, BusRequest::write(0x1000, 1, 1));
        let (response, _) = transact(&mut mem, LOCAL, BusRequest::write(0x1001, 2, 1));
        assert!(response.acknowledge);
        assert_eq!(mem.bytes()[1], 2);
        assert_eq!(tap.pop().unwrap().data, 1);
    }

    #[test]
    fn peek_clamps_to_region() {
        let mem = memory(8, 8);
        assert_eq!(mem.peek(6, 10).len(), 2);
        assert!(mem.peek(20, 4).is_empty());
    }
}
