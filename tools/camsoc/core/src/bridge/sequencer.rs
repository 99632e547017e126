use crate::sample::mask;

/// Write address within the frame region.
///
/// There is no clamp against the region depth: a producer that emits more samples
/// per frame than the region holds walks past the end and the memory aliases the
/// excess. Keeping the per-frame sample count within depth is the integrator's job.
#[derive(Debug, Clone)]
pub struct AddressSequencer {
    address: u32,
    stride: u32,
    address_bits: u8,
}

impl AddressSequencer {
    pub fn new(stride: u32, address_bits: u8) -> Self {
        Self { address: 0, stride, address_bits }
    }

    #[inline(always)]
    pub fn address(&self) -> u32 {
        self.address
    }

    /// One clock. `frame_done` wins over a same-cycle `accepted`.
    #[inline(always)]
    pub fn tick(&mut self, accepted: bool, frame_done: bool) {
        if frame_done {
            self.address = 0;
        } else if accepted {
            self.address = mask(self.address.wrapping_add(self.stride), self.address_bits);
        }
    }
}
