use bit_field::BitField;

/// One producer observation: the position the producer reports and the value at it.
///
/// Only the pair as a whole matters to the bridge; the bus address a sample ends up
/// at is chosen by the address sequencer, not by `address`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub struct Sample {
    pub address: u32,
    pub data: u32,
}

impl Sample {
    pub const fn new(address: u32, data: u32) -> Self {
        Self { address, data }
    }

    /// Truncate both fields to the configured port widths.
    #[inline(always)]
    pub fn masked(self, address_bits: u8, data_bits: u8) -> Self {
        Self {
            address: mask(self.address, address_bits),
            data: mask(self.data, data_bits),
        }
    }
}

/// Keep the low `bits` bits of `value`.
#[inline(always)]
pub(crate) fn mask(value: u32, bits: u8) -> u32 {
    value.get_bits(0..bits as usize)
}
