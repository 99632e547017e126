//! Integration parameters. Everything the surrounding SoC decides (widths, where the
//! frame buffer lives, how fast each clock runs) comes in through these structs.

use crate::error::ConfigError;
use crate::fabric::reg_camera::CSR_SPAN;

/// Captured frame geometry of the camera front end.
pub const IMG_WIDTH: u32 = 28;
pub const IMG_HEIGHT: u32 = 28;

pub const CSR_CAMERA_BASE: u32 = 0xF000_0000;
pub const MMAP_M_1_BASE: u32 = 0x3000_0000;
pub const LOGIC_MEMORY_BASE: u32 = MMAP_M_1_BASE + 0xC40;

/// Arbiter ports and clock domains are both bounded by this.
pub const MAX_MASTERS: usize = 4;
pub const MAX_DOMAINS: usize = 4;

/// Bus cycles a simulated host access may wait for its acknowledge.
pub const HOST_TIMEOUT_CYCLES: u32 = 1024;
/// Shortest stall limit a registered-acknowledge slave can satisfy: it latches the
/// write in the first granted cycle and acknowledges in the second.
pub const MIN_STALL_LIMIT: u32 = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub address_bits: u8,
    pub data_bits: u8,
    /// Bytes the sequencer advances per accepted write.
    pub stride: u32,
    /// Abandon a transaction after this many granted cycles without acknowledge.
    /// `None` stalls forever. A slave may already have committed an abandoned write.
    pub stall_limit: Option<u32>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address_bits: 32,
            data_bits: 8,
            stride: 1,
            stall_limit: None,
        }
    }
}

impl BridgeConfig {
    #[inline(always)]
    pub fn data_bytes(&self) -> u32 {
        self.data_bits as u32 / 8
    }

    /// Byte-select mask covering the full data word.
    #[inline(always)]
    pub fn select(&self) -> u8 {
        ((1u16 << self.data_bytes()) - 1) as u8
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=32).contains(&self.address_bits) {
            return Err(ConfigError::AddressWidth(self.address_bits));
        }
        if !matches!(self.data_bits, 8 | 16 | 32) {
            return Err(ConfigError::DataWidth(self.data_bits));
        }
        if self.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if self.stride < self.data_bytes() {
            return Err(ConfigError::StrideBelowWord {
                stride: self.stride,
                data_bytes: self.data_bytes(),
            });
        }
        if let Some(limit) = self.stall_limit {
            if limit < MIN_STALL_LIMIT {
                return Err(ConfigError::StallLimit { limit, min: MIN_STALL_LIMIT });
            }
        }
        Ok(())
    }
}

/// Whether the host may cache reads from the region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RegionKind {
    Cached,
    #[default]
    Io,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u32,
    /// Capacity in samples.
    pub depth: u32,
    pub kind: RegionKind,
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self {
            base: LOGIC_MEMORY_BASE,
            depth: IMG_WIDTH * IMG_HEIGHT,
            kind: RegionKind::Io,
        }
    }
}

impl MemoryRegion {
    #[inline(always)]
    pub fn size(&self, stride: u32) -> u64 {
        self.depth as u64 * stride as u64
    }

    #[inline(always)]
    pub fn contains(&self, address: u32, stride: u32) -> bool {
        let address = address as u64;
        let base = self.base as u64;
        address >= base && address < base + self.size(stride)
    }

    pub fn is_cacheable(&self) -> bool {
        self.kind == RegionKind::Cached
    }

    pub fn validate(&self, bridge: &BridgeConfig) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        let size = self.size(bridge.stride);
        if self.base as u64 + size > 1u64 << bridge.address_bits {
            return Err(ConfigError::RegionOutOfRange {
                base: self.base,
                size,
                address_bits: bridge.address_bits,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ArbitrationPolicy {
    /// Lowest port index wins.
    FixedPriority,
    /// The port after the previous owner wins.
    #[default]
    RoundRobin,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ArbiterConfig {
    pub policy: ArbitrationPolicy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Bus/system clock. 50 MHz board oscillator.
    pub sys_period_ps: u64,
    /// Sensor pixel clock.
    pub pix_period_ps: u64,
    /// Seed for the initial phase offsets.
    pub seed: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            sys_period_ps: 20_000,
            pix_period_ps: 100_000,
            seed: 0x5EED,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sys_period_ps == 0 || self.pix_period_ps == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SocConfig {
    pub bridge: BridgeConfig,
    pub region: MemoryRegion,
    pub arbiter: ArbiterConfig,
    pub clocks: ClockConfig,
    pub csr_base: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Pixel clocks between the last pixel of a frame and `frame_done`.
    pub frame_blanking: u32,
    /// Bus cycles the test pattern holds each pixel.
    pub pixel_hold: u32,
    /// Ring buffer size for the commit tap; `None` disables it.
    pub commit_tap_capacity: Option<usize>,
}

impl Default for SocConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            region: MemoryRegion::default(),
            arbiter: ArbiterConfig::default(),
            clocks: ClockConfig::default(),
            csr_base: CSR_CAMERA_BASE,
            frame_width: IMG_WIDTH,
            frame_height: IMG_HEIGHT,
            frame_blanking: 64,
            pixel_hold: 4,
            commit_tap_capacity: None,
        }
    }
}

impl SocConfig {
    #[inline(always)]
    pub fn pixels(&self) -> u32 {
        self.frame_width * self.frame_height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bridge.validate()?;
        self.region.validate(&self.bridge)?;
        self.clocks.validate()?;

        let csr_start = self.csr_base as u64;
        let csr_end = csr_start + CSR_SPAN as u64;
        let region_start = self.region.base as u64;
        let region_end = region_start + self.region.size(self.bridge.stride);
        if csr_start < region_end && region_start < csr_end {
            return Err(ConfigError::RegionOverlap {
                csr_base: self.csr_base,
                region_base: self.region.base,
            });
        }

        if self.pixels() > self.region.depth {
            return Err(ConfigError::FrameExceedsDepth {
                pixels: self.pixels(),
                depth: self.region.depth,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SocConfig::default().validate(), Ok(()));
    }

    #[test]
    fn select_mask_follows_data_width() {
        let mut bridge = BridgeConfig::default();
        assert_eq!(bridge.select(), 0b1);
        bridge.data_bits = 16;
        assert_eq!(bridge.select(), 0b11);
        bridge.data_bits = 32;
        assert_eq!(bridge.select(), 0b1111);
    }

    #[test]
    fn rejects_odd_data_width() {
        let bridge = BridgeConfig { data_bits: 12, ..Default::default() };
        assert_eq!(bridge.validate(), Err(ConfigError::DataWidth(12)));
    }

    #[test]
    fn rejects_stride_narrower_than_word() {
        let bridge = BridgeConfig { data_bits: 32, stride: 2, ..Default::default() };
        assert_eq!(
            bridge.validate(),
            Err(ConfigError::StrideBelowWord { stride: 2, data_bytes: 4 })
        );
    }

    #[test]
    fn stall_limit_must_outlast_a_registered_ack() {
        for limit in [0, 1] {
            let bridge = BridgeConfig { stall_limit: Some(limit), ..Default::default() };
            assert_eq!(bridge.validate(), Err(ConfigError::StallLimit { limit, min: 2 }));
        }
        let bridge = BridgeConfig { stall_limit: Some(2), ..Default::default() };
        assert_eq!(bridge.validate(), Ok(()));
    }

    #[test]
    fn region_must_fit_address_space() {
        let bridge = BridgeConfig { address_bits: 12, ..Default::default() };
        let region = MemoryRegion { base: 0xF00, depth: 0x200, kind: RegionKind::Io };
        assert!(matches!(region.validate(&bridge), Err(ConfigError::RegionOutOfRange { .. })));
    }

    #[test]
    fn csr_block_may_not_overlap_region() {
        let config = SocConfig { csr_base: LOGIC_MEMORY_BASE + 4, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::RegionOverlap { .. })));
    }

    #[test]
    fn region_contains_is_half_open() {
        let region = MemoryRegion { base: 0x100, depth: 8, kind: RegionKind::Cached };
        assert!(region.contains(0x100, 1));
        assert!(region.contains(0x107, 1));
        assert!(!region.contains(0x108, 1));
        assert!(!region.contains(0xFF, 1));
        assert!(region.is_cacheable());
    }
}
