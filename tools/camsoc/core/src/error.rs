//! Errors for the host-facing API.
//!
//! Hardware misbehaviour (a slave that never acknowledges, a producer that overruns
//! its region) is not an error here: it shows up as stuck state and counters, the
//! same way it would on the board.

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("address width must be 1..=32 bits, got {0}")]
    AddressWidth(u8),

    #[error("data width must be 8, 16 or 32 bits, got {0}")]
    DataWidth(u8),

    #[error("sample stride must be non-zero")]
    ZeroStride,

    #[error("sample stride {stride} is smaller than the {data_bytes}-byte bus word")]
    StrideBelowWord { stride: u32, data_bytes: u32 },

    #[error("stall limit {limit} is below the minimum of {min} cycles")]
    StallLimit { limit: u32, min: u32 },

    #[error("memory region must hold at least one sample")]
    ZeroDepth,

    #[error("region at {base:#x} of {size} bytes does not fit in {address_bits} address bits")]
    RegionOutOfRange { base: u32, size: u64, address_bits: u8 },

    #[error("CSR block at {csr_base:#x} overlaps the frame region at {region_base:#x}")]
    RegionOverlap { csr_base: u32, region_base: u32 },

    #[error("clock period must be non-zero")]
    ZeroPeriod,

    #[error("{requested} ports requested, at most {max} supported")]
    TooManyPorts { requested: usize, max: usize },

    #[error("{requested} clock domains requested, at most {max} supported")]
    TooManyDomains { requested: usize, max: usize },

    #[error("frame of {pixels} samples does not fit in a region of depth {depth}")]
    FrameExceedsDepth { pixels: u32, depth: u32 },
}

/// Failure of a simulated host operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("host access to {address:#x} not acknowledged within {cycles} cycles")]
    HostTimeout { address: u32, cycles: u32 },

    #[error("no slave decodes address {address:#x}")]
    Unmapped { address: u32 },

    #[error("frame not ready within {cycles} cycles")]
    FrameTimeout { cycles: u64 },
}

pub type Result<T, E = SocError> = core::result::Result<T, E>;
