use serde::Deserialize;

use crate::sim::config::Config;

use super::coord::DramLocation;

/// Resolves a physical address to its DRAM geometry.
///
/// Implementations must be pure: the same address always yields the same
/// location within a run. The scheduler queries the mapping once per added
/// request and never again at issue time.
pub trait AddressMapping {
    fn locate(&self, addr: u64) -> DramLocation;

    /// Cache-block number of an address. Two requests whose addresses share
    /// a block number are considered duplicates of each other.
    fn block_of(&self, addr: u64) -> u64;
}

/// Bit widths of the contiguous address fields, LSB to MSB:
/// block offset, channel, column, bank group, bank, rank. The row takes
/// every bit above the rank field.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub offset_bits: u32,
    pub channel_bits: u32,
    pub column_bits: u32,
    pub bank_group_bits: u32,
    pub bank_bits: u32,
    pub rank_bits: u32,
}

impl Config for MappingConfig {}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            offset_bits: 6,
            channel_bits: 1,
            column_bits: 7,
            bank_group_bits: 2,
            bank_bits: 2,
            rank_bits: 1,
        }
    }
}

/// Field-sliced address mapping. Channels interleave at block granularity;
/// the column sits below the bank bits so consecutive blocks on a channel
/// stay within one row.
#[derive(Debug, Clone, Copy)]
pub struct InterleavedMapping {
    config: MappingConfig,
    channel_shift: u32,
    column_shift: u32,
    bank_group_shift: u32,
    bank_shift: u32,
    rank_shift: u32,
    row_shift: u32,
}

impl InterleavedMapping {
    pub fn new(config: MappingConfig) -> Self {
        let channel_shift = config.offset_bits;
        let column_shift = channel_shift + config.channel_bits;
        let bank_group_shift = column_shift + config.column_bits;
        let bank_shift = bank_group_shift + config.bank_group_bits;
        let rank_shift = bank_shift + config.bank_bits;
        let row_shift = rank_shift + config.rank_bits;
        Self {
            config,
            channel_shift,
            column_shift,
            bank_group_shift,
            bank_shift,
            rank_shift,
            row_shift,
        }
    }

    fn slice(addr: u64, shift: u32, bits: u32) -> u64 {
        if bits == 0 {
            return 0;
        }
        (addr >> shift) & ((1u64 << bits) - 1)
    }
}

impl AddressMapping for InterleavedMapping {
    fn locate(&self, addr: u64) -> DramLocation {
        DramLocation {
            channel: Self::slice(addr, self.channel_shift, self.config.channel_bits),
            rank: Self::slice(addr, self.rank_shift, self.config.rank_bits),
            bank_group: Self::slice(addr, self.bank_group_shift, self.config.bank_group_bits),
            bank: Self::slice(addr, self.bank_shift, self.config.bank_bits),
            row: addr >> self.row_shift,
            column: Self::slice(addr, self.column_shift, self.config.column_bits),
        }
    }

    fn block_of(&self, addr: u64) -> u64 {
        addr >> self.config.offset_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> InterleavedMapping {
        InterleavedMapping::new(MappingConfig::default())
    }

    fn compose(config: &MappingConfig, fields: DramLocation) -> u64 {
        let channel_shift = config.offset_bits;
        let column_shift = channel_shift + config.channel_bits;
        let bank_group_shift = column_shift + config.column_bits;
        let bank_shift = bank_group_shift + config.bank_group_bits;
        let rank_shift = bank_shift + config.bank_bits;
        let row_shift = rank_shift + config.rank_bits;
        (fields.channel << channel_shift)
            | (fields.column << column_shift)
            | (fields.bank_group << bank_group_shift)
            | (fields.bank << bank_shift)
            | (fields.rank << rank_shift)
            | (fields.row << row_shift)
    }

    #[test]
    fn fields_roundtrip() {
        let config = MappingConfig::default();
        let expected = DramLocation {
            channel: 1,
            rank: 1,
            bank_group: 3,
            bank: 2,
            row: 0x1234,
            column: 77,
        };
        let addr = compose(&config, expected);
        assert_eq!(mapping().locate(addr), expected);
    }

    #[test]
    fn locate_is_deterministic() {
        let addr = 0xdead_beef_c0de;
        assert_eq!(mapping().locate(addr), mapping().locate(addr));
    }

    #[test]
    fn consecutive_blocks_share_a_row() {
        let m = mapping();
        let a = m.locate(0x10_0000);
        // one block over on the same channel: channel stride x 2 blocks
        let b = m.locate(0x10_0000 + (64 << 1));
        assert_eq!(a.channel, b.channel);
        assert_eq!(a.row, b.row);
        assert_ne!(a.column, b.column);
    }

    #[test]
    fn block_of_uses_offset_width() {
        let m = mapping();
        assert_eq!(m.block_of(0x1000), m.block_of(0x103F));
        assert_ne!(m.block_of(0x1000), m.block_of(0x1040));
    }

    #[test]
    fn zero_width_field_reads_zero() {
        let config = MappingConfig {
            channel_bits: 0,
            ..MappingConfig::default()
        };
        let m = InterleavedMapping::new(config);
        for addr in [0u64, 0x40, 0xffff_ffff] {
            assert_eq!(m.locate(addr).channel, 0);
        }
    }
}
