//! Option-position table extraction and flattening.
//!
//! 20 `(x, y)` float pairs at `0x40..0xE0` describe the homing-satellite
//! layout: 10 pairs for the high-power group, 10 for low, each split into
//! L1..L4 sub-groups of sizes 1, 2, 3, 4.

use crate::layout::{read_f32, OPTION_PAIR_COUNT, OPTION_TABLE_END, OPTION_TABLE_START};
use crate::spec::{OptionGroup, OptionPositions};

const GROUP_SIZES: [usize; 4] = [1, 2, 3, 4];

/// Read the table. A file too short to hold it yields the empty structure.
pub fn extract(data: &[u8]) -> OptionPositions {
    if data.len() < OPTION_TABLE_END {
        return OptionPositions::default();
    }
    let mut pairs = Vec::with_capacity(OPTION_PAIR_COUNT);
    let mut off = OPTION_TABLE_START;
    while off < OPTION_TABLE_END {
        pairs.push([read_f32(data, off), read_f32(data, off + 4)]);
        off += 8;
    }
    OptionPositions {
        high: group_levels(&pairs[..10]),
        low: group_levels(&pairs[10..]),
        raw_pairs: pairs,
    }
}

fn group_levels(pairs: &[[f32; 2]]) -> OptionGroup {
    let mut chunks = GROUP_SIZES.iter().scan(0usize, |idx, &n| {
        let chunk = pairs[*idx..*idx + n].to_vec();
        *idx += n;
        Some(chunk)
    });
    OptionGroup {
        l1: chunks.next().unwrap_or_default(),
        l2: chunks.next().unwrap_or_default(),
        l3: chunks.next().unwrap_or_default(),
        l4: chunks.next().unwrap_or_default(),
    }
}

/// Resolve an overlay table to the flat 20-pair list: `raw_pairs` when
/// non-empty, otherwise the groups flattened in fixed order (high L1..L4,
/// then low L1..L4). Anything other than exactly 20 pairs resolves to `None`
/// and the overlay becomes a no-op.
pub fn flatten(opt: &OptionPositions) -> Option<Vec<[f32; 2]>> {
    let pairs = if opt.raw_pairs.is_empty() {
        let mut flat = Vec::new();
        for group in [&opt.high, &opt.low] {
            for sub in [&group.l1, &group.l2, &group.l3, &group.l4] {
                flat.extend_from_slice(sub);
            }
        }
        flat
    } else {
        opt.raw_pairs.clone()
    };
    (pairs.len() == OPTION_PAIR_COUNT).then_some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_file() -> Vec<u8> {
        let mut data = vec![0u8; OPTION_TABLE_END];
        for i in 0..OPTION_PAIR_COUNT {
            let off = OPTION_TABLE_START + i * 8;
            data[off..off + 4].copy_from_slice(&(i as f32).to_le_bytes());
            data[off + 4..off + 8].copy_from_slice(&(-(i as f32)).to_le_bytes());
        }
        data
    }

    #[test]
    fn grouping_splits_one_two_three_four() {
        let opt = extract(&table_file());
        assert_eq!(opt.raw_pairs.len(), 20);
        assert_eq!(opt.high.l1, vec![[0.0, 0.0]]);
        assert_eq!(opt.high.l2.len(), 2);
        assert_eq!(opt.high.l3.len(), 3);
        assert_eq!(opt.high.l4.len(), 4);
        assert_eq!(opt.low.l1, vec![[10.0, -10.0]]);
        assert_eq!(opt.low.l4[3], [19.0, -19.0]);
    }

    #[test]
    fn short_file_yields_empty_table() {
        let opt = extract(&[0u8; OPTION_TABLE_END - 1]);
        assert!(opt.raw_pairs.is_empty());
        assert!(opt.high.l1.is_empty());
    }

    #[test]
    fn flatten_prefers_raw_pairs() {
        let mut opt = extract(&table_file());
        opt.high.l1 = vec![[99.0, 99.0]];
        let flat = flatten(&opt).unwrap();
        assert_eq!(flat[0], [0.0, 0.0]);
    }

    #[test]
    fn flatten_falls_back_to_groups_in_fixed_order() {
        let mut opt = extract(&table_file());
        let expected = opt.raw_pairs.clone();
        opt.raw_pairs.clear();
        assert_eq!(flatten(&opt).unwrap(), expected);
    }

    #[test]
    fn flatten_rejects_partial_tables() {
        let mut opt = extract(&table_file());
        opt.raw_pairs.pop();
        assert_eq!(flatten(&opt), None);
        opt.raw_pairs.clear();
        opt.high.l1.clear();
        assert_eq!(flatten(&opt), None);
    }
}
