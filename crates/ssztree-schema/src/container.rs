// crates/ssztree-schema/src/container.rs

//! Container schema support.
//!
//! Concrete containers are declared with the `ssz_container!` macro in
//! `ssztree-view`; this module holds the parts that are independent of any
//! particular field list: the [`ContainerSchema`] trait and the offset-table
//! wire layout shared by serialization, deserialization, and the
//! state-migration byte differ.

use std::ops::Range;

use ssztree_core::{TreeError, TreeResult};

use crate::types::SszType;

/// A container type descriptor. Field order is wire order and tree order.
pub trait ContainerSchema: SszType {
    /// Number of fields.
    const FIELD_COUNT: usize;
    /// Per-field fixed sizes in field order; `None` marks variable fields,
    /// which occupy a 4-byte offset in the fixed section.
    const FIELD_FIXED_SIZES: &'static [Option<usize>];
}

/// Size of the fixed section: fixed fields inline, variable fields as
/// 4-byte offsets.
#[must_use]
pub fn fixed_section_size(field_sizes: &[Option<usize>]) -> usize {
    field_sizes.iter().map(|s| s.unwrap_or(4)).sum()
}

/// Split a serialized container into one byte range per field.
///
/// Offsets must start exactly at the end of the fixed section and be
/// monotonically non-decreasing; for all-fixed containers the input length
/// must match exactly.
pub fn field_ranges(
    field_sizes: &[Option<usize>],
    bytes: &[u8],
) -> TreeResult<Vec<Range<usize>>> {
    let fixed = fixed_section_size(field_sizes);
    if bytes.len() < fixed {
        return Err(TreeError::InvalidSize);
    }

    // Pass 1: walk the fixed section, collecting variable offsets.
    let mut offsets = Vec::new();
    let mut at = 0usize;
    for size in field_sizes {
        match size {
            Some(s) => at += s,
            None => {
                offsets.push(crate::vector::read_offset(bytes, at)?);
                at += 4;
            }
        }
    }
    if offsets.is_empty() && bytes.len() != fixed {
        return Err(TreeError::InvalidSize);
    }
    if let Some(&first) = offsets.first() {
        if first != fixed {
            return Err(TreeError::InvalidSize);
        }
    }
    offsets.push(bytes.len());
    if offsets.windows(2).any(|w| w[0] > w[1]) || offsets.iter().any(|&o| o > bytes.len()) {
        return Err(TreeError::InvalidSize);
    }

    // Pass 2: emit ranges in field order.
    let mut ranges = Vec::with_capacity(field_sizes.len());
    let mut at = 0usize;
    let mut var = 0usize;
    for size in field_sizes {
        match size {
            Some(s) => {
                ranges.push(at..at + s);
                at += s;
            }
            None => {
                ranges.push(offsets[var]..offsets[var + 1]);
                at += 4;
                var += 1;
            }
        }
    }
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fixed_layout() {
        // Two u64 fields.
        let sizes = [Some(8), Some(8)];
        let bytes = [0u8; 16];
        let r = field_ranges(&sizes, &bytes).unwrap();
        assert_eq!(r, vec![0..8, 8..16]);
        assert_eq!(
            field_ranges(&sizes, &[0u8; 15]).unwrap_err(),
            TreeError::InvalidSize
        );
        assert_eq!(
            field_ranges(&sizes, &[0u8; 17]).unwrap_err(),
            TreeError::InvalidSize
        );
    }

    #[test]
    fn variable_field_offsets() {
        // container { a: list<u64>, b: u64 } with empty list and b = 0:
        // offset (12) + b → 12 bytes, list range empty at the end.
        let mut bytes = vec![0u8; 12];
        bytes[..4].copy_from_slice(&12u32.to_le_bytes());
        let sizes = [None, Some(8)];
        let r = field_ranges(&sizes, &bytes).unwrap();
        assert_eq!(r, vec![12..12, 4..12]);
    }

    #[test]
    fn bad_first_offset_rejected() {
        let mut bytes = vec![0u8; 12];
        bytes[..4].copy_from_slice(&11u32.to_le_bytes());
        assert_eq!(
            field_ranges(&[None, Some(8)], &bytes).unwrap_err(),
            TreeError::InvalidSize
        );
    }
}
