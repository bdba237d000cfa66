// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
alignment arithmetic.
*/

/// Rounds `value` up to a multiple of `alignment`. An alignment of 0 or 1 leaves it unchanged.
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        value
    } else {
        value.div_ceil(alignment) * alignment
    }
}
