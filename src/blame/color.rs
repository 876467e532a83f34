//! Deterministic prompt-to-color assignment.
//!
//! Each prompt id hashes to a fixed palette slot, so the same prompt renders
//! the same color across sessions, machines, and users with no coordination.
//! The hash is the classic 31-multiplier rolling hash over UTF-16 code units
//! with 32-bit signed wraparound; any other tool that implements the same
//! scheme lands on the same slot.

/// Number of entries in the highlight palette.
pub const PALETTE_SIZE: usize = 40;

/// Fixed ordered highlight palette (hex RGB).
///
/// Eight hue families, five shades each, interleaved so adjacent slots are
/// visually distinct.
pub const PALETTE: [&str; PALETTE_SIZE] = [
    "#ffd700", "#1e90ff", "#ff6347", "#3cb371", "#ba55d3",
    "#ff8c00", "#00ced1", "#dc143c", "#9acd32", "#8a2be2",
    "#ffa500", "#4682b4", "#cd5c5c", "#2e8b57", "#9932cc",
    "#f0e68c", "#87ceeb", "#ff7f50", "#66cdaa", "#da70d6",
    "#eee8aa", "#6495ed", "#e9967a", "#8fbc8f", "#dda0dd",
    "#bdb76b", "#00bfff", "#ffa07a", "#20b2aa", "#ee82ee",
    "#daa520", "#5f9ea0", "#f08080", "#32cd32", "#c71585",
    "#b8860b", "#7b68ee", "#bc8f8f", "#6b8e23", "#d87093",
];

/// Maps a prompt id to a stable palette index in `[0, PALETTE_SIZE)`.
pub fn color_index(prompt_id: &str) -> usize {
    let mut h: i32 = 0;
    for unit in prompt_id.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    index_from_hash(h)
}

/// Hex color for a palette index.
pub fn color_hex(index: usize) -> &'static str {
    PALETTE[index % PALETTE_SIZE]
}

/// Folds a signed 32-bit hash into a palette index.
///
/// `i32::MIN` has no absolute value in 32 bits; it pins to slot 0 instead of
/// wrapping.
fn index_from_hash(h: i32) -> usize {
    h.checked_abs().map_or(0, |v| v as usize % PALETTE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_maps_to_slot_zero() {
        assert_eq!(color_index(""), 0);
    }

    #[test]
    fn known_hash_values() {
        // h("a") = 97, h("ab") = 97 * 31 + 98 = 3105
        assert_eq!(color_index("a"), 97 % PALETTE_SIZE);
        assert_eq!(color_index("ab"), 3105 % PALETTE_SIZE);
    }

    #[test]
    fn index_is_stable_across_calls() {
        let id = "prompt-7f3a2b1c-d4e5-4f67-8901-23456789abcd";
        let first = color_index(id);
        for _ in 0..100 {
            assert_eq!(color_index(id), first);
        }
    }

    #[test]
    fn index_always_in_palette_range() {
        let ids = [
            "p",
            "prompt-1",
            "a-very-long-prompt-identifier-that-overflows-the-accumulator-many-times",
            "Ünïcodé-prompt-ид-🤖",
            "",
        ];
        for id in ids {
            assert!(color_index(id) < PALETTE_SIZE, "id {:?} out of range", id);
        }
    }

    #[test]
    fn negative_hash_uses_absolute_value() {
        // -97 would come from a hypothetical hash; |-97| % 40 == 17
        assert_eq!(index_from_hash(-97), 17);
        assert_eq!(index_from_hash(97), 17);
    }

    #[test]
    fn min_hash_pins_to_slot_zero() {
        assert_eq!(index_from_hash(i32::MIN), 0);
    }

    #[test]
    fn surrogate_pairs_hash_per_code_unit() {
        // Astral characters contribute two UTF-16 units, not one scalar.
        let crab = "🦀";
        let mut h: i32 = 0;
        for unit in crab.encode_utf16() {
            h = h.wrapping_mul(31).wrapping_add(unit as i32);
        }
        assert_eq!(color_index(crab), h.unsigned_abs() as usize % PALETTE_SIZE);
    }

    #[test]
    fn palette_entries_are_distinct() {
        for (i, a) in PALETTE.iter().enumerate() {
            for b in PALETTE.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn color_hex_wraps_out_of_range_indices() {
        assert_eq!(color_hex(0), PALETTE[0]);
        assert_eq!(color_hex(PALETTE_SIZE + 3), PALETTE[3]);
    }
}
