//! Triangle strip decoding.

/// Index value that restarts a strip.
pub const STRIP_RESTART: u16 = 0xFFFF;

/// Walk a triangle strip with alternating winding.
///
/// The winding flips on every new index and resets after a restart, which
/// consumes the next two indices as the new strip's first edge. Degenerate
/// triangles (any repeated index) are dropped but still advance the winding.
pub fn strip_to_triangles(indices: &[u16]) -> Vec<[u16; 3]> {
    let mut iter = indices.iter().copied();
    let (Some(mut f1), Some(mut f2)) = (iter.next(), iter.next()) else {
        return Vec::new();
    };

    let mut triangles = Vec::with_capacity(indices.len().saturating_sub(2));
    let mut direction = 1i8;

    while let Some(f3) = iter.next() {
        if f3 == STRIP_RESTART {
            match (iter.next(), iter.next()) {
                (Some(a), Some(b)) => {
                    f1 = a;
                    f2 = b;
                    direction = 1;
                }
                _ => break,
            }
            continue;
        }

        direction = -direction;
        if f1 != f2 && f2 != f3 && f1 != f3 {
            if direction > 0 {
                triangles.push([f3, f2, f1]);
            } else {
                triangles.push([f2, f3, f1]);
            }
        }
        f1 = f2;
        f2 = f3;
    }

    triangles
}

/// Split a plain index list into triangles, ignoring a trailing partial one.
pub fn list_to_triangles(indices: &[u16]) -> Vec<[u16; 3]> {
    indices
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_strip() {
        // 0-1-2-3 gives two triangles with alternating winding.
        assert_eq!(strip_to_triangles(&[0, 1, 2, 3]), vec![[1, 2, 0], [3, 2, 1]]);
    }

    #[test]
    fn test_restart_resets_winding() {
        let tris = strip_to_triangles(&[0, 1, 2, STRIP_RESTART, 4, 5, 6]);
        assert_eq!(tris, vec![[1, 2, 0], [5, 6, 4]]);
    }

    #[test]
    fn test_degenerates_are_skipped() {
        let tris = strip_to_triangles(&[0, 1, 1, 2, 3]);
        assert_eq!(tris, vec![[2, 3, 1]]);
    }

    #[test]
    fn test_short_inputs() {
        assert!(strip_to_triangles(&[]).is_empty());
        assert!(strip_to_triangles(&[7]).is_empty());
        assert!(strip_to_triangles(&[0, 1, STRIP_RESTART, 2]).is_empty());
        assert_eq!(list_to_triangles(&[0, 1, 2, 3, 4]), vec![[0, 1, 2]]);
    }

    fn strip_indices() -> impl Strategy<Value = Vec<u16>> {
        proptest::collection::vec(prop_oneof![9 => 0u16..48, 1 => Just(STRIP_RESTART)], 0..256)
    }

    proptest! {
        #[test]
        fn strip_walk_is_deterministic(indices in strip_indices()) {
            let copy = indices.clone();
            prop_assert_eq!(strip_to_triangles(&indices), strip_to_triangles(&copy));
        }

        #[test]
        fn strip_walk_emits_no_degenerates(indices in strip_indices()) {
            let tris = strip_to_triangles(&indices);
            prop_assert!(tris.len() <= indices.len().saturating_sub(2));
            for [a, b, c] in tris {
                prop_assert!(a != b && b != c && a != c);
            }
        }
    }
}
