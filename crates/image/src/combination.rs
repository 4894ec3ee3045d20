//! Integer compositions over a small addend set.
//!
//! Both searches run a dynamic program over running totals `0..=total`. Cell
//! `t` holds the composition(s) of `t` with the fewest addends; an addend `n`
//! extends every composition stored at `t - n`. Addends are tried in the order
//! given, which makes the results deterministic.

use crate::error::{ImageError, Result};

/// Largest total accepted by the composition searches.
pub const MAX_COMPOSITION_TOTAL: u32 = 512;

fn check_inputs(total: u32, numbers: &[u32]) -> Result<()> {
    if total > MAX_COMPOSITION_TOTAL {
        return Err(ImageError::InvalidTotal {
            total,
            max: MAX_COMPOSITION_TOTAL,
        });
    }
    if numbers.is_empty() {
        return Err(ImageError::InvalidNumbers("no addends given".to_string()));
    }
    if numbers.contains(&0) {
        return Err(ImageError::InvalidNumbers(format!(
            "addends must be positive, got {numbers:?}"
        )));
    }
    Ok(())
}

/// Shortest sequence of `numbers` summing to `total`.
///
/// A later candidate replaces a cell only when strictly shorter, so among
/// equally short sequences the one built from the earliest addends wins.
/// Returns `None` when `total` cannot be reached and `Some(vec![])` for 0.
///
/// # Example
/// ```
/// use imgtools_image::shortest_composition;
///
/// assert_eq!(shortest_composition(10, &[2, 3, 4]).unwrap(), Some(vec![4, 4, 2]));
/// assert_eq!(shortest_composition(7, &[2, 4]).unwrap(), None);
/// ```
pub fn shortest_composition(total: u32, numbers: &[u32]) -> Result<Option<Vec<u32>>> {
    check_inputs(total, numbers)?;

    let total = total as usize;
    let mut best: Vec<Option<Vec<u32>>> = Vec::with_capacity(total + 1);
    best.push(Some(Vec::new()));

    for t in 1..=total {
        let mut cell: Option<Vec<u32>> = None;
        for &n in numbers {
            let step = n as usize;
            if step > t {
                continue;
            }
            let Some(prefix) = &best[t - step] else {
                continue;
            };
            if cell.as_ref().is_none_or(|current| prefix.len() + 1 < current.len()) {
                let mut candidate = Vec::with_capacity(prefix.len() + 1);
                candidate.extend_from_slice(prefix);
                candidate.push(n);
                cell = Some(candidate);
            }
        }
        best.push(cell);
    }

    Ok(best.pop().flatten())
}

/// Every composition of `total` from `numbers` with the minimal number of addends.
///
/// Compositions of a cell are listed addend by addend (in the given order),
/// each followed through the stored compositions of `t - n` in their order.
/// Returns an empty list when `total` cannot be reached.
pub fn all_minimal_compositions(total: u32, numbers: &[u32]) -> Result<Vec<Vec<u32>>> {
    check_inputs(total, numbers)?;

    let total = total as usize;
    let mut cells: Vec<Vec<Vec<u32>>> = Vec::with_capacity(total + 1);
    cells.push(vec![Vec::new()]);

    for t in 1..=total {
        let mut cell: Vec<Vec<u32>> = Vec::new();
        for &n in numbers {
            let step = n as usize;
            if step > t {
                continue;
            }
            for prefix in &cells[t - step] {
                let len = prefix.len() + 1;
                match cell.first().map(Vec::len) {
                    Some(current) if len > current => continue,
                    Some(current) if len < current => cell.clear(),
                    _ => {}
                }
                let mut candidate = Vec::with_capacity(len);
                candidate.extend_from_slice(prefix);
                candidate.push(n);
                cell.push(candidate);
            }
        }
        cells.push(cell);
    }

    Ok(cells.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCALES: &[u32] = &[2, 3, 4];

    #[test]
    fn test_shortest_composition() {
        let cases: &[(u32, &[u32])] = &[
            (0, &[]),
            (2, &[2]),
            (4, &[4]),
            (5, &[3, 2]),
            (8, &[4, 4]),
            (10, &[4, 4, 2]),
            (13, &[4, 4, 3, 2]),
            (14, &[4, 4, 4, 2]),
            (15, &[4, 4, 4, 3]),
        ];
        for (total, expected) in cases {
            assert_eq!(
                shortest_composition(*total, SCALES).unwrap(),
                Some(expected.to_vec()),
                "total {total}"
            );
        }
    }

    #[test]
    fn test_shortest_composition_unreachable() {
        assert_eq!(shortest_composition(1, SCALES).unwrap(), None);
        assert_eq!(shortest_composition(9, &[2, 4]).unwrap(), None);
    }

    #[test]
    fn test_shortest_composition_invalid_inputs() {
        assert!(matches!(
            shortest_composition(MAX_COMPOSITION_TOTAL + 1, SCALES),
            Err(ImageError::InvalidTotal { .. })
        ));
        assert!(matches!(
            shortest_composition(5, &[]),
            Err(ImageError::InvalidNumbers(_))
        ));
        assert!(matches!(
            all_minimal_compositions(5, &[0, 2]),
            Err(ImageError::InvalidNumbers(_))
        ));
    }

    #[test]
    fn test_all_minimal_compositions() {
        let cases: &[(u32, &[&[u32]])] = &[
            (5, &[&[3, 2], &[2, 3]]),
            (7, &[&[4, 3], &[3, 4]]),
            (8, &[&[4, 4]]),
            (
                9,
                &[
                    &[4, 3, 2],
                    &[3, 4, 2],
                    &[4, 2, 3],
                    &[3, 3, 3],
                    &[2, 4, 3],
                    &[3, 2, 4],
                    &[2, 3, 4],
                ],
            ),
            (
                10,
                &[
                    &[4, 4, 2],
                    &[4, 3, 3],
                    &[3, 4, 3],
                    &[4, 2, 4],
                    &[3, 3, 4],
                    &[2, 4, 4],
                ],
            ),
            (11, &[&[4, 4, 3], &[4, 3, 4], &[3, 4, 4]]),
            (
                15,
                &[&[4, 4, 4, 3], &[4, 4, 3, 4], &[4, 3, 4, 4], &[3, 4, 4, 4]],
            ),
        ];
        for (total, expected) in cases {
            let expected: Vec<Vec<u32>> = expected.iter().map(|c| c.to_vec()).collect();
            assert_eq!(
                all_minimal_compositions(*total, SCALES).unwrap(),
                expected,
                "total {total}"
            );
        }
    }

    #[test]
    fn test_all_minimal_compositions_thirteen() {
        let all = all_minimal_compositions(13, SCALES).unwrap();
        assert_eq!(all.len(), 16);
        assert_eq!(all[0], vec![4, 4, 3, 2]);
        assert!(all.iter().all(|c| c.len() == 4 && c.iter().sum::<u32>() == 13));
    }

    #[test]
    fn test_all_minimal_compositions_edges() {
        assert_eq!(all_minimal_compositions(0, SCALES).unwrap(), vec![Vec::<u32>::new()]);
        assert!(all_minimal_compositions(1, SCALES).unwrap().is_empty());
    }

    // Exhaustive search for the fewest addends, for small totals only.
    fn brute_force_min_len(total: u32, numbers: &[u32]) -> Option<usize> {
        if total == 0 {
            return Some(0);
        }
        numbers
            .iter()
            .filter(|&&n| n <= total)
            .filter_map(|&n| brute_force_min_len(total - n, numbers).map(|len| len + 1))
            .min()
    }

    proptest! {
        #[test]
        fn shortest_composition_is_minimal(
            total in 0u32..15,
            numbers in prop::collection::vec(2u32..6, 1..4),
        ) {
            let shortest = shortest_composition(total, &numbers).unwrap();
            let brute = brute_force_min_len(total, &numbers);
            prop_assert_eq!(shortest.as_ref().map(Vec::len), brute);
            if let Some(composition) = shortest {
                prop_assert_eq!(composition.iter().sum::<u32>(), total);
                prop_assert_eq!(composition.is_empty(), total == 0);
                prop_assert!(composition.iter().all(|n| numbers.contains(n)));
            }
        }

        #[test]
        fn minimal_compositions_contain_shortest(
            total in 1u32..40,
            numbers in prop::collection::btree_set(2u32..7, 1..4),
        ) {
            let numbers: Vec<u32> = numbers.into_iter().collect();
            let all = all_minimal_compositions(total, &numbers).unwrap();
            match shortest_composition(total, &numbers).unwrap() {
                Some(shortest) => {
                    prop_assert!(all.iter().all(|c| c.len() == shortest.len()));
                    prop_assert!(all.iter().all(|c| c.iter().sum::<u32>() == total));
                    prop_assert!(all.contains(&shortest));
                }
                None => prop_assert!(all.is_empty()),
            }
        }
    }
}
