//! Row reconstruction from positioned fragments
//!
//! PDFs carry no table markup, so rows are recovered by clustering fragments
//! on their baseline y and ordering each cluster left to right.

use crate::extractor::Fragment;
use std::cmp::Ordering;

/// One reconstructed row: cell texts, left to right
pub type Row = Vec<String>;

/// Maximum baseline distance (in page units) for two fragments to share a row
pub const Y_THRESHOLD: f32 = 5.0;

/// Group one page's fragments into rows, top of page first.
pub fn group_into_rows(fragments: &[Fragment]) -> Vec<Row> {
    group_into_rows_with_threshold(fragments, Y_THRESHOLD)
}

/// Group fragments into rows using a custom y tolerance.
///
/// A fragment joins the open row while `|y - row_y| < threshold`, where
/// `row_y` is the y of the fragment that opened the row. Both sorts are
/// stable, so fragments with equal y (or equal x within a row) keep their
/// encounter order.
pub fn group_into_rows_with_threshold(fragments: &[Fragment], threshold: f32) -> Vec<Row> {
    if fragments.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Fragment> = fragments.iter().collect();
    sorted.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));

    let mut rows = Vec::new();
    let mut current: Vec<&Fragment> = Vec::new();
    let mut current_y = sorted[0].y;

    for fragment in sorted {
        if (fragment.y - current_y).abs() < threshold {
            current.push(fragment);
        } else {
            if !current.is_empty() {
                rows.push(close_row(std::mem::take(&mut current)));
            }
            current_y = fragment.y;
            current.push(fragment);
        }
    }

    if !current.is_empty() {
        rows.push(close_row(current));
    }

    rows
}

/// Order a row's fragments by x and keep their texts
fn close_row(mut fragments: Vec<&Fragment>) -> Row {
    fragments.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    fragments.into_iter().map(|f| f.text.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f32, y: f32) -> Fragment {
        Fragment::new(text, x, y, 10.0)
    }

    #[test]
    fn test_two_rows() {
        let fragments = vec![frag("A", 0.0, 100.0), frag("B", 50.0, 100.0), frag("C", 0.0, 80.0)];
        assert_eq!(
            group_into_rows(&fragments),
            vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(group_into_rows(&[]).is_empty());
    }

    #[test]
    fn test_single_fragment() {
        let rows = group_into_rows(&[frag("Only", 12.0, 400.0)]);
        assert_eq!(rows, vec![vec!["Only".to_string()]]);
    }

    #[test]
    fn test_unordered_input_sorted_top_down_left_right() {
        let fragments = vec![
            frag("r2c2", 200.0, 680.0),
            frag("r1c2", 200.0, 700.0),
            frag("r2c1", 100.0, 681.0),
            frag("r1c1", 100.0, 702.0),
        ];
        let rows = group_into_rows(&fragments);
        assert_eq!(rows, vec![vec!["r1c1", "r1c2"], vec!["r2c1", "r2c2"]]);
    }

    #[test]
    fn test_jitter_within_threshold_joins_row() {
        let fragments = vec![frag("a", 0.0, 500.0), frag("b", 10.0, 495.5)];
        assert_eq!(group_into_rows(&fragments).len(), 1);
    }

    #[test]
    fn test_exact_threshold_splits_row() {
        let fragments = vec![frag("a", 0.0, 500.0), frag("b", 10.0, 495.0)];
        assert_eq!(group_into_rows(&fragments).len(), 2);
    }

    #[test]
    fn test_reference_y_is_row_opener_not_running() {
        // 500 -> 496 joins; 492 is 8 away from the opener and starts a new row
        let fragments = vec![
            frag("a", 0.0, 500.0),
            frag("b", 10.0, 496.0),
            frag("c", 20.0, 492.0),
        ];
        let rows = group_into_rows(&fragments);
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_equal_x_keeps_encounter_order() {
        let fragments = vec![frag("first", 50.0, 300.0), frag("second", 50.0, 300.0)];
        assert_eq!(group_into_rows(&fragments), vec![vec!["first", "second"]]);
    }

    #[test]
    fn test_custom_threshold() {
        let fragments = vec![frag("a", 0.0, 100.0), frag("b", 10.0, 92.0)];
        assert_eq!(group_into_rows_with_threshold(&fragments, 10.0).len(), 1);
        assert_eq!(group_into_rows_with_threshold(&fragments, 5.0).len(), 2);
    }
}
