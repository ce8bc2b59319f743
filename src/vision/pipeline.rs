//! Result pipeline
//!
//! Confidence filter, reading-order sort and text aggregation.
//! Pure functions: nothing here can fail on well-formed input.

use std::cmp::Ordering;

use super::adapter::RecognizedImage;
use super::{BoundingBox, OcrResult, RecognizedLine};
use crate::config::OcrConfig;

/// Two lines whose vertical midpoints differ by at most this much share a row
pub const ROW_TOLERANCE: f64 = 0.015;

/// Filter, order and assemble the final result for one image
pub fn build_result(recognized: RecognizedImage, config: &OcrConfig) -> OcrResult {
    let mut lines = filter_by_confidence(recognized.lines, config.min_confidence);

    if config.sort_reading_order {
        sort_reading_order(&mut lines);
    }

    let full_text = join_text(&lines);

    OcrResult {
        input_path: recognized.input_path,
        resolved_path: recognized.resolved_path,
        image_width: recognized.width,
        image_height: recognized.height,
        line_count: lines.len(),
        full_text,
        lines,
    }
}

/// Keep lines with `confidence >= min_confidence`
pub fn filter_by_confidence(lines: Vec<RecognizedLine>, min_confidence: f64) -> Vec<RecognizedLine> {
    lines
        .into_iter()
        .filter(|line| line.confidence >= min_confidence)
        .collect()
}

/// Reading-order comparator: top to bottom, then left to right within a row.
///
/// Not transitive at the tolerance boundary: with midpoints 0.000, 0.015 and
/// 0.030 the outer pair is ordered by midpoint while both inner pairs are
/// ordered by `min_x`.
pub fn compare_reading_order(a: &BoundingBox, b: &BoundingBox) -> Ordering {
    let (mid_a, mid_b) = (a.mid_y(), b.mid_y());

    if (mid_a - mid_b).abs() > ROW_TOLERANCE {
        // Y grows upward, so the higher midpoint comes first
        mid_b.partial_cmp(&mid_a).unwrap_or(Ordering::Equal)
    } else {
        a.min_x.partial_cmp(&b.min_x).unwrap_or(Ordering::Equal)
    }
}

/// Sort lines into reading order.
///
/// Stable insertion sort: the comparator is not a total order, and this keeps
/// the outcome a deterministic function of the input sequence.
pub fn sort_reading_order(lines: &mut [RecognizedLine]) {
    for i in 1..lines.len() {
        let mut j = i;
        while j > 0 && compare_reading_order(&lines[j - 1].bbox, &lines[j].bbox) == Ordering::Greater {
            lines.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Join line texts with newlines, without a trailing newline
pub fn join_text(lines: &[RecognizedLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Line with a zero-height box so that `mid_y == min_y` exactly
    fn line(text: &str, confidence: f64, mid_y: f64, min_x: f64) -> RecognizedLine {
        RecognizedLine {
            text: text.to_string(),
            confidence,
            bbox: BoundingBox::new(min_x, mid_y, 0.1, 0.0),
        }
    }

    fn texts(lines: &[RecognizedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    fn recognized(lines: Vec<RecognizedLine>) -> RecognizedImage {
        RecognizedImage {
            input_path: "scan.png".to_string(),
            resolved_path: "/data/scans/scan.png".to_string(),
            width: 640,
            height: 480,
            lines,
        }
    }

    #[test]
    fn test_confidence_filter_is_inclusive() {
        let lines = vec![
            line("below", 0.49, 0.9, 0.0),
            line("equal", 0.5, 0.8, 0.0),
            line("above", 0.51, 0.7, 0.0),
        ];

        let kept = filter_by_confidence(lines, 0.5);
        assert_eq!(texts(&kept), vec!["equal", "above"]);
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let lines = vec![line("zero", 0.0, 0.5, 0.0), line("one", 1.0, 0.4, 0.0)];
        assert_eq!(filter_by_confidence(lines, 0.0).len(), 2);
    }

    #[test]
    fn test_rows_top_to_bottom() {
        let mut lines = vec![
            line("bottom", 1.0, 0.1, 0.0),
            line("top", 1.0, 0.9, 0.5),
            line("middle", 1.0, 0.5, 0.2),
        ];

        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn test_same_row_left_to_right() {
        let mut lines = vec![
            line("right", 1.0, 0.505, 0.7),
            line("left", 1.0, 0.500, 0.1),
            line("centre", 1.0, 0.510, 0.4),
        ];

        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["left", "centre", "right"]);
    }

    #[test]
    fn test_difference_equal_to_tolerance_is_same_row() {
        let a = BoundingBox::new(0.6, 0.0, 0.1, 0.0);
        let b = BoundingBox::new(0.2, ROW_TOLERANCE, 0.1, 0.0);

        // Same row: ordered by min_x, so b comes first despite being higher
        assert_eq!(compare_reading_order(&b, &a), Ordering::Less);
        assert_eq!(compare_reading_order(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_row_boundary_fixtures() {
        let base = BoundingBox::new(0.1, 0.500, 0.1, 0.0);
        let boundary = BoundingBox::new(0.9, 0.515, 0.1, 0.0);
        let apart = BoundingBox::new(0.9, 0.516, 0.1, 0.0);

        // 0.515 - 0.500 evaluates slightly above 0.015 in f64, so these are separate rows
        assert!((boundary.mid_y() - base.mid_y()).abs() > ROW_TOLERANCE);
        assert_eq!(compare_reading_order(&boundary, &base), Ordering::Less);
        assert_eq!(compare_reading_order(&base, &boundary), Ordering::Greater);

        assert_eq!(compare_reading_order(&apart, &base), Ordering::Less);
        assert_eq!(compare_reading_order(&base, &apart), Ordering::Greater);

        let close = BoundingBox::new(0.9, 0.510, 0.1, 0.0);
        assert_eq!(compare_reading_order(&base, &close), Ordering::Less);
    }

    #[test]
    fn test_non_transitive_boundary_is_deterministic() {
        let fixture = vec![
            line("a", 1.0, 0.000, 0.1),
            line("b", 1.0, 0.015, 0.5),
            line("c", 1.0, 0.030, 0.9),
        ];

        // a~b and b~c share a row, a and c do not
        assert_eq!(compare_reading_order(&fixture[0].bbox, &fixture[1].bbox), Ordering::Less);
        assert_eq!(compare_reading_order(&fixture[1].bbox, &fixture[2].bbox), Ordering::Less);
        assert_eq!(compare_reading_order(&fixture[0].bbox, &fixture[2].bbox), Ordering::Greater);

        let mut first = fixture.clone();
        let mut second = fixture.clone();
        sort_reading_order(&mut first);
        sort_reading_order(&mut second);

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_sort_is_stable_for_identical_boxes() {
        let mut lines = vec![
            line("first", 1.0, 0.5, 0.3),
            line("second", 1.0, 0.5, 0.3),
            line("third", 1.0, 0.5, 0.3),
        ];

        sort_reading_order(&mut lines);
        assert_eq!(texts(&lines), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_join_text() {
        assert_eq!(join_text(&[]), "");
        assert_eq!(join_text(&[line("only", 1.0, 0.5, 0.0)]), "only");
        assert_eq!(
            join_text(&[line("one", 1.0, 0.5, 0.0), line("two", 1.0, 0.4, 0.0)]),
            "one\ntwo"
        );
    }

    #[test]
    fn test_build_result_sorted() {
        let config = OcrConfig {
            min_confidence: 0.5,
            ..Default::default()
        };
        let result = build_result(
            recognized(vec![
                line("B", 0.9, 0.2, 0.1),
                line("A", 0.9, 0.8, 0.1),
                line("low", 0.3, 0.5, 0.1),
            ]),
            &config,
        );

        assert_eq!(texts(&result.lines), vec!["A", "B"]);
        assert_eq!(result.full_text, "A\nB");
        assert_eq!(result.line_count, 2);
        assert_eq!(result.image_width, 640);
        assert_eq!(result.image_height, 480);
        assert_eq!(result.input_path, "scan.png");
        assert_eq!(result.resolved_path, "/data/scans/scan.png");
    }

    #[test]
    fn test_build_result_preserves_engine_order_when_unsorted() {
        let config = OcrConfig {
            sort_reading_order: false,
            ..Default::default()
        };
        let result = build_result(
            recognized(vec![line("B", 0.9, 0.2, 0.1), line("A", 0.9, 0.8, 0.1)]),
            &config,
        );

        assert_eq!(texts(&result.lines), vec!["B", "A"]);
        assert_eq!(result.full_text, "B\nA");
    }

    #[test]
    fn test_build_result_without_lines() {
        let result = build_result(recognized(vec![]), &OcrConfig::default());

        assert_eq!(result.line_count, 0);
        assert_eq!(result.full_text, "");
        assert!(result.lines.is_empty());
    }
}
