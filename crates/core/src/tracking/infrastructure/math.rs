//! Box overlap used to de-duplicate palms and hands.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Fraction of `inner`'s area that lies inside `outer`.
pub fn coverage(inner: &[f64; 4], outer: &[f64; 4]) -> f64 {
    let x1 = inner[0].max(outer[0]);
    let y1 = inner[1].max(outer[1]);
    let x2 = inner[2].min(outer[2]);
    let y2 = inner[3].min(outer[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area = (inner[2] - inner[0]) * (inner[3] - inner[1]);
    if area <= 0.0 {
        return 0.0;
    }
    inter / area
}

/// Axis-aligned `[x1, y1, x2, y2]` around a set of normalized points.
pub fn points_bbox(points: impl IntoIterator<Item = (f32, f32)>) -> Option<[f64; 4]> {
    points.into_iter().fold(None, |acc, (x, y)| {
        let (x, y) = (x as f64, y as f64);
        Some(match acc {
            None => [x, y, x, y],
            Some([x1, y1, x2, y2]) => [x1.min(x), y1.min(y), x2.max(x), y2.max(y)],
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_iou_no_overlap() {
        let a = [0.0, 0.0, 0.1, 0.1];
        let b = [0.2, 0.2, 0.3, 0.3];
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_perfect_overlap() {
        let a = [0.1, 0.1, 0.4, 0.5];
        assert!((bbox_iou(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        let expected = 25.0 / 175.0;
        assert!((bbox_iou(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_contained_box() {
        let inner = [0.4, 0.4, 0.5, 0.5];
        let outer = [0.0, 0.0, 1.0, 1.0];
        assert!((coverage(&inner, &outer) - 1.0).abs() < 1e-9);
        assert!(coverage(&outer, &inner) < 0.02);
    }

    #[test]
    fn test_coverage_half_inside() {
        let inner = [0.0, 0.0, 0.2, 0.2];
        let outer = [0.1, 0.0, 0.5, 0.5];
        assert!((coverage(&inner, &outer) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_points_bbox() {
        let bbox = points_bbox([(0.5, 0.2), (0.1, 0.9), (0.3, 0.4)]).unwrap();
        assert!((bbox[0] - 0.1).abs() < 1e-6);
        assert!((bbox[1] - 0.2).abs() < 1e-6);
        assert!((bbox[2] - 0.5).abs() < 1e-6);
        assert!((bbox[3] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_points_bbox_empty() {
        assert!(points_bbox(std::iter::empty()).is_none());
    }
}
