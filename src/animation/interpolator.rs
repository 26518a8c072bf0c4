use crate::diagram::Point;

/// Linear position between two anchors at fraction `t`.
///
/// The endpoints are returned verbatim rather than computed, so `t = 0` is
/// exactly `source` and `t = 1` is exactly `target` regardless of floating
/// point rounding. Out-of-range and NaN fractions never overshoot.
pub fn interpolate(source: Point, target: Point, t: f64) -> Point {
    if t.is_nan() || t <= 0.0 {
        return source;
    }
    if t >= 1.0 {
        return target;
    }

    Point {
        x: source.x + (target.x - source.x) * t,
        y: source.y + (target.y - source.y) * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        let source = Point::new(0.1, -7.3);
        let target = Point::new(0.3, 1e9);

        assert_eq!(interpolate(source, target, 0.0), source);
        assert_eq!(interpolate(source, target, 1.0), target);
    }

    #[test]
    fn test_midpoint() {
        let mid = interpolate(Point::new(0.0, 0.0), Point::new(10.0, -4.0), 0.5);
        assert_eq!(mid, Point::new(5.0, -2.0));
    }

    #[test]
    fn test_no_overshoot_or_nan() {
        let source = Point::new(3.0, 3.0);
        let target = Point::new(9.0, 9.0);

        assert_eq!(interpolate(source, target, -0.5), source);
        assert_eq!(interpolate(source, target, 1.5), target);
        assert_eq!(interpolate(source, target, f64::NAN), source);
    }

    #[test]
    fn test_same_source_and_target() {
        let p = Point::new(4.0, 2.0);
        let mid = interpolate(p, p, 0.37);
        assert_eq!(mid, p);
        assert!(mid.is_finite());
    }
}
