use super::Point2;

/// A planar cubic Bézier segment.
#[derive(Debug, Clone, Copy)]
pub struct CubicBezier {
    pub start: Point2,
    pub control1: Point2,
    pub control2: Point2,
    pub end: Point2,
}

impl CubicBezier {
    /// Creates a new segment from its four control points.
    #[must_use]
    pub fn new(start: Point2, control1: Point2, control2: Point2, end: Point2) -> Self {
        Self {
            start,
            control1,
            control2,
            end,
        }
    }

    /// Evaluates the curve at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        Point2::from(
            self.start.coords * b0
                + self.control1.coords * b1
                + self.control2.coords * b2
                + self.end.coords * b3,
        )
    }

    /// Number of chords needed to stay within `tolerance` of the curve.
    ///
    /// Wang's bound for cubics: `ceil(sqrt(3/4 * M / tolerance))`, where `M`
    /// is the largest second difference of the control polygon.
    #[must_use]
    pub fn segments_for(&self, tolerance: f64, max_segments: usize) -> usize {
        let d1 = (self.start.coords - 2.0 * self.control1.coords + self.control2.coords).norm();
        let d2 = (self.control1.coords - 2.0 * self.control2.coords + self.end.coords).norm();
        let m = d1.max(d2);
        if m <= 0.0 || tolerance <= 0.0 {
            return 1;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (0.75 * m / tolerance).sqrt().ceil() as usize;
        n.clamp(1, max_segments.max(1))
    }

    /// Flattens the curve into chord end points, excluding `start` and
    /// including `end`.
    #[must_use]
    pub fn flatten(&self, tolerance: f64, max_segments: usize) -> Vec<Point2> {
        let n = self.segments_for(tolerance, max_segments);
        #[allow(clippy::cast_precision_loss)]
        (1..=n).map(|i| self.point_at(i as f64 / n as f64)).collect()
    }
}
