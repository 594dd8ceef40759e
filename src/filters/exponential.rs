use super::GazeFilter;

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<(f64, f64)>,
}

impl ExponentialFilter {
    /// Create an exponential filter; lower alpha smooths harder
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl GazeFilter for ExponentialFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let filtered = match self.last {
            Some((lx, ly)) => (
                self.alpha.mul_add(x - lx, lx),
                self.alpha.mul_add(y - ly, ly),
            ),
            None => (x, y),
        };

        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
