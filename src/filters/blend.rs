use super::GazeFilter;
use std::collections::VecDeque;

/// Outlier clamp, moving average and exponential blend in one cascade.
///
/// Per frame: a raw value jumping more than `outlier_threshold` pixels
/// from the last stable position on either axis is replaced by a 50/50
/// blend with that position; the (possibly clamped) value then enters a
/// fixed-size ring buffer, and the output blends the buffer mean with the
/// last stable position by `smooth_factor` (lower is smoother, laggier).
pub struct BlendFilter {
    window_size: usize,
    smooth_factor: f64,
    outlier_threshold: f64,
    buffer: VecDeque<(f64, f64)>,
    last_stable: Option<(f64, f64)>,
}

impl BlendFilter {
    /// Create a blend filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero, `smooth_factor` is outside (0, 1]
    /// or `outlier_threshold` is not positive.
    #[must_use]
    pub fn new(window_size: usize, smooth_factor: f64, outlier_threshold: f64) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(
            smooth_factor > 0.0 && smooth_factor <= 1.0,
            "Smooth factor must be in (0, 1]"
        );
        assert!(outlier_threshold > 0.0, "Outlier threshold must be positive");
        Self {
            window_size,
            smooth_factor,
            outlier_threshold,
            buffer: VecDeque::with_capacity(window_size),
            last_stable: None,
        }
    }

    /// Last stable output, if any input has been seen
    #[must_use]
    pub fn last_stable(&self) -> Option<(f64, f64)> {
        self.last_stable
    }
}

impl GazeFilter for BlendFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let (last_x, last_y) = match self.last_stable {
            Some(last) => last,
            None => {
                self.last_stable = Some((x, y));
                self.buffer.clear();
                (x, y)
            }
        };

        // Single bad landmark frames produce large jumps; pull them
        // halfway back toward the stable position instead of following.
        let (x, y) = if (x - last_x).abs() > self.outlier_threshold
            || (y - last_y).abs() > self.outlier_threshold
        {
            (last_x * 0.5 + x * 0.5, last_y * 0.5 + y * 0.5)
        } else {
            (x, y)
        };

        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back((x, y));

        let n = self.buffer.len() as f64;
        let mean_x = self.buffer.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = self.buffer.iter().map(|p| p.1).sum::<f64>() / n;

        let a = self.smooth_factor;
        let smoothed_x = a.mul_add(mean_x, (1.0 - a) * last_x);
        let smoothed_y = a.mul_add(mean_y, (1.0 - a) * last_y);

        self.last_stable = Some((smoothed_x, smoothed_y));
        (smoothed_x, smoothed_y)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.last_stable = None;
    }

    fn name(&self) -> &str {
        "BlendFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_converges() {
        let mut filter = BlendFilter::new(7, 0.5, 200.0);

        let mut out = (0.0, 0.0);
        for _ in 0..30 {
            out = filter.apply(500.0, 500.0);
        }

        assert!((out.0 - 500.0).abs() < 1.0);
        assert!((out.1 - 500.0).abs() < 1.0);
    }

    #[test]
    fn test_outlier_jump_is_contracted() {
        let mut filter = BlendFilter::new(7, 0.5, 200.0);

        for _ in 0..20 {
            filter.apply(500.0, 500.0);
        }
        let before = filter.last_stable().unwrap();
        let out = filter.apply(900.0, 500.0);

        let raw_jump = 900.0 - before.0;
        let filtered_jump = out.0 - before.0;
        assert!(filtered_jump.abs() < raw_jump.abs());
        // the clamp alone caps the accepted value at the halfway blend
        assert!(out.0 < 700.0);
    }

    #[test]
    fn test_small_steps_pass_without_clamp() {
        let mut filter = BlendFilter::new(3, 1.0, 200.0);

        filter.apply(100.0, 100.0);
        let out = filter.apply(150.0, 150.0);
        // factor 1.0 makes the output the plain buffer mean
        assert!((out.0 - 125.0).abs() < 1e-9);
        assert!((out.1 - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = BlendFilter::new(7, 0.5, 200.0);
        for _ in 0..10 {
            filter.apply(500.0, 500.0);
        }

        filter.reset();
        assert!(filter.last_stable().is_none());

        // first value after reset passes through
        let out = filter.apply(1200.0, 40.0);
        assert!((out.0 - 1200.0).abs() < 1e-9);
        assert!((out.1 - 40.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "Window size must be greater than 0")]
    fn test_zero_window_rejected() {
        let _ = BlendFilter::new(0, 0.5, 200.0);
    }

    #[test]
    #[should_panic(expected = "Smooth factor must be in (0, 1]")]
    fn test_bad_smooth_factor_rejected() {
        let _ = BlendFilter::new(7, 1.5, 200.0);
    }
}
