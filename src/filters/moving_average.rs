use super::GazeFilter;
use std::collections::VecDeque;

/// Moving average over a fixed-size ring of coordinate pairs
pub struct MovingAverageFilter {
    window_size: usize,
    buffer: VecDeque<(f64, f64)>,
}

impl MovingAverageFilter {
    /// Create a moving average filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }
}

impl GazeFilter for MovingAverageFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back((x, y));

        let n = self.buffer.len() as f64;
        (
            self.buffer.iter().map(|p| p.0).sum::<f64>() / n,
            self.buffer.iter().map(|p| p.1).sum::<f64>() / n,
        )
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}
