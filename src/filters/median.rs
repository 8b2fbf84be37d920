use std::collections::VecDeque;

/// Bounded FIFO of samples reporting their median
#[derive(Debug, Clone)]
pub struct MedianWindow {
    window_size: usize,
    buffer: VecDeque<f64>,
}

impl MedianWindow {
    /// Create a new median window
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

    /// Append a sample, evicting the oldest once the window is full
    pub fn push(&mut self, value: f64) {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    /// Median of the buffered samples, `None` while empty
    pub fn median(&self) -> Option<f64> {
        calculate_median(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn calculate_median(values: &VecDeque<f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().collect();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    if len == 0 {
        None
    } else if len % 2 == 0 {
        Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0)
    } else {
        Some(sorted[len / 2])
    }
}
