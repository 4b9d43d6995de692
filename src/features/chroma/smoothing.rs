//! Temporal chroma smoothing
//!
//! Fixed-capacity history buffers sized once at construction:
//! - [`ChromaHistory`]: ring of recent chroma frames with a running mean
//! - [`MedianFilter`]: lower median over recent key decisions

/// Ring buffer of the most recent chroma frames
///
/// Frames are stored contiguously, `capacity * bins` values in total. The
/// write position wraps with modular arithmetic; nothing is reallocated
/// after construction.
#[derive(Debug, Clone)]
pub struct ChromaHistory {
    data: Vec<f64>,
    bins: usize,
    capacity: usize,
    write_index: usize,
    filled: usize,
}

impl ChromaHistory {
    /// History of `capacity` frames (at least 1) of `bins` values each
    pub fn new(capacity: usize, bins: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity * bins],
            bins,
            capacity,
            write_index: 0,
            filled: 0,
        }
    }

    /// Maximum number of frames held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frames currently held
    pub fn len(&self) -> usize {
        self.filled
    }

    /// True before the first push
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Store a frame, overwriting the oldest one once full
    ///
    /// Only the first `bins` values of `frame` are used; a shorter frame is
    /// zero-padded.
    pub fn push(&mut self, frame: &[f64]) {
        let start = self.write_index * self.bins;
        let slot = &mut self.data[start..start + self.bins];
        for (i, dst) in slot.iter_mut().enumerate() {
            *dst = frame.get(i).copied().unwrap_or(0.0);
        }

        self.write_index = (self.write_index + 1) % self.capacity;
        if self.filled < self.capacity {
            self.filled += 1;
        }
    }

    /// Write the per-bin mean over the filled frames into `out`
    ///
    /// Leaves zeros when nothing has been pushed yet.
    pub fn mean_into(&self, out: &mut [f64]) {
        out.iter_mut().for_each(|x| *x = 0.0);
        if self.filled == 0 {
            return;
        }

        // unfilled slots are always the trailing ones
        for frame in self.data.chunks_exact(self.bins).take(self.filled) {
            for (acc, &v) in out.iter_mut().zip(frame) {
                *acc += v;
            }
        }
        let n = self.filled as f64;
        for x in out.iter_mut() {
            *x /= n;
        }
    }

    /// Forget all frames
    pub fn clear(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
        self.write_index = 0;
        self.filled = 0;
    }
}

/// Median filter over the most recent key indices
///
/// Reports the lower median of the filled part of the window, so with an
/// even count the smaller of the two middle values wins.
#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: Vec<u8>,
    sorted: Vec<u8>,
    write_index: usize,
    filled: usize,
}

impl MedianFilter {
    /// Filter over `size` decisions (at least 1)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            window: vec![0; size],
            sorted: Vec::with_capacity(size),
            write_index: 0,
            filled: 0,
        }
    }

    /// Window length
    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Add a decision and return the current median
    pub fn push(&mut self, value: u8) -> u8 {
        let size = self.window.len();
        self.window[self.write_index] = value;
        self.write_index = (self.write_index + 1) % size;
        if self.filled < size {
            self.filled += 1;
        }

        self.sorted.clear();
        if self.filled < size {
            self.sorted.extend_from_slice(&self.window[..self.filled]);
        } else {
            self.sorted.extend_from_slice(&self.window);
        }
        self.sorted.sort_unstable();

        let midpoint = (self.filled + 1) / 2;
        self.sorted[midpoint.max(1) - 1]
    }

    /// Forget all decisions
    pub fn clear(&mut self) {
        self.window.iter_mut().for_each(|x| *x = 0);
        self.sorted.clear();
        self.write_index = 0;
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_mean_partial_fill() {
        let mut history = ChromaHistory::new(4, 3);
        history.push(&[1.0, 2.0, 3.0]);
        history.push(&[3.0, 2.0, 1.0]);

        let mut mean = [0.0; 3];
        history.mean_into(&mut mean);
        assert_eq!(mean, [2.0, 2.0, 2.0]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_wraps() {
        let mut history = ChromaHistory::new(2, 1);
        history.push(&[1.0]);
        history.push(&[2.0]);
        history.push(&[6.0]); // overwrites 1.0

        let mut mean = [0.0; 1];
        history.mean_into(&mut mean);
        assert_eq!(mean, [4.0]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_single_slot_is_passthrough() {
        let mut history = ChromaHistory::new(0, 2);
        assert_eq!(history.capacity(), 1);
        history.push(&[0.5, 0.25]);
        history.push(&[0.1, 0.9]);

        let mut mean = [0.0; 2];
        history.mean_into(&mut mean);
        assert_eq!(mean, [0.1, 0.9]);
    }

    #[test]
    fn test_history_clear() {
        let mut history = ChromaHistory::new(3, 2);
        history.push(&[1.0, 1.0]);
        history.clear();
        assert!(history.is_empty());

        let mut mean = [9.0; 2];
        history.mean_into(&mut mean);
        assert_eq!(mean, [0.0, 0.0]);
    }

    #[test]
    fn test_median_lower_median() {
        let mut filter = MedianFilter::new(5);
        assert_eq!(filter.push(3), 3);
        assert_eq!(filter.push(1), 1); // [1, 3] -> lower
        assert_eq!(filter.push(2), 2);
        assert_eq!(filter.push(7), 2); // [1, 2, 3, 7]
        assert_eq!(filter.push(7), 3);
    }

    #[test]
    fn test_median_rejects_outlier() {
        let mut filter = MedianFilter::new(3);
        filter.push(5);
        filter.push(5);
        assert_eq!(filter.push(17), 5);
        assert_eq!(filter.push(5), 5);
    }

    #[test]
    fn test_median_window_slides() {
        let mut filter = MedianFilter::new(3);
        for _ in 0..3 {
            filter.push(1);
        }
        filter.push(9);
        assert_eq!(filter.push(9), 9);
    }

    #[test]
    fn test_median_clear() {
        let mut filter = MedianFilter::new(3);
        filter.push(4);
        filter.push(4);
        filter.clear();
        assert_eq!(filter.push(2), 2);
    }
}
