//! Sample windowing and buffering utilities

/// Splits a sample stream into overlapping fixed-size blocks
///
/// Samples can be pushed in chunks of any size; every complete block is
/// yielded exactly once, successive blocks starting `hop_size` samples
/// apart.
///
/// # Example
///
/// ```
/// use keytrack::io::BlockFramer;
///
/// let mut framer = BlockFramer::new(4, 2);
/// framer.push(&[0.0, 1.0, 2.0]);
/// assert!(framer.next_block().is_none());
///
/// framer.push(&[3.0, 4.0, 5.0]);
/// assert_eq!(framer.next_block(), Some(&[0.0, 1.0, 2.0, 3.0][..]));
/// assert_eq!(framer.next_block(), Some(&[2.0, 3.0, 4.0, 5.0][..]));
/// assert!(framer.next_block().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct BlockFramer {
    /// Pending samples, starting at the oldest one still needed
    data: Vec<f64>,
    /// Start of the next block within `data`
    position: usize,
    block_size: usize,
    hop_size: usize,
}

impl BlockFramer {
    /// Framer for blocks of `block_size` samples advancing by `hop_size`
    ///
    /// Both sizes are raised to at least 1.
    pub fn new(block_size: usize, hop_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            data: Vec::with_capacity(2 * block_size),
            position: 0,
            block_size,
            hop_size: hop_size.max(1),
        }
    }

    /// Samples per block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Advance between blocks
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Append samples to the stream
    pub fn push(&mut self, samples: &[f64]) {
        // drop what no future block can reach
        let consumed = self.position.min(self.data.len());
        if consumed > 0 {
            self.data.drain(..consumed);
            self.position -= consumed;
        }
        self.data.extend_from_slice(samples);
    }

    /// Next complete block, if enough samples have been pushed
    pub fn next_block(&mut self) -> Option<&[f64]> {
        let start = self.position;
        let end = start + self.block_size;
        if end > self.data.len() {
            return None;
        }
        self.position += self.hop_size;
        Some(&self.data[start..end])
    }

    /// Samples pushed but not yet part of a yielded block start
    pub fn pending(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Drop all buffered samples
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }
}
