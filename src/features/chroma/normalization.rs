//! Chroma normalization strategies

/// Per-frame normalization applied by the chromagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaNormalization {
    /// Raw constant-Q magnitudes
    None,
    /// Divide by the largest bin
    UnitMax,
    /// Divide by the sum of all bins
    UnitSum,
}

/// Normalize `chroma` in place
///
/// All-zero frames are left untouched.
pub fn normalize(chroma: &mut [f64], method: ChromaNormalization) {
    let scale = match method {
        ChromaNormalization::None => return,
        ChromaNormalization::UnitMax => max_value(chroma),
        ChromaNormalization::UnitSum => chroma.iter().sum(),
    };
    if scale > 0.0 {
        for x in chroma.iter_mut() {
            *x /= scale;
        }
    }
}

/// Largest value of a frame, or 0 for an empty one
///
/// Starts from the first element, so an all-negative frame returns its
/// largest (negative) value.
pub fn max_value(values: &[f64]) -> f64 {
    match values.split_first() {
        Some((first, rest)) => rest.iter().fold(*first, |m, &v| if v > m { v } else { m }),
        None => 0.0,
    }
}

/// Index and value of the first strict maximum
pub fn arg_max(values: &[f64]) -> (usize, f64) {
    let mut index = 0;
    let mut max = values.first().copied().unwrap_or(0.0);
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > max {
            max = v;
            index = i;
        }
    }
    (index, max)
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Subtract the mean of `values` from every element; returns that mean
pub fn zero_center(values: &mut [f64]) -> f64 {
    let m = mean(values);
    for x in values.iter_mut() {
        *x -= m;
    }
    m
}

/// Zero-center `values` and rescale so that a bin equal to `peak` maps to 1
///
/// `peak` is the largest raw energy of the current frame. When it does not
/// exceed the mean (silence, perfectly flat frames) there is no tonal
/// contrast and the frame becomes all zeros.
pub fn zero_center_to_peak(values: &mut [f64], peak: f64) {
    let m = zero_center(values);
    let range = peak - m;
    if range > 0.0 {
        for x in values.iter_mut() {
            *x /= range;
        }
    } else {
        values.iter_mut().for_each(|x| *x = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_max() {
        let mut chroma = vec![1.0, 4.0, 2.0];
        normalize(&mut chroma, ChromaNormalization::UnitMax);
        assert_eq!(chroma, vec![0.25, 1.0, 0.5]);
    }

    #[test]
    fn test_normalize_unit_sum() {
        let mut chroma = vec![1.0, 1.0, 2.0];
        normalize(&mut chroma, ChromaNormalization::UnitSum);
        assert_eq!(chroma, vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_normalize_zero_frame() {
        let mut chroma = vec![0.0; 4];
        normalize(&mut chroma, ChromaNormalization::UnitMax);
        assert_eq!(chroma, vec![0.0; 4]);
    }

    #[test]
    fn test_arg_max_first_strict() {
        assert_eq!(arg_max(&[1.0, 3.0, 3.0, 2.0]), (1, 3.0));
        assert_eq!(arg_max(&[-2.0, -1.0]), (1, -1.0));
        assert_eq!(arg_max(&[0.0, 0.0]), (0, 0.0));
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(&[]), 0.0);
        assert_eq!(max_value(&[-3.0, -1.5]), -1.5);
        assert_eq!(max_value(&[0.2, 0.9, 0.1]), 0.9);
    }

    #[test]
    fn test_zero_center_to_peak() {
        let mut values = vec![0.0, 1.0, 0.0, 1.0];
        zero_center_to_peak(&mut values, 1.0);
        assert_eq!(values, vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_zero_center_to_peak_flat_frame() {
        let mut values = vec![0.005; 6];
        zero_center_to_peak(&mut values, 0.005);
        assert!(values.iter().all(|&v| v == 0.0));
    }
}
