use ndarray::{Array1, Array2};

use crate::error::{FeatureError, Result};
use crate::segment::SegmentedFile;

/// Global mean/stddev over the training partition.
///
/// Two passes: the first accumulates per-file sums into the mean, the second
/// segments again against that mean and accumulates squared deviations.
#[derive(Debug, Clone)]
pub struct NormalizationStats {
    sum: Array1<f64>,
    frames: usize,
    squared_deviation: Array1<f64>,
    deviation_frames: usize,
}

impl NormalizationStats {
    pub fn new(dim: usize) -> Self {
        Self {
            sum: Array1::zeros(dim),
            frames: 0,
            squared_deviation: Array1::zeros(dim),
            deviation_frames: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.sum.len()
    }

    fn check_dim(&self, found: usize) -> Result<()> {
        if found != self.dim() {
            return Err(FeatureError::DimensionMismatch {
                expected: self.dim(),
                found,
            });
        }
        Ok(())
    }

    /// Adds a segmented file: its squared deviation when it was segmented
    /// against a mean (second pass), otherwise its sum (first pass).
    pub fn absorb(&mut self, file: &SegmentedFile) -> Result<()> {
        match &file.squared_deviation {
            Some(sq) => {
                self.check_dim(sq.len())?;
                self.squared_deviation += sq;
                self.deviation_frames += file.total_frames;
            }
            None => {
                self.check_dim(file.sum.len())?;
                self.sum += &file.sum;
                self.frames += file.total_frames;
            }
        }
        Ok(())
    }

    pub fn mean(&self) -> Result<Array1<f32>> {
        if self.frames == 0 {
            return Err(FeatureError::EmptyFile);
        }
        let frames = self.frames as f64;
        Ok(self.sum.mapv(|v| (v / frames) as f32))
    }

    pub fn stddev(&self) -> Result<Array1<f32>> {
        if self.deviation_frames < 2 {
            return Err(FeatureError::EmptyFile);
        }
        let dof = (self.deviation_frames - 1) as f64;
        Ok(self.squared_deviation.mapv(|v| (v / dof).sqrt() as f32))
    }
}

/// Applies `(x - mean) / stddev` per dimension. Dimensions with zero
/// deviation are only centered.
pub fn normalize(features: &mut Array2<f32>, mean: &Array1<f32>, stddev: &Array1<f32>) -> Result<()> {
    for found in [mean.len(), stddev.len()] {
        if found != features.ncols() {
            return Err(FeatureError::DimensionMismatch {
                expected: features.ncols(),
                found,
            });
        }
    }
    let scale = stddev.mapv(|s| if s > 0.0 { s } else { 1.0 });
    *features -= mean;
    *features /= &scale;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::segment::{UtteranceSegmenter, UtteranceSpan};

    #[test]
    fn test_two_pass_over_files() {
        let a = array![[1.0f32, 0.0], [3.0, 0.0]];
        let b = array![[5.0f32, 0.0], [7.0, 0.0]];
        let spans = |n| vec![UtteranceSpan::new("0001", 0, n)];
        let segmenter = UtteranceSegmenter::new(0);

        let mut stats = NormalizationStats::new(2);
        for features in [&a, &b] {
            let file = segmenter.segment("spk", features, &spans(2), true, None).unwrap();
            stats.absorb(&file).unwrap();
        }
        let mean = stats.mean().unwrap();
        assert_eq!(mean, array![4.0f32, 0.0]);

        for features in [&a, &b] {
            let file = segmenter
                .segment("spk", features, &spans(2), true, Some(&mean))
                .unwrap();
            stats.absorb(&file).unwrap();
        }
        // deviations 3,1,1,3 -> 20 / 3
        let stddev = stats.stddev().unwrap();
        assert!((stddev[0] - (20.0f32 / 3.0).sqrt()).abs() < 1e-5);
        assert_eq!(stddev[1], 0.0);

        let mut features = a.clone();
        normalize(&mut features, &mean, &stddev).unwrap();
        assert!((features[[0, 0]] + 3.0 / stddev[0]).abs() < 1e-6);
        assert_eq!(features[[1, 1]], 0.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = NormalizationStats::new(3);
        assert!(matches!(stats.mean(), Err(FeatureError::EmptyFile)));
        assert!(matches!(stats.stddev(), Err(FeatureError::EmptyFile)));
    }

    #[test]
    fn test_normalize_dimension_mismatch() {
        let mut features = Array2::<f32>::zeros((2, 3));
        let v = Array1::<f32>::zeros(2);
        assert!(normalize(&mut features, &v, &v).is_err());
    }
}
