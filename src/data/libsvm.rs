//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1

use crate::core::{Dataset, Result, SVMError, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut max_dimension = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (sample, max_idx) = Self::parse_line(line).map_err(|e| {
                SVMError::ParseError(format!("line {}: {}", line_num + 1, e))
            })?;
            samples.push(sample);
            max_dimension = max_dimension.max(max_idx + 1);
        }

        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            samples,
            dimensions: max_dimension,
        })
    }

    /// Build a dataset from in-memory samples
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        let dimensions = samples
            .iter()
            .flat_map(|s| s.features.indices.iter())
            .map(|&i| i + 1)
            .max()
            .unwrap_or(0);
        Ok(LibSVMDataset {
            samples,
            dimensions,
        })
    }

    fn parse_line(line: &str) -> Result<(Sample, usize)> {
        let mut parts = line.split_whitespace();

        let label_str = parts
            .next()
            .ok_or_else(|| SVMError::ParseError("empty line".to_string()))?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| SVMError::ParseError(format!("invalid label: {}", label_str)))?;
        // Collapse multi-class labels onto the binary convention
        let label = if label > 0.0 { 1.0 } else { -1.0 };

        let mut indices = Vec::new();
        let mut values = Vec::new();
        let mut max_index = 0;

        for pair in parts {
            let (index_str, value_str) = pair.split_once(':').ok_or_else(|| {
                SVMError::ParseError(format!("invalid feature format: {}", pair))
            })?;

            let index = index_str.parse::<usize>().map_err(|_| {
                SVMError::ParseError(format!("invalid feature index: {}", index_str))
            })?;
            let value = value_str.parse::<f64>().map_err(|_| {
                SVMError::ParseError(format!("invalid feature value: {}", value_str))
            })?;

            // libsvm indices are 1-based
            if index == 0 {
                return Err(SVMError::ParseError(
                    "feature index must be positive".to_string(),
                ));
            }
            let zero_based = index - 1;

            indices.push(zero_based);
            values.push(value);
            max_index = max_index.max(zero_based);
        }

        Ok((Sample::new(SparseVector::new(indices, values), label), max_index))
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn get_labels(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.label).collect()
    }
}
