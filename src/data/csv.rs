//! CSV dataset implementation
//!
//! Dense rows with the class label in the first column:
//! label,feature_1,feature_2,...
//!
//! The separator is configurable (comma by default). Zero-valued features
//! are dropped when building the sparse representation.

use crate::core::{Dataset, Result, SVMError, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for dense CSV files
#[derive(Debug, Clone)]
pub struct CsvDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl CsvDataset {
    /// Load a comma-separated dataset
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with_separator(path, ',')
    }

    /// Load a dataset with a custom separator
    pub fn from_file_with_separator<P: AsRef<Path>>(path: P, separator: char) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        Self::from_reader(BufReader::new(file), separator)
    }

    /// Load a dataset from a reader
    pub fn from_reader<R: BufRead>(reader: R, separator: char) -> Result<Self> {
        let mut samples = Vec::new();
        let mut dimensions = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let sample = Self::parse_line(line, separator).map_err(|e| {
                SVMError::ParseError(format!("line {}: {}", line_num + 1, e))
            })?;

            let width = sample
                .features
                .indices
                .last()
                .map(|&i| i + 1)
                .unwrap_or(0);
            dimensions = dimensions.max(width);
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(CsvDataset {
            samples,
            dimensions,
        })
    }

    fn parse_line(line: &str, separator: char) -> Result<Sample> {
        let mut fields = line.split(separator);

        let label_str = fields
            .next()
            .ok_or_else(|| SVMError::ParseError("empty line".to_string()))?
            .trim();
        let label = label_str
            .parse::<f64>()
            .map_err(|_| SVMError::ParseError(format!("invalid label: {}", label_str)))?;
        let label = if label > 0.0 { 1.0 } else { -1.0 };

        let mut indices = Vec::new();
        let mut values = Vec::new();

        for (column, field) in fields.enumerate() {
            let value = field.trim().parse::<f64>().map_err(|_| {
                SVMError::ParseError(format!("invalid value in column {}: {}", column + 2, field))
            })?;
            if value != 0.0 {
                indices.push(column);
                values.push(value);
            }
        }

        Ok(Sample::new(SparseVector::new(indices, values), label))
    }
}

impl Dataset for CsvDataset {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line_basic() {
        let sample = CsvDataset::parse_line("1,0.5,0.0,1.2", ',').unwrap();
        assert_eq!(sample.label, 1.0);
        // Zero entries are dropped
        assert_eq!(sample.features.indices, vec![0, 2]);
        assert_eq!(sample.features.values, vec![0.5, 1.2]);
    }

    #[test]
    fn test_parse_line_negative_label() {
        let sample = CsvDataset::parse_line("-1,2.0,3.0", ',').unwrap();
        assert_eq!(sample.label, -1.0);
        assert_eq!(sample.features.values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_parse_line_custom_separator() {
        let sample = CsvDataset::parse_line("1;0.5;1.2", ';').unwrap();
        assert_eq!(sample.label, 1.0);
        assert_eq!(sample.features.values, vec![0.5, 1.2]);
    }

    #[test]
    fn test_parse_line_whitespace_tolerated() {
        let sample = CsvDataset::parse_line(" 1 , 0.5 , 1.2 ", ',').unwrap();
        assert_eq!(sample.label, 1.0);
        assert_eq!(sample.features.values, vec![0.5, 1.2]);
    }

    #[test]
    fn test_parse_line_invalid_value() {
        assert!(CsvDataset::parse_line("1,abc", ',').is_err());
        assert!(CsvDataset::parse_line("abc,1.0", ',').is_err());
    }

    #[test]
    fn test_from_reader_basic() {
        let data = "1,2.0,1.0\n-1,-2.0,-1.0\n";
        let dataset = CsvDataset::from_reader(Cursor::new(data), ',').unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 2);
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_from_reader_comments_and_blanks() {
        let data = "# header comment\n1,0.5\n\n-1,0.3\n";
        let dataset = CsvDataset::from_reader(Cursor::new(data), ',').unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_from_reader_empty() {
        let result = CsvDataset::from_reader(Cursor::new(""), ',');
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_dimension_from_widest_row() {
        let data = "1,1.0\n-1,1.0,2.0,3.0\n";
        let dataset = CsvDataset::from_reader(Cursor::new(data), ',').unwrap();
        assert_eq!(dataset.dim(), 3);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "1,2.0,1.0").expect("Failed to write");
        writeln!(temp_file, "-1,-2.0,-1.0").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let dataset = CsvDataset::from_file(temp_file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);
    }
}
