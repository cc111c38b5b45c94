//! Feature abundance matrix (e.g. predicted KO abundances per sample).

use crate::error::{GseaError, Result};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A dense abundance matrix storing feature abundances across samples.
///
/// Rows represent features (KOs, EC numbers, genes), columns represent samples.
/// Entries are finite and non-negative; predicted abundances may be fractional.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    /// Dense matrix (features × samples)
    data: DMatrix<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
    /// Feature id -> row index
    feature_index: HashMap<String, usize>,
}

impl AbundanceMatrix {
    /// Create a new AbundanceMatrix from a dense matrix and identifiers.
    pub fn new(
        data: DMatrix<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(GseaError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(GseaError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }

        let mut feature_index = HashMap::with_capacity(nrows);
        for (row, id) in feature_ids.iter().enumerate() {
            if feature_index.insert(id.clone(), row).is_some() {
                return Err(GseaError::DuplicateIdentifier(id.clone()));
            }
        }
        let mut seen_samples = HashSet::with_capacity(ncols);
        for id in &sample_ids {
            if !seen_samples.insert(id.as_str()) {
                return Err(GseaError::DuplicateIdentifier(id.clone()));
            }
        }

        for row in 0..nrows {
            for col in 0..ncols {
                let value = data[(row, col)];
                if !value.is_finite() || value < 0.0 {
                    return Err(GseaError::InvalidValue {
                        value: value.to_string(),
                        row,
                        col,
                    });
                }
            }
        }

        Ok(Self {
            data,
            feature_ids,
            sample_ids,
            feature_index,
        })
    }

    /// Create from row-major values, mostly useful for tests and small inputs.
    pub fn from_rows(
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self> {
        let n_samples = sample_ids.len();
        if rows.len() != feature_ids.len() {
            return Err(GseaError::DimensionMismatch {
                expected: feature_ids.len(),
                actual: rows.len(),
            });
        }
        let mut flat = Vec::with_capacity(rows.len() * n_samples);
        for row in rows {
            if row.len() != n_samples {
                return Err(GseaError::DimensionMismatch {
                    expected: n_samples,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let data = DMatrix::from_row_slice(rows.len(), n_samples, &flat);
        Self::new(data, feature_ids, sample_ids)
    }

    /// Load an abundance matrix from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with sample IDs (first column is feature ID header)
    /// - Subsequent rows: feature ID followed by abundances
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| GseaError::EmptyData("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(GseaError::EmptyData(
                "TSV must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut feature_ids: Vec<String> = Vec::new();
        let mut values: Vec<f64> = Vec::new();

        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let row_idx = feature_ids.len();
            if fields.len() - 1 != n_samples {
                return Err(GseaError::DimensionMismatch {
                    expected: n_samples,
                    actual: fields.len() - 1,
                });
            }

            feature_ids.push(fields[0].trim().to_string());
            for (col_idx, value_str) in fields[1..].iter().enumerate() {
                let value: f64 = value_str.trim().parse().map_err(|_| GseaError::InvalidValue {
                    value: value_str.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
                values.push(value);
            }
        }

        if feature_ids.is_empty() {
            return Err(GseaError::EmptyData("No features in TSV".to_string()));
        }

        let data = DMatrix::from_row_slice(feature_ids.len(), n_samples, &values);
        Self::new(data, feature_ids, sample_ids)
    }

    /// Write the abundance matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for col_idx in 0..self.n_samples() {
                write!(writer, "\t{}", self.get(row_idx, col_idx))?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Get the value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying dense matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Row index of a feature.
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.feature_index.get(feature_id).copied()
    }

    /// Get a dense vector for a specific row (feature).
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> AbundanceMatrix {
        AbundanceMatrix::from_rows(
            vec!["K00001".into(), "K00002".into(), "K00003".into()],
            vec!["S1".into(), "S2".into(), "S3".into(), "S4".into()],
            &[
                vec![10.0, 20.0, 0.0, 5.5],
                vec![100.0, 200.0, 150.0, 175.0],
                vec![1.0, 0.0, 0.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mat = create_test_matrix();
        assert_eq!(mat.n_features(), 3);
        assert_eq!(mat.n_samples(), 4);
        assert_eq!(mat.feature_index("K00002"), Some(1));
    }

    #[test]
    fn test_row_dense() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_dense(0), vec![10.0, 20.0, 0.0, 5.5]);
    }

    #[test]
    fn test_rejects_negative_values() {
        let result = AbundanceMatrix::from_rows(
            vec!["K1".into()],
            vec!["S1".into(), "S2".into()],
            &[vec![1.0, -2.0]],
        );
        assert!(matches!(result, Err(GseaError::InvalidValue { .. })));
    }

    #[test]
    fn test_rejects_duplicate_features() {
        let result = AbundanceMatrix::from_rows(
            vec!["K1".into(), "K1".into()],
            vec!["S1".into()],
            &[vec![1.0], vec![2.0]],
        );
        assert!(matches!(result, Err(GseaError::DuplicateIdentifier(_))));
    }

    #[test]
    fn test_tsv_roundtrip() {
        let mat = create_test_matrix();

        let temp_file = NamedTempFile::new().unwrap();
        mat.to_tsv(temp_file.path()).unwrap();

        let loaded = AbundanceMatrix::from_tsv(temp_file.path()).unwrap();
        assert_eq!(loaded.feature_ids(), mat.feature_ids());
        assert_eq!(loaded.sample_ids(), mat.sample_ids());
        for row in 0..mat.n_features() {
            for col in 0..mat.n_samples() {
                assert_eq!(loaded.get(row, col), mat.get(row, col));
            }
        }
    }
}
