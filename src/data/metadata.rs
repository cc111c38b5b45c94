//! Sample metadata and group-label resolution.

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A variable value that can be categorical, continuous, or missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Label used when this value defines a group.
    ///
    /// Numeric codes (e.g. `0`/`1` groupings) are accepted as labels.
    pub fn as_group_label(&self) -> Option<String> {
        match self {
            Variable::Categorical(s) => Some(s.clone()),
            Variable::Continuous(v) => Some(v.to_string()),
            Variable::Missing => None,
        }
    }
}

/// Inferred type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample metadata containing variables for each sample.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// Sample IDs in order.
    sample_ids: Vec<String>,
    /// Column names.
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
    /// Inferred type of each column.
    column_types: HashMap<String, VariableType>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build metadata with a single categorical column from `(sample_id, label)` pairs.
    pub fn from_groups<S, L>(column: &str, samples: impl IntoIterator<Item = (S, L)>) -> Result<Self>
    where
        S: Into<String>,
        L: Into<String>,
    {
        let mut metadata = Self::new();
        metadata.column_names.push(column.to_string());
        metadata
            .column_types
            .insert(column.to_string(), VariableType::Categorical);

        for (sample, label) in samples {
            let sample: String = sample.into();
            if metadata.data.contains_key(&sample) {
                return Err(GseaError::DuplicateIdentifier(sample));
            }
            let mut row = HashMap::new();
            row.insert(column.to_string(), Variable::Categorical(label.into()));
            metadata.sample_ids.push(sample.clone());
            metadata.data.insert(sample, row);
        }

        if metadata.sample_ids.is_empty() {
            return Err(GseaError::EmptyData("No samples in metadata".to_string()));
        }
        Ok(metadata)
    }

    /// Load metadata from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is sample ID)
    /// - Subsequent rows: sample ID followed by variable values
    ///
    /// Columns are inferred as continuous if all values parse as numbers,
    /// otherwise categorical. Empty cells and `NA` are missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| GseaError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(GseaError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();

        let mut raw_data: Vec<(String, Vec<String>)> = Vec::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sample_id = fields[0].trim().to_string();
            let values: Vec<String> = fields[1..].iter().map(|s| s.to_string()).collect();
            raw_data.push((sample_id, values));
        }

        if raw_data.is_empty() {
            return Err(GseaError::EmptyData("No samples in metadata".to_string()));
        }

        let mut column_types = HashMap::new();
        for (col_idx, col_name) in column_names.iter().enumerate() {
            let all_numeric = raw_data.iter().all(|(_, values)| {
                values
                    .get(col_idx)
                    .map(|v| is_missing_token(v) || v.trim().parse::<f64>().is_ok())
                    .unwrap_or(true)
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            column_types.insert(col_name.clone(), var_type);
        }

        let mut sample_ids = Vec::new();
        let mut data = HashMap::new();

        for (sample_id, values) in raw_data {
            if data.contains_key(&sample_id) {
                return Err(GseaError::DuplicateIdentifier(sample_id));
            }
            let mut sample_data = HashMap::new();
            for (col_idx, col_name) in column_names.iter().enumerate() {
                let var = match values.get(col_idx) {
                    None => Variable::Missing,
                    Some(raw) if is_missing_token(raw) => Variable::Missing,
                    Some(raw) => match column_types.get(col_name) {
                        Some(VariableType::Continuous) => raw
                            .trim()
                            .parse::<f64>()
                            .map(Variable::Continuous)
                            .unwrap_or(Variable::Missing),
                        _ => Variable::Categorical(raw.trim().to_string()),
                    },
                };
                sample_data.insert(col_name.clone(), var);
            }
            sample_ids.push(sample_id.clone());
            data.insert(sample_id, sample_data);
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Get the inferred type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Distinct non-missing group labels in a column, sorted.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        if !self.has_column(column) {
            return Err(GseaError::MissingColumn(column.to_string()));
        }
        let levels: BTreeSet<String> = self
            .sample_ids
            .iter()
            .filter_map(|sid| self.get(sid, column).and_then(Variable::as_group_label))
            .collect();
        Ok(levels.into_iter().collect())
    }

    /// Resolve the group label of each requested sample, in the order given.
    ///
    /// Every sample must be present in the metadata and carry a non-missing
    /// value in `column`.
    pub fn group_labels(&self, sample_ids: &[String], column: &str) -> Result<Vec<String>> {
        if !self.has_column(column) {
            return Err(GseaError::MissingColumn(column.to_string()));
        }
        sample_ids
            .iter()
            .map(|sid| {
                let value = self.data.get(sid).ok_or_else(|| {
                    GseaError::MissingSample(format!("sample '{}' not found in metadata", sid))
                })?;
                value
                    .get(column)
                    .and_then(Variable::as_group_label)
                    .ok_or_else(|| {
                        GseaError::MissingSample(format!(
                            "sample '{}' has no value in column '{}'",
                            sid, column
                        ))
                    })
            })
            .collect()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

fn is_missing_token(raw: &str) -> bool {
    let v = raw.trim();
    v.is_empty() || v == "NA" || v == "na"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tEnvironment\tdepth").unwrap();
        writeln!(file, "S1\tPro-survival\t25").unwrap();
        writeln!(file, "S2\tPro-inflammatory\t30").unwrap();
        writeln!(file, "S3\tPro-survival\t35").unwrap();
        writeln!(file, "S4\tPro-inflammatory\t28").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_metadata() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.n_samples(), 4);
        assert_eq!(meta.sample_ids(), &["S1", "S2", "S3", "S4"]);
        assert_eq!(meta.column_names(), &["Environment", "depth"]);
        assert_eq!(meta.column_type("Environment"), Some(VariableType::Categorical));
        assert_eq!(meta.column_type("depth"), Some(VariableType::Continuous));
        assert_eq!(meta.get("S2", "depth").unwrap().as_continuous(), Some(30.0));
    }

    #[test]
    fn test_levels() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let levels = meta.levels("Environment").unwrap();
        assert_eq!(levels, vec!["Pro-inflammatory", "Pro-survival"]);
        assert!(matches!(meta.levels("nope"), Err(GseaError::MissingColumn(_))));
    }

    #[test]
    fn test_group_labels_in_requested_order() {
        let meta = Metadata::from_groups("group", [("a", "x"), ("b", "y"), ("c", "x")]).unwrap();
        let labels = meta
            .group_labels(&["c".to_string(), "a".to_string(), "b".to_string()], "group")
            .unwrap();
        assert_eq!(labels, vec!["x", "x", "y"]);
    }

    #[test]
    fn test_group_labels_missing_sample() {
        let meta = Metadata::from_groups("group", [("a", "x"), ("b", "y")]).unwrap();
        let result = meta.group_labels(&["a".to_string(), "zzz".to_string()], "group");
        assert!(matches!(result, Err(GseaError::MissingSample(_))));
    }

    #[test]
    fn test_missing_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tgroup\tage").unwrap();
        writeln!(file, "S1\tcontrol\t25").unwrap();
        writeln!(file, "S2\ttreatment\tNA").unwrap();
        writeln!(file, "S3\t\t30").unwrap();
        file.flush().unwrap();

        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert!(meta.get("S2", "age").unwrap().is_missing());
        assert!(meta.get("S3", "group").unwrap().is_missing());
        let result = meta.group_labels(&["S3".to_string()], "group");
        assert!(matches!(result, Err(GseaError::MissingSample(_))));
    }
}
