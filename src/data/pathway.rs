//! Pathway membership database and display annotations.
//!
//! Both tables are supplied by an external curated reference (KEGG, MetaCyc,
//! GO). This module only holds and loads them.

use crate::error::{GseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A pathway and its member feature identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    /// Unique pathway identifier (e.g. `ko00010`).
    pub id: String,
    /// Member feature identifiers (e.g. KO numbers).
    pub members: BTreeSet<String>,
}

impl Pathway {
    /// Create a pathway. Fails if it has no members.
    pub fn new<I, S>(id: impl Into<String>, members: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(GseaError::EmptyData(format!(
                "Pathway '{}' has no members",
                id
            )));
        }
        Ok(Self { id, members })
    }

    /// Number of members in the database definition.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a constructed pathway.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Ordered collection of pathways with unique identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathwayDatabase {
    pathways: Vec<Pathway>,
}

impl PathwayDatabase {
    /// Create a database, rejecting duplicate pathway identifiers.
    pub fn new(pathways: Vec<Pathway>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for p in &pathways {
            if !seen.insert(p.id.as_str()) {
                return Err(GseaError::DuplicateIdentifier(p.id.clone()));
            }
        }
        Ok(Self { pathways })
    }

    /// Load a GMT file: `id<TAB>description<TAB>member<TAB>member...`.
    ///
    /// Returns the database together with the descriptions found in the
    /// second column (empty or `NA` descriptions are skipped).
    pub fn from_gmt<P: AsRef<Path>>(path: P) -> Result<(Self, PathwayAnnotations)> {
        let reader = BufReader::new(File::open(path)?);
        let mut pathways = Vec::new();
        let mut annotations = PathwayAnnotations::new();

        for (line_no, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 3 {
                return Err(GseaError::InvalidValue {
                    value: line.clone(),
                    row: line_no,
                    col: fields.len(),
                });
            }
            let members = fields[2..].iter().filter(|m| !m.is_empty()).copied();
            pathways.push(Pathway::new(fields[0], members)?);

            let description = fields[1];
            if !description.is_empty() && description != "NA" {
                annotations.insert(fields[0], description, None);
            }
        }

        Ok((Self::new(pathways)?, annotations))
    }

    /// Load a long-format TSV with a header: `pathway_id<TAB>feature_id`.
    ///
    /// Pathways keep the order of their first appearance.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();
        lines
            .next()
            .ok_or_else(|| GseaError::EmptyData("Empty pathway file".to_string()))??;

        let mut order: Vec<String> = Vec::new();
        let mut members: HashMap<String, BTreeSet<String>> = HashMap::new();

        for (row, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 2 || fields[0].is_empty() || fields[1].is_empty() {
                return Err(GseaError::InvalidValue {
                    value: line.clone(),
                    row,
                    col: 1,
                });
            }
            let entry = members.entry(fields[0].to_string()).or_insert_with(|| {
                order.push(fields[0].to_string());
                BTreeSet::new()
            });
            entry.insert(fields[1].to_string());
        }

        if order.is_empty() {
            return Err(GseaError::EmptyData("No pathways in file".to_string()));
        }

        let pathways = order
            .into_iter()
            .map(|id| {
                let m = members.remove(&id).unwrap_or_default();
                Pathway { id, members: m }
            })
            .collect();
        Self::new(pathways)
    }

    /// Number of pathways.
    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    /// Look up a pathway by id.
    pub fn get(&self, id: &str) -> Option<&Pathway> {
        self.pathways.iter().find(|p| p.id == id)
    }

    /// Iterate over pathways in database order.
    pub fn iter(&self) -> impl Iterator<Item = &Pathway> {
        self.pathways.iter()
    }
}

impl FromIterator<Pathway> for PathwayDatabase {
    /// The first definition of a duplicated id wins.
    fn from_iter<T: IntoIterator<Item = Pathway>>(iter: T) -> Self {
        let mut seen = BTreeSet::new();
        let pathways = iter
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();
        Self { pathways }
    }
}

/// Display information for one pathway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayAnnotation {
    pub name: String,
    pub description: Option<String>,
}

/// Lookup from pathway id to display name and description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathwayAnnotations {
    entries: BTreeMap<String, PathwayAnnotation>,
}

impl PathwayAnnotations {
    /// Create an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, id: &str, name: &str, description: Option<&str>) {
        self.entries.insert(
            id.to_string(),
            PathwayAnnotation {
                name: name.to_string(),
                description: description.map(String::from),
            },
        );
    }

    /// Load a TSV with a header: `pathway_id<TAB>name[<TAB>description]`.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = reader.lines();
        lines
            .next()
            .ok_or_else(|| GseaError::EmptyData("Empty annotation file".to_string()))??;

        let mut annotations = Self::new();
        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let (Some(id), Some(name)) = (fields.first(), fields.get(1)) else {
                continue;
            };
            if id.is_empty() || name.is_empty() {
                continue;
            }
            let description = fields.get(2).copied().filter(|d| !d.is_empty() && *d != "NA");
            annotations.insert(id, name, description);
        }
        Ok(annotations)
    }

    /// Look up an entry.
    pub fn get(&self, id: &str) -> Option<&PathwayAnnotation> {
        self.entries.get(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_pathway_requires_members() {
        assert!(Pathway::new("ko00010", Vec::<String>::new()).is_err());
        let p = Pathway::new("ko00010", ["K00844", "K12407", "K00844"]).unwrap();
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_database_rejects_duplicates() {
        let a = Pathway::new("ko00010", ["K1"]).unwrap();
        let b = Pathway::new("ko00010", ["K2"]).unwrap();
        assert!(matches!(
            PathwayDatabase::new(vec![a, b]),
            Err(GseaError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn test_from_gmt() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ko00010\tGlycolysis / Gluconeogenesis\tK00844\tK12407\tK00845").unwrap();
        writeln!(file, "ko00020\tNA\tK01647\tK01681").unwrap();
        file.flush().unwrap();

        let (db, annotations) = PathwayDatabase::from_gmt(file.path()).unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.get("ko00010").unwrap().len(), 3);
        assert_eq!(
            annotations.get("ko00010").unwrap().name,
            "Glycolysis / Gluconeogenesis"
        );
        assert!(annotations.get("ko00020").is_none());
    }

    #[test]
    fn test_from_long_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pathway_id\tfeature_id").unwrap();
        writeln!(file, "map00020\tK01647").unwrap();
        writeln!(file, "map00010\tK00844").unwrap();
        writeln!(file, "map00020\tK01681").unwrap();
        file.flush().unwrap();

        let db = PathwayDatabase::from_tsv(file.path()).unwrap();
        let ids: Vec<&str> = db.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["map00020", "map00010"]);
        assert_eq!(db.get("map00020").unwrap().len(), 2);
    }

    #[test]
    fn test_annotations_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pathway_id\tname\tdescription").unwrap();
        writeln!(file, "ko00010\tGlycolysis\tCentral carbon metabolism").unwrap();
        writeln!(file, "ko00020\tTCA cycle").unwrap();
        file.flush().unwrap();

        let ann = PathwayAnnotations::from_tsv(file.path()).unwrap();
        assert_eq!(ann.len(), 2);
        assert_eq!(
            ann.get("ko00010").unwrap().description.as_deref(),
            Some("Central carbon metabolism")
        );
        assert_eq!(ann.get("ko00020").unwrap().description, None);
    }
}
