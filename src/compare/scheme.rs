//! Identifier scheme detection for pathway and feature ids.

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierScheme {
    /// KEGG pathway map (`ko00010`, `map00010`, `00010`).
    KeggPathway,
    /// KEGG orthology (`K00001`).
    KeggOrthology,
    /// Enzyme Commission number (`EC:1.1.1.1`, `2.7.1.-`).
    EcNumber,
    /// MetaCyc pathway (`PWY-5100`, `GLYCOLYSIS-PWY`).
    MetaCyc,
    /// Gene Ontology term (`GO:0008150`).
    GeneOntology,
    Other,
}

impl IdentifierScheme {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeggPathway => "KEGG pathway",
            Self::KeggOrthology => "KEGG orthology",
            Self::EcNumber => "EC number",
            Self::MetaCyc => "MetaCyc pathway",
            Self::GeneOntology => "GO term",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for IdentifierScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiled patterns for scheme detection.
#[derive(Debug, Clone)]
pub struct SchemeDetector {
    patterns: Vec<(IdentifierScheme, Regex)>,
}

impl SchemeDetector {
    /// Compile the detection patterns.
    pub fn new() -> Result<Self> {
        let patterns = vec![
            (IdentifierScheme::KeggPathway, Regex::new(r"^(?:map|ko|ec|rn)?\d{5}$")?),
            (IdentifierScheme::KeggOrthology, Regex::new(r"^K\d{5}$")?),
            (
                IdentifierScheme::EcNumber,
                Regex::new(r"^(?:EC:?\s*)?\d+\.(?:\d+|-)\.(?:\d+|-)\.(?:n?\d+|-)$")?,
            ),
            (
                IdentifierScheme::MetaCyc,
                Regex::new(r"^(?:PWY[A-Z0-9]*-[A-Za-z0-9-]+|[A-Z0-9][A-Z0-9-]*-PWY(?:-[A-Za-z0-9]+)*)$")?,
            ),
            (IdentifierScheme::GeneOntology, Regex::new(r"^GO:\d{7}$")?),
        ];
        Ok(Self { patterns })
    }

    /// Scheme of a single identifier.
    pub fn detect(&self, id: &str) -> IdentifierScheme {
        let id = id.trim();
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(id))
            .map(|(scheme, _)| *scheme)
            .unwrap_or(IdentifierScheme::Other)
    }

    /// Most common scheme among identifiers; ties go to the earlier scheme.
    pub fn dominant<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Option<IdentifierScheme> {
        let mut counts: BTreeMap<IdentifierScheme, usize> = BTreeMap::new();
        for id in ids {
            *counts.entry(self.detect(id)).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .fold(None, |best: Option<(IdentifierScheme, usize)>, (scheme, n)| match best {
                Some((_, best_n)) if best_n >= n => best,
                _ => Some((scheme, n)),
            })
            .map(|(scheme, _)| scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_schemes() {
        let d = SchemeDetector::new().unwrap();
        assert_eq!(d.detect("ko00010"), IdentifierScheme::KeggPathway);
        assert_eq!(d.detect("map01100"), IdentifierScheme::KeggPathway);
        assert_eq!(d.detect("K00844"), IdentifierScheme::KeggOrthology);
        assert_eq!(d.detect("EC:2.7.1.1"), IdentifierScheme::EcNumber);
        assert_eq!(d.detect("1.1.1.-"), IdentifierScheme::EcNumber);
        assert_eq!(d.detect("PWY-5100"), IdentifierScheme::MetaCyc);
        assert_eq!(d.detect("GLYCOLYSIS-PWY"), IdentifierScheme::MetaCyc);
        assert_eq!(d.detect("GO:0008150"), IdentifierScheme::GeneOntology);
        assert_eq!(d.detect("glycolysis"), IdentifierScheme::Other);
    }

    #[test]
    fn test_dominant_scheme() {
        let d = SchemeDetector::new().unwrap();
        assert_eq!(
            d.dominant(["ko00010", "ko00020", "PWY-5100"]),
            Some(IdentifierScheme::KeggPathway)
        );
        assert_eq!(d.dominant(["PWY-1", "K00001"]), Some(IdentifierScheme::KeggOrthology));
        assert_eq!(d.dominant(std::iter::empty()), None);
    }
}
