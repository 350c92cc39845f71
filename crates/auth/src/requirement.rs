//! Statically configured authorization requirements.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Exact set of claim keys a token of a given kind must carry.
///
/// Built from the configured list; duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ClaimRequirement {
    claims: BTreeSet<String>,
}

impl ClaimRequirement {
    pub fn new<I, S>(claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, claim: &str) -> bool {
        self.claims.contains(claim)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.claims.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ClaimRequirement {
    fn from(value: Vec<String>) -> Self {
        Self::new(value)
    }
}

impl From<ClaimRequirement> for Vec<String> {
    fn from(value: ClaimRequirement) -> Self {
        value.claims.into_iter().collect()
    }
}

/// Authorization levels admitted by a hierarchy-gated route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<i64>", into = "Vec<i64>")]
pub struct HierarchySet {
    levels: BTreeSet<i64>,
}

impl HierarchySet {
    pub fn new(levels: impl IntoIterator<Item = i64>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    pub fn contains(&self, level: i64) -> bool {
        self.levels.contains(&level)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.levels.iter().copied()
    }
}

impl From<Vec<i64>> for HierarchySet {
    fn from(value: Vec<i64>) -> Self {
        Self::new(value)
    }
}

impl From<HierarchySet> for Vec<i64> {
    fn from(value: HierarchySet) -> Self {
        value.levels.into_iter().collect()
    }
}
