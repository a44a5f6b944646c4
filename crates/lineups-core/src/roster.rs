use std::collections::{HashMap, HashSet};

use crate::contest::Contest;
use crate::normalize::canonicalize;

/// Precomputed answer set for one contest.
///
/// Every starter contributes its full-name key. A starter with more than one
/// name token also contributes its surname-only key, unless another starter
/// already owns that key: full-name keys are registered first, and the first
/// starter to claim a shared surname keeps it.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    acceptable_keys: HashSet<String>,
    display_for: HashMap<String, String>,
}

impl RosterIndex {
    pub fn build(contest: &Contest) -> Self {
        let mut index = Self::default();

        let keyed: Vec<(String, &str)> = contest
            .starters
            .iter()
            .map(|name| (canonicalize(name), name.as_str()))
            .filter(|(key, _)| !key.is_empty())
            .collect();

        for (full_key, name) in &keyed {
            index.register(full_key, name);
        }

        for (full_key, name) in &keyed {
            let surname = surname_key(full_key);
            if surname != full_key && !index.display_for.contains_key(surname) {
                index.register(surname, name);
            }
        }

        index
    }

    fn register(&mut self, key: &str, display: &str) {
        self.acceptable_keys.insert(key.to_string());
        self.display_for
            .entry(key.to_string())
            .or_insert_with(|| display.to_string());
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.acceptable_keys.contains(key)
    }

    /// Full starter name shown for an accepted key.
    pub fn display_for(&self, key: &str) -> Option<&str> {
        self.display_for.get(key).map(String::as_str)
    }

    pub fn acceptable_keys(&self) -> &HashSet<String> {
        &self.acceptable_keys
    }

    pub fn len(&self) -> usize {
        self.acceptable_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptable_keys.is_empty()
    }
}

/// Last space-separated token of a canonical name.
fn surname_key(full_key: &str) -> &str {
    full_key.rsplit(' ').next().unwrap_or(full_key)
}
