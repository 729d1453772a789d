//! Path filters selecting which parts of a monitor document to collect
//!
//! A filter is a set of paths; every path segment is a regular expression
//! matched against the whole key at that depth. A document subtree is kept when
//! its key path matches a complete pattern.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::models::TableId;

pub const TABLE_ID_PATTERN: &str = "[0-9a-f-]+";
pub const SHARD_PATTERN: &str = "shard_.*";
pub const BTREE_PATTERN: &str = "btree-.*";
pub const DOC_COUNTER_PATTERN: &str = "(total_)?keys_(read|set)";

static GLOBAL_FILTER: Lazy<StatsFilter> = Lazy::new(|| {
    StatsFilter::new([
        vec!["query_engine".to_string()],
        vec![TABLE_ID_PATTERN.to_string(), "serializers".to_string()],
    ])
});

/// Set of path patterns, ordered for stable output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsFilter {
    patterns: BTreeSet<Vec<String>>,
}

impl StatsFilter {
    pub fn new(patterns: impl IntoIterator<Item = Vec<String>>) -> Self {
        Self { patterns: patterns.into_iter().collect() }
    }

    /// Everything any report needs: engine counters and every table's serializers
    pub fn global() -> Self {
        GLOBAL_FILTER.clone()
    }

    /// Shard document counters of the tables whose id matches `table_segment`
    pub fn shard_counters(table_segment: String) -> Vec<String> {
        vec![
            table_segment,
            "serializers".to_string(),
            SHARD_PATTERN.to_string(),
            BTREE_PATTERN.to_string(),
            DOC_COUNTER_PATTERN.to_string(),
        ]
    }

    /// Path segment matching exactly one table id
    pub fn table_segment(table_id: &TableId) -> String {
        regex::escape(&table_id.to_string())
    }

    pub fn patterns(&self) -> &BTreeSet<Vec<String>> {
        &self.patterns
    }

    pub fn compile(&self) -> Result<CompiledFilter, regex::Error> {
        let patterns = self
            .patterns
            .iter()
            .map(|segments| {
                segments
                    .iter()
                    .map(|segment| Regex::new(&format!("^(?:{})$", segment)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledFilter { filter: self.clone(), patterns })
    }
}

/// Filter with its segment expressions compiled
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    filter: StatsFilter,
    patterns: Vec<Vec<Regex>>,
}

impl CompiledFilter {
    /// Patterns this filter was compiled from
    pub fn filter(&self) -> &StatsFilter {
        &self.filter
    }

    /// Keep only the matching subtrees of `doc`
    ///
    /// Non-object documents are returned untouched so the parser can reject them.
    pub fn apply(&self, doc: &Value) -> Value {
        let Value::Object(root) = doc else {
            return doc.clone();
        };
        if self.patterns.iter().any(|pattern| pattern.is_empty()) {
            return doc.clone();
        }
        let active: Vec<usize> = (0..self.patterns.len()).collect();
        Value::Object(self.filter_object(root, 0, &active))
    }

    fn filter_object(&self, object: &Map<String, Value>, depth: usize, active: &[usize]) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in object {
            let matched: Vec<usize> = active
                .iter()
                .copied()
                .filter(|&i| self.patterns[i].get(depth).is_some_and(|re| re.is_match(key)))
                .collect();
            if matched.is_empty() {
                continue;
            }

            if matched.iter().any(|&i| self.patterns[i].len() == depth + 1) {
                out.insert(key.clone(), value.clone());
            } else if let Value::Object(child) = value {
                let filtered = self.filter_object(child, depth + 1, &matched);
                if !filtered.is_empty() {
                    out.insert(key.clone(), Value::Object(filtered));
                }
            }
        }
        out
    }
}
