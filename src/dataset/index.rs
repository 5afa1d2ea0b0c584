use std::collections::HashMap;

use crate::normalize::strip_admin_prefix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Lower-cased spelling with every diacritic kept.
    Exact,
    /// Normalized bare name ("phu thanh").
    Name,
    /// Normalized full name including the type noun ("xa phu thanh").
    FullName,
    /// `parent::ward`, parent being a district or a province.
    Qualified,
}

/// Name keys to ward codes. Lists are non-unique across keys but never hold
/// the same code twice under one key.
#[derive(Debug, Default)]
pub struct LookupIndex {
    keys: HashMap<(IndexKey, String), Vec<String>>,
}

impl LookupIndex {
    pub fn insert(&mut self, kind: IndexKey, key: &str, code: &str) {
        if key.trim().is_empty() {
            return;
        }

        let codes = self.keys.entry((kind, key.to_string())).or_default();
        if !codes.iter().any(|existing| existing == code) {
            codes.push(code.to_string());
        }
    }

    pub fn get(&self, kind: IndexKey, key: &str) -> &[String] {
        self.keys
            .get(&(kind, key.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

/// Composite key used for parent-qualified lookups. Both sides are normalized
/// names; the parent loses its leading type noun so "huyen ba vi" and "ba vi"
/// produce the same key.
pub fn qualified_key(parent_normalized: &str, ward_normalized: &str) -> String {
    format!(
        "{}::{}",
        strip_admin_prefix(parent_normalized),
        ward_normalized
    )
}
