mod candidates;
mod error;
mod search;
mod sources;
mod target;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::clause::ResolutionClause;
use crate::dataset::{Dataset, ProvinceRecord, WardRecord};
use crate::normalize::strip_admin_prefix;

pub use error::{CandidateSummary, ResolveError};

const PARTIAL_NOTE_PREFIX: &str = "một phần: ";

/// What a kind or parent filter does when it would leave no candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterFallback {
    /// Keep the empty result; the reference then fails as not found.
    Strict,
    /// Keep the unfiltered candidates and log a warning.
    #[default]
    Relax,
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub max_search_nodes: usize,
    pub filter_fallback: FilterFallback,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_search_nodes: 100_000,
            filter_fallback: FilterFallback::default(),
        }
    }
}

/// A province the document is believed to concern, by code, by normalized
/// name, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvinceHint {
    pub code: Option<String>,
    pub normalized_name: Option<String>,
}

impl ProvinceHint {
    pub fn matches(&self, province: &ProvinceRecord) -> bool {
        let by_code = self
            .code
            .as_deref()
            .is_some_and(|code| code == province.code);
        let by_name = self.normalized_name.as_deref().is_some_and(|name| {
            strip_admin_prefix(name) == strip_admin_prefix(&province.normalized_name)
        });
        by_code || by_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvinceHints {
    pub legacy: Option<ProvinceHint>,
    pub reform: Option<ProvinceHint>,
}

/// One legacy ward moving (wholly or partly) into one reform ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub old_province_code: String,
    pub old_district_code: String,
    pub old_ward_code: String,
    pub new_province_code: String,
    pub new_commune_code: String,
    pub note: String,
    pub resolution_ref: String,
}

/// Context carried from one clause to the next within a document.
#[derive(Debug, Default)]
pub struct ResolutionState<'d> {
    /// Legacy wards resolved by earlier clauses, in resolution order.
    resolved: Vec<&'d WardRecord>,
    recent_legacy_provinces: BTreeSet<String>,
    recent_reform_provinces: BTreeSet<String>,
    rows: Vec<MappingRow>,
}

impl<'d> ResolutionState<'d> {
    pub fn into_rows(self) -> Vec<MappingRow> {
        self.rows
    }
}

/// Resolves the clauses of one document, in order, into mapping rows.
///
/// Any error aborts the whole document; no rows are returned for it.
pub fn resolve(
    clauses: &[ResolutionClause],
    legacy: &Dataset,
    reform: &Dataset,
    hints: &ProvinceHints,
    options: &ResolverOptions,
) -> Result<Vec<MappingRow>, ResolveError> {
    let resolver = Resolver {
        legacy,
        reform,
        hints,
        options,
    };

    let state = clauses
        .iter()
        .try_fold(ResolutionState::default(), |state, clause| {
            resolver.resolve_clause(state, clause)
        })?;

    Ok(state.into_rows())
}

struct Resolver<'d> {
    legacy: &'d Dataset,
    reform: &'d Dataset,
    hints: &'d ProvinceHints,
    options: &'d ResolverOptions,
}

impl<'d> Resolver<'d> {
    fn resolve_clause(
        &self,
        state: ResolutionState<'d>,
        clause: &ResolutionClause,
    ) -> Result<ResolutionState<'d>, ResolveError> {
        let sources = self.resolve_sources(&state, clause)?;
        let target = self.resolve_target(&state, clause, &sources)?;

        let rows: Vec<MappingRow> = clause
            .sources
            .iter()
            .zip(&sources)
            .map(|(reference, ward)| MappingRow {
                old_province_code: ward.province_code.clone(),
                old_district_code: ward.district_code.clone().unwrap_or_default(),
                old_ward_code: ward.code.clone(),
                new_province_code: target.province_code.clone(),
                new_commune_code: target.code.clone(),
                note: mapping_note(ward, target, reference.partial),
                resolution_ref: clause.document_ref.clone(),
            })
            .collect();

        debug!(
            document = %clause.document_ref,
            sources = sources.len(),
            target = %target.code,
            "clause resolved"
        );

        let ResolutionState {
            mut resolved,
            rows: mut all_rows,
            ..
        } = state;
        resolved.extend(sources.iter().copied());
        all_rows.extend(rows);

        Ok(ResolutionState {
            resolved,
            recent_legacy_provinces: sources
                .iter()
                .map(|ward| ward.province_code.clone())
                .collect(),
            recent_reform_provinces: BTreeSet::from([target.province_code.clone()]),
            rows: all_rows,
        })
    }
}

fn mapping_note(old: &WardRecord, new: &WardRecord, partial: bool) -> String {
    let note = format!("{} -> {}", old.full_name, new.full_name);
    if partial {
        format!("{PARTIAL_NOTE_PREFIX}{note}")
    } else {
        note
    }
}
