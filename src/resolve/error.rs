use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::clause::{ResolutionClause, UnitReference};
use crate::dataset::{Dataset, DatasetEdition, WardRecord};

/// One competing record, with enough context for a human to pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSummary {
    pub code: String,
    pub full_name: String,
    pub district: Option<String>,
    pub province: String,
}

impl CandidateSummary {
    pub fn describe(dataset: &Dataset, ward: &WardRecord) -> Self {
        Self {
            code: ward.code.clone(),
            full_name: ward.full_name.clone(),
            district: dataset
                .ward_district(ward)
                .map(|district| district.full_name.clone()),
            province: dataset
                .ward_province(ward)
                .map(|province| province.full_name.clone())
                .unwrap_or_else(|| ward.province_code.clone()),
        }
    }
}

impl fmt::Display for CandidateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.full_name)?;
        if let Some(district) = &self.district {
            write!(f, ", {district}")?;
        }
        write!(f, ", {}", self.province)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{document_ref}: no {edition} ward matches \"{reference}\" in clause: {clause}")]
    UnitNotFound {
        document_ref: String,
        clause: String,
        reference: String,
        edition: DatasetEdition,
    },

    #[error(
        "{document_ref}: \"{reference}\" is ambiguous between {} {edition} wards [{}] in clause: {clause}",
        .candidates.len(),
        list_candidates(.candidates)
    )]
    AmbiguousUnit {
        document_ref: String,
        clause: String,
        reference: String,
        edition: DatasetEdition,
        candidates: Vec<CandidateSummary>,
    },

    #[error("{document_ref}: {reason} in clause: {clause}")]
    ClauseUnresolvable {
        document_ref: String,
        clause: String,
        reason: String,
    },

    #[error(
        "{document_ref}: assignment search stopped after {explored} nodes without a verdict in clause: {clause}"
    )]
    SearchLimitExceeded {
        document_ref: String,
        clause: String,
        explored: usize,
    },
}

impl ResolveError {
    pub(super) fn not_found(
        clause: &ResolutionClause,
        reference: &UnitReference,
        edition: DatasetEdition,
    ) -> Self {
        Self::UnitNotFound {
            document_ref: clause.document_ref.clone(),
            clause: clause.text.clone(),
            reference: reference.raw.clone(),
            edition,
        }
    }

    pub(super) fn unresolvable(clause: &ResolutionClause, reason: impl Into<String>) -> Self {
        Self::ClauseUnresolvable {
            document_ref: clause.document_ref.clone(),
            clause: clause.text.clone(),
            reason: reason.into(),
        }
    }
}

fn list_candidates(candidates: &[CandidateSummary]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
