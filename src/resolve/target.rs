use std::collections::BTreeSet;

use super::candidates::{KindFilter, filter_by_reference, hint_matches, narrow, widen};
use super::{CandidateSummary, FilterFallback, ResolutionState, ResolveError, Resolver};
use crate::clause::ResolutionClause;
use crate::dataset::{DatasetEdition, WardRecord};
use crate::normalize::strip_admin_prefix;

impl<'d> Resolver<'d> {
    /// The reform ward a clause's sources move into. `sources` are the
    /// clause's resolved legacy wards; their codes and footprint steer the
    /// choice.
    pub(super) fn resolve_target(
        &self,
        state: &ResolutionState<'d>,
        clause: &ResolutionClause,
        sources: &[&'d WardRecord],
    ) -> Result<&'d WardRecord, ResolveError> {
        let reference = &clause.target;
        let candidates = widen(
            self.reform,
            reference,
            self.options.filter_fallback,
            |candidates, fallback| self.narrow_target(state, clause, candidates, sources, fallback),
        );

        match candidates.as_slice() {
            [] => Err(ResolveError::not_found(
                clause,
                reference,
                DatasetEdition::Reform,
            )),
            [only] => Ok(*only),
            many => Err(ResolveError::AmbiguousUnit {
                document_ref: clause.document_ref.clone(),
                clause: clause.text.clone(),
                reference: reference.raw.clone(),
                edition: DatasetEdition::Reform,
                candidates: many
                    .iter()
                    .map(|ward| CandidateSummary::describe(self.reform, ward))
                    .collect(),
            }),
        }
    }

    fn narrow_target(
        &self,
        state: &ResolutionState<'d>,
        clause: &ResolutionClause,
        candidates: Vec<&'d WardRecord>,
        sources: &[&'d WardRecord],
        fallback: FilterFallback,
    ) -> Vec<&'d WardRecord> {
        let candidates = filter_by_reference(
            self.reform,
            &clause.target,
            candidates,
            KindFilter::Honor,
            fallback,
        );

        // A reform ward that kept one of its predecessors' codes.
        let source_codes: BTreeSet<&str> = sources.iter().map(|ward| ward.code.as_str()).collect();
        let candidates = narrow(candidates, |ward| source_codes.contains(ward.code.as_str()));

        let province_codes: BTreeSet<&str> = sources
            .iter()
            .map(|ward| ward.province_code.as_str())
            .collect();
        let province_names: BTreeSet<&str> = sources
            .iter()
            .filter_map(|ward| self.legacy.ward_province(ward))
            .map(|province| strip_admin_prefix(&province.normalized_name))
            .collect();
        let candidates = narrow(candidates, |ward| {
            province_codes.contains(ward.province_code.as_str())
                || self.reform.ward_province(ward).is_some_and(|province| {
                    province_names.contains(strip_admin_prefix(&province.normalized_name))
                })
        });

        let district_codes: BTreeSet<&str> = sources
            .iter()
            .filter_map(|ward| ward.district_code.as_deref())
            .collect();
        let candidates = narrow(candidates, |ward| {
            ward.district_code
                .as_deref()
                .is_some_and(|district| district_codes.contains(district))
        });

        let candidates = narrow(candidates, |ward| {
            state.recent_reform_provinces.contains(&ward.province_code)
        });
        let hint = self.hints.reform.as_ref();
        narrow(candidates, |ward| hint_matches(self.reform, hint, ward))
    }
}
