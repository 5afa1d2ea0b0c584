use std::collections::BTreeSet;

use tracing::debug;

use super::candidates::{
    KindFilter, Widening, filter_by_reference, hint_matches, lookup, narrow, narrow_by_context,
    widen,
};
use super::search::{Choice, SearchOutcome, search};
use super::{CandidateSummary, FilterFallback, ResolutionState, ResolveError, Resolver};
use crate::clause::{ResolutionClause, UnitReference};
use crate::dataset::{DatasetEdition, WardRecord};

type Pending<'d> = Vec<(usize, Vec<&'d WardRecord>)>;

impl<'d> Resolver<'d> {
    /// One legacy ward per source, in source order.
    pub(super) fn resolve_sources(
        &self,
        state: &ResolutionState<'d>,
        clause: &ResolutionClause,
    ) -> Result<Vec<&'d WardRecord>, ResolveError> {
        let mut assigned: Vec<Option<&'d WardRecord>> = vec![None; clause.sources.len()];
        let mut pending = self.source_order(clause);

        while !pending.is_empty() {
            let attempted = pending.len();
            let mut deferred: Pending<'d> = Vec::new();

            for index in pending {
                let candidates = self.source_candidates(state, clause, index, &assigned)?;
                if candidates.len() == 1 {
                    assigned[index] = candidates.first().copied();
                } else {
                    deferred.push((index, candidates));
                }
            }

            if deferred.len() == attempted {
                self.assign_by_search(state, clause, &deferred, &mut assigned)?;
                break;
            }
            pending = deferred.into_iter().map(|(index, _)| index).collect();
        }

        assigned
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                ResolveError::unresolvable(clause, "a source was left without a legacy ward")
            })
    }

    /// Parent known first, then fewest candidates, then type known.
    fn source_order(&self, clause: &ResolutionClause) -> Vec<usize> {
        let mut keys: Vec<(bool, usize, bool, usize)> = clause
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                (
                    source.parent.is_none(),
                    lookup(self.legacy, source, Widening::Widened).len(),
                    source.kind.is_none(),
                    index,
                )
            })
            .collect();
        keys.sort();
        keys.into_iter().map(|(.., index)| index).collect()
    }

    fn source_candidates(
        &self,
        state: &ResolutionState<'d>,
        clause: &ResolutionClause,
        index: usize,
        assigned: &[Option<&'d WardRecord>],
    ) -> Result<Vec<&'d WardRecord>, ResolveError> {
        let reference = &clause.sources[index];
        let candidates = widen(
            self.legacy,
            reference,
            self.options.filter_fallback,
            |candidates, fallback| {
                self.narrow_source(state, reference, candidates, assigned, fallback)
            },
        );

        if candidates.is_empty() {
            return Err(ResolveError::not_found(
                clause,
                reference,
                DatasetEdition::Legacy,
            ));
        }
        Ok(candidates)
    }

    fn narrow_source(
        &self,
        state: &ResolutionState<'d>,
        reference: &UnitReference,
        candidates: Vec<&'d WardRecord>,
        assigned: &[Option<&'d WardRecord>],
        fallback: FilterFallback,
    ) -> Vec<&'d WardRecord> {
        let candidates =
            filter_by_reference(self.legacy, reference, candidates, KindFilter::Honor, fallback);

        let taken: BTreeSet<&str> = assigned
            .iter()
            .flatten()
            .map(|ward| ward.code.as_str())
            .collect();
        let candidates = narrow(candidates, |ward| !taken.contains(ward.code.as_str()));
        let candidates = narrow(candidates, |ward| {
            state.recent_legacy_provinces.contains(&ward.province_code)
        });
        let hint = self.hints.legacy.as_ref();
        let candidates = narrow(candidates, |ward| hint_matches(self.legacy, hint, ward));

        let context: Vec<&WardRecord> = assigned
            .iter()
            .flatten()
            .copied()
            .chain(state.resolved.iter().copied())
            .collect();
        narrow_by_context(candidates, &context)
    }

    /// Settles every deferred source at once with the assignment search.
    fn assign_by_search(
        &self,
        state: &ResolutionState<'d>,
        clause: &ResolutionClause,
        deferred: &[(usize, Vec<&'d WardRecord>)],
        assigned: &mut [Option<&'d WardRecord>],
    ) -> Result<(), ResolveError> {
        let fixed: Vec<&'d WardRecord> = assigned.iter().flatten().copied().collect();
        let document_codes: BTreeSet<&str> = state
            .resolved
            .iter()
            .map(|ward| ward.code.as_str())
            .collect();
        let hint = self.hints.legacy.as_ref();

        let mut slots = Vec::with_capacity(deferred.len());
        for (index, candidates) in deferred {
            let reference = &clause.sources[*index];
            let mut free = free_candidates(reference, candidates.clone(), &fixed, &document_codes);
            if free.is_empty() {
                let unkinded = widen(
                    self.legacy,
                    reference,
                    self.options.filter_fallback,
                    |candidates, fallback| {
                        filter_by_reference(
                            self.legacy,
                            reference,
                            candidates,
                            KindFilter::Ignore,
                            fallback,
                        )
                    },
                );
                free = free_candidates(reference, unkinded, &fixed, &document_codes);
            }
            if free.is_empty() {
                return Err(ResolveError::unresolvable(
                    clause,
                    format!("no unused legacy ward is left for \"{}\"", reference.raw),
                ));
            }

            slots.push(
                free.into_iter()
                    .map(|ward| Choice {
                        ward,
                        hinted: hint_matches(self.legacy, hint, ward),
                    })
                    .collect::<Vec<_>>(),
            );
        }

        debug!(
            document = %clause.document_ref,
            slots = slots.len(),
            sizes = ?slots.iter().map(Vec::len).collect::<Vec<_>>(),
            "searching for a one-to-one assignment"
        );

        match search(&slots, &fixed, self.options.max_search_nodes) {
            SearchOutcome::Found(records) => {
                for ((index, _), ward) in deferred.iter().zip(records) {
                    assigned[*index] = Some(ward);
                }
                Ok(())
            }
            SearchOutcome::Tied(sets) => Err(self.tied_assignment(clause, deferred, &sets)),
            SearchOutcome::NoAssignment => Err(ResolveError::unresolvable(
                clause,
                "no one-to-one assignment of sources to legacy wards exists",
            )),
            SearchOutcome::LimitExceeded { explored } => Err(ResolveError::SearchLimitExceeded {
                document_ref: clause.document_ref.clone(),
                clause: clause.text.clone(),
                explored,
            }),
        }
    }

    /// Reports the first source whose ward differs between the tied
    /// assignments, with every ward it could take.
    fn tied_assignment(
        &self,
        clause: &ResolutionClause,
        deferred: &[(usize, Vec<&'d WardRecord>)],
        sets: &[Vec<&'d WardRecord>],
    ) -> ResolveError {
        let code_at = |set: &Vec<&'d WardRecord>, position: usize| {
            set.get(position).map(|ward| ward.code.as_str())
        };
        let position = (0..deferred.len())
            .find(|position| {
                let first = sets.first().and_then(|set| code_at(set, *position));
                sets.iter().any(|set| code_at(set, *position) != first)
            })
            .unwrap_or(0);

        let mut seen = BTreeSet::new();
        let candidates = sets
            .iter()
            .filter_map(|set| set.get(position))
            .filter(|ward| seen.insert(ward.code.clone()))
            .map(|ward| CandidateSummary::describe(self.legacy, ward))
            .collect();

        let reference = deferred
            .get(position)
            .map(|(index, _)| clause.sources[*index].raw.clone())
            .unwrap_or_default();

        ResolveError::AmbiguousUnit {
            document_ref: clause.document_ref.clone(),
            clause: clause.text.clone(),
            reference,
            edition: DatasetEdition::Legacy,
            candidates,
        }
    }
}

/// Drops wards already taken in this clause, and wards resolved by earlier
/// clauses unless the source is a partial transfer: a split ward can appear
/// in several clauses, a whole one cannot.
fn free_candidates<'d>(
    reference: &UnitReference,
    candidates: Vec<&'d WardRecord>,
    fixed: &[&'d WardRecord],
    document_codes: &BTreeSet<&str>,
) -> Vec<&'d WardRecord> {
    let free: Vec<&'d WardRecord> = candidates
        .into_iter()
        .filter(|ward| !fixed.iter().any(|taken| taken.code == ward.code))
        .collect();
    if reference.partial {
        return free;
    }

    free.into_iter()
        .filter(|ward| !document_codes.contains(ward.code.as_str()))
        .collect()
}
