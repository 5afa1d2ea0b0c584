//! Injective assignment of ambiguous sources to legacy wards.
//!
//! The search is a plain depth-first enumeration over explicit values: the
//! partial assignment and the excluded codes are parameters, and the best
//! assignments seen so far live in an accumulator owned by the caller.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::dataset::WardRecord;

/// One candidate for a slot. `hinted` is true when its province matches the
/// province hint.
#[derive(Debug, Clone, Copy)]
pub(super) struct Choice<'a> {
    pub ward: &'a WardRecord,
    pub hinted: bool,
}

#[derive(Debug)]
pub(super) enum SearchOutcome<'a> {
    /// One record per slot, in slot order.
    Found(Vec<&'a WardRecord>),
    /// Several distinct record sets share the best score.
    Tied(Vec<Vec<&'a WardRecord>>),
    NoAssignment,
    LimitExceeded { explored: usize },
}

/// Lower is better: fewest provinces, then most hint matches, then fewest
/// districts.
type Score = (usize, Reverse<usize>, usize);

#[derive(Debug)]
struct Accumulator<'a> {
    explored: usize,
    limit: usize,
    best: Option<(Score, Vec<Vec<Choice<'a>>>)>,
}

struct LimitReached;

/// Finds the best code-distinct assignment of `slots`. `fixed` holds records
/// already settled in the clause; their codes are unavailable and their
/// provinces and districts count towards every score.
pub(super) fn search<'a>(
    slots: &[Vec<Choice<'a>>],
    fixed: &[&'a WardRecord],
    limit: usize,
) -> SearchOutcome<'a> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|slot| slots[*slot].len());
    let ordered: Vec<&[Choice<'a>]> = order.iter().map(|slot| slots[*slot].as_slice()).collect();

    let excluded: BTreeSet<&str> = fixed.iter().map(|ward| ward.code.as_str()).collect();
    let mut accumulator = Accumulator {
        explored: 0,
        limit,
        best: None,
    };

    if explore(&ordered, fixed, &excluded, &[], &mut accumulator).is_err() {
        return SearchOutcome::LimitExceeded {
            explored: accumulator.explored,
        };
    }

    let Some((_, mut assignments)) = accumulator.best else {
        return SearchOutcome::NoAssignment;
    };

    // Back from search order to slot order.
    let restore = |assignment: &[Choice<'a>]| {
        let mut records = vec![None; slots.len()];
        for (position, choice) in assignment.iter().enumerate() {
            records[order[position]] = Some(choice.ward);
        }
        records.into_iter().flatten().collect::<Vec<_>>()
    };

    if assignments.len() == 1 {
        let assignment = assignments.remove(0);
        SearchOutcome::Found(restore(&assignment))
    } else {
        SearchOutcome::Tied(assignments.iter().map(|assignment| restore(assignment)).collect())
    }
}

fn explore<'a>(
    slots: &[&[Choice<'a>]],
    fixed: &[&'a WardRecord],
    excluded: &BTreeSet<&str>,
    partial: &[Choice<'a>],
    accumulator: &mut Accumulator<'a>,
) -> Result<(), LimitReached> {
    accumulator.explored += 1;
    if accumulator.explored > accumulator.limit {
        return Err(LimitReached);
    }

    let provinces = distinct_provinces(fixed, partial);
    if let Some(((best_provinces, _, _), _)) = &accumulator.best {
        if provinces > *best_provinces {
            return Ok(());
        }
    }

    let Some((slot, rest)) = slots.split_first() else {
        record(fixed, partial, accumulator);
        return Ok(());
    };

    for choice in slot.iter() {
        let code = choice.ward.code.as_str();
        if excluded.contains(code) || partial.iter().any(|taken| taken.ward.code == code) {
            continue;
        }

        let mut next = partial.to_vec();
        next.push(*choice);
        explore(rest, fixed, excluded, &next, accumulator)?;
    }

    Ok(())
}

fn record<'a>(fixed: &[&'a WardRecord], assignment: &[Choice<'a>], accumulator: &mut Accumulator<'a>) {
    let score = score(fixed, assignment);

    match &mut accumulator.best {
        Some((best, _)) if score > *best => {}
        Some((best, assignments)) if score == *best => {
            let codes = record_set(assignment);
            if !assignments
                .iter()
                .any(|existing| record_set(existing) == codes)
            {
                assignments.push(assignment.to_vec());
            }
        }
        _ => accumulator.best = Some((score, vec![assignment.to_vec()])),
    }
}

fn score(fixed: &[&WardRecord], assignment: &[Choice<'_>]) -> Score {
    let hints = assignment.iter().filter(|choice| choice.hinted).count();
    let districts: BTreeSet<&str> = fixed
        .iter()
        .copied()
        .chain(assignment.iter().map(|choice| choice.ward))
        .filter_map(|ward| ward.district_code.as_deref())
        .collect();

    (
        distinct_provinces(fixed, assignment),
        Reverse(hints),
        districts.len(),
    )
}

fn distinct_provinces(fixed: &[&WardRecord], assignment: &[Choice<'_>]) -> usize {
    fixed
        .iter()
        .copied()
        .chain(assignment.iter().map(|choice| choice.ward))
        .map(|ward| ward.province_code.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

fn record_set<'s>(assignment: &'s [Choice<'_>]) -> BTreeSet<&'s str> {
    assignment
        .iter()
        .map(|choice| choice.ward.code.as_str())
        .collect()
}
