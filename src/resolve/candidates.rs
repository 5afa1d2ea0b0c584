use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{FilterFallback, ProvinceHint};
use crate::clause::{ParentRef, ParentScope, UnitReference};
use crate::dataset::{Dataset, IndexKey, WardRecord, qualified_key};
use crate::normalize::{exact_key, normalize_name, strip_admin_prefix, strip_tone_marks};

/// How far candidate collection has escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Widening {
    /// Exact spelling only.
    Strict,
    /// Every index key the reference can produce.
    Widened,
    /// Nothing left to try.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KindFilter {
    Honor,
    Ignore,
}

/// Wards of `dataset` that `reference` could name at the given stage.
pub(super) fn lookup<'d>(
    dataset: &'d Dataset,
    reference: &UnitReference,
    widening: Widening,
) -> Vec<&'d WardRecord> {
    match widening {
        Widening::Strict => dataset.lookup(IndexKey::Exact, &exact_key(&reference.name)),
        Widening::Widened => {
            let mut keys = vec![
                (IndexKey::Exact, exact_key(&reference.name)),
                (IndexKey::Name, reference.normalized.clone()),
                (
                    IndexKey::Name,
                    strip_admin_prefix(&reference.normalized).to_string(),
                ),
                (IndexKey::FullName, reference.normalized.clone()),
            ];
            if let Some(noun) = reference.kind.and_then(|kind| kind.noun()) {
                keys.push((
                    IndexKey::FullName,
                    normalize_name(&format!("{noun} {}", reference.name)),
                ));
            }
            if let Some(parent) = &reference.parent {
                keys.push((
                    IndexKey::Qualified,
                    qualified_key(&parent.normalized, &reference.normalized),
                ));
            }

            let mut seen = BTreeSet::new();
            keys.iter()
                .flat_map(|(kind, key)| dataset.lookup(*kind, key))
                .filter(|ward| seen.insert(ward.code.clone()))
                .collect()
        }
        Widening::Exhausted => Vec::new(),
    }
}

/// Escalates from the exact lookup to the widened one until `filter` leaves
/// something. The exact stage only settles a reference when it yields one
/// candidate, and never relaxes a filter.
pub(super) fn widen<'d>(
    dataset: &'d Dataset,
    reference: &UnitReference,
    fallback: FilterFallback,
    filter: impl Fn(Vec<&'d WardRecord>, FilterFallback) -> Vec<&'d WardRecord>,
) -> Vec<&'d WardRecord> {
    let mut widening = Widening::Strict;
    loop {
        widening = match widening {
            Widening::Strict => {
                let filtered = filter(
                    lookup(dataset, reference, Widening::Strict),
                    FilterFallback::Strict,
                );
                if filtered.len() == 1 {
                    return filtered;
                }
                Widening::Widened
            }
            Widening::Widened => {
                let filtered = filter(lookup(dataset, reference, Widening::Widened), fallback);
                if !filtered.is_empty() {
                    return filtered;
                }
                Widening::Exhausted
            }
            Widening::Exhausted => {
                debug!(
                    reference = %reference.raw,
                    edition = %dataset.edition(),
                    "no candidate after widening"
                );
                return Vec::new();
            }
        };
    }
}

/// Kind and parent filters, then spelling preferences.
pub(super) fn filter_by_reference<'d>(
    dataset: &Dataset,
    reference: &UnitReference,
    candidates: Vec<&'d WardRecord>,
    kind_filter: KindFilter,
    fallback: FilterFallback,
) -> Vec<&'d WardRecord> {
    let mut candidates = candidates;
    if let (KindFilter::Honor, Some(kind)) = (kind_filter, reference.kind) {
        candidates = hard_filter(candidates, reference, "kind", fallback, |ward| {
            ward.kind == kind
        });
    }
    if let Some(parent) = &reference.parent {
        candidates = hard_filter(candidates, reference, "parent", fallback, |ward| {
            parent_matches(dataset, ward, parent)
        });
    }

    let spelled = exact_key(&reference.name);
    let candidates = narrow(candidates, |ward| exact_key(&ward.name) == spelled);
    let toneless = strip_tone_marks(&reference.name);
    narrow(candidates, |ward| strip_tone_marks(&ward.name) == toneless)
}

fn hard_filter<'d>(
    candidates: Vec<&'d WardRecord>,
    reference: &UnitReference,
    filter: &'static str,
    fallback: FilterFallback,
    keep: impl Fn(&WardRecord) -> bool,
) -> Vec<&'d WardRecord> {
    let kept: Vec<&'d WardRecord> = candidates.iter().copied().filter(|ward| keep(ward)).collect();
    if !kept.is_empty() || candidates.is_empty() {
        return kept;
    }

    match fallback {
        FilterFallback::Strict => kept,
        FilterFallback::Relax => {
            warn!(
                reference = %reference.raw,
                filter,
                candidates = candidates.len(),
                "filter matched no candidate, keeping all of them"
            );
            candidates
        }
    }
}

/// Keeps the candidates satisfying `keep`, unless that would keep none or
/// there is nothing to choose between.
pub(super) fn narrow<'d>(
    candidates: Vec<&'d WardRecord>,
    keep: impl Fn(&WardRecord) -> bool,
) -> Vec<&'d WardRecord> {
    if candidates.len() < 2 {
        return candidates;
    }

    let narrowed: Vec<&'d WardRecord> = candidates.iter().copied().filter(|ward| keep(ward)).collect();
    if narrowed.is_empty() {
        candidates
    } else {
        narrowed
    }
}

/// Narrows by the provinces of `context`, then by its districts.
pub(super) fn narrow_by_context<'d>(
    candidates: Vec<&'d WardRecord>,
    context: &[&WardRecord],
) -> Vec<&'d WardRecord> {
    let provinces: BTreeSet<&str> = context
        .iter()
        .map(|ward| ward.province_code.as_str())
        .collect();
    let candidates = narrow(candidates, |ward| {
        provinces.contains(ward.province_code.as_str())
    });

    let districts: BTreeSet<&str> = context
        .iter()
        .filter_map(|ward| ward.district_code.as_deref())
        .collect();
    narrow(candidates, |ward| {
        ward.district_code
            .as_deref()
            .is_some_and(|district| districts.contains(district))
    })
}

/// Prefix-tolerant comparison against the ward's district and/or province.
/// A ward without a district passes a district-scoped check. A province named
/// alongside the parent must match too.
pub(super) fn parent_matches(dataset: &Dataset, ward: &WardRecord, parent: &ParentRef) -> bool {
    let wanted = strip_admin_prefix(&parent.normalized);
    let same = |name: &str, full_name: &str| {
        strip_admin_prefix(name) == wanted || strip_admin_prefix(full_name) == wanted
    };

    let district = dataset
        .ward_district(ward)
        .map(|district| same(&district.normalized_name, &district.normalized_full_name));
    let province = dataset
        .ward_province(ward)
        .is_some_and(|province| same(&province.normalized_name, &province.normalized_full_name));

    let scoped = match parent.scope {
        ParentScope::District => district.unwrap_or(true),
        ParentScope::Province => province,
        ParentScope::Either => district.unwrap_or(false) || province,
    };
    scoped
        && parent.province.as_deref().is_none_or(|expected| {
            dataset.ward_province(ward).is_some_and(|province| {
                strip_admin_prefix(&province.normalized_name) == strip_admin_prefix(expected)
            })
        })
}

pub(super) fn hint_matches(dataset: &Dataset, hint: Option<&ProvinceHint>, ward: &WardRecord) -> bool {
    hint.zip(dataset.ward_province(ward))
        .is_some_and(|(hint, province)| hint.matches(province))
}
