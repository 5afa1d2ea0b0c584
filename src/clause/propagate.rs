use super::{ParentOrigin, ParentRef, UnitReference};
use crate::dataset::AdministrativeUnitKind;

/// Fills and corrects source parents from their neighbours.
///
/// Forward: a stated parent carries to following sources of the same type
/// that state none. Backward: a stated parent also fills the preceding
/// same-type sources that still have none; a parenthetical one overrides
/// anything not stated in a parenthetical of their own. A change of type ends
/// the run either way.
pub(super) fn propagate_parents(sources: &[UnitReference]) -> Vec<UnitReference> {
    let forward = propagate_forward(sources);
    propagate_backward(&forward)
}

fn propagate_forward(sources: &[UnitReference]) -> Vec<UnitReference> {
    let mut context: Option<(Option<AdministrativeUnitKind>, ParentRef)> = None;

    sources
        .iter()
        .map(|source| {
            let mut source = source.clone();
            if let Some((kind, _)) = &context {
                if !same_group(*kind, source.kind) {
                    context = None;
                }
            }

            match (&source.parent, &context) {
                (Some(parent), _) => context = Some((source.kind, parent.clone())),
                (None, Some((_, parent))) => source.parent = Some(inherited(parent)),
                (None, None) => {}
            }
            source
        })
        .collect()
}

fn propagate_backward(sources: &[UnitReference]) -> Vec<UnitReference> {
    let mut context: Option<(Option<AdministrativeUnitKind>, ParentRef)> = None;

    let mut output: Vec<UnitReference> = sources
        .iter()
        .rev()
        .map(|source| {
            let mut source = source.clone();
            if let Some((kind, _)) = &context {
                if !same_group(*kind, source.kind) {
                    context = None;
                }
            }

            let carried_lock = context.as_ref().is_some_and(|(_, parent)| parent.is_locked());
            match (&source.parent, &context) {
                (Some(parent), _) if parent.is_locked() => {
                    context = Some((source.kind, parent.clone()));
                }
                (Some(_), Some((_, parent))) if carried_lock => {
                    source.parent = Some(inherited(parent));
                }
                (Some(parent), _) if parent.origin == ParentOrigin::Suffix => {
                    context = Some((source.kind, parent.clone()));
                }
                (Some(_), _) => {}
                (None, Some((_, parent))) => source.parent = Some(inherited(parent)),
                (None, None) => {}
            }
            source
        })
        .collect();

    output.reverse();
    output
}

/// Sources without a type belong to whatever group surrounds them.
fn same_group(
    left: Option<AdministrativeUnitKind>,
    right: Option<AdministrativeUnitKind>,
) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => left == right,
        _ => true,
    }
}

fn inherited(parent: &ParentRef) -> ParentRef {
    ParentRef {
        origin: ParentOrigin::Inherited,
        ..parent.clone()
    }
}
