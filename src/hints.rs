use anyhow::{Result, bail};
use tracing::debug;

use crate::dataset::{Dataset, ProvinceRecord};
use crate::normalize::{normalize_name, strip_admin_prefix};
use crate::resolve::ProvinceHint;

/// Province whose name appears, as whole words, in a document's file stem
/// ("nq_1234_phu_tho" names Phú Thọ). The longest name wins; equally long
/// different matches give no hint.
pub fn hint_from_stem(dataset: &Dataset, stem: &str) -> Option<ProvinceHint> {
    let haystack = format!(" {} ", normalize_name(&stem.replace('_', " ")));

    let mut matches: Vec<(usize, &ProvinceRecord)> = dataset
        .provinces()
        .filter_map(|province| {
            let name = strip_admin_prefix(&province.normalized_name);
            (!name.is_empty() && haystack.contains(&format!(" {name} ")))
                .then_some((name.len(), province))
        })
        .collect();
    matches.sort_by(|left, right| right.0.cmp(&left.0));

    match matches.as_slice() {
        [] => None,
        [(_, province)] => Some(province_hint(province)),
        [(longest, province), (next, _), ..] if longest > next => Some(province_hint(province)),
        _ => {
            debug!(
                stem,
                edition = %dataset.edition(),
                "file stem names several provinces, no hint taken"
            );
            None
        }
    }
}

/// Province named on the command line, by code or by name.
pub fn hint_from_arg(dataset: &Dataset, value: &str) -> Result<ProvinceHint> {
    let value = value.trim();
    if let Some(province) = dataset.province(value) {
        return Ok(province_hint(province));
    }

    let wanted = normalize_name(value);
    let wanted = strip_admin_prefix(&wanted);
    match dataset
        .provinces()
        .find(|province| strip_admin_prefix(&province.normalized_name) == wanted)
    {
        Some(province) => Ok(province_hint(province)),
        None => bail!("no {} province matches {value:?}", dataset.edition()),
    }
}

fn province_hint(province: &ProvinceRecord) -> ProvinceHint {
    ProvinceHint {
        code: Some(province.code.clone()),
        normalized_name: Some(province.normalized_name.clone()),
    }
}
