use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::{debug, warn};

use super::kind::AdministrativeUnitKind;
use super::sql_dump::{SqlDumpError, SqlRow};
use super::{Dataset, DatasetEdition, DistrictRecord, LookupIndex, ProvinceRecord, WardRecord};
use crate::normalize::normalize_name;

const UNITS_TABLE: &str = "administrative_units";
const PROVINCES_TABLE: &str = "provinces";
const DISTRICTS_TABLE: &str = "districts";
const WARDS_TABLE: &str = "wards";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Sql(#[from] SqlDumpError),

    #[error("{table} row {row}: missing required field `{field}`")]
    MissingField {
        table: String,
        row: usize,
        field: &'static str,
    },

    #[error("{table} row {row} ({code}): {field} `{reference}` does not match any loaded {target}")]
    MissingReference {
        table: String,
        row: usize,
        code: String,
        field: &'static str,
        reference: String,
        target: &'static str,
    },

    #[error("{table}: duplicate code `{code}`")]
    DuplicateCode { table: String, code: String },

    #[error("{edition} dataset has no `{table}` rows")]
    EmptyTable {
        edition: DatasetEdition,
        table: &'static str,
    },
}

impl Dataset {
    /// Builds one edition from dump rows. Any missing required field or
    /// dangling parent code aborts the load.
    pub fn load(edition: DatasetEdition, rows: &[SqlRow]) -> Result<Self, LoadError> {
        let mut by_table = HashMap::<&str, Vec<&SqlRow>>::new();
        for row in rows {
            by_table.entry(row.table.as_str()).or_default().push(row);
        }
        let table_rows = |table: &str| by_table.get(table).cloned().unwrap_or_default();

        let definitions = load_definitions(&table_rows(UNITS_TABLE))?;
        if definitions.is_empty() {
            warn!(
                edition = %edition,
                "no administrative unit definitions; every unit kind will be unknown"
            );
        }

        let provinces = load_provinces(&table_rows(PROVINCES_TABLE))?;
        if provinces.is_empty() {
            return Err(LoadError::EmptyTable {
                edition,
                table: PROVINCES_TABLE,
            });
        }

        let districts = match edition {
            DatasetEdition::Legacy => {
                let districts =
                    load_districts(&table_rows(DISTRICTS_TABLE), &provinces, &definitions)?;
                if districts.is_empty() {
                    return Err(LoadError::EmptyTable {
                        edition,
                        table: DISTRICTS_TABLE,
                    });
                }
                districts
            }
            DatasetEdition::Reform => {
                load_districts(&table_rows(DISTRICTS_TABLE), &provinces, &definitions)?
            }
        };

        let wards = load_wards(
            edition,
            &table_rows(WARDS_TABLE),
            &provinces,
            &districts,
            &definitions,
        )?;
        if wards.is_empty() {
            return Err(LoadError::EmptyTable {
                edition,
                table: WARDS_TABLE,
            });
        }

        let ward_slots = wards
            .iter()
            .enumerate()
            .map(|(slot, ward)| (ward.code.clone(), slot))
            .collect::<HashMap<String, usize>>();

        let mut dataset = Dataset {
            edition,
            provinces,
            districts,
            wards,
            ward_slots,
            index: LookupIndex::default(),
        };
        for slot in 0..dataset.wards.len() {
            dataset.index_ward(slot);
        }

        debug!(
            edition = %edition,
            provinces = dataset.provinces.len(),
            districts = dataset.districts.len(),
            wards = dataset.wards.len(),
            index_keys = dataset.index.key_count(),
            "dataset loaded"
        );

        Ok(dataset)
    }
}

fn required<'a>(row: &'a SqlRow, field: &'static str) -> Result<&'a str, LoadError> {
    row.get(field).ok_or_else(|| LoadError::MissingField {
        table: row.table.clone(),
        row: row.ordinal,
        field,
    })
}

fn load_definitions(
    rows: &[&SqlRow],
) -> Result<HashMap<String, AdministrativeUnitKind>, LoadError> {
    let mut definitions = HashMap::new();

    for row in rows {
        let id = required(row, "id")?;
        let full_name = required(row, "full_name")?;
        let short_name = row.get("short_name").unwrap_or(full_name);

        definitions.insert(
            id.to_string(),
            AdministrativeUnitKind::from_definition(short_name, full_name),
        );
    }

    Ok(definitions)
}

fn unit_kind(
    row: &SqlRow,
    definitions: &HashMap<String, AdministrativeUnitKind>,
) -> Result<AdministrativeUnitKind, LoadError> {
    let unit_id = required(row, "administrative_unit_id")?;
    Ok(definitions
        .get(unit_id)
        .copied()
        .unwrap_or(AdministrativeUnitKind::Unknown))
}

fn names(row: &SqlRow) -> Result<(String, String), LoadError> {
    let name = required(row, "name")?.to_string();
    let full_name = row.get("full_name").unwrap_or(&name).to_string();
    Ok((name, full_name))
}

fn insert_unique<T>(
    records: &mut BTreeMap<String, T>,
    table: &str,
    code: String,
    record: T,
) -> Result<(), LoadError> {
    if records.contains_key(&code) {
        return Err(LoadError::DuplicateCode {
            table: table.to_string(),
            code,
        });
    }
    records.insert(code, record);
    Ok(())
}

fn load_provinces(rows: &[&SqlRow]) -> Result<BTreeMap<String, ProvinceRecord>, LoadError> {
    let mut provinces = BTreeMap::new();

    for row in rows {
        let code = required(row, "code")?.to_string();
        let (name, full_name) = names(row)?;

        let record = ProvinceRecord {
            code: code.clone(),
            normalized_name: normalize_name(&name),
            normalized_full_name: normalize_name(&full_name),
            name,
            full_name,
        };
        insert_unique(&mut provinces, PROVINCES_TABLE, code, record)?;
    }

    Ok(provinces)
}

fn load_districts(
    rows: &[&SqlRow],
    provinces: &BTreeMap<String, ProvinceRecord>,
    definitions: &HashMap<String, AdministrativeUnitKind>,
) -> Result<BTreeMap<String, DistrictRecord>, LoadError> {
    let mut districts = BTreeMap::new();

    for row in rows {
        let code = required(row, "code")?.to_string();
        let (name, full_name) = names(row)?;
        let province_code = required(row, "province_code")?.to_string();
        if !provinces.contains_key(&province_code) {
            return Err(LoadError::MissingReference {
                table: row.table.clone(),
                row: row.ordinal,
                code,
                field: "province_code",
                reference: province_code,
                target: "province",
            });
        }

        let record = DistrictRecord {
            code: code.clone(),
            normalized_name: normalize_name(&name),
            normalized_full_name: normalize_name(&full_name),
            name,
            full_name,
            province_code,
            kind: unit_kind(row, definitions)?,
        };
        insert_unique(&mut districts, DISTRICTS_TABLE, code, record)?;
    }

    Ok(districts)
}

fn load_wards(
    edition: DatasetEdition,
    rows: &[&SqlRow],
    provinces: &BTreeMap<String, ProvinceRecord>,
    districts: &BTreeMap<String, DistrictRecord>,
    definitions: &HashMap<String, AdministrativeUnitKind>,
) -> Result<Vec<WardRecord>, LoadError> {
    let mut wards = BTreeMap::new();

    for row in rows {
        let code = required(row, "code")?.to_string();
        let (name, full_name) = names(row)?;
        let missing_reference =
            |field: &'static str, reference: &str, target: &'static str| {
                LoadError::MissingReference {
                    table: row.table.clone(),
                    row: row.ordinal,
                    code: code.clone(),
                    field,
                    reference: reference.to_string(),
                    target,
                }
            };

        let (district_code, province_code) = match edition {
            DatasetEdition::Legacy => {
                let district_code = required(row, "district_code")?;
                let district = districts
                    .get(district_code)
                    .ok_or_else(|| missing_reference("district_code", district_code, "district"))?;
                (Some(district.code.clone()), district.province_code.clone())
            }
            DatasetEdition::Reform => {
                let province_code = required(row, "province_code")?;
                if !provinces.contains_key(province_code) {
                    return Err(missing_reference("province_code", province_code, "province"));
                }
                let district_code = row
                    .get("district_code")
                    .filter(|code| districts.contains_key(*code))
                    .map(ToOwned::to_owned);
                (district_code, province_code.to_string())
            }
        };

        let record = WardRecord {
            code: code.clone(),
            normalized_name: normalize_name(&name),
            normalized_full_name: normalize_name(&full_name),
            name,
            full_name,
            district_code,
            province_code,
            kind: unit_kind(row, definitions)?,
        };
        insert_unique(&mut wards, WARDS_TABLE, code, record)?;
    }

    Ok(wards.into_values().collect())
}
