mod index;
mod kind;
mod load;
mod sql_dump;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

pub use index::{IndexKey, LookupIndex, qualified_key};
pub use kind::AdministrativeUnitKind;
pub use sql_dump::extract_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetEdition {
    /// Before the reform: province, district, ward.
    Legacy,
    /// After the reform: province, ward; districts mostly dissolved.
    Reform,
}

impl DatasetEdition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Reform => "reform",
        }
    }
}

impl std::fmt::Display for DatasetEdition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvinceRecord {
    pub code: String,
    pub name: String,
    pub full_name: String,
    pub normalized_name: String,
    pub normalized_full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistrictRecord {
    pub code: String,
    pub name: String,
    pub full_name: String,
    pub normalized_name: String,
    pub normalized_full_name: String,
    pub province_code: String,
    pub kind: AdministrativeUnitKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct WardRecord {
    pub code: String,
    pub name: String,
    pub full_name: String,
    pub normalized_name: String,
    pub normalized_full_name: String,
    /// `None` when the ward hangs directly off its province.
    pub district_code: Option<String>,
    pub province_code: String,
    pub kind: AdministrativeUnitKind,
}

/// One loaded edition with its lookup index. Read-only once built.
#[derive(Debug)]
pub struct Dataset {
    edition: DatasetEdition,
    provinces: BTreeMap<String, ProvinceRecord>,
    districts: BTreeMap<String, DistrictRecord>,
    wards: Vec<WardRecord>,
    ward_slots: HashMap<String, usize>,
    index: LookupIndex,
}

impl Dataset {
    pub fn edition(&self) -> DatasetEdition {
        self.edition
    }

    pub fn provinces(&self) -> impl Iterator<Item = &ProvinceRecord> {
        self.provinces.values()
    }

    pub fn wards(&self) -> &[WardRecord] {
        &self.wards
    }

    pub fn district_count(&self) -> usize {
        self.districts.len()
    }

    pub fn province(&self, code: &str) -> Option<&ProvinceRecord> {
        self.provinces.get(code)
    }

    pub fn district(&self, code: &str) -> Option<&DistrictRecord> {
        self.districts.get(code)
    }

    pub fn ward(&self, code: &str) -> Option<&WardRecord> {
        self.ward_slots.get(code).map(|slot| &self.wards[*slot])
    }

    pub fn ward_district(&self, ward: &WardRecord) -> Option<&DistrictRecord> {
        ward.district_code
            .as_deref()
            .and_then(|code| self.district(code))
    }

    pub fn ward_province(&self, ward: &WardRecord) -> Option<&ProvinceRecord> {
        self.province(&ward.province_code)
    }

    /// Wards stored under `key`, in insertion order.
    pub fn lookup(&self, kind: IndexKey, key: &str) -> Vec<&WardRecord> {
        self.index
            .get(kind, key)
            .iter()
            .filter_map(|code| self.ward(code))
            .collect()
    }

    fn index_ward(&mut self, slot: usize) {
        let ward = &self.wards[slot];
        let mut entries = vec![
            (IndexKey::Exact, crate::normalize::exact_key(&ward.name)),
            (IndexKey::Name, ward.normalized_name.clone()),
            (
                IndexKey::Name,
                crate::normalize::strip_admin_prefix(&ward.normalized_name).to_string(),
            ),
            (IndexKey::FullName, ward.normalized_full_name.clone()),
        ];

        if let Some(district) = self.ward_district(ward) {
            entries.push((
                IndexKey::Qualified,
                qualified_key(&district.normalized_name, &ward.normalized_name),
            ));
        }
        if let Some(province) = self.ward_province(ward) {
            entries.push((
                IndexKey::Qualified,
                qualified_key(&province.normalized_name, &ward.normalized_name),
            ));
        }

        let code = ward.code.clone();
        for (kind, key) in entries {
            self.index.insert(kind, &key, &code);
        }
    }
}
