use serde::Serialize;

use crate::normalize::normalize_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdministrativeUnitKind {
    Commune,
    Township,
    Ward,
    RuralDistrict,
    DistrictTown,
    ProvincialCity,
    UrbanDistrict,
    Unknown,
}

const SHORT_NAME_KINDS: [(&str, AdministrativeUnitKind); 7] = [
    ("xa", AdministrativeUnitKind::Commune),
    ("thi tran", AdministrativeUnitKind::Township),
    ("phuong", AdministrativeUnitKind::Ward),
    ("huyen", AdministrativeUnitKind::RuralDistrict),
    ("thi xa", AdministrativeUnitKind::DistrictTown),
    ("thanh pho", AdministrativeUnitKind::ProvincialCity),
    ("quan", AdministrativeUnitKind::UrbanDistrict),
];

impl AdministrativeUnitKind {
    /// Maps an administrative-unit definition onto a kind.
    ///
    /// The short name is looked up first, then the full name; anything that
    /// merely mentions "thành phố" is taken as a provincial city. This is lossy
    /// (a centrally-run city and a city under a province collapse together).
    pub fn from_definition(short_name: &str, full_name: &str) -> Self {
        for candidate in [short_name, full_name] {
            let normalized = normalize_name(candidate);
            if let Some((_, kind)) = SHORT_NAME_KINDS
                .iter()
                .find(|(name, _)| *name == normalized)
            {
                return *kind;
            }
        }

        if [short_name, full_name]
            .iter()
            .any(|name| normalize_name(name).contains("thanh pho"))
        {
            return Self::ProvincialCity;
        }

        Self::Unknown
    }

    /// Vietnamese type noun as written in legal prose.
    pub fn noun(self) -> Option<&'static str> {
        match self {
            Self::Commune => Some("xã"),
            Self::Township => Some("thị trấn"),
            Self::Ward => Some("phường"),
            Self::RuralDistrict => Some("huyện"),
            Self::DistrictTown => Some("thị xã"),
            Self::ProvincialCity => Some("thành phố"),
            Self::UrbanDistrict => Some("quận"),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commune => "commune",
            Self::Township => "township",
            Self::Ward => "ward",
            Self::RuralDistrict => "rural_district",
            Self::DistrictTown => "district_town",
            Self::ProvincialCity => "provincial_city",
            Self::UrbanDistrict => "urban_district",
            Self::Unknown => "unknown",
        }
    }
}
