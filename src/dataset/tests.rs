use super::load::LoadError;
use super::*;
use crate::fixtures;
use crate::normalize::exact_key;

#[test]
fn legacy_load_links_wards_to_district_and_province() {
    let legacy = fixtures::legacy();

    let ward = legacy.ward("07101").expect("ward exists");
    assert_eq!(ward.kind, AdministrativeUnitKind::Commune);
    assert_eq!(ward.district_code.as_deref(), Some("228"));
    assert_eq!(ward.province_code, "25");
    assert_eq!(
        legacy.ward_district(ward).map(|district| district.name.as_str()),
        Some("Tân Sơn")
    );
    assert_eq!(
        legacy.district("230").map(|district| district.kind),
        Some(AdministrativeUnitKind::ProvincialCity)
    );
}

#[test]
fn reform_wards_have_no_district() {
    let reform = fixtures::reform();
    let ward = reform.ward("40001").expect("ward exists");
    assert!(ward.district_code.is_none());
    assert_eq!(ward.province_code, "40");
    assert_eq!(reform.district_count(), 0);
}

#[test]
fn lookup_index_serves_every_key_kind() {
    let legacy = fixtures::legacy();

    assert_eq!(legacy.lookup(IndexKey::Name, "phu thanh").len(), 2);
    assert_eq!(legacy.lookup(IndexKey::FullName, "xa phu thanh").len(), 2);
    assert_eq!(legacy.lookup(IndexKey::Exact, &exact_key("Phú Lộc")).len(), 1);
    assert_eq!(legacy.lookup(IndexKey::Name, "phu loc").len(), 2);
    assert_eq!(legacy.lookup(IndexKey::Name, "12").len(), 1);

    let qualified = legacy.lookup(IndexKey::Qualified, &qualified_key("tan son", "phu thanh"));
    assert_eq!(qualified.len(), 1);
    assert_eq!(qualified[0].code, "07101");

    let by_province = legacy.lookup(IndexKey::Qualified, &qualified_key("tinh phu tho", "tan lap"));
    assert_eq!(by_province.len(), 3);
}

#[test]
fn unknown_unit_id_maps_to_unknown_kind() {
    let sql = "
        INSERT INTO provinces (code, name) VALUES ('01', 'Hà Nội');
        INSERT INTO wards (code, name, province_code, administrative_unit_id) VALUES ('1', 'A', '01', 99);
    ";
    let rows = extract_rows(sql).expect("dump parses");
    let dataset = Dataset::load(DatasetEdition::Reform, &rows).expect("dataset loads");
    assert_eq!(
        dataset.ward("1").map(|ward| ward.kind),
        Some(AdministrativeUnitKind::Unknown)
    );
}

#[test]
fn missing_required_field_is_fatal() {
    let sql = "
        INSERT INTO provinces (code, name) VALUES ('01', 'Hà Nội');
        INSERT INTO wards (code, name, province_code, administrative_unit_id) VALUES ('1', NULL, '01', 4);
    ";
    let rows = extract_rows(sql).expect("dump parses");
    let error = Dataset::load(DatasetEdition::Reform, &rows).expect_err("name is required");
    assert!(matches!(
        error,
        LoadError::MissingField { field: "name", row: 1, .. }
    ));
}

#[test]
fn dangling_district_reference_is_fatal() {
    let sql = "
        INSERT INTO provinces (code, name) VALUES ('01', 'Hà Nội');
        INSERT INTO districts (code, name, province_code, administrative_unit_id) VALUES ('001', 'Ba Đình', '01', 5);
        INSERT INTO wards (code, name, district_code, administrative_unit_id) VALUES ('1', 'Phúc Xá', '999', 8);
    ";
    let rows = extract_rows(sql).expect("dump parses");
    let error = Dataset::load(DatasetEdition::Legacy, &rows).expect_err("district must exist");
    match error {
        LoadError::MissingReference {
            field, reference, ..
        } => {
            assert_eq!(field, "district_code");
            assert_eq!(reference, "999");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_ward_codes_are_rejected() {
    let sql = "
        INSERT INTO provinces (code, name) VALUES ('01', 'Hà Nội');
        INSERT INTO wards (code, name, province_code, administrative_unit_id) VALUES ('1', 'A', '01', 4), ('1', 'B', '01', 4);
    ";
    let rows = extract_rows(sql).expect("dump parses");
    let error = Dataset::load(DatasetEdition::Reform, &rows).expect_err("codes are unique");
    assert!(matches!(error, LoadError::DuplicateCode { .. }));
}
