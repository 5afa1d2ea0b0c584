use super::segment::split_top_level;
use super::*;

fn parser() -> ClauseParser {
    ClauseParser::new().expect("parser regexes compile")
}

fn single_clause(text: &str) -> ResolutionClause {
    let clauses = parser()
        .parse_document(&prepare_document_text(text), "test-doc")
        .expect("document parses");
    assert_eq!(clauses.len(), 1, "expected one clause in {text:?}");
    clauses.into_iter().next().expect("one clause")
}

fn names(clause: &ResolutionClause) -> Vec<&str> {
    clause
        .sources
        .iter()
        .map(|source| source.name.as_str())
        .collect()
}

#[test]
fn type_noun_carries_to_untyped_sources() {
    let clause = single_clause("Sáp nhập xã Phú Thành, Hương Cần và Tân Lập thành xã Tân Phú.");

    assert_eq!(names(&clause), ["Phú Thành", "Hương Cần", "Tân Lập"]);
    assert!(
        clause
            .sources
            .iter()
            .all(|source| source.kind == Some(AdministrativeUnitKind::Commune))
    );
    assert_eq!(clause.target.name, "Tân Phú");
    assert_eq!(clause.target.normalized, "tan phu");
    assert_eq!(clause.target.kind, Some(AdministrativeUnitKind::Commune));
    assert_eq!(clause.document_ref, "test-doc");
}

#[test]
fn explicit_type_switches_the_current_type() {
    let clause =
        single_clause("Nhập phường Gia Cẩm, xã Tân Lập, Văn Khúc thành phường Việt Trì.");

    let kinds: Vec<_> = clause.sources.iter().map(|source| source.kind).collect();
    assert_eq!(
        kinds,
        [
            Some(AdministrativeUnitKind::Ward),
            Some(AdministrativeUnitKind::Commune),
            Some(AdministrativeUnitKind::Commune),
        ]
    );
    assert_eq!(clause.target.kind, Some(AdministrativeUnitKind::Ward));
}

#[test]
fn parenthetical_parent_propagates_forward() {
    let clause = single_clause("Sáp nhập xã Phú Thành (thuộc huyện Tân Sơn), Tân Minh thành xã Tân Sơn.");

    assert_eq!(names(&clause), ["Phú Thành", "Tân Minh"]);
    let first = clause.sources[0].parent.as_ref().expect("stated parent");
    assert_eq!(first.normalized, "tan son");
    assert_eq!(first.scope, ParentScope::District);
    assert!(first.is_locked());

    let second = clause.sources[1].parent.as_ref().expect("inherited parent");
    assert_eq!(second.normalized, "tan son");
    assert_eq!(second.origin, ParentOrigin::Inherited);
}

#[test]
fn locked_parent_propagates_backward_within_the_same_type() {
    let clause = single_clause(
        "Nhập phường Gia Cẩm, xã Hương Cần, Tân Lập (huyện Thanh Sơn) thành xã Thanh Sơn.",
    );

    assert!(clause.sources[0].parent.is_none());
    let inherited = clause.sources[1].parent.as_ref().expect("parent from the right");
    assert_eq!(inherited.normalized, "thanh son");
    assert_eq!(inherited.origin, ParentOrigin::Inherited);
}

#[test]
fn locked_parent_overrides_a_forward_inherited_one() {
    let clause = single_clause(
        "Nhập xã Phú Thành thuộc huyện Thanh Sơn, Hương Cần, Tân Minh (huyện Tân Sơn) thành xã Tân Minh.",
    );

    let first = clause.sources[0].parent.as_ref().expect("overridden parent");
    assert_eq!(first.normalized, "tan son");
    assert_eq!(first.origin, ParentOrigin::Inherited);
    let middle = clause.sources[1].parent.as_ref().expect("middle parent");
    assert_eq!(middle.normalized, "tan son");
    let last = clause.sources[2].parent.as_ref().expect("stated parent");
    assert!(last.is_locked());
}

#[test]
fn thuoc_suffix_yields_an_unlocked_parent() {
    let clause = single_clause("Sáp nhập xã Phú Lộc thuộc huyện Cẩm Khê thành xã Cẩm Khê.");

    let parent = clause.sources[0].parent.as_ref().expect("suffix parent");
    assert_eq!(clause.sources[0].name, "Phú Lộc");
    assert_eq!(parent.normalized, "cam khe");
    assert_eq!(parent.origin, ParentOrigin::Suffix);
    assert!(!parent.is_locked());
}

#[test]
fn thuoc_suffix_parent_fills_preceding_sources() {
    let clause = single_clause(
        "Sáp nhập xã Phú Thành, xã Tân Minh thuộc huyện Tân Sơn thành xã Phú Thành.",
    );

    assert_eq!(names(&clause), ["Phú Thành", "Tân Minh"]);
    let first = clause.sources[0].parent.as_ref().expect("parent from the right");
    assert_eq!(first.normalized, "tan son");
    assert_eq!(first.origin, ParentOrigin::Inherited);
    let second = clause.sources[1].parent.as_ref().expect("suffix parent");
    assert_eq!(second.origin, ParentOrigin::Suffix);
}

#[test]
fn thuoc_suffix_parent_does_not_replace_a_stated_one() {
    let clause = single_clause(
        "Sáp nhập xã Phú Thành thuộc huyện Thanh Sơn, xã Tân Minh thuộc huyện Tân Sơn \
         thành xã Phú Thành.",
    );

    let parents: Vec<_> = clause
        .sources
        .iter()
        .map(|source| source.parent.as_ref().map(|parent| parent.normalized.as_str()))
        .collect();
    assert_eq!(parents, [Some("thanh son"), Some("tan son")]);
}

#[test]
fn district_and_province_parent_keeps_the_district_name() {
    let clause = single_clause(
        "Sáp nhập xã Phú Thành (thuộc huyện Tân Sơn, tỉnh Phú Thọ) và xã Tân Minh thành xã Phú Thành.",
    );

    assert_eq!(names(&clause), ["Phú Thành", "Tân Minh"]);
    let parent = clause.sources[0].parent.as_ref().expect("stated parent");
    assert_eq!(parent.name, "Tân Sơn");
    assert_eq!(parent.normalized, "tan son");
    assert_eq!(parent.scope, ParentScope::District);
    assert_eq!(parent.province.as_deref(), Some("phu tho"));
    assert!(parent.is_locked());

    let inherited = clause.sources[1].parent.as_ref().expect("inherited parent");
    assert_eq!(inherited.normalized, "tan son");
    assert_eq!(inherited.province.as_deref(), Some("phu tho"));
}

#[test]
fn province_after_a_thuoc_suffix_is_not_a_source() {
    let clause = single_clause(
        "Sáp nhập xã Phú Thành, xã Tân Minh thuộc huyện Tân Sơn, tỉnh Phú Thọ thành xã Phú Thành.",
    );

    assert_eq!(names(&clause), ["Phú Thành", "Tân Minh"]);
    let parent = clause.sources[1].parent.as_ref().expect("suffix parent");
    assert_eq!(parent.normalized, "tan son");
    assert_eq!(parent.province.as_deref(), Some("phu tho"));
}

#[test]
fn province_parent_has_province_scope() {
    let clause = single_clause("Sáp nhập xã Tân Lập (tỉnh Vĩnh Phúc) thành xã Lập Thạch.");

    let parent = clause.sources[0].parent.as_ref().expect("province parent");
    assert_eq!(parent.scope, ParentScope::Province);
    assert_eq!(parent.normalized, "vinh phuc");
}

#[test]
fn non_parent_parenthetical_is_dropped_from_the_name() {
    let clause = single_clause("Sáp nhập xã Tân Lập (cũ) thành xã Lập Thạch.");

    assert_eq!(clause.sources[0].name, "Tân Lập");
    assert!(clause.sources[0].parent.is_none());
}

#[test]
fn contextual_lead_ins_and_rename_phrases_are_stripped() {
    let clause = single_clause(
        "Sắp xếp toàn bộ diện tích tự nhiên, quy mô dân số của các xã Phú Thành và Hương Cần \
         thành xã mới có tên gọi là xã Thanh Phú.",
    );

    assert_eq!(names(&clause), ["Phú Thành", "Hương Cần"]);
    assert!(clause.sources.iter().all(|source| !source.partial));
    assert_eq!(clause.target.name, "Thanh Phú");
    assert_eq!(clause.target.kind, Some(AdministrativeUnitKind::Commune));
}

#[test]
fn partial_transfers_are_flagged() {
    let clause = single_clause(
        "Điều chỉnh một phần diện tích tự nhiên của xã Tân Minh, toàn bộ xã Hương Cần thành xã Hương Cần.",
    );

    assert_eq!(names(&clause), ["Tân Minh", "Hương Cần"]);
    assert!(clause.sources[0].partial);
    assert!(!clause.sources[1].partial);
}

#[test]
fn cross_references_are_discarded() {
    let clause = single_clause(
        "Trên cơ sở khoản 2 Điều này, sáp nhập xã Tân Minh và xã Hương Cần thành xã Tân Hương.",
    );

    assert_eq!(names(&clause), ["Tân Minh", "Hương Cần"]);
}

#[test]
fn trailing_conditions_are_cut_from_names() {
    let clause = single_clause(
        "Sáp nhập xã Phú Thành, xã Hương Cần quy định tại khoản 2 Điều 1 thành xã Phú Hương.",
    );

    assert_eq!(names(&clause), ["Phú Thành", "Hương Cần"]);
}

#[test]
fn list_markers_and_destination_tails_are_removed() {
    let text = "Điều 1. Sắp xếp các đơn vị hành chính cấp xã\r\n\
                a) Sáp nhập xã Tân Minh và xã Phú Thành thành xã Tân Phú; trụ sở đặt tại xã Tân Minh\r\n\
                b) Nhập xã Tân Lập và xã Hợp Lý thành xã Lập Thạch: diện tích 42,5 km2.";
    let clauses = parser()
        .parse_document(&prepare_document_text(text), "nq-1")
        .expect("document parses");

    assert_eq!(clauses.len(), 2);
    assert_eq!(names(&clauses[0]), ["Tân Minh", "Phú Thành"]);
    assert_eq!(clauses[0].target.name, "Tân Phú");
    assert_eq!(names(&clauses[1]), ["Tân Lập", "Hợp Lý"]);
    assert_eq!(clauses[1].target.name, "Lập Thạch");
}

#[test]
fn fragments_without_a_merger_grammar_are_discarded() {
    let text = "Các cơ quan có liên quan hoàn thành việc sắp xếp. \
                Toàn bộ diện tích tự nhiên thành xã Tân Phú. \
                Sáp nhập xã Tân Minh và xã Phú Thành thành xã Tân Phú.";
    let clauses = parser()
        .parse_document(&prepare_document_text(text), "nq-2")
        .expect("document parses");

    assert_eq!(clauses.len(), 1);
    assert_eq!(names(&clauses[0]), ["Tân Minh", "Phú Thành"]);
}

#[test]
fn empty_destination_is_a_parse_error() {
    let error = parser()
        .parse_document("Sáp nhập xã Phú Thành thành xã.", "nq-3")
        .expect_err("destination name is required");

    match error {
        ParseError::EmptyTarget { document_ref, clause } => {
            assert_eq!(document_ref, "nq-3");
            assert!(clause.contains("Phú Thành"));
        }
    }
}

#[test]
fn cleanup_name_strips_lead_ins_qualifiers_and_conditions() {
    let parser = parser();

    assert_eq!(parser.cleanup_name("có tên gọi là Thanh Phú"), "Thanh Phú");
    assert_eq!(parser.cleanup_name("được đổi tên thành Tân Sơn"), "Tân Sơn");
    assert_eq!(parser.cleanup_name("Tân Lập cũ"), "Tân Lập");
    assert_eq!(parser.cleanup_name("“Thanh Phú” hiện nay"), "Thanh Phú");
    assert_eq!(parser.cleanup_name("Phú Thành sau khi sáp nhập"), "Phú Thành");
    assert_eq!(parser.cleanup_name("mới Phú Thành"), "Phú Thành");
}

#[test]
fn split_respects_parentheses() {
    assert_eq!(
        split_top_level("xã A (thuộc huyện X, tỉnh Y), xã B; xã C"),
        ["xã A (thuộc huyện X, tỉnh Y)", "xã B", "xã C"]
    );
    assert_eq!(split_top_level("xã A (huyện X, xã B"), ["xã A (huyện X, xã B"]);
    assert!(split_top_level(" , ;").is_empty());
}

#[test]
fn document_text_is_prepared_to_nfc_with_unix_line_endings() {
    let decomposed = "Xa\u{0303}\r\nPhu\u{0301}\rX";
    assert_eq!(prepare_document_text(decomposed), "Xã\nPhú\nX");
}
