use super::segment::split_top_level;
use super::{ClauseParser, ParentOrigin, ParentRef, ParentScope, UnitReference};
use crate::dataset::AdministrativeUnitKind;
use crate::normalize::{condense_whitespace, normalize_name};

const RENAME_LEAD_INS: [&str; 7] = [
    "được đổi tên thành",
    "đổi tên thành",
    "có tên gọi là",
    "có tên là",
    "tên gọi là",
    "lấy tên là",
    "gọi là",
];

const TRAILING_QUALIFIERS: [&str; 4] = ["cũ", "hiện nay", "hiện tại", "trước đây"];

#[derive(Debug)]
pub(super) enum TokenOutcome {
    Unit(UnitReference),
    /// A bare type noun; only moves the current type forward.
    TypeOnly(Option<AdministrativeUnitKind>),
    /// "tỉnh Y" split off a "thuộc huyện X, tỉnh Y" suffix; normalized name.
    Province(String),
    Discard,
}

impl ClauseParser {
    /// Parses one list token. `current_kind` is the type carried from the
    /// previous tokens of the same clause.
    pub(super) fn parse_token(
        &self,
        raw: &str,
        current_kind: Option<AdministrativeUnitKind>,
    ) -> TokenOutcome {
        let partial = self.partial_marker.is_match(raw);
        let text = self.strip_context_prefixes(&condense_whitespace(raw));
        if text.is_empty() || self.cross_reference.is_match(&text) {
            return TokenOutcome::Discard;
        }
        if self.bare_type.is_match(&text) {
            return TokenOutcome::TypeOnly(self.noun_kind(&text));
        }
        if let Some(province) = self.province_segment(&text) {
            return TokenOutcome::Province(province);
        }

        let text = self.trailing_condition.replace(&text, "").trim().to_string();
        let (text, parent) = self.extract_parent(&text);
        let text = self.strip_context_prefixes(&text);

        let (explicit_kind, text) = self.split_type_prefix(&text);
        let name = self.cleanup_name(&text);
        // A rename lead-in can expose a second type noun: "mới có tên gọi là xã D".
        let (renamed_kind, name) = self.split_type_prefix(&name);

        if name.is_empty() {
            return match explicit_kind.or(renamed_kind) {
                Some(kind) => TokenOutcome::TypeOnly(kind),
                None => TokenOutcome::Discard,
            };
        }
        if self.bare_type.is_match(&name)
            || self.cross_reference.is_match(&name)
            || self.measurement.is_match(&name)
        {
            return TokenOutcome::Discard;
        }

        let normalized = normalize_name(&name);
        if normalized.is_empty() {
            return TokenOutcome::Discard;
        }

        let kind = match renamed_kind.or(explicit_kind) {
            Some(kind) => kind,
            None => current_kind,
        };

        TokenOutcome::Unit(UnitReference {
            raw: raw.trim().to_string(),
            name,
            normalized,
            kind,
            parent,
            partial,
        })
    }

    /// Strips rename lead-ins, trailing qualifiers, trailing conditions and
    /// leftover parentheticals from a unit name.
    pub fn cleanup_name(&self, input: &str) -> String {
        let mut text = condense_whitespace(input);

        for lead_in in RENAME_LEAD_INS {
            if let Some(position) = text.find(lead_in) {
                text = text[position + lead_in.len()..].trim().to_string();
                break;
            }
        }

        text = self.trailing_condition.replace(&text, "").to_string();
        text = strip_parentheticals(&text);

        loop {
            let trimmed = text
                .trim()
                .trim_matches(|ch: char| matches!(ch, ':' | '"' | '“' | '”' | '\'' | '-' | '–'))
                .trim();
            let stripped = TRAILING_QUALIFIERS
                .iter()
                .find_map(|qualifier| {
                    trimmed
                        .strip_suffix(qualifier)
                        .filter(|rest| rest.ends_with(' '))
                })
                .unwrap_or(trimmed)
                .trim()
                .to_string();
            let stripped = self.strip_context_prefixes(&stripped);
            if stripped == text {
                break;
            }
            text = stripped;
        }

        text
    }

    pub(super) fn noun_kind(&self, noun: &str) -> Option<AdministrativeUnitKind> {
        match noun.to_lowercase().as_str() {
            "xã" => Some(AdministrativeUnitKind::Commune),
            "thị trấn" => Some(AdministrativeUnitKind::Township),
            "phường" => Some(AdministrativeUnitKind::Ward),
            "huyện" => Some(AdministrativeUnitKind::RuralDistrict),
            "thị xã" => Some(AdministrativeUnitKind::DistrictTown),
            "thành phố" => Some(AdministrativeUnitKind::ProvincialCity),
            "quận" => Some(AdministrativeUnitKind::UrbanDistrict),
            "đặc khu" => Some(AdministrativeUnitKind::Unknown),
            _ => None,
        }
    }

    fn strip_context_prefixes(&self, input: &str) -> String {
        let mut text = input.trim().to_string();
        loop {
            let before = text.clone();
            for pattern in self.context_prefixes.iter().chain([&self.leading_verb]) {
                text = pattern.replace(&text, "").trim().to_string();
            }
            if text == before {
                return text;
            }
        }
    }

    fn split_type_prefix(&self, text: &str) -> (Option<Option<AdministrativeUnitKind>>, String) {
        match self.type_prefix.captures(text) {
            Some(captures) => {
                let noun = captures.name("noun").map(|m| m.as_str()).unwrap_or("");
                let rest = captures.name("rest").map(|m| m.as_str()).unwrap_or("");
                (Some(self.noun_kind(noun)), rest.trim().to_string())
            }
            None => (None, text.to_string()),
        }
    }

    /// Pulls a parent out of a trailing parenthetical (locked) or a
    /// "thuộc ..." suffix (unlocked).
    fn extract_parent(&self, text: &str) -> (String, Option<ParentRef>) {
        if let Some(captures) = self.trailing_parenthetical.captures(text) {
            let name = captures.name("name").map(|m| m.as_str()).unwrap_or("");
            let inner = captures.name("inner").map(|m| m.as_str()).unwrap_or("");
            let had_thuoc = self.thuoc_prefix.is_match(inner.trim());
            let inner = self.thuoc_prefix.replace(inner.trim(), "");

            // Asides such as "(cũ)" are not parents.
            if had_thuoc || self.type_prefix.is_match(&inner) {
                if let Some(parent) = self.parent_ref(&inner, ParentOrigin::Parenthetical) {
                    return (name.trim().to_string(), Some(parent));
                }
            }
        }

        if let Some(captures) = self.thuoc_suffix.captures(text) {
            let name = captures.name("name").map(|m| m.as_str()).unwrap_or("");
            let parent_text = captures.name("parent").map(|m| m.as_str()).unwrap_or("");
            if let Some(parent) = self.parent_ref(parent_text, ParentOrigin::Suffix) {
                return (name.trim().to_string(), Some(parent));
            }
        }

        (text.to_string(), None)
    }

    /// Parent named by `text`. Only the first top-level segment names the
    /// parent; a later "tỉnh Y" segment adds a province check.
    fn parent_ref(&self, text: &str, origin: ParentOrigin) -> Option<ParentRef> {
        let text = strip_parentheticals(&condense_whitespace(text));
        let text = self.trailing_condition.replace(&text, "");
        let mut segments = split_top_level(&text).into_iter();

        let first = segments.next()?;
        let (scope, name) = match self.type_prefix.captures(first) {
            Some(captures) => {
                let noun = captures.name("noun").map(|m| m.as_str()).unwrap_or("");
                let rest = captures.name("rest").map(|m| m.as_str()).unwrap_or("");
                (noun_scope(noun)?, rest.trim().to_string())
            }
            None => (ParentScope::Either, first.trim().to_string()),
        };

        let name = self.cleanup_name(&name);
        let normalized = normalize_name(&name);
        if normalized.is_empty() {
            return None;
        }

        let province = match scope {
            ParentScope::Province => None,
            _ => segments.find_map(|segment| self.province_segment(segment)),
        };

        Some(ParentRef {
            name,
            normalized,
            scope,
            province,
            origin,
        })
    }

    fn province_segment(&self, segment: &str) -> Option<String> {
        let captures = self.type_prefix.captures(segment)?;
        let noun = captures.name("noun")?.as_str();
        if noun_scope(noun)? != ParentScope::Province {
            return None;
        }
        let rest = captures.name("rest")?.as_str();
        let normalized = normalize_name(&self.cleanup_name(rest));
        (!normalized.is_empty()).then_some(normalized)
    }
}

/// Scope named by a parent's type noun; ward-level nouns cannot be parents.
fn noun_scope(noun: &str) -> Option<ParentScope> {
    match noun.to_lowercase().as_str() {
        "huyện" | "quận" | "thị xã" => Some(ParentScope::District),
        "tỉnh" => Some(ParentScope::Province),
        "thành phố" => Some(ParentScope::Either),
        _ => None,
    }
}

fn strip_parentheticals(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => output.push(ch),
            _ => {}
        }
    }
    condense_whitespace(&output)
}
