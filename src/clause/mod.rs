mod propagate;
mod segment;
#[cfg(test)]
mod tests;
mod token;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::dataset::AdministrativeUnitKind;

const TYPE_NOUNS: &str = "thị trấn|thị xã|thành phố|đặc khu|phường|xã|huyện|quận|tỉnh";

/// Which level a parent reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentScope {
    District,
    Province,
    /// "thành phố" can be a provincial city or a centrally-run city.
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentOrigin {
    /// Stated in a trailing parenthetical; authoritative.
    Parenthetical,
    /// Stated with a "thuộc ..." suffix; may be overridden.
    Suffix,
    /// Copied from a neighbouring source.
    Inherited,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentRef {
    pub name: String,
    pub normalized: String,
    pub scope: ParentScope,
    /// Normalized province named after the parent ("huyện X, tỉnh Y").
    pub province: Option<String>,
    pub origin: ParentOrigin,
}

impl ParentRef {
    pub fn is_locked(&self) -> bool {
        self.origin == ParentOrigin::Parenthetical
    }
}

/// One unit as written in a clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReference {
    pub raw: String,
    pub name: String,
    pub normalized: String,
    pub kind: Option<AdministrativeUnitKind>,
    pub parent: Option<ParentRef>,
    /// Only part of the unit's area moves ("một phần diện tích").
    pub partial: bool,
}

pub type ResolutionSource = UnitReference;
pub type ResolutionTarget = UnitReference;

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionClause {
    pub sources: Vec<ResolutionSource>,
    pub target: ResolutionTarget,
    pub text: String,
    pub document_ref: String,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{document_ref}: destination is empty after cleanup in clause: {clause}")]
    EmptyTarget { document_ref: String, clause: String },
}

/// NFC text with `\n` line endings, the form the parser expects.
pub fn prepare_document_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .nfc()
        .collect()
}

#[derive(Debug)]
pub struct ClauseParser {
    fragment_break: Regex,
    merger_verb: Regex,
    destination: Regex,
    list_marker: Regex,
    leading_verb: Regex,
    plural_type: Regex,
    conjunction: Regex,
    space_before_punct: Regex,
    space_after_paren: Regex,
    context_prefixes: Vec<Regex>,
    cross_reference: Regex,
    measurement: Regex,
    trailing_condition: Regex,
    trailing_parenthetical: Regex,
    thuoc_prefix: Regex,
    thuoc_suffix: Regex,
    type_prefix: Regex,
    bare_type: Regex,
    partial_marker: Regex,
}

impl ClauseParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fragment_break: Regex::new(r"\n|[.!?](?:\s+|$)")
                .context("failed to compile fragment break regex")?,
            merger_verb: Regex::new(r"\bthành\b").context("failed to compile merger verb regex")?,
            destination: Regex::new(
                r"\bthành\s+(?P<noun>(?i:thị trấn|thị xã|thành phố|đặc khu|phường|xã|huyện|quận))(?:\s+|$)",
            )
            .context("failed to compile destination regex")?,
            list_marker: Regex::new(r"^\s*(?:[0-9]+|[a-zđ])[.)]\s*")
                .context("failed to compile list marker regex")?,
            leading_verb: Regex::new(
                r"^(?i:sáp nhập|sắp xếp|hợp nhất|điều chỉnh|đổi tên|nhập|tách|chuyển)\s+",
            )
            .context("failed to compile leading verb regex")?,
            plural_type: Regex::new(&format!(r"(?i)\bcác\s+({TYPE_NOUNS})\b"))
                .context("failed to compile plural type regex")?,
            conjunction: Regex::new(r"\s+(?:và|&|với|vào)\s+")
                .context("failed to compile conjunction regex")?,
            space_before_punct: Regex::new(r"\s+([,;)])")
                .context("failed to compile punctuation spacing regex")?,
            space_after_paren: Regex::new(r"\(\s+")
                .context("failed to compile parenthesis spacing regex")?,
            context_prefixes: compile_context_prefixes()?,
            cross_reference: Regex::new(
                r"^(?i)(?:(?:tại|của|theo|căn cứ|trên cơ sở)\s+)?(?:(?:điểm|khoản|điều|mục|chương)\s+(?:này|[\p{L}\d]+)\s*)+$",
            )
            .context("failed to compile cross reference regex")?,
            measurement: Regex::new(r"^(?i)\d+(?:[.,]\d+)*\s*(?:km2|km²|ha|người)$")
                .context("failed to compile measurement regex")?,
            trailing_condition: Regex::new(
                r"\s+(?:sau khi|theo quy định|quy định tại|kể từ|trên cơ sở|để)\b.*$",
            )
            .context("failed to compile trailing condition regex")?,
            trailing_parenthetical: Regex::new(r"^(?P<name>.*?)\s*\((?P<inner>[^()]*)\)\s*$")
                .context("failed to compile trailing parenthetical regex")?,
            thuoc_prefix: Regex::new(r"^thuộc\s+").context("failed to compile thuộc regex")?,
            thuoc_suffix: Regex::new(r"^(?P<name>.+?)\s+thuộc\s+(?P<parent>.+)$")
                .context("failed to compile thuộc suffix regex")?,
            type_prefix: Regex::new(&format!(r"^(?i)(?P<noun>{TYPE_NOUNS})\s+(?P<rest>.+)$"))
                .context("failed to compile type prefix regex")?,
            bare_type: Regex::new(&format!(r"^(?i)(?:{TYPE_NOUNS})$"))
                .context("failed to compile bare type regex")?,
            partial_marker: Regex::new(r"(?i)\b(?:một phần|phần còn lại)\b")
                .context("failed to compile partial marker regex")?,
        })
    }

    /// Parses one prepared document into its merger clauses, in order.
    pub fn parse_document(
        &self,
        text: &str,
        document_ref: &str,
    ) -> Result<Vec<ResolutionClause>, ParseError> {
        let mut clauses = Vec::new();

        for fragment in self.segment(text) {
            match self.parse_fragment(fragment, document_ref)? {
                FragmentOutcome::Clause(clause) => clauses.push(clause),
                FragmentOutcome::Discarded(reason) => {
                    debug!(document = %document_ref, reason, fragment, "fragment discarded");
                }
            }
        }

        debug!(document = %document_ref, clauses = clauses.len(), "document parsed");
        Ok(clauses)
    }
}

#[derive(Debug)]
enum FragmentOutcome {
    Clause(ResolutionClause),
    Discarded(&'static str),
}

fn compile_context_prefixes() -> Result<Vec<Regex>> {
    [
        r"^(?i)(?:toàn bộ|một phần|phần còn lại)(?:\s+(?:diện tích tự nhiên|diện tích|quy mô dân số|dân số))?(?:\s+|$)",
        r"^(?i)(?:và\s+)?(?:quy mô dân số|dân số|diện tích tự nhiên|diện tích)(?:\s+là\s+[\d.,]+\s*(?:km2|km²|ha|người)?)?(?:\s+|$)",
        r"^(?i)(?:của|các|là|gồm)(?:\s+|$)",
        r"^(?i)mới(?:\s+|$)",
        r"^[-–—:]\s*",
    ]
    .iter()
    .map(|pattern| {
        Regex::new(pattern)
            .with_context(|| format!("failed to compile context prefix regex: {pattern}"))
    })
    .collect()
}
