use super::propagate::propagate_parents;
use super::token::TokenOutcome;
use super::{ClauseParser, FragmentOutcome, ParseError, ResolutionClause, UnitReference};
use crate::normalize::condense_whitespace;

impl ClauseParser {
    /// Sentence and line fragments that mention the merger verb.
    pub(super) fn segment<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.fragment_break
            .split(text)
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .filter(|fragment| self.merger_verb.is_match(fragment))
            .collect()
    }

    pub(super) fn parse_fragment(
        &self,
        fragment: &str,
        document_ref: &str,
    ) -> Result<FragmentOutcome, ParseError> {
        let Some(captures) = self.destination.captures(fragment) else {
            return Ok(FragmentOutcome::Discarded("no destination type after merger verb"));
        };
        let (Some(whole), Some(noun)) = (captures.get(0), captures.name("noun")) else {
            return Ok(FragmentOutcome::Discarded("no destination type after merger verb"));
        };

        let source_segment = &fragment[..whole.start()];
        let destination_text = cut_at_top_level_break(&fragment[whole.end()..]);

        let empty_target = || ParseError::EmptyTarget {
            document_ref: document_ref.to_string(),
            clause: fragment.to_string(),
        };
        let target = match self.parse_token(destination_text, self.noun_kind(noun.as_str())) {
            TokenOutcome::Unit(reference) => reference,
            TokenOutcome::TypeOnly(_) | TokenOutcome::Province(_) | TokenOutcome::Discard => {
                return Err(empty_target());
            }
        };
        if target.name.is_empty() {
            return Err(empty_target());
        }

        let mut sources = Vec::new();
        let mut current_kind = None;
        for token in split_top_level(&self.clean_source_segment(source_segment)) {
            match self.parse_token(token, current_kind) {
                TokenOutcome::Unit(reference) => {
                    current_kind = reference.kind.or(current_kind);
                    sources.push(reference);
                }
                TokenOutcome::TypeOnly(kind) => current_kind = kind.or(current_kind),
                TokenOutcome::Province(province) => {
                    if let Some(parent) = sources
                        .last_mut()
                        .and_then(|source: &mut UnitReference| source.parent.as_mut())
                    {
                        if parent.province.is_none() {
                            parent.province = Some(province);
                        }
                    }
                }
                TokenOutcome::Discard => {}
            }
        }

        if sources.is_empty() {
            return Ok(FragmentOutcome::Discarded("no source units before merger verb"));
        }

        Ok(FragmentOutcome::Clause(ResolutionClause {
            sources: propagate_parents(&sources),
            target,
            text: fragment.to_string(),
            document_ref: document_ref.to_string(),
        }))
    }

    /// Reduces the text before "thành" to a uniform comma-separated list.
    pub(super) fn clean_source_segment(&self, segment: &str) -> String {
        let mut text = condense_whitespace(segment);
        loop {
            let stripped = self.list_marker.replace(&text, "");
            let stripped = self.leading_verb.replace(&stripped, "").trim().to_string();
            if stripped == text {
                break;
            }
            text = stripped;
        }

        let text = self.plural_type.replace_all(&text, "$1");
        let text = self.conjunction.replace_all(&text, ", ");
        let text = self.space_before_punct.replace_all(&text, "$1");
        let text = self.space_after_paren.replace_all(&text, "(");
        condense_whitespace(&text)
    }
}

/// Splits on `,` and `;` outside parentheses. An unclosed parenthesis keeps
/// the rest of the segment in one token.
pub(super) fn split_top_level(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (index, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 => {
                tokens.push(&text[start..index]);
                start = index + ch.len_utf8();
            }
            _ => {}
        }
    }
    tokens.push(&text[start..]);

    tokens
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Destination text ends at the first top-level `,`, `;` or `:`.
fn cut_at_top_level_break(text: &str) -> &str {
    let mut depth = 0usize;
    for (index, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' | ':' if depth == 0 => return text[..index].trim(),
            _ => {}
        }
    }
    text.trim()
}
