use std::collections::BTreeMap;

use sqlparser::ast::{Expr, SetExpr, Statement, Value};
use sqlparser::dialect::{GenericDialect, MySqlDialect};
use sqlparser::parser::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlDumpError {
    #[error("failed to parse INSERT statement #{statement}: {message}")]
    Parse { statement: usize, message: String },

    #[error("INSERT into `{table}` has no column list")]
    MissingColumns { table: String },

    #[error("INSERT into `{table}` row {row} has {found} values for {expected} columns")]
    ColumnCountMismatch {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// One tuple of a bulk `INSERT`, keyed by lower-cased column name.
#[derive(Debug, Clone)]
pub struct SqlRow {
    pub table: String,
    pub ordinal: usize,
    pub values: BTreeMap<String, Option<String>>,
}

impl SqlRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .and_then(|value| value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Extracts every `INSERT` tuple from a SQL dump. Other statements are ignored.
pub fn extract_rows(sql: &str) -> Result<Vec<SqlRow>, SqlDumpError> {
    let mut rows = Vec::new();
    let mut ordinals = BTreeMap::<String, usize>::new();

    for (index, statement) in split_statements(sql).iter().enumerate() {
        if !starts_with_keyword(statement, "INSERT") {
            continue;
        }

        let (table, columns, tuples) = parse_insert(statement, index + 1)?;
        if columns.is_empty() {
            return Err(SqlDumpError::MissingColumns { table });
        }

        for tuple in tuples {
            let ordinal = ordinals.entry(table.clone()).or_insert(0);
            *ordinal += 1;

            if tuple.len() != columns.len() {
                return Err(SqlDumpError::ColumnCountMismatch {
                    table,
                    row: *ordinal,
                    expected: columns.len(),
                    found: tuple.len(),
                });
            }

            rows.push(SqlRow {
                table: table.clone(),
                ordinal: *ordinal,
                values: columns.iter().cloned().zip(tuple).collect(),
            });
        }
    }

    Ok(rows)
}

type InsertParts = (String, Vec<String>, Vec<Vec<Option<String>>>);

fn parse_insert(statement: &str, statement_index: usize) -> Result<InsertParts, SqlDumpError> {
    let parsed = Parser::parse_sql(&GenericDialect {}, statement)
        .or_else(|_| Parser::parse_sql(&MySqlDialect {}, statement))
        .map_err(|error| SqlDumpError::Parse {
            statement: statement_index,
            message: error.to_string(),
        })?;

    let Some(Statement::Insert {
        table_name,
        columns,
        source,
        ..
    }) = parsed.into_iter().next()
    else {
        return Err(SqlDumpError::Parse {
            statement: statement_index,
            message: "statement is not an INSERT".to_string(),
        });
    };

    let table = table_name
        .0
        .last()
        .map(|ident| ident.value.to_lowercase())
        .unwrap_or_default();
    let columns = columns
        .iter()
        .map(|ident| ident.value.to_lowercase())
        .collect::<Vec<String>>();

    let Some(query) = source else {
        return Ok((table, columns, Vec::new()));
    };
    let SetExpr::Values(values) = query.body.as_ref() else {
        return Err(SqlDumpError::Parse {
            statement: statement_index,
            message: format!("INSERT into `{table}` does not use a VALUES list"),
        });
    };

    let tuples = values
        .rows
        .iter()
        .map(|row| row.iter().map(value_text).collect())
        .collect();

    Ok((table, columns, tuples))
}

fn value_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::Null) => None,
        Expr::Value(Value::SingleQuotedString(text))
        | Expr::Value(Value::DoubleQuotedString(text)) => Some(text.clone()),
        Expr::Value(Value::Number(text, _)) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn starts_with_keyword(statement: &str, keyword: &str) -> bool {
    statement
        .trim_start()
        .get(..keyword.len())
        .map(|head| head.eq_ignore_ascii_case(keyword))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Splits a dump on top-level `;`, dropping comments and respecting quotes.
fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Code;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            ScanState::Code => match ch {
                '\'' | '"' | '`' => {
                    state = ScanState::Quoted(ch);
                    current.push(ch);
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = ScanState::LineComment;
                }
                '#' => state = ScanState::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = ScanState::BlockComment;
                }
                ';' => {
                    if !current.trim().is_empty() {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                }
                _ => current.push(ch),
            },
            ScanState::Quoted(quote) => {
                current.push(ch);
                if ch == '\\' && quote == '\'' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if ch == quote {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    current.push('\n');
                    state = ScanState::Code;
                }
            }
            ScanState::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    current.push(' ');
                    state = ScanState::Code;
                }
            }
        }
    }

    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_statements_respects_quotes_and_comments() {
        let sql = "-- header; comment\nINSERT INTO t (a) VALUES ('x;y');\n/* block; */ SELECT 1;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("'x;y'"));
        assert!(statements[1].starts_with("SELECT"));
    }

    #[test]
    fn extract_rows_reads_bulk_tuples_and_nulls() {
        let sql = "CREATE TABLE wards (code varchar(20));\n\
            INSERT INTO public.wards (code, name, full_name, district_code, administrative_unit_id) VALUES\n\
            ('00001', 'Phúc Xá', 'Phường Phúc Xá', '001', 8),\n\
            ('00004', 'Trúc Bạch', NULL, '001', 8);";

        let rows = extract_rows(sql).expect("dump parses");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].table, "wards");
        assert_eq!(rows[0].get("name"), Some("Phúc Xá"));
        assert_eq!(rows[0].get("administrative_unit_id"), Some("8"));
        assert_eq!(rows[1].get("full_name"), None);
        assert_eq!(rows[1].ordinal, 2);
    }

    #[test]
    fn extract_rows_unescapes_doubled_quotes() {
        let sql = "INSERT INTO wards (code, name) VALUES ('1', 'Ea H''Leo');";
        let rows = extract_rows(sql).expect("dump parses");
        assert_eq!(rows[0].get("name"), Some("Ea H'Leo"));
    }

    #[test]
    fn extract_rows_rejects_insert_without_columns() {
        let sql = "INSERT INTO wards VALUES ('1', 'A');";
        let error = extract_rows(sql).expect_err("column list is required");
        assert!(matches!(error, SqlDumpError::MissingColumns { .. }));
    }
}
