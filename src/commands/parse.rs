use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::clause::{ClauseParser, ResolutionClause, UnitReference, prepare_document_text};
use crate::cli::ParseArgs;
use crate::util::{file_stem_string, read_text_file};

pub fn run(args: ParseArgs) -> Result<()> {
    let reference = match args.reference {
        Some(reference) => reference,
        None => file_stem_string(&args.document)?,
    };

    let raw = read_text_file(&args.document)?;
    let parser = ClauseParser::new()?;
    let clauses = parser
        .parse_document(&prepare_document_text(&raw), &reference)
        .with_context(|| format!("failed to parse {}", args.document.display()))?;

    if args.json {
        write_json_clauses(&clauses)?;
    } else {
        write_text_clauses(&clauses)?;
    }

    info!(document = %reference, clauses = clauses.len(), "parse completed");
    Ok(())
}

fn write_json_clauses(clauses: &[ResolutionClause]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, clauses)
        .context("failed to serialize clause json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_clauses(clauses: &[ResolutionClause]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    for (position, clause) in clauses.iter().enumerate() {
        writeln!(output, "{}.\t{}", position + 1, clause.text)?;
        for source in &clause.sources {
            writeln!(output, "\tfrom\t{}", describe(source))?;
        }
        writeln!(output, "\tinto\t{}", describe(&clause.target))?;
    }

    output.flush()?;
    Ok(())
}

fn describe(reference: &UnitReference) -> String {
    let mut text = match reference.kind {
        Some(kind) => format!("{} [{}]", reference.name, kind.as_str()),
        None => reference.name.clone(),
    };
    if let Some(parent) = &reference.parent {
        text.push_str(&format!(" [parent={} {:?}]", parent.name, parent.origin));
        if let Some(province) = &parent.province {
            text.push_str(&format!(" [province={province}]"));
        }
    }
    if reference.partial {
        text.push_str(" [partial]");
    }
    text
}
