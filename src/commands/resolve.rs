use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::clause::{ClauseParser, prepare_document_text};
use crate::cli::ResolveArgs;
use crate::dataset::{Dataset, DatasetEdition, extract_rows};
use crate::emit::{open_database, persist_rows, render_insert_sql};
use crate::hints::{hint_from_arg, hint_from_stem};
use crate::model::{DocumentEntry, DocumentStatus, DumpEntry, ResolveRunManifest};
use crate::resolve::{MappingRow, ProvinceHints, ResolverOptions, resolve};
use crate::util::{
    file_stem_string, now_utc_string, read_text_file, sha256_file, utc_compact_string,
    write_json_pretty, write_text_file,
};

const MANIFEST_VERSION: u32 = 1;

struct RunContext<'a> {
    parser: ClauseParser,
    legacy: &'a Dataset,
    reform: &'a Dataset,
    overrides: ProvinceHints,
    options: ResolverOptions,
}

pub fn run(args: ResolveArgs) -> Result<()> {
    let run_id = utc_compact_string(Utc::now());

    let (legacy, legacy_dump) = load_dataset(DatasetEdition::Legacy, &args.legacy_dump)?;
    let (reform, reform_dump) = load_dataset(DatasetEdition::Reform, &args.reform_dump)?;

    let documents = collect_documents(&args.documents, args.documents_dir.as_deref())?;
    if documents.is_empty() {
        bail!("no resolution documents given; use --document or --documents-dir");
    }

    let overrides = ProvinceHints {
        legacy: args
            .legacy_province
            .as_deref()
            .map(|value| hint_from_arg(&legacy, value))
            .transpose()
            .context("invalid --legacy-province")?,
        reform: args
            .reform_province
            .as_deref()
            .map(|value| hint_from_arg(&reform, value))
            .transpose()
            .context("invalid --reform-province")?,
    };

    let context = RunContext {
        parser: ClauseParser::new()?,
        legacy: &legacy,
        reform: &reform,
        overrides,
        options: ResolverOptions {
            max_search_nodes: args.max_search_nodes,
            filter_fallback: args.filter_fallback.into(),
        },
    };

    let mut rows = Vec::new();
    let mut entries = Vec::with_capacity(documents.len());
    for path in &documents {
        let (entry, document_rows) = resolve_document(&context, path)?;
        rows.extend(document_rows);
        entries.push(entry);
    }

    let sql = render_insert_sql(&rows, &args.table, args.batch_size)?;
    write_text_file(&args.output, &sql)?;
    info!(path = %args.output.display(), rows = rows.len(), "wrote mapping sql");

    if let Some(db_path) = &args.db_path {
        let mut connection = open_database(db_path)?;
        let written = persist_rows(&mut connection, &rows)
            .with_context(|| format!("failed to persist rows into {}", db_path.display()))?;
        info!(path = %db_path.display(), rows = written, "persisted mapping rows");
    }

    let failed_document_count = entries
        .iter()
        .filter(|entry| entry.status != DocumentStatus::Resolved)
        .count();

    let manifest = ResolveRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id: run_id.clone(),
        generated_at: now_utc_string(),
        filter_fallback: args.filter_fallback.as_str().to_string(),
        max_search_nodes: args.max_search_nodes,
        legacy_dump,
        reform_dump,
        output_path: args.output.display().to_string(),
        db_path: args.db_path.as_ref().map(|path| path.display().to_string()),
        document_count: entries.len(),
        failed_document_count,
        row_count: rows.len(),
        documents: entries,
    };

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output, &run_id));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote resolve manifest");

    if failed_document_count > 0 {
        bail!(
            "{failed_document_count} of {} documents failed; see {}",
            manifest.document_count,
            manifest_path.display()
        );
    }

    info!(
        documents = manifest.document_count,
        rows = manifest.row_count,
        "resolve completed"
    );
    Ok(())
}

fn load_dataset(edition: DatasetEdition, path: &Path) -> Result<(Dataset, DumpEntry)> {
    let sql = read_text_file(path)?;
    let rows = extract_rows(&sql)
        .with_context(|| format!("failed to read {edition} dump: {}", path.display()))?;
    let dataset = Dataset::load(edition, &rows)
        .with_context(|| format!("failed to load {edition} dump: {}", path.display()))?;

    let entry = DumpEntry {
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
        province_count: dataset.provinces().count(),
        district_count: dataset.district_count(),
        ward_count: dataset.wards().len(),
    };

    info!(
        edition = %edition,
        provinces = entry.province_count,
        districts = entry.district_count,
        wards = entry.ward_count,
        "loaded dataset"
    );
    Ok((dataset, entry))
}

/// Explicit documents plus every `.txt` file of `directory`, sorted and
/// without duplicates.
fn collect_documents(explicit: &[PathBuf], directory: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut documents = explicit.to_vec();

    if let Some(directory) = directory {
        let entries = fs::read_dir(directory)
            .with_context(|| format!("failed to read {}", directory.display()))?;

        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", directory.display()))?;
            let path = entry.path();

            if !entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?
                .is_file()
            {
                continue;
            }

            let is_text = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
            if is_text {
                documents.push(path);
            }
        }
    }

    documents.sort();
    documents.dedup();
    Ok(documents)
}

/// Resolves one document. Parse and resolution failures are recorded on the
/// entry and yield no rows; only I/O failures abort the run.
fn resolve_document(
    context: &RunContext<'_>,
    path: &Path,
) -> Result<(DocumentEntry, Vec<MappingRow>)> {
    let reference = file_stem_string(path)?;
    let raw = read_text_file(path)?;

    let hints = ProvinceHints {
        legacy: context
            .overrides
            .legacy
            .clone()
            .or_else(|| hint_from_stem(context.legacy, &reference)),
        reform: context
            .overrides
            .reform
            .clone()
            .or_else(|| hint_from_stem(context.reform, &reference)),
    };

    let mut entry = DocumentEntry {
        path: path.display().to_string(),
        reference: reference.clone(),
        sha256: sha256_file(path)?,
        status: DocumentStatus::Resolved,
        legacy_province_hint: hints.legacy.as_ref().and_then(|hint| hint.code.clone()),
        reform_province_hint: hints.reform.as_ref().and_then(|hint| hint.code.clone()),
        clause_count: 0,
        row_count: 0,
        error: None,
    };

    let clauses = match context
        .parser
        .parse_document(&prepare_document_text(&raw), &reference)
    {
        Ok(clauses) => clauses,
        Err(err) => {
            warn!(document = %reference, error = %err, "document parse failed");
            entry.status = DocumentStatus::ParseFailed;
            entry.error = Some(err.to_string());
            return Ok((entry, Vec::new()));
        }
    };
    entry.clause_count = clauses.len();

    if clauses.is_empty() {
        warn!(document = %reference, "no merger clauses found");
    }

    match resolve(
        &clauses,
        context.legacy,
        context.reform,
        &hints,
        &context.options,
    ) {
        Ok(rows) => {
            entry.row_count = rows.len();
            info!(
                document = %reference,
                clauses = entry.clause_count,
                rows = entry.row_count,
                "document resolved"
            );
            Ok((entry, rows))
        }
        Err(err) => {
            warn!(document = %reference, error = %err, "document resolution failed");
            entry.status = DocumentStatus::ResolveFailed;
            entry.error = Some(err.to_string());
            Ok((entry, Vec::new()))
        }
    }
}

fn default_manifest_path(output: &Path, run_id: &str) -> PathBuf {
    let file_name = format!("resolve_manifest_{run_id}.json");
    match output.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}
