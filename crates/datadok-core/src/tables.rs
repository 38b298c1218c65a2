//! Tabular views of the archive description.

use polars::prelude::{Column, DataFrame};

use datadok_ingest::ColumnLayout;
use datadok_model::{ArchiveMetadata, CodelistEntry, Result};

/// One row per field, in declaration order.
///
/// Columns: `name, description, datatype, type, start, width, precision,
/// codelist, division`. `start` is the position as declared; `type` is the
/// canonical field type (`numeric`, `character` or `date`).
pub fn metadata_table(metadata: &ArchiveMetadata, layout: &ColumnLayout) -> Result<DataFrame> {
    let fields = &metadata.fields;
    let mut names = Vec::with_capacity(fields.len());
    let mut descriptions = Vec::with_capacity(fields.len());
    let mut datatypes = Vec::with_capacity(fields.len());
    let mut kinds: Vec<Option<&str>> = Vec::with_capacity(fields.len());
    let mut starts = Vec::with_capacity(fields.len());
    let mut widths = Vec::with_capacity(fields.len());
    let mut precisions = Vec::with_capacity(fields.len());
    let mut codelists = Vec::with_capacity(fields.len());
    let mut divisions = Vec::with_capacity(fields.len());

    for field in fields {
        names.push(field.name.as_str());
        descriptions.push(field.description.as_str());
        datatypes.push(field.datatype.as_str());
        kinds.push(
            layout
                .column(&field.name)
                .map(|column| column.column_type.kind().as_str()),
        );
        starts.push(field.start as u64);
        widths.push(field.width as u64);
        precisions.push(field.precision);
        codelists.push(field.codelist.as_deref());
        divisions.push(metadata.division.as_deref());
    }

    Ok(DataFrame::new(vec![
        Column::new("name".into(), names),
        Column::new("description".into(), descriptions),
        Column::new("datatype".into(), datatypes),
        Column::new("type".into(), kinds),
        Column::new("start".into(), starts),
        Column::new("width".into(), widths),
        Column::new("precision".into(), precisions),
        Column::new("codelist".into(), codelists),
        Column::new("division".into(), divisions),
    ])?)
}

/// One row per code-list entry: `codelist, description, field, code, label`.
pub fn codelist_table(entries: &[CodelistEntry]) -> Result<DataFrame> {
    let column = |name: &str, value: fn(&CodelistEntry) -> &str| {
        let values: Vec<&str> = entries.iter().map(value).collect();
        Column::new(name.into(), values)
    };

    Ok(DataFrame::new(vec![
        column("codelist", |e| e.codelist.as_str()),
        column("description", |e| e.description.as_str()),
        column("field", |e| e.field.as_str()),
        column("code", |e| e.code.as_str()),
        column("label", |e| e.label.as_str()),
    ])?)
}
