//! Terminal tables describing a read archive.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use datadok_core::{ArchiveResult, UnknownCodeSummary};

/// One layout row: field, type, bytes, width, code list.
pub fn layout_rows(archive: &ArchiveResult) -> Vec<[String; 5]> {
    archive
        .layout()
        .iter()
        .map(|column| {
            [
                column.name.clone(),
                column.column_type.to_string(),
                format!("{}..{}", column.start, column.end()),
                column.width.to_string(),
                column.codelist.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect()
}

/// One row per code list: id, description, number of codes.
pub fn codelist_rows(archive: &ArchiveResult) -> Vec<[String; 3]> {
    archive
        .codelists()
        .values()
        .map(|codelist| {
            [
                codelist.id.clone(),
                if codelist.description.is_empty() {
                    "-".to_string()
                } else {
                    codelist.description.clone()
                },
                codelist.len().to_string(),
            ]
        })
        .collect()
}

pub fn print_summary(archive: &ArchiveResult, head: usize) {
    println!("File: {}", archive.source().display());
    println!("Encoding: {}", archive.encoding().name());
    println!(
        "Rows: {}  Columns: {}  Record length: {}",
        archive.data().height(),
        archive.layout().len(),
        archive.layout().record_length()
    );
    println!("{}", layout_table(archive));

    if !archive.codelists().is_empty() {
        println!();
        println!("Code lists:");
        println!("{}", codelist_summary_table(archive));
    }

    let unknown = archive.unknown_code_summary();
    if !unknown.is_empty() {
        println!();
        println!("Unknown codes:");
        println!("{}", unknown_code_table(&unknown));
    }

    if head > 0 {
        println!();
        println!("{}", archive.labelled().head(Some(head)));
    }
}

pub fn layout_table(archive: &ArchiveResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Bytes"),
        header_cell("Width"),
        header_cell("Code list"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for [name, kind, bytes, width, codelist] in layout_rows(archive) {
        let codelist_cell = if codelist == "-" {
            dim_cell(codelist)
        } else {
            Cell::new(codelist)
        };
        table.add_row(vec![
            Cell::new(name).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(kind),
            Cell::new(bytes),
            Cell::new(width),
            codelist_cell,
        ]);
    }
    table
}

fn codelist_summary_table(archive: &ArchiveResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code list"),
        header_cell("Description"),
        header_cell("Codes"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for [id, description, codes] in codelist_rows(archive) {
        table.add_row(vec![Cell::new(id), Cell::new(description), Cell::new(codes)]);
    }
    table
}

pub fn unknown_code_table(summaries: &[UnknownCodeSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Code"),
        header_cell("Count"),
        header_cell("First line"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.field),
            Cell::new(&summary.code).fg(Color::Yellow),
            Cell::new(summary.count)
                .fg(Color::Yellow)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.first_line),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
