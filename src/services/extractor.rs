use scraper::{ElementRef, Html, Selector};

use crate::{
    domain::{
        item_record::ItemRecord,
        numeric::{normalize_currency, normalize_quantity},
    },
    services::RunLog,
};

const DISPENSE_TABLE_SELECTOR: &str = "table#tblResultadoLista";
const CHILD_TABLE_SELECTOR: &str = "table#tblResultadoLista_Child";
const STATUS_LABEL: &str = "Situação do Item";
const EXCERPT_LEN: usize = 100;

/// Structural classification of one `<tr>` inside an item block, over its
/// direct `<td>` children.
#[derive(Debug, PartialEq)]
pub enum RowKind {
    /// Exactly 7 cells, the first without colspan: a genuine item row. Carries
    /// the trimmed cell texts left to right.
    ItemData(Vec<String>),
    /// A single merged cell whose text carries the status label. Carries the
    /// status with the label prefix stripped.
    StatusAnnotation(String),
    Other,
}

pub fn classify_row(row: ElementRef) -> RowKind {
    let cells: Vec<ElementRef> = direct_children(row, "td").collect();

    if cells.len() == 7 && cells[0].value().attr("colspan").is_none() {
        return RowKind::ItemData(cells.iter().map(|cell| cell_text(*cell)).collect());
    }

    if cells.len() == 1 && cells[0].value().attr("colspan").is_some() {
        let text = cell_text(cells[0]);
        if let Some(idx) = text.find(STATUS_LABEL) {
            let status = text[idx + STATUS_LABEL.len()..]
                .trim_start_matches(':')
                .trim()
                .to_string();
            return RowKind::StatusAnnotation(status);
        }
    }

    RowKind::Other
}

/// Extracts every item record from one page of results, in document order.
///
/// Each `table#tblResultadoLista` is one dispense: its first row carries the
/// dispense number and opening date, and a nested `tblResultadoLista_Child`
/// table holds one `<tbody>` block per item. Anything that does not match the
/// expected structure is logged and skipped; a malformed block never fails the
/// page.
pub fn extract_items(html: &str, log: &RunLog) -> Vec<ItemRecord> {
    let document = Html::parse_document(html);
    let dispense_selector = Selector::parse(DISPENSE_TABLE_SELECTOR).unwrap();
    let child_selector = Selector::parse(CHILD_TABLE_SELECTOR).unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let mut records = Vec::new();

    for dispense_table in document.select(&dispense_selector) {
        let (dispense_number, opening_date) =
            dispense_header(dispense_table, &row_selector, &anchor_selector);

        let Some(child_table) = dispense_table.select(&child_selector).next() else {
            log.line("No 'tblResultadoLista_Child' table found inside a dispense table.");
            continue;
        };

        for block in direct_children(child_table, "tbody") {
            let mut item_cells: Option<Vec<String>> = None;
            let mut item_status = String::new();

            for row in direct_children(block, "tr") {
                match classify_row(row) {
                    // Last matching row wins if the block somehow has several
                    RowKind::ItemData(cells) => item_cells = Some(cells),
                    RowKind::StatusAnnotation(status) => item_status = status,
                    RowKind::Other => {}
                }
            }

            match item_cells {
                Some(cells) => records.push(build_record(
                    &dispense_number,
                    &opening_date,
                    &cells,
                    item_status,
                )),
                None => {
                    let excerpt: String = block
                        .text()
                        .collect::<String>()
                        .split_whitespace()
                        .collect::<Vec<&str>>()
                        .join(" ")
                        .chars()
                        .take(EXCERPT_LEN)
                        .collect();
                    log.line(&format!(
                        "No 7-column item row found in a <tbody> block. Content: {}...",
                        excerpt
                    ));
                }
            }
        }
    }

    records
}

/// Dispense number comes from an anchor nested in the first cell of the first
/// row; opening date from the second cell. Both default to empty.
fn dispense_header(
    table: ElementRef,
    row_selector: &Selector,
    anchor_selector: &Selector,
) -> (String, String) {
    let Some(first_row) = table.select(row_selector).next() else {
        return (String::new(), String::new());
    };
    let cells: Vec<ElementRef> = direct_children(first_row, "td").collect();

    let number = cells
        .first()
        .and_then(|cell| cell.select(anchor_selector).next())
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let date = cells.get(1).map(|cell| cell_text(*cell)).unwrap_or_default();

    (number, date)
}

fn build_record(
    dispense_number: &str,
    opening_date: &str,
    cells: &[String],
    item_status: String,
) -> ItemRecord {
    let field = |index: usize| cells.get(index).cloned().unwrap_or_default();

    ItemRecord {
        dispense_number: dispense_number.to_string(),
        opening_date: opening_date.to_string(),
        description: field(0),
        state_code: field(1),
        winner: field(2),
        brand: field(3),
        quantity: normalize_quantity(&field(4)),
        unit_price: normalize_currency(&field(5)),
        total_price: normalize_currency(&field(6)),
        item_status,
    }
}

fn direct_children<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
