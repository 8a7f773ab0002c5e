use crate::domain::model::AvailabilityRecord;
use scraper::{ElementRef, Html};

/// Spans larger than this are treated as malformed and clamped.
const MAX_SPAN: usize = 64;

/// One `<table>` flattened to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub header: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Width of the widest row, header rows included.
    pub fn column_count(&self) -> usize {
        self.header
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    /// First-column cell of every data row.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(|row| row.first().map(String::as_str).unwrap_or(""))
    }
}

/// A row-spanned cell waiting to be repeated into the rows below it.
struct PendingCell {
    column: usize,
    text: String,
    rows_left: usize,
}

/// Every visible table in the document, outer tables before the tables
/// nested in them. Rows of a nested table are not repeated in its parent.
pub fn parse_tables(html: &str) -> Vec<ParsedTable> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "table")
        .filter(|table| !inside_hidden(*table))
        .map(parse_table)
        .collect()
}

fn parse_table(table: ElementRef<'_>) -> ParsedTable {
    let mut header_rows = Vec::new();
    let mut body_rows = Vec::new();
    for (row, in_thead) in own_rows(table) {
        if in_thead {
            header_rows.push(row);
        } else {
            body_rows.push(row);
        }
    }

    // Without a <thead>, leading all-<th> rows are the header.
    if header_rows.is_empty() {
        let leading = body_rows
            .iter()
            .take_while(|row| is_header_row(**row))
            .count();
        header_rows = body_rows.drain(..leading).collect();
    }

    ParsedTable {
        header: expand_rows(&header_rows),
        rows: expand_rows(&body_rows),
    }
}

fn own_rows(table: ElementRef<'_>) -> Vec<(ElementRef<'_>, bool)> {
    let mut rows = Vec::new();
    for child in visible_children(table) {
        match child.value().name() {
            "tr" => rows.push((child, false)),
            "thead" | "tbody" | "tfoot" => {
                let in_thead = child.value().name() == "thead";
                rows.extend(
                    visible_children(child)
                        .filter(|row| row.value().name() == "tr")
                        .map(|row| (row, in_thead)),
                );
            }
            _ => {}
        }
    }
    rows
}

fn visible_children(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| !is_hidden(*child))
}

fn cell_elements(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    visible_children(row).filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    cell_elements(row).all(|cell| cell.value().name() == "th")
}

/// `style="display: none"` on the element itself.
fn is_hidden(element: ElementRef<'_>) -> bool {
    element.value().attr("style").is_some_and(|style| {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        style.to_ascii_lowercase().contains("display:none")
    })
}

fn inside_hidden(element: ElementRef<'_>) -> bool {
    is_hidden(element) || element.ancestors().filter_map(ElementRef::wrap).any(is_hidden)
}

/// Cell text per row with `colspan` repeated across columns and `rowspan`
/// repeated into the following rows of the same section.
fn expand_rows(rows: &[ElementRef<'_>]) -> Vec<Vec<String>> {
    let mut expanded = Vec::new();
    let mut pending: Vec<PendingCell> = Vec::new();

    for row in rows {
        let mut cells = Vec::new();
        let mut next_pending = Vec::new();
        let mut carried = std::mem::take(&mut pending).into_iter().peekable();

        for cell in cell_elements(*row) {
            while let Some(spanned) = carried.next_if(|spanned| spanned.column <= cells.len()) {
                carry_down(spanned, &mut cells, &mut next_pending);
            }

            let text = cell_text(cell);
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");
            for _ in 0..colspan {
                if rowspan > 1 {
                    next_pending.push(PendingCell {
                        column: cells.len(),
                        text: text.clone(),
                        rows_left: rowspan - 1,
                    });
                }
                cells.push(text.clone());
            }
        }
        for spanned in carried {
            carry_down(spanned, &mut cells, &mut next_pending);
        }

        pending = next_pending;
        if !cells.is_empty() {
            expanded.push(cells);
        }
    }
    expanded
}

fn carry_down(mut spanned: PendingCell, cells: &mut Vec<String>, next_pending: &mut Vec<PendingCell>) {
    cells.push(spanned.text.clone());
    if spanned.rows_left > 1 {
        spanned.rows_left -= 1;
        next_pending.push(spanned);
    }
}

fn span(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_visible_text(cell, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !is_hidden(child) {
                push_visible_text(child, out);
            }
        }
    }
}

/// Turns qualifying tables into availability records.
#[derive(Debug, Clone)]
pub struct Extractor {
    facility_label: String,
    date_column: String,
}

impl Extractor {
    pub fn new(facility_label: impl Into<String>, date_column: impl Into<String>) -> Self {
        Self {
            facility_label: facility_label.into(),
            date_column: date_column.into(),
        }
    }

    /// A table qualifies when it has at least two columns and one of its
    /// first-column labels is the facility keyword.
    pub fn is_availability_table(&self, table: &ParsedTable) -> bool {
        table.column_count() >= 2 && table.labels().any(|label| label == self.facility_label)
    }

    /// Records for every qualifying table on the page, in page order.
    /// A page without tables simply yields nothing.
    pub fn extract(&self, html: &str, search_date: &str) -> Vec<AvailabilityRecord> {
        parse_tables(html)
            .iter()
            .filter(|table| self.is_availability_table(table))
            .map(|table| self.build_record(table, search_date))
            .collect()
    }

    fn build_record(&self, table: &ParsedTable, search_date: &str) -> AvailabilityRecord {
        let mut record: AvailabilityRecord = table
            .rows
            .iter()
            .map(|row| {
                let label = row.first().cloned().unwrap_or_default();
                let value = row.get(1).cloned().unwrap_or_default();
                (label, value)
            })
            .collect();
        record.insert(self.date_column.as_str(), search_date);
        record
    }
}
