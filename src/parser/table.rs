use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{find_chain, Row};

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Rows of a table body whose cell count is exactly `expected`.
///
/// Any other row (headers, spacers, colspan banners) is skipped silently.
/// Cell text is kept as-is, in document order.
pub fn table_rows(body: ElementRef<'_>, expected: usize) -> Vec<Row> {
    keep_rows(find_chain(body, &[&ROW_SEL]), expected)
}

/// Rows of every `region table tbody` inside `scope`, each `tr` once.
/// `region` must be a single compound selector such as `.productspec`.
pub fn region_rows(scope: ElementRef<'_>, region: &Selector, expected: usize) -> Vec<Row> {
    let rows = find_chain(scope, &[region, &TABLE_SEL, &BODY_SEL, &ROW_SEL]);
    keep_rows(rows, expected)
}

fn keep_rows(rows: Vec<ElementRef<'_>>, expected: usize) -> Vec<Row> {
    rows.into_iter()
        .filter_map(|tr| {
            let cells = find_chain(tr, &[&CELL_SEL]);
            if cells.len() != expected {
                return None;
            }
            Some(cells.iter().map(|td| td.text().collect::<String>()).collect())
        })
        .collect()
}
