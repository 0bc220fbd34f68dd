use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};

use super::{find_chain, Row};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h5.panel-title").unwrap());
static TOOLTIP_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".tooltips").unwrap());
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static SPAN_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

const BREADCRUMB_DELIM: char = '»';

/// Collapse every whitespace run to one space and trim.
pub fn normalize_ws(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

/// "Toyota » Corolla » 2010-2015" → ["Toyota", "Corolla", "2010-2015"]
pub fn split_breadcrumb(s: &str) -> Vec<String> {
    s.split(BREADCRUMB_DELIM).map(|p| p.trim().to_string()).collect()
}

/// One usage record from one panel: breadcrumb segments, then every inline
/// span of the panel's table, then the trailing text of the last cell.
pub fn usage_row(panel: ElementRef<'_>) -> Row {
    let title: String = find_chain(panel, &[&HEADING_SEL, &TOOLTIP_SEL])
        .into_iter()
        .flat_map(|t| t.text())
        .collect();
    let mut row = split_breadcrumb(&title);

    row.extend(
        find_chain(panel, &[&TABLE_SEL, &SPAN_SEL])
            .into_iter()
            .map(|span| normalize_ws(&span.text().collect::<String>())),
    );

    let trailing = find_chain(panel, &[&CELL_SEL])
        .into_iter()
        .flat_map(|td| td.children())
        .last()
        .map(|node| match node.value() {
            Node::Text(t) => t.to_string(),
            _ => ElementRef::wrap(node)
                .map(|el| el.text().collect::<String>())
                .unwrap_or_default(),
        })
        .unwrap_or_default();
    row.push(normalize_ws(&trailing));

    row
}

pub fn usage_rows(scope: ElementRef<'_>, panels: &Selector) -> Vec<Row> {
    find_chain(scope, &[panels]).into_iter().map(usage_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn breadcrumb_split_trims_segments() {
        assert_eq!(
            split_breadcrumb("Toyota » Corolla » 2010-2015"),
            vec!["Toyota", "Corolla", "2010-2015"]
        );
    }

    #[test]
    fn breadcrumb_without_delimiter_is_single_field() {
        assert_eq!(split_breadcrumb("  Toyota "), vec!["Toyota"]);
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_ws("  foo\n\tbar  "), "foo bar");
        assert_eq!(normalize_ws("a \t\t b\n\nc"), "a b c");
        assert_eq!(normalize_ws("\n\t "), "");
    }

    #[test]
    fn panel_becomes_five_fields() {
        let doc = Html::parse_document(
            r#"<div class="margintpless">
                 <h5 class="panel-title"><a class="tooltips">Toyota » Corolla » 2010-2015</a></h5>
                 <table><tbody><tr>
                   <td><span>
                        1.6   VVT-i
                   </span>
                   Front axle,
                      left side
                   </td>
                 </tr></tbody></table>
               </div>"#,
        );
        let sel = Selector::parse("div.margintpless").unwrap();
        let panel = doc.select(&sel).next().unwrap();
        assert_eq!(
            usage_row(panel),
            vec!["Toyota", "Corolla", "2010-2015", "1.6 VVT-i", "Front axle, left side"]
        );
    }

    #[test]
    fn trailing_element_text_is_used() {
        let doc = Html::parse_document(
            r#"<div class="p">
                 <h5 class="panel-title"><span class="tooltips">A » B » C</span></h5>
                 <table><tr><td><span>E</span><i> last  bit </i></td></tr></table>
               </div>"#,
        );
        let sel = Selector::parse("div.p").unwrap();
        let rows = usage_rows(doc.root_element(), &sel);
        assert_eq!(rows, vec![vec!["A", "B", "C", "E", "last bit"]]);
    }

    #[test]
    fn layout_table_around_panel_is_ignored() {
        let doc = Html::parse_document(
            r#"<table><tr><td>
                 <div class="margintpless">
                   <h5 class="panel-title"><span class="tooltips">A » B » C</span></h5>
                   <table><tr><td><span>E</span>desc</td></tr></table>
                 </div>
               </td></tr></table>"#,
        );
        let sel = Selector::parse("div.margintpless").unwrap();
        let rows = usage_rows(doc.root_element(), &sel);
        assert_eq!(rows, vec![vec!["A", "B", "C", "E", "desc"]]);
    }
}
