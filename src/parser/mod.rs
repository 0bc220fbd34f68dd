pub mod jikiu;
pub mod table;
pub mod usage;

use std::collections::HashSet;

use scraper::{ElementRef, Selector};

pub use jikiu::JikiuExtractor;

/// One extracted row: cell texts in left-to-right order.
pub type Row = Vec<String>;

/// Everything pulled out of one product page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedItem {
    pub image_url: Option<String>,
    /// (parameter, value)
    pub specification: Vec<Row>,
    /// (owner, number)
    pub analogs: Vec<Row>,
    /// (brand, part, type)
    pub subassemblies: Vec<Row>,
    /// (number)
    pub couplings: Vec<Row>,
    /// (brand, model, years, engine, description)
    pub usages: Vec<Row>,
}

/// Site-specific markup knowledge. One implementation per supported brand.
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &str) -> ExtractedItem;
}

/// Drop rows that came out with no fields at all.
pub(crate) fn non_empty(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().filter(|r| !r.is_empty()).collect()
}

/// Chained descendant lookup. Each step matches one compound selector against
/// descendants of the previous step's results only, so nothing above `scope`
/// can satisfy a step. Results are unique and in document order.
pub(crate) fn find_chain<'a>(scope: ElementRef<'a>, steps: &[&Selector]) -> Vec<ElementRef<'a>> {
    let mut found = vec![scope];
    for step in steps {
        let parents: HashSet<_> = found.iter().map(|el| el.id()).collect();
        found = scope
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| step.matches(el) && el.ancestors().any(|a| parents.contains(&a.id())))
            .collect();
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn chain_ignores_matches_above_scope() {
        let doc = Html::parse_document(
            r#"<div class="outer"><section id="scope"><table><tbody><tr><td>x</td></tr></tbody></table></section></div>"#,
        );
        let scope = doc.select(&sel("#scope")).next().unwrap();
        let (outer, table) = (sel(".outer"), sel("table"));
        assert!(find_chain(scope, &[&outer, &table]).is_empty());
        assert_eq!(find_chain(scope, &[&table]).len(), 1);
    }

    #[test]
    fn chain_returns_nested_matches_once() {
        let doc = Html::parse_document(
            "<div id=\"s\"><table><tbody><tr><td>
               <table><tbody><tr><td>inner</td></tr></tbody></table>
             </td></tr></tbody></table></div>",
        );
        let scope = doc.select(&sel("#s")).next().unwrap();
        let (table, tbody, tr) = (sel("table"), sel("tbody"), sel("tr"));
        let rows = find_chain(scope, &[&table, &tbody, &tr]);
        assert_eq!(rows.len(), 2);
    }
}
