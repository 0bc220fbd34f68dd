use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::table::region_rows;
use super::usage::usage_rows;
use super::{find_chain, non_empty, ExtractedItem, Extractor};

static PANEL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".productDetail").unwrap());
static IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[data-lightbox="product-image-set"]"#).unwrap());
static SPEC_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".productspec").unwrap());
static APP_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".productapp").unwrap());
static SUBASSEMBLY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".subassembly").unwrap());
static USAGE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.margintpless").unwrap());

/// Product page schema of jikiu.com.
#[derive(Debug, Default, Clone, Copy)]
pub struct JikiuExtractor;

impl Extractor for JikiuExtractor {
    fn extract(&self, document: &str) -> ExtractedItem {
        let doc = Html::parse_document(document);

        // Nothing outside the product detail panel counts.
        let Some(panel) = doc.select(&PANEL_SEL).next() else {
            return ExtractedItem::default();
        };

        let image_url = find_chain(panel, &[&IMAGE_SEL])
            .first()
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string);

        ExtractedItem {
            image_url,
            specification: non_empty(region_rows(panel, &SPEC_SEL, 2)),
            // analogs and couplings share the application table, split by arity
            analogs: non_empty(region_rows(panel, &APP_SEL, 2)),
            couplings: non_empty(region_rows(panel, &APP_SEL, 1)),
            subassemblies: non_empty(region_rows(panel, &SUBASSEMBLY_SEL, 3)),
            usages: non_empty(usage_rows(panel, &USAGE_SEL)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/jikiu_product.html").unwrap()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn product_fixture_groups() {
        let item = JikiuExtractor.extract(&fixture());

        assert_eq!(
            item.image_url.as_deref(),
            Some("https://www.jikiu.com/upload/parts/BH21010.jpg")
        );
        assert_eq!(
            item.specification,
            vec![
                strings(&["Length", "50mm"]),
                strings(&["Inner diameter", "12mm"]),
                strings(&["Weight", "0.4kg"]),
            ]
        );
        assert_eq!(
            item.analogs,
            vec![strings(&["TOYOTA", "48655-02080"]), strings(&["LEMFOERDER", "37019 01"])]
        );
        assert_eq!(item.couplings, vec![strings(&["BH21011"])]);
        assert_eq!(item.subassemblies, vec![strings(&["JIKIU", "BH21012", "Bushing"])]);
        assert_eq!(
            item.usages,
            vec![
                strings(&["TOYOTA", "COROLLA", "2006-2013", "1.6 VVT-i (1ZR-FE)", "Front axle, lower arm"]),
                strings(&["TOYOTA", "AURIS", "2006-2012", "1.4 D-4D (1ND-TV)", "Front axle"]),
            ]
        );
    }

    #[test]
    fn lookups_outside_panel_are_ignored() {
        let item = JikiuExtractor.extract(&fixture());
        // the fixture carries a decoy spec table outside .productDetail
        assert!(item.specification.iter().all(|r| r[0] != "Decoy"));
        assert!(item.image_url.as_deref().is_some_and(|u| !u.contains("decoy")));
    }

    #[test]
    fn wrapper_classes_above_panel_do_not_leak() {
        let html = r#"<div class="productapp"><div class="productDetail">
            <div class="productspec"><table><tbody><tr><td>Length</td><td>50mm</td></tr></tbody></table></div>
        </div></div>"#;
        let item = JikiuExtractor.extract(html);
        assert_eq!(item.specification, vec![strings(&["Length", "50mm"])]);
        assert!(item.analogs.is_empty());
        assert!(item.couplings.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = fixture();
        assert_eq!(JikiuExtractor.extract(&html), JikiuExtractor.extract(&html));
    }

    #[test]
    fn missing_panel_gives_empty_item() {
        let item = JikiuExtractor.extract("<html><body><p>Not found</p></body></html>");
        assert_eq!(item, ExtractedItem::default());
    }

    #[test]
    fn missing_image_is_none() {
        let html = r#"<div class="productDetail">
            <div class="productspec"><table><tbody><tr><td>Length</td><td>50mm</td></tr></tbody></table></div>
        </div>"#;
        let item = JikiuExtractor.extract(html);
        assert!(item.image_url.is_none());
        assert_eq!(item.specification, vec![strings(&["Length", "50mm"])]);
        assert!(item.analogs.is_empty());
        assert!(item.couplings.is_empty());
        assert!(item.subassemblies.is_empty());
        assert!(item.usages.is_empty());
    }
}
