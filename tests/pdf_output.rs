mod common;

use std::rc::Rc;

use lateral_report::definition::parse_str;
use lateral_report::fonts::FontBook;
use lateral_report::layout::LayoutCache;
use lateral_report::model::{PageOrder, WrapMode};
use lateral_report::pagination::{EngineConfig, ReportEngine};
use lateral_report::{Error, GridReport, PdfDocument, render_reports};

fn wide_report(rows: usize) -> String {
    let mut xml = String::from(
        r#"<reports title="Inventory"><page width="300" height="200" margin-top="10" margin-bottom="10" margin-left="10" margin-right="10"/>
<report title="Stock" page-numbers="true">
<column caption="Item" min-width="120" expandable="true"/>
<column caption="Description" min-width="150" wrap="wrap"/>
<column caption="Count" min-width="80"/>
"#,
    );
    for i in 0..rows {
        xml.push_str(&format!(
            "<row><cell>item {i}</cell><cell>a longer description of item {i} that wraps</cell><cell>{i}</cell></row>\n"
        ));
    }
    xml.push_str("</report></reports>");
    xml
}

#[test]
fn renders_a_pdf() {
    let _ = env_logger::try_init();
    let set = parse_str(&wide_report(30)).unwrap();
    let bytes = render_reports(&set).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.windows(5).any(|w| w == b"%%EOF"));

    let out = common::output_dir("renders_a_pdf").join("generated.pdf");
    std::fs::write(out, &bytes).ok();
}

#[test]
fn every_lateral_page_becomes_a_pdf_page() {
    let _ = env_logger::try_init();
    let set = parse_str(&wide_report(30)).unwrap();
    let report = &set.reports[0];
    assert_eq!(report.matrix.columns()[1].wrap, WrapMode::Wrap);

    let fonts = Rc::new(FontBook::helvetica());
    let doc = PdfDocument::new(set.geometry, Rc::clone(&fonts));
    let mut engine = ReportEngine::new(
        doc,
        EngineConfig {
            page_order: PageOrder::HorizontalFirst,
            ..EngineConfig::default()
        },
    );
    let mut cache = LayoutCache::new();
    let mut source = GridReport::new(
        &report.matrix,
        &fonts,
        &mut cache,
        set.geometry.writable_width(),
        0,
    )
    .with_page_numbers(true);
    let summary = engine.run_report(&mut source).unwrap();
    let doc = engine.finish().unwrap();

    assert_eq!(summary.lateral_pages, 2);
    assert!(summary.vertical_pages > 1);
    assert_eq!(doc.page_count(), summary.physical_pages);
    assert_eq!(doc.page_count(), summary.vertical_pages * summary.lateral_pages);

    let order: Vec<(usize, usize)> = doc
        .page_infos()
        .map(|p| (p.vertical_page, p.lateral_page))
        .collect();
    assert_eq!(&order[..4], &[(1, 1), (1, 2), (2, 1), (2, 2)]);

    let bytes = doc.finish().unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn writes_the_output_file() {
    let _ = env_logger::try_init();
    let out = common::output_dir("writes_the_output_file").join("generated.pdf");
    lateral_report::convert_definition_str_to_pdf(&wide_report(3), &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn nothing_to_render() {
    let set = parse_str("<reports/>").unwrap();
    assert!(matches!(render_reports(&set), Err(Error::Definition(_))));
}
