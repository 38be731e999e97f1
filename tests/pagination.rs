mod common;

use common::{RecordingDocument, block, labeled, lateral_block, small_page};
use lateral_report::model::{Alignment, Block, PageOrder};
use lateral_report::pagination::{BlockSource, EngineConfig, ReportEngine, ReportSource};
use lateral_report::{Error, Result};

fn engine(order: PageOrder) -> ReportEngine<RecordingDocument> {
    let _ = env_logger::try_init();
    ReportEngine::new(
        RecordingDocument::new(small_page()),
        EngineConfig {
            page_order: order,
            ..EngineConfig::default()
        },
    )
}

/// Five two-slot rows of 50pt: three fit the first page, two the second.
fn two_slot_rows() -> Vec<Block> {
    (0..5)
        .map(|i| lateral_block(&[&format!("r{i}a"), &format!("r{i}b")], 50.0))
        .collect()
}

fn run(engine: &mut ReportEngine<RecordingDocument>, source: &mut BlockSource) {
    engine.run_report(source).expect("report");
}

#[test]
fn vertical_first_emits_main_pages_before_laterals() {
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(two_slot_rows());
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();
    common::write_trace("vertical_first", &doc);

    assert_eq!(doc.order(), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    assert_eq!(doc.pages[0].texts(), vec!["r0a", "r1a", "r2a"]);
    assert_eq!(doc.pages[1].texts(), vec!["r3a", "r4a"]);
    assert_eq!(doc.pages[2].texts(), vec!["r0b", "r1b", "r2b"]);
    assert_eq!(doc.pages[3].texts(), vec!["r3b", "r4b"]);

    let summary = source.summary().unwrap();
    assert_eq!(summary.vertical_pages, 2);
    assert_eq!(summary.lateral_pages, 2);
    assert_eq!(summary.physical_pages, 4);
    assert_eq!(summary.blocks, 5);
}

#[test]
fn horizontal_first_interleaves_laterals() {
    let mut engine = engine(PageOrder::HorizontalFirst);
    let mut source = BlockSource::new(two_slot_rows());
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();
    common::write_trace("horizontal_first", &doc);

    assert_eq!(doc.order(), vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    assert_eq!(doc.pages[1].texts(), vec!["r0b", "r1b", "r2b"]);
    assert_eq!(doc.pages[3].texts(), vec!["r3b", "r4b"]);
}

#[test]
fn lateral_rows_keep_main_page_positions() {
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(two_slot_rows());
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    let main: Vec<f32> = doc.pages[0].draws.iter().map(|d| d.y).collect();
    let lateral: Vec<f32> = doc.pages[2].draws.iter().map(|d| d.y).collect();
    assert_eq!(main, vec![140.0, 90.0, 40.0]);
    assert_eq!(main, lateral);
}

#[test]
fn lateral_page_without_content_is_skipped() {
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut rows = vec![block("a", 20.0), block("b", 20.0)];
    for row in &mut rows {
        row.push_lateral_surface(None);
    }
    let mut source = BlockSource::new(rows);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    assert_eq!(doc.order(), vec![(1, 1)]);
    assert_eq!(source.summary().unwrap().physical_pages, 1);
}

/// Three-slot row with the given lateral slots present.
fn sparse_row(label: &str, height: f32, second: bool, third: bool) -> Block {
    let mut row = block(label, height);
    row.push_lateral_surface(second.then(|| labeled(&format!("{label}-2"), 100.0, height)));
    row.push_lateral_surface(third.then(|| labeled(&format!("{label}-3"), 100.0, height)));
    row
}

#[test]
fn horizontal_first_skips_empty_lateral_slots() {
    // page 1 has nothing for slot 2, page 2 nothing for slot 3
    let rows = vec![
        sparse_row("r0", 50.0, false, true),
        sparse_row("r1", 50.0, false, true),
        sparse_row("r2", 50.0, false, true),
        sparse_row("r3", 50.0, true, false),
        sparse_row("r4", 50.0, true, false),
    ];
    let mut engine = engine(PageOrder::HorizontalFirst);
    let mut source = BlockSource::new(rows);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();
    common::write_trace("horizontal_first_sparse", &doc);

    assert_eq!(doc.order(), vec![(1, 1), (1, 3), (2, 1), (2, 2)]);
    assert_eq!(doc.pages[1].texts(), vec!["r0-3", "r1-3", "r2-3"]);
    assert_eq!(doc.pages[3].texts(), vec!["r3-2", "r4-2"]);
    let ys: Vec<f32> = doc.pages[1].draws.iter().map(|d| d.y).collect();
    assert_eq!(ys, vec![140.0, 90.0, 40.0]);
    assert_eq!(source.summary().unwrap().physical_pages, 4);
}

#[test]
fn blocks_are_anchored_by_alignment() {
    let rows = [Alignment::Left, Alignment::Center, Alignment::Right]
        .into_iter()
        .map(|alignment| {
            let mut row = block("row", 20.0);
            row.alignment = alignment;
            row.background = Some([0, 0, 255]);
            row
        })
        .collect();
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(rows);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    // 180pt writable width, 100pt surfaces
    let drawn: Vec<f32> = doc.pages[0].draws.iter().map(|d| d.x).collect();
    let filled: Vec<f32> = doc.pages[0].fills.iter().map(|f| f.x).collect();
    assert_eq!(drawn, vec![10.0, 50.0, 90.0]);
    assert_eq!(filled, drawn);
}

#[test]
fn report_header_waits_for_an_unsuppressed_page() {
    let mut rows = two_slot_rows();
    rows[0].suppress_header = true;
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(rows);
    source.report_header = Some(labeled("title", 180.0, 30.0));
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();
    common::write_trace("suppressed_report_header", &doc);

    assert_eq!(doc.order(), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    for page in &doc.pages {
        let texts = page.texts();
        assert_eq!(texts.contains(&"title"), page.vertical == 2, "{page:?}");
    }
    assert_eq!(doc.pages[1].draws[0].y, 160.0);
}

#[test]
fn odd_coloring_skips_uncolored_blocks() {
    let mut uncolored = block("plain", 20.0);
    uncolored.odd_background = None;
    let rows = vec![block("c1", 20.0), uncolored, block("c2", 20.0), block("c3", 20.0)];

    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(rows);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    // c1 odd, plain not counted, c2 even, c3 odd
    let filled: Vec<f32> = doc.pages[0].fills.iter().map(|f| f.y).collect();
    assert_eq!(filled, vec![170.0, 110.0]);
}

#[test]
fn explicit_background_always_painted_and_counted() {
    let mut first = block("a", 20.0);
    first.background = Some([255, 0, 0]);
    let rows = vec![first, block("b", 20.0), block("c", 20.0)];

    let mut engine = ReportEngine::new(
        RecordingDocument::new(small_page()),
        EngineConfig {
            print_odd_backgrounds: false,
            ..EngineConfig::default()
        },
    );
    let mut source = BlockSource::new(rows);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    let fills = &doc.pages[0].fills;
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].color, [255, 0, 0]);
    assert_eq!(fills[0].y, 170.0);
}

#[test]
fn force_new_page_only_breaks_a_used_page() {
    let mut first = block("first", 20.0);
    first.force_new_page = true;
    let mut third = block("third", 20.0);
    third.force_new_page = true;

    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(vec![first, block("second", 20.0), third]);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    assert_eq!(doc.order(), vec![(1, 1), (2, 1)]);
    assert_eq!(doc.pages[0].texts(), vec!["first", "second"]);
    assert_eq!(doc.pages[1].texts(), vec!["third"]);
}

#[test]
fn oversize_block_on_empty_page_is_placed() {
    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(vec![block("huge", 500.0), block("next", 20.0)]);
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    assert_eq!(doc.order(), vec![(1, 1), (2, 1)]);
    assert_eq!(doc.pages[0].texts(), vec!["huge"]);
}

#[test]
fn footer_space_is_reserved() {
    let mut engine = engine(PageOrder::VerticalFirst);
    let rows = (0..4).map(|i| block(&format!("b{i}"), 50.0)).collect();
    let mut source = BlockSource::new(rows);
    source.page_footer = Some(labeled("footer", 180.0, 40.0));
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    assert_eq!(doc.pages[0].texts(), vec!["footer", "b0", "b1"]);
    assert_eq!(doc.pages[0].draws[0].y, 10.0);
    assert_eq!(doc.pages[1].texts(), vec!["footer", "b2", "b3"]);
}

#[test]
fn report_header_repeats_on_first_lateral_pages_only() {
    for order in [PageOrder::VerticalFirst, PageOrder::HorizontalFirst] {
        let mut engine = engine(order);
        let mut source = BlockSource::new(two_slot_rows());
        source.report_header = Some(labeled("title", 180.0, 50.0));
        source.page_header = Some(labeled("captions", 180.0, 10.0));
        run(&mut engine, &mut source);
        let doc = engine.finish().unwrap();

        for page in &doc.pages {
            let texts = page.texts();
            assert_eq!(texts.contains(&"title"), page.vertical == 1, "{order:?} {page:?}");
            assert!(texts.contains(&"captions"));
        }
    }
}

#[test]
fn suppressed_header_is_not_drawn() {
    let mut first = block("a", 20.0);
    first.suppress_header = true;
    first.suppress_footer = true;

    let mut engine = engine(PageOrder::VerticalFirst);
    let mut source = BlockSource::new(vec![first, block("b", 20.0)]);
    source.page_header = Some(labeled("captions", 180.0, 10.0));
    source.page_footer = Some(labeled("footer", 180.0, 10.0));
    run(&mut engine, &mut source);
    let doc = engine.finish().unwrap();

    assert_eq!(doc.pages[0].texts(), vec!["a", "b"]);
}

#[test]
fn second_report_restarts_numbering() {
    let mut engine = engine(PageOrder::HorizontalFirst);
    let mut first = BlockSource::new(two_slot_rows());
    let mut second = BlockSource::new(vec![block("only", 20.0)]);
    run(&mut engine, &mut first);
    run(&mut engine, &mut second);
    let doc = engine.finish().unwrap();
    common::write_trace("two_reports", &doc);

    let pages: Vec<(usize, usize, usize)> = doc
        .pages
        .iter()
        .map(|p| (p.report, p.vertical, p.lateral))
        .collect();
    assert_eq!(
        pages,
        vec![(0, 1, 1), (0, 1, 2), (0, 2, 1), (0, 2, 2), (1, 1, 1)]
    );
    assert_eq!(second.summary().unwrap().report_index, 1);
    assert_eq!(second.summary().unwrap().physical_pages, 1);
}

struct FailingSource;

impl ReportSource for FailingSource {
    fn next_block_list(&mut self) -> Result<Option<Vec<Block>>> {
        Err(Error::Definition("broken source".into()))
    }
}

#[test]
fn failure_poisons_the_engine() {
    let mut engine = engine(PageOrder::VerticalFirst);
    assert!(matches!(engine.run_report(&mut FailingSource), Err(Error::Definition(_))));

    let mut healthy = BlockSource::new(vec![block("a", 20.0)]);
    assert!(matches!(engine.run_report(&mut healthy), Err(Error::Aborted)));
    assert!(matches!(engine.finish(), Err(Error::Aborted)));
}
