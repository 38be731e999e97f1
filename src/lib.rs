pub mod definition;
mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod pagination;
pub mod pdf;
pub mod report;
pub mod surface;

pub use definition::{ReportDefinition, ReportSet};
pub use error::{Error, Result};
pub use pagination::{DocumentSink, EngineConfig, ReportEngine, ReportSource};
pub use pdf::PdfDocument;
pub use report::GridReport;
pub use surface::Surface;

use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use layout::LayoutCache;

/// Lay out every report of `set` into one PDF document.
pub fn render_reports(set: &ReportSet) -> Result<Vec<u8>> {
    if set.reports.is_empty() {
        return Err(Error::Definition("no <report> to render".into()));
    }

    let fonts = Rc::new(set.fonts.load()?);
    let mut doc = PdfDocument::new(set.geometry, Rc::clone(&fonts));
    if let Some(title) = &set.title {
        doc = doc.with_title(title.clone());
    }

    let mut engine = ReportEngine::new(doc, set.engine);
    let mut cache = LayoutCache::new();
    let width = set.geometry.writable_width();
    for (index, report) in set.reports.iter().enumerate() {
        let mut source = GridReport::new(&report.matrix, &fonts, &mut cache, width, index)
            .with_settings(report.grid.clone())
            .with_title(report.title.clone())
            .with_page_numbers(report.page_numbers);
        engine.run_report(&mut source)?;
    }

    engine.finish()?.finish()
}

pub fn convert_definition_to_pdf(input: &Path, output: &Path) -> Result<()> {
    let t0 = Instant::now();
    let set = definition::parse(input)?;
    write_timed(&set, output, t0)
}

pub fn convert_definition_str_to_pdf(xml: &str, output: &Path) -> Result<()> {
    let t0 = Instant::now();
    let set = definition::parse_str(xml)?;
    write_timed(&set, output, t0)
}

/// Render `set` and write it to `output`, logging how long each step took
/// since `t0`.
pub fn write_timed(set: &ReportSet, output: &Path, t0: Instant) -> Result<()> {
    let t_parse = t0.elapsed();

    let bytes = render_reports(set)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_render - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
