//! Distribution of blocks over main and lateral pages.

mod engine;
mod index;

pub use engine::{EngineConfig, ReportEngine};
pub use index::{BlockId, PageBlockIndex};

use crate::error::Result;
use crate::model::{Block, Color, PageGeometry};
use crate::surface::Surface;

/// Where a page sits in the report: `lateral_page` 1 is the main page,
/// 2 the first page to its right, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub report_index: usize,
    pub vertical_page: usize,
    pub lateral_page: usize,
}

/// Totals that are only known once a report has been laid out completely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub report_index: usize,
    pub vertical_pages: usize,
    pub lateral_pages: usize,
    pub physical_pages: usize,
    pub blocks: usize,
}

/// The physical output. Positions are PDF-style: points from the bottom-left
/// corner of the page, `(x, y)` naming the bottom-left corner of what is drawn.
pub trait DocumentSink {
    fn geometry(&self) -> &PageGeometry;

    fn new_page(&mut self, page: &PageInfo) -> Result<()>;

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> Result<()>;

    fn draw_surface(&mut self, surface: &Surface, x: f32, y: f32) -> Result<()>;
}

/// Client side of a report: supplies blocks and page furniture.
pub trait ReportSource {
    /// Materialize everything the report needs. Runs before any drawing.
    fn prepare_report_data(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next batch of blocks, `None` once the report is exhausted.
    fn next_block_list(&mut self) -> Result<Option<Vec<Block>>>;

    /// Drawn once per report, above the first block.
    fn report_header(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(None)
    }

    fn page_header(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(None)
    }

    fn page_footer(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(None)
    }

    fn report_finished(&mut self, _summary: &ReportSummary) -> Result<()> {
        Ok(())
    }
}

/// A ready-made source for callers that already hold their blocks.
#[derive(Default)]
pub struct BlockSource {
    blocks: Option<Vec<Block>>,
    pub report_header: Option<Surface>,
    pub page_header: Option<Surface>,
    pub page_footer: Option<Surface>,
    summary: Option<ReportSummary>,
}

impl BlockSource {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks: Some(blocks),
            ..Self::default()
        }
    }

    /// Summary handed to `report_finished`, once the report is done.
    pub fn summary(&self) -> Option<&ReportSummary> {
        self.summary.as_ref()
    }
}

impl ReportSource for BlockSource {
    fn next_block_list(&mut self) -> Result<Option<Vec<Block>>> {
        Ok(self.blocks.take())
    }

    fn report_header(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(self.report_header.clone())
    }

    fn page_header(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(self.page_header.clone())
    }

    fn page_footer(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        Ok(self.page_footer.clone())
    }

    fn report_finished(&mut self, summary: &ReportSummary) -> Result<()> {
        self.summary = Some(*summary);
        Ok(())
    }
}
