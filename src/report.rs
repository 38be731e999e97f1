//! Tabular report source: a [`Matrix`] laid out with [`GridLayout`] and fed
//! to the pagination engine row by row.

use crate::error::Result;
use crate::fonts::{FontBook, FontStyle};
use crate::layout::{GridLayout, GridSettings, LayoutCache};
use crate::model::{Alignment, BLACK, Block, Matrix};
use crate::pagination::{PageInfo, ReportSource, ReportSummary};
use crate::surface::{Surface, TextRun};

const TITLE_SIZE: f32 = 14.0;
const TITLE_GAP: f32 = 6.0;
const FOOTER_SIZE: f32 = 8.0;

pub struct GridReport<'a> {
    matrix: &'a Matrix,
    fonts: &'a FontBook,
    cache: &'a mut LayoutCache,
    settings: GridSettings,
    page_width: f32,
    report_index: usize,
    title: Option<String>,
    page_numbers: bool,
    blocks: Option<Vec<Block>>,
    captions: Vec<Option<Surface>>,
    summary: Option<ReportSummary>,
}

impl<'a> GridReport<'a> {
    /// `page_width` is the writable width of a page; `report_index` must match
    /// the engine's, so cached layouts of earlier reports are not reused.
    pub fn new(
        matrix: &'a Matrix,
        fonts: &'a FontBook,
        cache: &'a mut LayoutCache,
        page_width: f32,
        report_index: usize,
    ) -> Self {
        Self {
            matrix,
            fonts,
            cache,
            settings: GridSettings::default(),
            page_width,
            report_index,
            title: None,
            page_numbers: false,
            blocks: None,
            captions: Vec::new(),
            summary: None,
        }
    }

    pub fn with_settings(mut self, settings: GridSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_page_numbers(mut self, page_numbers: bool) -> Self {
        self.page_numbers = page_numbers;
        self
    }

    pub fn summary(&self) -> Option<&ReportSummary> {
        self.summary.as_ref()
    }

    fn text_surface(
        &self,
        text: String,
        font: FontStyle,
        size: f32,
        anchor: Alignment,
        gap: f32,
    ) -> Result<Surface> {
        let entry = self.fonts.get(font);
        let pitch = size * 1.2;
        let mut surface = Surface::new(self.page_width, pitch + gap)?;
        let x = match anchor {
            Alignment::Left => 0.0,
            Alignment::Center => self.page_width / 2.0,
            Alignment::Right => self.page_width,
        };
        let baseline = gap + (pitch - size) / 2.0 + size * entry.ascender_ratio();
        surface.draw_text(
            x,
            baseline,
            TextRun {
                text,
                font,
                size,
                color: BLACK,
                anchor,
                rotation: 0.0,
            },
        );
        Ok(surface)
    }
}

impl ReportSource for GridReport<'_> {
    fn prepare_report_data(&mut self) -> Result<()> {
        let layout = GridLayout::new(
            self.matrix,
            self.fonts,
            self.page_width,
            self.settings.clone(),
            self.report_index,
        );
        self.blocks = Some(layout.build_blocks(self.cache)?);
        self.captions = (0..layout.columns().page_count())
            .map(|page| layout.caption_surface(page))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn next_block_list(&mut self) -> Result<Option<Vec<Block>>> {
        Ok(self.blocks.take())
    }

    fn report_header(&mut self, _page: &PageInfo) -> Result<Option<Surface>> {
        let Some(title) = self.title.clone() else {
            return Ok(None);
        };
        // gap goes below the title, so draw it at the top and pad the height
        let mut surface =
            self.text_surface(title, FontStyle::BOLD, TITLE_SIZE, Alignment::Center, 0.0)?;
        surface.set_height(surface.height() + TITLE_GAP)?;
        Ok(Some(surface))
    }

    fn page_header(&mut self, page: &PageInfo) -> Result<Option<Surface>> {
        Ok(self
            .captions
            .get(page.lateral_page - 1)
            .cloned()
            .flatten())
    }

    fn page_footer(&mut self, page: &PageInfo) -> Result<Option<Surface>> {
        if !self.page_numbers {
            return Ok(None);
        }
        let label = if self.captions.len() > 1 {
            format!("Page {}-{}", page.vertical_page, page.lateral_page)
        } else {
            format!("Page {}", page.vertical_page)
        };
        self.text_surface(label, FontStyle::REGULAR, FOOTER_SIZE, Alignment::Right, 2.0)
            .map(Some)
    }

    fn report_finished(&mut self, summary: &ReportSummary) -> Result<()> {
        log::debug!(
            "grid report {}: {} rows, {} cached cells",
            summary.report_index,
            self.matrix.row_count(),
            self.cache.cached_cells()
        );
        self.summary = Some(*summary);
        Ok(())
    }
}
