use crate::error::{Error, Result};
use crate::model::{Alignment, Block, PageOrder};

use super::index::{BlockId, PageBlockIndex};
use super::{DocumentSink, PageInfo, ReportSource, ReportSummary};

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub page_order: PageOrder,
    /// Paint `odd_background` behind every other colored block.
    pub print_odd_backgrounds: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_order: PageOrder::VerticalFirst,
            print_odd_backgrounds: true,
        }
    }
}

struct PageState {
    lateral_page: usize,
    header_written: bool,
    footer_written: bool,
    blocks_on_page: usize,
    odd: bool,
    reserved_footer: f32,
    y: f32,
}

impl PageState {
    fn new(lateral_page: usize, top: f32) -> Self {
        Self {
            lateral_page,
            header_written: false,
            footer_written: false,
            blocks_on_page: 0,
            odd: true,
            reserved_footer: 0.0,
            y: top,
        }
    }
}

/// Places blocks on pages of a [`DocumentSink`], one logical report at a
/// time. Several reports may share one document; each restarts its page
/// numbering.
pub struct ReportEngine<D: DocumentSink> {
    sink: D,
    config: EngineConfig,
    blocks: Vec<Block>,
    index: PageBlockIndex,
    report_index: usize,
    reports_run: usize,
    vertical_page: usize,
    max_vertical_page: usize,
    report_header_written: bool,
    physical_pages: usize,
    page: PageState,
    failed: bool,
}

impl<D: DocumentSink> ReportEngine<D> {
    pub fn new(sink: D, config: EngineConfig) -> Self {
        let top = sink.geometry().top();
        Self {
            sink,
            config,
            blocks: Vec::new(),
            index: PageBlockIndex::default(),
            report_index: 0,
            reports_run: 0,
            vertical_page: 1,
            max_vertical_page: 0,
            report_header_written: false,
            physical_pages: 0,
            page: PageState::new(1, top),
            failed: false,
        }
    }

    /// Lay out one complete report. On error the engine is poisoned and the
    /// document must be discarded.
    pub fn run_report(&mut self, source: &mut dyn ReportSource) -> Result<ReportSummary> {
        if self.failed {
            return Err(Error::Aborted);
        }
        let result = self.run_report_inner(source);
        if let Err(ref e) = result {
            log::error!("report {} aborted: {e}", self.report_index);
            self.failed = true;
        }
        result
    }

    /// Hand back the document. Fails if any report failed.
    pub fn finish(self) -> Result<D> {
        if self.failed {
            return Err(Error::Aborted);
        }
        Ok(self.sink)
    }

    fn run_report_inner(&mut self, source: &mut dyn ReportSource) -> Result<ReportSummary> {
        let t0 = std::time::Instant::now();
        source.prepare_report_data()?;

        self.physical_pages = 0;
        self.max_vertical_page = 0;
        if self.reports_run > 0 {
            self.break_report(source)?;
        } else {
            self.report_header_written = false;
            self.create_page(1, 1)?;
        }

        while let Some(list) = source.next_block_list()? {
            for block in list {
                let id = self.blocks.len();
                self.blocks.push(block);
                self.write_block(id, source, false)?;
            }
        }

        match self.config.page_order {
            PageOrder::VerticalFirst => self.replay_lateral_pages(source)?,
            PageOrder::HorizontalFirst => self.flush_lateral_pages(source)?,
        }

        let summary = ReportSummary {
            report_index: self.report_index,
            vertical_pages: self.max_vertical_page,
            lateral_pages: self.max_page_span(),
            physical_pages: self.physical_pages,
            blocks: self.blocks.len(),
        };
        source.report_finished(&summary)?;

        log::info!(
            "report {}: {} blocks on {} pages ({} vertical x {} lateral) in {:.1}ms",
            summary.report_index,
            summary.blocks,
            summary.physical_pages,
            summary.vertical_pages,
            summary.lateral_pages,
            t0.elapsed().as_secs_f64() * 1000.0,
        );

        self.blocks.clear();
        self.index.clear();
        self.reports_run += 1;
        Ok(summary)
    }

    fn page_info(&self) -> PageInfo {
        PageInfo {
            report_index: self.report_index,
            vertical_page: self.vertical_page,
            lateral_page: self.page.lateral_page,
        }
    }

    fn max_page_span(&self) -> usize {
        self.blocks.iter().map(Block::page_span).max().unwrap_or(1)
    }

    fn write_block(
        &mut self,
        id: BlockId,
        source: &mut dyn ReportSource,
        replay: bool,
    ) -> Result<()> {
        let geometry = *self.sink.geometry();
        let (top_margin, h, force_new_page, suppress_header, suppress_footer) = {
            let block = &self.blocks[id];
            (
                block.top_margin,
                block.height(),
                block.force_new_page,
                block.suppress_header,
                block.suppress_footer,
            )
        };

        if self.page.blocks_on_page > 0 {
            self.page.y -= top_margin;
        }

        let overflow = self.page.y - h - self.page.reserved_footer < geometry.margin_bottom;
        if !replay && self.page.blocks_on_page > 0 && (overflow || force_new_page) {
            log::debug!(
                "block {id}: break after page {}.{} (overflow={overflow}, forced={force_new_page})",
                self.vertical_page,
                self.page.lateral_page
            );
            self.break_page(source)?;
        }

        if self.page.blocks_on_page == 0 {
            self.write_page_furniture(source, suppress_header, suppress_footer)?;
        }

        let block = &self.blocks[id];
        let (color, counted) = match (block.background, block.odd_background) {
            (Some(explicit), _) => (Some(explicit), true),
            (None, Some(odd)) => {
                let paint = self.config.print_odd_backgrounds && self.page.odd;
                (paint.then_some(odd), true)
            }
            (None, None) => (None, false),
        };

        let y = self.page.y - h;
        if let Some(surface) = block.surface_for(self.page.lateral_page) {
            let x = match block.alignment {
                Alignment::Left => geometry.margin_left,
                Alignment::Center => {
                    geometry.margin_left + (geometry.writable_width() - surface.width()) / 2.0
                }
                Alignment::Right => geometry.width - geometry.margin_right - surface.width(),
            };
            if let Some(color) = color {
                self.sink.fill_rect(x, y, surface.width(), h, color)?;
            }
            self.sink.draw_surface(surface, x, y)?;
        }

        self.index.insert(self.vertical_page, id);
        self.page.blocks_on_page += 1;
        if counted {
            self.page.odd = !self.page.odd;
        }
        self.page.y = y;
        Ok(())
    }

    fn write_page_furniture(
        &mut self,
        source: &mut dyn ReportSource,
        suppress_header: bool,
        suppress_footer: bool,
    ) -> Result<()> {
        let geometry = *self.sink.geometry();
        let info = self.page_info();

        if !self.report_header_written && !suppress_header {
            self.report_header_written = true;
            if let Some(header) = source.report_header(&info)? {
                let y = self.page.y - header.height();
                self.sink.draw_surface(&header, geometry.margin_left, y)?;
                self.page.y = y;
            }
        }

        if !self.page.header_written && !suppress_header {
            self.page.header_written = true;
            if let Some(header) = source.page_header(&info)? {
                let y = self.page.y - header.height();
                self.sink.draw_surface(&header, geometry.margin_left, y)?;
                self.page.y = y;
            }
        }

        if !self.page.footer_written && !suppress_footer {
            self.page.footer_written = true;
            if let Some(footer) = source.page_footer(&info)? {
                self.sink
                    .draw_surface(&footer, geometry.margin_left, geometry.margin_bottom)?;
                self.page.reserved_footer = footer.height();
            }
        }
        Ok(())
    }

    fn break_page(&mut self, source: &mut dyn ReportSource) -> Result<()> {
        if self.config.page_order == PageOrder::HorizontalFirst {
            self.flush_lateral_pages(source)?;
        }
        self.create_page(self.vertical_page + 1, 1)
    }

    /// Start the next logical report in the same document: new page,
    /// numbering back at 1, report header due again.
    fn break_report(&mut self, source: &mut dyn ReportSource) -> Result<()> {
        if self.config.page_order == PageOrder::HorizontalFirst {
            self.flush_lateral_pages(source)?;
        }
        self.report_index += 1;
        self.report_header_written = false;
        self.create_page(1, 1)
    }

    fn create_page(&mut self, vertical_page: usize, lateral_page: usize) -> Result<()> {
        self.vertical_page = vertical_page;
        self.max_vertical_page = self.max_vertical_page.max(vertical_page);
        self.page = PageState::new(lateral_page, self.sink.geometry().top());
        if lateral_page > 1 && vertical_page == 1 {
            self.report_header_written = false;
        }
        let info = self.page_info();
        log::debug!(
            "new page {}.{} (report {})",
            info.vertical_page,
            info.lateral_page,
            info.report_index
        );
        self.sink.new_page(&info)?;
        self.physical_pages += 1;
        Ok(())
    }

    fn has_content_for(&self, ids: &[BlockId], lateral_page: usize) -> bool {
        ids.iter()
            .any(|&id| self.blocks[id].surface_for(lateral_page).is_some())
    }

    /// Emit the remaining lateral pages of the current vertical page.
    fn flush_lateral_pages(&mut self, source: &mut dyn ReportSource) -> Result<()> {
        let vertical = self.vertical_page;
        let ids = self.index.blocks_on(vertical).to_vec();
        let span = ids
            .iter()
            .map(|&id| self.blocks[id].page_span())
            .max()
            .unwrap_or(1);

        while self.page.lateral_page < span {
            let lateral = self.page.lateral_page + 1;
            if !self.has_content_for(&ids, lateral) {
                log::debug!("page {vertical}.{lateral}: no content, skipped");
                self.page.lateral_page = lateral;
                continue;
            }
            self.create_page(vertical, lateral)?;
            for &id in &ids {
                self.write_block(id, source, true)?;
            }
        }
        Ok(())
    }

    /// Vertical-first: after all main pages, emit lateral page 2 of every
    /// vertical page, then lateral page 3, and so on.
    fn replay_lateral_pages(&mut self, source: &mut dyn ReportSource) -> Result<()> {
        let span = self.max_page_span();
        let verticals: Vec<usize> = self.index.pages().collect();
        for lateral in 2..=span {
            for &vertical in &verticals {
                let ids = self.index.blocks_on(vertical).to_vec();
                if !self.has_content_for(&ids, lateral) {
                    continue;
                }
                self.create_page(vertical, lateral)?;
                for &id in &ids {
                    self.write_block(id, source, true)?;
                }
            }
        }
        Ok(())
    }
}
