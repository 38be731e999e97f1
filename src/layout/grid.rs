use std::collections::HashMap;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::fonts::{ELLIPSIS, FontBook, FontStyle};
use crate::model::{
    Alignment, Block, Cell, CellContent, Color, Column, Matrix, OddBackground, RowId, TextStyle,
    WrapMode,
};
use crate::surface::{Surface, TextRun};

use super::text::{TextParams, layout_text};

/// Real column widths and their distribution over lateral pages.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnLayout {
    widths: Vec<f32>,
    pages: Vec<usize>,
    page_starts: Vec<usize>,
}

impl ColumnLayout {
    /// Place columns left to right, opening a new lateral page whenever the
    /// next column's minimum width does not fit the remaining space. Each
    /// page's leftover width is shared out among its expandable columns.
    pub fn compute(columns: &[Column], page_width: f32) -> Self {
        let n = columns.len();
        let mut widths = vec![0.0f32; n];
        let mut pages = vec![0usize; n];
        let mut page_starts = Vec::new();
        if n == 0 {
            return Self {
                widths,
                pages,
                page_starts,
            };
        }
        page_starts.push(0);

        let mut used = 0.0f32;
        let mut page = 0usize;
        let mut start = 0usize;
        for (i, column) in columns.iter().enumerate() {
            let min = column.min_width;
            if i > start && min > page_width - used {
                distribute_leftover(&mut widths, columns, start..i, page_width - used);
                used = 0.0;
                page += 1;
                start = i;
                page_starts.push(i);
            }
            if min > page_width {
                log::warn!(
                    "column {i} ('{}') needs {min:.1}pt but pages are {page_width:.1}pt wide; it will overflow",
                    column.caption
                );
            }
            widths[i] = min;
            pages[i] = page;
            used += min;
        }
        distribute_leftover(&mut widths, columns, start..n, page_width - used);

        log::debug!(
            "column layout: {} columns on {} lateral pages, widths={:?}",
            n,
            page_starts.len(),
            widths
        );

        Self {
            widths,
            pages,
            page_starts,
        }
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    pub fn width(&self, column: usize) -> Option<f32> {
        self.widths.get(column).copied()
    }

    /// 0-based lateral page of a column.
    pub fn page_of(&self, column: usize) -> Option<usize> {
        self.pages.get(column).copied()
    }

    pub fn page_count(&self) -> usize {
        self.page_starts.len()
    }

    pub fn columns_on(&self, page: usize) -> Range<usize> {
        let Some(&start) = self.page_starts.get(page) else {
            return 0..0;
        };
        let end = self
            .page_starts
            .get(page + 1)
            .copied()
            .unwrap_or(self.widths.len());
        start..end
    }

    /// Sum of the real widths on one lateral page.
    pub fn page_width(&self, page: usize) -> f32 {
        self.widths[self.columns_on(page)].iter().sum()
    }

    /// Horizontal offset of a column from the left edge of its page.
    pub fn offset(&self, column: usize) -> Option<f32> {
        let start = self.columns_on(self.page_of(column)?).start;
        Some(self.widths[start..column].iter().sum())
    }

    /// Width of a cell starting at `column` spanning `span` columns. Spans are
    /// cut at the lateral page boundary.
    pub fn span_width(&self, column: usize, span: usize) -> Option<f32> {
        let page_end = self.columns_on(self.page_of(column)?).end;
        let end = column.saturating_add(span.max(1)).min(page_end);
        Some(self.widths[column..end].iter().sum())
    }
}

fn distribute_leftover(widths: &mut [f32], columns: &[Column], range: Range<usize>, leftover: f32) {
    let expandable = columns[range.clone()].iter().filter(|c| c.expandable).count();
    if expandable == 0 || leftover <= 0.0 {
        return;
    }
    let share = (leftover / expandable as f32).floor();
    for i in range.filter(|&i| columns[i].expandable) {
        widths[i] += share;
    }
}

#[derive(Clone, Debug)]
pub struct GridSettings {
    /// Gap added to the font size to get a line pitch.
    pub line_spacing: f32,
    pub cell_padding: f32,
    /// Height cap for wrapped cells; `None` lets rows grow freely.
    pub max_cell_height: Option<f32>,
    pub caption_style: TextStyle,
    /// Color of cell borders and the caption rule; `None` draws no lines.
    pub grid_lines: Option<Color>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            line_spacing: 3.0,
            cell_padding: 2.0,
            max_cell_height: None,
            caption_style: TextStyle {
                bold: true,
                ..TextStyle::default()
            },
            grid_lines: None,
        }
    }
}

/// Memoized row heights and cell surfaces, keyed by report index so several
/// reports written into one document never collide. Nothing is evicted.
#[derive(Default)]
pub struct LayoutCache {
    row_heights: HashMap<(usize, usize), f32>,
    cell_surfaces: HashMap<(usize, usize, usize), Option<Surface>>,
    text_layouts: usize,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the text layout calculator has run.
    pub fn text_layouts(&self) -> usize {
        self.text_layouts
    }

    pub fn cached_rows(&self) -> usize {
        self.row_heights.len()
    }

    pub fn cached_cells(&self) -> usize {
        self.cell_surfaces.len()
    }
}

pub struct GridLayout<'a> {
    matrix: &'a Matrix,
    fonts: &'a FontBook,
    settings: GridSettings,
    columns: ColumnLayout,
    report_index: usize,
}

impl<'a> GridLayout<'a> {
    pub fn new(
        matrix: &'a Matrix,
        fonts: &'a FontBook,
        page_width: f32,
        settings: GridSettings,
        report_index: usize,
    ) -> Self {
        let columns = ColumnLayout::compute(matrix.columns(), page_width);
        Self {
            matrix,
            fonts,
            settings,
            columns,
            report_index,
        }
    }

    pub fn columns(&self) -> &ColumnLayout {
        &self.columns
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn line_pitch(&self, font_size: f32) -> f32 {
        font_size + self.settings.line_spacing
    }

    fn cell_at(&self, row: RowId, column: usize) -> Result<Option<&'a Cell>> {
        let cells = self.matrix.row(row)?;
        match cells.get(column) {
            Some(cell) => Ok(cell.as_ref()),
            None => Err(self.column_out_of_range(row, column)),
        }
    }

    fn column_out_of_range(&self, row: RowId, column: usize) -> Error {
        Error::ColumnOutOfRange {
            row: row.0,
            column,
            columns: self.matrix.column_count(),
        }
    }

    /// Left offset and spanned width of a cell on its lateral page.
    fn cell_box(&self, row: RowId, column: usize, span: usize) -> Result<(f32, f32)> {
        self.columns
            .offset(column)
            .zip(self.columns.span_width(column, span))
            .ok_or_else(|| self.column_out_of_range(row, column))
    }

    /// Height of a row: the tallest of its cells. Served from the cache
    /// after the first call.
    pub fn row_height(&self, cache: &mut LayoutCache, row: RowId) -> Result<f32> {
        let key = (self.report_index, row.0);
        if let Some(&height) = cache.row_heights.get(&key) {
            return Ok(height);
        }

        let cells = self.matrix.row(row)?;
        let mut height = 0.0f32;
        for (column, cell) in cells.iter().enumerate() {
            let Some(cell) = cell else {
                continue;
            };
            let (style, wrap) = cell.style.resolve(&self.matrix.columns()[column]);
            let cell_h = match wrap {
                WrapMode::None | WrapMode::Truncate => self.line_pitch(style.font_size),
                WrapMode::Wrap => self
                    .cell_surface(cache, row, column)?
                    .map_or(self.line_pitch(style.font_size), Surface::height),
            };
            height = height.max(cell_h);
        }

        cache.row_heights.insert(key, height);
        Ok(height)
    }

    /// Pre-rendered surface of a truncated or wrapped cell. `None` for
    /// continuation slots and for cells drawn straight into the row.
    pub fn cell_surface<'c>(
        &self,
        cache: &'c mut LayoutCache,
        row: RowId,
        column: usize,
    ) -> Result<Option<&'c Surface>> {
        let key = (self.report_index, row.0, column);
        if !cache.cell_surfaces.contains_key(&key) {
            let surface = self.generate_cell_surface(row, column, &mut cache.text_layouts)?;
            cache.cell_surfaces.insert(key, surface);
        }
        Ok(cache.cell_surfaces.get(&key).and_then(Option::as_ref))
    }

    fn generate_cell_surface(
        &self,
        row: RowId,
        column: usize,
        text_layouts: &mut usize,
    ) -> Result<Option<Surface>> {
        let Some(cell) = self.cell_at(row, column)? else {
            return Ok(None);
        };
        let (style, wrap) = cell.style.resolve(&self.matrix.columns()[column]);
        let CellContent::Text(text) = &cell.content;
        let (_, width) = self.cell_box(row, column, cell.colspan)?;

        match wrap {
            WrapMode::None => Ok(None),
            WrapMode::Truncate => self.single_line(text, &style, width, true).map(Some),
            WrapMode::Wrap => {
                *text_layouts += 1;
                let pad = self.settings.cell_padding;
                let params = TextParams {
                    text,
                    font: FontStyle::new(style.bold, style.italic),
                    font_size: style.font_size,
                    color: style.color,
                    width: (width - 2.0 * pad).max(0.0),
                    line_pitch: self.line_pitch(style.font_size),
                    y_offset: 0.0,
                    alignment: style.alignment,
                    max_height: self.settings.max_cell_height,
                };
                let laid_out = layout_text(self.fonts, &params)?;
                if laid_out.clipped {
                    log::debug!(
                        "row {} column {column}: wrapped text clipped at {} lines",
                        row.0,
                        laid_out.lines
                    );
                }
                let mut surface = Surface::new(width, laid_out.surface.height())?;
                surface.composite(&laid_out.surface, pad, 0.0);
                Ok(Some(surface))
            }
        }
    }

    /// One line of text in a box of `width`. With `truncate` the surface is
    /// clipped and text that does not fit is cut and ended with an ellipsis.
    fn single_line(
        &self,
        text: &str,
        style: &TextStyle,
        width: f32,
        truncate: bool,
    ) -> Result<Surface> {
        let pad = self.settings.cell_padding;
        let inner = (width - 2.0 * pad).max(0.0);
        let pitch = self.line_pitch(style.font_size);
        let font = FontStyle::new(style.bold, style.italic);
        let entry = self.fonts.get(font);
        let baseline = (pitch - style.font_size) / 2.0 + style.font_size * entry.ascender_ratio();
        let run = |text: String, anchor: Alignment| TextRun {
            text,
            font,
            size: style.font_size,
            color: style.color,
            anchor,
            rotation: 0.0,
        };

        let mut surface = Surface::new(width, pitch)?;
        surface.set_clipped(truncate);

        let text = text.replace('\n', " ");
        let text_w = entry.text_width(&text, style.font_size);
        if !truncate || text_w <= inner {
            let x = match style.alignment {
                Alignment::Left => pad,
                Alignment::Center => width / 2.0,
                Alignment::Right => width - pad,
            };
            surface.draw_text(x, baseline, run(text, style.alignment));
            return Ok(surface);
        }

        let ellipsis_w = entry.char_width_1000(ELLIPSIS) * style.font_size / 1000.0;
        let avail = inner - ellipsis_w;
        let mut prefix = String::new();
        let mut prefix_w = 0.0f32;
        for ch in text.chars() {
            let cw = entry.char_width_1000(ch) * style.font_size / 1000.0;
            if prefix_w + cw > avail {
                break;
            }
            prefix.push(ch);
            prefix_w += cw;
        }
        let prefix = prefix.trim_end().to_string();
        let prefix_w = entry.text_width(&prefix, style.font_size);
        if !prefix.is_empty() {
            surface.draw_text(pad, baseline, run(prefix, Alignment::Left));
        }
        surface.draw_text(pad + prefix_w, baseline, run(ELLIPSIS.to_string(), Alignment::Left));
        Ok(surface)
    }

    /// The row cut into one surface per lateral page; `None` where the row
    /// has no cell on that page.
    pub fn row_surfaces(
        &self,
        cache: &mut LayoutCache,
        row: RowId,
    ) -> Result<Vec<Option<Surface>>> {
        let height = self.row_height(cache, row)?;
        let mut surfaces = Vec::with_capacity(self.columns.page_count());

        for page in 0..self.columns.page_count() {
            let mut surface = Surface::new(self.columns.page_width(page), height)?;
            let mut has_content = false;

            for column in self.columns.columns_on(page) {
                let Some(cell) = self.cell_at(row, column)? else {
                    continue;
                };
                has_content = true;
                let (x, width) = self.cell_box(row, column, cell.colspan)?;

                if let Some(color) = self.settings.grid_lines {
                    surface.stroke_rect(x, 0.0, width, height, 0.5, color);
                }

                match self.cell_surface(cache, row, column)? {
                    Some(cell_surface) => surface.composite(cell_surface, x, 0.0),
                    None => {
                        let (style, _) = cell.style.resolve(&self.matrix.columns()[column]);
                        let CellContent::Text(text) = &cell.content;
                        let line = self.single_line(text, &style, width, false)?;
                        surface.composite(&line, x, 0.0);
                    }
                }
            }

            surfaces.push(has_content.then_some(surface));
        }
        Ok(surfaces)
    }

    /// One block per matrix row, in row order.
    pub fn build_blocks(&self, cache: &mut LayoutCache) -> Result<Vec<Block>> {
        let t0 = std::time::Instant::now();
        let mut blocks = Vec::with_capacity(self.matrix.row_count());

        for row in self.matrix.row_ids() {
            let mut surfaces = self.row_surfaces(cache, row)?.into_iter();
            let mut block = Block::default();
            block.set_main_surface(surfaces.next().flatten());
            for surface in surfaces {
                block.push_lateral_surface(surface);
            }
            block.background = self.matrix.row_background(row);
            match self.matrix.row_odd_background(row) {
                OddBackground::Inherit => {}
                OddBackground::Color(color) => block.odd_background = Some(color),
                OddBackground::Uncounted => block.odd_background = None,
            }
            log::trace!("row {} → block h={:.2}", row.0, block.height());
            blocks.push(block);
        }

        log::debug!(
            "report {}: built {} blocks over {} lateral pages in {:.1}ms ({} text layouts)",
            self.report_index,
            blocks.len(),
            self.columns.page_count(),
            t0.elapsed().as_secs_f64() * 1000.0,
            cache.text_layouts,
        );
        Ok(blocks)
    }

    /// Column captions for one 0-based lateral page, or `None` when the page
    /// does not exist or carries no captions.
    pub fn caption_surface(&self, page: usize) -> Result<Option<Surface>> {
        let range = self.columns.columns_on(page);
        let columns = &self.matrix.columns()[range.clone()];
        if columns.iter().all(|c| c.caption.is_empty()) {
            return Ok(None);
        }

        let style = self.settings.caption_style;
        let height = self.line_pitch(style.font_size);
        let mut surface = Surface::new(self.columns.page_width(page), height)?;
        let widths = &self.columns.widths()[range];
        let mut x = 0.0;
        for (column_def, &width) in columns.iter().zip(widths) {
            let caption_style = TextStyle {
                alignment: column_def.style.alignment,
                ..style
            };
            let cell = self.single_line(&column_def.caption, &caption_style, width, true)?;
            surface.composite(&cell, x, 0.0);
            x += width;
        }
        if let Some(color) = self.settings.grid_lines {
            surface.draw_line(0.0, height, surface.width(), height, 0.75, color);
        }
        Ok(Some(surface))
    }
}
