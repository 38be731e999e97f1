use std::str::FromStr;

use crate::error::{Error, Result};
use crate::surface::Surface;

pub type Color = [u8; 3];

/// Light gray used for odd rows when a block does not pick its own color.
pub const DEFAULT_ODD_BACKGROUND: Color = [0xEE, 0xEE, 0xEE];
pub const BLACK: Color = [0, 0, 0];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(Error::UnknownAlignment(other.to_string())),
        }
    }
}

/// How a text cell deals with content wider than its column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WrapMode {
    /// Single line, allowed to overflow into neighbouring cells.
    #[default]
    None,
    /// Single line, clipped to the cell with an ellipsis.
    Truncate,
    /// As many lines as needed; the row grows.
    Wrap,
}

impl FromStr for WrapMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(WrapMode::None),
            "truncate" => Ok(WrapMode::Truncate),
            "wrap" => Ok(WrapMode::Wrap),
            other => Err(Error::UnknownWrapMode(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageOrder {
    /// All main pages first, lateral pages replayed afterwards.
    #[default]
    VerticalFirst,
    /// Each main page is followed by its lateral pages.
    HorizontalFirst,
}

impl FromStr for PageOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vertical-first" => Ok(PageOrder::VerticalFirst),
            "horizontal-first" => Ok(PageOrder::HorizontalFirst),
            other => Err(Error::UnknownPageOrder(other.to_string())),
        }
    }
}

/// Physical page size and margins, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PageGeometry {
    /// A4 portrait with half-inch margins.
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin_top: 36.0,
            margin_bottom: 36.0,
            margin_left: 36.0,
            margin_right: 36.0,
        }
    }
}

impl PageGeometry {
    pub fn writable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn writable_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }

    /// Cursor position of an empty page (PDF coordinates, y grows upward).
    pub fn top(&self) -> f32 {
        self.height - self.margin_top
    }
}

/// Fully resolved text attributes of a column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub font_size: f32,
    pub color: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            alignment: Alignment::Left,
            font_size: 9.0,
            color: BLACK,
        }
    }
}

/// Per-cell overrides; every field set here wins over the column's style.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<Alignment>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub wrap: Option<WrapMode>,
}

impl CellStyle {
    pub fn resolve(&self, column: &Column) -> (TextStyle, WrapMode) {
        let base = column.style;
        let style = TextStyle {
            bold: self.bold.unwrap_or(base.bold),
            italic: self.italic.unwrap_or(base.italic),
            alignment: self.alignment.unwrap_or(base.alignment),
            font_size: self.font_size.unwrap_or(base.font_size),
            color: self.color.unwrap_or(base.color),
        };
        (style, self.wrap.unwrap_or(column.wrap))
    }
}

#[derive(Clone, Debug)]
pub struct Column {
    pub caption: String,
    pub style: TextStyle,
    pub min_width: f32,
    pub expandable: bool,
    pub wrap: WrapMode,
}

impl Column {
    pub fn new(caption: impl Into<String>, min_width: f32) -> Self {
        Self {
            caption: caption.into(),
            style: TextStyle::default(),
            min_width,
            expandable: false,
            wrap: WrapMode::None,
        }
    }

    pub fn expandable(mut self) -> Self {
        self.expandable = true;
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Text(String),
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub content: CellContent,
    pub colspan: usize,
    pub style: CellStyle,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: CellContent::Text(text.into()),
            colspan: 1,
            style: CellStyle::default(),
        }
    }

    pub fn with_colspan(mut self, colspan: usize) -> Self {
        self.colspan = colspan;
        self
    }

    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }
}

/// Stable index of a row, assigned when the row is pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub usize);

/// Odd-row coloring policy for a single row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OddBackground {
    /// Use the block default.
    #[default]
    Inherit,
    Color(Color),
    /// The row takes no part in odd/even alternation.
    Uncounted,
}

#[derive(Clone, Copy, Debug, Default)]
struct RowColors {
    background: Option<Color>,
    odd_background: OddBackground,
}

/// A two-dimensional grid of cells with a fixed column count.
#[derive(Clone, Debug, Default)]
pub struct Matrix {
    columns: Vec<Column>,
    rows: Vec<Vec<Option<Cell>>>,
    colors: Vec<RowColors>,
}

impl Matrix {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a row. Its length must equal the column count; `None` entries
    /// mark columns covered by a preceding cell's colspan.
    pub fn push_row(&mut self, cells: Vec<Option<Cell>>) -> Result<RowId> {
        let row = self.rows.len();
        if cells.len() != self.columns.len() {
            return Err(Error::RowWidthMismatch {
                row,
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        let mut covered_until = 0;
        for (column, cell) in cells.iter().enumerate() {
            let Some(cell) = cell else { continue };
            let span = cell.colspan;
            if column < covered_until {
                return Err(Error::OverlappingCell { row, column });
            }
            if span == 0 || span > self.columns.len() - column {
                return Err(Error::InvalidColspan { row, column, span });
            }
            covered_until = column + span;
        }
        self.rows.push(cells);
        self.colors.push(RowColors::default());
        Ok(RowId(row))
    }

    pub fn row(&self, id: RowId) -> Result<&[Option<Cell>]> {
        self.rows
            .get(id.0)
            .map(Vec::as_slice)
            .ok_or(Error::RowOutOfRange {
                row: id.0,
                rows: self.rows.len(),
            })
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> {
        (0..self.rows.len()).map(RowId)
    }

    pub fn set_row_background(&mut self, id: RowId, color: Option<Color>) -> Result<()> {
        self.colors_mut(id)?.background = color;
        Ok(())
    }

    pub fn set_row_odd_background(&mut self, id: RowId, odd: OddBackground) -> Result<()> {
        self.colors_mut(id)?.odd_background = odd;
        Ok(())
    }

    pub fn row_background(&self, id: RowId) -> Option<Color> {
        self.colors.get(id.0).and_then(|c| c.background)
    }

    pub fn row_odd_background(&self, id: RowId) -> OddBackground {
        self.colors
            .get(id.0)
            .map(|c| c.odd_background)
            .unwrap_or_default()
    }

    fn colors_mut(&mut self, id: RowId) -> Result<&mut RowColors> {
        let rows = self.rows.len();
        self.colors
            .get_mut(id.0)
            .ok_or(Error::RowOutOfRange { row: id.0, rows })
    }
}

/// One placement unit for the pagination engine: a surface for the main
/// page plus one optional surface per lateral page.
#[derive(Clone, Debug)]
pub struct Block {
    pub alignment: Alignment,
    pub main_surface: Option<Surface>,
    pub lateral_surfaces: Vec<Option<Surface>>,
    pub top_margin: f32,
    pub odd_background: Option<Color>,
    pub background: Option<Color>,
    pub force_new_page: bool,
    pub suppress_header: bool,
    pub suppress_footer: bool,
}

impl Default for Block {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            main_surface: None,
            lateral_surfaces: Vec::new(),
            top_margin: 0.0,
            odd_background: Some(DEFAULT_ODD_BACKGROUND),
            background: None,
            force_new_page: false,
            suppress_header: false,
            suppress_footer: false,
        }
    }
}

impl Block {
    pub fn new(main: Surface) -> Self {
        Self {
            main_surface: Some(main),
            ..Self::default()
        }
    }

    pub fn set_main_surface(&mut self, surface: Option<Surface>) {
        self.main_surface = surface;
    }

    pub fn push_lateral_surface(&mut self, surface: Option<Surface>) {
        self.lateral_surfaces.push(surface);
    }

    /// Surface for a 1-based lateral page number (1 = main page).
    pub fn surface_for(&self, lateral_page: usize) -> Option<&Surface> {
        match lateral_page {
            0 => None,
            1 => self.main_surface.as_ref(),
            n => self.lateral_surfaces.get(n - 2).and_then(Option::as_ref),
        }
    }

    /// Number of page slots this block spans, main page included.
    pub fn page_span(&self) -> usize {
        1 + self.lateral_surfaces.len()
    }

    /// Tallest surface across all slots, so a row keeps one height on every
    /// lateral page it appears on.
    pub fn height(&self) -> f32 {
        self.main_surface
            .iter()
            .chain(self.lateral_surfaces.iter().flatten())
            .map(Surface::height)
            .fold(0.0, f32::max)
    }
}
