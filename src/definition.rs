//! XML report definitions.
//!
//! ```xml
//! <reports page-order="horizontal-first" title="Quarterly">
//!   <page width="842" height="595" margin-left="24"/>
//!   <report title="Sales" page-numbers="true">
//!     <column caption="Region" min-width="80" expandable="true"/>
//!     <column caption="Notes" min-width="200" wrap="wrap"/>
//!     <row><cell>North</cell><cell>Strong quarter</cell></row>
//!   </report>
//! </reports>
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::Node;

use crate::error::{Error, Result};
use crate::fonts::FontBook;
use crate::layout::GridSettings;
use crate::model::{
    Alignment, Cell, CellStyle, Color, Column, Matrix, OddBackground, PageGeometry, TextStyle,
    WrapMode,
};
use crate::pagination::EngineConfig;

/// TrueType files for the document family. All `None` selects the built-in
/// Helvetica metrics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontFiles {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    pub italic: Option<PathBuf>,
    pub bold_italic: Option<PathBuf>,
}

impl FontFiles {
    pub fn load(&self) -> Result<FontBook> {
        match &self.regular {
            Some(regular) => FontBook::from_files(
                regular,
                self.bold.as_deref(),
                self.italic.as_deref(),
                self.bold_italic.as_deref(),
            ),
            None if self.bold.is_some() || self.italic.is_some() || self.bold_italic.is_some() => {
                Err(Error::Definition(
                    "<fonts> needs a regular face when any other face is given".into(),
                ))
            }
            None => Ok(FontBook::helvetica()),
        }
    }

    fn resolve_against(&mut self, dir: &Path) {
        for path in [&mut self.regular, &mut self.bold, &mut self.italic, &mut self.bold_italic]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

/// One `<report>`: a grid and how to present it.
#[derive(Clone, Debug)]
pub struct ReportDefinition {
    pub title: Option<String>,
    pub page_numbers: bool,
    pub grid: GridSettings,
    pub matrix: Matrix,
}

/// A whole definition file: document settings and its reports in order.
#[derive(Clone, Debug)]
pub struct ReportSet {
    pub title: Option<String>,
    pub geometry: PageGeometry,
    pub engine: EngineConfig,
    pub fonts: FontFiles,
    pub reports: Vec<ReportDefinition>,
}

pub fn parse(path: &Path) -> Result<ReportSet> {
    let xml = std::fs::read_to_string(path)?;
    let mut set = parse_str(&xml)?;
    if let Some(dir) = path.parent() {
        set.fonts.resolve_against(dir);
    }
    Ok(set)
}

pub fn parse_str(xml: &str) -> Result<ReportSet> {
    let t0 = std::time::Instant::now();
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().name() != "reports" {
        return Err(Error::Definition(format!(
            "root element is <{}>, expected <reports>",
            root.tag_name().name()
        )));
    }

    let mut engine = EngineConfig::default();
    if let Some(order) = root.attribute("page-order") {
        engine.page_order = order.parse()?;
    }
    if let Some(odd) = bool_attr(root, "odd-backgrounds")? {
        engine.print_odd_backgrounds = odd;
    }

    let mut set = ReportSet {
        title: root.attribute("title").map(str::to_string),
        geometry: PageGeometry::default(),
        engine,
        fonts: FontFiles::default(),
        reports: Vec::new(),
    };

    for node in root.children().filter(Node::is_element) {
        match node.tag_name().name() {
            "page" => set.geometry = parse_page(node)?,
            "fonts" => set.fonts = parse_fonts(node),
            "report" => set.reports.push(parse_report(node)?),
            other => {
                return Err(Error::Definition(format!("unexpected <{other}> in <reports>")));
            }
        }
    }

    log::debug!(
        "parsed {} reports in {:.1}ms",
        set.reports.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    Ok(set)
}

fn invalid(node: Node, attribute: &str, value: &str) -> Error {
    Error::InvalidAttribute {
        element: node.tag_name().name().to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

fn num_attr(node: Node, name: &str) -> Result<Option<f32>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(v) => match v.trim().parse::<f32>() {
            Ok(n) if n.is_finite() && n >= 0.0 => Ok(Some(n)),
            _ => Err(invalid(node, name, v)),
        },
    }
}

fn usize_attr(node: Node, name: &str) -> Result<Option<usize>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(v) => v.trim().parse().map(Some).map_err(|_| invalid(node, name, v)),
    }
}

fn bool_attr(node: Node, name: &str) -> Result<Option<bool>> {
    match node.attribute(name) {
        None => Ok(None),
        Some("true" | "1") => Ok(Some(true)),
        Some("false" | "0") => Ok(Some(false)),
        Some(v) => Err(invalid(node, name, v)),
    }
}

fn enum_attr<T: FromStr<Err = Error>>(node: Node, name: &str) -> Result<Option<T>> {
    node.attribute(name).map(str::parse).transpose()
}

fn color_attr(node: Node, name: &str) -> Result<Option<Color>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(v) => parse_hex_color(v).map(Some).ok_or_else(|| invalid(node, name, v)),
    }
}

/// `#rrggbb` or `rrggbb`.
fn parse_hex_color(val: &str) -> Option<Color> {
    let hex = val.strip_prefix('#').unwrap_or(val);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

fn parse_page(node: Node) -> Result<PageGeometry> {
    let mut g = PageGeometry::default();
    for (name, field) in [
        ("width", &mut g.width),
        ("height", &mut g.height),
        ("margin-top", &mut g.margin_top),
        ("margin-bottom", &mut g.margin_bottom),
        ("margin-left", &mut g.margin_left),
        ("margin-right", &mut g.margin_right),
    ] {
        if let Some(v) = num_attr(node, name)? {
            *field = v;
        }
    }
    if g.writable_width() <= 0.0 || g.writable_height() <= 0.0 {
        return Err(Error::Definition(format!(
            "margins leave no room on a {}x{} page",
            g.width, g.height
        )));
    }
    Ok(g)
}

fn parse_fonts(node: Node) -> FontFiles {
    let path = |name: &str| node.attribute(name).map(PathBuf::from);
    FontFiles {
        regular: path("regular"),
        bold: path("bold"),
        italic: path("italic"),
        bold_italic: path("bold-italic"),
    }
}

fn parse_report(node: Node) -> Result<ReportDefinition> {
    let mut grid = GridSettings::default();
    if let Some(v) = num_attr(node, "line-spacing")? {
        grid.line_spacing = v;
    }
    if let Some(v) = num_attr(node, "cell-padding")? {
        grid.cell_padding = v;
    }
    grid.max_cell_height = num_attr(node, "max-cell-height")?;
    grid.grid_lines = color_attr(node, "grid-lines")?;

    let columns = node
        .children()
        .filter(|n| n.has_tag_name("column"))
        .map(parse_column)
        .collect::<Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(Error::Definition("<report> without any <column>".into()));
    }

    let mut matrix = Matrix::new(columns);
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "column" => {}
            "row" => parse_row(child, &mut matrix)?,
            other => {
                return Err(Error::Definition(format!("unexpected <{other}> in <report>")));
            }
        }
    }

    Ok(ReportDefinition {
        title: node.attribute("title").map(str::to_string),
        page_numbers: bool_attr(node, "page-numbers")?.unwrap_or(false),
        grid,
        matrix,
    })
}

fn parse_column(node: Node) -> Result<Column> {
    let mut style = TextStyle::default();
    if let Some(v) = bool_attr(node, "bold")? {
        style.bold = v;
    }
    if let Some(v) = bool_attr(node, "italic")? {
        style.italic = v;
    }
    if let Some(v) = enum_attr(node, "align")? {
        style.alignment = v;
    }
    if let Some(v) = num_attr(node, "size")? {
        style.font_size = v;
    }
    if let Some(v) = color_attr(node, "color")? {
        style.color = v;
    }

    let mut column = Column::new(
        node.attribute("caption").unwrap_or_default(),
        num_attr(node, "min-width")?.unwrap_or(0.0),
    )
    .with_style(style)
    .with_wrap(enum_attr(node, "wrap")?.unwrap_or_default());
    column.expandable = bool_attr(node, "expandable")?.unwrap_or(false);
    Ok(column)
}

fn parse_cell_style(node: Node) -> Result<CellStyle> {
    Ok(CellStyle {
        bold: bool_attr(node, "bold")?,
        italic: bool_attr(node, "italic")?,
        alignment: enum_attr::<Alignment>(node, "align")?,
        font_size: num_attr(node, "size")?,
        color: color_attr(node, "color")?,
        wrap: enum_attr::<WrapMode>(node, "wrap")?,
    })
}

fn parse_row(node: Node, matrix: &mut Matrix) -> Result<()> {
    let row = matrix.row_count();
    let mut cells: Vec<Option<Cell>> = Vec::with_capacity(matrix.column_count());

    for child in node.children().filter(Node::is_element) {
        let column = cells.len();
        match child.tag_name().name() {
            "cell" => {
                let span = usize_attr(child, "span")?.unwrap_or(1);
                if span == 0 || span > matrix.column_count().saturating_sub(column) {
                    return Err(Error::InvalidColspan { row, column, span });
                }
                let text = child.text().unwrap_or_default().trim();
                cells.push(Some(
                    Cell::text(text)
                        .with_colspan(span)
                        .with_style(parse_cell_style(child)?),
                ));
                cells.extend(std::iter::repeat_n(None, span - 1));
            }
            "empty" => cells.push(None),
            other => {
                return Err(Error::UnknownContent {
                    row,
                    column,
                    element: other.to_string(),
                });
            }
        }
    }

    let id = matrix.push_row(cells)?;
    matrix.set_row_background(id, color_attr(node, "background")?)?;
    let odd = match node.attribute("odd-background") {
        None => OddBackground::Inherit,
        Some("none") => OddBackground::Uncounted,
        Some(_) => OddBackground::Color(color_attr(node, "odd-background")?.unwrap_or_default()),
    };
    matrix.set_row_odd_background(id, odd)?;
    log::trace!("row {row}: {} cells", matrix.column_count());
    Ok(())
}

impl FromStr for ReportSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_str(s)
    }
}

