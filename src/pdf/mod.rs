mod content;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Result;
use crate::fonts::{EmbeddedFont, FontBook, FontStyle, register_font};
use crate::model::{Color, PageGeometry};
use crate::pagination::{DocumentSink, PageInfo};
use crate::surface::{Command, Surface};

use content::Painter;

enum PageOp {
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Surface {
        x: f32,
        y: f32,
        surface: Surface,
    },
}

struct RecordedPage {
    info: PageInfo,
    ops: Vec<PageOp>,
}

/// A [`DocumentSink`] producing a PDF file.
///
/// Pages are recorded as drawn and only encoded in [`finish`](Self::finish):
/// embedded TrueType fonts are subset, so the glyph set must be known first.
pub struct PdfDocument {
    geometry: PageGeometry,
    fonts: Rc<FontBook>,
    title: Option<String>,
    pages: Vec<RecordedPage>,
}

impl PdfDocument {
    pub fn new(geometry: PageGeometry, fonts: Rc<FontBook>) -> Self {
        Self {
            geometry,
            fonts,
            title: None,
            pages: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Report position of every page, in output order.
    pub fn page_infos(&self) -> impl Iterator<Item = PageInfo> + '_ {
        self.pages.iter().map(|p| p.info)
    }

    fn current_page(&mut self) -> &mut RecordedPage {
        if self.pages.is_empty() {
            log::warn!("drawing before the first page, starting one");
            self.pages.push(RecordedPage {
                info: PageInfo {
                    report_index: 0,
                    vertical_page: 1,
                    lateral_page: 1,
                },
                ops: Vec::new(),
            });
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let t0 = std::time::Instant::now();
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();

        // Phase 1: glyphs per font variant, then embed
        let mut used: HashMap<FontStyle, HashSet<char>> = HashMap::new();
        for page in &self.pages {
            for op in &page.ops {
                if let PageOp::Surface { surface, .. } = op {
                    collect_chars(surface, &mut used);
                }
            }
        }

        let mut embedded: HashMap<FontStyle, EmbeddedFont> = HashMap::new();
        for (i, style) in FontBook::styles().into_iter().enumerate() {
            let Some(chars) = used.get(&style) else {
                continue;
            };
            let font = register_font(
                &mut pdf,
                self.fonts.get(style),
                format!("F{}", i + 1),
                &mut alloc,
                chars,
            )?;
            embedded.insert(style, font);
        }
        let t_fonts = t0.elapsed();

        // Phase 2: content streams
        let painter = Painter {
            fonts: &self.fonts,
            embedded: &embedded,
        };
        let contents: Vec<Content> = self
            .pages
            .iter()
            .map(|page| {
                let mut content = Content::new();
                for op in &page.ops {
                    match op {
                        PageOp::Fill {
                            x,
                            y,
                            width,
                            height,
                            color,
                        } => painter.fill_rect(&mut content, *x, *y, *width, *height, *color),
                        PageOp::Surface { x, y, surface } => {
                            painter.paint(&mut content, surface, *x, *y + surface.height())
                        }
                    }
                }
                content
            })
            .collect();
        let t_content = t0.elapsed();

        // Phase 3: page tree
        let n = contents.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let info_id = alloc();

        for (i, c) in contents.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        let mut font_pairs: Vec<(&str, Ref)> = embedded
            .values()
            .map(|f| (f.pdf_name.as_str(), f.font_ref))
            .collect();
        font_pairs.sort_by(|a, b| a.0.cmp(b.0));

        let g = self.geometry;
        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, g.width, g.height))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }

        {
            let mut info = pdf.document_info(info_id);
            info.producer(TextStr(concat!("lateral-report ", env!("CARGO_PKG_VERSION"))));
            if let Some(title) = &self.title {
                info.title(TextStr(title));
            }
        }

        let t_assembly = t0.elapsed();
        log::info!(
            "PDF phases: font_embed={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages)",
            t_fonts.as_secs_f64() * 1000.0,
            (t_content - t_fonts).as_secs_f64() * 1000.0,
            (t_assembly - t_content).as_secs_f64() * 1000.0,
            n,
        );

        Ok(pdf.finish())
    }
}

fn collect_chars(surface: &Surface, used: &mut HashMap<FontStyle, HashSet<char>>) {
    for command in surface.commands() {
        match command {
            Command::Text { run, .. } => used.entry(run.font).or_default().extend(run.text.chars()),
            Command::Composite { surface, .. } => collect_chars(surface, used),
            _ => {}
        }
    }
}

impl DocumentSink for PdfDocument {
    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn new_page(&mut self, page: &PageInfo) -> Result<()> {
        self.pages.push(RecordedPage {
            info: *page,
            ops: Vec::new(),
        });
        Ok(())
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> Result<()> {
        self.current_page().ops.push(PageOp::Fill {
            x,
            y,
            width,
            height,
            color,
        });
        Ok(())
    }

    fn draw_surface(&mut self, surface: &Surface, x: f32, y: f32) -> Result<()> {
        self.current_page().ops.push(PageOp::Surface {
            x,
            y,
            surface: surface.clone(),
        });
        Ok(())
    }
}
