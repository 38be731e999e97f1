use std::collections::HashMap;

use pdf_writer::{Content, Name, Str};

use crate::fonts::{EmbeddedFont, FontBook, FontStyle};
use crate::model::{Alignment, Color};
use crate::surface::{Command, Surface, TextRun};

fn rgb(color: Color) -> (f32, f32, f32) {
    (
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    )
}

/// Replays recorded surfaces into a PDF content stream.
pub(super) struct Painter<'a> {
    pub(super) fonts: &'a FontBook,
    pub(super) embedded: &'a HashMap<FontStyle, EmbeddedFont>,
}

impl Painter<'_> {
    pub(super) fn fill_rect(
        &self,
        content: &mut Content,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    ) {
        let (r, g, b) = rgb(color);
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.rect(x, y, w, h);
        content.fill_nonzero();
        content.restore_state();
    }

    /// Paint `surface` with its top-left corner at PDF position `(left, top)`.
    pub(super) fn paint(&self, content: &mut Content, surface: &Surface, left: f32, top: f32) {
        if surface.is_clipped() {
            content.save_state();
            content.rect(left, top - surface.height(), surface.width(), surface.height());
            content.clip_nonzero();
            content.end_path();
        }

        for command in surface.commands() {
            match command {
                Command::Text { x, y, run } => self.paint_text(content, run, left + x, top - y),
                Command::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                    color,
                } => {
                    let (r, g, b) = rgb(*color);
                    content.save_state();
                    content.set_line_width(*width);
                    content.set_stroke_rgb(r, g, b);
                    content.move_to(left + x1, top - y1);
                    content.line_to(left + x2, top - y2);
                    content.stroke();
                    content.restore_state();
                }
                Command::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => self.fill_rect(content, left + x, top - y - height, *width, *height, *color),
                Command::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    line_width,
                    color,
                } => {
                    let (r, g, b) = rgb(*color);
                    content.save_state();
                    content.set_line_width(*line_width);
                    content.set_stroke_rgb(r, g, b);
                    content.rect(left + x, top - y - height, *width, *height);
                    content.stroke();
                    content.restore_state();
                }
                Command::Composite { x, y, surface } => {
                    self.paint(content, surface, left + x, top - y);
                }
            }
        }

        if surface.is_clipped() {
            content.restore_state();
        }
    }

    fn paint_text(&self, content: &mut Content, run: &TextRun, x: f32, baseline: f32) {
        let Some(font) = self.embedded.get(&run.font) else {
            log::warn!("no font registered for {:?}, text dropped", run.font);
            return;
        };
        let width = self.fonts.text_width(&run.text, run.font, run.size);
        let shift = match run.anchor {
            Alignment::Left => 0.0,
            Alignment::Center => width / 2.0,
            Alignment::Right => width,
        };
        let (sin, cos) = run.rotation.to_radians().sin_cos();
        let (r, g, b) = rgb(run.color);

        content.set_fill_rgb(r, g, b);
        content.begin_text();
        content.set_font(Name(font.pdf_name.as_bytes()), run.size);
        content.set_text_matrix([cos, sin, -sin, cos, x - shift * cos, baseline - shift * sin]);
        content.show(Str(&font.encode(&run.text)));
        content.end_text();
    }
}
