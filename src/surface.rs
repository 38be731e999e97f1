//! Drawable rectangular surfaces.
//!
//! A [`Surface`] records drawing commands instead of rasterizing them, so the
//! same surface can be measured, cached, composited into other surfaces and
//! finally replayed onto a document page. Coordinates are in points with the
//! origin at the top-left corner and y growing downward; text positions are
//! baselines.

use crate::error::{Error, Result};
use crate::fonts::FontStyle;
use crate::model::{Alignment, Color};

#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontStyle,
    pub size: f32,
    pub color: Color,
    /// Which point of the text box `x` refers to.
    pub anchor: Alignment,
    /// Counter-clockwise rotation in degrees around the anchor point.
    pub rotation: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Text {
        x: f32,
        y: f32,
        run: TextRun,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        color: Color,
    },
    Composite {
        x: f32,
        y: f32,
        surface: Surface,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    width: f32,
    height: f32,
    clipped: bool,
    commands: Vec<Command>,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(Error::InvalidSurface { width, height });
        }
        Ok(Self {
            width,
            height,
            clipped: false,
            commands: Vec::new(),
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Shrink or grow the surface after its content is laid out. Content is
    /// kept; whatever falls outside is only hidden if the surface is clipped.
    pub fn set_height(&mut self, height: f32) -> Result<()> {
        if !height.is_finite() || height < 0.0 {
            return Err(Error::InvalidSurface {
                width: self.width,
                height,
            });
        }
        self.height = height;
        Ok(())
    }

    pub fn is_clipped(&self) -> bool {
        self.clipped
    }

    /// Clip everything drawn on this surface to its own rectangle.
    pub fn set_clipped(&mut self, clipped: bool) {
        self.clipped = clipped;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn draw_text(&mut self, x: f32, y: f32, run: TextRun) {
        self.commands.push(Command::Text { x, y, run });
    }

    pub fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color) {
        self.commands.push(Command::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        self.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        line_width: f32,
        color: Color,
    ) {
        self.commands.push(Command::StrokeRect {
            x,
            y,
            width,
            height,
            line_width,
            color,
        });
    }

    /// Draw `other` with its top-left corner at `(x, y)` of this surface.
    pub fn composite(&mut self, other: &Surface, x: f32, y: f32) {
        self.commands.push(Command::Composite {
            x,
            y,
            surface: other.clone(),
        });
    }

    /// Text of every run on this surface and its children, depth first.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_texts(self, &mut out);
        out
    }
}

fn collect_texts<'a>(surface: &'a Surface, out: &mut Vec<&'a str>) {
    for command in &surface.commands {
        match command {
            Command::Text { run, .. } => out.push(run.text.as_str()),
            Command::Composite { surface, .. } => collect_texts(surface, out),
            _ => {}
        }
    }
}
