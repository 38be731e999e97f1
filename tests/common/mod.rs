#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use lateral_report::fonts::FontStyle;
use lateral_report::model::{Alignment, BLACK, Block, Color, PageGeometry};
use lateral_report::pagination::{DocumentSink, PageInfo};
use lateral_report::surface::{Surface, TextRun};
use lateral_report::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Fill {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Color,
}

#[derive(Debug, Serialize)]
pub struct Draw {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TracePage {
    pub report: usize,
    pub vertical: usize,
    pub lateral: usize,
    pub fills: Vec<Fill>,
    pub draws: Vec<Draw>,
}

impl TracePage {
    pub fn texts(&self) -> Vec<&str> {
        self.draws
            .iter()
            .flat_map(|d| d.texts.iter().map(String::as_str))
            .collect()
    }
}

/// A sink that keeps a readable trace of everything the engine draws.
pub struct RecordingDocument {
    geometry: PageGeometry,
    pub pages: Vec<TracePage>,
}

impl RecordingDocument {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
        }
    }

    /// `(vertical, lateral)` of every page in output order.
    pub fn order(&self) -> Vec<(usize, usize)> {
        self.pages.iter().map(|p| (p.vertical, p.lateral)).collect()
    }
}

impl DocumentSink for RecordingDocument {
    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn new_page(&mut self, page: &PageInfo) -> Result<()> {
        self.pages.push(TracePage {
            report: page.report_index,
            vertical: page.vertical_page,
            lateral: page.lateral_page,
            fills: Vec::new(),
            draws: Vec::new(),
        });
        Ok(())
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) -> Result<()> {
        let page = self.pages.last_mut().expect("fill before first page");
        page.fills.push(Fill {
            x,
            y,
            width,
            height,
            color,
        });
        Ok(())
    }

    fn draw_surface(&mut self, surface: &Surface, x: f32, y: f32) -> Result<()> {
        let page = self.pages.last_mut().expect("draw before first page");
        page.draws.push(Draw {
            x,
            y,
            width: surface.width(),
            height: surface.height(),
            texts: surface.texts().into_iter().map(str::to_string).collect(),
        });
        Ok(())
    }
}

/// 200x200pt page with 10pt margins: 180pt of writable height.
pub fn small_page() -> PageGeometry {
    PageGeometry {
        width: 200.0,
        height: 200.0,
        margin_top: 10.0,
        margin_bottom: 10.0,
        margin_left: 10.0,
        margin_right: 10.0,
    }
}

pub fn labeled(label: &str, width: f32, height: f32) -> Surface {
    let mut surface = Surface::new(width, height).unwrap();
    surface.draw_text(
        0.0,
        height * 0.8,
        TextRun {
            text: label.to_string(),
            font: FontStyle::REGULAR,
            size: 9.0,
            color: BLACK,
            anchor: Alignment::Left,
            rotation: 0.0,
        },
    );
    surface
}

pub fn block(label: &str, height: f32) -> Block {
    Block::new(labeled(label, 100.0, height))
}

/// A block with one surface per label: main page first, then laterals.
pub fn lateral_block(labels: &[&str], height: f32) -> Block {
    let mut block = Block::default();
    let mut slots = labels.iter().map(|l| Some(labeled(l, 100.0, height)));
    block.set_main_surface(slots.next().flatten());
    for slot in slots {
        block.push_lateral_surface(slot);
    }
    block
}

/// Output directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    fs::create_dir_all(&dir).ok();
    dir
}

/// Keep a JSON trace of the pages for inspection after a failing run.
pub fn write_trace(name: &str, doc: &RecordingDocument) {
    let path = output_dir(name).join("trace.json");
    if let Ok(json) = serde_json::to_string_pretty(&doc.pages) {
        fs::write(path, json).ok();
    }
}
