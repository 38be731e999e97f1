use crate::error::Result;
use crate::fonts::{ELLIPSIS, FontBook, FontEntry, FontStyle};
use crate::model::{Alignment, BLACK, Color};
use crate::surface::{Surface, TextRun};

const FIT_EPSILON: f32 = 0.01;

#[derive(Clone, Copy, Debug)]
enum Token<'a> {
    Word(&'a str),
    Break,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowLine {
    pub text: String,
    pub width: f32,
}

#[derive(Debug)]
pub struct FlowResult {
    pub lines: Vec<FlowLine>,
    /// False when text was left over after the last permitted line.
    pub complete: bool,
}

/// A single attempt at flowing text into a box of fixed width.
///
/// An attempt is not restartable: [`TextFlow::fill`] consumes it, and the
/// token queue it leaves behind is partially rewritten by word splitting.
/// Every simulation must start from a fresh `TextFlow::new`.
pub struct TextFlow<'a> {
    font: &'a FontEntry,
    font_size: f32,
    width: f32,
    tokens: Vec<Token<'a>>,
}

impl<'a> TextFlow<'a> {
    pub fn new(font: &'a FontEntry, text: &'a str, font_size: f32, width: f32) -> Self {
        let mut tokens = Vec::new();
        for (i, paragraph) in text.trim_end_matches('\n').split('\n').enumerate() {
            if i > 0 {
                tokens.push(Token::Break);
            }
            tokens.extend(paragraph.split_whitespace().map(Token::Word));
        }
        Self {
            font,
            font_size,
            width,
            tokens,
        }
    }

    /// Greedily fill at most `max_lines` lines.
    pub fn fill(mut self, max_lines: usize) -> FlowResult {
        let space_w = self.font.space_width(self.font_size);
        let mut lines: Vec<FlowLine> = Vec::new();
        let mut line = String::new();
        let mut line_w = 0.0f32;
        let mut idx = 0usize;

        while idx < self.tokens.len() && lines.len() < max_lines {
            match self.tokens[idx] {
                Token::Break => {
                    lines.push(FlowLine {
                        text: std::mem::take(&mut line),
                        width: line_w,
                    });
                    line_w = 0.0;
                    idx += 1;
                }
                Token::Word(word) => {
                    let ww = self.font.text_width(word, self.font_size);
                    if line.is_empty() {
                        if ww <= self.width + FIT_EPSILON {
                            line.push_str(word);
                            line_w = ww;
                            idx += 1;
                        } else {
                            // Too wide for an empty line: break inside the word.
                            let split = self.split_point(word);
                            let head = &word[..split];
                            lines.push(FlowLine {
                                text: head.to_string(),
                                width: self.font.text_width(head, self.font_size),
                            });
                            self.tokens[idx] = Token::Word(&word[split..]);
                        }
                    } else if line_w + space_w + ww <= self.width + FIT_EPSILON {
                        line.push(' ');
                        line.push_str(word);
                        line_w += space_w + ww;
                        idx += 1;
                    } else {
                        lines.push(FlowLine {
                            text: std::mem::take(&mut line),
                            width: line_w,
                        });
                        line_w = 0.0;
                    }
                }
            }
        }

        let mut complete = idx >= self.tokens.len();
        if !line.is_empty() || lines.is_empty() {
            if lines.len() < max_lines {
                lines.push(FlowLine {
                    text: line,
                    width: line_w,
                });
            } else {
                complete = false;
            }
        }
        FlowResult { lines, complete }
    }

    /// Byte offset of the longest prefix of `word` that fits the width,
    /// never less than one character.
    fn split_point(&self, word: &str) -> usize {
        let mut used = 0.0f32;
        let mut split = 0usize;
        for (offset, ch) in word.char_indices() {
            let cw = self.font.char_width_1000(ch) * self.font_size / 1000.0;
            if split > 0 && used + cw > self.width + FIT_EPSILON {
                break;
            }
            used += cw;
            split = offset + ch.len_utf8();
        }
        split
    }
}

#[derive(Clone, Debug)]
pub struct TextParams<'a> {
    pub text: &'a str,
    pub font: FontStyle,
    pub font_size: f32,
    pub color: Color,
    pub width: f32,
    pub line_pitch: f32,
    /// Extra downward shift of every baseline, to keep descenders inside.
    pub y_offset: f32,
    pub alignment: Alignment,
    pub max_height: Option<f32>,
}

impl<'a> TextParams<'a> {
    pub fn new(text: &'a str, font_size: f32, width: f32) -> Self {
        Self {
            text,
            font: FontStyle::REGULAR,
            font_size,
            color: BLACK,
            width,
            line_pitch: font_size * 1.2,
            y_offset: 0.0,
            alignment: Alignment::Left,
            max_height: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextBox {
    pub surface: Surface,
    pub lines: usize,
    pub clipped: bool,
}

/// Find the smallest number of lines `params.text` fits in and render it
/// into a surface exactly that tall. With a maximum height the text is cut
/// after the last line that fits and an ellipsis marks the cut.
pub fn layout_text(fonts: &FontBook, params: &TextParams) -> Result<TextBox> {
    let font = fonts.get(params.font);
    let fits = |lines: usize| {
        params
            .max_height
            .is_none_or(|max| lines as f32 * params.line_pitch <= max + FIT_EPSILON)
    };

    let mut lines = 1usize;
    let mut clipped = false;
    loop {
        let attempt = TextFlow::new(font, params.text, params.font_size, params.width).fill(lines);
        if attempt.complete {
            break;
        }
        if !fits(lines + 1) {
            clipped = true;
            break;
        }
        lines += 1;
    }

    let flow = TextFlow::new(font, params.text, params.font_size, params.width).fill(lines);
    let mut surface = Surface::new(params.width.max(0.0), lines as f32 * params.line_pitch)?;

    let baseline0 = (params.line_pitch - params.font_size) / 2.0
        + params.font_size * font.ascender_ratio()
        + params.y_offset;
    for (i, line) in flow.lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let x = match params.alignment {
            Alignment::Left => 0.0,
            Alignment::Center => (params.width - line.width) / 2.0,
            Alignment::Right => params.width - line.width,
        };
        surface.draw_text(
            x,
            baseline0 + i as f32 * params.line_pitch,
            TextRun {
                text: line.text.clone(),
                font: params.font,
                size: params.font_size,
                color: params.color,
                anchor: Alignment::Left,
                rotation: 0.0,
            },
        );
    }

    if clipped {
        let ellipsis_w = font.char_width_1000(ELLIPSIS) * params.font_size / 1000.0;
        let last_baseline = baseline0 + (lines - 1) as f32 * params.line_pitch;
        surface.draw_text(
            (params.width - ellipsis_w).max(0.0),
            last_baseline + params.font_size * 0.15,
            TextRun {
                text: ELLIPSIS.to_string(),
                font: params.font,
                size: params.font_size,
                color: params.color,
                anchor: Alignment::Left,
                rotation: 0.0,
            },
        );
    }

    log::trace!(
        "layout_text: width={:.1} lines={} clipped={}",
        params.width,
        lines,
        clipped
    );

    Ok(TextBox {
        surface,
        lines,
        clipped,
    })
}
