use lateral_report::fonts::{ELLIPSIS, FontBook, FontStyle};
use lateral_report::layout::{TextFlow, TextParams, layout_text};
use lateral_report::surface::Command;

const TEXT: &str = "aaaa aaaa aaaa aaaa aaaa aaaa aaaa aaaa aaaa";

fn ellipsis() -> String {
    ELLIPSIS.to_string()
}

#[test]
fn two_words_per_line_at_fifty_points() {
    let fonts = FontBook::helvetica();
    // "aaaa" is 22.24pt at 10pt, a space 2.78pt
    let result = TextFlow::new(fonts.get(FontStyle::REGULAR), TEXT, 10.0, 50.0).fill(usize::MAX);
    assert!(result.complete);
    assert_eq!(result.lines.len(), 5);
    assert_eq!(result.lines[0].text, "aaaa aaaa");
    assert_eq!(result.lines[4].text, "aaaa");
    assert!(result.lines.iter().all(|l| l.width <= 50.0));
}

#[test]
fn fill_reports_leftover_text() {
    let fonts = FontBook::helvetica();
    let result = TextFlow::new(fonts.get(FontStyle::REGULAR), TEXT, 10.0, 50.0).fill(2);
    assert!(!result.complete);
    assert_eq!(result.lines.len(), 2);
}

#[test]
fn newlines_force_line_breaks() {
    let fonts = FontBook::helvetica();
    let params = TextParams::new("one\ntwo\n\nfour\n", 10.0, 500.0);
    let laid_out = layout_text(&fonts, &params).unwrap();
    assert_eq!(laid_out.lines, 4);
    assert_eq!(laid_out.surface.texts(), vec!["one", "two", "four"]);
}

#[test]
fn overlong_word_is_split() {
    let fonts = FontBook::helvetica();
    let result = TextFlow::new(fonts.get(FontStyle::REGULAR), "abcdefghijklmnop", 10.0, 20.0)
        .fill(usize::MAX);
    assert!(result.complete);
    assert!(result.lines.len() > 1);
    assert!(result.lines.iter().all(|l| !l.text.is_empty()));
    let joined: String = result.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(joined, "abcdefghijklmnop");
}

#[test]
fn narrower_box_never_needs_fewer_lines() {
    let fonts = FontBook::helvetica();
    let mut previous = usize::MAX;
    for width in (20..=300).step_by(10) {
        let params = TextParams::new(TEXT, 10.0, width as f32);
        let lines = layout_text(&fonts, &params).unwrap().lines;
        assert!(lines <= previous, "width {width}: {lines} lines after {previous}");
        previous = lines;
    }
    assert_eq!(previous, 1);
}

#[test]
fn surface_height_is_lines_times_pitch() {
    let fonts = FontBook::helvetica();
    let mut params = TextParams::new(TEXT, 10.0, 50.0);
    params.line_pitch = 13.0;
    let laid_out = layout_text(&fonts, &params).unwrap();
    assert_eq!(laid_out.lines, 5);
    assert_eq!(laid_out.surface.height(), 65.0);
    assert_eq!(laid_out.surface.width(), 50.0);
    assert!(!laid_out.clipped);
}

#[test]
fn empty_text_takes_one_line() {
    let fonts = FontBook::helvetica();
    let laid_out = layout_text(&fonts, &TextParams::new("", 10.0, 50.0)).unwrap();
    assert_eq!(laid_out.lines, 1);
    assert!(laid_out.surface.texts().is_empty());
}

#[test]
fn clipped_text_ends_with_ellipsis() {
    let fonts = FontBook::helvetica();
    let mut params = TextParams::new(TEXT, 10.0, 50.0);
    params.line_pitch = 12.0;
    params.max_height = Some(30.0);
    let laid_out = layout_text(&fonts, &params).unwrap();

    assert!(laid_out.clipped);
    assert_eq!(laid_out.lines, 2);
    assert_eq!(laid_out.surface.height(), 24.0);
    let texts = laid_out.surface.texts();
    assert_eq!(texts.last().copied(), Some(ellipsis().as_str()));
}

#[test]
fn fitting_text_has_no_ellipsis() {
    let fonts = FontBook::helvetica();
    let mut params = TextParams::new(TEXT, 10.0, 50.0);
    params.line_pitch = 12.0;
    params.max_height = Some(60.0);
    let laid_out = layout_text(&fonts, &params).unwrap();

    assert!(!laid_out.clipped);
    assert_eq!(laid_out.lines, 5);
    assert!(!laid_out.surface.texts().contains(&ellipsis().as_str()));
}

fn baselines(params: &TextParams) -> Vec<f32> {
    let fonts = FontBook::helvetica();
    let laid_out = layout_text(&fonts, params).unwrap();
    laid_out
        .surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Text { y, .. } => Some(*y),
            _ => None,
        })
        .collect()
}

#[test]
fn y_offset_shifts_every_baseline() {
    let mut params = TextParams::new(TEXT, 10.0, 50.0);
    params.line_pitch = 12.0;
    let plain = baselines(&params);
    params.y_offset = 1.5;
    let shifted = baselines(&params);

    assert_eq!(plain.len(), 5);
    for (a, b) in plain.iter().zip(&shifted) {
        assert!((b - a - 1.5).abs() < 1e-4, "{a} -> {b}");
    }
    let fonts = FontBook::helvetica();
    assert_eq!(layout_text(&fonts, &params).unwrap().surface.height(), 60.0);
}
