//! Layout-preserving text rendering of OCR output.
//!
//! Fragments are grouped into lines and placed on a fixed-width character
//! grid at a column proportional to their horizontal position, so the
//! prompt keeps the visual alignment of forms and tables.

use crate::types::TextBox;

/// Render OCR fragments as layout-aware plain text.
///
/// `columns` is the width of the character grid the page is mapped onto.
/// Fragments on the same line are always separated by at least one space.
pub fn to_prompt(boxes: &[TextBox], page_width: u32, columns: usize) -> String {
    let lines = group_lines(boxes);
    let scale = if page_width > 0 {
        columns as f32 / page_width as f32
    } else {
        0.0
    };

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for mut line in lines {
        line.sort_by(|a, b| a.bbox.x.total_cmp(&b.bbox.x));

        let mut text = String::new();
        let mut cursor = 0usize;
        for tb in line {
            let target = (tb.bbox.x.max(0.0) * scale).round() as usize;
            let min_col = if cursor == 0 { 0 } else { cursor + 1 };
            let col = target.max(min_col);
            text.extend(std::iter::repeat(' ').take(col - cursor));
            text.push_str(tb.text.trim());
            cursor = col + tb.text.trim().chars().count();
        }

        let text = text.trim_end();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }

    out.join("\n")
}

/// Group fragments into lines, top to bottom.
///
/// A fragment joins the current line when its vertical center falls inside
/// the line's extent; otherwise it opens a new line.
fn group_lines(boxes: &[TextBox]) -> Vec<Vec<&TextBox>> {
    let mut sorted: Vec<&TextBox> = boxes.iter().filter(|b| !b.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .y
            .total_cmp(&b.bbox.y)
            .then(a.bbox.x.total_cmp(&b.bbox.x))
    });

    let mut lines: Vec<Vec<&TextBox>> = Vec::new();
    let mut extent = (0.0f32, 0.0f32);
    for tb in sorted {
        let center = tb.bbox.center_y();
        match lines.last_mut() {
            Some(line) if center >= extent.0 && center <= extent.1 => {
                extent.1 = extent.1.max(tb.bbox.bottom());
                line.push(tb);
            }
            _ => {
                extent = (tb.bbox.y, tb.bbox.bottom());
                lines.push(vec![tb]);
            }
        }
    }
    lines
}
