// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flowing text: continue from the cursor, wrap at spaces before the right
// margin, and break on '\n'. Successive calls with different fonts build up
// mixed-style paragraphs.

use facsimile_core::error::Result;

use super::builder::DocumentBuilder;
use super::justify::{Alignment, CellOptions, CellRect, draw_with};

/// Write `text` in lines of height `h`, starting at the cursor.
pub fn write(builder: &mut DocumentBuilder, h: f64, text: &str, link: Option<&str>) -> Result<()> {
    let chars: Vec<char> = text.chars().filter(|&c| c != '\r').collect();
    let page_width = builder.page_size().map(|(w, _)| w).unwrap_or(0.0);
    let line_width = |b: &DocumentBuilder| page_width - b.right_margin() - b.x();
    let max_units = |b: &DocumentBuilder, w: f64| (w - 2.0 * b.cell_margin()) * 1000.0 / b.font_size();

    let mut w = line_width(builder);
    let mut wmax = max_units(builder, w);
    let mut sep: Option<usize> = None;
    let mut start = 0;
    let mut i = 0;
    let mut units = 0.0;
    let mut first_line = true;

    let segment = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            emit_line(builder, w, h, &segment(start, i), link)?;
            i += 1;
            sep = None;
            start = i;
            units = 0.0;
            if first_line {
                builder.set_x(builder.left_margin());
                w = line_width(builder);
                wmax = max_units(builder, w);
                first_line = false;
            }
            continue;
        }
        if c == ' ' {
            sep = Some(i);
        }
        units += f64::from(builder.font().char_width(c));
        if units > wmax {
            match sep {
                None => {
                    if builder.x() > builder.left_margin() {
                        // Nothing fits after the current run: start below.
                        let y = builder.y() + h;
                        builder.set_xy(builder.left_margin(), y);
                        w = line_width(builder);
                        wmax = max_units(builder, w);
                        i += 1;
                        first_line = false;
                        continue;
                    }
                    if i == start {
                        i += 1;
                    }
                    emit_line(builder, w, h, &segment(start, i), link)?;
                }
                Some(space) => {
                    emit_line(builder, w, h, &segment(start, space), link)?;
                    i = space + 1;
                }
            }
            sep = None;
            start = i;
            units = 0.0;
            if first_line {
                builder.set_x(builder.left_margin());
                w = line_width(builder);
                wmax = max_units(builder, w);
                first_line = false;
            }
        } else {
            i += 1;
        }
    }

    if start != chars.len() {
        let width = units / 1000.0 * builder.font_size();
        let rect = CellRect::new(builder.x(), builder.y(), width, h);
        draw_with(
            builder,
            rect,
            &segment(start, chars.len()),
            CellOptions {
                alignment: Alignment::Left,
                outline: false,
                link,
            },
        )?;
    }
    Ok(())
}

/// A wrapped line: drawn at the cursor, then the cursor moves down one line
/// keeping its x.
fn emit_line(
    builder: &mut DocumentBuilder,
    w: f64,
    h: f64,
    text: &str,
    link: Option<&str>,
) -> Result<()> {
    let (x, y) = (builder.x(), builder.y());
    draw_with(
        builder,
        CellRect::new(x, y, w, h),
        text,
        CellOptions {
            alignment: Alignment::Left,
            outline: false,
            link,
        },
    )?;
    builder.set_xy(x, y + h);
    Ok(())
}
