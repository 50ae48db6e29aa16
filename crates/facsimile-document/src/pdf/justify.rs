// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-line text cells with left, centre, right or full justification.
//
// Full justification distributes the slack of a line across its spaces so
// the rendered span equals the cell width minus the inner margins. With a
// single-byte font the `Tw` word-spacing operator does the work; with an
// Identity-H font `Tw` has no effect, so words are shown through a `TJ`
// array with explicit displacements at every gap.

use facsimile_core::error::Result;
use printpdf::{Op, PaintMode, Point, Pt, TextItem};

use super::builder::DocumentBuilder;
use super::font::TextEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    FullJustify,
}

/// Target box in millimetres, top-left origin. A zero width extends the cell
/// to the right margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CellRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellOptions<'a> {
    pub alignment: Alignment,
    /// Stroke the cell border.
    pub outline: bool,
    /// URI annotation over the rendered text.
    pub link: Option<&'a str>,
}

/// Horizontal placement of one line inside its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePlan {
    /// Offset of the first glyph from the cell's left edge.
    pub dx: f64,
    /// Extra advance per gap. Zero unless fully justified.
    pub spacing: f64,
    pub gap_count: usize,
    /// Natural advance width of the text.
    pub natural_width: f64,
}

impl LinePlan {
    /// `gap_count` counts literal spaces, so runs of spaces stretch too.
    pub fn compute(
        width: f64,
        inner_margin: f64,
        natural_width: f64,
        gap_count: usize,
        alignment: Alignment,
    ) -> Self {
        let available = width - 2.0 * inner_margin;
        let (dx, spacing) = match alignment {
            Alignment::Left => (inner_margin, 0.0),
            Alignment::Right => (width - inner_margin - natural_width, 0.0),
            Alignment::Center => ((width - natural_width) / 2.0, 0.0),
            Alignment::FullJustify if gap_count > 0 => (
                inner_margin,
                (available - natural_width) / gap_count as f64,
            ),
            // A lone word keeps its natural width at the left margin.
            Alignment::FullJustify => (inner_margin, available - natural_width),
        };
        Self {
            dx,
            spacing,
            gap_count,
            natural_width,
        }
    }

    /// Whether the spacing is applied at any gap.
    pub fn stretches(&self) -> bool {
        self.gap_count > 0 && self.spacing != 0.0
    }

    /// Span of the rendered text including applied spacing.
    pub fn rendered_width(&self) -> f64 {
        if self.gap_count > 0 {
            self.natural_width + self.spacing * self.gap_count as f64
        } else {
            self.natural_width
        }
    }
}

/// Draw `text` into `rect` and advance the cursor past the cell.
pub fn draw(
    builder: &mut DocumentBuilder,
    rect: CellRect,
    text: &str,
    alignment: Alignment,
) -> Result<LinePlan> {
    draw_with(
        builder,
        rect,
        text,
        CellOptions {
            alignment,
            ..CellOptions::default()
        },
    )
}

pub fn draw_with(
    builder: &mut DocumentBuilder,
    rect: CellRect,
    text: &str,
    options: CellOptions<'_>,
) -> Result<LinePlan> {
    let mut rect = rect;
    if rect.w == 0.0 {
        let page_width = builder.page_size().map(|(w, _)| w).unwrap_or(0.0);
        rect.w = page_width - builder.right_margin() - rect.x;
    }

    if options.outline {
        builder.outline(rect.x, rect.y, rect.w, rect.h)?;
    }

    let gap_count = text.matches(' ').count();
    let plan = LinePlan::compute(
        rect.w,
        builder.cell_margin(),
        builder.string_width(text),
        gap_count,
        options.alignment,
    );

    if !text.is_empty() {
        let k = builder.k();
        let font_size = builder.font_size();
        let baseline = rect.y + 0.5 * rect.h + 0.3 * font_size;
        let origin = Point {
            x: Pt(((rect.x + plan.dx) * k) as f32),
            y: Pt(builder.pdf_y(baseline) as f32),
        };

        builder.push(Op::SaveGraphicsState)?;
        builder.push(builder.fill_color_op())?;
        builder.push(builder.render_mode_op())?;
        match builder.text_encoding() {
            TextEncoding::Narrow => show_narrow(builder, text, &plan, origin)?,
            TextEncoding::Wide => show_wide(builder, text, &plan, origin)?,
        }
        if builder.underline() {
            underline(builder, rect.x + plan.dx, baseline, plan.rendered_width())?;
        }
        builder.push(Op::RestoreGraphicsState)?;

        if let Some(url) = options.link {
            let width = match options.alignment {
                Alignment::FullJustify => rect.w - 2.0 * builder.cell_margin(),
                _ => plan.natural_width,
            };
            builder.add_link(
                rect.x + plan.dx,
                rect.y + 0.5 * rect.h - 0.5 * font_size,
                width,
                font_size,
                url,
            )?;
        }
    }

    builder.set_x(rect.x + rect.w);
    Ok(plan)
}

/// Single-byte path: one `Tj`, with `Tw` applying the spacing at each space
/// and reset straight after.
fn show_narrow(
    builder: &mut DocumentBuilder,
    text: &str,
    plan: &LinePlan,
    origin: Point,
) -> Result<()> {
    let stretched = plan.stretches();
    if stretched {
        let word_spacing = plan.spacing * builder.k();
        builder.push(Op::SetWordSpacing {
            pt: Pt(word_spacing as f32),
        })?;
    }
    let select = builder.select_font();
    let shown = builder.text_item(text);
    builder.push(Op::StartTextSection)?;
    builder.push(select)?;
    builder.push(Op::SetTextCursor { pos: origin })?;
    builder.push(builder.show(vec![shown]))?;
    builder.push(Op::EndTextSection)?;
    if stretched {
        builder.push(Op::SetWordSpacing { pt: Pt(0.0) })?;
    }
    Ok(())
}

/// Multi-byte path: word strings in a `TJ` array separated by the space glyph
/// and a displacement in thousandths of text space.
fn show_wide(
    builder: &mut DocumentBuilder,
    text: &str,
    plan: &LinePlan,
    origin: Point,
) -> Result<()> {
    let select = builder.select_font();
    builder.push(Op::StartTextSection)?;
    builder.push(select)?;
    builder.push(Op::SetWordSpacing { pt: Pt(0.0) })?;
    builder.push(Op::SetTextCursor { pos: origin })?;

    let items = if plan.stretches() {
        let adjust = -(plan.spacing * builder.k()) * 1000.0 / builder.font_size_pt();
        let mut items = Vec::with_capacity(plan.gap_count * 3 + 1);
        for (index, word) in text.split(' ').enumerate() {
            if index > 0 {
                items.push(TextItem::Offset(adjust as f32));
                items.push(builder.text_item(" "));
            }
            if !word.is_empty() {
                items.push(builder.text_item(word));
            }
        }
        items
    } else {
        vec![builder.text_item(text)]
    };
    builder.push(builder.show(items))?;
    builder.push(Op::EndTextSection)
}

fn underline(builder: &mut DocumentBuilder, x: f64, baseline: f64, width: f64) -> Result<()> {
    let (position, thickness) = builder.font().underline_metrics();
    let font_size = builder.font_size();
    let top = baseline - position / 1000.0 * font_size;
    let mut polygon = builder
        .path_rect(x, top, width, thickness / 1000.0 * font_size)
        .to_polygon();
    polygon.mode = PaintMode::Fill;
    builder.push(Op::DrawPolygon { polygon })
}
