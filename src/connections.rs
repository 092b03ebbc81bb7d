use crate::grid::SpatialGrid;
use crate::settings::LineStyle;

/// A drawable connection between two particles closer than the link distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub distance: f32,
    /// Ids of the source and partner particles
    pub from: u32,
    pub to: u32,
    /// Alpha for drawing, already resolved from the line style
    pub alpha: u8,
}

/// Line alpha for a pair at `distance`
pub fn line_alpha(distance: f32, link_distance: f32, style: LineStyle) -> u8 {
    match style {
        LineStyle::Strong => u8::MAX,
        LineStyle::Faded => {
            if link_distance <= 0.0 {
                return u8::MAX;
            }
            let strength = ((1.0 - distance / link_distance) * 255.0).round();
            strength.clamp(0.0, 255.0) as u8
        }
    }
}

/// Derive every connection in the grid.
///
/// Each particle is visited as a source in flat order and paired with the
/// particles in its 9-cell window. A partner that was already recorded as
/// a source has emitted the line itself, so the pair is skipped.
///
/// With a non-positive `link_distance` the grid is a single cell, every
/// pair is still checked, and no pair qualifies.
pub fn derive_lines(grid: &SpatialGrid, link_distance: f32, style: LineStyle) -> Vec<Line> {
    let offsets = grid.cell_offsets();
    let mut linked_as_source = vec![false; grid.len()];
    let mut lines = Vec::new();

    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let base = offsets[row * grid.cols() + col];
            for (i, particle) in grid.cell(row, col).iter().enumerate() {
                let source = base + i;
                grid.for_each_neighbor(row, col, &offsets, |partner, other| {
                    let distance = particle.distance(other);
                    if distance > 0.0 && distance < link_distance {
                        linked_as_source[source] = true;
                        if !linked_as_source[partner] {
                            lines.push(Line {
                                x1: particle.x,
                                y1: particle.y,
                                x2: other.x,
                                y2: other.y,
                                distance,
                                from: particle.id,
                                to: other.id,
                                alpha: line_alpha(distance, link_distance, style),
                            });
                        }
                    }
                });
            }
        }
    }

    lines
}
