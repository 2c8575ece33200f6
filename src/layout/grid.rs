//! Uniform grids: fixed-aspect cells and squares.
//!
//! Every cell has identical dimensions; images are scaled to `cover` the
//! cell (preserve aspect ratio, center-trim the overhang) or, for squares,
//! optionally to fit inside it (`contain`) with a padding backdrop. Cells
//! are filled row-major over a fixed column count; the canvas always spans
//! the configured number of columns, even when fewer images exist.

use tracing::debug;

use super::{Backdrop, CanvasPlan, ImagePlacement, LayoutError, Rect, Size};
use crate::color::CanvasColor;

/// Fixed-aspect grid configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GridConfig {
    pub columns: u32,
    /// Cell width. `None` = smallest source width.
    pub cell_width: Option<u32>,
    /// Cell aspect ratio (width / height).
    pub aspect: f64,
    pub gap: u32,
    pub background: CanvasColor,
}

impl GridConfig {
    /// Create a grid configuration with the given column count.
    pub fn new(columns: u32) -> Self {
        Self {
            columns,
            cell_width: None,
            aspect: 1.0,
            gap: 0,
            background: CanvasColor::Transparent,
        }
    }

    /// Set an explicit cell width.
    pub fn cell_width(mut self, px: u32) -> Self {
        self.cell_width = Some(px);
        self
    }

    /// Set the cell aspect ratio (width / height).
    pub fn aspect(mut self, ratio: f64) -> Self {
        self.aspect = ratio;
        self
    }

    /// Set the spacing between cells and canvas edges.
    pub fn gap(mut self, px: u32) -> Self {
        self.gap = px;
        self
    }

    /// Set the canvas background color.
    pub fn background(mut self, color: CanvasColor) -> Self {
        self.background = color;
        self
    }

    /// Compute the layout plan for the given source dimensions.
    pub fn plan(&self, sources: &[Size]) -> Result<CanvasPlan, LayoutError> {
        let width = match self.cell_width {
            Some(px) => px,
            None => smallest_width(sources)?,
        };
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return Err(LayoutError::ZeroCell);
        }
        let height = (width as f64 / self.aspect).floor() as u32;
        let cell = Size::new(width, height);

        plan_cells(sources, self.columns, cell, self.gap, self.background, |source, origin| {
            let (resize_to, trim) = cover(source, cell);
            ImagePlacement {
                source: 0, // filled in by plan_cells
                resize_to,
                trim,
                backdrop: None,
                x: origin.0,
                y: origin.1,
            }
        })
    }
}

/// How a source fits its square cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Scale to fill the cell, center-trimming the overhang.
    Cover,
    /// Scale to fit inside the cell, centered over a padding backdrop.
    Contain,
}

/// Square grid configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareConfig {
    pub columns: u32,
    /// Cell side length. `None` = smallest source width.
    pub size: Option<u32>,
    pub fit: FitMode,
    /// Backdrop color behind `contain`-fitted images.
    pub padding: CanvasColor,
    pub gap: u32,
    pub background: CanvasColor,
}

impl SquareConfig {
    /// Create a square grid configuration with the given column count.
    pub fn new(columns: u32) -> Self {
        Self {
            columns,
            size: None,
            fit: FitMode::Cover,
            padding: CanvasColor::Transparent,
            gap: 0,
            background: CanvasColor::Transparent,
        }
    }

    /// Set an explicit cell side length.
    pub fn size(mut self, px: u32) -> Self {
        self.size = Some(px);
        self
    }

    /// Set the fit mode.
    pub fn fit(mut self, fit: FitMode) -> Self {
        self.fit = fit;
        self
    }

    /// Set the padding color behind `contain`-fitted images.
    pub fn padding(mut self, color: CanvasColor) -> Self {
        self.padding = color;
        self
    }

    /// Set the spacing between cells and canvas edges.
    pub fn gap(mut self, px: u32) -> Self {
        self.gap = px;
        self
    }

    /// Set the canvas background color.
    pub fn background(mut self, color: CanvasColor) -> Self {
        self.background = color;
        self
    }

    /// Compute the layout plan for the given source dimensions.
    pub fn plan(&self, sources: &[Size]) -> Result<CanvasPlan, LayoutError> {
        let side = match self.size {
            Some(px) => px,
            None => smallest_width(sources)?,
        };
        let cell = Size::new(side, side);

        plan_cells(sources, self.columns, cell, self.gap, self.background, |source, origin| {
            match self.fit {
                FitMode::Cover => {
                    let (resize_to, trim) = cover(source, cell);
                    ImagePlacement {
                        source: 0,
                        resize_to,
                        trim,
                        backdrop: None,
                        x: origin.0,
                        y: origin.1,
                    }
                }
                FitMode::Contain => {
                    let resize_to = contain(source, cell);
                    ImagePlacement {
                        source: 0,
                        resize_to,
                        trim: None,
                        backdrop: Some(Backdrop {
                            rect: Rect::new(origin.0, origin.1, cell.width, cell.height),
                            color: self.padding,
                        }),
                        x: origin.0 + (cell.width - resize_to.width) / 2,
                        y: origin.1 + (cell.height - resize_to.height) / 2,
                    }
                }
            }
        })
    }
}

/// Shared cell walk: validates, lays cells row-major, derives the canvas.
fn plan_cells(
    sources: &[Size],
    columns: u32,
    cell: Size,
    gap: u32,
    background: CanvasColor,
    mut place: impl FnMut(Size, (u32, u32)) -> ImagePlacement,
) -> Result<CanvasPlan, LayoutError> {
    if sources.is_empty() {
        return Err(LayoutError::NoImages);
    }
    if columns == 0 {
        return Err(LayoutError::ZeroColumns);
    }
    if cell.width == 0 || cell.height == 0 {
        return Err(LayoutError::ZeroCell);
    }

    let rows = (sources.len() as u32).div_ceil(columns);
    let canvas = Size::new(
        columns * cell.width + (columns + 1) * gap,
        rows * cell.height + (rows + 1) * gap,
    );

    let mut images = Vec::with_capacity(sources.len());
    for (index, &source) in sources.iter().enumerate() {
        if source.width == 0 || source.height == 0 {
            return Err(LayoutError::ZeroSourceDimension { index });
        }
        let col = index as u32 % columns;
        let row = index as u32 / columns;
        let origin = (
            gap + col * (cell.width + gap),
            gap + row * (cell.height + gap),
        );
        let mut placement = place(source, origin);
        placement.source = index;
        images.push(placement);
    }

    debug!(
        rows,
        columns,
        cell_width = cell.width,
        cell_height = cell.height,
        "grid plan computed"
    );
    Ok(CanvasPlan {
        canvas,
        background,
        images,
    })
}

/// Smallest source width — the dynamic default for cell dimensions.
fn smallest_width(sources: &[Size]) -> Result<u32, LayoutError> {
    sources
        .iter()
        .map(|s| s.width)
        .min()
        .ok_or(LayoutError::NoImages)
}

/// Scale `source` to cover `cell` (both dimensions ≥ the cell), returning
/// the resize target and the centered trim down to the exact cell.
///
/// The constraining axis is picked by cross-multiplication so exact ratio
/// matches never trim; the free axis rounds up to guarantee coverage.
fn cover(source: Size, cell: Size) -> (Size, Option<Rect>) {
    let sw = source.width as u64;
    let sh = source.height as u64;
    if sw * cell.height as u64 >= sh * cell.width as u64 {
        // Source is wider than the cell ratio: height constrains, trim width.
        let rw = (sw * cell.height as u64).div_ceil(sh) as u32;
        let trim = (rw > cell.width)
            .then(|| Rect::new((rw - cell.width) / 2, 0, cell.width, cell.height));
        (Size::new(rw, cell.height), trim)
    } else {
        // Source is taller: width constrains, trim height.
        let rh = (sh * cell.width as u64).div_ceil(sw) as u32;
        let trim = (rh > cell.height)
            .then(|| Rect::new(0, (rh - cell.height) / 2, cell.width, cell.height));
        (Size::new(cell.width, rh), trim)
    }
}

/// Scale `source` to fit inside `cell`, preserving aspect ratio.
/// The free axis is floored and clamped to 1.
fn contain(source: Size, cell: Size) -> Size {
    let sw = source.width as u64;
    let sh = source.height as u64;
    if sw * cell.height as u64 >= sh * cell.width as u64 {
        // Width constrains.
        let rh = ((sh * cell.width as u64) / sw).max(1) as u32;
        Size::new(cell.width, rh)
    } else {
        // Height constrains.
        let rw = ((sw * cell.height as u64) / sh).max(1) as u32;
        Size::new(rw, cell.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Cell fitting ────────────────────────────────────────────────────

    #[test]
    fn cover_trims_the_wider_axis_centered() {
        // 1000×500 into 200×200: height constrains, resize to 400×200,
        // trim 200px centered → x = 100.
        let (resize, trim) = cover(Size::new(1000, 500), Size::new(200, 200));
        assert_eq!(resize, Size::new(400, 200));
        assert_eq!(trim, Some(Rect::new(100, 0, 200, 200)));
    }

    #[test]
    fn cover_trims_the_taller_axis_centered() {
        let (resize, trim) = cover(Size::new(500, 1000), Size::new(200, 200));
        assert_eq!(resize, Size::new(200, 400));
        assert_eq!(trim, Some(Rect::new(0, 100, 200, 200)));
    }

    #[test]
    fn cover_exact_ratio_needs_no_trim() {
        let (resize, trim) = cover(Size::new(800, 600), Size::new(400, 300));
        assert_eq!(resize, Size::new(400, 300));
        assert_eq!(trim, None);
    }

    #[test]
    fn cover_rounds_the_free_axis_up() {
        // 301×300 into 100×100: rw = ceil(301 * 100 / 300) = 101 ≥ 100.
        let (resize, trim) = cover(Size::new(301, 300), Size::new(100, 100));
        assert_eq!(resize, Size::new(101, 100));
        assert_eq!(trim, Some(Rect::new(0, 0, 100, 100)));
    }

    #[test]
    fn contain_fits_inside_the_cell() {
        let fitted = contain(Size::new(1000, 500), Size::new(200, 200));
        assert_eq!(fitted, Size::new(200, 100));
        let fitted = contain(Size::new(500, 1000), Size::new(200, 200));
        assert_eq!(fitted, Size::new(100, 200));
    }

    // ── Grid walk ───────────────────────────────────────────────────────

    #[test]
    fn cells_advance_row_major() {
        let sources = vec![Size::new(100, 100); 5];
        let plan = GridConfig::new(2)
            .cell_width(100)
            .gap(10)
            .plan(&sources)
            .unwrap();
        let origins: Vec<(u32, u32)> = plan.images.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            origins,
            vec![(10, 10), (120, 10), (10, 120), (120, 120), (10, 230)]
        );
        // 2 columns, 3 rows: 2*100 + 3*10 by 3*100 + 4*10.
        assert_eq!(plan.canvas, Size::new(230, 340));
    }

    #[test]
    fn canvas_spans_all_configured_columns() {
        // Fewer images than columns still yields the full-width canvas.
        let plan = GridConfig::new(4)
            .cell_width(100)
            .gap(10)
            .plan(&[Size::new(100, 100)])
            .unwrap();
        assert_eq!(plan.canvas, Size::new(450, 120));
    }

    #[test]
    fn aspect_ratio_floors_cell_height() {
        // 16:9 at width 160 → height floor(160 / (16/9)) = 90.
        let plan = GridConfig::new(1)
            .cell_width(160)
            .aspect(16.0 / 9.0)
            .plan(&[Size::new(320, 180)])
            .unwrap();
        assert_eq!(plan.images[0].resize_to, Size::new(160, 90));
    }

    #[test]
    fn cell_width_defaults_to_smallest_source() {
        let plan = GridConfig::new(1)
            .plan(&[Size::new(300, 300), Size::new(120, 400), Size::new(200, 100)])
            .unwrap();
        // Smallest width is 120; square cells by default aspect.
        assert_eq!(plan.images[0].final_size(), Size::new(120, 120));
    }

    #[test]
    fn zero_columns_is_rejected() {
        assert_eq!(
            GridConfig::new(0).plan(&[Size::new(10, 10)]),
            Err(LayoutError::ZeroColumns)
        );
    }

    #[test]
    fn degenerate_aspect_is_rejected() {
        assert_eq!(
            GridConfig::new(1).aspect(0.0).plan(&[Size::new(10, 10)]),
            Err(LayoutError::ZeroCell)
        );
    }

    // ── Squares ─────────────────────────────────────────────────────────

    #[test]
    fn square_contain_centers_over_a_cell_backdrop() {
        let plan = SquareConfig::new(1)
            .size(200)
            .fit(FitMode::Contain)
            .padding(CanvasColor::white())
            .gap(10)
            .plan(&[Size::new(1000, 500)])
            .unwrap();
        let p = &plan.images[0];
        assert_eq!(p.resize_to, Size::new(200, 100));
        // Centered vertically inside the 200px cell at origin (10, 10).
        assert_eq!((p.x, p.y), (10, 60));
        let backdrop = p.backdrop.as_ref().unwrap();
        assert_eq!(backdrop.rect, Rect::new(10, 10, 200, 200));
        assert_eq!(backdrop.color, CanvasColor::white());
    }

    #[test]
    fn square_cover_trims_to_the_cell() {
        let plan = SquareConfig::new(1)
            .size(200)
            .plan(&[Size::new(1000, 500)])
            .unwrap();
        let p = &plan.images[0];
        assert_eq!(p.final_size(), Size::new(200, 200));
        assert!(p.backdrop.is_none());
    }

    #[test]
    fn square_size_defaults_to_smallest_width() {
        let plan = SquareConfig::new(2)
            .plan(&[Size::new(300, 300), Size::new(150, 90)])
            .unwrap();
        assert_eq!(plan.images[0].final_size(), Size::new(150, 150));
    }
}
