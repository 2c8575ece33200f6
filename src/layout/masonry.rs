//! Masonry layout: uniform-thickness lines packed along a flow axis.
//!
//! Images are rescaled so every one shares the same cross-axis thickness
//! (row height or column width), then partitioned into lines in input order.
//! Two packing policies exist: the aligned policy breaks a line *before* an
//! image that would not fit, so closed lines never overflow; the justified
//! policy always appends and closes the line once the bound is reached,
//! trimming the trailing image to land exactly on the canvas edge.
//!
//! The whole computation is axis-generic: [`Flow`] maps flow/cross
//! components to width/height, so horizontal rows and vertical columns run
//! through the same code.
//!
//! # Example
//!
//! ```
//! use zenmosaic::{Flow, MasonryConfig, Size};
//!
//! let sources = [Size::new(400, 300), Size::new(300, 300)];
//! let plan = MasonryConfig::new(Flow::Horizontal, 800)
//!     .thickness(120)
//!     .gap(10)
//!     .plan(&sources)
//!     .unwrap();
//!
//! // One row: 120px thick, one gap above and below.
//! assert_eq!(plan.canvas, Size::new(800, 140));
//! ```

use tracing::debug;

use super::{Alignment, CanvasPlan, Flow, ImagePlacement, LayoutError, Rect, Size};
use crate::color::CanvasColor;

/// Masonry layout configuration.
///
/// Constructed once per invocation; `canvas_extent` is the canvas dimension
/// along the flow axis (width for horizontal flow, height for vertical) and
/// must exceed `2 × gap`. The cross-axis canvas dimension is derived from the
/// number of lines the packer produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasonryConfig {
    pub flow: Flow,
    /// Uniform cross-axis thickness. `None` = average source cross dimension.
    pub thickness: Option<u32>,
    pub canvas_extent: u32,
    pub gap: u32,
    pub alignment: Alignment,
    pub background: CanvasColor,
}

impl MasonryConfig {
    /// Create a configuration with the given flow and flow-axis canvas extent.
    pub fn new(flow: Flow, canvas_extent: u32) -> Self {
        Self {
            flow,
            thickness: None,
            canvas_extent,
            gap: 0,
            alignment: Alignment::Justified,
            background: CanvasColor::Transparent,
        }
    }

    /// Set an explicit line thickness (row height / column width).
    pub fn thickness(mut self, px: u32) -> Self {
        self.thickness = Some(px);
        self
    }

    /// Set the spacing between images and canvas edges.
    pub fn gap(mut self, px: u32) -> Self {
        self.gap = px;
        self
    }

    /// Set the line alignment. [`Alignment::Justified`] selects the greedy
    /// packing policy; everything else packs non-greedily.
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the canvas background color.
    pub fn background(mut self, color: CanvasColor) -> Self {
        self.background = color;
        self
    }

    /// Compute the layout plan for the given source dimensions.
    ///
    /// Sources are consumed in order; the plan's placements come back in the
    /// same order. The computation is deterministic and performs no pixel
    /// operations.
    pub fn plan(&self, sources: &[Size]) -> Result<CanvasPlan, LayoutError> {
        self.validate(sources)?;

        let thickness = self.resolved_thickness(sources)?;
        let scaled = normalize(sources, self.flow, thickness)?;
        let policy = PackPolicy::for_alignment(self.alignment);
        let mut lines = pack(scaled, policy, self.flow, self.canvas_extent, self.gap);
        for line in &mut lines {
            resolve_overflow(line, self.flow, self.canvas_extent, self.gap)?;
        }

        let count = lines.len() as u32;
        let cross_extent = count * thickness + (count + 1) * self.gap;
        let canvas = self.flow.size(self.canvas_extent, cross_extent);

        let mut images = Vec::with_capacity(sources.len());
        for (i, line) in lines.iter().enumerate() {
            let cross = self.gap + i as u32 * (thickness + self.gap);
            let mut offset = line_offset(
                line,
                self.flow,
                self.canvas_extent,
                self.gap,
                self.alignment,
            );
            for slot in line {
                let (x, y) = self.flow.point(offset, cross);
                let trim = slot.trimmed.map(|extent| {
                    let kept = self.flow.size(extent, self.flow.cross_of(slot.size));
                    Rect::new(0, 0, kept.width, kept.height)
                });
                images.push(ImagePlacement {
                    source: slot.source,
                    resize_to: slot.size,
                    trim,
                    backdrop: None,
                    x,
                    y,
                });
                offset += slot.extent(self.flow) + self.gap;
            }
        }

        debug!(
            lines = lines.len(),
            thickness,
            canvas_width = canvas.width,
            canvas_height = canvas.height,
            "masonry plan computed"
        );
        Ok(CanvasPlan {
            canvas,
            background: self.background,
            images,
        })
    }

    fn validate(&self, sources: &[Size]) -> Result<(), LayoutError> {
        if sources.is_empty() {
            return Err(LayoutError::NoImages);
        }
        if self.thickness == Some(0) {
            return Err(LayoutError::ZeroThickness);
        }
        if self.canvas_extent as u64 <= 2 * self.gap as u64 {
            return Err(LayoutError::ExtentTooSmall {
                extent: self.canvas_extent,
                gap: self.gap,
            });
        }
        Ok(())
    }

    /// Explicit thickness, or the floored average cross dimension.
    fn resolved_thickness(&self, sources: &[Size]) -> Result<u32, LayoutError> {
        if let Some(px) = self.thickness {
            return Ok(px);
        }
        let mut total = 0u64;
        for (index, &size) in sources.iter().enumerate() {
            let cross = self.flow.cross_of(size);
            if cross == 0 {
                return Err(LayoutError::ZeroSourceDimension { index });
            }
            total += cross as u64;
        }
        Ok((total / sources.len() as u64) as u32)
    }
}

/// A normalized image: original index plus post-rescale dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Slot {
    source: usize,
    /// Dimensions after rescaling to the line thickness.
    size: Size,
    /// Flow-axis extent after overflow trimming, if any.
    trimmed: Option<u32>,
}

impl Slot {
    /// Effective flow-axis extent (post-trim).
    fn extent(&self, flow: Flow) -> u32 {
        self.trimmed.unwrap_or(flow.extent_of(self.size))
    }
}

/// Rescale every source to the target thickness, preserving aspect ratio.
///
/// The flow-axis dimension is floored (integer arithmetic) and clamped to 1
/// so a sliver never vanishes entirely.
fn normalize(sources: &[Size], flow: Flow, thickness: u32) -> Result<Vec<Slot>, LayoutError> {
    sources
        .iter()
        .enumerate()
        .map(|(index, &size)| {
            let cross = flow.cross_of(size);
            let extent = flow.extent_of(size);
            if cross == 0 || extent == 0 {
                return Err(LayoutError::ZeroSourceDimension { index });
            }
            let scaled = ((extent as u64 * thickness as u64) / cross as u64).max(1) as u32;
            Ok(Slot {
                source: index,
                size: flow.size(scaled, thickness),
                trimmed: None,
            })
        })
        .collect()
}

/// How the packer decides where a line ends.
///
/// The two break conditions are deliberately distinct: aligned packing
/// counts the trailing gap *before* tentatively adding an image, justified
/// packing checks the bound only *after* the image is in. They produce
/// different, both-intentional results (exact-fit lines vs.
/// trimmed-to-the-edge lines) and must not be unified.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PackPolicy {
    /// Break before an image that would not fit; closed lines never overflow.
    Aligned,
    /// Always append, close once the bound is reached; overflow is trimmed
    /// afterwards.
    Justified,
}

impl PackPolicy {
    fn for_alignment(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Justified => Self::Justified,
            Alignment::Start | Alignment::Center | Alignment::End => Self::Aligned,
        }
    }
}

/// Packer accumulator: closed lines plus the open line and its gap-seeded
/// running extent.
struct PackerState {
    lines: Vec<Vec<Slot>>,
    line: Vec<Slot>,
    extent: u32,
}

impl PackerState {
    fn new(gap: u32) -> Self {
        Self {
            lines: Vec::new(),
            line: Vec::new(),
            extent: gap,
        }
    }

    fn push(&mut self, slot: Slot, extent: u32, gap: u32) {
        self.extent += extent + gap;
        self.line.push(slot);
    }

    fn close(&mut self, gap: u32) {
        self.lines.push(core::mem::take(&mut self.line));
        self.extent = gap;
    }

    /// Emit the final (possibly partial) line.
    fn finish(mut self) -> Vec<Vec<Slot>> {
        if !self.line.is_empty() {
            self.lines.push(self.line);
        }
        self.lines
    }
}

/// Partition normalized images into lines, preserving input order.
fn pack(
    slots: Vec<Slot>,
    policy: PackPolicy,
    flow: Flow,
    canvas_extent: u32,
    gap: u32,
) -> Vec<Vec<Slot>> {
    let mut state = PackerState::new(gap);
    for slot in slots {
        let extent = slot.extent(flow);
        match policy {
            PackPolicy::Aligned => {
                if state.extent + extent + gap > canvas_extent && !state.line.is_empty() {
                    state.close(gap);
                }
                state.push(slot, extent, gap);
            }
            PackPolicy::Justified => {
                state.push(slot, extent, gap);
                if state.extent + gap >= canvas_extent {
                    state.close(gap);
                }
            }
        }
    }
    state.finish()
}

/// Trim the one image that pushes a line's running extent past the canvas
/// bound down to the exact remaining space.
///
/// Under the justified policy this is the trailing image of every full line;
/// under the aligned policy it can only be a single image too wide for the
/// usable extent, occupying a line of its own. A running extent landing
/// exactly on the bound records no trim.
fn resolve_overflow(
    line: &mut [Slot],
    flow: Flow,
    canvas_extent: u32,
    gap: u32,
) -> Result<(), LayoutError> {
    let mut running = gap;
    for slot in line.iter_mut() {
        let extent = flow.extent_of(slot.size);
        running += extent + gap;
        if running >= canvas_extent {
            let overshoot = running - canvas_extent;
            if overshoot > 0 {
                if overshoot >= extent {
                    return Err(LayoutError::TrimExhausted { index: slot.source });
                }
                debug!(source = slot.source, overshoot, "trimming overflow");
                slot.trimmed = Some(extent - overshoot);
            }
            // The line closes here; at most one image is ever trimmed.
            break;
        }
    }
    Ok(())
}

/// Flow-axis coordinate of a line's first image.
fn line_offset(
    line: &[Slot],
    flow: Flow,
    canvas_extent: u32,
    gap: u32,
    alignment: Alignment,
) -> u32 {
    let total =
        gap * (line.len() as u32 + 1) + line.iter().map(|s| s.extent(flow)).sum::<u32>();
    match alignment {
        Alignment::Start | Alignment::Justified => gap,
        Alignment::End => canvas_extent - total + gap,
        Alignment::Center => (canvas_extent + 2 * gap - total) / 2,
    }
}
