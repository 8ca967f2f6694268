pub mod colormap;
pub mod format;
pub mod norm;
pub mod wrap;

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::Result;

pub use colormap::{parse_color, Colormap, TAB10};
pub use format::format_g;
pub use norm::PowerNorm;
pub use wrap::{wrap_custom, wrap_label};

pub(crate) const FONT_FAMILY: &str = "sans-serif";

pub(crate) fn text_style(size: f64, color: RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    TextStyle {
        font: (FONT_FAMILY, size).into_font(),
        color: color.to_backend_color(),
        pos: Pos::new(h, v),
    }
}

/// Something that can be drawn onto any plotters drawing area.
pub trait Plot {
    type Output;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<Self::Output>;
}

/// Renders `plot` into an image file: SVG for `.svg`, a bitmap otherwise.
pub fn save<P: Plot>(plot: &P, path: impl AsRef<Path>, size: (u32, u32)) -> Result<P::Output> {
    let path = path.as_ref();
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);

    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let out = plot.plot(&root)?;
        root.present()?;
        Ok(out)
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let out = plot.plot(&root)?;
        root.present()?;
        Ok(out)
    }
}
