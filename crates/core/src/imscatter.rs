//! Scatter plot that draws a framed image at every point.

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::render::{Colormap, Plot};

/// Packed 8-bit RGB pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(Error::LengthMismatch {
                left: expected,
                right: rgb.len(),
            });
        }
        Ok(Self { width, height, rgb })
    }

    pub fn solid(width: u32, height: u32, color: RGBColor) -> Self {
        let rgb = [color.0, color.1, color.2].repeat(width as usize * height as usize);
        Self { width, height, rgb }
    }

    /// Nearest-neighbour resampling by `zoom`.
    pub fn zoomed(&self, zoom: f64) -> Image {
        let width = ((self.width as f64 * zoom).round() as u32).max(1);
        let height = ((self.height as f64 * zoom).round() as u32).max(1);
        if (width, height) == (self.width, self.height) {
            return self.clone();
        }
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for row in 0..height {
            let sy = ((row as f64 + 0.5) / zoom) as u32;
            let sy = sy.min(self.height - 1) as usize;
            for col in 0..width {
                let sx = ((col as f64 + 0.5) / zoom) as u32;
                let sx = sx.min(self.width - 1) as usize;
                let at = (sy * self.width as usize + sx) * 3;
                rgb.extend_from_slice(&self.rgb[at..at + 3]);
            }
        }
        Image { width, height, rgb }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameColor {
    Fixed(RGBColor),
    /// Position on the frame colormap, in `[0, 1]`.
    Value(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImScatterOptions {
    pub zoom: f64,
    pub frame_cmap: Colormap,
    /// One per point; defaults to black frames.
    pub frame_colors: Option<Vec<FrameColor>>,
    pub frame_linewidth: u32,
    /// Tick labels on both axes.
    pub axis_labels: bool,
}

impl Default for ImScatterOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            frame_cmap: Colormap::jet(),
            frame_colors: None,
            frame_linewidth: 1,
            axis_labels: true,
        }
    }
}

/// Where an image ended up, in backend pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedImage {
    pub index: usize,
    pub center: (i32, i32),
    pub size: (u32, u32),
    pub frame: RGBColor,
}

/// Frame colour of every point.
pub fn frame_colors(n: usize, options: &ImScatterOptions) -> Result<Vec<RGBColor>> {
    match &options.frame_colors {
        None => Ok(vec![BLACK; n]),
        Some(colors) if colors.len() != n => Err(Error::LengthMismatch {
            left: n,
            right: colors.len(),
        }),
        Some(colors) => Ok(colors
            .iter()
            .map(|c| match *c {
                FrameColor::Fixed(color) => color,
                FrameColor::Value(t) => options.frame_cmap.sample(t),
            })
            .collect()),
    }
}

fn data_range(values: &[f64]) -> std::ops::Range<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return -1.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}

/// Draws `images` centred on the points; a single image is reused for every point.
pub fn imscatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x: &[f64],
    y: &[f64],
    images: &[Image],
    options: &ImScatterOptions,
) -> Result<Vec<PlacedImage>> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    let n = x.len();
    if images.is_empty() {
        return Err(Error::EmptyInput("no images to place".into()));
    }
    if images.len() != 1 && images.len() != n {
        return Err(Error::LengthMismatch {
            left: n,
            right: images.len(),
        });
    }
    let frames = frame_colors(n, options)?;
    let zoomed: Vec<Image> = images.iter().map(|im| im.zoomed(options.zoom)).collect();

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(data_range(x), data_range(y))?;
    let mut mesh = chart.configure_mesh();
    if !options.axis_labels {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    let mut placed = Vec::with_capacity(n);
    for i in 0..n {
        let image = if zoomed.len() == 1 { &zoomed[0] } else { &zoomed[i] };
        let (w, h) = (image.width as i32, image.height as i32);
        let Some(bitmap) =
            BitMapElement::with_owned_buffer((-w / 2, -h / 2), (image.width, image.height), image.rgb.clone())
        else {
            return Err(Error::Render(format!("image {i} does not match its size")));
        };
        let lw = options.frame_linewidth as i32;
        let frame = Rectangle::new(
            [(-w / 2 - lw, -h / 2 - lw), (w - w / 2 + lw - 1, h - h / 2 + lw - 1)],
            frames[i].stroke_width(options.frame_linewidth),
        );
        chart.draw_series(std::iter::once(EmptyElement::at((x[i], y[i])) + bitmap + frame))?;

        placed.push(PlacedImage {
            index: i,
            center: chart.backend_coord(&(x[i], y[i])),
            size: (image.width, image.height),
            frame: frames[i],
        });
    }
    debug!(points = n, images = images.len(), "image scatter");
    Ok(placed)
}

/// [`imscatter`] as a [`Plot`].
#[derive(Clone, Debug)]
pub struct ImScatterPlot<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub images: &'a [Image],
    pub options: &'a ImScatterOptions,
}

impl Plot for ImScatterPlot<'_> {
    type Output = Vec<PlacedImage>;

    fn plot<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<Vec<PlacedImage>> {
        imscatter(area, self.x, self.y, self.images, self.options)
    }
}
