//! # Gradients
//!
//! A multi-stop gradient becomes one exponential function per adjacent
//! pair of colors, a stitching function joining them at the stop
//! boundaries, an axial or radial shading driven by that function, and a
//! shading pattern. [`GradientBuilder`] does this once for every output
//! format; the format itself sits behind [`GradientFactory`]:
//!
//! - [`pdf::PdfGradientFactory`] registers the pieces as deduplicated
//!   indirect objects.
//! - [`postscript::PostScriptGradientFactory`] writes them as PostScript
//!   dictionaries.

pub mod pdf;
pub mod postscript;

use crate::error::{FolioError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    DeviceRgb,
    DeviceCmyk,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRgb => "DeviceRGB",
            ColorSpace::DeviceCmyk => "DeviceCMYK",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// A gradient stop color. Components are in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Srgb { r: f64, g: f64, b: f64 },
    Cmyk { c: f64, m: f64, y: f64, k: f64 },
    Gray(f64),
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color::Srgb { r, g, b }
    }

    pub fn is_srgb(&self) -> bool {
        matches!(self, Color::Srgb { .. })
    }

    /// Naive conversion without color management.
    pub fn to_srgb(&self) -> Color {
        match *self {
            Color::Srgb { .. } => *self,
            Color::Cmyk { c, m, y, k } => Color::Srgb {
                r: (1.0 - c) * (1.0 - k),
                g: (1.0 - m) * (1.0 - k),
                b: (1.0 - y) * (1.0 - k),
            },
            Color::Gray(v) => Color::Srgb { r: v, g: v, b: v },
        }
    }

    pub fn components(&self) -> Vec<f64> {
        match *self {
            Color::Srgb { r, g, b } => vec![r, g, b],
            Color::Cmyk { c, m, y, k } => vec![c, m, y, k],
            Color::Gray(v) => vec![v],
        }
    }
}

/// Builds the function/shading/pattern pieces of a gradient in some output
/// format.
pub trait GradientFactory {
    type Function;
    type Shading;
    type Pattern;

    /// Type 2 function interpolating `c0` → `c1` over `domain`.
    fn make_exponential_function(
        &mut self,
        domain: &[f64],
        c0: &[f64],
        c1: &[f64],
        exponent: f64,
    ) -> Result<Self::Function>;

    /// Type 3 function chaining `functions` at `bounds`.
    fn make_stitching_function(
        &mut self,
        domain: &[f64],
        functions: &[Self::Function],
        bounds: &[f64],
        encode: &[f64],
    ) -> Result<Self::Function>;

    fn make_shading(
        &mut self,
        shading_type: u8,
        color_space: ColorSpace,
        coords: &[f64],
        function: &Self::Function,
    ) -> Result<Self::Shading>;

    fn make_pattern(
        &mut self,
        pattern_type: u8,
        shading: &Self::Shading,
        matrix: Option<&[f64]>,
    ) -> Result<Self::Pattern>;
}

/// One gradient request.
#[derive(Debug, Clone)]
pub struct GradientBuilder {
    pub radial: bool,
    pub color_space: ColorSpace,
    /// Stop colors. Non-sRGB entries are replaced by their sRGB conversion
    /// when the gradient is built.
    pub colors: Vec<Color>,
    /// Stop positions between the first and last color, one fewer than
    /// the number of color pairs.
    pub bounds: Vec<f64>,
    /// `x0 y0 x1 y1` for axial; `x0 y0 r0 x1 y1 r1` or `x y r` for radial.
    pub coords: Vec<f64>,
    pub matrix: Option<Vec<f64>>,
}

impl GradientBuilder {
    pub fn axial(colors: Vec<Color>, bounds: Vec<f64>, coords: Vec<f64>) -> Self {
        GradientBuilder {
            radial: false,
            color_space: ColorSpace::DeviceRgb,
            colors,
            bounds,
            coords,
            matrix: None,
        }
    }

    pub fn radial(colors: Vec<Color>, bounds: Vec<f64>, coords: Vec<f64>) -> Self {
        GradientBuilder {
            radial: true,
            ..Self::axial(colors, bounds, coords)
        }
    }

    pub fn with_matrix(mut self, matrix: Vec<f64>) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    fn validate(&self) -> Result<()> {
        // Stop colors are always emitted as three sRGB components.
        if self.color_space != ColorSpace::DeviceRgb {
            return Err(FolioError::InvalidGradient(format!(
                "stop colors are written as RGB and cannot fill a {} shading",
                self.color_space.pdf_name()
            )));
        }
        if self.colors.len() < 2 {
            return Err(FolioError::InvalidGradient(format!(
                "need at least 2 colors, got {}",
                self.colors.len()
            )));
        }
        if self.bounds.len() != self.colors.len() - 2 {
            return Err(FolioError::InvalidGradient(format!(
                "{} colors need {} bounds, got {}",
                self.colors.len(),
                self.colors.len() - 2,
                self.bounds.len()
            )));
        }
        let coords_ok = if self.radial {
            matches!(self.coords.len(), 3 | 6)
        } else {
            self.coords.len() == 4
        };
        if !coords_ok {
            return Err(FolioError::InvalidGradient(format!(
                "{} gradient cannot use {} coordinates",
                if self.radial { "radial" } else { "axial" },
                self.coords.len()
            )));
        }
        Ok(())
    }

    /// Shading coordinates; a radial `x y r` grows from a zero-radius
    /// circle at the same center.
    pub fn shading_coords(&self) -> Vec<f64> {
        match (self.radial, self.coords.as_slice()) {
            (true, &[x, y, r]) => vec![x, y, r, x, y, 0.0],
            _ => self.coords.clone(),
        }
    }

    pub fn build<F: GradientFactory>(&mut self, factory: &mut F) -> Result<F::Pattern> {
        self.validate()?;
        for color in self.colors.iter_mut() {
            if !color.is_srgb() {
                *color = color.to_srgb();
            }
        }

        let functions = self
            .colors
            .windows(2)
            .map(|pair| {
                factory.make_exponential_function(
                    &[0.0, 1.0],
                    &pair[0].components(),
                    &pair[1].components(),
                    1.0,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let encode: Vec<f64> = functions.iter().flat_map(|_| [0.0, 1.0]).collect();
        let stitching = factory.make_stitching_function(&[0.0, 1.0], &functions, &self.bounds, &encode)?;

        let shading_type = if self.radial { 3 } else { 2 };
        let shading = factory.make_shading(shading_type, self.color_space, &self.shading_coords(), &stitching)?;
        factory.make_pattern(2, &shading, self.matrix.as_deref())
    }
}
