use colorgrad::Gradient;
use once_cell::sync::Lazy;
use plotters::prelude::*;
use plotters::style::colors::colormaps::{BlackWhite, Bone};

/// Color map options for value-graded coloring
///
/// Covers the maps that make sense for sweep figures:
///
/// - **Perceptually uniform sequential**: Viridis, Plasma, Inferno, Magma,
///   Turbo, Cividis (continuous data, colorblind-friendly)
/// - **Diverging**: Spectral
/// - **Grayscale**: Bone, BlackWhite (useful for printing)
///
/// # Recommendations
///
/// - **Default choice**: `Viridis` - perceptually uniform, colorblind-friendly
/// - **High contrast**: `Plasma`, `Inferno`, `Magma` - good for presentations
/// - **Print-friendly**: `Bone`, `BlackWhite` - grayscale options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMaps {
    /// Viridis - perceptually uniform, colorblind-friendly (default)
    #[default]
    Viridis,
    /// Plasma - perceptually uniform, high contrast
    Plasma,
    /// Inferno - perceptually uniform, dark background friendly
    Inferno,
    /// Magma - perceptually uniform, dark to bright
    Magma,
    /// Turbo - perceptually uniform, vibrant colors
    Turbo,
    /// Cividis - colorblind-friendly, optimized for printing
    Cividis,
    /// Spectral - diverging colormap
    Spectral,
    /// Bone - grayscale colormap
    Bone,
    /// BlackWhite - simple grayscale
    BlackWhite,
}

impl ColorMaps {
    /// Map a normalized value (0.0 to 1.0) to an RGB color
    ///
    /// # Arguments
    /// * `value` - Normalized value between 0.0 and 1.0 (clamped)
    ///
    /// # Returns
    /// An RGB color as `RGBColor(r, g, b)` where each component is 0-255
    #[must_use]
    pub fn map(&self, value: f32) -> RGBColor {
        let clamped_value = value.clamp(0.0, 1.0);

        match self {
            // colorgrad colormaps: Color has r, g, b, a as f32 in [0.0, 1.0]
            Self::Viridis => gradient_color(&colorgrad::preset::viridis(), clamped_value),
            Self::Plasma => gradient_color(&colorgrad::preset::plasma(), clamped_value),
            Self::Inferno => gradient_color(&colorgrad::preset::inferno(), clamped_value),
            Self::Magma => gradient_color(&colorgrad::preset::magma(), clamped_value),
            Self::Turbo => gradient_color(&colorgrad::preset::turbo(), clamped_value),
            Self::Cividis => gradient_color(&colorgrad::preset::cividis(), clamped_value),
            Self::Spectral => gradient_color(&colorgrad::preset::spectral(), clamped_value),
            // Plotters built-in colormaps
            Self::Bone => Bone.get_color(clamped_value),
            Self::BlackWhite => BlackWhite.get_color(clamped_value),
        }
    }

    /// Color for series `index` of `total`, spread evenly over the map
    #[must_use]
    pub fn series_color(&self, index: usize, total: usize) -> RGBColor {
        if total <= 1 {
            return self.map(0.0);
        }
        self.map(index as f32 / (total - 1) as f32)
    }
}

fn gradient_color(gradient: &impl Gradient, value: f32) -> RGBColor {
    let color = gradient.at(value);
    RGBColor(
        (color.r * 255.0) as u8,
        (color.g * 255.0) as u8,
        (color.b * 255.0) as u8,
    )
}

/// Default series palette: the familiar ten-color cycle most style sheets
/// start from, so multi-sweep figures look the way the originals did
static DEFAULT_PALETTE: Lazy<Vec<RGBColor>> = Lazy::new(|| {
    vec![
        RGBColor(0x1f, 0x77, 0xb4),
        RGBColor(0xff, 0x7f, 0x0e),
        RGBColor(0x2c, 0xa0, 0x2c),
        RGBColor(0xd6, 0x27, 0x28),
        RGBColor(0x94, 0x67, 0xbd),
        RGBColor(0x8c, 0x56, 0x4b),
        RGBColor(0xe3, 0x77, 0xc2),
        RGBColor(0x7f, 0x7f, 0x7f),
        RGBColor(0xbc, 0xbd, 0x22),
        RGBColor(0x17, 0xbe, 0xcf),
    ]
});

/// Color for series `index` from the default palette, cycling past ten
#[must_use]
pub fn palette_color(index: usize) -> RGBColor {
    DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]
}

/// Resolve a series color: colormap spread when one is set, palette cycle otherwise
#[must_use]
pub fn resolve_series_color(
    colormap: Option<ColorMaps>,
    index: usize,
    total: usize,
) -> RGBColor {
    match colormap {
        Some(map) => map.series_color(index, total),
        None => palette_color(index),
    }
}
