//! Color Mapper - state value to RGB.
//!
//! Every entity class is colored through a [`ColorStrategy`]. The
//! reconciliation engine only ever sees the trait, so swapping palettes is a
//! configuration change ([`PaletteKind`]), not a code change.

use serde::{Deserialize, Serialize};
use tcview_env::Rgb;

/// Named palette entries (integer RGB, divided by 255 on use).
pub mod palette {
    pub const DEEP_BLUE: [u8; 3] = [30, 20, 255];
    pub const DEEP_GREEN: [u8; 3] = [0, 150, 0];
    pub const LIGHT_BLUE: [u8; 3] = [0, 200, 255];
    pub const LIGHT_GREEN: [u8; 3] = [50, 255, 150];
    pub const PURPLE: [u8; 3] = [200, 30, 255];
    pub const YELLOW: [u8; 3] = [255, 255, 30];
    pub const RED: [u8; 3] = [255, 0, 0];
}

/// Converts a palette entry to a unit-range color.
pub fn palette_color(entry: [u8; 3]) -> Rgb {
    Rgb::from_u8(entry[0], entry[1], entry[2])
}

/// Trait for mapping an agent state value to a color.
///
/// Implementations must be pure: the same state always yields the same
/// color and nothing observable changes.
pub trait ColorStrategy: Send + Sync {
    /// Map a state value to an RGB color with channels in [0, 1].
    fn color_for_state(&self, state: f64) -> Rgb;

    /// Color given to a new actor whose state is not applied.
    ///
    /// Defaults to the full-strength state `1.0`.
    fn base_color(&self) -> Rgb {
        self.color_for_state(1.0)
    }
}

/// Same color regardless of state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedColor(pub Rgb);

impl ColorStrategy for FixedColor {
    fn color_for_state(&self, _state: f64) -> Rgb {
        self.0
    }

    fn base_color(&self) -> Rgb {
        self.0
    }
}

/// Discrete T cell palette keyed on CD4/CD8 lineage and activation.
///
/// State codes below 100 are CD4, 100 and above are CD8 (offset by 100).
/// Within a lineage: `0` naive, `99` bound, anything else activated.
/// `-1` marks a non-cognate cell and is drawn grey. Fractional states are
/// truncated toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TcellPalette;

impl ColorStrategy for TcellPalette {
    fn color_for_state(&self, state: f64) -> Rgb {
        let mut code = state.trunc() as i64;
        let cd4 = code < 100;
        if !cd4 {
            code -= 100;
        }

        if code == -1 {
            return Rgb::new(0.5, 0.5, 0.5);
        }

        let entry = match (cd4, code) {
            (true, 0) => palette::DEEP_BLUE,
            (true, 99) => palette::PURPLE,
            (true, _) => palette::LIGHT_BLUE,
            (false, 0) => palette::DEEP_GREEN,
            (false, 99) => palette::YELLOW,
            (false, _) => palette::LIGHT_GREEN,
        };
        palette_color(entry)
    }
}

/// Continuous dendritic cell shading by antigen level.
///
/// `color = (min_level + (1 - min_level) * antigen) * base`, with the
/// antigen level clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntigenFade {
    pub base: Rgb,
    pub min_level: f64,
}

impl Default for AntigenFade {
    fn default() -> Self {
        Self {
            base: Rgb::new(1.0, 0.0, 0.0),
            min_level: 0.3,
        }
    }
}

impl ColorStrategy for AntigenFade {
    fn color_for_state(&self, state: f64) -> Rgb {
        let antigen = if state.is_finite() { state.clamp(0.0, 1.0) } else { 0.0 };
        let level = self.min_level + (1.0 - self.min_level) * antigen;
        self.base.scaled(level)
    }

    fn base_color(&self) -> Rgb {
        self.base
    }
}

/// Palette policy selected by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaletteKind {
    /// One color for every state
    Fixed { color: [u8; 3] },

    /// CD4/CD8 discrete state palette
    TcellStates,

    /// Antigen-level fade of a base color
    AntigenFade { base: [u8; 3], min_level: f64 },
}

impl PaletteKind {
    /// Production T cell coloring: everything red.
    pub fn tcell_default() -> Self {
        PaletteKind::Fixed { color: palette::RED }
    }

    /// Production dendritic cell coloring.
    pub fn dcell_default() -> Self {
        PaletteKind::AntigenFade {
            base: palette::RED,
            min_level: 0.3,
        }
    }

    /// Instantiates the strategy.
    pub fn build(&self) -> Box<dyn ColorStrategy> {
        match self {
            PaletteKind::Fixed { color } => Box::new(FixedColor(palette_color(*color))),
            PaletteKind::TcellStates => Box::new(TcellPalette),
            PaletteKind::AntigenFade { base, min_level } => Box::new(AntigenFade {
                base: palette_color(*base),
                min_level: *min_level,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_ignores_state() {
        let strategy = PaletteKind::tcell_default().build();
        assert_eq!(strategy.color_for_state(0.0), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(strategy.color_for_state(99.0), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(strategy.color_for_state(-1.0), Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_color_mapping_is_pure() {
        for strategy in [
            PaletteKind::tcell_default().build(),
            PaletteKind::TcellStates.build(),
            PaletteKind::dcell_default().build(),
        ] {
            for s in [-1.0, 0.0, 0.25, 5.0, 99.0, 105.0] {
                assert_eq!(strategy.color_for_state(s), strategy.color_for_state(s));
            }
        }
    }

    #[test]
    fn test_tcell_palette_lineages() {
        let p = TcellPalette;
        assert_eq!(p.color_for_state(0.0), palette_color(palette::DEEP_BLUE));
        assert_eq!(p.color_for_state(99.0), palette_color(palette::PURPLE));
        assert_eq!(p.color_for_state(3.0), palette_color(palette::LIGHT_BLUE));
        assert_eq!(p.color_for_state(100.0), palette_color(palette::DEEP_GREEN));
        assert_eq!(p.color_for_state(199.0), palette_color(palette::YELLOW));
        assert_eq!(p.color_for_state(104.0), palette_color(palette::LIGHT_GREEN));
        assert_eq!(p.color_for_state(-1.0), Rgb::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_tcell_palette_truncates_fractional_states() {
        let p = TcellPalette;
        assert_eq!(p.color_for_state(0.6), palette_color(palette::DEEP_BLUE));
        assert_eq!(p.color_for_state(99.7), palette_color(palette::PURPLE));
        assert_eq!(p.color_for_state(98.9), palette_color(palette::LIGHT_BLUE));
        assert_eq!(p.color_for_state(199.5), palette_color(palette::YELLOW));
    }

    #[test]
    fn test_base_color_ignores_state() {
        let fade = AntigenFade::default();
        assert_eq!(fade.base_color(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(PaletteKind::dcell_default().build().base_color(), Rgb::new(1.0, 0.0, 0.0));

        let grey = FixedColor(Rgb::new(0.5, 0.5, 0.5));
        assert_eq!(grey.base_color(), grey.0);
    }

    #[test]
    fn test_antigen_fade_range() {
        let fade = AntigenFade::default();
        assert_relative_eq!(fade.color_for_state(0.0).r, 0.3, epsilon = 1e-12);
        assert_relative_eq!(fade.color_for_state(1.0).r, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fade.color_for_state(0.5).r, 0.65, epsilon = 1e-12);
        assert_relative_eq!(fade.color_for_state(7.0).r, 1.0, epsilon = 1e-12);
        assert_eq!(fade.color_for_state(0.5).g, 0.0);
        assert_relative_eq!(fade.color_for_state(f64::NAN).r, 0.3, epsilon = 1e-12);
    }
}
