//! Level colors
//!
//! Each level gets a random saturated plate color; the ball, trail,
//! particles and glow use a lighter base color derived from it.

use serde::{Deserialize, Serialize};

/// Linear RGBA color, serialized as `{"r":..,"g":..,"b":..,"a":..}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// HSV with all components in [0, 1]
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(1.0) * 6.0;
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);

        let sector = h.floor() as u32 % 6;
        let f = h - h.floor();
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match sector {
            0 => Self::rgb(v, t, p),
            1 => Self::rgb(q, v, p),
            2 => Self::rgb(p, v, t),
            3 => Self::rgb(p, q, v),
            4 => Self::rgb(t, p, v),
            _ => Self::rgb(v, p, q),
        }
    }

    /// Add the same amount to each channel, clamped to 1
    pub fn lightened(&self, amount: f32) -> Self {
        Self {
            r: (self.r + amount).min(1.0),
            g: (self.g + amount).min(1.0),
            b: (self.b + amount).min(1.0),
            a: self.a,
        }
    }

    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// CSS `rgba(...)` string for DOM styling
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

/// Colors pushed to every visual-effect surface at level start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPalette {
    /// Ring pieces and the HUD progress bar
    pub plate: Rgba,
    /// Ball, goal and HUD accents
    pub base: Rgba,
    pub trail: Rgba,
    pub particles: Rgba,
    /// Two-stop glow gradient around the goal
    pub glow: [Rgba; 2],
}

impl EffectPalette {
    pub fn from_colors(plate: Rgba, base: Rgba) -> Self {
        Self {
            plate,
            base,
            trail: base.with_alpha(0.6),
            particles: base,
            glow: [base, base.with_alpha(0.0)],
        }
    }
}

impl Default for EffectPalette {
    fn default() -> Self {
        Self::from_colors(Rgba::rgb(0.2, 0.6, 1.0), Rgba::rgb(0.7, 1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(close(Rgba::from_hsv(0.0, 1.0, 1.0), Rgba::rgb(1.0, 0.0, 0.0)));
        assert!(close(Rgba::from_hsv(1.0 / 3.0, 1.0, 1.0), Rgba::rgb(0.0, 1.0, 0.0)));
        assert!(close(Rgba::from_hsv(2.0 / 3.0, 1.0, 1.0), Rgba::rgb(0.0, 0.0, 1.0)));
        assert!(close(Rgba::from_hsv(0.5, 0.0, 1.0), Rgba::WHITE));
    }

    #[test]
    fn test_lightened_clamps() {
        let base = Rgba::rgb(0.8, 0.2, 0.0).lightened(0.5);
        assert!(close(base, Rgba::rgb(1.0, 0.7, 0.5)));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Rgba::rgb(1.0, 0.5, 0.0)).unwrap();
        assert_eq!(json, r#"{"r":1.0,"g":0.5,"b":0.0,"a":1.0}"#);
    }

    #[test]
    fn test_css() {
        assert_eq!(Rgba::rgb(1.0, 0.0, 0.5).to_css(), "rgba(255, 0, 128, 1.00)");
    }
}
