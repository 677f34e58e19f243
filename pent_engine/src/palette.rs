use pent_stream::{SaveReader, SaveWriter};
use serde::Serialize;

use crate::error::LoadError;
use crate::process::ProcId;

/// Fixed-point one for matrix coefficients.
pub const MATRIX_ONE: i32 = 0x800;

/// 3x4 colour transform in 11-bit fixed point. Each row is
/// `[r, g, b, add]` for one output channel; `add` is scaled to 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorMatrix(pub [i16; 12]);

impl ColorMatrix {
    pub fn identity() -> Self {
        let one = MATRIX_ONE as i16;
        ColorMatrix([one, 0, 0, 0, 0, one, 0, 0, 0, 0, one, 0])
    }

    /// Transform that maps every colour to `rgb` (`0x00RRGGBB`).
    pub fn solid(rgb: u32) -> Self {
        let add = |shift: u32| (((rgb >> shift) & 0xFF) as i32 * MATRIX_ONE / 255) as i16;
        ColorMatrix([0, 0, 0, add(16), 0, 0, 0, add(8), 0, 0, 0, add(0)])
    }

    /// Linear mix, `old_weight` parts of `old` against `total - old_weight` of `new`.
    pub fn interpolate(old: &ColorMatrix, new: &ColorMatrix, old_weight: i32, total: i32) -> Self {
        let mut out = [0i16; 12];
        if total <= 0 {
            return *new;
        }
        for (i, value) in out.iter_mut().enumerate() {
            let o = i32::from(old.0[i]) * old_weight;
            let n = i32::from(new.0[i]) * (total - old_weight);
            *value = ((o + n) / total) as i16;
        }
        ColorMatrix(out)
    }

    pub fn apply(&self, rgb: u32) -> u32 {
        let r = ((rgb >> 16) & 0xFF) as i32;
        let g = ((rgb >> 8) & 0xFF) as i32;
        let b = (rgb & 0xFF) as i32;
        let m = self.0.map(i32::from);
        let channel = |row: usize| {
            let value = (m[row] * r + m[row + 1] * g + m[row + 2] * b + m[row + 3] * 255) >> 11;
            value.clamp(0, 255) as u32
        };
        (channel(0) << 16) | (channel(4) << 8) | channel(8)
    }

    pub fn is_identity(&self) -> bool {
        *self == ColorMatrix::identity()
    }

    pub fn save(&self, writer: &mut SaveWriter) {
        for value in self.0 {
            writer.write_u16(value as u16);
        }
    }

    pub fn load(reader: &mut SaveReader<'_>) -> Result<Self, LoadError> {
        let mut out = [0i16; 12];
        for value in out.iter_mut() {
            *value = reader.read_u16()? as i16;
        }
        Ok(ColorMatrix(out))
    }
}

/// Transform applied to the game palette plus the single active fader.
#[derive(Debug, Clone, Serialize)]
pub struct PaletteManager {
    transform: ColorMatrix,
    #[serde(skip)]
    fader: Option<(ProcId, i32)>,
}

impl Default for PaletteManager {
    fn default() -> Self {
        PaletteManager {
            transform: ColorMatrix::identity(),
            fader: None,
        }
    }
}

impl PaletteManager {
    pub fn transform(&self) -> &ColorMatrix {
        &self.transform
    }

    pub fn transform_palette(&mut self, matrix: ColorMatrix) {
        self.transform = matrix;
    }

    pub fn untransform_palette(&mut self) {
        self.transform = ColorMatrix::identity();
    }

    /// Pid and priority of the fader currently driving the palette.
    pub fn active_fader(&self) -> Option<(ProcId, i32)> {
        self.fader
    }

    pub(crate) fn set_active_fader(&mut self, fader: Option<(ProcId, i32)>) {
        self.fader = fader;
    }

    pub fn apply(&self, rgb: u32) -> u32 {
        if self.transform.is_identity() {
            return rgb;
        }
        self.transform.apply(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keeps_colours_and_solid_replaces_them() {
        assert_eq!(ColorMatrix::identity().apply(0x123456), 0x123456);
        assert_eq!(ColorMatrix::solid(0).apply(0xFFFFFF), 0);
        assert_eq!(ColorMatrix::solid(0xFF0000).apply(0x00FF00), 0xFF0000);
    }

    #[test]
    fn interpolation_ends_at_the_new_matrix() {
        let black = ColorMatrix::solid(0);
        let ident = ColorMatrix::identity();
        assert_eq!(ColorMatrix::interpolate(&ident, &black, 0, 30), black);
        assert_eq!(ColorMatrix::interpolate(&ident, &black, 30, 30), ident);
        let half = ColorMatrix::interpolate(&ident, &black, 15, 30);
        assert_eq!(half.apply(0xFEFEFE), 0x7F7F7F);
    }
}
