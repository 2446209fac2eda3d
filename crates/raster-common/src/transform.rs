//! Affine georeferencing transform of a pixel grid.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, RasterError};

/// Six-parameter affine transform mapping pixel (col, row) to world (x, y).
///
/// ```text
/// x = translate_x + col * scale_x + row * shear_x
/// y = translate_y + col * shear_y + row * scale_y
/// ```
///
/// Field names serialize in the service's camelCase form
/// (`scaleX`, `shearX`, `translateX`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    pub scale_x: f64,
    pub shear_x: f64,
    pub translate_x: f64,
    pub shear_y: f64,
    pub scale_y: f64,
    pub translate_y: f64,
}

impl AffineTransform {
    /// North-up transform anchored at the upper-left corner `(x, y)` with
    /// square pixels of `pixel_size` world units.
    pub fn north_up(x: f64, y: f64, pixel_size: f64) -> Self {
        Self {
            scale_x: pixel_size,
            shear_x: 0.0,
            translate_x: x,
            shear_y: 0.0,
            scale_y: -pixel_size,
            translate_y: y,
        }
    }

    /// World coordinate of a pixel corner.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.translate_x + col * self.scale_x + row * self.shear_x,
            self.translate_y + col * self.shear_y + row * self.scale_y,
        )
    }

    /// Transform of a sub-grid whose upper-left pixel is `(col_off, row_off)`
    /// in this grid. Scale and shear are unchanged.
    pub fn offset_by_pixels(&self, col_off: u32, row_off: u32) -> Self {
        let (x, y) = self.pixel_to_world(col_off as f64, row_off as f64);
        Self {
            translate_x: x,
            translate_y: y,
            ..*self
        }
    }

    /// World-space bounds of a `width` x `height` grid.
    pub fn bounds(&self, width: u32, height: u32) -> BoundingBox {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(width as f64, 0.0),
            self.pixel_to_world(0.0, height as f64),
            self.pixel_to_world(width as f64, height as f64),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// Check that the transform is invertible and finite.
    pub fn validate(&self) -> Result<(), RasterError> {
        let values = [
            self.scale_x,
            self.shear_x,
            self.translate_x,
            self.shear_y,
            self.scale_y,
            self.translate_y,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RasterError::InvalidTransform(format!(
                "non-finite coefficient in {:?}",
                self
            )));
        }

        let determinant = self.scale_x * self.scale_y - self.shear_x * self.shear_y;
        if determinant == 0.0 {
            return Err(RasterError::InvalidTransform(
                "transform is not invertible".to_string(),
            ));
        }
        Ok(())
    }
}
