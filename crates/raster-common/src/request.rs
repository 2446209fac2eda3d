//! Raster requests sent to the remote image-computation service.
//!
//! The serialized form matches the service's JSON body:
//!
//! ```json
//! {
//!   "assetId": "COPERNICUS/S2_HARMONIZED/...",
//!   "fileFormat": "GeoTIFF",
//!   "bandIds": ["B1", "B2"],
//!   "grid": {
//!     "dimensions": {"width": 2064, "height": 2064},
//!     "affineTransform": {"scaleX": 2.5, "shearX": 0, "translateX": 500000, ...},
//!     "crsCode": "EPSG:32613"
//!   }
//! }
//! ```
//!
//! A synthetic request carries `"expression"` instead of `"assetId"`.

use serde::{Deserialize, Serialize};

use crate::{AffineTransform, CrsCode, PixelWindow, RasterError, RasterResult};

/// What the service should compute pixels from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RasterSource {
    /// A band-math expression evaluated server-side.
    #[serde(rename = "expression")]
    Expression(serde_json::Value),
    /// A stored image asset.
    #[serde(rename = "assetId")]
    Asset(String),
}

impl RasterSource {
    /// Short label for logs.
    pub fn label(&self) -> &str {
        match self {
            RasterSource::Expression(_) => "expression",
            RasterSource::Asset(id) => id,
        }
    }
}

/// Encoded payload format returned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileFormat {
    #[default]
    #[serde(rename = "GeoTIFF")]
    GeoTiff,
    #[serde(rename = "NPY")]
    Npy,
}

impl FileFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::GeoTiff => "tif",
            FileFormat::Npy => "npy",
        }
    }
}

/// Pixel dimensions of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Georeferenced pixel grid of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelGrid {
    pub dimensions: Dimensions,
    pub affine_transform: AffineTransform,
    pub crs_code: CrsCode,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, affine_transform: AffineTransform, crs_code: CrsCode) -> Self {
        Self {
            dimensions: Dimensions { width, height },
            affine_transform,
            crs_code,
        }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.dimensions.width as u64 * self.dimensions.height as u64
    }

    /// Sub-grid covering `window`, sharing scale, shear and CRS.
    pub fn window(&self, window: &PixelWindow) -> RasterResult<PixelGrid> {
        let Dimensions { width, height } = self.dimensions;
        if window.width == 0
            || window.height == 0
            || !PixelWindow::full(width, height).contains(window)
        {
            return Err(RasterError::WindowOutOfBounds {
                window: window.to_string(),
                width,
                height,
            });
        }

        Ok(PixelGrid::new(
            window.width,
            window.height,
            self.affine_transform
                .offset_by_pixels(window.col_off, window.row_off),
            self.crs_code,
        ))
    }
}

/// A single pixel request against the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterRequest {
    #[serde(flatten)]
    pub source: RasterSource,
    #[serde(default)]
    pub file_format: FileFormat,
    pub band_ids: Vec<String>,
    pub grid: PixelGrid,
}

impl RasterRequest {
    /// Build and validate a request.
    pub fn new(source: RasterSource, band_ids: Vec<String>, grid: PixelGrid) -> RasterResult<Self> {
        let request = Self {
            source,
            file_format: FileFormat::default(),
            band_ids,
            grid,
        };
        request.validate()?;
        Ok(request)
    }

    /// Replace the payload format.
    pub fn with_file_format(mut self, file_format: FileFormat) -> Self {
        self.file_format = file_format;
        self
    }

    /// Check dimensions, transform and band list.
    pub fn validate(&self) -> RasterResult<()> {
        let Dimensions { width, height } = self.grid.dimensions;
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if self.band_ids.is_empty() {
            return Err(RasterError::NoBands);
        }
        self.grid.affine_transform.validate()
    }

    pub fn width(&self) -> u32 {
        self.grid.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.grid.dimensions.height
    }

    /// Number of pixels the service will be asked to return.
    pub fn pixel_count(&self) -> u64 {
        self.grid.pixel_count()
    }

    /// Narrow this request to a pixel window, inheriting source, bands,
    /// format and CRS.
    pub fn window(&self, window: &PixelWindow) -> RasterResult<RasterRequest> {
        Ok(RasterRequest {
            source: self.source.clone(),
            file_format: self.file_format,
            band_ids: self.band_ids.clone(),
            grid: self.grid.window(window)?,
        })
    }
}
