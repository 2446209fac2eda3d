//! Common types shared by the tiling, spectral and downloader crates.
//!
//! Everything here describes *what* is asked of the remote image-computation
//! service: the pixel grid, its georeferencing and the band selection.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod request;
pub mod transform;
pub mod window;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{RasterError, RasterResult};
pub use request::{Dimensions, FileFormat, PixelGrid, RasterRequest, RasterSource};
pub use transform::AffineTransform;
pub use window::PixelWindow;
