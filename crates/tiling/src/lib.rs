//! Adaptive tile splitting for quota-limited raster requests.
//!
//! The remote image service refuses any request whose pixel count exceeds its
//! per-request quota. When that happens the request is cut into a square
//! `2^power x 2^power` grid of sub-requests that exactly cover the original
//! pixel grid, each one small enough to pass.
//!
//! ```text
//! RasterRequest (2064 x 2064)        QuotaViolation { requested: 4260096, allowed: 1048576 }
//!        │                                   │
//!        └──────────────┬────────────────────┘
//!                       ▼
//!         TileSplitter::split_for(request, violation)
//!                       │  power = 2
//!                       ▼
//!         TileGrid (4 x 4 cells of 516 x 516, row-major)
//!           000.tif  001.tif  002.tif  003.tif
//!           004.tif  ...               007.tif
//!           ...
//!           012.tif  ...               015.tif
//! ```

pub mod error;
pub mod grid;
pub mod naming;
pub mod quota;
pub mod splitter;

pub use error::{Result, TilingError};
pub use grid::{Tile, TileGrid, TileId};
pub use naming::{discover_tiles, TileNaming};
pub use quota::{quota_power, QuotaViolation};
pub use splitter::TileSplitter;
