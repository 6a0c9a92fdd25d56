//! Input/output: geocoding, pixel sources, land-cover remapping and cell writers

pub mod geocoding;
pub mod landcover;
pub mod window;
pub mod writer;

pub use geocoding::{AffineGeoCoding, GeoCoding};
#[cfg(feature = "gdal")]
pub use geocoding::GdalGeoCoding;
pub use landcover::{CciLandCoverRemapping, LandCoverRemapper, TableRemapping};
pub use window::{InMemorySource, PixelWindow, PixelWindowSource};
pub use writer::{GridCellWriter, MemoryWriter, TileKey};
