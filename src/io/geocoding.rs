use crate::types::{GeoPos, GeoTransform};

/// Mapping from raster pixel coordinates to geographic coordinates.
///
/// Coordinates follow the pixel-corner convention: `(0.0, 0.0)` is the upper
/// left corner of the first pixel, `(1.0, 1.0)` its lower right corner.
pub trait GeoCoding {
    fn pixel_to_geo(&self, x: f64, y: f64) -> Option<GeoPos>;

    /// Semi-major axis of the CRS ellipsoid, in metres or kilometres
    fn semi_major_axis(&self) -> Option<f64> {
        None
    }
}

impl<G: GeoCoding + ?Sized> GeoCoding for &G {
    fn pixel_to_geo(&self, x: f64, y: f64) -> Option<GeoPos> {
        (**self).pixel_to_geo(x, y)
    }

    fn semi_major_axis(&self) -> Option<f64> {
        (**self).semi_major_axis()
    }
}

/// Geocoding of a geographic (lon/lat) raster described by an affine transform
#[derive(Debug, Clone)]
pub struct AffineGeoCoding {
    transform: GeoTransform,
    semi_major_axis: Option<f64>,
}

impl AffineGeoCoding {
    pub fn new(transform: GeoTransform) -> Self {
        Self {
            transform,
            semi_major_axis: None,
        }
    }

    /// WGS84 ellipsoid (semi-major axis 6378137 m)
    pub fn wgs84(transform: GeoTransform) -> Self {
        Self::new(transform).with_semi_major_axis(6_378_137.0)
    }

    pub fn with_semi_major_axis(mut self, semi_major_axis: f64) -> Self {
        self.semi_major_axis = Some(semi_major_axis);
        self
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }
}

impl GeoCoding for AffineGeoCoding {
    fn pixel_to_geo(&self, x: f64, y: f64) -> Option<GeoPos> {
        let (lon, lat) = self.transform.apply(x, y);
        let pos = GeoPos::new(lon, lat);
        pos.is_valid().then_some(pos)
    }

    fn semi_major_axis(&self) -> Option<f64> {
        self.semi_major_axis
    }
}

#[cfg(feature = "gdal")]
pub use self::gdal_geocoding::GdalGeoCoding;

#[cfg(feature = "gdal")]
mod gdal_geocoding {
    use super::AffineGeoCoding;
    use crate::types::{GeoTransform, GridError, GridResult};
    use gdal::Dataset;
    use std::path::Path;

    /// Geocoding of a geographic GDAL dataset
    pub struct GdalGeoCoding;

    impl GdalGeoCoding {
        pub fn from_dataset(dataset: &Dataset) -> GridResult<AffineGeoCoding> {
            let geo_transform = dataset.geo_transform()?;
            let spatial_ref = dataset.spatial_ref()?;
            if !spatial_ref.is_geographic() {
                return Err(GridError::Geocoding(
                    "Only geographic (lon/lat) rasters are supported".to_string(),
                ));
            }

            let geocoding = AffineGeoCoding::new(GeoTransform::from_gdal(geo_transform));
            match spatial_ref.semi_major() {
                Ok(axis) => Ok(geocoding.with_semi_major_axis(axis)),
                Err(e) => {
                    log::warn!("No ellipsoid in CRS, using mean Earth radius: {}", e);
                    Ok(geocoding)
                }
            }
        }

        pub fn open<P: AsRef<Path>>(path: P) -> GridResult<AffineGeoCoding> {
            log::info!("Reading geocoding from: {}", path.as_ref().display());
            let dataset = Dataset::open(path.as_ref())?;
            Self::from_dataset(&dataset)
        }
    }
}
