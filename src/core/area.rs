use crate::io::geocoding::GeoCoding;
use crate::types::{CellRect, GeoPos, GridError, GridResult};
use ndarray::Array2;

/// Mean Earth radius used when the CRS has no ellipsoid (metres)
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// Semi-major axes below this value are taken to be in kilometres
const KILOMETRE_AXIS_LIMIT: f64 = 10_000.0;

/// Geodetic area of raster pixels on a spherical Earth
pub struct AreaCalculator<G> {
    geocoding: G,
    earth_radius: f64,
}

impl<G: GeoCoding> AreaCalculator<G> {
    pub fn new(geocoding: G) -> Self {
        let earth_radius = match geocoding.semi_major_axis() {
            Some(axis) if axis.is_finite() && axis > 0.0 && axis < KILOMETRE_AXIS_LIMIT => axis * 1000.0,
            Some(axis) if axis.is_finite() && axis > 0.0 => axis,
            _ => MEAN_EARTH_RADIUS,
        };
        log::debug!("Area calculator using Earth radius {} m", earth_radius);
        Self {
            geocoding,
            earth_radius,
        }
    }

    pub fn earth_radius(&self) -> f64 {
        self.earth_radius
    }

    /// Area of pixel `(x, y)` in square metres.
    ///
    /// `max_x`/`max_y` are the largest valid pixel indices; on the last
    /// column or row the opposite corner is taken backwards so the sampled
    /// rectangle stays inside the raster.
    pub fn pixel_area(&self, x: usize, y: usize, max_x: usize, max_y: usize) -> GridResult<f64> {
        let other_x = if x == max_x && x > 0 { x - 1 } else { x + 1 };
        let other_y = if y == max_y && y > 0 { y - 1 } else { y + 1 };

        let corner = self.geo_pos(x as f64, y as f64)?;
        let other = self.geo_pos(other_x as f64, other_y as f64)?;
        Ok(self.rectangle_area(corner, other))
    }

    /// Area of the lon/lat rectangle spanned by two opposite corners
    pub fn rectangle_area(&self, a: GeoPos, b: GeoPos) -> f64 {
        let delta_lon = (a.lon - b.lon).abs();
        let delta_lat = (a.lat - b.lat).abs();
        let center_lat = (a.lat + b.lat) / 2.0;

        let r = self.earth_radius;
        let width = r * center_lat.to_radians().cos() * delta_lon.to_radians();
        let height = r * delta_lat.to_radians();
        (width * height).max(0.0)
    }

    /// Areas of every pixel of `rect` inside a raster of `raster_width` x `raster_height`
    pub fn window_areas(
        &self,
        rect: &CellRect,
        raster_width: usize,
        raster_height: usize,
    ) -> GridResult<Array2<f64>>
    where
        G: Sync,
    {
        if raster_width == 0 || raster_height == 0 {
            return Err(GridError::InvalidInput("Empty raster".to_string()));
        }
        if rect.x + rect.width > raster_width || rect.y + rect.height > raster_height {
            return Err(GridError::InvalidInput(format!(
                "Window {:?} exceeds {}x{} raster",
                rect, raster_width, raster_height
            )));
        }
        let max_x = raster_width - 1;
        let max_y = raster_height - 1;

        let rows = self.window_rows(rect, max_x, max_y)?;
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((rect.height, rect.width), data)
            .map_err(|e| GridError::InvalidInput(format!("Failed to shape area window: {}", e)))
    }

    #[cfg(feature = "parallel")]
    fn window_rows(&self, rect: &CellRect, max_x: usize, max_y: usize) -> GridResult<Vec<Vec<f64>>>
    where
        G: Sync,
    {
        use rayon::prelude::*;

        (rect.y..rect.y + rect.height)
            .into_par_iter()
            .map(|y| self.row_areas(rect, y, max_x, max_y))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn window_rows(&self, rect: &CellRect, max_x: usize, max_y: usize) -> GridResult<Vec<Vec<f64>>> {
        (rect.y..rect.y + rect.height)
            .map(|y| self.row_areas(rect, y, max_x, max_y))
            .collect()
    }

    fn row_areas(&self, rect: &CellRect, y: usize, max_x: usize, max_y: usize) -> GridResult<Vec<f64>> {
        (rect.x..rect.x + rect.width)
            .map(|x| self.pixel_area(x, y, max_x, max_y))
            .collect()
    }

    fn geo_pos(&self, x: f64, y: f64) -> GridResult<GeoPos> {
        self.geocoding
            .pixel_to_geo(x, y)
            .ok_or_else(|| GridError::Geocoding(format!("No geo position for pixel ({}, {})", x, y)))
    }
}
