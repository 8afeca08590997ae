//! Geo-points: located, categorised records stored alongside entities.
//!
//! A geo-point is not a [`Geometry`](crate::Geometry). The service sends it
//! as an object tagged `___class: "GeoPoint"` rather than as WKT.

use geo::Coord;
use serde_json::{Map, Value};

use crate::mapper::{CLASS_KEY, OBJECT_ID_KEY};

/// Class tag carried by geo-point objects.
pub const GEO_POINT_CLASS: &str = "GeoPoint";

const LATITUDE_KEY: &str = "latitude";
const LONGITUDE_KEY: &str = "longitude";
const CATEGORIES_KEY: &str = "categories";
const METADATA_KEY: &str = "metadata";

/// A point of interest with optional categories and metadata.
///
/// `location.x` is the longitude and `location.y` the latitude.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoPoint {
    /// Remote identifier, present once the point has been stored.
    pub object_id: Option<String>,
    /// Position in degrees.
    pub location: Coord<f64>,
    /// Category names the point belongs to.
    pub categories: Vec<String>,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
}

impl GeoPoint {
    /// Create an unsaved point at `latitude`/`longitude`.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Coord {
                x: longitude,
                y: latitude,
            },
            ..Self::default()
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.location.x
    }

    /// Attach a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Adapt a tagged map into a geo-point.
    ///
    /// Returns `None` when either coordinate is missing or not a number.
    /// Categories that are not strings are ignored.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let latitude = map.get(LATITUDE_KEY)?.as_f64()?;
        let longitude = map.get(LONGITUDE_KEY)?.as_f64()?;
        let categories = map
            .get(CATEGORIES_KEY)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let metadata = map
            .get(METADATA_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(Self {
            object_id: map
                .get(OBJECT_ID_KEY)
                .and_then(Value::as_str)
                .map(str::to_owned),
            location: Coord {
                x: longitude,
                y: latitude,
            },
            categories,
            metadata,
        })
    }

    /// Render the point as a tagged map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(CLASS_KEY.into(), Value::from(GEO_POINT_CLASS));
        if let Some(object_id) = &self.object_id {
            map.insert(OBJECT_ID_KEY.into(), Value::from(object_id.as_str()));
        }
        map.insert(LATITUDE_KEY.into(), Value::from(self.latitude()));
        map.insert(LONGITUDE_KEY.into(), Value::from(self.longitude()));
        map.insert(
            CATEGORIES_KEY.into(),
            Value::Array(self.categories.iter().cloned().map(Value::from).collect()),
        );
        map.insert(METADATA_KEY.into(), Value::Object(self.metadata.clone()));
        map
    }
}
