use async_trait::async_trait;
use chrono_tz::Tz;
use thiserror::Error;
use tzf_rs::DefaultFinder;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Coordinates ({latitude}, {longitude}) are out of range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("No time zone is known for ({latitude}, {longitude})")]
    NoTimeZone { latitude: f64, longitude: f64 },
}

#[async_trait]
pub trait TimeZoneResolver: Send + Sync {
    async fn resolve_time_zone(&self, location: Location) -> Result<Tz, GeocodingError>;
}

fn validate(location: Location) -> Result<Location, GeocodingError> {
    let Location {
        latitude,
        longitude,
    } = location;

    let in_range = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if !in_range {
        return Err(GeocodingError::InvalidCoordinates {
            latitude,
            longitude,
        });
    }

    Ok(location)
}

/// Offline resolver looking coordinates up in the bundled time zone
/// boundaries. Points outside every boundary get their nautical zone.
pub struct BoundaryTimeZoneResolver {
    finder: DefaultFinder,
    nautical: NauticalTimeZoneResolver,
}

impl BoundaryTimeZoneResolver {
    /// Loads the boundary data, which takes a moment. Build it once.
    pub fn new(fallback: Option<Tz>) -> Self {
        Self {
            finder: DefaultFinder::new(),
            nautical: NauticalTimeZoneResolver::new(fallback),
        }
    }
}

#[async_trait]
impl TimeZoneResolver for BoundaryTimeZoneResolver {
    async fn resolve_time_zone(&self, location: Location) -> Result<Tz, GeocodingError> {
        let Location {
            latitude,
            longitude,
        } = validate(location)?;

        let name = self.finder.get_tz_name(longitude, latitude);
        match name.parse::<Tz>() {
            Ok(zone) => {
                log::debug!("Resolved ({latitude}, {longitude}) to {zone}");
                Ok(zone)
            }
            Err(_) => {
                log::debug!("No boundary zone for ({latitude}, {longitude}), got {name:?}");
                self.nautical.resolve_time_zone(location).await
            }
        }
    }
}

/// Offline resolver mapping longitude to its nautical `Etc/GMT±N` zone.
pub struct NauticalTimeZoneResolver {
    fallback: Option<Tz>,
}

impl NauticalTimeZoneResolver {
    pub fn new(fallback: Option<Tz>) -> Self {
        Self { fallback }
    }

    fn nautical_zone(longitude: f64) -> Option<Tz> {
        let offset = (longitude / 15.0).round().clamp(-12.0, 12.0) as i32;

        // Etc zones have inverted signs: UTC+2 is `Etc/GMT-2`.
        let name = match offset {
            0 => "Etc/GMT".to_string(),
            east if east > 0 => format!("Etc/GMT-{east}"),
            west => format!("Etc/GMT+{}", -west),
        };

        name.parse().ok()
    }
}

#[async_trait]
impl TimeZoneResolver for NauticalTimeZoneResolver {
    async fn resolve_time_zone(&self, location: Location) -> Result<Tz, GeocodingError> {
        let Location {
            latitude,
            longitude,
        } = validate(location)?;

        let zone = Self::nautical_zone(longitude).or(self.fallback);
        log::debug!("Resolved ({latitude}, {longitude}) to {zone:?}");

        zone.ok_or(GeocodingError::NoTimeZone {
            latitude,
            longitude,
        })
    }
}
