//! Site check-in verification: geofence gating, photo capture, and the
//! submit step that turns both into one immutable attendance record.
//!
//! Device capabilities (geolocation, camera) and persistence are traits so
//! the whole workflow runs against mocks in tests and against MySQL plus a
//! request-supplied position fix in the HTTP handlers.

#![allow(async_fn_in_trait)]

pub mod capture;
pub mod distance;
pub mod gate;
pub mod store;
pub mod submit;

use std::time::Duration;

use derive_more::Display;

/// A coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One single-shot position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub point: GeoPoint,
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    Unavailable,
}

/// Source of single-shot position fixes. Callers rely on the fix being
/// current; implementations must not serve a cached reading.
pub trait LocationProvider {
    async fn current_location(&mut self) -> Result<LocationFix, LocationError>;
}

/// A fix the caller already holds, e.g. the coordinates a device attached to
/// the submit request. Yields the same reading on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    fix: LocationFix,
}

impl FixedLocationProvider {
    pub fn new(point: GeoPoint, accuracy_m: Option<f64>) -> Self {
        Self {
            fix: LocationFix { point, accuracy_m },
        }
    }
}

impl LocationProvider for FixedLocationProvider {
    async fn current_location(&mut self) -> Result<LocationFix, LocationError> {
        Ok(self.fix)
    }
}

/// Hard cap on waiting for a position fix; expiry is reported as
/// `LocationUnavailable`.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the check-in workflow can surface to the user. Each condition
/// is recoverable by retrying the failed step; nothing here is retried
/// internally.
#[derive(Debug, Display)]
pub enum CheckInError {
    #[display(fmt = "location permission was denied")]
    LocationPermissionDenied,
    #[display(fmt = "no position fix within {} seconds", "LOCATION_TIMEOUT.as_secs()")]
    LocationUnavailable,
    #[display(fmt = "camera access was denied")]
    CameraAccessDenied,
    #[display(
        fmt = "{:.0} m from the site, outside the {:.0} m radius",
        distance_m,
        radius_m
    )]
    OutOfRange { distance_m: f64, radius_m: f64 },
    #[display(fmt = "no active site assignment")]
    NoActiveAssignment,
    #[display(fmt = "could not save the check-in: {}", _0)]
    Persistence(String),
}

impl std::error::Error for CheckInError {}

impl From<LocationError> for CheckInError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::PermissionDenied => CheckInError::LocationPermissionDenied,
            LocationError::Unavailable => CheckInError::LocationUnavailable,
        }
    }
}

/// Await one fix under [`LOCATION_TIMEOUT`]. Shared by the gate evaluation
/// and the submit step, which each acquire their own fix.
pub(crate) async fn acquire_fix<L: LocationProvider>(
    provider: &mut L,
) -> Result<LocationFix, CheckInError> {
    match tokio::time::timeout(LOCATION_TIMEOUT, provider.current_location()).await {
        Ok(Ok(fix)) => Ok(fix),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(CheckInError::LocationUnavailable),
    }
}
