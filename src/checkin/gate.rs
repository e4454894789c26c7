use crate::model::site::Site;

use super::distance::haversine_m;
use super::{CheckInError, GeoPoint, LocationProvider, acquire_fix};

/// The circular boundary of a site: center plus radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteGeofence {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl SiteGeofence {
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl From<&Site> for SiteGeofence {
    fn from(site: &Site) -> Self {
        SiteGeofence {
            latitude: site.latitude,
            longitude: site.longitude,
            radius_m: site.radius_meters,
        }
    }
}

/// Outcome of one geofence evaluation. Out-of-range is a gating state, not a
/// failure; the distance is kept so the UI can report it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub distance_m: f64,
    pub in_range: bool,
}

pub fn evaluate_point(fence: &SiteGeofence, point: GeoPoint) -> GateDecision {
    let distance_m = haversine_m(fence.center(), point);
    GateDecision {
        distance_m,
        in_range: distance_m <= fence.radius_m,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateState {
    /// No evaluation yet, or the last one failed. Check-in stays disabled.
    Unresolved,
    Locating,
    Evaluated(GateDecision),
}

/// Decides whether check-in is currently permitted. Evaluation is on demand
/// only; a failed or stale evaluation is never retried automatically, the
/// caller must invoke [`GeofenceGate::evaluate`] again.
#[derive(Debug)]
pub struct GeofenceGate {
    fence: SiteGeofence,
    state: GateState,
}

impl GeofenceGate {
    pub fn new(fence: SiteGeofence) -> Self {
        Self {
            fence,
            state: GateState::Unresolved,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn decision(&self) -> Option<GateDecision> {
        match self.state {
            GateState::Evaluated(decision) => Some(decision),
            _ => None,
        }
    }

    /// True only after an evaluation that landed inside the radius.
    pub fn is_open(&self) -> bool {
        matches!(self.state, GateState::Evaluated(d) if d.in_range)
    }

    /// Request one position fix and evaluate it against the fence. On
    /// permission denial or timeout the gate returns to `Unresolved` and the
    /// error is surfaced once.
    pub async fn evaluate<L: LocationProvider>(
        &mut self,
        provider: &mut L,
    ) -> Result<GateDecision, CheckInError> {
        self.state = GateState::Locating;

        let fix = match acquire_fix(provider).await {
            Ok(fix) => fix,
            Err(err) => {
                self.state = GateState::Unresolved;
                return Err(err);
            }
        };

        let decision = evaluate_point(&self.fence, fix.point);
        self.state = GateState::Evaluated(decision);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::{LocationError, LocationFix};

    fn fence_at_origin(radius_m: f64) -> SiteGeofence {
        SiteGeofence {
            latitude: 0.0,
            longitude: 0.0,
            radius_m,
        }
    }

    struct StubProvider {
        result: Result<LocationFix, LocationError>,
    }

    impl StubProvider {
        fn at(latitude: f64, longitude: f64) -> Self {
            Self {
                result: Ok(LocationFix {
                    point: GeoPoint { latitude, longitude },
                    accuracy_m: Some(5.0),
                }),
            }
        }

        fn failing(err: LocationError) -> Self {
            Self { result: Err(err) }
        }
    }

    impl LocationProvider for StubProvider {
        async fn current_location(&mut self) -> Result<LocationFix, LocationError> {
            self.result
        }
    }

    struct NeverResolves;

    impl LocationProvider for NeverResolves {
        async fn current_location(&mut self) -> Result<LocationFix, LocationError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn point_55_meters_out_is_in_range_of_a_100_meter_fence() {
        let mut gate = GeofenceGate::new(fence_at_origin(100.0));
        let decision = gate
            .evaluate(&mut StubProvider::at(0.0, 0.0005))
            .await
            .unwrap();
        assert!(decision.in_range);
        assert!(gate.is_open());
    }

    #[tokio::test]
    async fn point_111_meters_out_is_out_of_range_of_a_100_meter_fence() {
        let mut gate = GeofenceGate::new(fence_at_origin(100.0));
        let decision = gate
            .evaluate(&mut StubProvider::at(0.0, 0.001))
            .await
            .unwrap();
        assert!(!decision.in_range);
        assert!(decision.distance_m > 100.0);
        assert!(!gate.is_open());
        // the distance is available for the "you are N m away" message
        assert!(gate.decision().is_some());
    }

    #[tokio::test]
    async fn permission_denial_leaves_the_gate_unresolved() {
        let mut gate = GeofenceGate::new(fence_at_origin(100.0));
        let err = gate
            .evaluate(&mut StubProvider::failing(LocationError::PermissionDenied))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::LocationPermissionDenied));
        assert_eq!(gate.state(), GateState::Unresolved);
        assert!(!gate.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn a_fix_that_never_arrives_times_out_as_unavailable() {
        let mut gate = GeofenceGate::new(fence_at_origin(100.0));
        let err = gate.evaluate(&mut NeverResolves).await.unwrap_err();
        assert!(matches!(err, CheckInError::LocationUnavailable));
        assert_eq!(gate.state(), GateState::Unresolved);
    }

    #[tokio::test]
    async fn re_evaluation_replaces_the_previous_decision() {
        let mut gate = GeofenceGate::new(fence_at_origin(100.0));
        gate.evaluate(&mut StubProvider::at(0.0, 0.0005)).await.unwrap();
        assert!(gate.is_open());

        // user walked away; gate only learns on explicit re-evaluation
        gate.evaluate(&mut StubProvider::at(0.0, 0.001)).await.unwrap();
        assert!(!gate.is_open());
    }
}
