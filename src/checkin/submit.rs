use crate::model::check_in::CheckInRecord;

use super::gate::{SiteGeofence, evaluate_point};
use super::{CheckInError, LocationProvider, acquire_fix};

/// The caller's current assignment joined with its site's geofence.
#[derive(Debug, Clone, Copy)]
pub struct ActiveAssignment {
    pub assignment_id: u64,
    pub site_id: u64,
    pub fence: SiteGeofence,
}

#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub assignment_id: u64,
    pub employee_id: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: String,
    pub distance_m: f64,
    pub verified: bool,
}

/// Persistence seam for the submit step. The insert is all-or-nothing: a
/// failure must leave no partial record behind.
pub trait CheckInStore {
    async fn active_assignment(
        &mut self,
        employee_id: u64,
    ) -> anyhow::Result<Option<ActiveAssignment>>;

    async fn insert_check_in(&mut self, new: NewCheckIn) -> anyhow::Result<CheckInRecord>;
}

/// Turns a captured photo plus a submit-time position fix into one immutable
/// check-in record.
pub struct CheckInSubmitter<S: CheckInStore> {
    store: S,
}

impl<S: CheckInStore> CheckInSubmitter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The location is re-acquired here, at submit time. A gate decision
    /// made earlier is never trusted: if the caller moved out of range in
    /// between, this fails with `OutOfRange` and writes nothing.
    pub async fn submit<L: LocationProvider>(
        &mut self,
        employee_id: u64,
        photo_url: &str,
        provider: &mut L,
    ) -> Result<CheckInRecord, CheckInError> {
        let assignment = self
            .store
            .active_assignment(employee_id)
            .await
            .map_err(|e| CheckInError::Persistence(e.to_string()))?
            .ok_or(CheckInError::NoActiveAssignment)?;

        let fix = acquire_fix(provider).await?;

        let decision = evaluate_point(&assignment.fence, fix.point);
        if !decision.in_range {
            return Err(CheckInError::OutOfRange {
                distance_m: decision.distance_m,
                radius_m: assignment.fence.radius_m,
            });
        }

        self.store
            .insert_check_in(NewCheckIn {
                assignment_id: assignment.assignment_id,
                employee_id,
                latitude: fix.point.latitude,
                longitude: fix.point.longitude,
                photo_url: photo_url.to_owned(),
                distance_m: decision.distance_m,
                verified: true,
            })
            .await
            .map_err(|e| CheckInError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::capture::{CameraDevice, CaptureError, CaptureSession};
    use crate::checkin::gate::GeofenceGate;
    use crate::checkin::{FixedLocationProvider, GeoPoint};
    use anyhow::bail;

    struct MemoryStore {
        assignment: Option<ActiveAssignment>,
        fail_insert: bool,
        inserted: Vec<NewCheckIn>,
    }

    impl MemoryStore {
        fn with_site(radius_m: f64) -> Self {
            Self {
                assignment: Some(ActiveAssignment {
                    assignment_id: 7,
                    site_id: 1,
                    fence: SiteGeofence {
                        latitude: 0.0,
                        longitude: 0.0,
                        radius_m,
                    },
                }),
                fail_insert: false,
                inserted: Vec::new(),
            }
        }

        fn empty() -> Self {
            Self {
                assignment: None,
                fail_insert: false,
                inserted: Vec::new(),
            }
        }
    }

    impl CheckInStore for MemoryStore {
        async fn active_assignment(
            &mut self,
            _employee_id: u64,
        ) -> anyhow::Result<Option<ActiveAssignment>> {
            Ok(self.assignment)
        }

        async fn insert_check_in(&mut self, new: NewCheckIn) -> anyhow::Result<CheckInRecord> {
            if self.fail_insert {
                bail!("connection reset");
            }
            let record = CheckInRecord {
                id: self.inserted.len() as u64 + 1,
                assignment_id: new.assignment_id,
                employee_id: new.employee_id,
                latitude: new.latitude,
                longitude: new.longitude,
                photo_url: new.photo_url.clone(),
                distance_m: new.distance_m,
                verified: new.verified,
                created_at: None,
            };
            self.inserted.push(new);
            Ok(record)
        }
    }

    fn provider_at(latitude: f64, longitude: f64) -> FixedLocationProvider {
        FixedLocationProvider::new(GeoPoint { latitude, longitude }, Some(5.0))
    }

    struct TestCamera {
        open: bool,
    }

    impl CameraDevice for TestCamera {
        fn open(&mut self) -> Result<(), CaptureError> {
            self.open = true;
            Ok(())
        }
        fn read_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
            Ok(vec![200; 64])
        }
        fn close(&mut self) {
            self.open = false;
        }
        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[tokio::test]
    async fn at_the_site_center_the_record_is_verified_with_zero_distance() {
        let mut submitter = CheckInSubmitter::new(MemoryStore::with_site(50.0));
        let record = submitter
            .submit(1000, "photos/1.jpg", &mut provider_at(0.0, 0.0))
            .await
            .unwrap();

        assert_eq!(record.distance_m, 0.0);
        assert!(record.verified);
        assert_eq!(record.employee_id, 1000);
        assert_eq!(submitter.store.inserted.len(), 1);
    }

    #[tokio::test]
    async fn moving_out_of_range_after_the_gate_check_blocks_the_submit() {
        let fence = SiteGeofence {
            latitude: 0.0,
            longitude: 0.0,
            radius_m: 100.0,
        };

        // gate said yes while the user stood 55 m out
        let mut gate = GeofenceGate::new(fence);
        gate.evaluate(&mut provider_at(0.0, 0.0005)).await.unwrap();
        assert!(gate.is_open());

        // by submit time they walked to ~111 m; the fresh fix wins
        let mut submitter = CheckInSubmitter::new(MemoryStore::with_site(100.0));
        let err = submitter
            .submit(1000, "photos/1.jpg", &mut provider_at(0.0, 0.001))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckInError::OutOfRange { .. }));
        assert!(submitter.store.inserted.is_empty(), "no partial record");
    }

    #[tokio::test]
    async fn no_active_assignment_blocks_the_submit() {
        let mut submitter = CheckInSubmitter::new(MemoryStore::empty());
        let err = submitter
            .submit(1000, "photos/1.jpg", &mut provider_at(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::NoActiveAssignment));
    }

    #[tokio::test]
    async fn a_persistence_failure_keeps_the_photo_for_resubmission() {
        let mut session = CaptureSession::new(TestCamera { open: false });
        session.start().unwrap();
        session.capture().unwrap();

        let mut store = MemoryStore::with_site(50.0);
        store.fail_insert = true;
        let mut submitter = CheckInSubmitter::new(store);

        let err = submitter
            .submit(1000, "photos/1.jpg", &mut provider_at(0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::Persistence(_)));

        // photo survives the failure; only success or retake discards it
        assert!(session.photo().is_some());

        submitter.store.fail_insert = false;
        let record = submitter
            .submit(1000, "photos/1.jpg", &mut provider_at(0.0, 0.0))
            .await
            .unwrap();
        assert!(record.verified);
        session.clear_photo();
        assert!(session.photo().is_none());
    }
}
