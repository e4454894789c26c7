use anyhow::Context;
use sqlx::MySqlPool;

use crate::model::check_in::CheckInRecord;

use super::gate::SiteGeofence;
use super::submit::{ActiveAssignment, CheckInStore, NewCheckIn};

/// MySQL-backed store. The record insert and the daily attendance row go
/// through one transaction, so a failure writes neither.
pub struct MySqlCheckInStore<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlCheckInStore<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }
}

impl CheckInStore for MySqlCheckInStore<'_> {
    async fn active_assignment(
        &mut self,
        employee_id: u64,
    ) -> anyhow::Result<Option<ActiveAssignment>> {
        let row = sqlx::query_as::<_, (u64, u64, f64, f64, f64)>(
            r#"
            SELECT a.id, s.id, s.latitude, s.longitude, s.radius_meters
            FROM site_assignments a
            JOIN sites s ON s.id = a.site_id
            WHERE a.employee_id = ? AND a.status = 'active' AND s.is_active = TRUE
            ORDER BY a.assigned_at DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(self.pool)
        .await
        .context("failed to load active assignment")?;

        Ok(row.map(
            |(assignment_id, site_id, latitude, longitude, radius_m)| ActiveAssignment {
                assignment_id,
                site_id,
                fence: SiteGeofence {
                    latitude,
                    longitude,
                    radius_m,
                },
            },
        ))
    }

    async fn insert_check_in(&mut self, new: NewCheckIn) -> anyhow::Result<CheckInRecord> {
        let mut tx = self.pool.begin().await.context("failed to open transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO check_in_records
                (assignment_id, employee_id, latitude, longitude, photo_url, distance_m, verified)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.assignment_id)
        .bind(new.employee_id)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&new.photo_url)
        .bind(new.distance_m)
        .bind(new.verified)
        .execute(&mut *tx)
        .await
        .context("failed to insert check-in record")?;

        let record_id = result.last_insert_id();

        // first verified check-in of the day opens the daily attendance row
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in)
            VALUES (?, CURDATE(), CURTIME())
            ON DUPLICATE KEY UPDATE check_in = COALESCE(check_in, VALUES(check_in))
            "#,
        )
        .bind(new.employee_id)
        .execute(&mut *tx)
        .await
        .context("failed to record daily attendance")?;

        let record = sqlx::query_as::<_, CheckInRecord>(
            r#"
            SELECT id, assignment_id, employee_id, latitude, longitude,
                   photo_url, distance_m, verified, created_at
            FROM check_in_records
            WHERE id = ?
            "#,
        )
        .bind(record_id)
        .fetch_one(&mut *tx)
        .await
        .context("failed to read back check-in record")?;

        tx.commit().await.context("failed to commit check-in")?;

        Ok(record)
    }
}
