use crate::domain::{models::booking::{Booking, BookingFilter}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Takes the admin's row in `booking_locks` and fails if another live
/// booking overlaps `booking`. Must run inside the caller's transaction.
async fn claim_slot(conn: &mut SqliteConnection, booking: &Booking) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO booking_locks (admin_id, locked_at) VALUES (?, ?)
         ON CONFLICT(admin_id) DO UPDATE SET locked_at = excluded.locked_at"
    )
        .bind(&booking.admin_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    let row = sqlx::query(
        "SELECT COUNT(*) as count FROM bookings
         WHERE admin_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED' AND id != ?"
    )
        .bind(&booking.admin_id)
        .bind(booking.end_time)
        .bind(booking.start_time)
        .bind(&booking.id)
        .fetch_one(&mut *conn)
        .await
        .map_err(AppError::Database)?;

    if row.get::<i64, _>("count") > 0 {
        return Err(AppError::SlotUnavailable);
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_if_available(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        claim_slot(&mut *tx, booking).await?;

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, admin_id, status, start_time, end_time, service_ids, customer_name, customer_email,
                customer_phone, property_address, sq_ft, notes, external_event_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id)
            .bind(&booking.admin_id)
            .bind(&booking.status)
            .bind(booking.start_time)
            .bind(booking.end_time)
            .bind(&booking.service_ids)
            .bind(&booking.customer_name)
            .bind(&booking.customer_email)
            .bind(&booking.customer_phone)
            .bind(&booking.property_address)
            .bind(booking.sq_ft)
            .bind(&booking.notes)
            .bind(&booking.external_event_id)
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn reschedule_if_available(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        claim_slot(&mut *tx, booking).await?;

        // Terminal bookings never move.
        let moved = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET start_time = ?, end_time = ?, updated_at = ?
             WHERE id = ? AND admin_id = ? AND status IN ('PENDING', 'CONFIRMED')
             RETURNING *"
        )
            .bind(booking.start_time)
            .bind(booking.end_time)
            .bind(booking.updated_at)
            .bind(&booking.id)
            .bind(&booking.admin_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::InvalidTransition("Only pending or confirmed bookings can be rescheduled".into()))?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(moved)
    }

    async fn find_by_id(&self, admin_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE admin_id = ? AND id = ?")
            .bind(admin_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, admin_id: &str, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM bookings WHERE admin_id = ");
        builder.push_bind(admin_id);

        if let Some(status) = &filter.status {
            builder.push(" AND status = ").push_bind(status.to_uppercase());
        }
        if let Some(from) = filter.from {
            builder.push(" AND end_time > ").push_bind(from);
        }
        if let Some(to) = filter.to {
            builder.push(" AND start_time < ").push_bind(to);
        }
        builder.push(" ORDER BY start_time ASC");

        builder.build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_range(&self, admin_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE admin_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED' ORDER BY start_time ASC"
        )
            .bind(admin_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_contact(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET customer_name = ?, customer_email = ?, customer_phone = ?, property_address = ?,
                sq_ft = ?, notes = ?, updated_at = ?
             WHERE id = ? AND admin_id = ?
             RETURNING *"
        )
            .bind(&booking.customer_name)
            .bind(&booking.customer_email)
            .bind(&booking.customer_phone)
            .bind(&booking.property_address)
            .bind(booking.sq_ft)
            .bind(&booking.notes)
            .bind(booking.updated_at)
            .bind(&booking.id)
            .bind(&booking.admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    async fn transition(&self, current: &Booking, next: &Booking) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = ?, start_time = ?, end_time = ?, updated_at = ?
             WHERE id = ? AND admin_id = ? AND status = ? AND start_time = ?
             RETURNING *"
        )
            .bind(&next.status)
            .bind(next.start_time)
            .bind(next.end_time)
            .bind(next.updated_at)
            .bind(&current.id)
            .bind(&current.admin_id)
            .bind(&current.status)
            .bind(current.start_time)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_external_event(&self, admin_id: &str, id: &str, event_id: Option<&str>, updated_at: DateTime<Utc>) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET external_event_id = ?, updated_at = ? WHERE id = ? AND admin_id = ? RETURNING *"
        )
            .bind(event_id)
            .bind(updated_at)
            .bind(id)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }
}
