use abi::{ProductId, ReservationId, ReservationStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::types::PgRange, types::Uuid, PgPool, Postgres, Row, Transaction};
use tracing::debug;

use crate::{check_reservable, ReservationManager, Rsvp};

#[async_trait]
impl Rsvp for ReservationManager {
    async fn reserve(&self, mut rsvp: abi::Reservation) -> Result<abi::Reservation, abi::Error> {
        rsvp.validate()?;
        let proposed = rsvp.window()?;
        let span: PgRange<NaiveDate> = (proposed.start()..proposed.end()).into();

        // the check reports every overlapping stay; two racing inserts that
        // both pass it are settled by the reservations_conflict constraint
        let mut tx = self.pool.begin().await?;

        let windows: Vec<abi::AvailabilityWindow> = sqlx::query_as(
            "SELECT * FROM rsvp.availability_windows WHERE product_id = $1 ORDER BY id",
        )
        .bind(&rsvp.product_id)
        .fetch_all(&mut tx)
        .await?;

        let existing: Vec<abi::Reservation> = sqlx::query_as(
            "SELECT * FROM rsvp.reservations WHERE product_id = $1 AND status <> 'cancelled' AND span && $2",
        )
        .bind(&rsvp.product_id)
        .bind(span)
        .fetch_all(&mut tx)
        .await?;

        check_reservable(&windows, &existing, &proposed)?;

        let id: Uuid = sqlx::query(
            "INSERT INTO rsvp.reservations (user_id, product_id, start_date, end_date, note, status) VALUES ($1, $2, $3, $4, $5, 'pending') RETURNING id",
        )
        .bind(&rsvp.user_id)
        .bind(&rsvp.product_id)
        .bind(proposed.start())
        .bind(proposed.end())
        .bind(&rsvp.note)
        .fetch_one(&mut tx)
        .await?
        .get(0);
        tx.commit().await?;

        rsvp.id = id.to_string();
        rsvp.status = ReservationStatus::Pending as i32;
        debug!("reserved {} as {}", proposed, rsvp.id);
        Ok(rsvp)
    }

    async fn confirm(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        self.transition(id, ReservationStatus::Confirmed).await
    }

    async fn cancel(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        self.transition(id, ReservationStatus::Cancelled).await
    }

    async fn update_note(
        &self,
        id: ReservationId,
        note: String,
    ) -> Result<abi::Reservation, abi::Error> {
        let id = parse_id(&id)?;
        let rsvp = sqlx::query_as(
            "UPDATE rsvp.reservations SET note = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(note)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(rsvp)
    }

    async fn get(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        let id = parse_id(&id)?;
        let rsvp = sqlx::query_as("SELECT * FROM rsvp.reservations WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rsvp)
    }

    async fn windows(&self, pid: ProductId) -> Result<Vec<abi::AvailabilityWindow>, abi::Error> {
        abi::validate_product_id(&pid)?;
        let windows = sqlx::query_as(
            "SELECT * FROM rsvp.availability_windows WHERE product_id = $1 ORDER BY id",
        )
        .bind(pid)
        .fetch_all(&self.pool)
        .await?;
        Ok(windows)
    }

    async fn query(
        &self,
        query: abi::ReservationQuery,
    ) -> Result<Vec<abi::Reservation>, abi::Error> {
        query.validate()?;
        let status = query.status_filter().map(|s| s.to_string());
        let rsvps = sqlx::query_as(
            "SELECT * FROM rsvp.reservations \
             WHERE ($1 = '' OR product_id = $1) \
               AND ($2 = '' OR user_id = $2) \
               AND ($3::rsvp.reservation_status IS NULL OR status = $3::rsvp.reservation_status) \
             ORDER BY start_date, created_at",
        )
        .bind(&query.product_id)
        .bind(&query.user_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rsvps)
    }
}

impl ReservationManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn transition(
        &self,
        id: ReservationId,
        to: ReservationStatus,
    ) -> Result<abi::Reservation, abi::Error> {
        let id = parse_id(&id)?;
        let mut tx = self.pool.begin().await?;
        let current = lock_status(&mut tx, id).await?;
        let status = current.transition(to)?;

        let rsvp = sqlx::query_as(
            "UPDATE rsvp.reservations SET status = $1::rsvp.reservation_status, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(status.to_string())
        .bind(id)
        .fetch_one(&mut tx)
        .await?;
        tx.commit().await?;
        Ok(rsvp)
    }

    /// Publish an availability window for a product.
    pub async fn add_window(
        &self,
        window: abi::AvailabilityWindow,
    ) -> Result<abi::AvailabilityWindow, abi::Error> {
        window.validate()?;
        let interval = window.interval()?;
        let window = sqlx::query_as(
            "INSERT INTO rsvp.availability_windows (product_id, start_date, end_date, status) VALUES ($1, $2, $3, $4::rsvp.window_status) RETURNING *",
        )
        .bind(&window.product_id)
        .bind(interval.start())
        .bind(interval.end())
        .bind(window.status().to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(window)
    }
}

async fn lock_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<ReservationStatus, abi::Error> {
    let status: abi::RsvpStatus =
        sqlx::query("SELECT status FROM rsvp.reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(tx)
            .await?
            .try_get(0)?;
    Ok(status.into())
}

fn parse_id(id: &str) -> Result<Uuid, abi::Error> {
    Uuid::parse_str(id).map_err(|_| abi::Error::InvalidReservationId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::{parse_date, Reservation, ReservationConflictInfo, ReservationQuery};
    use sqlx_db_tester::TestDb;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    async fn manager_with_june(tdb: &TestDb) -> ReservationManager {
        let manager = ReservationManager::new(tdb.get_pool().await);
        manager
            .add_window(abi::AvailabilityWindow::new_available(
                "cabin-7",
                date("2025-06-01"),
                date("2025-06-10"),
            ))
            .await
            .unwrap();
        manager
    }

    fn test_db() -> TestDb {
        TestDb::new("localhost", 5432, "postgres", "postgres", "../migrations")
    }

    fn stay(uid: &str, start: &str, end: &str) -> Reservation {
        Reservation::new_pending(uid, "cabin-7", date(start), date(end), "sea view")
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn reserve_should_work_for_valid_window() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let rsvp = manager
            .reserve(stay("alice", "2025-06-02", "2025-06-05"))
            .await
            .unwrap();
        assert!(!rsvp.id.is_empty());
        assert_eq!(manager.get(rsvp.id.clone()).await.unwrap(), rsvp);
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn reserve_conflict_reservation_should_reject() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let first = manager
            .reserve(stay("alice", "2025-06-02", "2025-06-05"))
            .await
            .unwrap();
        manager.confirm(first.id).await.unwrap();

        let err = manager
            .reserve(stay("bob", "2025-06-04", "2025-06-08"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            abi::Error::ConflictReservation(ReservationConflictInfo::Parsed(_))
        ));
        assert!(manager
            .reserve(stay("bob", "2025-06-05", "2025-06-08"))
            .await
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a local postgres"]
    async fn concurrent_overlapping_reserves_should_admit_one() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let (m1, m2) = (manager.clone(), manager.clone());
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { m1.reserve(stay("alice", "2025-06-02", "2025-06-06")).await }),
            tokio::spawn(async move { m2.reserve(stay("bob", "2025-06-04", "2025-06-08")).await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(abi::Error::ConflictReservation(_)))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "requires a local postgres"]
    async fn concurrent_disjoint_reserves_should_all_succeed() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        for i in 0..20 {
            manager
                .add_window(abi::AvailabilityWindow::new_available(
                    format!("p-{}", i),
                    date("2025-06-01"),
                    date("2025-06-10"),
                ))
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..20 {
            let m = manager.clone();
            let rsvp = Reservation::new_pending(
                "alice",
                format!("p-{}", i),
                date("2025-06-02"),
                date("2025-06-05"),
                "",
            );
            handles.push(tokio::spawn(async move { m.reserve(rsvp).await }));
        }
        // back-to-back nights of one product never overlap either
        for day in 1..9 {
            let m = manager.clone();
            let start = date("2025-06-01") + chrono::Duration::days(day);
            let rsvp = Reservation::new_pending(
                "bob",
                "cabin-7",
                start,
                start + chrono::Duration::days(1),
                "",
            );
            handles.push(tokio::spawn(async move { m.reserve(rsvp).await }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "{:?}", result);
        }
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn exclusion_constraint_should_reject_direct_insert() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        manager
            .reserve(stay("alice", "2025-06-02", "2025-06-05"))
            .await
            .unwrap();

        let err: abi::Error = sqlx::query(
            "INSERT INTO rsvp.reservations (user_id, product_id, start_date, end_date) VALUES ('bob', 'cabin-7', '2025-06-04', '2025-06-08')",
        )
        .execute(&manager.pool)
        .await
        .unwrap_err()
        .into();
        let expected = abi::ReservationConflict {
            new: abi::ReservationWindow::new("cabin-7", date("2025-06-04"), date("2025-06-08"))
                .unwrap(),
            old: vec![
                abi::ReservationWindow::new("cabin-7", date("2025-06-02"), date("2025-06-05"))
                    .unwrap(),
            ],
        };
        assert_eq!(
            err,
            abi::Error::ConflictReservation(ReservationConflictInfo::Parsed(expected))
        );
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn cancel_should_free_the_range() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let first = manager
            .reserve(stay("alice", "2025-06-02", "2025-06-05"))
            .await
            .unwrap();
        let cancelled = manager.cancel(first.id.clone()).await.unwrap();
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
        assert!(matches!(
            manager.cancel(first.id).await.unwrap_err(),
            abi::Error::InvalidStatusTransition { .. }
        ));
        assert!(manager
            .reserve(stay("bob", "2025-06-02", "2025-06-05"))
            .await
            .is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn outside_availability_should_reject() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let err = manager
            .reserve(stay("alice", "2025-06-08", "2025-06-12"))
            .await
            .unwrap_err();
        assert!(matches!(err, abi::Error::OutsideAvailability(_)));
    }

    #[tokio::test]
    #[ignore = "requires a local postgres"]
    async fn query_and_update_note_should_work() {
        let tdb = test_db();
        let manager = manager_with_june(&tdb).await;
        let rsvp = manager
            .reserve(stay("alice", "2025-06-02", "2025-06-05"))
            .await
            .unwrap();
        let rsvp = manager
            .update_note(rsvp.id, "two dogs".into())
            .await
            .unwrap();
        assert_eq!(rsvp.note, "two dogs");

        let found = manager
            .query(ReservationQuery::for_user("alice"))
            .await
            .unwrap();
        assert_eq!(found, vec![rsvp]);
        assert_eq!(
            manager.get("not-a-uuid".into()).await.unwrap_err(),
            abi::Error::InvalidReservationId("not-a-uuid".into())
        );
    }
}
