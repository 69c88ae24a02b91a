mod availability;
mod conflict;
mod manager;
mod memory;

use abi::{ProductId, ReservationId};
use async_trait::async_trait;
use sqlx::PgPool;

pub use availability::AvailabilityIndex;
pub use conflict::{check_reservable, ConflictDetector};
pub use memory::MemoryManager;

/// Reservations backed by the `rsvp` schema in postgres.
#[derive(Debug, Clone)]
pub struct ReservationManager {
    pool: PgPool,
}

#[async_trait]
pub trait Rsvp: Send + Sync {
    /// make a reservation, checked against availability and existing reservations
    async fn reserve(&self, rsvp: abi::Reservation) -> Result<abi::Reservation, abi::Error>;
    /// pending -> confirmed
    async fn confirm(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error>;
    /// pending / confirmed -> cancelled
    async fn cancel(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error>;
    /// update note
    async fn update_note(
        &self,
        id: ReservationId,
        note: String,
    ) -> Result<abi::Reservation, abi::Error>;
    /// get reservation by id
    async fn get(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error>;
    /// availability windows of a product in insertion order, all statuses
    async fn windows(&self, pid: ProductId) -> Result<Vec<abi::AvailabilityWindow>, abi::Error>;
    /// query reservations by product and / or user
    async fn query(
        &self,
        query: abi::ReservationQuery,
    ) -> Result<Vec<abi::Reservation>, abi::Error>;

    /// taken and open days of every bookable window of a product
    async fn availability(
        &self,
        pid: ProductId,
    ) -> Result<Vec<abi::WindowAvailability>, abi::Error> {
        abi::validate_product_id(&pid)?;
        let windows = self.windows(pid.clone()).await?;
        let reservations = self.query(abi::ReservationQuery::for_product(&pid)).await?;

        let index = AvailabilityIndex::new(&windows)?;
        let detector = ConflictDetector::new(&pid, &reservations)?;
        Ok(index
            .bookable_windows()
            .iter()
            .map(|window| abi::WindowAvailability {
                window: Some((*window).into()),
                blocked: detector
                    .blocked_ranges(window)
                    .into_iter()
                    .map(Into::into)
                    .collect(),
                free: detector
                    .free_ranges(window)
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            })
            .collect())
    }
}
