use abi::{ProductId, ReservationId, ReservationStatus};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{check_reservable, Rsvp};

/// In-process reservations. The lock is held across check and insert, so
/// creates for the same product are serialized.
#[derive(Debug, Default)]
pub struct MemoryManager {
    store: Mutex<Store>,
}

#[derive(Debug, Default)]
struct Store {
    windows: Vec<abi::AvailabilityWindow>,
    reservations: Vec<abi::Reservation>,
    next_window_id: i64,
}

impl Store {
    fn find(&self, id: &str) -> Result<&abi::Reservation, abi::Error> {
        self.reservations
            .iter()
            .find(|r| r.id == id)
            .ok_or(abi::Error::NotFound)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut abi::Reservation, abi::Error> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(abi::Error::NotFound)
    }

    fn windows_of(&self, pid: &str) -> Vec<abi::AvailabilityWindow> {
        self.windows
            .iter()
            .filter(|w| w.product_id == pid)
            .cloned()
            .collect()
    }

    fn transition(
        &mut self,
        id: &str,
        to: ReservationStatus,
    ) -> Result<abi::Reservation, abi::Error> {
        let rsvp = self.find_mut(id)?;
        rsvp.status = rsvp.status().transition(to)? as i32;
        Ok(rsvp.clone())
    }
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an availability window. Ids are assigned in insertion order.
    pub async fn add_window(
        &self,
        mut window: abi::AvailabilityWindow,
    ) -> Result<abi::AvailabilityWindow, abi::Error> {
        window.validate()?;
        let mut store = self.store.lock().await;
        store.next_window_id += 1;
        window.id = store.next_window_id;
        store.windows.push(window.clone());
        Ok(window)
    }
}

// ids are uuids, like the postgres backend
fn parse_id(id: &str) -> Result<(), abi::Error> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| abi::Error::InvalidReservationId(id.to_string()))
}

#[async_trait]
impl Rsvp for MemoryManager {
    async fn reserve(&self, mut rsvp: abi::Reservation) -> Result<abi::Reservation, abi::Error> {
        rsvp.validate()?;
        let proposed = rsvp.window()?;

        let mut store = self.store.lock().await;
        let windows = store.windows_of(&rsvp.product_id);
        check_reservable(&windows, &store.reservations, &proposed)?;

        rsvp.id = Uuid::new_v4().to_string();
        rsvp.status = ReservationStatus::Pending as i32;
        store.reservations.push(rsvp.clone());
        debug!("reserved {} as {}", proposed, rsvp.id);
        Ok(rsvp)
    }

    async fn confirm(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        parse_id(&id)?;
        let mut store = self.store.lock().await;
        store.transition(&id, ReservationStatus::Confirmed)
    }

    async fn cancel(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        parse_id(&id)?;
        let mut store = self.store.lock().await;
        store.transition(&id, ReservationStatus::Cancelled)
    }

    async fn update_note(
        &self,
        id: ReservationId,
        note: String,
    ) -> Result<abi::Reservation, abi::Error> {
        parse_id(&id)?;
        let mut store = self.store.lock().await;
        let rsvp = store.find_mut(&id)?;
        rsvp.note = note;
        Ok(rsvp.clone())
    }

    async fn get(&self, id: ReservationId) -> Result<abi::Reservation, abi::Error> {
        parse_id(&id)?;
        let store = self.store.lock().await;
        store.find(&id).cloned()
    }

    async fn windows(&self, pid: ProductId) -> Result<Vec<abi::AvailabilityWindow>, abi::Error> {
        abi::validate_product_id(&pid)?;
        let store = self.store.lock().await;
        Ok(store.windows_of(&pid))
    }

    async fn query(
        &self,
        query: abi::ReservationQuery,
    ) -> Result<Vec<abi::Reservation>, abi::Error> {
        query.validate()?;
        let store = self.store.lock().await;
        let mut found: Vec<_> = store
            .reservations
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        // same order as the postgres backend: by check-in, then insertion
        found.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(found)
    }
}
