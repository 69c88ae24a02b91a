use abi::{
    reservation_service_server::ReservationService, AvailabilityRequest, AvailabilityResponse,
    CancelRequest, CancelResponse, ConfirmRequest, ConfirmResponse, GetRequest, GetResponse,
    Identity, QueryRequest, QueryResponse, Reservation, ReservationId, ReserveRequest,
    ReserveResponse, UpdateRequest, UpdateResponse, WindowsRequest, WindowsResponse,
};
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use crate::{
    auth::{authorize, identity_from_metadata, redact_foreign, Capability},
    RsvpService,
};

fn reject(op: &str, e: abi::Error) -> Status {
    warn!("{} rejected: {}", op, e);
    e.into()
}

impl RsvpService {
    /// Load a reservation for its owner or an admin. For anyone else it reads
    /// as missing, the same as an id that does not exist.
    async fn load_owned(
        &self,
        op: &str,
        caller: Option<&Identity>,
        id: ReservationId,
    ) -> Result<Reservation, Status> {
        if caller.is_none() {
            return Err(reject(op, abi::Error::Unauthenticated));
        }
        let rsvp = self.manager.get(id).await.map_err(|e| reject(op, e))?;
        match authorize(caller, Capability::ActFor(&rsvp.user_id)) {
            Ok(_) => Ok(rsvp),
            Err(abi::Error::PermissionDenied(reason)) => {
                warn!("{} rejected: {}", op, reason);
                Err(abi::Error::NotFound.into())
            }
            Err(e) => Err(reject(op, e)),
        }
    }
}

#[tonic::async_trait]
impl ReservationService for RsvpService {
    async fn reserve(
        &self,
        request: Request<ReserveRequest>,
    ) -> Result<Response<ReserveResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        let mut rsvp = request
            .into_inner()
            .reservation
            .ok_or_else(|| Status::invalid_argument("missing reservation"))?;

        // an empty user books for the caller; naming someone else needs admin
        let capability = if rsvp.user_id.is_empty() {
            Capability::Book
        } else {
            Capability::ActFor(&rsvp.user_id)
        };
        let caller = authorize(caller.as_ref(), capability).map_err(|e| reject("reserve", e))?;
        if rsvp.user_id.is_empty() {
            rsvp.user_id = caller.user_id.clone();
        }

        let rsvp = self
            .manager
            .reserve(rsvp)
            .await
            .map_err(|e| reject("reserve", e))?;
        info!(
            "{} reserved {} [{}, {})",
            rsvp.user_id, rsvp.product_id, rsvp.start, rsvp.end
        );
        Ok(Response::new(ReserveResponse {
            reservation: Some(rsvp),
        }))
    }

    async fn confirm(
        &self,
        request: Request<ConfirmRequest>,
    ) -> Result<Response<ConfirmResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        authorize(caller.as_ref(), Capability::Confirm).map_err(|e| reject("confirm", e))?;

        let id = request.into_inner().id;
        let rsvp = self
            .manager
            .confirm(id)
            .await
            .map_err(|e| reject("confirm", e))?;
        info!("confirmed {}", rsvp.id);
        Ok(Response::new(ConfirmResponse {
            reservation: Some(rsvp),
        }))
    }

    async fn cancel(
        &self,
        request: Request<CancelRequest>,
    ) -> Result<Response<CancelResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        let id = request.into_inner().id;
        let owned = self.load_owned("cancel", caller.as_ref(), id).await?;

        let rsvp = self
            .manager
            .cancel(owned.id)
            .await
            .map_err(|e| reject("cancel", e))?;
        info!("cancelled {}", rsvp.id);
        Ok(Response::new(CancelResponse {
            reservation: Some(rsvp),
        }))
    }

    async fn update(
        &self,
        request: Request<UpdateRequest>,
    ) -> Result<Response<UpdateResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        let UpdateRequest { id, note } = request.into_inner();
        let owned = self.load_owned("update", caller.as_ref(), id).await?;

        let rsvp = self
            .manager
            .update_note(owned.id, note)
            .await
            .map_err(|e| reject("update", e))?;
        Ok(Response::new(UpdateResponse {
            reservation: Some(rsvp),
        }))
    }

    async fn get(&self, request: Request<GetRequest>) -> Result<Response<GetResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        let id = request.into_inner().id;
        let rsvp = self.load_owned("get", caller.as_ref(), id).await?;
        Ok(Response::new(GetResponse {
            reservation: Some(rsvp),
        }))
    }

    async fn windows(
        &self,
        request: Request<WindowsRequest>,
    ) -> Result<Response<WindowsResponse>, Status> {
        let pid = request.into_inner().product_id;
        let windows = self
            .manager
            .windows(pid)
            .await
            .map_err(|e| reject("windows", e))?;
        Ok(Response::new(WindowsResponse { windows }))
    }

    async fn availability(
        &self,
        request: Request<AvailabilityRequest>,
    ) -> Result<Response<AvailabilityResponse>, Status> {
        let product_id = request.into_inner().product_id;
        let windows = self
            .manager
            .availability(product_id.clone())
            .await
            .map_err(|e| reject("availability", e))?;
        Ok(Response::new(AvailabilityResponse {
            product_id,
            windows,
        }))
    }

    async fn query(
        &self,
        request: Request<QueryRequest>,
    ) -> Result<Response<QueryResponse>, Status> {
        let caller = identity_from_metadata(request.metadata());
        let query = request
            .into_inner()
            .query
            .ok_or_else(|| Status::invalid_argument("missing query"))?;

        // a product listing is public; a user listing needs that user or admin
        if !query.user_id.is_empty() {
            authorize(caller.as_ref(), Capability::ActFor(&query.user_id))
                .map_err(|e| reject("query", e))?;
        }

        let mut reservations = self
            .manager
            .query(query)
            .await
            .map_err(|e| reject("query", e))?;
        for rsvp in reservations.iter_mut() {
            redact_foreign(caller.as_ref(), rsvp);
        }
        Ok(Response::new(QueryResponse { reservations }))
    }
}
