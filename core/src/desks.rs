//! Desk registration and maintenance.

use crate::error::{HelpdeskError, Result};
use crate::repository::{DeskRepository, HelpdeskStore};
use crate::types::{CustomerId, Desk, DeskId, EditDeskRequest, RegisterDeskRequest};

/// Registers, edits, and lists desks.
#[derive(Clone)]
pub struct DeskService<S> {
    store: S,
}

impl<S: HelpdeskStore> DeskService<S> {
    /// Create a service over the given store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a desk with an empty queue.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidInput`]: request absent or attendant name blank
    /// - [`HelpdeskError::DuplicateAttendant`]: attendant already staffs a desk
    /// - [`HelpdeskError::Storage`]: the store failed
    #[tracing::instrument(skip(self, request))]
    pub async fn register_desk(&self, request: Option<RegisterDeskRequest>) -> Result<Desk> {
        let request = request
            .ok_or_else(|| HelpdeskError::InvalidInput("desk request is required".to_string()))?;
        let attendant_name = request.attendant_name.trim();
        if attendant_name.is_empty() {
            return Err(HelpdeskError::InvalidInput(
                "attendant name must not be blank".to_string(),
            ));
        }

        if self.attendant_has_desk(attendant_name).await? {
            tracing::warn!(attendant = attendant_name, "Attendant already has a desk");
            return Err(HelpdeskError::DuplicateAttendant(attendant_name.to_string()));
        }

        let desk = DeskRepository::save(&self.store, Desk::new(attendant_name)).await?;
        tracing::info!(desk_id = %desk.id, attendant = %desk.attendant_name, "Desk registered");
        Ok(desk)
    }

    /// Overwrite a desk's attendant and cached occupancy.
    ///
    /// # Errors
    ///
    /// - [`HelpdeskError::InvalidInput`]: request absent or `request.id != id`
    /// - [`HelpdeskError::NotFound`]: no desk with that id
    /// - [`HelpdeskError::Storage`]: the store failed
    #[tracing::instrument(skip(self, request), fields(desk_id = %id))]
    pub async fn edit_desk(&self, request: Option<EditDeskRequest>, id: DeskId) -> Result<Desk> {
        let request = request
            .ok_or_else(|| HelpdeskError::InvalidInput("desk request is required".to_string()))?;
        if request.id != id {
            return Err(HelpdeskError::InvalidInput(format!(
                "desk id {} in the body does not match {id}",
                request.id
            )));
        }

        let mut desk = DeskRepository::find_by_id(&self.store, id)
            .await?
            .ok_or(HelpdeskError::NotFound {
                resource: "Desk",
                id: id.get(),
            })?;

        desk.attendant_name = request.attendant_name;
        desk.queue_occupancy = request.queue_occupancy;

        let desk = DeskRepository::save(&self.store, desk).await?;
        tracing::info!("Desk updated");
        Ok(desk)
    }

    /// All desks.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Storage`] if the store fails.
    pub async fn list_desks(&self) -> Result<Vec<Desk>> {
        Ok(DeskRepository::find_all(&self.store).await?)
    }

    /// Desks that have served the customer.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::Storage`] if the store fails.
    pub async fn desks_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Desk>> {
        Ok(DeskRepository::find_by_customer_id(&self.store, customer_id).await?)
    }

    async fn attendant_has_desk(&self, attendant_name: &str) -> Result<bool> {
        let desks = DeskRepository::find_all(&self.store).await?;
        Ok(desks.iter().any(|desk| desk.attendant_name == attendant_name))
    }
}
