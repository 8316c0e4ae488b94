pub mod admin;
pub mod campaigns;
pub mod deliverables;
pub mod feedback;
pub mod subscriptions;

use uuid::Uuid;

use crate::{error::HttpError, service::error::ServiceError};

/// Maps a service failure to its HTTP error, logging the route and caller.
pub(crate) fn service_error(route: &'static str, user_id: Uuid) -> impl FnOnce(ServiceError) -> HttpError {
    move |error| {
        tracing::warn!("{} failed for user {}: {}", route, user_id, error);
        HttpError::from(error)
    }
}
