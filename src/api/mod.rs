// Thin namespace wrapper for API-layer components
use utoipa::OpenApi;

use crate::errors::ErrorBody;
use crate::models::{
    BookingConfig, BudgetRange, ContactResponse, ContactSubmission, DataSensitivity, Industry,
    ProjectUrgency, RoiParams, TeamSize, Tool,
};

pub mod handlers {
    pub use crate::handlers::*;
}

/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "intake-api",
        description = "Contact-form intake pipeline: validation, anti-spam, rate limiting and notification fan-out."
    ),
    paths(
        crate::handlers::submit_contact,
        crate::handlers::booking_config,
        crate::handlers::health
    ),
    components(schemas(
        ContactSubmission,
        ContactResponse,
        BookingConfig,
        ErrorBody,
        RoiParams,
        Industry,
        TeamSize,
        DataSensitivity,
        BudgetRange,
        ProjectUrgency,
        Tool
    ))
)]
pub struct ApiDoc;
