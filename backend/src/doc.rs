//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint of the inbound layer together
//! with the schema mirrors from [`crate::inbound::http::schemas`], which
//! describe domain types without coupling them to utoipa.
//!
//! The document backs Swagger UI in debug builds and is exported by
//! `cargo run --bin openapi-dump` for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::schemas::{ErrorCodeSchema, SubmissionSchema};
use crate::inbound::http::submissions::{CreatedResponse, DeletedResponse, ListResponse};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Signal equipment intake API",
        description = "Questionnaire submission intake, administration and attachment downloads.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::submissions::create_submission,
        crate::inbound::http::submissions::list_submissions,
        crate::inbound::http::submissions::delete_submission,
        crate::inbound::http::uploads::download_attachment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        SubmissionSchema,
        ErrorCodeSchema,
        ErrorEnvelope,
        CreatedResponse,
        ListResponse,
        DeletedResponse
    )),
    tags(
        (name = "submissions", description = "Questionnaire submissions"),
        (name = "uploads", description = "Stored attachments"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
