//! Print the OpenAPI document as JSON.

use std::io::{self, Write};

use intake_backend::ApiDoc;
use utoipa::OpenApi;

fn main() -> io::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| io::Error::other(format!("failed to serialise OpenAPI document: {e}")))?;
    writeln!(io::stdout().lock(), "{json}")
}
