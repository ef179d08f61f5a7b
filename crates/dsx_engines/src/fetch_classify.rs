#![forbid(unsafe_code)]

use dsx_contracts::fetch::{FetchFailure, FetchedContent};

pub fn classify_fetch_response(status: u16, body: &str) -> Result<FetchedContent, FetchFailure> {
    match status {
        200 => Ok(FetchedContent::classify(body)),
        401 => Err(FetchFailure::CredentialExpired),
        404 => Err(FetchFailure::NotFound),
        _ => Err(FetchFailure::Http {
            status,
            body: body.to_string(),
        }),
    }
}
