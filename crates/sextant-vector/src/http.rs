use reqwest::Response;
use sextant_core::error::{Result, SextantError};

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Turn a non-2xx upstream response into a `Provider` error.
pub(crate) async fn ensure_success(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(SextantError::Provider(format!(
        "{} failed with status {}: {}",
        what, status, body
    )))
}

pub(crate) fn transport_error(what: &str, err: reqwest::Error) -> SextantError {
    SextantError::Provider(format!("{}: {}", what, err))
}
