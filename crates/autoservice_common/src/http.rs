// --- File: crates/autoservice_common/src/http.rs ---
use reqwest::Url;

use crate::error::BackendError;

// Include the client module
pub mod client;

/// Builds a backend GET URL such as `<base>?action=getAvailableSlots&date=2024-06-10`.
///
/// Parameters are url-encoded; an existing query string on `base` is preserved.
pub fn action_url<P: serde::Serialize>(base: &str, params: &P) -> Result<Url, BackendError> {
    let mut url = Url::parse(base).map_err(|err| BackendError::InvalidUrl(format!("{base}: {err}")))?;
    let encoded = serde_urlencoded::to_string(params)
        .map_err(|err| BackendError::InvalidUrl(format!("query parameters: {err}")))?;
    let query = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
        _ => encoded,
    };
    url.set_query(Some(&query));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_url_encodes_parameters() {
        let url = action_url(
            "https://script.example/macros/s/abc/exec",
            &[("action", "getAvailableSlots"), ("date", "2024-06-10")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://script.example/macros/s/abc/exec?action=getAvailableSlots&date=2024-06-10"
        );
    }

    #[test]
    fn action_url_keeps_existing_query() {
        let url = action_url("https://script.example/exec?v=2", &[("action", "getBookingStatus")])
            .unwrap();
        assert_eq!(url.query(), Some("v=2&action=getBookingStatus"));
    }

    #[test]
    fn action_url_rejects_relative_base() {
        let err = action_url("not a url", &[("action", "x")]).unwrap_err();
        assert!(matches!(err, BackendError::InvalidUrl(_)));
    }
}
