use http::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::HttpError;

/// One outbound call, kept in a replayable form.
///
/// `retried` flips to `true` at most once, when the gate replays the call after
/// a token refresh. Requests marked `excluded_from_refresh` (the refresh and
/// logout calls themselves) never start a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    retried: bool,
    excluded_from_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
            excluded_from_refresh: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn excluded_from_refresh(mut self) -> Self {
        self.excluded_from_refresh = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn is_excluded_from_refresh(&self) -> bool {
        self.excluded_from_refresh
    }

    pub(crate) fn mark_retried(&mut self) {
        debug_assert!(!self.retried, "a request is replayed at most once");
        self.retried = true;
    }
}

/// Fully buffered response; the body is read before the gate inspects the status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub(crate) fn into_status_error(self, path: &str) -> HttpError {
        let body = self.text();
        HttpError::status(path, self.status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn builder_collects_query_and_flags() {
        let req = ApiRequest::get("/albums")
            .query("sort", "LATEST")
            .query("page", 0)
            .query("size", 4);

        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/albums");
        assert_eq!(
            req.query_pairs(),
            &[
                ("sort".to_string(), "LATEST".to_string()),
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "4".to_string()),
            ]
        );
        assert!(!req.is_retried());
        assert!(!req.is_excluded_from_refresh());
        assert!(ApiRequest::post("/auth/reissue")
            .excluded_from_refresh()
            .is_excluded_from_refresh());
    }

    #[test]
    fn mark_retried_flips_once() {
        let mut req = ApiRequest::delete("/albums/3");
        req.mark_retried();
        assert!(req.is_retried());
    }

    #[test]
    fn json_decode_errors_name_the_path() {
        #[derive(Debug, Deserialize)]
        struct Body {
            #[allow(dead_code)]
            id: u64,
        }

        let ok = ApiResponse::new(StatusCode::OK, br#"{"id": 7}"#.to_vec());
        assert!(ok.json::<Body>("/albums/7").is_ok());

        let bad = ApiResponse::new(StatusCode::OK, b"not json".to_vec());
        match bad.json::<Body>("/albums/7") {
            Err(HttpError::Decode { path, .. }) => assert_eq!(path, "/albums/7"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn status_error_keeps_body_text() {
        let resp = ApiResponse::new(StatusCode::NOT_FOUND, b"missing".to_vec());
        match resp.into_status_error("/albums/9") {
            HttpError::Status { status, body, path } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "missing");
                assert_eq!(path, "/albums/9");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
