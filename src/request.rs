//! Request descriptors passed through the interceptor chain.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::ClientError;
use crate::credential::{bearer, kind_of, CredentialKind};
use crate::options::RequestOptions;

/// Method, path, query, body and explicit headers of one call.
///
/// Fields are read-only; interceptors produce a new descriptor through the
/// consuming `with_*` methods.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Kind of the credential currently on the request, if any.
    pub fn credential_kind(&self) -> Option<CredentialKind> {
        self.headers.get(AUTHORIZATION).map(kind_of)
    }

    /// Add query parameters from any struct that serializes to a flat object.
    /// `null` fields are skipped.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self, ClientError> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        Value::Null => {}
                        Value::String(s) => self.query.push((key, s)),
                        other => self.query.push((key, other.to_string())),
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            _ => Err(ClientError::Config(
                "query parameters must serialize to an object".to_string(),
            )),
        }
    }

    pub fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add `defaults` for every header this request does not already set.
    pub fn with_default_headers(mut self, defaults: &HeaderMap) -> Self {
        for (name, value) in defaults {
            if !self.headers.contains_key(name) {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        self
    }

    /// Apply per-call overrides: extra headers first, then the explicit credential.
    pub fn with_options(mut self, options: &RequestOptions) -> Result<Self, ClientError> {
        if let Some(extra) = &options.extra_headers {
            self = self.with_extra_headers(extra)?;
        }
        if let Some(credential) = &options.explicit_credential {
            let value = bearer(credential)
                .ok_or_else(|| ClientError::Config("credential is not a valid header value".to_string()))?;
            self.headers.insert(AUTHORIZATION, value);
        }
        Ok(self)
    }

    pub fn with_extra_headers(mut self, extra: &HashMap<String, String>) -> Result<Self, ClientError> {
        for (key, value) in extra {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid header name {key:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("invalid value for header {key:?}: {e}")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListParams;

    #[test]
    fn test_query_from_params_skips_unset() {
        let params = ListParams {
            page: Some(2),
            limit: Some(20),
            search: Some("acme".to_string()),
            ..Default::default()
        };
        let desc = RequestDescriptor::new(Method::GET, "/v1/organizations")
            .with_query(&params)
            .unwrap();
        let mut query = desc.query().to_vec();
        query.sort();
        assert_eq!(
            query,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "acme".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_credential_option() {
        let desc = RequestDescriptor::new(Method::GET, "/v1/models")
            .with_options(&RequestOptions::with_credential("sk-or-v1-abc"))
            .unwrap();
        assert_eq!(desc.headers().get(AUTHORIZATION).unwrap(), "Bearer sk-or-v1-abc");
        assert_eq!(desc.credential_kind(), Some(CredentialKind::Caller));
    }

    #[test]
    fn test_explicit_credential_beats_extra_authorization_header() {
        let options = RequestOptions::with_credential("sk-or-v1-abc")
            .with_header("Authorization".to_string(), "Bearer other".to_string());
        let desc = RequestDescriptor::new(Method::GET, "/v1/models")
            .with_options(&options)
            .unwrap();
        assert_eq!(desc.headers().get(AUTHORIZATION).unwrap(), "Bearer sk-or-v1-abc");
    }

    #[test]
    fn test_default_headers_fill_only_unset() {
        let mut defaults = HeaderMap::new();
        defaults.insert(AUTHORIZATION, HeaderValue::from_static("Bearer sk-or-v1-global"));
        defaults.insert("x-client", HeaderValue::from_static("admin"));

        let desc = RequestDescriptor::new(Method::GET, "/v1/models").with_default_headers(&defaults);
        assert_eq!(desc.credential_kind(), Some(CredentialKind::Caller));
        assert_eq!(desc.headers().get("x-client").unwrap(), "admin");

        let desc = RequestDescriptor::new(Method::GET, "/v1/models")
            .with_options(&RequestOptions::with_credential("sk-or-v1-call"))
            .unwrap()
            .with_default_headers(&defaults);
        assert_eq!(desc.headers().get(AUTHORIZATION).unwrap(), "Bearer sk-or-v1-call");
    }

    #[test]
    fn test_invalid_extra_header_is_config_error() {
        let options = RequestOptions::default().with_header("bad header".to_string(), "v".to_string());
        let err = RequestDescriptor::new(Method::GET, "/")
            .with_options(&options)
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
