//! reqwest client construction and request building.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};

use crate::options::ClientOptions;
use crate::request::RequestDescriptor;

/// Build the client used for unary calls: proxy plus the fixed timeout.
pub fn build_http_client(options: &ClientOptions) -> Result<Client, reqwest::Error> {
    builder(options).timeout(options.timeout).build()
}

/// Build the client used for streaming calls. No timeout: the server ends the stream.
pub fn build_streaming_client(options: &ClientOptions) -> Result<Client, reqwest::Error> {
    builder(options).build()
}

fn builder(options: &ClientOptions) -> reqwest::ClientBuilder {
    let mut builder = Client::builder();

    if let Some(proxy_url) = &options.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => tracing::warn!("ignoring invalid proxy {}: {}", proxy_url, e),
        }
    }

    builder
}

/// Convert configured extra headers into a header map.
///
/// Entries that are not valid header names or values are skipped.
pub fn extra_header_map(extra_headers: &Option<HashMap<String, String>>) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!("skipping invalid extra header {:?}", key),
            }
        }
    }
    map
}

/// Turn a descriptor into a ready-to-send request.
///
/// Only the descriptor's headers are sent; client-wide extras must already
/// be merged into it (see [`RequestDescriptor::with_default_headers`]).
pub fn build_request(
    client: &Client,
    options: &ClientOptions,
    descriptor: &RequestDescriptor,
) -> RequestBuilder {
    let mut headers = descriptor.headers().clone();
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    let mut req = client
        .request(descriptor.method().clone(), options.url(descriptor.path()))
        .headers(headers);

    if !descriptor.query().is_empty() {
        req = req.query(descriptor.query());
    }
    if let Some(body) = descriptor.body() {
        req = req.json(body);
    }
    req
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RequestOptions;
    use reqwest::header::AUTHORIZATION;
    use reqwest::Method;
    use std::time::Duration;

    #[test]
    fn test_build_http_client() {
        let options = ClientOptions::default().with_timeout(Duration::from_secs(5));
        assert!(build_http_client(&options).is_ok());
        assert!(build_streaming_client(&options).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let options = ClientOptions::default().with_proxy("http://proxy.example.com:8080".to_string());
        assert!(build_http_client(&options).is_ok());
    }

    #[test]
    fn test_build_request() {
        let options = ClientOptions::default()
            .with_base_url("http://gw:8000".to_string())
            .with_header("Authorization".to_string(), "Bearer global".to_string())
            .with_header("X-Client".to_string(), "admin".to_string());
        let client = build_http_client(&options).unwrap();
        let descriptor = RequestDescriptor::new(Method::GET, "/v1/api-keys")
            .with_query(&[("page", 1)].into_iter().collect::<HashMap<_, _>>())
            .unwrap()
            .with_options(&RequestOptions::with_credential("sk-or-v1-abc"))
            .unwrap()
            .with_default_headers(&extra_header_map(&options.extra_headers));

        let request = build_request(&client, &options, &descriptor).build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "http://gw:8000/v1/api-keys?page=1");
        assert_eq!(request.headers().get("x-client").unwrap(), "admin");
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer sk-or-v1-abc");
        assert_eq!(request.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
