use async_trait::async_trait;

use crate::Result;

/// A fully prepared outbound request.
///
/// `url` is absolute. The body is carried as the exact bytes that were
/// signed, so the transport must send it unmodified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method, uppercase (`GET`, `POST`, ...)
    pub method: String,
    /// Absolute URL including query
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes; empty for bodiless requests
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Look up a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as received from the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes, unmodified (verification hashes these exactly)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Look up a header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends HTTP requests on behalf of the client.
///
/// Errors returned here are transport-class (`Transport`,
/// `ConnectionFailed`, `ConnectionTimeout`). Non-2xx statuses are not
/// errors at this layer; they come back as ordinary responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute a request and return the raw response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("wechatpay-serial".to_string(), "ABC".to_string())],
            body: Vec::new(),
        };
        assert_eq!(response.header("Wechatpay-Serial"), Some("ABC"));
        assert_eq!(response.header("Wechatpay-Nonce"), None);
        assert!(response.is_success());
    }
}
