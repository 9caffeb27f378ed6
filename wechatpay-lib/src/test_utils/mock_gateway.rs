//! Scripted in-process gateway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::fixtures::{encrypted_certificate_entry, platform_signer, PLATFORM_CERT_1, PLATFORM_SERIAL_1};
use crate::certificates::{CertificateEntry, CertificateListResponse};
use crate::signing::{build_message, current_timestamp, generate_nonce, Signer};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::verification::{HEADER_NONCE, HEADER_SERIAL, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use crate::{Result, WechatPayError, CERTIFICATES_PATH};

/// How the gateway answers a scripted route.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Body signed with the active platform key.
    Signed { status: u16, body: String },
    /// Signature computed over a different body.
    Tampered { status: u16, body: String },
    /// No signature headers at all.
    Unsigned { status: u16, body: String },
    /// Transport-level failure.
    Fail(String),
}

struct GatewayState {
    routes: HashMap<(String, String), MockReply>,
    certificates: Vec<CertificateEntry>,
    listing_available: bool,
    signer: Signer,
    requests: Vec<HttpRequest>,
}

/// An [`HttpTransport`] that plays the gateway.
///
/// `GET /v3/certificates` serves the configured certificate listing (by
/// default platform certificate 1). Other routes answer with whatever was
/// scripted for their method and path; unscripted routes get a 404 error
/// body. Every request is recorded.
#[derive(Clone)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    /// Create a gateway signing with platform key 1.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GatewayState {
                routes: HashMap::new(),
                certificates: vec![encrypted_certificate_entry(PLATFORM_SERIAL_1, PLATFORM_CERT_1)],
                listing_available: true,
                signer: platform_signer(1),
                requests: Vec::new(),
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().expect("gateway lock")
    }

    /// Script the reply for a method and path.
    pub fn reply(&self, method: &str, path: &str, reply: MockReply) {
        self.state()
            .routes
            .insert((method.to_uppercase(), path.to_string()), reply);
    }

    /// Script a correctly signed reply.
    pub fn respond_signed(&self, method: &str, path: &str, status: u16, body: &str) {
        self.reply(
            method,
            path,
            MockReply::Signed {
                status,
                body: body.to_string(),
            },
        );
    }

    /// Replace the served certificate listing.
    pub fn set_certificates(&self, entries: Vec<CertificateEntry>) {
        self.state().certificates = entries;
    }

    /// Make the listing call fail (or succeed again).
    pub fn set_listing_available(&self, available: bool) {
        self.state().listing_available = available;
    }

    /// Sign subsequent replies with platform key 1 or 2.
    pub fn use_platform_key(&self, index: u8) {
        self.state().signer = platform_signer(index);
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    /// Requests received for a path, ignoring query.
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| path_of(&r.url) == path)
            .collect()
    }

    /// Signature headers the gateway would attach to `body`.
    pub fn sign_headers(&self, body: &[u8]) -> Vec<(String, String)> {
        let signer = self.state().signer.clone();
        signed_headers(&signer, body)
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn path_of(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

fn signed_headers(signer: &Signer, body: &[u8]) -> Vec<(String, String)> {
    let timestamp = current_timestamp().to_string();
    let nonce = generate_nonce();
    let message = build_message(&[timestamp.as_bytes(), nonce.as_bytes(), body]);
    let signature = signer.sign(&message).expect("platform key signs");

    vec![
        (HEADER_TIMESTAMP.to_string(), timestamp),
        (HEADER_NONCE.to_string(), nonce),
        (HEADER_SERIAL.to_string(), signer.serial_no().to_string()),
        (HEADER_SIGNATURE.to_string(), signature),
    ]
}

#[async_trait]
impl HttpTransport for MockGateway {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = self.state();
        state.requests.push(request.clone());

        let path = path_of(&request.url);
        let reply = if request.method == "GET" && path == CERTIFICATES_PATH {
            if !state.listing_available {
                return Err(WechatPayError::ConnectionFailed {
                    target: request.url,
                    reason: "listing disabled".into(),
                });
            }
            let listing = CertificateListResponse {
                data: state.certificates.clone(),
            };
            MockReply::Unsigned {
                status: 200,
                body: serde_json::to_string(&listing)?,
            }
        } else {
            state
                .routes
                .get(&(request.method.clone(), path))
                .cloned()
                .unwrap_or(MockReply::Unsigned {
                    status: 404,
                    body: r#"{"code":"NOT_FOUND","message":"no such route"}"#.to_string(),
                })
        };

        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Request-ID".to_string(), generate_nonce()),
        ];
        let (status, body) = match reply {
            MockReply::Signed { status, body } => {
                headers.extend(signed_headers(&state.signer, body.as_bytes()));
                (status, body)
            }
            MockReply::Tampered { status, body } => {
                headers.extend(signed_headers(&state.signer, b"{\"forged\":true}"));
                (status, body)
            }
            MockReply::Unsigned { status, body } => (status, body),
            MockReply::Fail(reason) => return Err(WechatPayError::Transport(reason)),
        };

        Ok(HttpResponse {
            status,
            headers,
            body: body.into_bytes(),
        })
    }
}
