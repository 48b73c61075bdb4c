//! End-to-end runs of the real HTTP transport against an in-process server
//! that implements the encrypt endpoint contract.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::protocol::{
    EncryptResponseBody, IV_HEADER, PUBLIC_KEY_HEADER, TAG_HEADER, WRAPPED_KEY_HEADER,
};
use common::ClientError;
use hybrid_unwrap::config::{BearerToken, Config};
use hybrid_unwrap::crypto::cipher::{generate_iv, seal_payload, KEY_LEN};
use hybrid_unwrap::crypto::identity::{decode_public_key, wrap_key};
use hybrid_unwrap::crypto::RSA_KEY_BITS;
use hybrid_unwrap::transport::HttpTransport;
use hybrid_unwrap::HybridUnwrapClient;
use rand::RngCore;
use rsa::traits::PublicKeyParts;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const TOKEN: &str = "test-token";
const PATH: &str = "/api/test/encrypt";

#[derive(Clone, Copy)]
enum Mode {
    Honest,
    OmitTag,
    FlipTag,
    Stall,
}

struct ServerState {
    plaintext: &'static str,
    mode: Mode,
}

async fn encrypt(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let expected = format!("Bearer {TOKEN}");
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if bearer != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Unauthorized"})),
        )
            .into_response();
    }

    let public_key = match headers
        .get(PUBLIC_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(decode_public_key)
    {
        Some(Ok(k)) if k.size() * 8 == RSA_KEY_BITS => k,
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };

    if let Mode::Stall = state.mode {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let mut key = [0u8; KEY_LEN];
    rand::rngs::OsRng.fill_bytes(&mut key);
    let iv = generate_iv();
    let mut sealed = seal_payload(state.plaintext.as_bytes(), &key, &iv).unwrap();
    let wrapped = wrap_key(&public_key, &key).unwrap();
    if let Mode::FlipTag = state.mode {
        sealed.tag[7] ^= 0x10;
    }

    let body = EncryptResponseBody {
        data: BASE64.encode(&sealed.ciphertext),
    };
    let mut response = (StatusCode::OK, Json(body)).into_response();
    let h = response.headers_mut();
    set_header(h, IV_HEADER, BASE64.encode(iv));
    if !matches!(state.mode, Mode::OmitTag) {
        set_header(h, TAG_HEADER, BASE64.encode(sealed.tag));
    }
    set_header(h, WRAPPED_KEY_HEADER, BASE64.encode(wrapped));
    response
}

fn set_header(headers: &mut HeaderMap, name: &str, value: String) {
    headers.insert(
        HeaderName::from_bytes(name.as_bytes()).unwrap(),
        HeaderValue::from_str(&value).unwrap(),
    );
}

async fn spawn_server(mode: Mode) -> SocketAddr {
    let state = Arc::new(ServerState {
        plaintext: "hello-world",
        mode,
    });
    let router = Router::new().route(PATH, get(encrypt)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn config(addr: SocketAddr, token: &str) -> Config {
    Config {
        endpoint_url: format!("http://{addr}{PATH}"),
        bearer_token: BearerToken::new(token),
        accept_invalid_certs: false,
        request_timeout_secs: 2,
        log_level: "info".into(),
    }
}

async fn run(cfg: &Config) -> Result<Vec<u8>, ClientError> {
    let transport = HttpTransport::new(cfg)?;
    HybridUnwrapClient::new(transport).run().await
}

#[tokio::test]
async fn decrypts_hello_world() {
    let addr = spawn_server(Mode::Honest).await;
    let plaintext = run(&config(addr, TOKEN)).await.unwrap();
    assert_eq!(String::from_utf8(plaintext).unwrap(), "hello-world");
}

#[tokio::test]
async fn unauthorized_is_http_status_error() {
    let addr = spawn_server(Mode::Honest).await;
    let err = run(&config(addr, "wrong-token")).await.unwrap_err();
    match err {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Unauthorized"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_tag_header_is_malformed() {
    let addr = spawn_server(Mode::OmitTag).await;
    let err = run(&config(addr, TOKEN)).await.unwrap_err();
    assert!(
        matches!(err, ClientError::MalformedResponse(ref m) if m.contains(TAG_HEADER)),
        "got {err:?}"
    );
    assert_eq!(err.exit_code(), 22);
}

#[tokio::test]
async fn flipped_tag_is_authentication_failure() {
    let addr = spawn_server(Mode::FlipTag).await;
    let err = run(&config(addr, TOKEN)).await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailure), "got {err:?}");
}

#[tokio::test]
async fn slow_server_hits_timeout() {
    let addr = spawn_server(Mode::Stall).await;
    let cfg = Config {
        request_timeout_secs: 1,
        ..config(addr, TOKEN)
    };
    let err = run(&cfg).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_transport_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let err = run(&config(addr, TOKEN)).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert_eq!(err.stage(), "transport");
}

#[tokio::test]
async fn truncated_error_body_is_reported() {
    // Promises more body than it sends, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  content-length: 100\r\n\
                  connection: close\r\n\r\n\
                  partial",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let err = run(&config(addr, TOKEN)).await.unwrap_err();
    match err {
        ClientError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert!(body.starts_with("<body unreadable: "), "got {body:?}");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}
