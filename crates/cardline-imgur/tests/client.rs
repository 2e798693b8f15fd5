//! Imgur publisher against a local responder.
//!
//! The live test needs IMGUR_CLIENT_ID and is ignored by default.
//! Run with: cargo test -p cardline-imgur --test client -- --ignored

use cardline_core::testing::{TestServer, local_client};
use cardline_core::{Publisher, RowError};
use cardline_imgur::ImgurClient;
use tempfile::TempDir;

fn image(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("Opt_xln.jpg");
    std::fs::write(&path, b"\xff\xd8fake-jpeg").unwrap();
    path
}

#[test]
fn publish_returns_hosted_link() {
    let dir = TempDir::new().unwrap();
    let server = TestServer::respond(
        200,
        "application/json",
        r#"{"data":{"id":"abc","link":"https://i.imgur.com/abc.jpg"},"success":true,"status":200}"#,
    );
    let client = ImgurClient::with_client(local_client(), format!("{}/3/image", server.url), "test-id");

    let link = client.publish(&image(&dir)).unwrap();
    assert_eq!(link, "https://i.imgur.com/abc.jpg");

    let request = server.single_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.uri, "/3/image");
    assert_eq!(request.header("authorization"), Some("Client-ID test-id"));
    assert!(request
        .header("content-type")
        .unwrap_or_default()
        .starts_with("multipart/form-data"));
    let body = request.body_text();
    assert!(body.contains(r#"name="image""#), "{body}");
    assert!(body.contains(r#"filename="Opt_xln.jpg""#), "{body}");
    assert!(body.contains("fake-jpeg"));
}

#[test]
fn publish_500_carries_payload() {
    let dir = TempDir::new().unwrap();
    let payload = r#"{"data":{"error":"Internal server error"},"success":false,"status":500}"#;
    let server = TestServer::respond(500, "application/json", payload);
    let client = ImgurClient::with_client(local_client(), server.url.clone(), "test-id");

    let err = client.publish(&image(&dir)).unwrap_err();
    assert!(matches!(err, RowError::Upload { status: 500, .. }));
    assert!(err.to_string().contains(payload), "{err}");
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn publish_success_without_link_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let server = TestServer::respond(200, "application/json", r#"{"data":{},"success":true}"#);
    let client = ImgurClient::with_client(local_client(), server.url.clone(), "test-id");

    let err = client.publish(&image(&dir)).unwrap_err();
    assert_eq!(err.kind(), "decode");
}

#[test]
#[ignore]
fn live_upload() {
    let client_id = std::env::var("IMGUR_CLIENT_ID").expect("IMGUR_CLIENT_ID required");
    let dir = TempDir::new().unwrap();
    // 1x1 white GIF
    let gif: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";
    let path = dir.path().join("pixel.gif");
    std::fs::write(&path, gif).unwrap();

    let client = ImgurClient::new(cardline_imgur::DEFAULT_API_URL, client_id);
    let link = client.publish(&path).expect("upload should succeed");
    assert!(link.starts_with("https://i.imgur.com/"));
}
