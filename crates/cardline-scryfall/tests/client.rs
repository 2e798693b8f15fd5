//! Scryfall resolver and image download against a local responder.
//!
//! The `live_*` tests hit the real API and are ignored by default.
//! Run with: cargo test -p cardline-scryfall --test client -- --ignored

use cardline_core::testing::{TestServer, local_client};
use cardline_core::{CardKey, Fetcher, ImageLocation, Resolver, RowError};
use cardline_scryfall::{ImageDownloader, ScryfallClient};
use tempfile::TempDir;

#[test]
fn resolve_sends_fuzzy_and_set_query() {
    let server = TestServer::respond(
        200,
        "application/json",
        r#"{"name":"Opt","image_uris":{"normal":"https://cards.scryfall.io/normal/opt.jpg"}}"#,
    );
    let client = ScryfallClient::with_client(local_client(), server.url.clone());

    let loc = client.resolve(&CardKey::new("Opt", "xln")).unwrap();
    assert_eq!(loc.as_str(), "https://cards.scryfall.io/normal/opt.jpg");

    let request = server.single_request();
    assert_eq!(request.method, "GET");
    assert!(request.uri.starts_with("/?"), "{}", request.uri);
    assert!(request.uri.contains("fuzzy=Opt"), "{}", request.uri);
    assert!(request.uri.contains("set=xln"), "{}", request.uri);
}

#[test]
fn resolve_falls_back_to_first_face() {
    let server = TestServer::respond(
        200,
        "application/json",
        r#"{"name":"Fire // Ice","card_faces":[
            {"name":"Fire","image_uris":{"normal":"https://img/fire.jpg"}},
            {"name":"Ice","image_uris":{"normal":"https://img/ice.jpg"}}]}"#,
    );
    let client = ScryfallClient::with_client(local_client(), server.url.clone());

    let loc = client.resolve(&CardKey::new("Fire // Ice", "apc")).unwrap();
    assert_eq!(loc.as_str(), "https://img/fire.jpg");
    assert!(server.single_request().uri.contains("fuzzy=Fire"));
}

#[test]
fn resolve_404_is_lookup_error() {
    let server = TestServer::respond(
        404,
        "application/json",
        r#"{"object":"error","code":"not_found","status":404}"#,
    );
    let client = ScryfallClient::with_client(local_client(), server.url.clone());

    let err = client
        .resolve(&CardKey::new("Nonexistent Card", "xxx"))
        .unwrap_err();
    assert!(matches!(err, RowError::Lookup { status: 404, .. }));
    assert!(err.to_string().contains("404"));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn resolve_without_images_is_not_found() {
    let server = TestServer::respond(200, "application/json", r#"{"name":"Opt"}"#);
    let client = ScryfallClient::with_client(local_client(), server.url.clone());

    let err = client.resolve(&CardKey::new("Opt", "xln")).unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn resolve_unreachable_is_http_error() {
    // Bind then drop to get a port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = ScryfallClient::with_client(local_client(), format!("http://127.0.0.1:{port}"));

    let err = client.resolve(&CardKey::new("Opt", "xln")).unwrap_err();
    assert_eq!(err.kind(), "http");
}

#[test]
fn fetch_writes_body_to_artifact_path() {
    let dir = TempDir::new().unwrap();
    let server = TestServer::respond(200, "image/jpeg", b"\xff\xd8\xff\xe0jpeg".to_vec());
    let downloader = ImageDownloader::with_client(local_client(), dir.path().join("card_images"));
    downloader.prepare().unwrap();

    let card = CardKey::new("Fire // Ice", "apc");
    let path = downloader
        .fetch(&card, &ImageLocation(format!("{}/normal/fire.jpg", server.url)))
        .unwrap();

    assert_eq!(
        path,
        dir.path().join("card_images").join("Fire ;; Ice_apc.jpg")
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"\xff\xd8\xff\xe0jpeg");
    assert_eq!(server.single_request().uri, "/normal/fire.jpg");
}

#[test]
fn fetch_non_success_is_fetch_error() {
    let dir = TempDir::new().unwrap();
    let server = TestServer::respond(403, "text/plain", "nope");
    let downloader = ImageDownloader::with_client(local_client(), dir.path());

    let card = CardKey::new("Opt", "xln");
    let err = downloader
        .fetch(&card, &ImageLocation(format!("{}/opt.jpg", server.url)))
        .unwrap_err();

    assert!(matches!(err, RowError::Fetch { status: 403, .. }));
    assert!(!downloader.image_path(&card).exists());
}

#[test]
#[ignore]
fn live_resolve_split_card() {
    let client = ScryfallClient::default();
    let loc = client
        .resolve(&CardKey::new("Fire // Ice", "apc"))
        .expect("Scryfall lookup should succeed");
    assert!(loc.as_str().starts_with("https://"));
}

#[test]
#[ignore]
fn live_resolve_unknown_card_is_404() {
    let client = ScryfallClient::default();
    let err = client
        .resolve(&CardKey::new("Nonexistent Card", "xxx"))
        .unwrap_err();
    assert!(err.to_string().contains("404"), "{err}");
}
