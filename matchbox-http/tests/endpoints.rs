use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use ed25519_dalek::{Signature, SigningKey, Verifier as _};
use http_body_util::BodyExt;
use tower::util::BoxCloneService;
use tower::ServiceExt;

use matchbox_http::{handler, Config};
use matchbox_server::Server;
use matchbox_sign::{ArmoredEd25519Signer, Ed25519Signer, Signer};
use matchbox_storage::{Group, MemoryStore, Profile, Store, Template};

type App = BoxCloneService<axum::extract::Request, axum::response::Response, Infallible>;

const IPXE_TEMPLATE: &str = "#!ipxe\nkernel {{kernel}}{{#each args}} {{this}}{{/each}}\n{{#each initrd}}initrd {{this}}\n{{/each}}boot\n";

fn group(id: &str, profile: &str, selector: &[(&str, &str)], metadata: serde_json::Value) -> Group {
    Group {
        id: id.to_string(),
        profile: profile.to_string(),
        selector: selector
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        metadata: metadata.as_object().cloned().unwrap_or_default(),
        ..Group::default()
    }
}

fn profile(id: &str, template: &[(&str, &str)], metadata: serde_json::Value) -> Profile {
    Profile {
        id: id.to_string(),
        template: template
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        metadata: metadata.as_object().cloned().unwrap_or_default(),
        ..Profile::default()
    }
}

fn template(id: &str, contents: &str) -> Template {
    Template {
        id: id.to_string(),
        name: String::new(),
        contents: contents.as_bytes().to_vec(),
    }
}

/// Store for the S1 scenario: one group keyed on uuid, an ipxe binding, and
/// kernel/initrd/args metadata on the profile.
async fn boot_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[("uuid", "a1b2c3d4")], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile(
            "p1",
            &[("ipxe", "t1")],
            serde_json::json!({"kernel": "/k", "initrd": ["/i"], "args": ["a=b"]}),
        ))
        .await
        .unwrap();
    store.template_put(template("t1", IPXE_TEMPLATE)).await.unwrap();
    store
}

async fn app_with(store: Arc<MemoryStore>) -> App {
    handler(Config {
        core: Server::new(store).await,
        assets_path: None,
        signer: None,
        armored_signer: None,
    })
}

async fn send(app: &App, path: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let req = Request::builder().uri(path).body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn send_text(app: &App, path: &str) -> (StatusCode, String) {
    let (status, _, body) = send(app, path).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

// ── Home and bootstrap ──────────────────────────────────────────────────

#[tokio::test]
async fn home_shows_the_server_name() {
    let app = app_with(boot_store().await).await;
    let (status, body) = send_text(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "matchbox\n");
}

#[tokio::test]
async fn unknown_paths_are_404() {
    let app = app_with(boot_store().await).await;
    let (status, _) = send_text(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bootstrap_script_chainloads_with_labels() {
    let app = app_with(boot_store().await).await;
    for path in ["/boot.ipxe", "/boot.ipxe.0"] {
        let (status, body) = send_text(&app, path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "#!ipxe\nchain ipxe?uuid=${uuid}&mac=${mac:hexhyp}&domain=${domain}&hostname=${hostname}&serial=${serial}\n"
        );
    }
}

// ── Templated roles ─────────────────────────────────────────────────────

#[tokio::test]
async fn s1_renders_the_matched_ipxe_script() {
    let app = app_with(boot_store().await).await;
    let (status, headers, body) = send(&app, "/ipxe?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "#!ipxe\nkernel /k a=b\ninitrd /i\nboot\n"
    );
}

#[tokio::test]
async fn s2_unmatched_labels_name_the_missing_group() {
    let app = app_with(boot_store().await).await;
    let (status, body) = send_text(&app, "/ipxe?uuid=xxx").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No matching Group"), "body was: {body}");
}

#[tokio::test]
async fn s3_missing_binding_names_the_role() {
    let app = app_with(boot_store().await).await;
    let (status, body) = send_text(&app, "/grub?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        body.contains("template binding for \"grub\" is not set"),
        "body was: {body}"
    );
}

#[tokio::test]
async fn dangling_profile_reference_names_the_missing_profile() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "absent", &[], serde_json::json!({})))
        .await
        .unwrap();
    let app = app_with(store).await;
    let (status, body) = send_text(&app, "/ipxe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No matching Profile"), "body was: {body}");
}

#[tokio::test]
async fn missing_template_names_the_id_sought() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[("ipxe", "gone")], serde_json::json!({})))
        .await
        .unwrap();
    let app = app_with(store).await;
    let (status, body) = send_text(&app, "/ipxe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("gone"), "body was: {body}");
}

#[tokio::test]
async fn s6_strict_missing_key_fails_the_request() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[("ipxe", "t-strict")], serde_json::json!({})))
        .await
        .unwrap();
    store
        .template_put(template("t-strict", "X={{nope}}"))
        .await
        .unwrap();
    let app = app_with(store).await;
    let (status, body) = send_text(&app, "/ipxe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("rendering"), "body was: {body}");
}

#[tokio::test]
async fn template_endpoint_renders_user_defined_roles() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile(
            "p1",
            &[("pxelinux", "t-pxe")],
            serde_json::json!({"console": "ttyS0"}),
        ))
        .await
        .unwrap();
    store
        .template_put(template("t-pxe", "SERIAL {{console}}\n"))
        .await
        .unwrap();
    let app = app_with(store).await;

    let (status, body) = send_text(&app, "/template/pxelinux").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "SERIAL ttyS0\n");

    let (status, body) = send_text(&app, "/template/other").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("template binding for \"other\" is not set"));
}

// ── Ignition ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ignition_serves_valid_configs_as_json() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[("ignition", "t-ign")], serde_json::json!({})))
        .await
        .unwrap();
    store
        .template_put(template(
            "t-ign",
            r#"{"ignition": {"version": "2.2.0"}, "passwd": {"users": [{"name": "core"}]}}"#,
        ))
        .await
        .unwrap();
    let app = app_with(store).await;

    let (status, headers, body) = send(&app, "/ignition").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["ignition"]["version"], "2.2.0");
}

#[tokio::test]
async fn ignition_rejects_unparseable_bodies() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group("g1", "p1", &[], serde_json::json!({})))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[("ignition", "t-bad")], serde_json::json!({})))
        .await
        .unwrap();
    store
        .template_put(template("t-bad", "#!ipxe\nthis is not ignition\n"))
        .await
        .unwrap();
    let app = app_with(store).await;

    let (status, body) = send_text(&app, "/ignition").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Ignition"), "body was: {body}");
}

// ── Metadata env file ───────────────────────────────────────────────────

#[tokio::test]
async fn s4_metadata_flattens_group_profile_and_labels() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group(
            "g1",
            "p1",
            &[("uuid", "a1")],
            serde_json::json!({"greeting": "hi"}),
        ))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[], serde_json::json!({"count": 3})))
        .await
        .unwrap();
    let app = app_with(store).await;

    let (status, body) = send_text(&app, "/metadata?uuid=a1").await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert!(lines.contains(&"GREETING=hi"), "body was: {body}");
    assert!(lines.contains(&"COUNT=3"), "body was: {body}");
    assert!(lines.contains(&"LABEL_UUID=a1"), "body was: {body}");
}

#[tokio::test]
async fn metadata_without_a_match_is_404() {
    let app = app_with(Arc::new(MemoryStore::new())).await;
    let (status, _) = send_text(&app, "/metadata?uuid=a1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Labels ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn mac_labels_match_in_canonical_form() {
    let store = Arc::new(MemoryStore::new());
    store
        .group_put(group(
            "g1",
            "p1",
            &[("mac", "52:54:00:89:d8:10")],
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    store
        .profile_put(profile("p1", &[("ipxe", "t1")], serde_json::json!({})))
        .await
        .unwrap();
    store.template_put(template("t1", "#!ipxe\n")).await.unwrap();
    let app = app_with(store).await;

    // Hyphen-separated upper-case input canonicalizes to the stored form.
    let (status, _) = send_text(&app, "/ipxe?mac=52-54-00-89-D8-10").await;
    assert_eq!(status, StatusCode::OK);
}

// ── Request ids ─────────────────────────────────────────────────────────

#[tokio::test]
async fn request_id_is_echoed_when_provided() {
    let app = app_with(boot_store().await).await;
    let req = Request::builder()
        .uri("/")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "req-42");
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let app = app_with(boot_store().await).await;
    let (_, headers, _) = send(&app, "/").await;
    let value = headers.get("x-request-id").unwrap().to_str().unwrap();
    assert!(!value.is_empty());
}

// ── Signatures ──────────────────────────────────────────────────────────

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

async fn signed_app(store: Arc<MemoryStore>) -> App {
    let key = signing_key();
    handler(Config {
        core: Server::new(store).await,
        assets_path: None,
        signer: Some(Arc::new(Ed25519Signer::new(key.clone())) as Arc<dyn Signer>),
        armored_signer: Some(Arc::new(ArmoredEd25519Signer::new(key)) as Arc<dyn Signer>),
    })
}

#[tokio::test]
async fn s5_sig_serves_the_detached_signature_of_the_unsuffixed_body() {
    let app = signed_app(boot_store().await).await;

    let (status, _, body) = send(&app, "/ipxe?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, raw) = send(&app, "/ipxe.sig?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::OK);
    let signature = Signature::from_slice(&raw).unwrap();
    assert!(signing_key()
        .verifying_key()
        .verify(&body, &signature)
        .is_ok());
}

#[tokio::test]
async fn asc_serves_an_armored_signature() {
    let app = signed_app(boot_store().await).await;
    let (status, armored) = send_text(&app, "/ipxe.asc?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(armored.starts_with("-----BEGIN ED25519 SIGNATURE-----"));
}

#[tokio::test]
async fn suffixed_urls_404_without_a_configured_signer() {
    let app = app_with(boot_store().await).await;
    let (status, _) = send_text(&app, "/ipxe.sig?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metadata_signatures_cover_the_env_file() {
    let app = signed_app(boot_store().await).await;
    let (_, _, body) = send(&app, "/metadata?uuid=a1b2c3d4").await;
    let (status, _, raw) = send(&app, "/metadata.sig?uuid=a1b2c3d4").await;
    assert_eq!(status, StatusCode::OK);
    let signature = Signature::from_slice(&raw).unwrap();
    assert!(signing_key()
        .verifying_key()
        .verify(&body, &signature)
        .is_ok());
}
