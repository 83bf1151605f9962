use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use stella_site::{server, Composer, Context};
use tower::ServiceExt;

fn bundled_app() -> Router {
    let context = Context::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("site"), None).unwrap();
    let composer = Arc::new(Composer::load(&context).unwrap());
    server::app(composer, context.static_dir())
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn root_serves_the_index_page() {
    let app = bundled_app();

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");

    let body = body_text(response).await;
    assert!(body.contains("<title>Stella: A multi-platform Atari 2600 VCS emulator</title>"));
    assert_eq!(body, body_text(get(&app, "/index").await).await);
}

#[tokio::test]
async fn every_page_has_a_route() {
    let app = bundled_app();

    for page in [
        "/index",
        "/downloads",
        "/homebrew",
        "/screenshots",
        "/theteam",
        "/development",
        "/atari2600links",
    ] {
        let response = get(&app, page).await;
        assert_eq!(response.status(), StatusCode::OK, "{page}");
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
    }
}

#[tokio::test]
async fn legacy_suffixes_render_the_same_page() {
    let app = bundled_app();

    let plain = body_text(get(&app, "/downloads").await).await;
    for uri in ["/downloads.shtml", "/downloads.html", "/downloads.htm"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_text(response).await, plain, "{uri}");
    }
}

#[tokio::test]
async fn unknown_page_is_404() {
    let app = bundled_app();

    let response = get(&app, "/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "page not found");
}

#[tokio::test]
async fn head_request_has_no_body() {
    let app = bundled_app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::HEAD)
                .uri("/theteam")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn serves_static_assets() {
    let app = bundled_app();

    let response = get(&app, "/css/stella.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/css");
    assert!(body_text(response).await.contains("#menu"));

    let response = get(&app, "/images/launcher.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/png");

    let response = get(&app, "/images/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// A site whose footer fragment was never deployed.
fn site_without_footer(root: &Path) -> PathBuf {
    let home = root.join("site");
    fs::create_dir_all(home.join("templates/fragments")).unwrap();
    fs::create_dir_all(home.join("content")).unwrap();
    fs::create_dir_all(home.join("static/css")).unwrap();

    fs::write(
        home.join("config.toml"),
        "title = \"Stella\"\nbase_url = \"http://localhost/\"\n",
    )
    .unwrap();
    fs::write(home.join("templates/fragments/header.html"), "<h1>Stella</h1>").unwrap();
    fs::write(home.join("templates/fragments/menu.html"), "<ul></ul>").unwrap();
    fs::write(home.join("content/index.html"), "<p>hello</p>").unwrap();
    fs::write(home.join("static/css/stella.css"), "body {}").unwrap();

    home
}

#[tokio::test]
async fn missing_fragment_is_500_and_server_keeps_serving() {
    let tmp = tempfile::tempdir().unwrap();
    let context = Context::new(site_without_footer(tmp.path()), None).unwrap();
    let composer = Arc::new(Composer::load(&context).unwrap());
    let app = server::app(composer, context.static_dir());

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "internal server error");

    let response = get(&app, "/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, "/css/stella.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "body {}");
}

#[tokio::test]
async fn top_level_static_files_are_served() {
    let tmp = tempfile::tempdir().unwrap();
    let home = site_without_footer(tmp.path());
    fs::write(home.join("templates/fragments/footer.html"), "<p>GPL</p>").unwrap();
    fs::write(home.join("static/favicon.ico"), "icon").unwrap();
    fs::write(home.join("static/robots.txt"), "User-agent: *\n").unwrap();
    fs::write(home.join("static/.env"), "secret").unwrap();

    let context = Context::new(home, None).unwrap();
    let composer = Arc::new(Composer::load(&context).unwrap());
    let app = server::app(composer, context.static_dir());

    let response = get(&app, "/favicon.ico").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "icon");

    let response = get(&app, "/robots.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/plain"));

    let response = get(&app, "/index").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<p>hello</p>"));

    for uri in ["/missing.ico", "/.env", "/css"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_text(response).await, "page not found", "{uri}");
    }
}
