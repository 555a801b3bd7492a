//! Route handlers.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse};
use simplepypi_registry::{Registry, RegistryError, ReleaseRecord};

use crate::error::WebError;
use crate::upload::{basic_credentials, UploadForm};
use crate::{html, AppState};

/// Run a registry call on the blocking pool. The outer error covers the
/// worker task itself.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<simplepypi_registry::Result<T>, WebError>
where
    F: FnOnce(&Registry) -> simplepypi_registry::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| WebError::Internal(format!("registry task failed: {e}")))
}

async fn sorted_packages(state: &AppState) -> Result<Vec<String>, WebError> {
    let mut packages = blocking(state, |r| r.list_packages()).await??;
    packages.sort();
    Ok(packages)
}

async fn sorted_releases(state: &AppState, package: String) -> Result<Vec<ReleaseRecord>, WebError> {
    let mut releases = blocking(state, move |r| r.list_releases(&package))
        .await?
        .map_err(WebError::lookup)?;
    releases.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(releases)
}

/// `GET /`: package index.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let packages = sorted_packages(&state).await?;
    Ok(Html(html::index_page(&packages)))
}

/// `GET /simple/`: simple index root.
pub async fn simple_index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let packages = sorted_packages(&state).await?;
    Ok(Html(html::simple_index(&packages)))
}

/// `GET /simple/{package}/`: download links for one package.
pub async fn simple_package(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Result<Html<String>, WebError> {
    let releases = sorted_releases(&state, package.clone()).await?;
    Ok(Html(html::simple_package(&package, &releases)))
}

/// `GET /pypi/{package}/`: package detail page.
pub async fn package_page(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Result<Html<String>, WebError> {
    let releases = sorted_releases(&state, package.clone()).await?;
    Ok(Html(html::package_page(&package, &releases)))
}

/// `GET /package/{package}/{file}`: raw artifact bytes.
pub async fn download(
    State(state): State<AppState>,
    Path((package, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, WebError> {
    let path = blocking(&state, move |r| r.resolve_artifact_path(&package, &file))
        .await?
        .map_err(WebError::lookup)?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        WebError::Registry(RegistryError::Storage {
            path: path.clone(),
            detail: format!("reading artifact: {e}"),
        })
    })?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// `POST /`: publish a release.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<&'static str, WebError> {
    let credentials = basic_credentials(&headers).ok_or(WebError::MissingCredentials)?;
    let (record, algorithm, content) = UploadForm::read(multipart).await?.into_release()?;

    let published = blocking(&state, move |r| {
        r.publish_release_with(record, algorithm, &content[..], Some(&credentials))
    })
    .await??;
    tracing::debug!(package = %published.package, file = %published.filename, "upload accepted");
    Ok("upload complete")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app, ServerConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use simplepypi_registry::{ContentHash, Credentials, RegistryConfig};
    use tower::ServiceExt;

    const BOUNDARY: &str = "----simplepypi-test-boundary";
    // base64("admin:pw")
    const GOOD_AUTH: &str = "Basic YWRtaW46cHc=";

    fn test_app() -> (tempfile::TempDir, axum::Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = RegistryConfig::new(dir.path().to_path_buf(), Credentials::new("admin", "pw"));
        let state = AppState::new(Registry::new(config));
        (dir, app(state, &ServerConfig::default()))
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"content\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(auth: Option<&str>, body: Vec<u8>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn demo_upload(auth: Option<&str>, content: &[u8], digest: &str) -> Request<Body> {
        let body = multipart_body(
            &[
                (":action", "file_upload"),
                ("name", "demo"),
                ("version", "1.0.0"),
                ("sha256_digest", digest),
                ("summary", "Demo <b>package</b>"),
            ],
            Some(("demo-1.0.0.tar.gz", content)),
        );
        upload_request(auth, body)
    }

    async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn upload_then_browse_and_download() {
        let (_dir, app) = test_app();
        let content = b"tarball bytes";
        let digest = ContentHash::compute(content).0;

        let (status, body) = send(&app, demo_upload(Some(GOOD_AUTH), content, &digest)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body, "upload complete");

        let (status, page) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("/pypi/demo/"));

        let (status, page) = get(&app, "/simple/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("<a href=\"/simple/demo/\">demo</a>"));

        let (status, page) = get(&app, "/simple/demo/").await;
        assert_eq!(status, StatusCode::OK);
        let page = String::from_utf8(page).unwrap();
        assert!(page.contains(&format!("/package/demo/demo-1.0.0.tar.gz#sha256={digest}")));

        let (status, page) = get(&app, "/pypi/demo/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("Demo &lt;b&gt;package&lt;/b&gt;"));

        let (status, bytes) = get(&app, "/package/demo/demo-1.0.0.tar.gz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, content);
    }

    #[tokio::test]
    async fn upload_without_credentials_is_challenged() {
        let (_dir, app) = test_app();
        let response = app
            .clone()
            .oneshot(demo_upload(None, b"x", "00"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn upload_with_wrong_password_is_unauthorized() {
        let (_dir, app) = test_app();
        // base64("admin:nope")
        let content = b"x";
        let digest = ContentHash::compute(content).0;
        let (status, _) = send(&app, demo_upload(Some("Basic YWRtaW46bm9wZQ=="), content, &digest)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_status_codes() {
        let (_dir, app) = test_app();
        let content = b"tarball";
        let digest = ContentHash::compute(content).0;

        let (status, _) = send(&app, demo_upload(Some(GOOD_AUTH), content, "deadbeef")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get(&app, "/package/demo/demo-1.0.0.tar.gz").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, demo_upload(Some(GOOD_AUTH), content, &digest)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, demo_upload(Some(GOOD_AUTH), content, &digest)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("already exists"));
    }

    #[tokio::test]
    async fn upload_rejects_other_actions_and_formats() {
        let (_dir, app) = test_app();
        let body = multipart_body(
            &[(":action", "submit"), ("name", "demo"), ("version", "1.0"), ("sha256_digest", "00")],
            Some(("demo-1.0.zip", b"z")),
        );
        let (status, body) = send(&app, upload_request(Some(GOOD_AUTH), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("file_upload"));

        let digest = ContentHash::compute(b"w").0;
        let body = multipart_body(
            &[(":action", "file_upload"), ("name", "demo"), ("version", "1.0"), ("sha256_digest", &digest)],
            Some(("demo-1.0-py3-none-any.whl", b"w")),
        );
        let (status, _) = send(&app, upload_request(Some(GOOD_AUTH), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_or_invalid_names_are_not_found() {
        let (_dir, app) = test_app();
        for uri in [
            "/simple/ghost/",
            "/pypi/ghost/",
            "/package/ghost/ghost-1.0.zip",
            "/package/demo/..",
            "/simple/a..b/",
        ] {
            let (status, _) = get(&app, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn legacy_md5_digest_upload_accepted() {
        let (_dir, app) = test_app();
        let body = multipart_body(
            &[
                (":action", "file_upload"),
                ("name", "demo"),
                ("version", "1.0"),
                // md5("hello")
                ("md5_digest", "5d41402abc4b2a76b9719d911017c592"),
            ],
            Some(("demo-1.0.tar.gz", b"hello")),
        );
        let (status, body) = send(&app, upload_request(Some(GOOD_AUTH), body)).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (status, page) = get(&app, "/simple/demo/").await;
        assert_eq!(status, StatusCode::OK);
        let sha256 = ContentHash::compute(b"hello").0;
        assert!(String::from_utf8(page)
            .unwrap()
            .contains(&format!("demo-1.0.tar.gz#sha256={sha256}")));
    }

    #[tokio::test]
    async fn wrong_md5_digest_rejected() {
        let (_dir, app) = test_app();
        let body = multipart_body(
            &[
                (":action", "file_upload"),
                ("name", "demo"),
                ("version", "1.0"),
                ("md5_digest", "00000000000000000000000000000000"),
            ],
            Some(("demo-1.0.tar.gz", b"hello")),
        );
        let (status, _) = send(&app, upload_request(Some(GOOD_AUTH), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
