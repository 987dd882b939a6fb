//! Embedded SPA assets.
//!
//! Files come from `frontend/dist/` at compile time. A `./frontend-custom/`
//! directory on disk overrides them, and unknown paths fall back to
//! `index.html` so client-side routing works.

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use rust_embed::Embed;
use std::path::Path;

use crate::services::DynamicConfig;

#[derive(Embed)]
#[folder = "frontend/dist/"]
struct FrontendAssets;

const CUSTOM_FRONTEND_DIR: &str = "./frontend-custom";

fn get_mime_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    match ext {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "mjs" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "webp" => "image/webp",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "wasm" => "application/wasm",
        "map" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Hashed build assets are safe to cache for a year
fn should_cache(path: &str) -> bool {
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    matches!(
        ext,
        "js" | "css"
            | "woff"
            | "woff2"
            | "ttf"
            | "eot"
            | "png"
            | "jpg"
            | "jpeg"
            | "gif"
            | "svg"
            | "webp"
    )
}

/// Fills the `%SYSTEM_NAME%` and `%BASE_PATH%` placeholders of the built HTML
fn process_html(content: &[u8], system_name: &str) -> Vec<u8> {
    String::from_utf8_lossy(content)
        .replace("%SYSTEM_NAME%", system_name)
        .replace("%BASE_PATH%", "")
        .into_bytes()
}

/// Rejects traversal out of the override directory
fn is_safe_path(path: &str) -> bool {
    !path.split(['/', '\\']).any(|part| part == "..")
}

fn try_custom_file(path: &str) -> Option<Vec<u8>> {
    if !is_safe_path(path) {
        return None;
    }
    std::fs::read(Path::new(CUSTOM_FRONTEND_DIR).join(path)).ok()
}

fn get_embedded_file(path: &str) -> Option<Vec<u8>> {
    FrontendAssets::get(path).map(|f| f.data.to_vec())
}

/// Override directory first, then the embedded copy
fn get_file(path: &str) -> Option<Vec<u8>> {
    try_custom_file(path).or_else(|| get_embedded_file(path))
}

pub async fn serve_frontend(req: HttpRequest) -> ActixResult<HttpResponse> {
    let path = req.match_info().query("tail").trim_start_matches('/');
    let system_name = DynamicConfig::system_name().await;

    let (content, file_path) = if path.is_empty() || path == "/" {
        (get_file("index.html"), "index.html")
    } else if let Some(content) = get_file(path) {
        (Some(content), path)
    } else {
        (get_file("index.html"), "index.html")
    };

    match content {
        Some(mut data) => {
            let mime = get_mime_type(file_path);

            if mime.starts_with("text/html") {
                data = process_html(&data, &system_name);
            }

            let mut response = HttpResponse::Ok();
            response.content_type(mime);

            if should_cache(file_path) {
                response.insert_header(("Cache-Control", "public, max-age=31536000, immutable"));
            } else {
                response.insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"));
            }

            Ok(response.body(data))
        }
        None => {
            Ok(HttpResponse::NotFound()
                .content_type("text/html; charset=utf-8")
                .body(
                    r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Bancarizate</title>
</head>
<body>
    <h1>Frontend no disponible</h1>
    <p>Los archivos del frontend no fueron compilados ni embebidos.</p>
    <p>Compile el frontend primero:</p>
    <pre>cd frontend && npm run build</pre>
</body>
</html>"#,
                ))
        }
    }
}

pub fn configure_frontend_routes(cfg: &mut web::ServiceConfig) {
    // every path not claimed by an API scope
    cfg.route("/{tail:.*}", web::get().to(serve_frontend));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mime_type() {
        assert_eq!(get_mime_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(
            get_mime_type("app.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(get_mime_type("style.css"), "text/css; charset=utf-8");
        assert_eq!(get_mime_type("image.png"), "image/png");
        assert_eq!(get_mime_type("unknown.xyz"), "application/octet-stream");
    }

    #[test]
    fn test_should_cache() {
        assert!(should_cache("app.js"));
        assert!(should_cache("style.css"));
        assert!(should_cache("logo.png"));
        assert!(!should_cache("index.html"));
        assert!(!should_cache("manifest.json"));
    }

    #[test]
    fn test_process_html_placeholders() {
        let html = b"<title>%SYSTEM_NAME%</title><base href=\"%BASE_PATH%/\">";
        let out = String::from_utf8(process_html(html, "Bancarizate")).unwrap();
        assert_eq!(out, "<title>Bancarizate</title><base href=\"/\">");
    }

    #[test]
    fn test_custom_path_traversal_rejected() {
        assert!(is_safe_path("assets/app.js"));
        assert!(!is_safe_path("../Cargo.toml"));
        assert!(!is_safe_path("assets/../../secret"));
        assert!(try_custom_file("../Cargo.toml").is_none());
    }
}
