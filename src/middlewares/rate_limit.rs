/*!
 * Fixed-window rate limiting.
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login(&config.rate_limit))
 *     .route(web::post().to(login))
 * ```
 *
 * Requests are keyed by authenticated user id, else by client IP. Over the
 * budget the request gets 429 with `Retry-After` set to the seconds left in
 * the current window.
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::config::RateLimitConfig;
use crate::models::{ApiResponse, ErrorCode, users::entities::User};
use crate::utils::request_info::strip_port;

/// `prefix:identity` -> (count, window start in unix seconds)
static RATE_LIMIT_CACHE: Lazy<Cache<String, (u32, u64)>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Allow { entry: (u32, u64), remaining: u32 },
    Reject { retry_after: u64 },
}

/// Fixed window: a new window starts once `window_secs` passed since the first hit
fn decide(previous: Option<(u32, u64)>, now: u64, max_requests: u32, window_secs: u64) -> Decision {
    let (count, start) = match previous {
        Some((count, start)) if now < start.saturating_add(window_secs) => (count, start),
        _ => (0, now),
    };

    if count >= max_requests {
        let retry_after = start.saturating_add(window_secs).saturating_sub(now).max(1);
        return Decision::Reject { retry_after };
    }

    Decision::Allow {
        entry: (count + 1, start),
        remaining: max_requests.saturating_sub(count + 1),
    }
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.max(1),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    pub fn login(config: &RateLimitConfig) -> Self {
        Self::new(config.login_max_requests, config.window_secs).with_prefix("login")
    }

    /// Account creation
    pub fn register(config: &RateLimitConfig) -> Self {
        Self::new(config.register_max_requests, config.window_secs).with_prefix("register")
    }

    pub fn refresh_token(config: &RateLimitConfig) -> Self {
        Self::new(config.refresh_max_requests, config.window_secs).with_prefix("refresh")
    }

    pub fn transfer(config: &RateLimitConfig) -> Self {
        Self::new(config.transfer_max_requests, config.window_secs).with_prefix("transfer")
    }

    pub fn file_upload(config: &RateLimitConfig) -> Self {
        Self::new(config.upload_max_requests, config.window_secs).with_prefix("upload")
    }

    pub fn api(config: &RateLimitConfig) -> Self {
        Self::new(config.api_max_requests, config.window_secs).with_prefix("api")
    }
}

/// Client IP, preferring the connection's real address.
///
/// Forwarded headers are only trusted when they parse as an IP.
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| strip_port(s).to_string());

    if let Some(ref ip) = connection_ip
        && is_valid_ip(ip)
    {
        return ip.clone();
    }

    if let Some(forwarded) = req.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP")
        && let Ok(ip) = real_ip.to_str()
    {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<std::net::IpAddr>().is_ok()
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Demasiadas solicitudes, intente nuevamente más tarde",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            max_requests: self.max_requests,
            window_secs: self.window_secs,
            key_prefix: self.key_prefix.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let max_requests = self.max_requests;
        let window_secs = self.window_secs;
        let key_prefix = self.key_prefix.clone();

        Box::pin(async move {
            let user_id = req.extensions().get::<User>().map(|user| user.id);
            let identifier = user_id
                .map(|id| format!("user:{id}"))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));

            let cache_key = if key_prefix.is_empty() {
                identifier
            } else {
                format!("{key_prefix}:{identifier}")
            };

            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let previous = RATE_LIMIT_CACHE.get(&cache_key).await;

            match decide(previous, now, max_requests, window_secs) {
                Decision::Reject { retry_after } => {
                    warn!(
                        "Rate limit exceeded for {} ({} per {}s)",
                        cache_key, max_requests, window_secs
                    );
                    Ok(req.into_response(
                        create_rate_limit_response(retry_after).map_into_right_body(),
                    ))
                }
                Decision::Allow { entry, remaining } => {
                    RATE_LIMIT_CACHE.insert(cache_key, entry).await;
                    req.extensions_mut().insert(RateLimitInfo {
                        remaining,
                        limit: max_requests,
                        reset: entry.1 + window_secs,
                    });
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
            }
        })
    }
}

/// Budget left for this request, available to handlers
#[derive(Clone, Debug)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    /// Unix seconds when the window resets
    pub reset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, web};
    use actix_web::test as actix_test;

    #[test]
    fn test_rate_limit_presets() {
        let config = RateLimitConfig::default();

        let login = RateLimit::login(&config);
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        let transfer = RateLimit::transfer(&config);
        assert_eq!(transfer.max_requests, config.transfer_max_requests);
        assert_eq!(transfer.key_prefix, "transfer");

        let custom = RateLimitConfig {
            login_max_requests: 2,
            window_secs: 0,
            ..RateLimitConfig::default()
        };
        let login = RateLimit::login(&custom);
        assert_eq!(login.max_requests, 2);
        assert_eq!(login.window_secs, 1);
    }

    #[test]
    fn test_decide_window() {
        assert_eq!(
            decide(None, 1000, 2, 60),
            Decision::Allow {
                entry: (1, 1000),
                remaining: 1
            }
        );
        assert_eq!(
            decide(Some((1, 1000)), 1010, 2, 60),
            Decision::Allow {
                entry: (2, 1000),
                remaining: 0
            }
        );
        assert_eq!(
            decide(Some((2, 1000)), 1045, 2, 60),
            Decision::Reject { retry_after: 15 }
        );
        // next window
        assert_eq!(
            decide(Some((2, 1000)), 1060, 2, 60),
            Decision::Allow {
                entry: (1, 1060),
                remaining: 1
            }
        );
    }

    #[actix_web::test]
    async fn test_middleware_returns_429() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/limited")
                    .wrap(RateLimit::new(1, 60).with_prefix("test_429"))
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/limited")
                .peer_addr("10.1.2.3:5000".parse().unwrap())
                .to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/limited")
                .peer_addr("10.1.2.3:5001".parse().unwrap())
                .to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("Retry-After"));
    }
}
