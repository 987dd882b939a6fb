use actix_web::HttpRequest;

use crate::models::transfers::requests::RequestOrigin;

const USER_AGENT_MAX_LEN: usize = 255;

/// Client IP (honours `Forwarded` / `X-Forwarded-For`) and `User-Agent`
pub fn request_origin(req: &HttpRequest) -> RequestOrigin {
    let ip_address = req
        .connection_info()
        .realip_remote_addr()
        .map(|addr| strip_port(addr).to_string());
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(USER_AGENT_MAX_LEN).collect());

    RequestOrigin {
        ip_address,
        user_agent,
    }
}

/// `1.2.3.4:5678` -> `1.2.3.4`, `[::1]:80` -> `::1`; bare addresses pass through
pub(crate) fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => addr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("10.0.0.1:443"), "10.0.0.1");
        assert_eq!(strip_port("10.0.0.1"), "10.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("fe80::1"), "fe80::1");
    }

    #[test]
    fn test_request_origin_headers() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9"))
            .insert_header(("User-Agent", "Mozilla/5.0"))
            .to_http_request();
        let origin = request_origin(&req);
        assert_eq!(origin.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(origin.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
