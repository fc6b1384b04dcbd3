use axum::http::{header, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Organizer dashboard and storefront dev servers.
pub const LOCAL_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24);

/// Browser access for the storefront, the organizer dashboard and the
/// check-in scanner. `origins` is a comma-separated list; `None` means local
/// development.
pub fn create_cors_layer(origins: Option<&str>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(origins.unwrap_or(LOCAL_ORIGINS)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(PREFLIGHT_MAX_AGE)
}

fn origin_list(origins: &str) -> Vec<HeaderValue> {
    let mut list = Vec::new();
    for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        match HeaderValue::from_str(origin) {
            Ok(value) => list.push(value),
            Err(e) => tracing::warn!(origin, error = %e, "CORS: skipping invalid origin"),
        }
    }
    list
}

fn allowed_origins(origins: &str) -> AllowOrigin {
    let list = origin_list(origins);
    if list.is_empty() {
        // credentialed requests rule out a wildcard
        tracing::warn!("CORS: no usable origins configured, allowing local frontends only");
        return AllowOrigin::list(origin_list(LOCAL_ORIGINS));
    }

    tracing::info!(count = list.len(), "CORS: origins configured");
    AllowOrigin::list(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_origins_parse() {
        assert_eq!(origin_list(LOCAL_ORIGINS).len(), 2);
        let _layer = create_cors_layer(None);
    }

    #[test]
    fn test_blank_and_invalid_entries_are_skipped() {
        let list = origin_list(" https://tickets.example.com , ,bad\norigin");
        assert_eq!(list, vec![HeaderValue::from_static("https://tickets.example.com")]);
    }
}
