use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, header::InvalidHeaderValue},
    middleware::Next,
    response::Response,
};

/// External origins the views may load content from.
pub const SCRIPT_SRC: &[&str] = &[
    "https://stackpath.bootstrapcdn.com/",
    "https://api.tiles.mapbox.com/",
    "https://api.mapbox.com/",
    "https://kit.fontawesome.com/",
    "https://cdnjs.cloudflare.com/",
    "https://cdn.jsdelivr.net",
];

pub const STYLE_SRC: &[&str] = &[
    "https://kit-free.fontawesome.com/",
    "https://stackpath.bootstrapcdn.com/",
    "https://api.mapbox.com/",
    "https://api.tiles.mapbox.com/",
    "https://fonts.googleapis.com/",
    "https://use.fontawesome.com/",
];

pub const CONNECT_SRC: &[&str] = &[
    "https://api.mapbox.com/",
    "https://a.tiles.mapbox.com/",
    "https://b.tiles.mapbox.com/",
    "https://events.mapbox.com/",
];

pub const FONT_SRC: &[&str] = &[];

pub const IMG_SRC: &[&str] = &[
    "https://res.cloudinary.com/dpm1itwcr/",
    "https://images.unsplash.com/",
];

/// Response headers applied to every response.
pub struct SecurityPolicy {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityPolicy {
    pub fn standard() -> Result<Self, InvalidHeaderValue> {
        let csp = HeaderValue::from_str(&content_security_policy())?;

        let fixed: [(&'static str, &'static str); 11] = [
            ("cross-origin-opener-policy", "same-origin"),
            ("cross-origin-resource-policy", "same-origin"),
            ("origin-agent-cluster", "?1"),
            ("referrer-policy", "no-referrer"),
            ("strict-transport-security", "max-age=15552000; includeSubDomains"),
            ("x-content-type-options", "nosniff"),
            ("x-dns-prefetch-control", "off"),
            ("x-download-options", "noopen"),
            ("x-frame-options", "SAMEORIGIN"),
            ("x-permitted-cross-domain-policies", "none"),
            ("x-xss-protection", "0"),
        ];

        let mut headers = vec![(HeaderName::from_static("content-security-policy"), csp)];
        headers.extend(
            fixed
                .into_iter()
                .map(|(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value))),
        );
        Ok(Self { headers })
    }

    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }
}

pub fn content_security_policy() -> String {
    fn directive(name: &str, base: &[&str], extra: &[&str]) -> String {
        let sources: Vec<&str> = base.iter().chain(extra.iter()).copied().collect();
        if sources.is_empty() {
            name.to_string()
        } else {
            format!("{} {}", name, sources.join(" "))
        }
    }

    [
        directive("default-src", &["'self'"], &[]),
        directive("connect-src", &["'self'"], CONNECT_SRC),
        directive("script-src", &["'unsafe-inline'", "'self'"], SCRIPT_SRC),
        directive("style-src", &["'self'", "'unsafe-inline'"], STYLE_SRC),
        directive("worker-src", &["'self'", "blob:"], &[]),
        directive("object-src", &["'none'"], &[]),
        directive("img-src", &["'self'", "blob:", "data:"], IMG_SRC),
        directive("font-src", &["'self'"], FONT_SRC),
        directive("base-uri", &["'self'"], &[]),
        directive("form-action", &["'self'"], &[]),
        directive("frame-ancestors", &["'self'"], &[]),
        directive("script-src-attr", &["'none'"], &[]),
    ]
    .join("; ")
}

/// First stage: headers are set on whatever the rest of the pipeline returns.
pub async fn security_headers(
    State(policy): State<Arc<SecurityPolicy>>,
    req: Request,
    next: Next,
) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    for (name, value) in policy.headers() {
        headers.insert(name.clone(), value.clone());
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csp_lists_every_allowed_origin() {
        let csp = content_security_policy();
        for origin in SCRIPT_SRC.iter().chain(STYLE_SRC).chain(CONNECT_SRC).chain(IMG_SRC) {
            assert!(csp.contains(origin), "missing {origin}");
        }
        assert!(csp.starts_with("default-src 'self'; "));
        assert!(csp.contains("object-src 'none'"));
        assert!(csp.contains("font-src 'self'; "));
    }

    #[test]
    fn standard_policy_builds() {
        let policy = SecurityPolicy::standard().unwrap();
        assert_eq!(policy.headers().len(), 12);
        assert_eq!(policy.headers()[0].0, "content-security-policy");
    }
}
