//! Reverse-proxy server block template
//! Renders the nginx configuration written for a new domain

use std::borrow::Cow;
use std::path::Path;
use tracing::warn;
use url::Url;

/// Prepend `http://` unless the upstream already names `http://` or `https://`
pub fn normalize_upstream(upstream: &str) -> Cow<'_, str> {
    if upstream.starts_with("http://") || upstream.starts_with("https://") {
        Cow::Borrowed(upstream)
    } else {
        Cow::Owned(format!("http://{}", upstream))
    }
}

/// Render the server block for `server_name` proxying to `upstream`.
///
/// The HTTPS block is emitted commented out; certbot fills it in later.
/// `upstream` is written as given, callers normalise it first.
pub fn render_server_block(server_name: &str, upstream: &str, log_dir: &Path) -> String {
    if Url::parse(upstream).is_err() {
        warn!("Upstream '{}' does not parse as a URL, nginx may reject it", upstream);
    }

    let log_dir = log_dir.display();

    format!(
        r#"server {{
    listen 80;
    listen [::]:80;
    server_name {server_name};

    location / {{
        proxy_pass {upstream};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}

    error_log {log_dir}/{server_name}_error.log;
    access_log {log_dir}/{server_name}_access.log;
}}

# HTTPS block will be managed by Certbot later
# server {{
#     listen 443 ssl;
#     listen [::]:443 ssl;
#     server_name {server_name};
#     
#     location / {{
#         proxy_pass {upstream};
#         proxy_set_header Host $host;
#         proxy_set_header X-Real-IP $remote_addr;
#         proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
#         proxy_set_header X-Forwarded-Proto $scheme;
#     }}
# }}
"#
    )
}
