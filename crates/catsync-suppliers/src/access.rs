//! IP-allowlist negotiation.
//!
//! One supplier gates feed downloads on the caller's egress IP being
//! registered through its management page. The handshake discovers the IP
//! from an echo page, scrapes the allowlist form's hidden fields, and submits
//! the form with the discovered IP appended. This is a precondition gate: on
//! failure the supplier's run is aborted before any feed fetch.

use regex::Regex;
use reqwest::Client;

use catsync_core::suppliers::AccessConfig;

use crate::error::FeedError;

/// Registers the caller's current egress IP with the supplier.
///
/// Returns the registered IP on success.
///
/// # Errors
///
/// Returns [`FeedError::AccessDenied`] when the IP cannot be discovered or
/// the form submission is rejected, and [`FeedError::Http`] on transport
/// failures. Either way the caller must treat the supplier's run as failed.
pub async fn ensure_access(
    client: &Client,
    supplier_slug: &str,
    access: &AccessConfig,
) -> Result<String, FeedError> {
    let echo_html = fetch_page(client, &access.echo_url).await?;
    let ip = extract_ip(&echo_html).ok_or_else(|| FeedError::AccessDenied {
        supplier: supplier_slug.to_owned(),
        reason: format!("no IP address found in echo page {}", access.echo_url),
    })?;

    let manage_html = fetch_page(client, &access.manage_url).await?;
    let mut form = extract_hidden_fields(&manage_html);
    form.push(("ip".to_owned(), ip.clone()));

    let response = client.post(&access.manage_url).form(&form).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::AccessDenied {
            supplier: supplier_slug.to_owned(),
            reason: format!(
                "allowlist form submission returned HTTP {} for {}",
                status.as_u16(),
                access.manage_url
            ),
        });
    }

    tracing::info!(supplier = supplier_slug, ip = %ip, "registered egress IP with supplier");
    Ok(ip)
}

async fn fetch_page(client: &Client, url: &str) -> Result<String, FeedError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response.text().await?)
}

/// Pulls the first dotted-quad IP address out of an HTML page.
#[must_use]
pub(crate) fn extract_ip(html: &str) -> Option<String> {
    let re = Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3})\b").expect("valid regex");
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Scrapes `<input type="hidden">` name/value pairs from the management form.
///
/// Attribute order within the tag is not guaranteed by the provider, so name
/// and value are matched independently. Hidden inputs without a name are
/// ignored; a missing value becomes an empty string.
#[must_use]
pub(crate) fn extract_hidden_fields(html: &str) -> Vec<(String, String)> {
    let input_re = Regex::new(r#"(?is)<input\b[^>]*>"#).expect("valid regex");
    let type_re = Regex::new(r#"(?i)type\s*=\s*["']hidden["']"#).expect("valid regex");
    let name_re = Regex::new(r#"(?i)name\s*=\s*["']([^"']*)["']"#).expect("valid regex");
    let value_re = Regex::new(r#"(?i)value\s*=\s*["']([^"']*)["']"#).expect("valid regex");

    input_re
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| type_re.is_match(tag))
        .filter_map(|tag| {
            let name = name_re.captures(tag)?.get(1)?.as_str().to_owned();
            if name.is_empty() {
                return None;
            }
            let value = value_re
                .captures(tag)
                .and_then(|c| c.get(1))
                .map_or_else(String::new, |m| m.as_str().to_owned());
            Some((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn extract_ip_from_html_body() {
        let html = "<html><body>Your current IP is <b>203.0.113.42</b></body></html>";
        assert_eq!(extract_ip(html).as_deref(), Some("203.0.113.42"));
    }

    #[test]
    fn extract_ip_none_when_absent() {
        assert_eq!(extract_ip("<html><body>no address here</body></html>"), None);
    }

    #[test]
    fn extract_hidden_fields_ignores_visible_inputs() {
        let html = r#"
            <form method="post">
              <input type="hidden" name="csrf" value="abc123">
              <input type="hidden" value="stray">
              <input name="comment" type="text" value="visible">
              <input value="42" name="session" type="hidden">
            </form>"#;
        let fields = extract_hidden_fields(html);
        assert_eq!(
            fields,
            vec![
                ("csrf".to_owned(), "abc123".to_owned()),
                ("session".to_owned(), "42".to_owned()),
            ]
        );
    }

    #[test]
    fn extract_hidden_fields_empty_value() {
        let html = r#"<input type="hidden" name="token">"#;
        assert_eq!(
            extract_hidden_fields(html),
            vec![("token".to_owned(), String::new())]
        );
    }

    #[tokio::test]
    async fn ensure_access_posts_discovered_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("Current IP: 198.51.100.7"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manage"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form><input type="hidden" name="csrf" value="tok"></form>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/manage"))
            .and(body_string_contains("csrf=tok"))
            .and(body_string_contains("ip=198.51.100.7"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let access = AccessConfig {
            echo_url: format!("{}/echo", server.uri()),
            manage_url: format!("{}/manage", server.uri()),
        };
        let client = Client::new();
        let ip = ensure_access(&client, "project111", &access).await.unwrap();
        assert_eq!(ip, "198.51.100.7");
    }

    #[tokio::test]
    async fn ensure_access_fails_when_echo_has_no_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let access = AccessConfig {
            echo_url: format!("{}/echo", server.uri()),
            manage_url: format!("{}/manage", server.uri()),
        };
        let client = Client::new();
        let err = ensure_access(&client, "project111", &access)
            .await
            .unwrap_err();
        assert!(
            matches!(err, FeedError::AccessDenied { ref supplier, .. } if supplier == "project111"),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn ensure_access_fails_when_form_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("IP: 198.51.100.7"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/manage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<form></form>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/manage"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let access = AccessConfig {
            echo_url: format!("{}/echo", server.uri()),
            manage_url: format!("{}/manage", server.uri()),
        };
        let client = Client::new();
        let err = ensure_access(&client, "project111", &access)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::AccessDenied { .. }));
    }
}
