//! Builds access-log records from incoming redirect requests.
//!
//! Every signal is optional: a missing or malformed header simply leaves the
//! corresponding field absent.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, header};

use crate::domain::access_log::{AccessLogRecord, LogField};
use crate::domain::entities::Link;
use crate::utils::user_agent::UserAgentClassifier;

/// CDN country code meaning "unknown location".
const UNKNOWN_COUNTRY: &str = "XX";

const UTM_PARAMS: [(&str, LogField); 5] = [
    ("utm_source", LogField::UtmSource),
    ("utm_medium", LogField::UtmMedium),
    ("utm_campaign", LogField::UtmCampaign),
    ("utm_term", LogField::UtmTerm),
    ("utm_content", LogField::UtmContent),
];

const GEO_HEADERS: [(&str, LogField); 4] = [
    ("cf-ipcountry", LogField::Country),
    ("cf-region", LogField::Region),
    ("cf-ipcity", LogField::City),
    ("cf-timezone", LogField::Timezone),
];

/// Extracts request signals into an [`AccessLogRecord`].
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    classifier: Arc<UserAgentClassifier>,
    trust_proxy_headers: bool,
}

impl SignalExtractor {
    pub fn new(classifier: Arc<UserAgentClassifier>, trust_proxy_headers: bool) -> Self {
        Self {
            classifier,
            trust_proxy_headers,
        }
    }

    /// Builds the access-log record for one request.
    ///
    /// `peer` is the socket address of the connection, used when proxy
    /// headers are untrusted or absent. `link` is the resolved link, if any.
    pub fn extract(
        &self,
        headers: &HeaderMap,
        peer: IpAddr,
        query: Option<&str>,
        link: Option<&Link>,
    ) -> AccessLogRecord {
        let mut record = AccessLogRecord::new();

        if let Some(link) = link {
            record.set(LogField::Slug, Some(link.slug.clone()));
            record.set(LogField::Url, Some(link.url.clone()));
        }

        record.set(
            LogField::Ip,
            Some(client_ip(headers, peer, self.trust_proxy_headers).to_string()),
        );
        record.set(
            LogField::Source,
            header_str(headers, header::REFERER.as_str()).and_then(referer_host),
        );
        record.set(
            LogField::Language,
            header_str(headers, header::ACCEPT_LANGUAGE.as_str()).and_then(preferred_language),
        );

        let ua = header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default();
        let info = self.classifier.classify(ua);
        record.set(LogField::Ua, Some(ua.to_string()));
        record.set(LogField::Os, info.os);
        record.set(LogField::Browser, info.browser);
        record.set(
            LogField::BrowserType,
            info.browser_type.map(|t| t.as_str().to_string()),
        );
        record.set(LogField::Device, info.device);
        record.set(
            LogField::DeviceType,
            info.device_type.map(|t| t.as_str().to_string()),
        );

        for (name, field) in GEO_HEADERS {
            let value = header_str(headers, name).map(str::to_string);
            let value = match field {
                LogField::Country => value.filter(|c| !c.eq_ignore_ascii_case(UNKNOWN_COUNTRY)),
                _ => value,
            };
            record.set(field, value);
        }

        if let Some(query) = query {
            for (field, value) in utm_params(query) {
                record.set(field, Some(value));
            }
        }

        record
    }
}

/// Reads a header as trimmed UTF-8 text. Empty values count as missing.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolves the client address.
///
/// With `trust_proxy_headers`, `X-Real-IP` wins over the first
/// `X-Forwarded-For` entry; unparsable header values are skipped.
pub fn client_ip(headers: &HeaderMap, peer: IpAddr, trust_proxy_headers: bool) -> IpAddr {
    if !trust_proxy_headers {
        return peer;
    }

    header_str(headers, "x-real-ip")
        .and_then(|v| v.parse().ok())
        .or_else(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok())
        })
        .unwrap_or(peer)
}

/// Host of a `Referer` URL, with the port when one is given explicitly.
pub fn referer_host(referer: &str) -> Option<String> {
    let url = url::Url::parse(referer).ok()?;
    let host = url.host_str()?;

    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Highest-weighted tag of an `Accept-Language` header.
///
/// Ties keep header order. Wildcards, `q=0` entries and malformed weights
/// are ignored.
pub fn preferred_language(accept_language: &str) -> Option<String> {
    let mut best: Option<(&str, f32)> = None;

    for entry in accept_language.split(',') {
        let mut parts = entry.split(';').map(str::trim);
        let tag = match parts.next() {
            Some(tag) if !tag.is_empty() && tag != "*" => tag,
            _ => continue,
        };

        let mut weight = 1.0_f32;
        for param in parts {
            if let Some(q) = param.strip_prefix("q=") {
                weight = q.trim().parse().unwrap_or(0.0);
            }
        }

        // Weights outside 0..=1, NaN included, are malformed.
        if !(weight > 0.0 && weight <= 1.0) {
            continue;
        }
        if best.is_none_or(|(_, w)| weight > w) {
            best = Some((tag, weight));
        }
    }

    best.map(|(tag, _)| tag.to_string())
}

/// UTM parameters of a raw query string. Repeated keys are joined with `,`.
pub fn utm_params(query: &str) -> Vec<(LogField, String)> {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    UTM_PARAMS
        .iter()
        .filter_map(|(key, field)| {
            let values: Vec<&str> = pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect();
            (!values.is_empty()).then(|| (*field, values.join(",")))
        })
        .collect()
}
