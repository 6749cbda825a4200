//! Blocking HTTP implementations of the record and document stores.

pub mod airtable;
pub mod dokuwiki;

use std::time::Duration;

use thiserror::Error;

pub use airtable::AirtableClient;
pub use dokuwiki::DokuWikiClient;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures talking to a remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or non-2xx status.
    #[error("{method} {url} failed: {message}")]
    Http {
        method: &'static str,
        url: String,
        message: String,
    },

    /// The response body was not what the service documents.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// An XML-RPC `<fault>` returned by the wiki.
    #[error("wiki fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The wiki answered `false` to a page save.
    #[error("wiki refused to save page '{page}'")]
    Rejected { page: String },
}

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("wikisync/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn http_err(method: &'static str, url: &str, error: ureq::Error) -> ClientError {
    let message = match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("HTTP {code}: {}", body.trim())
        }
        ureq::Error::Transport(t) => t.to_string(),
    };
    ClientError::Http {
        method,
        url: url.to_string(),
        message,
    }
}
