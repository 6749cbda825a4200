//! DokuWiki XML-RPC client.
//!
//! Pages are saved with `wiki.putPage` against `{wiki}/lib/exe/xmlrpc.php`
//! using HTTP basic auth. DokuWiki throttles rapid saves, so writes are
//! spaced by the environment's write interval.

use std::cell::Cell;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine};

use wikisync_core::{DocumentId, Environment};
use wikisync_sync::{DocumentStore, StoreError};

use super::{agent, http_err, ClientError};

const EDIT_SUMMARY: &str = "Updated from remote table";

pub struct DokuWikiClient {
    agent: ureq::Agent,
    endpoint: String,
    authorization: String,
    interval: Duration,
    last_write: Cell<Option<Instant>>,
}

impl DokuWikiClient {
    pub fn new(env: &Environment, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{}:{password}", env.username));
        DokuWikiClient {
            agent: agent(),
            endpoint: format!("{}/lib/exe/xmlrpc.php", env.wiki_url.trim_end_matches('/')),
            authorization: format!("Basic {credentials}"),
            interval: env.write_interval(),
            last_write: Cell::new(None),
        }
    }

    fn pace(&self) {
        if let Some(last) = self.last_write.get() {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "pacing wiki write");
                std::thread::sleep(wait);
            }
        }
    }
}

impl DocumentStore for DokuWikiClient {
    fn write_document(&self, document: &DocumentId, markup: &str) -> Result<(), StoreError> {
        self.pace();
        let body = put_page_call(&document.0, markup, EDIT_SUMMARY);
        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "text/xml")
            .set("Authorization", &self.authorization)
            .send_string(&body)
            .map_err(|e| http_err("POST", &self.endpoint, e))?
            .into_string()
            .map_err(|e| ClientError::Decode {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        self.last_write.set(Some(Instant::now()));
        check_response(&document.0, &response)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// XML-RPC encoding
// ---------------------------------------------------------------------------

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// `wiki.putPage(page, text, {sum, minor: false})`.
fn put_page_call(page: &str, text: &str, summary: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <methodCall>\
         <methodName>wiki.putPage</methodName>\
         <params>\
         <param><value><string>{}</string></value></param>\
         <param><value><string>{}</string></value></param>\
         <param><value><struct>\
         <member><name>sum</name><value><string>{}</string></value></member>\
         <member><name>minor</name><value><boolean>0</boolean></value></member>\
         </struct></value></param>\
         </params>\
         </methodCall>\n",
        escape(page),
        escape(text),
        escape(summary)
    )
}

/// Text between `open` and the following `close`, searching from `from`.
fn between<'a>(xml: &'a str, from: usize, open: &str, close: &str) -> Option<(&'a str, usize)> {
    let start = xml[from..].find(open)? + from + open.len();
    let end = xml[start..].find(close)? + start;
    Some((&xml[start..end], end + close.len()))
}

/// Scalar content of the struct member called `name`, type tags stripped.
fn member(xml: &str, name: &str) -> Option<String> {
    let tag = format!("<name>{name}</name>");
    let after = xml.find(&tag)? + tag.len();
    let (value, _) = between(xml, after, "<value>", "</value>")?;
    let value = value.trim();
    let inner = match value.strip_prefix('<') {
        Some(rest) => {
            let close = rest.find('>')?;
            let tag = &rest[..close];
            let (inner, _) = between(value, 0, &format!("<{tag}>"), &format!("</{tag}>"))?;
            inner
        }
        None => value,
    };
    Some(unescape(inner))
}

fn check_response(page: &str, xml: &str) -> Result<(), ClientError> {
    if xml.contains("<fault>") {
        let code = member(xml, "faultCode")
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(0);
        let message = member(xml, "faultString").unwrap_or_else(|| "unknown fault".to_string());
        return Err(ClientError::Fault { code, message });
    }
    if xml.contains("<boolean>0</boolean>") {
        return Err(ClientError::Rejected {
            page: page.to_string(),
        });
    }
    Ok(())
}
