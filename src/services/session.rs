// src/services/session.rs

//! Authenticated portal session.
//!
//! Owns the HTTP client, cookie jar and base URL, and hides the portal's
//! form/DWR plumbing behind typed operations. Created once per run and
//! reused for every request; nothing is persisted across runs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{LoginCredentials, PortalConfig, StreamPage};
use crate::utils::{filename_from_url, resolve_url};

/// Login endpoint, relative to the portal base.
const LOGIN_PATH: &str = "/webapps/bb-sso-BBLEARN/authValidate/customLoginFromLoginAjax";

/// Stream viewer endpoint used for view-open and page fetches.
const STREAM_PATH: &str = "/webapps/streamViewer/streamViewer";

/// DWR endpoint for dismissing a notification.
const DISMISS_PATH: &str =
    "/webapps/streamViewer/dwr_open/call/plaincall/NautilusViewService.removeRecipient.dwr";

/// The login endpoint answers with this exact body on success.
const LOGIN_SUCCESS_SENTINEL: &str = "true";

/// Outcome of a file download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File written to disk under the target directory
    Saved { filename: String, size: u64 },

    /// Download aborted because the configured size cap was exceeded.
    /// `size` is the declared or observed size at abort time; bytes already
    /// flushed may remain on disk.
    TooLarge { filename: String, size: u64 },
}

/// Running download-size accounting against an optional cap.
struct SizeCap {
    cap: Option<u64>,
    written: u64,
}

impl SizeCap {
    fn new(cap: Option<u64>) -> Self {
        Self { cap, written: 0 }
    }

    /// Declared Content-Length check, before any bytes are written.
    /// Returns the declared size when it already exceeds the cap.
    fn rejects_declared(&self, declared: Option<u64>) -> Option<u64> {
        match (self.cap, declared) {
            (Some(cap), Some(declared)) if declared > cap => Some(declared),
            _ => None,
        }
    }

    /// Account for one incoming chunk; true when the running total now
    /// exceeds the cap, in which case the chunk must not be written.
    fn exceeds(&mut self, len: u64) -> bool {
        self.written += len;
        self.cap.is_some_and(|cap| self.written > cap)
    }
}

/// Source of response body chunks. The write loop runs against this seam
/// so it can be driven from an in-memory sequence.
#[async_trait]
trait ChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}

/// Write chunks to `file`, flushing each one. Returns `false` when the
/// cap was exceeded mid-stream; the chunk that crossed the cap is not
/// written, so at most the already-flushed bytes remain on disk.
async fn write_capped(
    source: &mut impl ChunkSource,
    file: &mut tokio::fs::File,
    cap: &mut SizeCap,
) -> Result<bool> {
    while let Some(chunk) = source.next_chunk().await? {
        if cap.exceeds(chunk.len() as u64) {
            file.flush().await?;
            return Ok(false);
        }
        file.write_all(&chunk).await?;
        file.flush().await?;
    }
    Ok(true)
}

/// Authenticated HTTP session against the portal.
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl Session {
    /// Create a session with a fresh cookie jar.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    /// Portal base URL as a string, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }

    /// Authenticate against the portal.
    ///
    /// Returns `Ok(true)` iff the server's login-result body equals the
    /// success sentinel. No retry; the caller decides whether to abort.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<bool> {
        // Seed the session cookies before posting the login form.
        self.client.get(self.base_url.clone()).send().await?;

        let form = [
            ("action", "login"),
            ("remote-user", ""),
            ("new_loc", ""),
            ("auth_type", ""),
            ("one_time_token", ""),
            ("encoded_pw", credentials.encoded_pw.as_str()),
            (
                "encoded_pw_unicode",
                credentials.encoded_pw_unicode.as_str(),
            ),
            (
                "login_uid_unicode",
                credentials.login_uid_unicode.as_str(),
            ),
            (
                "login_pwd_unicode",
                credentials.login_pwd_unicode.as_str(),
            ),
            ("bblangt", "null"),
        ];

        let response = self.client.post(self.url(LOGIN_PATH)).form(&form).send().await?;
        let body = response.text().await?;
        Ok(body == LOGIN_SUCCESS_SENTINEL)
    }

    /// GET a page with the session's cookies attached.
    ///
    /// A non-200 status or transport error is a single-operation failure
    /// reported as `None`; callers must not treat it as fatal.
    pub async fn fetch_text(&self, path: &str) -> Option<String> {
        let url = self.url(path);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                log::warn!("GET {} failed: {}", url, error);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("GET {} returned status {}", url, response.status());
            return None;
        }

        match response.text().await {
            Ok(text) => Some(text),
            Err(error) => {
                log::warn!("GET {} body read failed: {}", url, error);
                None
            }
        }
    }

    /// One-time stream initialization call. Marks the alert view as opened
    /// server-side; required before polling pages.
    pub async fn open_stream_view(&self) -> Result<()> {
        let form = [
            ("cmd", "view"),
            ("streamName", "alerts"),
            ("globalNavigation", "false"),
        ];
        self.client
            .post(self.url(STREAM_PATH))
            .form(&form)
            .send()
            .await?;
        Ok(())
    }

    /// Fetch one page of the alert stream.
    ///
    /// `retrieve_only` distinguishes a continuation fetch from the first
    /// page. Transport or status failure here is fatal for the whole
    /// acquisition pass.
    pub async fn fetch_stream_page(&self, retrieve_only: bool) -> Result<StreamPage> {
        let mut form = vec![
            ("cmd", "loadStream"),
            ("streamName", "alerts"),
            ("providers", "{}"),
            ("forOverview", "false"),
        ];
        if retrieve_only {
            form.push(("retrieve_only", "true"));
        }

        let response = self
            .client
            .post(self.url(STREAM_PATH))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::stream(
                "loadStream",
                format!("status {status}"),
            ));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Dismiss a notification given its dismiss token.
    ///
    /// Any non-200 response (or transport failure) is failure, anything
    /// else success. The portal's answer is unreliable in both directions:
    /// a reported error may still have dismissed the alert and vice versa.
    pub async fn dismiss(&self, dismiss_id: &str) -> bool {
        let script_session = format!(
            "8A22AEE4C7B3F9CA3A094735175A6B14{}",
            Utc::now().timestamp_subsec_millis() % 1000
        );
        let param = format!("string:{dismiss_id}");
        let http_session = self.stream_session_cookie();

        let form = [
            ("callCount", "1"),
            (
                "page",
                "/webapps/streamViewer/streamViewer?cmd=view&streamName=alerts&globalNavigation=false",
            ),
            ("httpSessionId", http_session.as_str()),
            ("scriptSessionId", script_session.as_str()),
            ("c0-scriptName", "NautilusViewService"),
            ("c0-methodName", "removeRecipient"),
            ("c0-id", "0"),
            ("c0-param0", param.as_str()),
            ("batchId", "0"),
        ];

        match self
            .client
            .post(self.url(DISMISS_PATH))
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                log::warn!("Dismiss request failed: {}", error);
                false
            }
        }
    }

    /// Stream a file to disk under `target_dir`.
    ///
    /// The filename is derived from the final (post-redirect) URL,
    /// percent-decoded. Each chunk is flushed as it is written so an
    /// oversize abort leaves at most the bytes already flushed.
    pub async fn download_file(
        &self,
        path: &str,
        target_dir: &Path,
        max_size: Option<u64>,
    ) -> Result<DownloadOutcome> {
        let mut response = self
            .client
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?;

        let filename = filename_from_url(response.url().as_str());
        let mut cap = SizeCap::new(max_size);

        if let Some(declared) = cap.rejects_declared(response.content_length()) {
            return Ok(DownloadOutcome::TooLarge {
                filename,
                size: declared,
            });
        }

        tokio::fs::create_dir_all(target_dir).await?;
        let mut file = tokio::fs::File::create(target_dir.join(&filename)).await?;

        if !write_capped(&mut response, &mut file, &mut cap).await? {
            return Ok(DownloadOutcome::TooLarge {
                filename,
                size: cap.written,
            });
        }

        Ok(DownloadOutcome::Saved {
            filename,
            size: cap.written,
        })
    }

    /// JSESSIONID scoped to the stream viewer, as the DWR call expects.
    fn stream_session_cookie(&self) -> String {
        let scope = self
            .base_url
            .join(STREAM_PATH)
            .unwrap_or_else(|_| self.base_url.clone());

        let Some(header) = self.jar.cookies(&scope) else {
            return String::new();
        };
        let Ok(cookies) = header.to_str() else {
            return String::new();
        };

        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == "JSESSIONID")
            .map(|(_, value)| value.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tempfile::TempDir;

    use super::*;

    struct ScriptedChunks {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedChunks {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    #[async_trait]
    impl ChunkSource for ScriptedChunks {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(self.chunks.pop_front())
        }
    }

    #[test]
    fn declared_size_over_cap_is_rejected_before_writing() {
        let cap = SizeCap::new(Some(100));
        assert_eq!(cap.rejects_declared(Some(101)), Some(101));
        assert_eq!(cap.rejects_declared(Some(100)), None);
        assert_eq!(cap.rejects_declared(None), None);
        assert_eq!(SizeCap::new(None).rejects_declared(Some(u64::MAX)), None);
    }

    #[tokio::test]
    async fn capped_write_aborts_mid_stream_keeping_flushed_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.bin");
        let mut file = tokio::fs::File::create(&path).await.unwrap();

        let mut source = ScriptedChunks::new(vec![vec![1u8; 4], vec![2u8; 4], vec![3u8; 4]]);
        let mut cap = SizeCap::new(Some(10));
        let completed = write_capped(&mut source, &mut file, &mut cap).await.unwrap();

        assert!(!completed);
        // The observed size at abort includes the rejected chunk...
        assert_eq!(cap.written, 12);
        // ...but that chunk itself never reaches the disk.
        assert_eq!(std::fs::read(&path).unwrap().len(), 8);
    }

    #[tokio::test]
    async fn write_exactly_at_cap_completes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exact.bin");
        let mut file = tokio::fs::File::create(&path).await.unwrap();

        let mut source = ScriptedChunks::new(vec![b"abc".to_vec(), b"defg".to_vec()]);
        let mut cap = SizeCap::new(Some(7));
        let completed = write_capped(&mut source, &mut file, &mut cap).await.unwrap();

        assert!(completed);
        assert_eq!(cap.written, 7);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdefg");
    }

    #[tokio::test]
    async fn uncapped_write_stores_every_chunk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ok.bin");
        let mut file = tokio::fs::File::create(&path).await.unwrap();

        let mut source = ScriptedChunks::new(vec![b"abc".to_vec(), b"defg".to_vec()]);
        let mut cap = SizeCap::new(None);
        let completed = write_capped(&mut source, &mut file, &mut cap).await.unwrap();

        assert!(completed);
        assert_eq!(cap.written, 7);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdefg");
    }
}
