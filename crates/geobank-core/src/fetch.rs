// crates/geobank-core/src/fetch.rs

//! # Resilient Fetcher
//!
//! Retrying, timeout-bounded retrieval of remote resources. The wire is
//! abstracted behind [`Transport`] so the retry loop can be driven without a
//! network; [`HttpTransport`] is the real (blocking) implementation.

use crate::config::RetryPolicy;
use crate::error::{FetchError, GeoError, Result};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Chunk size used when streaming large payloads to disk.
const CHUNK_SIZE: usize = 1024 * 1024;
/// Progress is logged every time this many more bytes have landed on disk.
const PROGRESS_STEP: u64 = 64 * 1024 * 1024;
/// Upper bound on the buffer reserved up front from a Content-Length.
const PREALLOC_LIMIT: u64 = 64 * 1024 * 1024;

// -----------------------------------------------------------------------------
// TRANSPORT
// -----------------------------------------------------------------------------

/// An opened response body.
pub struct Download {
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

impl Download {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            content_length: Some(bytes.len() as u64),
            body: Box::new(io::Cursor::new(bytes)),
        }
    }
}

/// One attempt at opening `url`, bounded by `timeout`.
pub trait Transport {
    fn open(&self, url: &str, timeout: Duration) -> std::result::Result<Download, FetchError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn open(&self, url: &str, timeout: Duration) -> std::result::Result<Download, FetchError> {
        (**self).open(url, timeout)
    }
}

/// Serves a local mirror of the upstream files: the last path segment of
/// the URL (query string dropped) names a file under `root`.
///
/// Lets a run work offline against a directory of previously downloaded
/// dumps.
#[derive(Debug, Clone)]
pub struct MirrorTransport {
    root: PathBuf,
}

impl MirrorTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        let name = without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(without_query);
        self.root.join(name)
    }
}

impl Transport for MirrorTransport {
    fn open(&self, url: &str, _timeout: Duration) -> std::result::Result<Download, FetchError> {
        let path = self.path_for(url);
        let file = std::fs::File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::Status(404),
            _ => FetchError::Body(e),
        })?;
        let content_length = file.metadata().ok().map(|m| m.len());
        Ok(Download {
            content_length,
            body: Box::new(io::BufReader::new(file)),
        })
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{Download, Transport};
    use crate::error::FetchError;
    use reqwest::blocking::Client;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Blocking `reqwest` transport.
    ///
    /// `timeout` bounds connecting, waiting for the response head and each
    /// read of the body, never the transfer as a whole. One client is built
    /// per distinct timeout and reused.
    #[derive(Debug, Default)]
    pub struct HttpTransport {
        clients: Mutex<HashMap<Duration, Client>>,
    }

    impl HttpTransport {
        pub fn new() -> Self {
            Self::default()
        }

        fn client(&self, timeout: Duration) -> Result<Client, FetchError> {
            let mut clients = self
                .clients
                .lock()
                .map_err(|_| FetchError::Other("http client cache poisoned".into()))?;
            if let Some(client) = clients.get(&timeout) {
                return Ok(client.clone());
            }
            let client = Client::builder()
                .timeout(timeout)
                .connect_timeout(timeout)
                .build()
                .map_err(classify)?;
            clients.insert(timeout, client.clone());
            Ok(client)
        }
    }

    impl Transport for HttpTransport {
        fn open(&self, url: &str, timeout: Duration) -> Result<Download, FetchError> {
            let response = self
                .client(timeout)?
                .get(url)
                .send()
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            Ok(Download {
                content_length: response.content_length(),
                body: Box::new(response),
            })
        }
    }

    fn classify(err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

// -----------------------------------------------------------------------------
// FETCHER
// -----------------------------------------------------------------------------

/// Retry loop around a [`Transport`]. No caching: every call re-fetches.
#[derive(Debug, Clone)]
pub struct Fetcher<T> {
    transport: T,
    policy: RetryPolicy,
    download_dir: Option<PathBuf>,
}

#[cfg(feature = "http")]
impl Fetcher<HttpTransport> {
    pub fn http(policy: RetryPolicy) -> Self {
        Self::new(HttpTransport::default(), policy)
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            download_dir: None,
        }
    }

    /// Puts temporary downloads under `dir` instead of the system temp dir.
    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches the whole body of `url` into memory.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.with_retry(url, |download| {
            let mut body = download.body;
            let reserve = download.content_length.unwrap_or(0).min(PREALLOC_LIMIT);
            let mut buf = Vec::with_capacity(reserve as usize);
            body.read_to_end(&mut buf).map_err(FetchError::Body)?;
            Ok(buf)
        })
    }

    /// Streams the body of `url` into a fresh temporary file.
    ///
    /// The file is kept on disk; the caller owns its deletion. A failed
    /// attempt removes its partial file before the next one starts.
    pub fn fetch_to_temp_file(&self, url: &str) -> Result<PathBuf> {
        self.with_retry(url, |download| {
            let tmp = match &self.download_dir {
                Some(dir) => tempfile::NamedTempFile::new_in(dir),
                None => tempfile::NamedTempFile::new(),
            };
            let mut tmp = tmp.map_err(FetchError::Body)?;
            stream_with_progress(url, download, tmp.as_file_mut())?;
            tmp.into_temp_path()
                .keep()
                .map_err(|e| FetchError::Body(e.error))
        })
    }

    fn with_retry<R>(
        &self,
        url: &str,
        mut consume: impl FnMut(Download) -> std::result::Result<R, FetchError>,
    ) -> Result<R> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            info!("Downloading {url} (Attempt {attempt}/{attempts})");
            let result = self
                .transport
                .open(url, self.policy.timeout)
                .and_then(&mut consume);

            match result {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= attempts => {
                    return Err(GeoError::Fetch {
                        url: url.to_string(),
                        attempts,
                        source,
                    });
                }
                Err(e) => {
                    warn!(
                        "Download failed: {e}. Retrying in {:?}...",
                        self.policy.backoff
                    );
                    std::thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
            }
        }
    }
}

fn stream_with_progress(
    url: &str,
    download: Download,
    out: &mut impl Write,
) -> std::result::Result<u64, FetchError> {
    let Download {
        content_length,
        mut body,
    } = download;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    let mut next_report = PROGRESS_STEP;

    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FetchError::Body(e)),
        };
        out.write_all(&buf[..n]).map_err(FetchError::Body)?;
        written += n as u64;

        if written >= next_report {
            match content_length {
                Some(total) if total > 0 => info!(
                    "{url}: {} / {} MiB ({:.0}%)",
                    written >> 20,
                    total >> 20,
                    written as f64 * 100.0 / total as f64
                ),
                _ => info!("{url}: {} MiB", written >> 20),
            }
            next_report += PROGRESS_STEP;
        }
    }

    out.flush().map_err(FetchError::Body)?;
    debug!("{url}: wrote {written} bytes");
    Ok(written)
}
