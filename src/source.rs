//! The remote file source boundary: directory listing and whole-file
//! download over SFTP, behind a trait so tests can run in-memory.

use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ssh2::Session;

use crate::config::SftpConfig;
use crate::{SyncError, SyncResult};

/// One remote directory-listing entry.
#[derive(Debug, Clone)]
pub struct RemoteFileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Where daily exports come from.
#[async_trait]
pub trait TripFileSource: Send + Sync {
    /// List the export drop directory.
    async fn list(&self) -> SyncResult<Vec<RemoteFileDescriptor>>;

    /// Download one file's full contents by name.
    async fn fetch(&self, name: &str) -> SyncResult<Vec<u8>>;
}

/// SFTP-backed source.
///
/// The session is opened by [`SftpSource::connect`] and shut down when the
/// value drops, so owning it inside one run's scope releases the connection
/// on every exit path.
pub struct SftpSource {
    inner: Arc<Mutex<SftpInner>>,
    remote_dir: PathBuf,
}

struct SftpInner {
    sftp: ssh2::Sftp,
    // The `Sftp` handle keeps the session alive internally; the `Session`
    // is retained so the transport is torn down when this struct drops.
    _session: Session,
}

impl SftpSource {
    /// Open a session against the configured host and authenticate with the
    /// private key. Blocking work runs on the tokio blocking pool.
    pub async fn connect(cfg: &SftpConfig) -> SyncResult<Self> {
        let cfg = cfg.clone();
        let remote_dir = PathBuf::from(&cfg.remote_dir);
        let inner = tokio::task::spawn_blocking(move || -> SyncResult<SftpInner> {
            let tcp = TcpStream::connect((cfg.host.as_str(), cfg.port))?;
            let mut session = Session::new()?;
            session.set_tcp_stream(tcp);
            session.handshake()?;
            session.userauth_pubkey_file(&cfg.username, None, &cfg.key_path, None)?;
            let sftp = session.sftp()?;
            Ok(SftpInner {
                sftp,
                _session: session,
            })
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            remote_dir,
        })
    }
}

#[async_trait]
impl TripFileSource for SftpSource {
    async fn list(&self) -> SyncResult<Vec<RemoteFileDescriptor>> {
        let inner = Arc::clone(&self.inner);
        let dir = self.remote_dir.clone();
        tokio::task::spawn_blocking(move || -> SyncResult<Vec<RemoteFileDescriptor>> {
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let entries = guard.sftp.readdir(&dir)?;
            Ok(entries
                .into_iter()
                .map(|(path, stat)| RemoteFileDescriptor {
                    name: path
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string(),
                    size_bytes: stat.size.unwrap_or(0),
                    modified_at: stat
                        .mtime
                        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0)),
                })
                .collect())
        })
        .await
        .map_err(join_error)?
    }

    async fn fetch(&self, name: &str) -> SyncResult<Vec<u8>> {
        let inner = Arc::clone(&self.inner);
        let path = self.remote_dir.join(name);
        tokio::task::spawn_blocking(move || -> SyncResult<Vec<u8>> {
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            let mut file = guard.sftp.open(&path)?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(buf)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(err: tokio::task::JoinError) -> SyncError {
    SyncError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}
