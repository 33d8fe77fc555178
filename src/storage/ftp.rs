use async_trait::async_trait;
use std::io::{self, Cursor};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use suppaftp::{types::FileType, FtpError, FtpStream};
use tracing::{debug, warn};

use super::{path, FileStore, StoreError};
use crate::config::FtpConfig;

/// FTP backed store. Every operation opens its own session on the blocking
/// pool, bounded by the configured timeout and retried on transient failures.
#[derive(Clone)]
pub struct FtpStore {
    config: Arc<FtpConfig>,
}

impl FtpStore {
    pub fn new(config: FtpConfig) -> Self {
        FtpStore {
            config: Arc::new(config),
        }
    }

    async fn run<T, F>(&self, op: &'static str, target: &str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Fn(&mut FtpStream) -> Result<T, FtpError> + Clone + Send + 'static,
    {
        let mut attempt = 0;
        loop {
            let config = self.config.clone();
            let f = f.clone();
            let task = tokio::task::spawn_blocking(move || session(&config, f));

            let result = match tokio::time::timeout(self.config.timeout, task).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(StoreError::Protocol(join_err.to_string())),
                Err(_) => Err(StoreError::Timeout(self.config.timeout)),
            };

            match result {
                Err(err) if err.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    warn!(op, target, attempt, error = %err, "FTP operation failed, retrying");
                }
                other => {
                    debug!(op, target, ok = other.is_ok(), "FTP operation finished");
                    return other;
                }
            }
        }
    }
}

fn session<T, F>(config: &FtpConfig, f: F) -> Result<T, StoreError>
where
    F: Fn(&mut FtpStream) -> Result<T, FtpError>,
{
    let mut ftp = FtpStream::connect_with_stream(control_stream(config)?)?;
    ftp.login(&config.user, &config.password)?;
    ftp.transfer_type(FileType::Binary)?;

    let result = f(&mut ftp).map_err(StoreError::from);
    if let Err(err) = ftp.quit() {
        debug!(error = %err, "FTP quit failed");
    }
    result
}

/// Control connection whose connect, reads and writes all give up after the
/// configured timeout, so a silent server ends the blocking session too.
fn control_stream(config: &FtpConfig) -> Result<TcpStream, StoreError> {
    let transient = |err: io::Error| StoreError::Transient(format!("{}: {err}", config.host));

    let mut last_err = None;
    for addr in config.host.to_socket_addrs().map_err(transient)? {
        match TcpStream::connect_timeout(&addr, config.timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(config.timeout)).map_err(transient)?;
                stream.set_write_timeout(Some(config.timeout)).map_err(transient)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(match last_err {
        Some(err) => transient(err),
        None => StoreError::Transient(format!("{} did not resolve", config.host)),
    })
}

fn status_code(err: &FtpError) -> Option<u32> {
    match err {
        FtpError::UnexpectedResponse(response) => Some(response.status.code()),
        _ => None,
    }
}

impl From<FtpError> for StoreError {
    fn from(err: FtpError) -> Self {
        match (&err, status_code(&err)) {
            (FtpError::ConnectionError(io), _) => StoreError::Transient(io.to_string()),
            (_, Some(530 | 532)) => StoreError::Auth(err.to_string()),
            (_, Some(550)) => StoreError::NotFound(err.to_string()),
            (_, Some(400..=499)) => StoreError::Transient(err.to_string()),
            _ => StoreError::Protocol(err.to_string()),
        }
    }
}

#[async_trait]
impl FileStore for FtpStore {
    async fn upload(&self, file_path: &str, data: Vec<u8>) -> Result<(), StoreError> {
        let target = path::normalize(file_path);
        let remote = target.clone();
        self.run("upload", &target, move |ftp| {
            ftp.put_file(&remote, &mut Cursor::new(data.as_slice()))
                .map(|_| ())
        })
        .await
    }

    async fn download(&self, file_path: &str) -> Result<Vec<u8>, StoreError> {
        let target = path::normalize(file_path);
        let remote = target.clone();
        self.run("download", &target, move |ftp| {
            ftp.retr_as_buffer(&remote).map(Cursor::into_inner)
        })
        .await
    }

    async fn delete(&self, file_path: &str) -> Result<(), StoreError> {
        let target = path::normalize(file_path);
        let remote = target.clone();
        self.run("delete", &target, move |ftp| ftp.rm(&remote)).await
    }

    async fn exists(&self, file_path: &str) -> Result<bool, StoreError> {
        let target = path::normalize(file_path);
        let remote = target.clone();
        self.run("exists", &target, move |ftp| match ftp.size(&remote) {
            Ok(_) => Ok(true),
            Err(err) if status_code(&err) == Some(550) => Ok(false),
            Err(err) => Err(err),
        })
        .await
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let target = path::normalize(dir);
        let remote = target.clone();
        self.run("list", &target, move |ftp| {
            ftp.nlst(Some(&remote)).map(|names| {
                names
                    .iter()
                    .map(|name| path::file_name(name).to_string())
                    .filter(|name| !name.is_empty() && name != "." && name != "..")
                    .collect()
            })
        })
        .await
    }

    async fn make_dir(&self, dir: &str) -> Result<(), StoreError> {
        let target = path::normalize(dir);
        let remote = target.trim_end_matches('/').to_string();
        self.run("make_dir", &target, move |ftp| ftp.mkdir(&remote)).await
    }

    /// Walks the directory one segment at a time in a single session,
    /// creating whatever is missing.
    async fn ensure_dir(&self, dir: &str) -> Result<(), StoreError> {
        let target = path::normalize(dir);
        let remote = target.clone();
        self.run("ensure_dir", &target, move |ftp| {
            for segment in remote.split('/').filter(|s| !s.is_empty()) {
                if ftp.cwd(segment).is_err() {
                    ftp.mkdir(segment)?;
                    ftp.cwd(segment)?;
                }
            }
            Ok(())
        })
        .await
    }
}
