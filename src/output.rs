use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::error::EmitError;
use crate::targets::DialTarget;
use crate::types::CertificateRecord;

/// Line-oriented result sink shared by every worker.
///
/// Each line is built in full before the writer lock is taken and is written
/// with a single `write_all`, so lines from different workers never
/// interleave.
#[derive(Debug)]
pub struct Emitter<W> {
    out: Arc<Mutex<W>>,
    show_failures: bool,
}

impl<W> Clone for Emitter<W> {
    fn clone(&self) -> Self {
        Self {
            out: Arc::clone(&self.out),
            show_failures: self.show_failures,
        }
    }
}

impl Emitter<Stdout> {
    pub fn stdout(show_failures: bool) -> Self {
        Self::new(tokio::io::stdout(), show_failures)
    }
}

impl<W> Emitter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, show_failures: bool) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
            show_failures,
        }
    }

    pub fn show_failures(&self) -> bool {
        self.show_failures
    }

    /// Write one record as a JSON line.
    pub async fn emit(&self, record: &CertificateRecord) -> Result<(), EmitError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.write_line(&line).await
    }

    /// Write a failure notice for `target`. Returns `Ok(false)` without
    /// writing when failure output is disabled.
    pub async fn emit_failure(&self, target: DialTarget) -> Result<bool, EmitError> {
        if !self.show_failures {
            return Ok(false);
        }
        let line = format!("Failed to get SSL certificate from {target}\n");
        self.write_line(line.as_bytes()).await?;
        Ok(true)
    }

    async fn write_line(&self, line: &[u8]) -> Result<(), EmitError> {
        let mut out = self.out.lock().await;
        out.write_all(line).await?;
        out.flush().await?;
        Ok(())
    }

    /// Take back the writer once every clone has been dropped.
    pub fn into_inner(self) -> Result<W, Self> {
        let show_failures = self.show_failures;
        Arc::try_unwrap(self.out)
            .map(Mutex::into_inner)
            .map_err(|out| Self { out, show_failures })
    }
}
