//! Streaming a log file to an async writer
//!
//! Reading happens on a plain thread so a slow or huge file never
//! blocks the executor; lines travel over an async-std channel.

use crate::error::Error;
use async_std::channel::{self, Receiver};
use futures::io::{AsyncWrite, AsyncWriteExt};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct AsyncFileReader {
    lines: Receiver<String>,
    done: Arc<AtomicBool>,
}

impl AsyncFileReader {
    /// Open `path` and start reading it in the background
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        let (tx, lines) = channel::unbounded();
        let done = Arc::new(AtomicBool::new(false));

        let reader_done = Arc::clone(&done);
        let name = path.display().to_string();
        thread::Builder::new()
            .name("log-tail".into())
            .spawn(move || {
                for line in BufReader::new(file).lines() {
                    match line {
                        Ok(line) => {
                            if tx.try_send(line).is_err() {
                                debug!("tail of {} closed", name);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("reading {} failed: {}", name, e);
                            break;
                        }
                    }
                }
                reader_done.store(true, Ordering::SeqCst);
            })?;

        Ok(Self { lines, done })
    }

    /// The reader is finished and every line was taken
    pub fn eof(&self) -> bool {
        self.done.load(Ordering::SeqCst) && self.lines.is_empty()
    }

    pub async fn next_line(&self) -> Option<String> {
        self.lines.recv().await.ok()
    }

    /// Returns a handle that stops the reader from any thread
    pub fn closer(&self) -> impl Fn() + Send + 'static {
        let lines = self.lines.clone();
        move || {
            lines.close();
        }
    }
}

/// Copy lines from `reader` to `out` until it runs dry or is closed
///
/// Returns the number of lines written.
pub async fn forward<W>(reader: &AsyncFileReader, out: &mut W) -> Result<usize, Error>
where
    W: AsyncWrite + Unpin,
{
    let mut count = 0;
    while let Some(line) = reader.next_line().await {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        count += 1;
    }
    out.flush().await?;
    Ok(count)
}
