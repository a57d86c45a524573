//! ffmpeg-backed video source.
//!
//! `ffprobe` reports the first video stream's geometry, then `ffmpeg` decodes
//! the file to raw `rgb24` frames on stdout which are read one frame at a time.
//! Nothing is buffered beyond the frame being read.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout, Command};

use super::{Frame, VideoOpener, VideoSource};
use crate::error::SourceError;

const DEFAULT_FFMPEG_THREADS: usize = 1;

pub struct FfmpegOpener {
    threads: usize,
}

impl FfmpegOpener {
    pub fn new() -> Self {
        let threads = std::env::var("FFMPEG_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_FFMPEG_THREADS);
        Self { threads }
    }
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoOpener for FfmpegOpener {
    async fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, SourceError> {
        let (width, height) = probe_dimensions(path).await?;

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(["-threads", &self.threads.to_string()])
            .arg("-i")
            .arg(path)
            .args(["-an", "-sn"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SourceError::Unreadable(format!("failed to start ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Unreadable("ffmpeg stdout unavailable".to_string()))?;

        tracing::debug!(path = %path.display(), width, height, "opened video source");

        Ok(Box::new(FfmpegSource {
            child,
            stdout: Some(stdout),
            width,
            height,
        }))
    }
}

pub struct FfmpegSource {
    child: Child,
    stdout: Option<ChildStdout>,
    width: u32,
    height: u32,
}

impl FfmpegSource {
    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Stdout closed on a frame boundary. Only a clean exit means the video
    /// really ended; a decoder failure can also stop output between frames.
    async fn finish(&mut self, index: u64) -> Result<Option<Frame>, SourceError> {
        self.stdout.take();
        let status = self
            .child
            .wait()
            .await
            .map_err(|source| SourceError::Read { index, source })?;

        if status.success() {
            return Ok(None);
        }
        Err(SourceError::Read {
            index,
            source: io::Error::other(format!("ffmpeg exited with {}", status)),
        })
    }
}

#[async_trait]
impl VideoSource for FfmpegSource {
    async fn next_frame(&mut self, index: u64) -> Result<Option<Frame>, SourceError> {
        let frame_len = self.frame_len();
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut rgb = vec![0u8; frame_len];
        let filled = read_full(stdout, &mut rgb)
            .await
            .map_err(|source| SourceError::Read { index, source })?;

        if filled == 0 {
            return self.finish(index).await;
        }
        if filled < frame_len {
            return Err(SourceError::Read {
                index,
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("truncated frame: {} of {} bytes", filled, frame_len),
                ),
            });
        }

        Ok(Some(Frame {
            index,
            width: self.width,
            height: self.height,
            rgb,
        }))
    }

    async fn release(&mut self) {
        // Closing the pipe first lets ffmpeg exit on its own if it is mid-write.
        self.stdout.take();
        if let Err(e) = self.child.start_kill() {
            // Already exited
            tracing::trace!("ffmpeg kill: {}", e);
        }
        match self.child.wait().await {
            Ok(status) => tracing::debug!(%status, "ffmpeg released"),
            Err(e) => tracing::warn!("failed to reap ffmpeg: {}", e),
        }
    }
}

/// Fill `buf` from `reader`; returns the number of bytes read, short only at EOF.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

async fn probe_dimensions(path: &Path) -> Result<(u32, u32), SourceError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(["-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height"])
        .args(["-of", "csv=p=0:s=x"])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SourceError::Unreadable(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Unreadable(format!(
            "ffprobe failed: {}",
            stderr.trim()
        )));
    }

    parse_dimensions(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        SourceError::Unreadable(format!("no video stream found in {}", path.display()))
    })
}

/// Parse ffprobe's `WIDTHxHEIGHT` line.
fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once('x')?;
    let width: u32 = w.trim().parse().ok()?;
    let height: u32 = h.trim().trim_end_matches('x').parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}
