//! Turning a track's audio reference into bytes a decoder can read.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rodio::decoder::DecoderError;
use reqwest::blocking::Client;
use rodio::{Decoder, Sink, Source};
use thiserror::Error;

use super::types::{PlaybackError, PlaybackErrorKind};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported source: {0}")]
    UnsupportedScheme(String),
    #[error("malformed data URI")]
    MalformedDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("download interrupted: {0}")]
    Stream(std::io::Error),
    #[error("fetch aborted")]
    Aborted,
    #[error("unrecognized audio format")]
    UnrecognizedFormat,
    #[error("decoding failed: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn kind(&self) -> PlaybackErrorKind {
        match self {
            Self::UnsupportedScheme(_) | Self::UnrecognizedFormat => {
                PlaybackErrorKind::SourceUnsupported
            }
            Self::MalformedDataUri | Self::Base64(_) | Self::Decode(_) => PlaybackErrorKind::Decode,
            Self::Read { .. } | Self::Fetch(_) | Self::Stream(_) => PlaybackErrorKind::Network,
            Self::Aborted => PlaybackErrorKind::Aborted,
        }
    }

    pub fn to_playback_error(&self) -> PlaybackError {
        PlaybackError::new(self.kind())
    }
}

impl From<DecoderError> for SourceError {
    fn from(e: DecoderError) -> Self {
        match e {
            DecoderError::UnrecognizedFormat => Self::UnrecognizedFormat,
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Audio bytes ready for decoding.
#[derive(Debug, Clone)]
pub enum Payload {
    Bytes(Arc<[u8]>),
    File(PathBuf),
}

/// Result of looking at a reference without doing network I/O.
#[derive(Debug)]
pub enum Resolved {
    Ready(Payload),
    /// Must be fetched first.
    Remote(String),
}

/// Classify `uri`: inline `data:`, `http(s)://`, `file://` or a plain path.
pub fn resolve(uri: &str) -> Result<Resolved, SourceError> {
    let uri = uri.trim();
    if uri.starts_with("data:") {
        return decode_data_uri(uri).map(|bytes| Resolved::Ready(Payload::Bytes(bytes)));
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(Resolved::Remote(uri.to_string()));
    }
    if let Some(path) = uri.strip_prefix("file://") {
        return Ok(Resolved::Ready(Payload::File(PathBuf::from(path))));
    }
    if uri.is_empty() || uri.contains("://") {
        return Err(SourceError::UnsupportedScheme(uri.chars().take(32).collect()));
    }
    Ok(Resolved::Ready(Payload::File(PathBuf::from(uri))))
}

/// Decode `data:<mime>[;base64],<payload>`.
pub fn decode_data_uri(uri: &str) -> Result<Arc<[u8]>, SourceError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(SourceError::MalformedDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(SourceError::MalformedDataUri)?;

    if meta.ends_with(";base64") {
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Arc::from(bytes))
    } else {
        Ok(Arc::from(payload.as_bytes()))
    }
}

const FETCH_CHUNK: usize = 64 * 1024;

/// Download a remote source. Blocking; callers run it off the UI thread.
///
/// `cancelled` is checked between chunks, so an abandoned download stops early.
pub fn fetch(client: &Client, url: &str, cancelled: &AtomicBool) -> Result<Payload, SourceError> {
    let mut response = client.get(url).send()?.error_for_status()?;
    let mut bytes = Vec::new();
    let mut chunk = vec![0; FETCH_CHUNK];
    loop {
        if cancelled.load(Ordering::Relaxed) {
            return Err(SourceError::Aborted);
        }
        let n = response.read(&mut chunk).map_err(SourceError::Stream)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
    }
    Ok(Payload::Bytes(Arc::from(bytes)))
}

/// Decode `payload` and queue it on `sink`. Returns the stream length when known.
pub(super) fn append_to(sink: &Sink, payload: &Payload) -> Result<Option<Duration>, SourceError> {
    match payload {
        Payload::Bytes(bytes) => append_decoded(sink, Cursor::new(Arc::clone(bytes))),
        Payload::File(path) => {
            let file = File::open(path).map_err(|source| SourceError::Read {
                path: path.clone(),
                source,
            })?;
            append_decoded(sink, BufReader::new(file))
        }
    }
}

fn append_decoded<R>(sink: &Sink, reader: R) -> Result<Option<Duration>, SourceError>
where
    R: Read + Seek + Send + Sync + 'static,
{
    let decoder = Decoder::new(reader)?;
    let duration = decoder.total_duration();
    sink.append(decoder);
    Ok(duration)
}
