//! Audio duration probing using Symphonia
//!
//! A probe only reads container metadata; nothing is decoded. Local files
//! are opened directly. Remote resources are read through a bounded window
//! of their first and last bytes.

use crate::error::ProbeError;
use crate::remote;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fs::File;
use std::path::PathBuf;
use symphonia::core::codecs::CodecParameters;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Measures the length of an audio resource in seconds
pub trait DurationProbe: Send + Sync {
    fn probe(&self, source: &str) -> BoxFuture<'static, Result<f64, ProbeError>>;
}

/// Where a chapter's audio locator points
#[derive(Debug, Clone, PartialEq, Eq)]
enum Locator {
    Local(PathBuf),
    Remote(String),
}

impl Locator {
    fn parse(source: &str) -> Result<Self, ProbeError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return Ok(Self::Remote(source.to_string()));
        }

        if let Some(path) = source.strip_prefix("file://") {
            return Ok(Self::Local(PathBuf::from(path)));
        }

        if source.contains("://") || source.trim().is_empty() {
            return Err(ProbeError::UnsupportedSource(source.to_string()));
        }

        Ok(Self::Local(PathBuf::from(source)))
    }
}

/// File extension of a locator, ignoring any query or fragment
fn extension_of(source: &str) -> Option<String> {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Probe backed by symphonia for decoding and reqwest for remote resources
#[derive(Clone)]
pub struct SymphoniaProbe {
    client: reqwest::Client,
}

impl SymphoniaProbe {
    /// Creates a probe with its own HTTP client
    pub fn new() -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("Bookdeck/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn probe_remote(client: reqwest::Client, url: String) -> Result<f64, ProbeError> {
        let window = remote::fetch_window(&client, &url).await?;
        let hint = extension_of(&url);

        tokio::task::spawn_blocking(move || probe_media(Box::new(window), hint))
            .await
            .map_err(|e| ProbeError::Task(e.to_string()))?
    }

    async fn probe_local(path: PathBuf) -> Result<f64, ProbeError> {
        tokio::task::spawn_blocking(move || {
            let file = File::open(&path)?;
            let hint = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            probe_media(Box::new(file), hint)
        })
        .await
        .map_err(|e| ProbeError::Task(e.to_string()))?
    }
}

impl DurationProbe for SymphoniaProbe {
    fn probe(&self, source: &str) -> BoxFuture<'static, Result<f64, ProbeError>> {
        let locator = Locator::parse(source);
        let client = self.client.clone();

        async move {
            match locator? {
                Locator::Local(path) => Self::probe_local(path).await,
                Locator::Remote(url) => Self::probe_remote(client, url).await,
            }
        }
        .boxed()
    }
}

/// Reads the default track's length from a media source
fn probe_media(source: Box<dyn MediaSource>, extension: Option<String>) -> Result<f64, ProbeError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension.as_deref() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ProbeError::Decode(e.to_string()))?;

    let track = probed.format.default_track().ok_or(ProbeError::NoTrack)?;
    track_seconds(&track.codec_params)
}

fn track_seconds(params: &CodecParameters) -> Result<f64, ProbeError> {
    let n_frames = params.n_frames.ok_or(ProbeError::UnknownLength)?;

    let seconds = match (params.time_base, params.sample_rate) {
        (Some(tb), _) => {
            let time = tb.calc_time(n_frames);
            time.seconds as f64 + time.frac
        }
        (None, Some(rate)) if rate > 0 => n_frames as f64 / f64::from(rate),
        _ => return Err(ProbeError::UnknownLength),
    };

    ProbeError::check_length(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Mono 16-bit PCM WAV holding `frames` silent samples
    fn wav_bytes(sample_rate: u32, frames: u32) -> Vec<u8> {
        let data_len = frames * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(44 + data_len as usize, 0);
        bytes
    }

    fn write_wav(path: &std::path::Path, sample_rate: u32, frames: u32) {
        let mut file = File::create(path).unwrap();
        file.write_all(&wav_bytes(sample_rate, frames)).unwrap();
    }

    #[test]
    fn test_locator_parse() {
        assert_eq!(
            Locator::parse("https://example.com/a.ogg").unwrap(),
            Locator::Remote("https://example.com/a.ogg".to_string())
        );
        assert_eq!(
            Locator::parse("file:///tmp/a.wav").unwrap(),
            Locator::Local(PathBuf::from("/tmp/a.wav"))
        );
        assert_eq!(
            Locator::parse("audio/a.mp3").unwrap(),
            Locator::Local(PathBuf::from("audio/a.mp3"))
        );
        assert!(matches!(
            Locator::parse("ftp://example.com/a.mp3"),
            Err(ProbeError::UnsupportedSource(_))
        ));
        assert!(Locator::parse("  ").is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("https://x.org/a/b.MP3?sig=1"), Some("mp3".to_string()));
        assert_eq!(extension_of("/books/ch1.ogg#t=10"), Some("ogg".to_string()));
        assert_eq!(extension_of("https://x.org/stream"), None);
        assert_eq!(extension_of("/books/.hidden"), None);
    }

    #[tokio::test]
    async fn test_probe_local_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter.wav");
        write_wav(&path, 8000, 16000);

        let probe = SymphoniaProbe::new().unwrap();
        let seconds = probe.probe(path.to_str().unwrap()).await.unwrap();
        assert!((seconds - 2.0).abs() < 1e-6);

        let url = format!("file://{}", path.display());
        let seconds = probe.probe(&url).await.unwrap();
        assert!((seconds - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let probe = SymphoniaProbe::new().unwrap();
        let result = probe.probe("/definitely/not/here.mp3").await;
        assert!(matches!(result, Err(ProbeError::Io(_))));
    }

    #[tokio::test]
    async fn test_probe_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();

        let probe = SymphoniaProbe::new().unwrap();
        let result = probe.probe(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(ProbeError::Decode(_))));
    }

    #[tokio::test]
    async fn test_probe_empty_wav_has_no_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        write_wav(&path, 8000, 0);

        let probe = SymphoniaProbe::new().unwrap();
        assert!(probe.probe(path.to_str().unwrap()).await.is_err());
    }

    #[test]
    fn test_length_read_through_remote_window() {
        let bytes = wav_bytes(8000, 400_000);
        let len = bytes.len() as u64;
        let window = remote::RemoteWindow::new(bytes[..4096].to_vec(), len)
            .with_tail(len - 4096, bytes[bytes.len() - 4096..].to_vec());

        let seconds = probe_media(Box::new(window), Some("wav".to_string())).unwrap();
        assert!((seconds - 50.0).abs() < 1e-6);
    }
}
