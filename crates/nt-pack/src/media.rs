//! Media transcoding.
//!
//! Packing a media file produces derivative blobs: the untouched original,
//! a small preview, and a lossy transcode. The ffmpeg-backed converter is
//! the production implementation; the `random` converter derives small
//! deterministic payloads from the input bytes so tests never shell out.
//! Conversion is the only parallel stage; the degree of parallelism comes
//! from `[medias] parallel` in the configuration.

use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;
use sha1::{Digest, Sha1};

use nt_object::{AttributeSet, MediaKind, TagSet, Value};

use crate::{PackError, Result};

/// Bytes produced for one blob, with its classification.
#[derive(Debug, Clone)]
pub struct BlobPayload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub tags: TagSet,
    pub attributes: AttributeSet,
}

impl BlobPayload {
    fn new(bytes: Vec<u8>, mime: &str, tags: &[&str]) -> Self {
        BlobPayload {
            bytes,
            mime: mime.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            attributes: AttributeSet::new(),
        }
    }
}

/// Produces derivative blobs for one media file.
pub trait MediaConverter: Send + Sync {
    fn convert(&self, original: &Path, kind: MediaKind) -> Result<Vec<BlobPayload>>;
}

/// Convert a batch of media files, `parallel` at a time.
///
/// Results come back in input order. Transcoding is interruptible between
/// files, never within one.
pub fn convert_all(
    converter: &dyn MediaConverter,
    inputs: &[(PathBuf, MediaKind)],
    parallel: usize,
) -> Result<Vec<Vec<BlobPayload>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel.max(1))
        .build()
        .map_err(|e| PackError::Conversion {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
    pool.install(|| {
        inputs
            .par_iter()
            .map(|(path, kind)| converter.convert(path, *kind))
            .collect()
    })
}

/// MIME type for a file extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// ffmpeg-backed converter.
pub struct FfmpegConverter {
    command: String,
    preset: String,
}

impl FfmpegConverter {
    pub fn new(command: impl Into<String>, preset: impl Into<String>) -> Self {
        FfmpegConverter {
            command: command.into(),
            preset: preset.into(),
        }
    }

    /// Run ffmpeg writing to a temp file with the given extension, and
    /// return the produced bytes.
    fn transcode(&self, input: &Path, args: &[&str], out_ext: &str) -> Result<Vec<u8>> {
        let out = tempfile::Builder::new()
            .suffix(&format!(".{out_ext}"))
            .tempfile()
            .map_err(PackError::Io)?;
        let status = Command::new(&self.command)
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .args(args)
            .arg(out.path())
            .status()
            .map_err(|e| PackError::Conversion {
                path: input.to_path_buf(),
                reason: format!("cannot run {}: {e}", self.command),
            })?;
        if !status.success() {
            return Err(PackError::Conversion {
                path: input.to_path_buf(),
                reason: format!("{} exited with {status}", self.command),
            });
        }
        Ok(std::fs::read(out.path())?)
    }
}

impl MediaConverter for FfmpegConverter {
    fn convert(&self, original: &Path, kind: MediaKind) -> Result<Vec<BlobPayload>> {
        let bytes = std::fs::read(original)?;
        let mime = mime_for_extension(&extension_of(original));
        let mut blobs = vec![BlobPayload::new(bytes, mime, &["original"])];

        match kind {
            MediaKind::Image => {
                let preview =
                    self.transcode(original, &["-vf", "scale='min(600,iw)':-1"], "webp")?;
                blobs.push(BlobPayload::new(preview, "image/webp", &["preview"]));
                let lossy = self.transcode(original, &["-quality", "75"], "webp")?;
                blobs.push(BlobPayload::new(lossy, "image/webp", &["lossy"]));
            }
            MediaKind::Audio => {
                let lossy = self.transcode(original, &["-b:a", "96k"], "mp3")?;
                blobs.push(BlobPayload::new(lossy, "audio/mpeg", &["lossy"]));
            }
            MediaKind::Video => {
                let preview = self.transcode(
                    original,
                    &["-vf", "scale='min(600,iw)':-1", "-frames:v", "1"],
                    "webp",
                )?;
                blobs.push(BlobPayload::new(preview, "image/webp", &["preview"]));
                let lossy = self.transcode(
                    original,
                    &["-crf", "35", "-preset", self.preset.as_str()],
                    "webm",
                )?;
                blobs.push(BlobPayload::new(lossy, "video/webm", &["lossy"]));
            }
            MediaKind::Document => {}
        }
        Ok(blobs)
    }
}

/// Deterministic test converter: derivative bytes are a hash expansion of
/// the original content, so identical inputs yield identical blob OIDs.
pub struct RandomConverter;

impl RandomConverter {
    fn derive(seed: &[u8], label: &str, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut counter = 0u32;
        while out.len() < len {
            let mut hasher = Sha1::new();
            hasher.update(seed);
            hasher.update(label.as_bytes());
            hasher.update(counter.to_be_bytes());
            out.extend_from_slice(&hasher.finalize());
            counter += 1;
        }
        out.truncate(len);
        out
    }
}

impl MediaConverter for RandomConverter {
    fn convert(&self, original: &Path, kind: MediaKind) -> Result<Vec<BlobPayload>> {
        let bytes = std::fs::read(original)?;
        let mime = mime_for_extension(&extension_of(original));
        let mut blobs = vec![BlobPayload::new(bytes.clone(), mime, &["original"])];
        let mut derived = |label: &str, tags: &[&str], mime: &str| {
            let mut payload = BlobPayload::new(Self::derive(&bytes, label, 64), mime, tags);
            payload
                .attributes
                .set("generator", Value::from("random"));
            payload
        };
        match kind {
            MediaKind::Image => {
                blobs.push(derived("preview", &["preview"], "image/webp"));
                blobs.push(derived("lossy", &["lossy"], "image/webp"));
            }
            MediaKind::Audio => {
                blobs.push(derived("lossy", &["lossy"], "audio/mpeg"));
            }
            MediaKind::Video => {
                blobs.push(derived("preview", &["preview"], "image/webp"));
                blobs.push(derived("lossy", &["lossy"], "video/webm"));
            }
            MediaKind::Document => {}
        }
        Ok(blobs)
    }
}
