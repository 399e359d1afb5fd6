//! Immutable pool of servable images.
//!
//! [`ImagePool`] is built once at startup, either by walking the bundled
//! image directory or from in-memory buffers, and is never mutated after
//! that. It is shared between handlers as `Arc<ImagePool>` without any
//! locking.
//!
//! Image bytes are always handed out as a chunked [`ImageStream`] so that a
//! request never holds a whole file in memory.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::GatewayError;

/// Size of each chunk copied from an image source to the response.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Stream of image byte chunks.
pub type ImageStream = BoxStream<'static, io::Result<Bytes>>;

/// An image opened for streaming.
pub struct OpenedImage {
    /// Total size of the image in bytes.
    pub len: u64,
    /// Chunked image content.
    pub stream: ImageStream,
}

impl std::fmt::Debug for OpenedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedImage")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum ImageSource {
    Directory(PathBuf),
    Memory(HashMap<String, Bytes>),
}

/// Fixed, read-only set of named images.
///
/// # Invariants
///
/// - Never empty: both constructors reject an empty set.
/// - Membership is fixed for the lifetime of the value.
/// - Only names present in the index can be opened, so a request can
///   never reach a file outside the image directory.
#[derive(Debug)]
pub struct ImagePool {
    names: Vec<String>,
    index: HashSet<String>,
    source: ImageSource,
}

impl ImagePool {
    /// Loads every file below `root`.
    ///
    /// Names are the `/`-separated paths relative to `root`, sorted.
    /// Hidden files and directories (leading `.`) are skipped, as are
    /// entries whose names are not valid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if `root` cannot be read or
    /// contains no images.
    pub async fn load_dir(root: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let root = root.as_ref().to_path_buf();
        let mut names = Vec::new();
        let mut pending = vec![(root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
                GatewayError::Configuration(format!(
                    "cannot read image directory {}: {e}",
                    dir.display()
                ))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                GatewayError::Configuration(format!(
                    "cannot list image directory {}: {e}",
                    dir.display()
                ))
            })? {
                let Ok(file_name) = entry.file_name().into_string() else {
                    tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 image name");
                    continue;
                };
                if file_name.starts_with('.') {
                    continue;
                }

                let path = entry.path();
                let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                    GatewayError::Configuration(format!("cannot stat {}: {e}", path.display()))
                })?;
                let name = format!("{prefix}{file_name}");
                if metadata.is_dir() {
                    pending.push((path, format!("{name}/")));
                } else if metadata.is_file() {
                    names.push(name);
                }
            }
        }

        let pool = Self::build(names, ImageSource::Directory(root))?;
        tracing::info!(count = pool.len(), "image pool loaded");
        Ok(pool)
    }

    /// Builds a pool from in-memory images.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if `images` is empty.
    pub fn from_memory<N, B>(images: impl IntoIterator<Item = (N, B)>) -> Result<Self, GatewayError>
    where
        N: Into<String>,
        B: Into<Bytes>,
    {
        let images: HashMap<String, Bytes> = images
            .into_iter()
            .map(|(name, bytes)| (name.into(), bytes.into()))
            .collect();
        let names = images.keys().cloned().collect();
        Self::build(names, ImageSource::Memory(images))
    }

    fn build(mut names: Vec<String>, source: ImageSource) -> Result<Self, GatewayError> {
        if names.is_empty() {
            return Err(GatewayError::Configuration(
                "image pool is empty".to_string(),
            ));
        }
        names.sort();
        names.dedup();
        let index = names.iter().cloned().collect();
        Ok(Self {
            names,
            index,
            source,
        })
    }

    /// Returns all image names in sorted order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns `true` if `name` is part of the pool.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Returns the number of images in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the pool holds no images. A constructed pool never does.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Opens an image for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ImageNotFound`] if `name` is not in the pool
    /// and [`GatewayError::Io`] if the backing file cannot be opened.
    pub async fn open(&self, name: &str) -> Result<OpenedImage, GatewayError> {
        if !self.contains(name) {
            return Err(GatewayError::ImageNotFound(name.to_string()));
        }

        match &self.source {
            ImageSource::Directory(root) => {
                let file = File::open(root.join(name)).await?;
                let len = file.metadata().await?.len();
                Ok(OpenedImage {
                    len,
                    stream: file_chunks(file, len),
                })
            }
            ImageSource::Memory(images) => {
                let bytes = images
                    .get(name)
                    .cloned()
                    .ok_or_else(|| GatewayError::ImageNotFound(name.to_string()))?;
                Ok(OpenedImage {
                    len: bytes.len() as u64,
                    stream: memory_chunks(bytes),
                })
            }
        }
    }
}

/// Reads exactly `len` bytes of `file` in [`CHUNK_SIZE`] pieces.
///
/// `len` is the size announced in `Content-Length`. A file that ends
/// early yields [`io::ErrorKind::UnexpectedEof`] so the body is aborted
/// instead of completing short; bytes past `len` are never sent.
fn file_chunks(file: File, len: u64) -> ImageStream {
    stream::try_unfold((file, len), |(mut file, remaining)| async move {
        if remaining == 0 {
            return Ok(None);
        }

        let limit = remaining.min(CHUNK_SIZE as u64);
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        let read = (&mut file).take(limit).read_buf(&mut buf).await?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("image ended {remaining} bytes short"),
            ));
        }

        Ok(Some((buf.freeze(), (file, remaining - read as u64))))
    })
    .boxed()
}

/// Splits `bytes` into [`CHUNK_SIZE`] slices without copying.
fn memory_chunks(bytes: Bytes) -> ImageStream {
    let total = bytes.len();
    let chunks: Vec<io::Result<Bytes>> = (0..total)
        .step_by(CHUNK_SIZE)
        .map(|start| Ok(bytes.slice(start..total.min(start + CHUNK_SIZE))))
        .collect();
    stream::iter(chunks).boxed()
}
