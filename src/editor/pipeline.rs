//! Editor image pipeline.
//!
//! Keeps embedded images durable: local binary data (picked, dropped or
//! pasted) and inline base64 placeholders are uploaded to the file
//! service and swapped in place for their remote URL. After every
//! mutation the owning UI receives the serialized content and the
//! ordered flat image list through the `DocumentSink`.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use super::document::{Document, NodeId};
use super::upload::{UploadError, UploadResult};

/// Upload size ceiling: 5 MiB.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("'{mime}' is not an image file")]
    NotAnImage { mime: String },

    #[error("image is larger than the 5 MiB limit ({size} bytes)")]
    TooLarge { size: usize },

    #[error("invalid inline image data: {0}")]
    InvalidDataUrl(String),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// A local image file awaiting upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Decode an inline `data:` URL into a file. The MIME type comes from
    /// the URL header, defaulting to a generic binary type when absent.
    pub fn from_data_url(data_url: &str, name: &str) -> Result<Self, PipelineError> {
        let (header, payload) = data_url
            .split_once(',')
            .ok_or_else(|| PipelineError::InvalidDataUrl("missing payload".to_string()))?;

        let mime = header
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .filter(|mime| !mime.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string();

        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| PipelineError::InvalidDataUrl(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            mime,
            bytes,
        })
    }
}

/// External file-upload collaborator.
#[allow(async_fn_in_trait)]
pub trait ImageUploader {
    async fn upload(&self, file: &ImageFile) -> Result<UploadResult, UploadError>;
}

/// Receives the canonical content and image list after every mutation.
pub trait DocumentSink {
    fn content_changed(&self, html: &str, images: &[String]);
}

/// Sink for hosts that poll the pipeline instead of listening.
pub struct NullSink;

impl DocumentSink for NullSink {
    fn content_changed(&self, _html: &str, _images: &[String]) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The pipeline: document, uploader, sink, and upload bookkeeping.
///
/// All methods take `&self`; overlapping uploads are supported and the
/// in-flight counter drives the host's read-only state. Locks are never
/// held across an upload await, so the document stays editable while a
/// transfer runs.
pub struct ImagePipeline<U: ImageUploader, S: DocumentSink> {
    document: Mutex<Document>,
    uploader: U,
    sink: S,
    in_flight: AtomicU32,
    uploading: Mutex<HashSet<NodeId>>,
}

impl<U: ImageUploader, S: DocumentSink> ImagePipeline<U, S> {
    pub fn new(uploader: U, sink: S) -> Self {
        Self {
            document: Mutex::new(Document::new()),
            uploader,
            sink,
            in_flight: AtomicU32::new(0),
            uploading: Mutex::new(HashSet::new()),
        }
    }

    /// Load stored HTML content, replacing the current document.
    pub fn set_content(&self, html: &str) {
        *lock(&self.document) = Document::from_html(html);
        self.notify();
    }

    /// Run a closure against the live document, then report the change.
    /// This is the host's path for plain text edits.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let result = f(&mut lock(&self.document));
        self.notify();
        result
    }

    pub fn content_html(&self) -> String {
        lock(&self.document).to_html()
    }

    pub fn image_sources(&self) -> Vec<String> {
        lock(&self.document).image_sources()
    }

    /// Whether any upload is in flight; the host renders the editor
    /// read-only while this is true.
    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Insert an image at the cursor and report the change.
    pub fn insert_image(&self, url: &str) -> NodeId {
        let id = lock(&self.document).insert_image(url);
        self.notify();
        id
    }

    /// Replace an image node (falling back to insert when it is gone)
    /// and report the change.
    pub fn replace_image(&self, id: NodeId, url: &str) -> NodeId {
        let new_id = lock(&self.document).replace_image(id, url);
        self.notify();
        new_id
    }

    /// Merge a manually-edited URL list into the document (append-only)
    /// and report when anything was added.
    pub fn merge_manual_urls(&self, urls: &[String]) -> usize {
        let added = lock(&self.document).merge_manual_urls(urls);
        if added > 0 {
            self.notify();
        }
        added
    }

    /// Validate, upload, and splice the returned remote URL into the
    /// document, either replacing `replace_target` or inserting fresh.
    ///
    /// Validation rejects before the in-flight counter moves and without
    /// touching the document. On upload failure the document is likewise
    /// left unchanged and the error carries the user-facing message.
    pub async fn upload_and_insert(
        &self,
        file: ImageFile,
        replace_target: Option<NodeId>,
    ) -> Result<NodeId, PipelineError> {
        if !file.is_image() {
            return Err(PipelineError::NotAnImage {
                mime: file.mime.clone(),
            });
        }
        if file.bytes.len() > MAX_IMAGE_BYTES {
            return Err(PipelineError::TooLarge {
                size: file.bytes.len(),
            });
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.uploader.upload(&file).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(uploaded) => {
                log::info!("Image uploaded: {}", uploaded.url);
                let id = match replace_target {
                    Some(target) => self.replace_image(target, &uploaded.url),
                    None => self.insert_image(&uploaded.url),
                };
                Ok(id)
            }
            Err(e) => {
                log::error!("Image upload failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Convert every inline base64 image to a remote URL.
    ///
    /// Nodes are marked uploading before the first await, so re-running
    /// this on every text change never starts a second upload for a node
    /// whose transfer is still outstanding. Returns the number of uploads
    /// attempted by this call.
    pub async fn reconcile_base64(&self) -> usize {
        let mut pending: Vec<(NodeId, String)> = Vec::new();
        {
            let document = lock(&self.document);
            let mut uploading = lock(&self.uploading);
            for (id, src) in document.data_url_images() {
                // insert() returns false for nodes already marked.
                if uploading.insert(id) {
                    pending.push((id, src));
                }
            }
        }

        let mut attempted = 0;
        for (id, src) in pending {
            let file = match ImageFile::from_data_url(&src, "clipboard-image.png") {
                Ok(file) => file,
                Err(e) => {
                    log::warn!("Skipping undecodable inline image: {}", e);
                    lock(&self.uploading).remove(&id);
                    continue;
                }
            };

            attempted += 1;
            let result = self.upload_and_insert(file, Some(id)).await;
            lock(&self.uploading).remove(&id);
            if let Err(e) = result {
                // The node keeps its inline data; the next reconcile run
                // may retry it.
                log::warn!("Failed to upload pasted image: {}", e);
            }
        }
        attempted
    }

    fn notify(&self) {
        let (html, images) = {
            let document = lock(&self.document);
            (document.to_html(), document.image_sources())
        };
        self.sink.content_changed(&html, &images);
    }
}
