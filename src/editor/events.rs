//! Event-to-command adapter.
//!
//! The host translates its native UI events into `EditorEvent`s; this
//! module maps them onto pipeline commands, keeping UI-event vocabulary
//! out of the pipeline itself. The returned `Handled` tells the host
//! whether to suppress its default insertion behavior.

use super::pipeline::{DocumentSink, ImageFile, ImagePipeline, ImageUploader};

/// A UI event relevant to the image pipeline.
#[derive(Debug)]
pub enum EditorEvent {
    /// Clipboard paste; `files` is whatever file objects the clipboard
    /// exposed (possibly none, even when an image was pasted as inline
    /// base64 HTML).
    Paste { files: Vec<ImageFile> },
    /// Drag-and-drop of files onto the editor.
    Drop { files: Vec<ImageFile> },
    /// The document content changed by any means, including typing.
    TextChanged,
}

/// What the host should do with its native default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The event was consumed; suppress default insertion.
    Suppressed,
    /// Let the native behavior proceed.
    Default,
}

/// Route one event through the pipeline.
///
/// Paste/drop events carrying image files bypass the base64 path: the
/// files upload directly and the native insertion is suppressed. A paste
/// with no image files lets the native insertion land first (by the time
/// this runs, it has) and then reconciles any inline base64 it produced.
pub async fn dispatch<U: ImageUploader, S: DocumentSink>(
    pipeline: &ImagePipeline<U, S>,
    event: EditorEvent,
) -> Handled {
    match event {
        EditorEvent::Paste { files } => {
            let images: Vec<ImageFile> = files.into_iter().filter(ImageFile::is_image).collect();
            if images.is_empty() {
                pipeline.reconcile_base64().await;
                return Handled::Default;
            }
            log::info!("Paste carried {} image file(s)", images.len());
            for file in images {
                if let Err(e) = pipeline.upload_and_insert(file, None).await {
                    log::warn!("Pasted image rejected: {}", e);
                }
            }
            Handled::Suppressed
        }
        EditorEvent::Drop { files } => {
            let images: Vec<ImageFile> = files.into_iter().filter(ImageFile::is_image).collect();
            if images.is_empty() {
                return Handled::Default;
            }
            log::info!("Drop carried {} image file(s)", images.len());
            for file in images {
                if let Err(e) = pipeline.upload_and_insert(file, None).await {
                    log::warn!("Dropped image rejected: {}", e);
                }
            }
            Handled::Suppressed
        }
        EditorEvent::TextChanged => {
            pipeline.reconcile_base64().await;
            Handled::Default
        }
    }
}
