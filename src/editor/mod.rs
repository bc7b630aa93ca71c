//! Rich-text editor core: document model, image pipeline, upload service
//! and the event-to-command adapter the UI layer drives it through.

pub mod document;
pub mod events;
pub mod html;
pub mod pipeline;
pub mod upload;


pub use document::{Document, NodeId};
pub use events::{dispatch, EditorEvent, Handled};
pub use pipeline::{
    DocumentSink, ImageFile, ImagePipeline, ImageUploader, NullSink, PipelineError,
};
pub use upload::{FileUploadService, UploadError, UploadResult};
