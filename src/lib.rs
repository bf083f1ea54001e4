//! Build `multipart/form-data` bodies from plain request structs.
//!
//! A request type describes its properties once ([`FormRequest`]); the
//! factory turns any value of that type into an ordered multipart body,
//! buffering file contents (concurrently for file collections), omitting
//! absent values and rendering everything else as text. Descriptors are
//! cached per type, so repeated encodings of the same shape skip the
//! description step.
//!
//! ```
//! use multipart_factory::{
//!     CancellationToken, FormRequest, FormValue, MemoryFile, MultipartFactory,
//!     PropertyDescriptor,
//! };
//!
//! struct CreateNote {
//!     title: String,
//!     tags: Vec<String>,
//!     attachment: Option<MemoryFile>,
//! }
//!
//! impl FormRequest for CreateNote {
//!     fn properties() -> Vec<PropertyDescriptor<Self>> {
//!         vec![
//!             PropertyDescriptor::scalar("Title", |r| {
//!                 FormValue::from_scalar(Some(r.title.as_str()))
//!             }),
//!             PropertyDescriptor::collection("Tags", |r| {
//!                 FormValue::from_scalars(Some(r.tags.iter().map(String::as_str)))
//!             }),
//!             PropertyDescriptor::file("Attachment", |r| {
//!                 FormValue::from_file(r.attachment.as_ref())
//!             }),
//!         ]
//!     }
//! }
//!
//! # async fn encode() -> Result<(), multipart_factory::EncodeError> {
//! let factory = MultipartFactory::new();
//!
//! let request = CreateNote {
//!     title: "minutes".into(),
//!     tags: vec!["meeting".into(), "draft".into()],
//!     attachment: Some(MemoryFile::new("minutes.txt", "text/plain", "10:00 kickoff")),
//! };
//!
//! let body = factory.create(&request, &CancellationToken::new()).await?;
//!
//! assert_eq!(body.parts().len(), 4);
//! assert_eq!(body.parts()[0].content(), b"minutes");
//!
//! // Feed the body to any Stream-based HTTP client, or frame it in one go:
//! let bytes = body.to_bytes();
//! # let _ = bytes;
//! # Ok(())
//! # }
//! ```
//!
//! The `filestream` feature (on by default) adds [`DiskFile`], a
//! [`FormFile`] implementation backed by tokio's filesystem.

pub mod body;
pub mod cache;
pub mod factory;
pub mod file;
#[cfg(feature = "filestream")]
pub mod filestream;
pub mod schema;

pub use body::{FieldPart, MultipartBody};
pub use cache::DescriptorCache;
pub use factory::{EncodeError, MultipartFactory};
pub use file::{ByteStream, FormFile, MemoryFile};
#[cfg(feature = "filestream")]
pub use filestream::{DiskFile, FileStream};
pub use schema::{Classification, FormRequest, FormValue, PropertyDescriptor, ScalarValue};

pub use tokio_util::sync::CancellationToken;
