use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use futures_util::future::try_join_all;
use futures_util::StreamExt;
use log::debug;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::body::{FieldPart, MultipartBody};
use crate::cache::DescriptorCache;
use crate::file::FormFile;
use crate::schema::{Classification, FormRequest, FormValue};

/// Why an encoding call failed.
///
/// Cancellation is its own outcome, distinct from value and I/O
/// failures. No partial body is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A collection element kind has no text or file mapping.
    #[error("field `{field}` holds an unsupported value kind: {value}")]
    UnsupportedValue {
        field: &'static str,
        value: String,
    },

    /// Reading a file's byte stream failed.
    #[error("reading the file for field `{field}` failed")]
    FileRead {
        field: &'static str,
        #[source]
        source: io::Error,
    },

    /// The caller's cancellation signal fired during a file copy.
    #[error("encoding was cancelled while copying field `{field}`")]
    Cancelled { field: &'static str },
}

/// Builds multipart bodies from request values.
///
/// With caching enabled (the default) each request type is described once
/// and the descriptors shared for the life of the factory; without it the
/// type is re-described on every call.
pub struct MultipartFactory {
    cache: Option<DescriptorCache>,
}

impl MultipartFactory {
    /// A factory with descriptor caching enabled.
    pub fn new() -> Self {
        MultipartFactory {
            cache: Some(DescriptorCache::new()),
        }
    }

    /// A factory that re-describes the request type on every call, for
    /// fully deterministic single-shot encoding.
    pub fn without_cache() -> Self {
        MultipartFactory { cache: None }
    }

    /// Encode `request` into a multipart body.
    ///
    /// Properties are visited in declaration order. Absent values are
    /// omitted, files are copied into fresh buffers (concurrently for a
    /// collection of files, which completes only once every copy has),
    /// and scalars are rendered as text. The returned body holds no
    /// references into `request`.
    ///
    /// Fails on the first unsupported collection element, failed file
    /// read or observed cancellation; no body is returned in that case.
    pub async fn create<T: FormRequest>(
        &self,
        request: &T,
        token: &CancellationToken,
    ) -> Result<MultipartBody, EncodeError> {
        let descriptors = match &self.cache {
            Some(cache) => cache.descriptors_for::<T>(),
            None => Arc::new(T::properties()),
        };

        let mut parts = Vec::with_capacity(descriptors.len());

        for property in descriptors.iter() {
            match (property.classification(), property.read(request)) {
                (_, FormValue::Absent) => {}
                (Classification::File, FormValue::File(file)) => {
                    parts.push(copy_file_part(file, property.name(), token).await?);
                }
                (Classification::Collection, FormValue::Files(files)) => {
                    let name = property.name();
                    let copied =
                        try_join_all(files.into_iter().map(|file| copy_file_part(file, name, token)))
                            .await?;
                    parts.extend(copied);
                }
                (Classification::Collection, FormValue::Scalars(values)) => {
                    parts.extend(
                        values
                            .into_iter()
                            .map(|value| FieldPart::text(property.name(), value.to_string())),
                    );
                }
                (Classification::Collection, FormValue::Unsupported(value)) => {
                    return Err(EncodeError::UnsupportedValue {
                        field: property.name(),
                        value,
                    });
                }
                (Classification::Scalar, FormValue::Scalar(value)) => {
                    parts.push(FieldPart::text(property.name(), value.to_string()));
                }
                // A runtime value that contradicts its declared
                // classification is skipped rather than failing the call.
                _ => {}
            }
        }

        debug!(
            "encoded {} parts for {}",
            parts.len(),
            std::any::type_name::<T>()
        );

        Ok(MultipartBody::from_parts(parts))
    }
}

impl Default for MultipartFactory {
    fn default() -> Self {
        Self::new()
    }
}

async fn copy_file_part(
    file: &dyn FormFile,
    field: &'static str,
    token: &CancellationToken,
) -> Result<FieldPart, EncodeError> {
    if token.is_cancelled() {
        return Err(EncodeError::Cancelled { field });
    }

    let mut buf = BytesMut::with_capacity(file.content_length().unwrap_or(0) as usize);
    let mut stream = file.byte_stream();

    loop {
        let Some(chunk) = token.run_until_cancelled(stream.next()).await else {
            return Err(EncodeError::Cancelled { field });
        };

        match chunk {
            Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
            Some(Err(source)) => return Err(EncodeError::FileRead { field, source }),
            None => break,
        }
    }

    debug!(
        "copied {} bytes for field `{}` from `{}`",
        buf.len(),
        field,
        file.file_name()
    );

    Ok(FieldPart::file(
        field,
        file.file_name(),
        file.content_type(),
        buf.freeze(),
    ))
}
