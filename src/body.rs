use std::borrow::Cow;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

// Double quotes and control bytes would corrupt the part header if they
// appeared raw inside a quoted attribute.
const ATTR_CHARS: &AsciiSet = &CONTROLS.add(b'"');

fn escape_attr(value: &str) -> Cow<'_, str> {
    Cow::from(utf8_percent_encode(value, ATTR_CHARS))
}

/// One named part of a multipart body, with its content already buffered.
///
/// A part carries a file name only when it was built with
/// [`FieldPart::file`], which also tags it with a content type; text
/// parts carry neither.
#[derive(Clone, Debug)]
pub struct FieldPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    content: Bytes,
}

impl FieldPart {
    /// A text part: the form without a file name.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FieldPart {
            name: name.into(),
            file_name: None,
            content_type: None,
            content: Bytes::from(value.into()),
        }
    }

    /// A file part: the form with a file name and a content type.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        FieldPart {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            content: content.into(),
        }
    }

    /// Field name shared by every part the owning property produced.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Declared length of the buffered content in bytes.
    pub fn content_length(&self) -> usize {
        self.content.len()
    }

    fn framed_bytes(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();

        buf.extend_from_slice(b"--");
        buf.extend_from_slice(boundary.as_bytes());
        buf.extend_from_slice(b"\r\n");

        buf.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        buf.extend_from_slice(escape_attr(&self.name).as_bytes());
        buf.extend_from_slice(b"\"");

        if let Some(file_name) = &self.file_name {
            buf.extend_from_slice(b"; filename=\"");
            buf.extend_from_slice(escape_attr(file_name).as_bytes());
            buf.extend_from_slice(b"\"");
        }

        buf.extend_from_slice(b"\r\n");

        if let Some(content_type) = &self.content_type {
            buf.extend_from_slice(b"Content-Type: ");
            buf.extend_from_slice(content_type.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");

        buf.extend_from_slice(&self.content);

        buf.extend_from_slice(b"\r\n");

        buf.freeze()
    }
}

/// An ordered `multipart/form-data` body, ready for transport.
///
/// Parts appear in insertion order and every part is self-contained, so
/// the body can be framed repeatedly with [`MultipartBody::to_bytes`] or
/// streamed out once chunk by chunk via its `Stream` impl.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<FieldPart>,
    cursor: usize,
    wrote_ending: bool,
    written: usize,
}

impl MultipartBody {
    /// An empty body with a random boundary.
    pub fn new() -> Self {
        Self::from_parts(Vec::new())
    }

    /// An empty body with the given boundary, for deterministic output.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        MultipartBody {
            boundary: boundary.into(),
            parts: Vec::new(),
            cursor: 0,
            wrote_ending: false,
            written: 0,
        }
    }

    /// Wrap already-built parts, keeping their order, under a random
    /// boundary.
    pub fn from_parts(parts: Vec<FieldPart>) -> Self {
        let boundary: String = thread_rng()
            .sample_iter(Alphanumeric)
            .take(60)
            .map(char::from)
            .collect();

        MultipartBody {
            boundary,
            parts,
            cursor: 0,
            wrote_ending: false,
            written: 0,
        }
    }

    /// Append a part, keeping insertion order.
    pub fn push(&mut self, part: FieldPart) {
        self.parts.push(part);
    }

    /// Append a text part (the form without a file name).
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.push(FieldPart::text(name, value));
    }

    /// Append a file part (the form with a file name).
    pub fn push_file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) {
        self.push(FieldPart::file(name, file_name, content_type, content));
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn parts(&self) -> &[FieldPart] {
        &self.parts
    }

    /// Serialized length of the framed body in bytes.
    pub fn content_length(&self) -> u64 {
        let parts: usize = self
            .parts
            .iter()
            .map(|part| part.framed_bytes(&self.boundary).len())
            .sum();

        (parts + self.boundary.len() + 6) as u64
    }

    fn write_ending(&self) -> Bytes {
        let mut buf = BytesMut::new();

        buf.extend_from_slice(b"--");
        buf.extend_from_slice(self.boundary.as_bytes());

        buf.extend_from_slice(b"--\r\n");

        buf.freeze()
    }

    /// Frame the whole body into one buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.extend_from_slice(&part.framed_bytes(&self.boundary));
        }

        buf.extend_from_slice(&self.write_ending());

        buf.freeze()
    }
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl Stream for MultipartBody {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.cursor < this.parts.len() {
            let part = &this.parts[this.cursor];
            debug!("Writing part: {}", part.name());

            let bytes = part.framed_bytes(&this.boundary);
            this.cursor += 1;
            this.written += bytes.len();

            return Poll::Ready(Some(Ok(bytes)));
        }

        if !this.wrote_ending {
            this.wrote_ending = true;

            let bytes = this.write_ending();
            this.written += bytes.len();

            return Poll::Ready(Some(Ok(bytes)));
        }

        debug!(
            "No bytes to write, finished stream, total bytes:{}",
            this.written
        );

        Poll::Ready(None)
    }
}
