use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use futures_util::stream::BoxStream;

/// The minimal capability a value must expose to be encoded as a file
/// part: a reported name, a content type and a byte stream that can be
/// drained into a fresh buffer.
pub trait FormFile: Send + Sync {
    /// File name reported in the part's `Content-Disposition`.
    fn file_name(&self) -> &str;

    /// Content type reported in the part's `Content-Type` header.
    fn content_type(&self) -> &str;

    /// Length in bytes, when known up front. Used to size the copy
    /// buffer, never trusted over the stream itself.
    fn content_length(&self) -> Option<u64> {
        None
    }

    /// Open a fresh stream over the file's bytes.
    fn byte_stream(&self) -> BoxStream<'static, io::Result<Bytes>>;
}

impl<F: FormFile + ?Sized> FormFile for Box<F> {
    fn file_name(&self) -> &str {
        (**self).file_name()
    }

    fn content_type(&self) -> &str {
        (**self).content_type()
    }

    fn content_length(&self) -> Option<u64> {
        (**self).content_length()
    }

    fn byte_stream(&self) -> BoxStream<'static, io::Result<Bytes>> {
        (**self).byte_stream()
    }
}

/// An in-memory file: a named, typed byte buffer.
#[derive(Clone, Debug)]
pub struct MemoryFile {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

impl MemoryFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        MemoryFile {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl FormFile for MemoryFile {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn byte_stream(&self) -> BoxStream<'static, io::Result<Bytes>> {
        Box::pin(ByteStream::new(self.bytes.clone()))
    }
}

/// A one-shot in-memory byte stream.
#[derive(Clone)]
pub struct ByteStream {
    bytes: Option<Bytes>,
}

impl ByteStream {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        ByteStream {
            bytes: Some(bytes.into()),
        }
    }
}

impl Stream for ByteStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.as_mut().bytes.take().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn byte_stream_yields_everything_once() {
        let mut stream = ByteStream::new(&b"Lorem Ipsum\n"[..]);

        let chunk = stream.next().await.expect("one chunk").expect("no error");
        assert_eq!(&chunk[..], b"Lorem Ipsum\n");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn memory_file_reports_and_streams_its_bytes() {
        let file = MemoryFile::new("x.txt", "text/plain", "he");

        assert_eq!(file.file_name(), "x.txt");
        assert_eq!(file.content_type(), "text/plain");
        assert_eq!(file.content_length(), Some(2));

        let mut stream = file.byte_stream();
        let mut read = Vec::new();
        while let Some(chunk) = stream.next().await {
            read.extend_from_slice(&chunk.expect("no error"));
        }
        assert_eq!(read, b"he");
    }

    #[tokio::test]
    async fn boxed_files_delegate() {
        let file: Box<dyn FormFile> = Box::new(MemoryFile::new("x.txt", "text/plain", "he"));

        assert_eq!(file.file_name(), "x.txt");
        assert_eq!(file.content_length(), Some(2));

        let mut stream = file.byte_stream();
        let chunk = stream.next().await.expect("one chunk").expect("no error");
        assert_eq!(&chunk[..], b"he");
    }
}
