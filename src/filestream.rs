use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::stream::BoxStream;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead};

use crate::file::FormFile;

type OpenFuture = Pin<Box<dyn Future<Output = io::Result<File>> + Send>>;

/// Streams the contents of a file on disk, opening it lazily on first
/// poll. Requires tokio.
pub struct FileStream {
    state: FileState,
}

enum FileState {
    Opening(OpenFuture),
    Reading(FramedRead<File, BytesCodec>),
    Done,
}

impl FileStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        FileStream {
            state: FileState::Opening(Box::pin(File::open(path))),
        }
    }
}

impl Stream for FileStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                FileState::Opening(open) => match open.as_mut().poll(cx) {
                    Poll::Ready(Ok(file)) => {
                        this.state = FileState::Reading(FramedRead::new(file, BytesCodec::new()));
                    }
                    Poll::Ready(Err(err)) => {
                        this.state = FileState::Done;
                        return Poll::Ready(Some(Err(err)));
                    }
                    Poll::Pending => return Poll::Pending,
                },
                FileState::Reading(framed) => {
                    return Pin::new(framed)
                        .poll_next(cx)
                        .map(|chunk| chunk.map(|chunk| chunk.map(BytesMut::freeze)));
                }
                FileState::Done => return Poll::Ready(None),
            }
        }
    }
}

/// A file on disk exposed through the [`FormFile`] capability.
///
/// The length is captured from metadata at open time and the content type
/// guessed from the extension (`.jpg` becomes `image/jpeg`).
#[derive(Clone, Debug)]
pub struct DiskFile {
    path: PathBuf,
    file_name: String,
    content_type: String,
    len: u64,
}

impl DiskFile {
    pub async fn open(path: impl Into<PathBuf>) -> io::Result<DiskFile> {
        let path = path.into();

        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "path has no file name",
                ))
            }
        };

        let metadata = tokio::fs::metadata(&path).await?;
        let content_type = mime_guess::MimeGuess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(DiskFile {
            path,
            file_name,
            content_type,
            len: metadata.len(),
        })
    }
}

impl FormFile for DiskFile {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn content_length(&self) -> Option<u64> {
        Some(self.len)
    }

    fn byte_stream(&self) -> BoxStream<'static, io::Result<Bytes>> {
        Box::pin(FileStream::new(self.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn streams_a_file_from_disk() {
        let mut stream = FileStream::new("Cargo.toml");

        let mut read = Vec::new();
        while let Some(chunk) = stream.next().await {
            read.extend_from_slice(&chunk.expect("read chunk"));
        }

        let expected = std::fs::read("Cargo.toml").expect("read Cargo.toml");
        assert_eq!(read, expected);
    }

    #[tokio::test]
    async fn missing_file_surfaces_the_error_once() {
        let mut stream = FileStream::new("does-not-exist.toml");

        let first = stream.next().await.expect("one item");
        assert!(first.is_err());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn disk_file_reports_metadata() {
        let file = DiskFile::open("Cargo.toml").await.expect("open Cargo.toml");

        assert_eq!(file.file_name(), "Cargo.toml");
        let expected = std::fs::metadata("Cargo.toml").expect("metadata").len();
        assert_eq!(file.content_length(), Some(expected));
    }

    #[tokio::test]
    async fn rejects_a_path_without_a_file_name() {
        let err = DiskFile::open("/").await.expect_err("no file name");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
