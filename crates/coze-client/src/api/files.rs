//! Files API.

use std::path::Path;

use bytes::Bytes;

use crate::client::CozeClient;
use crate::envelope::{PayloadAt, Response};
use crate::error::{Error, Result};
use crate::transport::{Method, RequestBody};
use crate::types::{File, require};

/// Files API client.
pub struct FilesApi {
    client: CozeClient,
}

impl FilesApi {
    pub(crate) fn new(client: CozeClient) -> Self {
        Self { client }
    }

    /// Upload a local file. The file keeps its own name.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<Response<File>> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::InvalidParam(format!("{} is not a file", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        self.upload_bytes(file_name, bytes).await
    }

    /// Upload in-memory content under `file_name`.
    pub async fn upload_bytes(
        &self,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Result<Response<File>> {
        let file_name = file_name.into();
        require("file_name", &file_name)?;
        let token = self.client.token()?;
        let url = self.client.url("/v1/files/upload", &[])?;
        let body = RequestBody::Multipart {
            file_name,
            bytes: bytes.into(),
        };
        self.client
            .send(Method::Post, url, token, body, PayloadAt::Data)
            .await
    }

    /// Get an uploaded file's details.
    pub async fn retrieve(&self, file_id: &str) -> Result<Response<File>> {
        require("file_id", file_id)?;
        self.client
            .get("/v1/files/retrieve", &[("file_id", file_id)], PayloadAt::Data)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubTransport, client, query};

    const FILE_JSON: &str =
        r#"{"code":0,"data":{"id":"f1","file_name":"notes.txt","bytes":5,"created_at":1718000000}}"#;

    #[tokio::test]
    async fn test_upload_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let stub = StubTransport::new();
        stub.push_json(200, FILE_JSON);

        let file = client(&stub).files().upload(&path).await.unwrap();
        assert_eq!(file.id, "f1");
        assert_eq!(file.bytes, 5);

        let request = stub.last_request().unwrap();
        assert_eq!(request.url.path(), "/v1/files/upload");
        match request.body {
            RequestBody::Multipart { file_name, bytes } => {
                assert_eq!(file_name, "notes.txt");
                assert_eq!(&bytes[..], b"hello");
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubTransport::new();

        let err = client(&stub)
            .files()
            .upload(dir.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_retrieve() {
        let stub = StubTransport::new();
        stub.push_json(200, FILE_JSON);

        let file = client(&stub).files().retrieve("f1").await.unwrap();
        assert_eq!(file.file_name, "notes.txt");
        assert_eq!(
            query(&stub.last_request().unwrap(), "file_id").as_deref(),
            Some("f1")
        );
    }
}
