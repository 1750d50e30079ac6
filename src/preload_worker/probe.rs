use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;

use super::messages::SourceMetadata;
use crate::error::MediaError;

/// 只取元数据：远程音源发 HEAD，本地音源读文件元数据
pub async fn probe_metadata(http: &reqwest::Client, uri: &str) -> Result<SourceMetadata, MediaError> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        probe_remote(http, uri).await
    } else {
        probe_local(uri).await
    }
}

async fn probe_remote(http: &reqwest::Client, uri: &str) -> Result<SourceMetadata, MediaError> {
    let resp = http.head(uri).send().await.map_err(|source| MediaError::Http {
        uri: uri.to_owned(),
        source,
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(MediaError::Status {
            uri: uri.to_owned(),
            status,
        });
    }

    let headers = resp.headers();
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| guess_content_type(uri).map(str::to_owned));

    Ok(SourceMetadata {
        content_length,
        content_type,
    })
}

async fn probe_local(uri: &str) -> Result<SourceMetadata, MediaError> {
    let md = tokio::fs::metadata(uri)
        .await
        .map_err(|source| MediaError::OpenFile {
            uri: uri.to_owned(),
            source,
        })?;
    Ok(SourceMetadata {
        content_length: Some(md.len()),
        content_type: guess_content_type(uri).map(str::to_owned),
    })
}

fn guess_content_type(uri: &str) -> Option<&'static str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "m4a" | "aac" | "mp4" => Some("audio/mp4"),
        "flac" => Some("audio/flac"),
        "wav" => Some("audio/wav"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_content_type_from_extension() {
        assert_eq!(guess_content_type("/audio/a.mp3"), Some("audio/mpeg"));
        assert_eq!(guess_content_type("https://x/a.OGG?sig=1"), Some("audio/ogg"));
        assert_eq!(guess_content_type("/audio/noext"), None);
    }

    #[tokio::test]
    async fn remote_probe_uses_head_only() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/b.mp3")
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .expect(1)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/b.mp3")
            .with_status(200)
            .with_body("full body")
            .expect(0)
            .create_async()
            .await;

        let md = probe_metadata(&reqwest::Client::new(), &format!("{}/b.mp3", server.url()))
            .await
            .expect("probe");

        head.assert_async().await;
        get.assert_async().await;
        assert_eq!(md.content_type.as_deref(), Some("audio/mpeg"));
    }

    #[tokio::test]
    async fn remote_probe_reports_http_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("HEAD", "/gone.mp3")
            .with_status(410)
            .create_async()
            .await;

        let err = probe_metadata(&reqwest::Client::new(), &format!("{}/gone.mp3", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Status { .. }));
    }

    #[tokio::test]
    async fn local_probe_reads_file_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = dir.path().join("c.flac");
        std::fs::write(&p, vec![0u8; 1234]).expect("write");

        let md = probe_metadata(&reqwest::Client::new(), p.to_str().expect("utf8 path"))
            .await
            .expect("probe");
        assert_eq!(md.content_length, Some(1234));
        assert_eq!(md.content_type.as_deref(), Some("audio/flac"));
    }
}
