use crate::error::{JenkenvError, Result};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!(
                    env!("CARGO_PKG_NAME"),
                    "/",
                    env!("CARGO_PKG_VERSION")
                ))
                .build()
                .unwrap(),
        }
    }

    /// Download a file with progress indication
    pub async fn download_with_progress<P: AsRef<Path>>(&self, url: &str, dest: P) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| JenkenvError::DownloadFailed {
                url: url.to_string(),
                source: e,
            })?;

        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(format!(
            "Downloading {}",
            url.split('/').last().unwrap_or("file")
        ));

        let mut file = File::create(dest.as_ref()).await?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| JenkenvError::DownloadFailed {
                url: url.to_string(),
                source: e,
            })?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        file.flush().await?;

        pb.finish_with_message("Download complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_download_writes_bytes_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/war/2.303/jenkins.war")
            .with_status(200)
            .with_body(b"not really a war")
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jenkins.war");

        let downloader = Downloader::new();
        downloader
            .download_with_progress(&format!("{}/war/2.303/jenkins.war", server.url()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"not really a war");
    }

    #[tokio::test]
    async fn test_download_http_error_surfaces() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/war/9.999/jenkins.war")
            .with_status(404)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("jenkins.war");

        let downloader = Downloader::new();
        let result = downloader
            .download_with_progress(&format!("{}/war/9.999/jenkins.war", server.url()), &dest)
            .await;

        assert!(matches!(result, Err(JenkenvError::DownloadFailed { .. })));
    }
}
