use crate::error::{JenkenvError, Result};
use regex::Regex;
use reqwest::Client;

// Release links on the index look like `war/2.303/jenkins.war`; anything with
// more than two version components is a different artifact line.
const WAR_LINK_PATTERN: &str = r"war/(\d+\.\d+)/jenkins\.war";

/// Scrapes the Jenkins download index for available war releases.
pub struct CatalogLister {
    client: Client,
    index_url: String,
}

impl CatalogLister {
    pub fn new(index_url: &str) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!(
                    env!("CARGO_PKG_NAME"),
                    "/",
                    env!("CARGO_PKG_VERSION")
                ))
                .build()
                .unwrap(),
            index_url: index_url.to_string(),
        }
    }

    /// Fetch the index page and list the versions it links to, in page order
    pub async fn list_available(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.index_url)
            .send()
            .await
            .map_err(|e| JenkenvError::DownloadFailed {
                url: self.index_url.clone(),
                source: e,
            })?;

        let page = response.text().await?;
        Ok(Self::scrape(&page))
    }

    fn scrape(page: &str) -> Vec<String> {
        let pattern = Regex::new(WAR_LINK_PATTERN).unwrap();

        pattern
            .captures_iter(page)
            .map(|capture| capture[1].to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_matches_two_component_versions_only() {
        let page = r#"
            <a href="https://updates.jenkins-ci.org/download/war/2.303/jenkins.war">2.303</a>
            <a href="https://updates.jenkins-ci.org/download/war/2.304.1/jenkins.war">2.304.1</a>
        "#;

        assert_eq!(CatalogLister::scrape(page), vec!["2.303"]);
    }

    #[test]
    fn test_scrape_emits_one_version_per_link_in_page_order() {
        let page = r#"
            <a href="war/2.303/jenkins.war">war</a>
            <a href="war/2.289/jenkins.war">war</a>
            <a href="war/2.303/jenkins.war">war (mirror)</a>
        "#;

        assert_eq!(
            CatalogLister::scrape(page),
            vec!["2.303", "2.289", "2.303"]
        );
    }

    #[tokio::test]
    async fn test_list_available_refetches_per_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/download/war")
            .with_status(200)
            .with_body(r#"<a href="war/2.303/jenkins.war">jenkins.war</a>"#)
            .expect(2)
            .create_async()
            .await;

        let lister = CatalogLister::new(&format!("{}/download/war", server.url()));

        assert_eq!(lister.list_available().await.unwrap(), vec!["2.303"]);
        assert_eq!(lister.list_available().await.unwrap(), vec!["2.303"]);

        mock.assert_async().await;
    }
}
