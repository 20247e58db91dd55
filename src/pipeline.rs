//! End-to-end run: fetch → locate → convert → write.

use crate::api::{HttpImageLookup, ThrottledLookup};
use crate::config::Settings;
use crate::models::ResultSet;
use crate::outputs::json;
use crate::scrapers::wiki::{fetch_document, locate_tables};
use crate::tables::{ConvertOptions, convert_tables};
use crate::throttle::FixedInterval;
use std::error::Error;
use tracing::{error, info, instrument};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the page fetch and the image lookups.
pub fn build_client(settings: &Settings) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = settings.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Fetch the source page and convert its tables. Nothing is written.
///
/// A failed page fetch is returned as an error; table-level failures are
/// counted in the result.
#[instrument(level = "info", skip_all, fields(url = %settings.source_url))]
pub async fn scrape(settings: &Settings) -> Result<ResultSet, Box<dyn Error>> {
    let client = build_client(settings)?;

    let document = match fetch_document(&client, settings.source_url.as_str()).await {
        Ok(doc) => doc,
        Err(e) => {
            error!(error = %e, "Could not fetch source page");
            return Err(e.into());
        }
    };
    let fragments = locate_tables(&document, &settings.table_class);
    drop(document);

    let limiter = FixedInterval::new(settings.throttle);
    info!(
        tables = fragments.len(),
        throttle = ?limiter.interval(),
        endpoint = %settings.image_endpoint,
        "Converting tables"
    );
    let lookup = ThrottledLookup::new(
        HttpImageLookup::new(client, settings.image_endpoint.clone()),
        limiter,
    );
    let results = convert_tables(&fragments, &ConvertOptions::from(settings), &lookup).await;
    Ok(results)
}

/// [`scrape`], then write the result to `settings.output`.
pub async fn run(settings: &Settings) -> Result<ResultSet, Box<dyn Error>> {
    let results = scrape(settings).await?;
    json::write_result_set(&results, &settings.output).await?;
    info!(path = %settings.output.display(), "Result written");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FileConfig;
    use clap::Parser;
    use serde_json::{Value, json};
    use std::path::Path;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
        <table class="wikitable plainrowheaders">
          <tr><th>Artist</th><th>Album</th><th>Genre</th></tr>
          <tr><td colspan="3">January</td></tr>
          <tr><td><a href="/wiki/Artist_A">Artist A</a></td><td><a href="/wiki/Album_A">Album A</a></td><td>Rock</td></tr>
          <tr><td><a href="/wiki/Artist_B">Artist B</a></td><td>Album B</td><td></td></tr>
          <tr><td>Artist C</td><td><a href="/wiki/Album_C">Album C</a></td><td>Pop</td></tr>
        </table>
        <table class="navbox"><tr><td><a href="/wiki/Ignored">nav</a></td></tr></table>
        <table class="wikitable">
          <tr><th>Artist</th><th>Album</th></tr>
          <tr><td colspan="2">February</td></tr>
          <tr><td>Artist D</td><td><a href="/wiki/Broken">Broken</a></td></tr>
        </table>
    </body></html>"#;

    fn settings(server: &MockServer, output: &Path) -> Settings {
        let cli = Cli::parse_from([
            "wiki_tables".to_string(),
            "--url".to_string(),
            format!("{}/wiki/List_of_albums", server.uri()),
            "--image-endpoint".to_string(),
            format!("{}/api/image-scraper", server.uri()),
            "--throttle-ms".to_string(),
            "0".to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ]);
        Settings::resolve(&cli, FileConfig::default()).unwrap()
    }

    async fn mount_page(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/wiki/List_of_albums"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let server = MockServer::start().await;
        mount_page(&server, PAGE).await;
        Mock::given(method("POST"))
            .and(path("/api/image-scraper"))
            .and(body_json(json!({"wikiURL": format!("{}/wiki/Broken", server.uri())})))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/image-scraper"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"imageURL": "//img.example/cover.jpg"})),
            )
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data.json");
        let results = run(&settings(&server, &out)).await.unwrap();

        assert_eq!(results.bad_tables, 1);
        assert_eq!(results.record_count(), 3);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let obj = written.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["bad_tables"], json!(1));
        assert!(!obj.contains_key("1"));

        let records = obj["0"].as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["links"], json!(format!("{}/wiki/Album_A", server.uri())));
        assert_eq!(records[1]["links"], json!(format!("{}/wiki/Artist_B", server.uri())));
        assert_eq!(records[2]["links"], json!(format!("{}/wiki/Album_C", server.uri())));
        for r in records {
            assert_eq!(r["images"], json!("https://img.example/cover.jpg"));
        }
        assert_eq!(records[1]["Genre"], Value::Null);
    }

    #[tokio::test]
    async fn test_page_without_tables() {
        let server = MockServer::start().await;
        mount_page(&server, "<html><body><p>No tables here</p></body></html>").await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data.json");
        run(&settings(&server, &out)).await.unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), r#"{"bad_tables":0}"#);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_without_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data.json");

        assert!(run(&settings(&server, &out)).await.is_err());
        assert!(!out.exists());
    }
}
