use crate::error::{Error, Result};
use crate::models::question::FinalMcq;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{error, info};

/// Posts `[question, options]` pairs to the form-builder script and returns
/// the URL of the created form. Disabled when no script URL is configured.
#[derive(Clone)]
pub struct FormService {
    client: Client,
    script_url: Option<String>,
}

impl FormService {
    pub fn new(script_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let script_url = script_url.filter(|url| !url.trim().is_empty());
        if let Some(ref url) = script_url {
            info!("Form publishing enabled, script URL: {}", url);
        } else {
            info!("Form publishing disabled (FORM_SCRIPT_URL not set or empty)");
        }

        Ok(Self { client, script_url })
    }

    pub fn is_enabled(&self) -> bool {
        self.script_url.is_some()
    }

    pub async fn publish(&self, mcqs: &[FinalMcq]) -> Result<String> {
        let script_url = self
            .script_url
            .as_ref()
            .ok_or_else(|| Error::Publish("Form publishing is not configured".into()))?;

        let entries: Vec<(String, Vec<String>)> = mcqs.iter().map(FinalMcq::to_form_entry).collect();
        info!("Publishing {} questions to form builder", entries.len());

        let res = self.client.post(script_url).json(&entries).send().await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();

        if status == StatusCode::OK {
            let form_url = body.trim().to_string();
            info!("Form created: {}", form_url);
            Ok(form_url)
        } else {
            error!("Form builder responded {}: {}", status, body);
            Err(Error::Publish(format!("Error creating form: {}", body)))
        }
    }
}
