//! Whop REST client.

use std::time::Duration;

use async_trait::async_trait;
use cryptomind_core::{Error, Result, WhopSettings};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::source::{MembershipSource, MembershipStream};
use crate::types::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`MembershipSource`] backed by the Whop REST API.
#[derive(Clone)]
pub struct WhopClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl WhopClient {
    /// Build a client from settings. Fails if no API key is configured.
    pub fn new(settings: &WhopSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("WHOP_API_KEY not configured".into()))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!("Whop API error {}: {}", status, body)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Http(format!("Invalid response body: {}", e)))
    }

    async fn fetch_membership_page(
        &self,
        company_id: &str,
        page_size: u32,
        after: Option<&str>,
    ) -> Result<RawPage> {
        let first = page_size.to_string();
        let mut query = vec![("company_id", company_id), ("first", first.as_str())];
        if let Some(cursor) = after {
            query.push(("after", cursor));
        }
        self.get_json("/memberships", &query).await
    }
}

#[async_trait]
impl MembershipSource for WhopClient {
    fn list_memberships<'a>(&'a self, company_id: &str, page_size: u32) -> MembershipStream<'a> {
        let company_id = company_id.to_string();

        Box::pin(async_stream::stream! {
            let mut cursor: Option<String> = None;
            let mut pages = 0usize;

            loop {
                let page = match self
                    .fetch_membership_page(&company_id, page_size, cursor.as_deref())
                    .await
                {
                    Ok(p) => p,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                pages += 1;
                debug!("Fetched membership page {} ({} records)", pages, page.data.len());

                for record in page.data {
                    match parse_membership(record) {
                        Ok(m) => yield Ok(m),
                        Err(e) => warn!("Skipping membership record: {}", e),
                    }
                }

                let next = match page.page_info {
                    Some(info) if info.has_next_page => info.end_cursor,
                    _ => None,
                };
                match next {
                    Some(c) if cursor.as_deref() == Some(c.as_str()) => {
                        warn!("Membership listing returned a repeated cursor; stopping");
                        break;
                    }
                    Some(c) => cursor = Some(c),
                    None => break,
                }
            }
        })
    }

    async fn retrieve_user(&self, user_id: &str) -> Result<UserDetails> {
        let raw: RawUser = self.get_json(&format!("/users/{}", user_id), &[]).await?;
        Ok(UserDetails::from(raw))
    }
}
