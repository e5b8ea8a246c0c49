use async_trait::async_trait;
use reqwest::{Client, Response};

use super::{Row, RowStore, RowStoreError};

/// Row store backed by the hosted provider's REST interface
/// (`{endpoint}/rest/v1/{table}`).
#[derive(Clone)]
pub struct RestRowStore {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl RestRowStore {
    pub fn new(http: Client, endpoint: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.endpoint)
    }
}

async fn ensure_success(res: Response) -> Result<Response, RowStoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = res.text().await.unwrap_or_default();
    Err(RowStoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl<R: Row> RowStore<R> for RestRowStore {
    async fn insert(&self, row: R::Insert) -> Result<R, RowStoreError> {
        let res = self
            .http
            .post(self.table_url(R::TABLE))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;

        let mut inserted: Vec<R> = ensure_success(res).await?.json().await?;
        inserted.pop().ok_or_else(|| {
            RowStoreError::Malformed(format!("insert into {} returned no rows", R::TABLE))
        })
    }

    async fn list_newest_first(&self) -> Result<Vec<R>, RowStoreError> {
        let res = self
            .http
            .get(self.table_url(R::TABLE))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Ok(ensure_success(res).await?.json().await?)
    }
}
