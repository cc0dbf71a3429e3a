use reqwest::Method;

use super::dto::CategoryPayload;
use super::{item_path, ApiClient};
use crate::error::ApiError;
use crate::models::{Category, EntryType};

impl ApiClient {
    pub async fn list_categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, ApiError> {
        let mut rb = self.request(Method::GET, "/categories");
        if let Some(kind) = kind {
            rb = rb.query(&[("type", kind.as_str())]);
        }
        self.execute(rb).await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.execute(self.request(Method::POST, "/categories").json(payload))
            .await
    }

    pub async fn update_category(&self, id: &str, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.execute(self.request(Method::PUT, &item_path("categories", id)?).json(payload))
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.execute_empty(self.request(Method::DELETE, &item_path("categories", id)?))
            .await
    }
}
