use reqwest::Method;

use super::dto::PlanItemPayload;
use super::{item_path, ApiClient};
use crate::error::ApiError;
use crate::models::PlanItem;

impl ApiClient {
    /// Plan items for a `YYYY-MM` month.
    pub async fn list_plan_items(&self, month: &str) -> Result<Vec<PlanItem>, ApiError> {
        self.execute(self.request(Method::GET, "/planning").query(&[("month", month)]))
            .await
    }

    pub async fn create_plan_item(&self, payload: &PlanItemPayload) -> Result<PlanItem, ApiError> {
        self.execute(self.request(Method::POST, "/planning").json(payload))
            .await
    }

    pub async fn update_plan_item(&self, id: &str, payload: &PlanItemPayload) -> Result<PlanItem, ApiError> {
        self.execute(self.request(Method::PUT, &item_path("planning", id)?).json(payload))
            .await
    }

    pub async fn delete_plan_item(&self, id: &str) -> Result<(), ApiError> {
        self.execute_empty(self.request(Method::DELETE, &item_path("planning", id)?))
            .await
    }
}
