use reqwest::Method;

use super::dto::BillPayload;
use super::{item_path, ApiClient};
use crate::error::ApiError;
use crate::models::Bill;

impl ApiClient {
    pub async fn list_bills(&self) -> Result<Vec<Bill>, ApiError> {
        self.execute(self.request(Method::GET, "/bills")).await
    }

    pub async fn get_bill(&self, id: &str) -> Result<Bill, ApiError> {
        self.execute(self.request(Method::GET, &item_path("bills", id)?))
            .await
    }

    pub async fn create_bill(&self, payload: &BillPayload) -> Result<Bill, ApiError> {
        self.execute(self.request(Method::POST, "/bills").json(payload))
            .await
    }

    pub async fn update_bill(&self, id: &str, payload: &BillPayload) -> Result<Bill, ApiError> {
        self.execute(self.request(Method::PUT, &item_path("bills", id)?).json(payload))
            .await
    }

    pub async fn delete_bill(&self, id: &str) -> Result<(), ApiError> {
        self.execute_empty(self.request(Method::DELETE, &item_path("bills", id)?))
            .await
    }

    /// Records a payment; the API advances recurring bills to their next due date.
    pub async fn pay_bill(&self, id: &str) -> Result<Bill, ApiError> {
        self.execute(self.request(Method::POST, &format!("{}/pay", item_path("bills", id)?)))
            .await
    }
}
