use reqwest::Method;

use super::dto::{TransactionFilter, TransactionPayload};
use super::{item_path, ApiClient};
use crate::error::ApiError;
use crate::models::Transaction;

impl ApiClient {
    pub async fn list_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, ApiError> {
        self.execute(self.request(Method::GET, "/transactions").query(filter))
            .await
    }

    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, ApiError> {
        self.execute(self.request(Method::GET, &item_path("transactions", id)?))
            .await
    }

    pub async fn create_transaction(&self, payload: &TransactionPayload) -> Result<Transaction, ApiError> {
        self.execute(self.request(Method::POST, "/transactions").json(payload))
            .await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        payload: &TransactionPayload,
    ) -> Result<Transaction, ApiError> {
        self.execute(self.request(Method::PUT, &item_path("transactions", id)?).json(payload))
            .await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.execute_empty(self.request(Method::DELETE, &item_path("transactions", id)?))
            .await
    }
}
