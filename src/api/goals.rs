use reqwest::Method;

use super::dto::{ContributionPayload, GoalPayload};
use super::{item_path, ApiClient};
use crate::error::ApiError;
use crate::models::{GoalContribution, SavingsGoal};

impl ApiClient {
    pub async fn list_goals(&self) -> Result<Vec<SavingsGoal>, ApiError> {
        self.execute(self.request(Method::GET, "/goals")).await
    }

    pub async fn get_goal(&self, id: &str) -> Result<SavingsGoal, ApiError> {
        self.execute(self.request(Method::GET, &item_path("goals", id)?))
            .await
    }

    pub async fn create_goal(&self, payload: &GoalPayload) -> Result<SavingsGoal, ApiError> {
        self.execute(self.request(Method::POST, "/goals").json(payload))
            .await
    }

    pub async fn update_goal(&self, id: &str, payload: &GoalPayload) -> Result<SavingsGoal, ApiError> {
        self.execute(self.request(Method::PUT, &item_path("goals", id)?).json(payload))
            .await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), ApiError> {
        self.execute_empty(self.request(Method::DELETE, &item_path("goals", id)?))
            .await
    }

    pub async fn contribute_to_goal(
        &self,
        id: &str,
        payload: &ContributionPayload,
    ) -> Result<GoalContribution, ApiError> {
        self.execute(
            self.request(Method::POST, &format!("{}/contributions", item_path("goals", id)?))
                .json(payload),
        )
        .await
    }

    /// Contributions across all goals, newest first as the API orders them.
    pub async fn goal_history(&self) -> Result<Vec<GoalContribution>, ApiError> {
        self.execute(self.request(Method::GET, "/goals/history")).await
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Path, routing::get, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::api::testing;
    use crate::session::SessionManager;

    async fn goal(Path(id): Path<String>) -> Json<Value> {
        Json(json!({"id": id, "name": "Trip", "targetAmount": 900.0}))
    }

    async fn client() -> ApiClient {
        let router = Router::new()
            .route("/goals/history", get(|| async { Json(json!([])) }))
            .route("/goals/:id", get(goal));
        let base = testing::serve(router).await;
        ApiClient::new(&base, SessionManager::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn goal_id_is_sent_as_one_path_segment() {
        let api = client().await;
        assert_eq!(api.get_goal("a/b").await.unwrap().id, "a/b");
        assert_eq!(api.get_goal("x?y#z").await.unwrap().id, "x?y#z");
        assert_eq!(api.get_goal("g 1").await.unwrap().id, "g 1");
    }

    #[tokio::test]
    async fn dot_segment_ids_are_refused_before_sending() {
        let api = client().await;
        for id in ["", ".", ".."] {
            assert!(matches!(api.get_goal(id).await, Err(ApiError::Config(_))));
        }
    }

    #[test]
    fn item_path_encodes_reserved_characters() {
        assert_eq!(item_path("bills", "b1").unwrap(), "/bills/b1");
        assert_eq!(item_path("bills", "a/b").unwrap(), "/bills/a%2Fb");
        assert_eq!(item_path("bills", "../admin").unwrap(), "/bills/..%2Fadmin");
    }
}
