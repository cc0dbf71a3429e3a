use reqwest::Method;

use super::ApiClient;
use crate::error::ApiError;
use crate::models::{DashboardSummary, StatisticsSummary, StatsPeriod};

impl ApiClient {
    pub async fn statistics(&self, period: StatsPeriod) -> Result<StatisticsSummary, ApiError> {
        self.execute(
            self.request(Method::GET, "/statistics")
                .query(&[("period", period.as_str())]),
        )
        .await
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary, ApiError> {
        self.execute(self.request(Method::GET, "/dashboard")).await
    }
}
