//! Finance client: every read is a cached query, every write a mutation that
//! names the reads it makes stale.

pub mod keys;

use std::future::Future;

use tracing::{info, instrument};

use crate::api::dto::{
    BillPayload, CategoryPayload, ContributionPayload, GoalPayload, LoginPayload, PlanItemPayload,
    RegisterPayload, TransactionFilter, TransactionPayload,
};
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::{
    AuthResponse, Bill, Category, DashboardSummary, EntryType, GoalContribution, PlanItem,
    SavingsGoal, StatisticsSummary, StatsPeriod, Transaction, User,
};
use crate::query::{QueryCache, QueryKey};
use crate::session::SessionManager;

fn transaction_writes() -> [QueryKey; 4] {
    [
        keys::transactions(),
        keys::dashboard(),
        keys::statistics(),
        keys::planning(),
    ]
}

fn bill_writes() -> [QueryKey; 2] {
    [keys::bills(), keys::dashboard()]
}

fn bill_payment() -> [QueryKey; 3] {
    [keys::bills(), keys::dashboard(), keys::transactions()]
}

fn goal_writes() -> [QueryKey; 2] {
    [keys::goals(), keys::dashboard()]
}

fn contribution() -> [QueryKey; 3] {
    [keys::goals(), keys::goal_history(), keys::dashboard()]
}

fn category_writes() -> [QueryKey; 4] {
    [
        keys::categories(),
        keys::transactions(),
        keys::planning(),
        keys::statistics(),
    ]
}

fn plan_writes() -> [QueryKey; 2] {
    [keys::planning(), keys::statistics()]
}

#[derive(Clone)]
pub struct FinanceClient {
    api: ApiClient,
    cache: QueryCache,
}

impl FinanceClient {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub fn from_config(config: &AppConfig, session: SessionManager) -> Result<Self, ApiError> {
        let api = ApiClient::with_timeout(&config.api_base_url, session, config.api_timeout())?;
        Ok(Self::new(api, QueryCache::new(config.query_cache())))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn session(&self) -> &SessionManager {
        self.api.session()
    }

    async fn query<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let api = self.api.clone();
        self.cache.fetch(key, move || fetch(api.clone())).await
    }

    // auth

    /// A new identity starts from an empty cache.
    #[instrument(skip_all)]
    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse, ApiError> {
        let res = self.api.login(payload).await?;
        self.cache.clear();
        Ok(res)
    }

    #[instrument(skip_all)]
    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse, ApiError> {
        let res = self.api.register(payload).await?;
        self.cache.clear();
        Ok(res)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        self.api.logout()?;
        self.cache.clear();
        info!("query cache cleared on logout");
        Ok(())
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.query(keys::me(), |api| async move { api.me().await }).await
    }

    // reads

    pub async fn dashboard(&self) -> Result<DashboardSummary, ApiError> {
        self.query(keys::dashboard(), |api| async move { api.dashboard().await })
            .await
    }

    pub async fn statistics(&self, period: StatsPeriod) -> Result<StatisticsSummary, ApiError> {
        self.query(keys::statistics_for(period), move |api| async move {
            api.statistics(period).await
        })
        .await
    }

    pub async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, ApiError> {
        let filter = filter.clone();
        self.query(keys::transaction_list(&filter), move |api| {
            let filter = filter.clone();
            async move { api.list_transactions(&filter).await }
        })
        .await
    }

    pub async fn transaction(&self, id: &str) -> Result<Transaction, ApiError> {
        let id = id.to_string();
        self.query(keys::transaction(&id), move |api| {
            let id = id.clone();
            async move { api.get_transaction(&id).await }
        })
        .await
    }

    pub async fn bills(&self) -> Result<Vec<Bill>, ApiError> {
        self.query(keys::bills(), |api| async move { api.list_bills().await })
            .await
    }

    pub async fn bill(&self, id: &str) -> Result<Bill, ApiError> {
        let id = id.to_string();
        self.query(keys::bill(&id), move |api| {
            let id = id.clone();
            async move { api.get_bill(&id).await }
        })
        .await
    }

    pub async fn goals(&self) -> Result<Vec<SavingsGoal>, ApiError> {
        self.query(keys::goals(), |api| async move { api.list_goals().await })
            .await
    }

    pub async fn goal(&self, id: &str) -> Result<SavingsGoal, ApiError> {
        let id = id.to_string();
        self.query(keys::goal(&id), move |api| {
            let id = id.clone();
            async move { api.get_goal(&id).await }
        })
        .await
    }

    pub async fn goal_history(&self) -> Result<Vec<GoalContribution>, ApiError> {
        self.query(keys::goal_history(), |api| async move { api.goal_history().await })
            .await
    }

    pub async fn categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, ApiError> {
        self.query(keys::category_list(kind), move |api| async move {
            api.list_categories(kind).await
        })
        .await
    }

    pub async fn plan_items(&self, month: &str) -> Result<Vec<PlanItem>, ApiError> {
        let month = month.to_string();
        self.query(keys::plan_month(&month), move |api| {
            let month = month.clone();
            async move { api.list_plan_items(&month).await }
        })
        .await
    }

    // writes

    pub async fn create_transaction(&self, payload: &TransactionPayload) -> Result<Transaction, ApiError> {
        self.cache
            .mutate(self.api.create_transaction(payload), &transaction_writes())
            .await
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        payload: &TransactionPayload,
    ) -> Result<Transaction, ApiError> {
        self.cache
            .mutate(self.api.update_transaction(id, payload), &transaction_writes())
            .await
    }

    /// The deleted record's detail query is dropped rather than marked stale.
    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete_transaction(id), &transaction_writes())
            .await?;
        self.cache.remove(&keys::transaction(id));
        Ok(())
    }

    pub async fn create_bill(&self, payload: &BillPayload) -> Result<Bill, ApiError> {
        self.cache
            .mutate(self.api.create_bill(payload), &bill_writes())
            .await
    }

    pub async fn update_bill(&self, id: &str, payload: &BillPayload) -> Result<Bill, ApiError> {
        self.cache
            .mutate(self.api.update_bill(id, payload), &bill_writes())
            .await
    }

    pub async fn delete_bill(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete_bill(id), &bill_writes())
            .await?;
        self.cache.remove(&keys::bill(id));
        Ok(())
    }

    /// Paying a bill records a transaction on the server side.
    pub async fn pay_bill(&self, id: &str) -> Result<Bill, ApiError> {
        self.cache
            .mutate(self.api.pay_bill(id), &bill_payment())
            .await
    }

    pub async fn create_goal(&self, payload: &GoalPayload) -> Result<SavingsGoal, ApiError> {
        self.cache
            .mutate(self.api.create_goal(payload), &goal_writes())
            .await
    }

    pub async fn update_goal(&self, id: &str, payload: &GoalPayload) -> Result<SavingsGoal, ApiError> {
        self.cache
            .mutate(self.api.update_goal(id, payload), &goal_writes())
            .await
    }

    pub async fn delete_goal(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete_goal(id), &goal_writes())
            .await?;
        self.cache.remove(&keys::goal(id));
        Ok(())
    }

    pub async fn contribute_to_goal(
        &self,
        id: &str,
        payload: &ContributionPayload,
    ) -> Result<GoalContribution, ApiError> {
        self.cache
            .mutate(self.api.contribute_to_goal(id, payload), &contribution())
            .await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.cache
            .mutate(self.api.create_category(payload), &category_writes())
            .await
    }

    pub async fn update_category(&self, id: &str, payload: &CategoryPayload) -> Result<Category, ApiError> {
        self.cache
            .mutate(self.api.update_category(id, payload), &category_writes())
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete_category(id), &category_writes())
            .await
    }

    pub async fn create_plan_item(&self, payload: &PlanItemPayload) -> Result<PlanItem, ApiError> {
        self.cache
            .mutate(self.api.create_plan_item(payload), &plan_writes())
            .await
    }

    pub async fn update_plan_item(&self, id: &str, payload: &PlanItemPayload) -> Result<PlanItem, ApiError> {
        self.cache
            .mutate(self.api.update_plan_item(id, payload), &plan_writes())
            .await
    }

    pub async fn delete_plan_item(&self, id: &str) -> Result<(), ApiError> {
        self.cache
            .mutate(self.api.delete_plan_item(id), &plan_writes())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use time::macros::date;

    use super::*;
    use crate::api::testing;
    use crate::models::BillFrequency;
    use crate::query::QueryStatus;

    #[derive(Default)]
    struct MockApi {
        bills: Mutex<Vec<Value>>,
        bill_lists: AtomicUsize,
        dashboards: AtomicUsize,
        goal_lists: AtomicUsize,
        transaction_lists: AtomicUsize,
        transaction_details: AtomicUsize,
    }

    type Shared = Arc<MockApi>;

    async fn list_bills(State(api): State<Shared>) -> Json<Value> {
        api.bill_lists.fetch_add(1, Ordering::SeqCst);
        Json(Value::Array(api.bills.lock().clone()))
    }

    async fn create_bill(
        State(api): State<Shared>,
        Json(mut body): Json<Value>,
    ) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        if body["name"] == "Duplicate" {
            return Err((StatusCode::CONFLICT, Json(json!({"message": "Bill already exists"}))));
        }
        let mut bills = api.bills.lock();
        body["id"] = json!(format!("b{}", bills.len() + 1));
        bills.push(body.clone());
        Ok(Json(body))
    }

    async fn dashboard(State(api): State<Shared>) -> Json<Value> {
        api.dashboards.fetch_add(1, Ordering::SeqCst);
        Json(json!({"balance": 100.0}))
    }

    async fn list_goals(State(api): State<Shared>) -> Json<Value> {
        api.goal_lists.fetch_add(1, Ordering::SeqCst);
        Json(json!([]))
    }

    async fn list_transactions(
        State(api): State<Shared>,
        Query(q): Query<std::collections::HashMap<String, String>>,
    ) -> Json<Value> {
        api.transaction_lists.fetch_add(1, Ordering::SeqCst);
        let page = q.get("page").cloned().unwrap_or_default();
        Json(json!([{"id": format!("t{page}"), "amount": 5.0, "type": "EXPENSE", "date": "2024-03-01"}]))
    }

    async fn get_transaction(State(api): State<Shared>, Path(id): Path<String>) -> Json<Value> {
        api.transaction_details.fetch_add(1, Ordering::SeqCst);
        Json(json!({"id": id, "amount": 5.0, "type": "EXPENSE", "date": "2024-03-01"}))
    }

    async fn login(Json(body): Json<Value>) -> Json<Value> {
        Json(json!({"token": "tok-new", "user": {"id": "u2", "email": body["email"]}}))
    }

    async fn client() -> (FinanceClient, Shared) {
        let mock = Shared::default();
        let router = Router::new()
            .route("/bills", get(list_bills).post(create_bill))
            .route("/dashboard", get(dashboard))
            .route("/goals", get(list_goals))
            .route("/transactions", get(list_transactions))
            .route(
                "/transactions/:id",
                get(get_transaction).delete(|| async { StatusCode::NO_CONTENT }),
            )
            .route("/auth/login", post(login))
            .with_state(Arc::clone(&mock));
        let base = testing::serve(router).await;
        let api = ApiClient::new(&base, SessionManager::in_memory()).unwrap();
        (FinanceClient::new(api, QueryCache::default()), mock)
    }

    fn rent() -> BillPayload {
        BillPayload {
            name: "Rent".into(),
            amount: 1200.0,
            due_date: date!(2024 - 01 - 01),
            frequency: BillFrequency::Monthly,
            category_id: "housing".into(),
            autopay: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn created_bill_shows_up_in_next_list_read() {
        let (client, mock) = client().await;
        assert!(client.bills().await.unwrap().is_empty());
        client.dashboard().await.unwrap();
        client.goals().await.unwrap();

        let created = client.create_bill(&rent()).await.unwrap();
        assert_eq!(created.id, "b1");

        // invalidation alone does not hit the API
        assert_eq!(mock.bill_lists.load(Ordering::SeqCst), 1);
        assert_eq!(mock.dashboards.load(Ordering::SeqCst), 1);

        let bills = client.bills().await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].name, "Rent");
        client.dashboard().await.unwrap();
        client.goals().await.unwrap();

        // bills and dashboard refetched once each on next read; goals served from cache
        assert_eq!(mock.bill_lists.load(Ordering::SeqCst), 2);
        assert_eq!(mock.dashboards.load(Ordering::SeqCst), 2);
        assert_eq!(mock.goal_lists.load(Ordering::SeqCst), 1);
    }

    fn page(n: u32) -> TransactionFilter {
        TransactionFilter {
            page: Some(n),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn delete_with_many_cached_pages_costs_one_request() {
        let (client, mock) = client().await;
        for n in 1..=30 {
            client.transactions(&page(n)).await.unwrap();
        }
        client.transaction("t1").await.unwrap();
        assert_eq!(mock.transaction_lists.load(Ordering::SeqCst), 30);
        assert_eq!(mock.transaction_details.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache().len(), 31);

        client.delete_transaction("t1").await.unwrap();

        assert_eq!(mock.transaction_lists.load(Ordering::SeqCst), 30);
        assert_eq!(mock.transaction_details.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache().len(), 30);
        assert_eq!(
            client.cache().status(&keys::transaction("t1")),
            QueryStatus::Idle
        );
        assert!(client
            .cache()
            .state::<Vec<Transaction>>(&keys::transaction_list(&page(2)))
            .is_stale);

        let rows = client.transactions(&page(2)).await.unwrap();
        assert_eq!(rows[0].id, "t2");
        assert_eq!(mock.transaction_lists.load(Ordering::SeqCst), 31);
    }

    #[tokio::test]
    async fn rejected_write_keeps_cached_reads() {
        let (client, mock) = client().await;
        client.bills().await.unwrap();

        let mut dup = rent();
        dup.name = "Duplicate".into();
        let err = client.create_bill(&dup).await.unwrap_err();
        assert_eq!(err.user_message(), "Bill already exists");

        assert_eq!(mock.bill_lists.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache().status(&keys::bills()), QueryStatus::Success);
    }

    #[tokio::test]
    async fn login_and_logout_drop_cached_data() {
        let (client, _mock) = client().await;
        client.bills().await.unwrap();
        assert!(!client.cache().is_empty());

        client
            .login(&LoginPayload {
                email: "b@example.com".into(),
                password: "secret-pass".into(),
            })
            .await
            .unwrap();
        assert!(client.cache().is_empty());
        assert_eq!(client.session().get_token().as_deref(), Some("tok-new"));

        client.bills().await.unwrap();
        client.logout().unwrap();
        assert!(client.cache().is_empty());
        assert!(!client.session().is_authenticated());
    }

    #[test]
    fn invalidation_lists_cover_dependent_views() {
        assert!(transaction_writes().contains(&keys::planning()));
        assert!(bill_payment().contains(&keys::transactions()));
        assert!(contribution().contains(&keys::goal_history()));
        assert!(category_writes().contains(&keys::statistics()));
        assert!(!goal_writes().contains(&keys::goal_history()));
    }
}
