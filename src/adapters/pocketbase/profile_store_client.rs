//! PocketBase REST adapter for the `ProfileStore` port.
//!
//! Plans are looked up with a `filter` query on the `plans` collection and
//! user records are updated with `PATCH` on the `users` collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::ProfilePatch;
use crate::domain::foundation::UserId;
use crate::ports::{PlanRecord, ProfileStore, ProfileStoreError};

const PLANS_COLLECTION: &str = "plans";
const USERS_COLLECTION: &str = "users";

/// Connection settings for the profile store.
#[derive(Clone)]
pub struct ProfileStoreClientConfig {
    base_url: Url,
    admin_token: Option<SecretString>,
    timeout: Duration,
}

impl ProfileStoreClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            admin_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Token sent verbatim in the `Authorization` header.
    pub fn with_admin_token(mut self, token: Option<SecretString>) -> Self {
        self.admin_token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Paginated record list.
#[derive(Debug, Deserialize)]
struct RecordList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// HTTP client for the profile store.
pub struct ProfileStoreClient {
    config: ProfileStoreClientConfig,
    http_client: reqwest::Client,
}

impl ProfileStoreClient {
    pub fn new(config: ProfileStoreClientConfig) -> Result<Self, ProfileStoreError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProfileStoreError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// `{base}/api/collections/{collection}/records[/{id}]`
    fn records_url(&self, collection: &str, record_id: Option<&str>) -> Result<Url, ProfileStoreError> {
        let mut url = self.config.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ProfileStoreError::Network(format!(
                    "Profile store URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?;
            segments
                .pop_if_empty()
                .extend(["api", "collections", collection, "records"]);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.admin_token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token.expose_secret()),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProfileStoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProfileStoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProfileStoreError::from_status(status.as_u16(), body))
    }
}

/// Filter expression matching a plan name exactly.
pub fn plan_name_filter(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name='{}'", escaped)
}

#[async_trait]
impl ProfileStore for ProfileStoreClient {
    async fn get_plan_by_name(&self, name: &str) -> Result<Option<PlanRecord>, ProfileStoreError> {
        let url = self.records_url(PLANS_COLLECTION, None)?;
        let filter = plan_name_filter(name);

        let response = self
            .send(
                self.http_client
                    .get(url)
                    .query(&[("filter", filter.as_str()), ("perPage", "1")]),
            )
            .await?;

        let list: RecordList<PlanRecord> = response
            .json()
            .await
            .map_err(|e| ProfileStoreError::Decode(e.to_string()))?;

        let plan = list.items.into_iter().next();
        if plan.is_none() {
            tracing::warn!(plan_name = %name, "Plan not found in profile store");
        }
        Ok(plan)
    }

    async fn patch_user(
        &self,
        user_id: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), ProfileStoreError> {
        let url = self.records_url(USERS_COLLECTION, Some(user_id.as_str()))?;

        self.send(self.http_client.patch(url).json(patch)).await?;

        tracing::info!(
            user_id = %user_id,
            plan = %patch.plan,
            subscription_status = %patch.subscription_status,
            "User record updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use crate::domain::billing::SubscriptionSyncResult;
    use crate::domain::foundation::{PlanId, Timestamp};

    fn client_for(base: &str) -> ProfileStoreClient {
        ProfileStoreClient::new(ProfileStoreClientConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // URL and Filter Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn records_url_appends_collection_path() {
        let client = client_for("https://pb.example.com");

        let url = client.records_url("users", Some("rec_1")).unwrap();

        assert_eq!(
            url.as_str(),
            "https://pb.example.com/api/collections/users/records/rec_1"
        );
    }

    #[test]
    fn records_url_keeps_base_path_and_escapes_ids() {
        let client = client_for("https://example.com/pb/");

        let url = client.records_url("users", Some("a/b")).unwrap();

        assert_eq!(
            url.as_str(),
            "https://example.com/pb/api/collections/users/records/a%2Fb"
        );
    }

    #[test]
    fn plan_name_filter_escapes_quotes() {
        assert_eq!(plan_name_filter("Company"), "name='Company'");
        assert_eq!(plan_name_filter("O'Brien"), r"name='O\'Brien'");
        assert_eq!(plan_name_filter(r"x\' || true"), r"name='x\\\' || true'");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Wire Tests (local server)
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct Seen {
        filters: Vec<String>,
        patches: Vec<(String, Value, Option<String>)>,
    }

    type Shared = Arc<Mutex<Seen>>;

    async fn list_plans(
        State(seen): State<Shared>,
        Query(params): Query<std::collections::HashMap<String, String>>,
    ) -> Json<Value> {
        let filter = params.get("filter").cloned().unwrap_or_default();
        seen.lock().unwrap().filters.push(filter.clone());
        if filter == "name='Company'" {
            Json(json!({"page": 1, "items": [{"id": "pb_company", "name": "Company"}]}))
        } else {
            Json(json!({"page": 1, "items": []}))
        }
    }

    async fn patch_user_record(
        State(seen): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().patches.push((id.clone(), body, auth));
        if id == "missing" {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        }
    }

    async fn spawn_store() -> (String, Shared) {
        let seen: Shared = Arc::default();
        let app = Router::new()
            .route("/api/collections/plans/records", get(list_plans))
            .route("/api/collections/users/records/:id", patch(patch_user_record))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    fn patch_fixture() -> ProfilePatch {
        SubscriptionSyncResult::downgraded(
            UserId::new("rec_1").unwrap(),
            PlanId::new("pb_free").unwrap(),
            Timestamp::from_unix_secs(1_704_067_200).unwrap(),
        )
        .to_patch()
    }

    #[tokio::test]
    async fn get_plan_by_name_returns_first_item() {
        let (base, seen) = spawn_store().await;
        let client = client_for(&base);

        let plan = client.get_plan_by_name("Company").await.unwrap();

        assert_eq!(
            plan,
            Some(PlanRecord {
                id: "pb_company".to_string(),
                name: "Company".to_string()
            })
        );
        assert_eq!(seen.lock().unwrap().filters, vec!["name='Company'"]);
    }

    #[tokio::test]
    async fn get_plan_by_name_returns_none_for_empty_list() {
        let (base, _) = spawn_store().await;

        let plan = client_for(&base).get_plan_by_name("Gold").await.unwrap();

        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn patch_user_sends_json_and_admin_token() {
        let (base, seen) = spawn_store().await;
        let client = ProfileStoreClient::new(
            ProfileStoreClientConfig::new(Url::parse(&base).unwrap())
                .with_admin_token(Some(SecretString::new("admin-tok".to_string()))),
        )
        .unwrap();

        client
            .patch_user(&UserId::new("rec_1").unwrap(), &patch_fixture())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let (id, body, auth) = &seen.patches[0];
        assert_eq!(id, "rec_1");
        assert_eq!(body["plan"], "pb_free");
        assert_eq!(body["subscription_status"], "cancelled");
        assert_eq!(auth.as_deref(), Some("admin-tok"));
    }

    #[tokio::test]
    async fn patch_user_maps_404_to_client_error() {
        let (base, _) = spawn_store().await;

        let err = client_for(&base)
            .patch_user(&UserId::new("missing").unwrap(), &patch_fixture())
            .await
            .unwrap_err();

        assert!(matches!(err, ProfileStoreError::Client { status: 404, .. }));
    }

    #[tokio::test]
    async fn unreachable_store_is_network_error() {
        // Port 9 (discard) on loopback is not served in test environments.
        let err = client_for("http://127.0.0.1:9")
            .get_plan_by_name("Company")
            .await
            .unwrap_err();

        assert!(matches!(err, ProfileStoreError::Network(_)));
    }
}
