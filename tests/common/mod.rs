//! Common test utilities
//!
//! In-memory stand-ins for the identity provider, the row stores and the text
//! generator, plus request helpers for driving the full router.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;
use uuid::Uuid;

use moneyflow::domain::{
    AuthenticatedUser, NewTransaction, NotificationPreferences, TaxDue, TaxDueUpsert, Transaction,
    TransactionChanges, TransactionFilter,
};
use moneyflow::identity::{IdentityError, IdentityProvider, Session};
use moneyflow::repository::{NotificationRepository, RepositoryError, TransactionRepository};
use moneyflow::tips::{GenerationError, TextGenerator, TipsService};
use moneyflow::{create_router, AppState, CorsPolicy};

pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const PREVIEW_PATTERN: &str = r"^https://moneyflow-frontend-.*\.vercel\.app$";

// =========================================================================
// Database
// =========================================================================

/// Connect to the test database and apply migrations. Returns `None` when
/// `DATABASE_URL` is not set so the Postgres-backed tests can be skipped.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres repository test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

// =========================================================================
// Identity provider
// =========================================================================

#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, AuthenticatedUser)>>,
    sessions: Mutex<HashMap<String, AuthenticatedUser>>,
    down: AtomicBool,
}

impl FakeIdentity {
    /// Register a user and hand out a live token for it
    pub fn issue(&self, email: &str) -> (String, AuthenticatedUser) {
        let user = AuthenticatedUser::new(Uuid::new_v4(), email);
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), ("password".to_string(), user.clone()));
        let token = format!("token-{}", Uuid::new_v4());
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), user.clone());
        (token, user)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), IdentityError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_user(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        self.check_up()?;
        self.sessions
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("invalid JWT: signature is invalid".to_string()))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _user_data: Option<Value>,
    ) -> Result<AuthenticatedUser, IdentityError> {
        self.check_up()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        let user = AuthenticatedUser::new(Uuid::new_v4(), email);
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        self.check_up()?;
        let user = match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(IdentityError::Rejected("Invalid login credentials".to_string())),
        };
        let token = format!("token-{}", Uuid::new_v4());
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), user.clone());
        Ok(Session {
            access_token: token,
            user,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.check_up()?;
        match self.sessions.lock().unwrap().remove(token) {
            Some(_) => Ok(()),
            None => Err(IdentityError::Rejected("invalid JWT: token is expired".to_string())),
        }
    }
}

// =========================================================================
// Row stores
// =========================================================================

#[derive(Default)]
pub struct InMemoryTransactions {
    rows: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactions {
    pub fn all(&self) -> Vec<Transaction> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactions {
    async fn create(&self, user_id: Uuid, new: NewTransaction) -> Result<Transaction, RepositoryError> {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind: new.kind,
            amount: new.amount.value(),
            description: new.description,
            category: new.category,
            date: new.date,
        };
        self.rows.lock().unwrap().push(transaction.clone());
        Ok(transaction)
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id && matches_filter(filter, t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transaction>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .map(|t| {
                apply_changes(&changes, t);
                t.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(rows.len() < before)
    }
}

/// Same predicate as the list query's WHERE clause
fn matches_filter(filter: &TransactionFilter, transaction: &Transaction) -> bool {
    filter.kind.map_or(true, |kind| transaction.kind == kind)
        && filter
            .category
            .as_deref()
            .map_or(true, |category| transaction.category == category)
        && filter.date_from.map_or(true, |from| transaction.date >= from)
        && filter.date_to.map_or(true, |to| transaction.date <= to)
}

/// Same COALESCE semantics as the update query: absent fields are kept
fn apply_changes(changes: &TransactionChanges, transaction: &mut Transaction) {
    if let Some(kind) = changes.kind {
        transaction.kind = kind;
    }
    if let Some(amount) = changes.amount {
        transaction.amount = amount.value();
    }
    if let Some(description) = &changes.description {
        transaction.description = Some(description.clone());
    }
    if let Some(category) = &changes.category {
        transaction.category = category.clone();
    }
    if let Some(date) = changes.date {
        transaction.date = date;
    }
}

#[derive(Default)]
pub struct InMemoryNotifications {
    preferences: Mutex<HashMap<Uuid, NotificationPreferences>>,
    taxes: Mutex<Vec<TaxDue>>,
}

impl InMemoryNotifications {
    pub fn preference_rows(&self) -> usize {
        self.preferences.lock().unwrap().len()
    }

    pub fn tax(&self, id: Uuid) -> Option<TaxDue> {
        self.taxes.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn get_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<NotificationPreferences>, RepositoryError> {
        Ok(self.preferences.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: Value,
    ) -> Result<NotificationPreferences, RepositoryError> {
        let row = NotificationPreferences {
            user_id,
            preferences,
            updated_at: Utc::now(),
        };
        self.preferences
            .lock()
            .unwrap()
            .insert(user_id, row.clone());
        Ok(row)
    }

    async fn list_taxes(&self, user_id: Uuid) -> Result<Vec<TaxDue>, RepositoryError> {
        let mut rows: Vec<TaxDue> = self
            .taxes
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn upsert_tax(
        &self,
        user_id: Uuid,
        tax: TaxDueUpsert,
    ) -> Result<Option<TaxDue>, RepositoryError> {
        let now = Utc::now();
        let mut rows = self.taxes.lock().unwrap();
        let id = tax.id.unwrap_or_else(Uuid::new_v4);

        match rows.iter_mut().find(|t| t.id == id) {
            Some(existing) if existing.user_id != user_id => Ok(None),
            Some(existing) => {
                *existing = tax_row(tax, id, user_id, existing.created_at, now);
                Ok(Some(existing.clone()))
            }
            None => {
                let row = tax_row(tax, id, user_id, now, now);
                rows.push(row.clone());
                Ok(Some(row))
            }
        }
    }

    async fn delete_tax(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let mut rows = self.taxes.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(rows.len() < before)
    }
}

fn tax_row(
    tax: TaxDueUpsert,
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> TaxDue {
    TaxDue {
        id,
        user_id,
        tax_id: tax.tax_id,
        tax_label: tax.tax_label,
        due_day: tax.due_day,
        due_month: tax.due_month,
        email: tax.email,
        created_at,
        updated_at,
    }
}

// =========================================================================
// Text generator
// =========================================================================

pub struct CannedGenerator(pub Result<String, GenerationError>);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.0.clone()
    }
}

// =========================================================================
// App
// =========================================================================

pub struct TestApp {
    pub router: Router,
    pub identity: Arc<FakeIdentity>,
    pub transactions: Arc<InMemoryTransactions>,
    pub notifications: Arc<InMemoryNotifications>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(None)
    }

    pub fn with_generator(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        let identity = Arc::new(FakeIdentity::default());
        let transactions = Arc::new(InMemoryTransactions::default());
        let notifications = Arc::new(InMemoryNotifications::default());

        let state = AppState::new(
            identity.clone(),
            transactions.clone(),
            notifications.clone(),
            TipsService::new(generator),
            "test",
        );
        let cors = CorsPolicy::new([FRONTEND_ORIGIN], Some(PREVIEW_PATTERN)).unwrap();

        Self {
            router: create_router(state, cors),
            identity,
            transactions,
            notifications,
        }
    }

    /// Send a request through the full middleware stack
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
            raw_len: bytes.len(),
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw_len: usize,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
