//! Supabase Auth client
//!
//! Talks to the GoTrue REST endpoints under `{SUPABASE_URL}/auth/v1`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{IdentityError, IdentityProvider, Session};
use crate::domain::AuthenticatedUser;

/// HTTP client for the identity provider
#[derive(Debug, Clone)]
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    base_url: String,
}

/// User object as the provider returns it. Only the fields we project.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl ProviderUser {
    fn into_authenticated(self) -> Result<AuthenticatedUser, IdentityError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|_| IdentityError::InvalidResponse(format!("user id '{}' is not a UUID", self.id)))?;
        Ok(AuthenticatedUser::new(id, self.email.unwrap_or_default()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: ProviderUser,
}

impl SupabaseAuthClient {
    /// Create a client for the project at `base_url`, authenticating calls with
    /// the project's service key.
    pub fn new(base_url: impl Into<String>, api_key: &str) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|_| IdentityError::InvalidResponse("invalid API key header value".to_string()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Turn a non-success response into a typed error
    async fn failure(response: Response) -> IdentityError {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = error_message(&body).unwrap_or_else(|| status.to_string());

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            IdentityError::Unavailable(message)
        } else {
            IdentityError::Rejected(message)
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn get_user(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.without_url().to_string()))?;
        if body.is_null() {
            return Err(IdentityError::NoUser);
        }

        let user: ProviderUser =
            serde_json::from_value(body).map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        user.into_authenticated()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<AuthenticatedUser, IdentityError> {
        let mut payload = json!({ "email": email, "password": password });
        if let Some(data) = user_data {
            payload["data"] = data;
        }

        let response = self
            .http
            .post(self.endpoint("signup"))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.without_url().to_string()))?;

        // With email confirmation disabled the provider wraps the user in a session
        let user = match body.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            Some(_) => return Err(IdentityError::NoUser),
            None => body,
        };

        let user: ProviderUser =
            serde_json::from_value(user).map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;
        user.into_authenticated()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.without_url().to_string()))?;

        Ok(Session {
            access_token: token.access_token,
            user: token.user.into_authenticated()?,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Ok(())
    }
}

/// Request URLs stay out of the error text
fn transport_error(e: reqwest::Error) -> IdentityError {
    IdentityError::Unavailable(e.without_url().to_string())
}

/// The provider has used several error shapes over time
fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const USER_ID: &str = "8d0fd2b3-9ca7-4a4b-9a3d-3b1d5c5f1a11";

    async fn client(server: &MockServer) -> SupabaseAuthClient {
        SupabaseAuthClient::new(server.uri(), "service-key").unwrap()
    }

    #[tokio::test]
    async fn test_get_user_projects_id_and_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer good-token"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "ana@example.com",
                "role": "authenticated",
                "app_metadata": { "provider": "email" }
            })))
            .mount(&server)
            .await;

        let user = client(&server).await.get_user("good-token").await.unwrap();
        assert_eq!(user.id.to_string(), USER_ID);
        assert_eq!(user.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_get_user_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401,
                "msg": "invalid JWT: token is expired"
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.get_user("expired").await.unwrap_err();
        assert_eq!(err, IdentityError::Rejected("invalid JWT: token is expired".to_string()));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).await.get_user("token").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({ "email": "ana@example.com", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-abc",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": { "id": USER_ID, "email": "ana@example.com" }
            })))
            .mount(&server)
            .await;

        let session = client(&server)
            .await
            .sign_in("ana@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(session.access_token, "jwt-abc");
        assert_eq!(session.user.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .sign_in("ana@example.com", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::Rejected("Invalid login credentials".to_string()));
    }

    #[tokio::test]
    async fn test_sign_up_accepts_bare_user_and_session_shapes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt",
                "user": { "id": USER_ID, "email": "new@example.com" }
            })))
            .mount(&server)
            .await;

        let user = client(&server)
            .await
            .sign_up("new@example.com", "secret", Some(json!({ "name": "Nuevo" })))
            .await
            .unwrap();
        assert_eq!(user.email, "new@example.com");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "pending@example.com",
                "confirmation_sent_at": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let user = client(&server)
            .await
            .sign_up("pending@example.com", "secret", None)
            .await
            .unwrap();
        assert_eq!(user.email, "pending@example.com");
    }

    #[tokio::test]
    async fn test_sign_out_forwards_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.sign_out("session-token").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_provider_error_has_no_url() {
        let client = SupabaseAuthClient::new("http://127.0.0.1:1", "service-key").unwrap();
        let err = client.get_user("some-token").await.unwrap_err();

        assert!(err.is_unavailable());
        assert!(!err.to_string().contains("127.0.0.1:1"));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!({ "msg": "a" })).as_deref(), Some("a"));
        assert_eq!(
            error_message(&json!({ "error": "x", "error_description": "b" })).as_deref(),
            Some("b")
        );
        assert_eq!(error_message(&json!({})), None);
    }
}
