use crate::config::GitHubConfig;
use crate::error::GitHubError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Authenticated GitHub account
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
    pub name: Option<String>,
}

/// Entry of a followers page; only the login is kept
#[derive(Debug, Clone, Deserialize)]
struct FollowerEntry {
    login: String,
}

/// Relationship between the authenticated user and another account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStatus {
    Following,
    NotFollowing,
}

/// Operations the follow pipeline needs from GitHub
#[allow(async_fn_in_trait)] // Internal trait for dependency injection in tests
pub trait FollowApi {
    async fn authenticate(&self) -> Result<Account, GitHubError>;
    async fn followers_page(
        &self,
        user: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<String>, GitHubError>;
    async fn is_following(&self, user: &str) -> Result<FollowStatus, GitHubError>;
    async fn follow(&self, user: &str) -> Result<(), GitHubError>;
}

/// GitHub REST client authenticated with a personal access token
#[derive(Clone)]
pub struct GitHubClient {
    http_client: reqwest::Client,
    api_url: Url,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client for `token`; the token is stored only in the default headers
    pub fn new(config: &GitHubConfig, token: &str) -> Result<Self, GitHubError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::ClientBuild("token contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("followbot/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| GitHubError::ClientBuild(e.to_string()))?;

        // Normalized to a single trailing slash; endpoints replace the empty last segment
        let mut base = config.api_url.trim_end_matches('/').to_string();
        base.push('/');
        let api_url = Url::parse(&base)
            .map_err(|e| GitHubError::ClientBuild(format!("invalid API URL '{base}': {e}")))?;

        Ok(Self {
            http_client,
            api_url,
        })
    }

    /// Append `segments` to the base URL, each percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GitHubError::ClientBuild(format!("API URL '{}' cannot be a base", self.api_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, GitHubError> {
        let url = self.endpoint(segments)?;
        debug!("{} {}", method, url);
        Ok(self.http_client.request(method, url))
    }

    async fn send(request: RequestBuilder) -> Result<Response, GitHubError> {
        let response = request.send().await?;
        debug!("GitHub responded with {}", response.status());
        Ok(response)
    }
}

impl FollowApi for GitHubClient {
    /// Verify the token against `GET /user`
    async fn authenticate(&self) -> Result<Account, GitHubError> {
        let response = Self::send(self.request(Method::GET, &["user"])?).await?;

        match response.status() {
            StatusCode::OK => {
                let account: Account = response.json().await.map_err(|e| {
                    GitHubError::InvalidResponse(format!("Failed to parse account response: {e}"))
                })?;
                info!("Credentials verified for user: {}", account.login);
                Ok(account)
            }
            StatusCode::UNAUTHORIZED => Err(GitHubError::CredentialInvalid),
            status => Err(GitHubError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }

    async fn followers_page(
        &self,
        user: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<String>, GitHubError> {
        let request = self
            .request(Method::GET, &["users", user, "followers"])?
            .query(&[("per_page", per_page), ("page", page)]);
        let response = Self::send(request).await?;

        match response.status() {
            StatusCode::OK => {
                let entries: Vec<FollowerEntry> = response.json().await.map_err(|e| {
                    GitHubError::InvalidResponse(format!("Failed to parse followers page: {e}"))
                })?;
                Ok(entries.into_iter().map(|entry| entry.login).collect())
            }
            StatusCode::NOT_FOUND => Err(GitHubError::TargetNotFound {
                user: user.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(GitHubError::RateLimited),
            status => Err(GitHubError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }

    /// `GET /user/following/{user}` answers 204 when following and 404 when not
    async fn is_following(&self, user: &str) -> Result<FollowStatus, GitHubError> {
        let response =
            Self::send(self.request(Method::GET, &["user", "following", user])?).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(FollowStatus::Following),
            StatusCode::NOT_FOUND => Ok(FollowStatus::NotFollowing),
            status => Err(GitHubError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }

    async fn follow(&self, user: &str) -> Result<(), GitHubError> {
        let request = self
            .request(Method::PUT, &["user", "following", user])?
            .header(CONTENT_LENGTH, HeaderValue::from_static("0"));
        let response = Self::send(request).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(GitHubError::UnexpectedStatus {
                status: status.as_u16(),
            }),
        }
    }
}
