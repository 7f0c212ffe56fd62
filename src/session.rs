use crate::config::Config;
use crate::error::FollowBotError;
use crate::follower::{collect_followers, Cancellation, FollowExecutor, RunOutcome};
use crate::github::{Account, FollowApi, GitHubClient};
use crate::report::Reporter;
use crate::throttle::{FixedThrottle, Throttle};
use tracing::{info, warn};

/// Everything a run needs from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub credential: String,
    pub target: String,
    /// Explicit consent to issue follow requests
    pub confirmed: bool,
}

impl RunRequest {
    pub fn new(credential: impl Into<String>, target: impl Into<String>, confirmed: bool) -> Self {
        Self {
            credential: credential.into().trim().to_string(),
            target: target.into().trim().to_string(),
            confirmed,
        }
    }

    pub fn validate(&self) -> Result<(), FollowBotError> {
        if self.credential.is_empty() {
            return Err(FollowBotError::MissingInput("Token"));
        }
        if self.target.is_empty() {
            return Err(FollowBotError::MissingInput("Username"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Confirmation withheld; nothing was followed
    Declined,
    /// Target has no followers
    NoFollowers,
    /// Stopped by the user while listing
    Cancelled,
    Finished(RunOutcome),
}

/// One authenticate, list, follow pass for a single account
pub struct Session<A, T, R> {
    api: A,
    throttle: T,
    reporter: R,
    per_page: u32,
}

impl<R: Reporter> Session<GitHubClient, FixedThrottle, R> {
    /// Build a session against the configured GitHub API
    pub fn from_config(
        config: &Config,
        credential: &str,
        reporter: R,
    ) -> Result<Self, FollowBotError> {
        let api = GitHubClient::new(&config.github, credential)?;
        let throttle = FixedThrottle::new(&config.throttle());
        Ok(Self::new(api, throttle, reporter, config.per_page()))
    }
}

impl<A, T, R> Session<A, T, R>
where
    A: FollowApi,
    T: Throttle,
    R: Reporter,
{
    pub fn new(api: A, throttle: T, reporter: R, per_page: u32) -> Self {
        Self {
            api,
            throttle,
            reporter,
            per_page,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub async fn authenticate(&self) -> Result<Account, FollowBotError> {
        Ok(self.api.authenticate().await?)
    }

    /// Authenticate, then list and follow
    pub async fn run(
        &self,
        request: &RunRequest,
        cancellation: &mut Cancellation,
    ) -> Result<SessionOutcome, FollowBotError> {
        request.validate()?;
        let account = self.authenticate().await?;
        info!("Running as {}", account.login);
        self.execute(request, cancellation).await
    }

    /// List and follow for an already authenticated session
    pub async fn execute(
        &self,
        request: &RunRequest,
        cancellation: &mut Cancellation,
    ) -> Result<SessionOutcome, FollowBotError> {
        request.validate()?;

        if !request.confirmed {
            info!("Run not confirmed, no follow requests issued");
            return Ok(SessionOutcome::Declined);
        }

        let listing = collect_followers(
            &self.api,
            &self.throttle,
            &self.reporter,
            &request.target,
            self.per_page,
        );
        let followers = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                warn!("Cancelled while listing followers of '{}'", request.target);
                return Ok(SessionOutcome::Cancelled);
            }
            result = listing => result?,
        };

        if followers.is_empty() {
            return Ok(SessionOutcome::NoFollowers);
        }

        let executor = FollowExecutor::new(&self.api, &self.throttle, &self.reporter);
        let outcome = executor.run(&followers, cancellation).await;
        Ok(SessionOutcome::Finished(outcome))
    }
}
