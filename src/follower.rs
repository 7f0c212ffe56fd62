use crate::error::GitHubError;
use crate::github::{FollowApi, FollowStatus};
use crate::report::Reporter;
use crate::throttle::{Pause, Throttle};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Result of processing a single follower
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Followed,
    /// Already followed before this run
    Skipped,
    Failed(GitHubError),
}

/// Counters for one run of the follow loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowStats {
    pub followed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl FollowStats {
    /// Number of followers fully processed
    pub fn total(&self) -> usize {
        self.followed + self.skipped + self.errored
    }

    fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Followed => self.followed += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed(_) => self.errored += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(FollowStats),
    /// Stopped by the user; counts cover only the followers processed so far
    Interrupted(FollowStats),
}

impl RunOutcome {
    pub fn stats(&self) -> FollowStats {
        match self {
            RunOutcome::Completed(stats) | RunOutcome::Interrupted(stats) => *stats,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, RunOutcome::Interrupted(_))
    }
}

/// Sending half of a [`Cancellation`]
#[derive(Debug, Clone)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

/// Cooperative stop signal observed by the follow loop
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle(tx), Self { rx })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_, cancellation) = Self::new();
        cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Fetch every follower of `target`, page by page, until an empty page.
///
/// Any failure discards the pages already collected.
pub async fn collect_followers<A, T, R>(
    api: &A,
    throttle: &T,
    reporter: &R,
    target: &str,
    per_page: u32,
) -> Result<Vec<String>, GitHubError>
where
    A: FollowApi,
    T: Throttle,
    R: Reporter,
{
    let mut followers = Vec::new();
    let mut page = 1;

    info!("Fetching followers of '{}'", target);
    reporter.listing_started(target);

    loop {
        let logins = match api.followers_page(target, page, per_page).await {
            Ok(logins) => logins,
            Err(e) => {
                warn!("Failed to fetch followers page {} of '{}': {}", page, target, e);
                return Err(e);
            }
        };

        if logins.is_empty() {
            debug!("Page {} is empty, listing complete", page);
            break;
        }

        followers.extend(logins);
        reporter.page_fetched(page, followers.len());
        page += 1;

        throttle.pause(Pause::Page).await;
    }

    info!("Found {} followers of '{}'", followers.len(), target);
    Ok(followers)
}

/// Follows each listed account once, skipping accounts already followed
pub struct FollowExecutor<'a, A, T, R> {
    api: &'a A,
    throttle: &'a T,
    reporter: &'a R,
}

impl<'a, A, T, R> FollowExecutor<'a, A, T, R>
where
    A: FollowApi,
    T: Throttle,
    R: Reporter,
{
    pub fn new(api: &'a A, throttle: &'a T, reporter: &'a R) -> Self {
        Self {
            api,
            throttle,
            reporter,
        }
    }

    /// Process `followers` in order until done or cancelled
    pub async fn run(&self, followers: &[String], cancellation: &mut Cancellation) -> RunOutcome {
        let total = followers.len();
        let mut stats = FollowStats::default();

        info!("Processing {} followers", total);
        self.reporter.follow_started(total);

        for (index, user) in followers.iter().enumerate() {
            if cancellation.is_cancelled() {
                return self.interrupted(stats);
            }

            // An in-flight item is dropped uncounted when cancelled
            let outcome = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return self.interrupted(stats),
                outcome = self.process(user) => outcome,
            };

            stats.record(&outcome);
            self.reporter.item(index + 1, total, user, &outcome);

            let pause = match outcome {
                ItemOutcome::Skipped => Pause::Skip,
                ItemOutcome::Followed | ItemOutcome::Failed(_) => Pause::Follow,
            };

            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return self.interrupted(stats),
                _ = self.throttle.pause(pause) => {}
            }
        }

        info!(
            "Follow loop finished: {} followed, {} skipped, {} errors",
            stats.followed, stats.skipped, stats.errored
        );
        let outcome = RunOutcome::Completed(stats);
        self.reporter.finished(&outcome);
        outcome
    }

    async fn process(&self, user: &str) -> ItemOutcome {
        match self.api.is_following(user).await {
            Ok(FollowStatus::Following) => {
                debug!("Already following {}", user);
                return ItemOutcome::Skipped;
            }
            Ok(FollowStatus::NotFollowing) => {}
            Err(e) => {
                // No follow call without a confirmed relationship
                warn!("Failed to check relationship with {}: {}", user, e);
                return ItemOutcome::Failed(e);
            }
        }

        match self.api.follow(user).await {
            Ok(()) => {
                debug!("Followed {}", user);
                ItemOutcome::Followed
            }
            Err(e) => {
                warn!("Failed to follow {}: {}", user, e);
                ItemOutcome::Failed(e)
            }
        }
    }

    fn interrupted(&self, stats: FollowStats) -> RunOutcome {
        info!("Follow loop interrupted after {} followers", stats.total());
        let outcome = RunOutcome::Interrupted(stats);
        self.reporter.finished(&outcome);
        outcome
    }
}
