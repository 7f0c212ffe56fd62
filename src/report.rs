use crate::follower::{FollowStats, ItemOutcome, RunOutcome};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BANNER_WIDTH: usize = 50;

/// Observer for the follow pipeline; never influences control flow
pub trait Reporter {
    fn listing_started(&self, _target: &str) {}
    fn page_fetched(&self, _page: u32, _total: usize) {}
    fn follow_started(&self, _total: usize) {}
    fn item(&self, index: usize, total: usize, user: &str, outcome: &ItemOutcome);
    fn finished(&self, outcome: &RunOutcome);
}

/// Human-readable status lines on stdout with a progress bar on stderr
pub struct ConsoleReporter {
    progress: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }

    /// Print a line without tearing the progress bar
    fn line(&self, text: String) {
        self.progress.suspend(|| println!("{text}"));
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

pub fn item_line(index: usize, total: usize, user: &str, outcome: &ItemOutcome) -> String {
    match outcome {
        ItemOutcome::Followed => format!("[{index}/{total}] ✅ Followed {user}"),
        ItemOutcome::Skipped => format!("[{index}/{total}] ⏭️  Already following {user}"),
        ItemOutcome::Failed(e) => format!("[{index}/{total}] ❌ Failed to follow {user}: {e}"),
    }
}

pub fn summary_lines(stats: &FollowStats) -> [String; 3] {
    [
        format!("✅ Successfully followed: {}", stats.followed),
        format!("⏭️  Skipped (already following): {}", stats.skipped),
        format!("❌ Errors: {}", stats.errored),
    ]
}

impl Reporter for ConsoleReporter {
    fn listing_started(&self, target: &str) {
        self.line(format!("📥 Fetching followers of '{target}'..."));
    }

    fn page_fetched(&self, page: u32, total: usize) {
        self.line(format!("   Page {page} - Total followers found: {total}"));
    }

    fn follow_started(&self, total: usize) {
        self.line(format!("\n✅ Found {total} followers to process"));
        self.line("🚀 Starting to follow users (this may take a while)...\n".to_string());

        self.progress.set_length(total as u64);
        self.progress.set_position(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            self.progress.set_style(style.progress_chars("#>-"));
        }
        self.progress.set_draw_target(ProgressDrawTarget::stderr());
    }

    fn item(&self, index: usize, total: usize, user: &str, outcome: &ItemOutcome) {
        self.line(item_line(index, total, user, outcome));
        self.progress.set_position(index as u64);
    }

    fn finished(&self, outcome: &RunOutcome) {
        self.progress.finish_and_clear();

        let stats = outcome.stats();
        let mut lines = Vec::new();
        match outcome {
            RunOutcome::Completed(_) => {
                lines.push(String::new());
                lines.push(banner("🎉 Bot Finished!"));
            }
            RunOutcome::Interrupted(_) => {
                lines.push("\n⚠️  Bot stopped by user (Ctrl+C pressed)".to_string());
                lines.push("Progress so far:".to_string());
            }
        }
        lines.extend(summary_lines(&stats));
        if !outcome.is_interrupted() {
            lines.push("=".repeat(BANNER_WIDTH));
        }

        for line in lines {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitHubError;

    #[test]
    fn test_item_line_glyphs() {
        assert_eq!(
            item_line(1, 3, "octocat", &ItemOutcome::Followed),
            "[1/3] ✅ Followed octocat"
        );
        assert!(item_line(2, 3, "hubot", &ItemOutcome::Skipped).contains("Already following hubot"));

        let failed = item_line(
            3,
            3,
            "ghost",
            &ItemOutcome::Failed(GitHubError::UnexpectedStatus { status: 404 }),
        );
        assert!(failed.starts_with("[3/3] ❌"));
        assert!(failed.contains("404"));
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&FollowStats {
            followed: 5,
            skipped: 2,
            errored: 1,
        });
        assert!(lines[0].ends_with(": 5"));
        assert!(lines[1].ends_with(": 2"));
        assert!(lines[2].ends_with(": 1"));
    }

    #[test]
    fn test_banner() {
        let banner = banner("title");
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), BANNER_WIDTH);
        assert_eq!(lines[1], "title");
    }

    #[test]
    fn test_console_reporter_runs_without_terminal() {
        let reporter = ConsoleReporter::new();
        reporter.listing_started("octocat");
        reporter.page_fetched(1, 100);
        reporter.follow_started(2);
        reporter.item(1, 2, "a", &ItemOutcome::Followed);
        reporter.item(2, 2, "b", &ItemOutcome::Skipped);
        reporter.finished(&RunOutcome::Completed(FollowStats {
            followed: 1,
            skipped: 1,
            errored: 0,
        }));
    }
}
