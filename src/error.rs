use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FollowBotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("{0} cannot be empty")]
    MissingInput(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitHubError {
    #[error("Token is invalid or expired")]
    CredentialInvalid,

    #[error("User '{user}' not found")]
    TargetNotFound { user: String },

    #[error("Request forbidden, the rate limit may have been hit")]
    RateLimited,

    #[error("Cannot connect to GitHub: {0}")]
    Transport(String),

    #[error("GitHub returned error code {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl From<reqwest::Error> for GitHubError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            GitHubError::InvalidResponse(error.to_string())
        } else {
            GitHubError::Transport(error.to_string())
        }
    }
}

/// Remediation hints printed alongside fatal errors
pub struct ErrorRecovery;

impl ErrorRecovery {
    /// Human-readable remediation steps for a failure
    pub fn remediation(error: &FollowBotError) -> &'static [&'static str] {
        match error {
            FollowBotError::GitHub(GitHubError::CredentialInvalid) => &[
                "1. Go to https://github.com/settings/tokens",
                "2. Click 'Generate new token (classic)'",
                "3. Check the 'user:follow' permission",
                "4. Copy the new token and try again",
            ],
            FollowBotError::GitHub(GitHubError::TargetNotFound { .. }) => {
                &["Check the spelling and try again."]
            }
            FollowBotError::GitHub(GitHubError::RateLimited) => {
                &["You may have hit the rate limit. Wait an hour and try again."]
            }
            FollowBotError::GitHub(GitHubError::Transport(_)) => {
                &["Check your internet connection and try again."]
            }
            FollowBotError::Config(_) => {
                &["Check your configuration file and FOLLOWBOT_* environment variables."]
            }
            FollowBotError::MissingInput(_) => &["Provide a value and run the bot again."],
            _ => &[
                "1. Make sure you have an internet connection",
                "2. Check that your token is valid",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followbot_error_display() {
        let config_error = ConfigError::MissingRequired("github.api_url".to_string());
        let error = FollowBotError::Config(config_error);
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("github.api_url"));

        let error = FollowBotError::MissingInput("Token");
        assert_eq!(error.to_string(), "Token cannot be empty");
    }

    #[test]
    fn test_github_error_variants() {
        let not_found = GitHubError::TargetNotFound {
            user: "octocat".to_string(),
        };
        assert_eq!(not_found.to_string(), "User 'octocat' not found");

        let status = GitHubError::UnexpectedStatus { status: 502 };
        assert!(status.to_string().contains("502"));

        assert!(GitHubError::RateLimited.to_string().contains("rate limit"));
        assert!(GitHubError::CredentialInvalid
            .to_string()
            .contains("invalid or expired"));
    }

    #[test]
    fn test_error_recovery_remediation() {
        let hints = ErrorRecovery::remediation(&FollowBotError::GitHub(
            GitHubError::CredentialInvalid,
        ));
        assert!(hints.iter().any(|h| h.contains("user:follow")));

        let hints =
            ErrorRecovery::remediation(&FollowBotError::GitHub(GitHubError::RateLimited));
        assert!(hints[0].contains("Wait an hour"));

        let hints = ErrorRecovery::remediation(&FollowBotError::GitHub(GitHubError::Transport(
            "dns".to_string(),
        )));
        assert!(hints[0].contains("internet connection"));
    }

    #[test]
    fn test_error_conversion_from_std_errors() {
        let io_error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stdin closed");
        let error = FollowBotError::from(io_error);
        assert!(matches!(error, FollowBotError::Io(_)));

        let error = FollowBotError::from(GitHubError::RateLimited);
        match error {
            FollowBotError::GitHub(inner) => assert_eq!(inner, GitHubError::RateLimited),
            _ => panic!("Expected GitHub error variant"),
        }
    }
}
