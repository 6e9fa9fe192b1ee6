/// Resource operations
///
/// Services validate client input, check ownership and then talk to the
/// repositories and the document store. Identifiers arrive as raw strings and are
/// parsed here, so a malformed id never reaches storage.
pub mod comments;
pub mod likes;
pub mod subscriptions;
pub mod tweets;
pub mod videos;

pub use comments::CommentService;
pub use likes::LikeService;
pub use subscriptions::SubscriptionService;
pub use tweets::TweetService;
pub use videos::{PublishVideo, UpdateVideo, VideoService};

use crate::error::{AppError, Result};
use query_pipeline::{PageRequest, Paginated};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
pub const MAX_COMMENT_CHARS: usize = 2000;
pub const MAX_TWEET_CHARS: usize = 280;

/// Paging and sorting options of a listing request
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page: PageRequest,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

impl ListOptions {
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, sort_by: Option<String>, sort_type: Option<String>) -> Self {
        self.sort_by = sort_by;
        self.sort_type = sort_type;
        self
    }
}

/// Trimmed, non-empty text of at most `max_chars` characters.
pub(crate) fn require_text(raw: &str, what: &str, max_chars: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{what} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{what} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like `require_text`, for fields of a partial update.
pub(crate) fn optional_text(
    raw: Option<&str>,
    what: &str,
    max_chars: usize,
) -> Result<Option<String>> {
    raw.map(|value| require_text(value, what, max_chars))
        .transpose()
}

/// Listings over an empty set are reported as not found; an out-of-range page
/// over a non-empty set is not.
pub(crate) fn non_empty<T>(page: Paginated<T>, message: &str) -> Result<Paginated<T>> {
    if page.is_empty_set() {
        Err(AppError::NotFound(message.to_string()))
    } else {
        Ok(page)
    }
}
