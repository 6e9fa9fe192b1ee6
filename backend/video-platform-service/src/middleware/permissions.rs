/// Ownership checks for videos, comments and tweets
///
/// Only the owner may modify a resource. Comment deletion is the one exception:
/// the owner of the video a comment sits under may delete it too.
use crate::error::AppError;
use crate::models::{Caller, Comment, Tweet, Video};
use uuid::Uuid;

/// Result type for permission checks
pub type PermissionResult = Result<(), AppError>;

pub fn check_video_ownership(caller: &Caller, video: &Video) -> PermissionResult {
    if video.owner == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this video".to_string(),
        ))
    }
}

/// Only the author can edit a comment
pub fn check_comment_update(caller: &Caller, comment: &Comment) -> PermissionResult {
    if comment.owner == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to edit this comment".to_string(),
        ))
    }
}

/// The author or the owner of the video may delete a comment
pub fn check_comment_deletion(
    caller: &Caller,
    comment: &Comment,
    video_owner_id: Uuid,
) -> PermissionResult {
    if comment.owner == caller.user_id || video_owner_id == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to delete this comment".to_string(),
        ))
    }
}

pub fn check_tweet_ownership(caller: &Caller, tweet: &Tweet) -> PermissionResult {
    if tweet.owner == caller.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this tweet".to_string(),
        ))
    }
}
