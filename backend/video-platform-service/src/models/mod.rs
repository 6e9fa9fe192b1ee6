/// Data models for the video platform service
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod ids;

pub use ids::parse_id;

/// The authenticated user on whose behalf an operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    /// Seconds, rounded to two decimals
    pub duration: f64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a video about to be inserted; `is_published` starts false.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
}

/// Partial update of a video; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl VideoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.thumbnail_url.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: String,
    #[sqlx(rename = "video_id")]
    pub video: Uuid,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment together with the owner of the video it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithVideoOwner {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub video_owner_id: Uuid,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: String,
    #[sqlx(rename = "owner_id")]
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of resource a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTargetKind {
    Video,
    Comment,
    Tweet,
}

impl LikeTargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTargetKind::Video => "video",
            LikeTargetKind::Comment => "comment",
            LikeTargetKind::Tweet => "tweet",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "video" => Some(LikeTargetKind::Video),
            "comment" => Some(LikeTargetKind::Comment),
            "tweet" => Some(LikeTargetKind::Tweet),
            _ => None,
        }
    }
}

impl std::fmt::Display for LikeTargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one liked resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "targetId", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl LikeTarget {
    pub fn new(kind: LikeTargetKind, id: Uuid) -> Self {
        match kind {
            LikeTargetKind::Video => LikeTarget::Video(id),
            LikeTargetKind::Comment => LikeTarget::Comment(id),
            LikeTargetKind::Tweet => LikeTarget::Tweet(id),
        }
    }

    pub fn kind(&self) -> LikeTargetKind {
        match self {
            LikeTarget::Video(_) => LikeTargetKind::Video,
            LikeTarget::Comment(_) => LikeTargetKind::Comment,
            LikeTarget::Tweet(_) => LikeTargetKind::Tweet,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) | LikeTarget::Tweet(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub owner: Uuid,
    pub target: LikeTarget,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[sqlx(rename = "subscriber_id")]
    pub subscriber: Uuid,
    #[sqlx(rename = "channel_id")]
    pub channel: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a toggle; carries the row that was inserted or removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Toggled<T> {
    Added(T),
    Removed(T),
}

impl<T> Toggled<T> {
    pub fn is_added(&self) -> bool {
        matches!(self, Toggled::Added(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Toggled::Added(_) => "added",
            Toggled::Removed(_) => "removed",
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Toggled::Added(v) | Toggled::Removed(v) => v,
        }
    }
}
