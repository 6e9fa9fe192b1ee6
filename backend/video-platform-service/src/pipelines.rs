//! Aggregation pipelines for every listing and detail view
//!
//! Builders here are pure: they never touch the database, so their stage layout
//! can be validated in unit tests.
use crate::db::collections::{COMMENTS, LIKES, SUBSCRIPTIONS, TWEETS, USERS, VIDEOS};
use crate::models::{Caller, LikeTargetKind};
use query_pipeline::{Lookup, Pipeline, Predicate, Reduce, Sort};
use uuid::Uuid;

/// User fields embedded wherever a user is joined in.
pub const USER_SUMMARY: &[&str] = &["_id", "username", "fullName", "avatar"];

/// Which videos a listing may show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoScope {
    /// Published videos of every channel
    AllPublished,
    /// One channel; drafts included only when the caller owns the channel
    Channel { owner: Uuid, include_drafts: bool },
}

impl VideoScope {
    pub fn for_request(user_id: Option<Uuid>, caller: Option<&Caller>) -> Self {
        match user_id {
            Some(owner) => VideoScope::Channel {
                owner,
                include_drafts: caller.is_some_and(|c| c.user_id == owner),
            },
            None => VideoScope::AllPublished,
        }
    }
}

fn user_summary(local_field: &str, as_field: &str) -> Lookup {
    user_summary_with(local_field, as_field, Vec::new())
}

/// User summary extended with shaped lookups on the joined user.
fn user_summary_with(
    local_field: &str,
    as_field: &str,
    extras: Vec<(Lookup, Reduce)>,
) -> Lookup {
    let mut fields: Vec<String> = USER_SUMMARY.iter().map(|f| f.to_string()).collect();
    let mut lookup = Lookup::new(&USERS, local_field, "_id", as_field);

    for (extra, reduce) in extras {
        let name = extra.as_field.clone();
        lookup = lookup.lookup(extra).shape(name.clone(), reduce);
        fields.push(name);
    }

    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    lookup.project(&fields)
}

fn subscribers_count() -> Lookup {
    Lookup::new(&SUBSCRIPTIONS, "_id", "channel", "subscribersCount")
}

fn likes_count(kind: LikeTargetKind) -> Lookup {
    Lookup::new(&LIKES, "_id", "targetId", "likesCount").match_eq("targetKind", kind.as_str())
}

/// Likes on the document placed by the caller; an anonymous caller matches nothing.
fn liked_by_caller(kind: LikeTargetKind, caller: Option<&Caller>) -> Lookup {
    let by_caller = caller
        .map(|c| vec![Predicate::eq("owner", c.user_id)])
        .unwrap_or_default();

    Lookup::new(&LIKES, "_id", "targetId", "isLiked")
        .match_eq("targetKind", kind.as_str())
        .matching(vec![Predicate::any(by_caller)])
}

/// Published videos, or the caller's own drafts.
fn visible_to(caller: Option<&Caller>) -> Vec<Predicate> {
    let mut visible = vec![Predicate::eq("isPublished", true)];
    if let Some(caller) = caller {
        visible.push(Predicate::eq("owner", caller.user_id));
    }
    vec![Predicate::any(visible)]
}

pub fn video_listing(scope: VideoScope, sort: Sort) -> Pipeline {
    let pipeline = Pipeline::new(&VIDEOS);
    let pipeline = match scope {
        VideoScope::AllPublished => pipeline.match_eq("isPublished", true),
        VideoScope::Channel {
            owner,
            include_drafts: true,
        } => pipeline.match_eq("owner", owner),
        VideoScope::Channel {
            owner,
            include_drafts: false,
        } => pipeline
            .match_eq("owner", owner)
            .match_eq("isPublished", true),
    };

    pipeline
        .lookup(user_summary("owner", "owner"))
        .shape("owner", Reduce::First)
        .sort(sort)
}

/// Single video with engagement figures. Drafts only match for their owner.
pub fn video_detail(video_id: Uuid, caller: Option<&Caller>) -> Pipeline {
    let subscribed_by_caller = caller
        .map(|c| vec![Predicate::eq("subscriber", c.user_id)])
        .unwrap_or_default();

    let owner = user_summary_with(
        "owner",
        "owner",
        vec![
            (subscribers_count(), Reduce::Size),
            (
                Lookup::new(&SUBSCRIPTIONS, "_id", "channel", "isSubscribed")
                    .matching(vec![Predicate::any(subscribed_by_caller)]),
                Reduce::Exists,
            ),
        ],
    );

    Pipeline::new(&VIDEOS)
        .match_eq("_id", video_id)
        .matching(visible_to(caller))
        .lookup(owner)
        .shape("owner", Reduce::First)
        .lookup(likes_count(LikeTargetKind::Video))
        .shape("likesCount", Reduce::Size)
        .lookup(liked_by_caller(LikeTargetKind::Video, caller))
        .shape("isLiked", Reduce::Exists)
}

pub fn video_comments(video_id: Uuid, caller: Option<&Caller>, sort: Sort) -> Pipeline {
    Pipeline::new(&COMMENTS)
        .match_eq("video", video_id)
        .lookup(user_summary("owner", "owner"))
        .shape("owner", Reduce::First)
        .lookup(likes_count(LikeTargetKind::Comment))
        .shape("likesCount", Reduce::Size)
        .lookup(liked_by_caller(LikeTargetKind::Comment, caller))
        .shape("isLiked", Reduce::Exists)
        .sort(sort)
}

pub fn user_tweets(owner_id: Uuid, caller: Option<&Caller>, sort: Sort) -> Pipeline {
    Pipeline::new(&TWEETS)
        .match_eq("owner", owner_id)
        .lookup(user_summary("owner", "owner"))
        .shape("owner", Reduce::First)
        .lookup(likes_count(LikeTargetKind::Tweet))
        .shape("likesCount", Reduce::Size)
        .lookup(liked_by_caller(LikeTargetKind::Tweet, caller))
        .shape("isLiked", Reduce::Exists)
        .sort(sort)
}

/// Subscribers of a channel, each flagged with whether the channel subscribes back.
pub fn channel_subscribers(channel_id: Uuid, sort: Sort) -> Pipeline {
    let subscriber = user_summary_with(
        "subscriber",
        "subscriber",
        vec![
            (subscribers_count(), Reduce::Size),
            (
                Lookup::new(&SUBSCRIPTIONS, "_id", "channel", "subscribedToSubscriber")
                    .match_eq("subscriber", channel_id),
                Reduce::Exists,
            ),
        ],
    );

    Pipeline::new(&SUBSCRIPTIONS)
        .match_eq("channel", channel_id)
        .lookup(subscriber)
        .unwind("subscriber")
        .project(&["_id", "subscriber", "createdAt"])
        .sort(sort)
}

pub fn subscribed_channels(subscriber_id: Uuid, sort: Sort) -> Pipeline {
    let channel = user_summary_with(
        "channel",
        "channel",
        vec![(subscribers_count(), Reduce::Size)],
    );

    Pipeline::new(&SUBSCRIPTIONS)
        .match_eq("subscriber", subscriber_id)
        .lookup(channel)
        .unwind("channel")
        .project(&["_id", "channel", "createdAt"])
        .sort(sort)
}

/// Videos the caller liked that are still visible to them, newest like first.
pub fn liked_videos(caller: &Caller, sort: Sort) -> Pipeline {
    let video = Lookup::new(&VIDEOS, "targetId", "_id", "video")
        .matching(visible_to(Some(caller)))
        .lookup(user_summary("owner", "owner"))
        .shape("owner", Reduce::First);

    Pipeline::new(&LIKES)
        .match_eq("owner", caller.user_id)
        .match_eq("targetKind", LikeTargetKind::Video.as_str())
        .lookup(video)
        .unwind("video")
        .project(&["_id", "video", "createdAt"])
        .sort(sort)
}
