//! Collection schemas used by the aggregation pipelines
//!
//! Field names are the document keys clients see; columns come from the migrations.
use query_pipeline::{CollectionSchema, FieldDef};

pub static USERS: CollectionSchema = CollectionSchema {
    name: "users",
    table: "users",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("username", "username").sortable(),
        FieldDef::public("fullName", "full_name").sortable(),
        FieldDef::public("avatar", "avatar"),
        FieldDef::internal("coverImage", "cover_image"),
        FieldDef::internal("email", "email"),
        FieldDef::internal("password", "password_hash"),
        FieldDef::internal("createdAt", "created_at"),
    ],
};

pub static VIDEOS: CollectionSchema = CollectionSchema {
    name: "videos",
    table: "videos",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("owner", "owner_id"),
        FieldDef::public("title", "title").sortable(),
        FieldDef::public("description", "description"),
        FieldDef::public("videoUrl", "video_url"),
        FieldDef::public("thumbnailUrl", "thumbnail_url"),
        FieldDef::public("duration", "duration").sortable(),
        FieldDef::public("isPublished", "is_published"),
        FieldDef::public("createdAt", "created_at").sortable(),
        FieldDef::public("updatedAt", "updated_at").sortable(),
    ],
};

pub static COMMENTS: CollectionSchema = CollectionSchema {
    name: "comments",
    table: "comments",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("content", "content"),
        FieldDef::public("video", "video_id"),
        FieldDef::public("owner", "owner_id"),
        FieldDef::public("createdAt", "created_at").sortable(),
        FieldDef::public("updatedAt", "updated_at").sortable(),
    ],
};

pub static TWEETS: CollectionSchema = CollectionSchema {
    name: "tweets",
    table: "tweets",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("content", "content"),
        FieldDef::public("owner", "owner_id"),
        FieldDef::public("createdAt", "created_at").sortable(),
        FieldDef::public("updatedAt", "updated_at").sortable(),
    ],
};

pub static LIKES: CollectionSchema = CollectionSchema {
    name: "likes",
    table: "likes",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("owner", "owner_id"),
        FieldDef::public("targetKind", "target_kind"),
        FieldDef::public("targetId", "target_id"),
        FieldDef::public("createdAt", "created_at").sortable(),
    ],
};

pub static SUBSCRIPTIONS: CollectionSchema = CollectionSchema {
    name: "subscriptions",
    table: "subscriptions",
    key: "_id",
    fields: &[
        FieldDef::public("_id", "id"),
        FieldDef::public("subscriber", "subscriber_id"),
        FieldDef::public("channel", "channel_id"),
        FieldDef::public("createdAt", "created_at").sortable(),
    ],
};
