/// Tweet service - short text posts on a user's channel
use super::{non_empty, require_text, ListOptions, MAX_TWEET_CHARS};
use crate::db::collections::TWEETS;
use crate::db::{DocumentStore, TweetRepositoryTrait, UserRepositoryTrait};
use crate::error::{AppError, Result};
use crate::middleware::check_tweet_ownership;
use crate::models::{parse_id, Caller, Tweet};
use crate::pipelines;
use query_pipeline::{PageLabels, Paginated, Sort};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const TWEET_LABELS: PageLabels = PageLabels::new("tweets", "totalTweets");

pub struct TweetService {
    tweets: Arc<dyn TweetRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
}

impl TweetService {
    pub fn new(
        tweets: Arc<dyn TweetRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            tweets,
            users,
            documents,
        }
    }

    pub async fn create_tweet(&self, caller: &Caller, content: &str) -> Result<Tweet> {
        let content = require_text(content, "Content", MAX_TWEET_CHARS)?;
        let tweet = self.tweets.insert(caller.user_id, &content).await?;

        info!(tweet_id = %tweet.id, caller = %caller.user_id, "tweet created");
        Ok(tweet)
    }

    pub async fn list_user_tweets(
        &self,
        caller: Option<&Caller>,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let user_id = parse_id(user_id, "user ID")?;
        let sort = Sort::from_params(
            &TWEETS,
            options.sort_by.as_deref(),
            options.sort_type.as_deref(),
            "createdAt",
        )?;

        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let pipeline = pipelines::user_tweets(user_id, caller, sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        non_empty(page.with_labels(TWEET_LABELS), "No tweets found for this user")
    }

    pub async fn update_tweet(&self, caller: &Caller, tweet_id: &str, content: &str) -> Result<Tweet> {
        let tweet_id = parse_id(tweet_id, "tweet ID")?;
        let content = require_text(content, "Content", MAX_TWEET_CHARS)?;

        let existing = self.find_tweet(tweet_id).await?;
        check_tweet_ownership(caller, &existing)?;

        let tweet = self
            .tweets
            .update_content(tweet_id, &content)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))?;

        info!(%tweet_id, caller = %caller.user_id, "tweet updated");
        Ok(tweet)
    }

    pub async fn delete_tweet(&self, caller: &Caller, tweet_id: &str) -> Result<()> {
        let tweet_id = parse_id(tweet_id, "tweet ID")?;

        let existing = self.find_tweet(tweet_id).await?;
        check_tweet_ownership(caller, &existing)?;

        if !self.tweets.delete(tweet_id).await? {
            return Err(AppError::NotFound(
                "Tweet not found or already deleted".to_string(),
            ));
        }

        info!(%tweet_id, caller = %caller.user_id, "tweet deleted");
        Ok(())
    }

    async fn find_tweet(&self, tweet_id: Uuid) -> Result<Tweet> {
        self.tweets
            .find_by_id(tweet_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))
    }
}
