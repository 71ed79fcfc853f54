use crate::models::{PropertyAccessLog, SubscriptionHistory, SubscriptionPlan, UserSubscription};
use crate::services::{MongoDb, ServiceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions},
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Persistence used by the subscription accounting unit.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_plan(&self, subscription_id: &str)
        -> Result<Option<SubscriptionPlan>, ServiceError>;

    async fn find_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<UserSubscription>, ServiceError>;

    async fn insert_subscription(&self, subscription: &UserSubscription)
        -> Result<(), ServiceError>;

    /// Overwrites the active plan of an existing subscription in place.
    async fn replace_subscription(
        &self,
        user_id: &str,
        subscription_id: &str,
        updated_on: DateTime<Utc>,
    ) -> Result<(), ServiceError>;

    async fn delete_subscription(&self, user_id: &str) -> Result<bool, ServiceError>;

    async fn append_history(&self, entry: &SubscriptionHistory) -> Result<(), ServiceError>;

    async fn history(&self, user_id: &str) -> Result<Vec<SubscriptionHistory>, ServiceError>;

    async fn find_access_log(
        &self,
        user_id: &str,
    ) -> Result<Option<PropertyAccessLog>, ServiceError>;

    /// Atomically increments the user's view counter if, and only if, it is
    /// below `limit`, creating the counter on first use. Returns the updated
    /// log, or `None` when the limit had already been reached.
    async fn increment_views_within(
        &self,
        user_id: &str,
        property_id: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PropertyAccessLog>, ServiceError>;
}

pub struct MongoSubscriptionStore {
    db: MongoDb,
}

impl MongoSubscriptionStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for MongoSubscriptionStore {
    async fn find_plan(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionPlan>, ServiceError> {
        Ok(self
            .db
            .subscription_plans()
            .find_one(doc! { "_id": subscription_id }, None)
            .await?)
    }

    async fn find_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<UserSubscription>, ServiceError> {
        Ok(self
            .db
            .user_subscriptions()
            .find_one(doc! { "_id": user_id }, None)
            .await?)
    }

    async fn insert_subscription(
        &self,
        subscription: &UserSubscription,
    ) -> Result<(), ServiceError> {
        self.db
            .user_subscriptions()
            .insert_one(subscription, None)
            .await?;
        Ok(())
    }

    async fn replace_subscription(
        &self,
        user_id: &str,
        subscription_id: &str,
        updated_on: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.db
            .user_subscriptions()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "subscription_id": subscription_id,
                    "updated_on": updated_on,
                } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<bool, ServiceError> {
        let result = self
            .db
            .user_subscriptions()
            .delete_one(doc! { "_id": user_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn append_history(&self, entry: &SubscriptionHistory) -> Result<(), ServiceError> {
        self.db
            .subscription_history()
            .insert_one(entry, None)
            .await?;
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<SubscriptionHistory>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "recorded_at": -1 })
            .build();
        let cursor = self
            .db
            .subscription_history()
            .find(doc! { "user_id": user_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_access_log(
        &self,
        user_id: &str,
    ) -> Result<Option<PropertyAccessLog>, ServiceError> {
        Ok(self
            .db
            .access_logs()
            .find_one(doc! { "_id": user_id }, None)
            .await?)
    }

    async fn increment_views_within(
        &self,
        user_id: &str,
        property_id: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PropertyAccessLog>, ServiceError> {
        let logs = self.db.access_logs();

        // Make sure the counter exists so the conditional increment below has
        // something to match. Concurrent first views race on the _id; the loser
        // sees a duplicate key error and simply proceeds.
        let seed = logs
            .update_one(
                doc! { "_id": user_id },
                doc! { "$setOnInsert": { "viewed_count": 0_i64, "last_viewed": now } },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await;
        if let Err(e) = seed {
            if !super::database::is_duplicate_key(&e) {
                return Err(e.into());
            }
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(logs
            .find_one_and_update(
                doc! { "_id": user_id, "viewed_count": { "$lt": limit } },
                doc! {
                    "$inc": { "viewed_count": 1_i64 },
                    "$set": { "property_id": property_id, "last_viewed": now },
                },
                options,
            )
            .await?)
    }
}

/// In-process store with the same semantics as the MongoDB one. Every
/// operation runs under a single lock, so the conditional increment is atomic.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    plans: HashMap<String, SubscriptionPlan>,
    subscriptions: HashMap<String, UserSubscription>,
    history: Vec<SubscriptionHistory>,
    access_logs: HashMap<String, PropertyAccessLog>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_plan(&self, plan: SubscriptionPlan) {
        self.lock()
            .plans
            .insert(plan.subscription_id.clone(), plan);
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_plan(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionPlan>, ServiceError> {
        Ok(self.lock().plans.get(subscription_id).cloned())
    }

    async fn find_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<UserSubscription>, ServiceError> {
        Ok(self.lock().subscriptions.get(user_id).cloned())
    }

    async fn insert_subscription(
        &self,
        subscription: &UserSubscription,
    ) -> Result<(), ServiceError> {
        let mut state = self.lock();
        if state.subscriptions.contains_key(&subscription.user_id) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "duplicate subscription for user {}",
                subscription.user_id
            )));
        }
        state
            .subscriptions
            .insert(subscription.user_id.clone(), subscription.clone());
        Ok(())
    }

    async fn replace_subscription(
        &self,
        user_id: &str,
        subscription_id: &str,
        updated_on: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        if let Some(active) = self.lock().subscriptions.get_mut(user_id) {
            active.subscription_id = subscription_id.to_string();
            active.updated_on = updated_on;
        }
        Ok(())
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<bool, ServiceError> {
        Ok(self.lock().subscriptions.remove(user_id).is_some())
    }

    async fn append_history(&self, entry: &SubscriptionHistory) -> Result<(), ServiceError> {
        self.lock().history.push(entry.clone());
        Ok(())
    }

    async fn history(&self, user_id: &str) -> Result<Vec<SubscriptionHistory>, ServiceError> {
        let mut entries: Vec<_> = self
            .lock()
            .history
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(entries)
    }

    async fn find_access_log(
        &self,
        user_id: &str,
    ) -> Result<Option<PropertyAccessLog>, ServiceError> {
        Ok(self.lock().access_logs.get(user_id).cloned())
    }

    async fn increment_views_within(
        &self,
        user_id: &str,
        property_id: &str,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PropertyAccessLog>, ServiceError> {
        let mut state = self.lock();
        let log = state
            .access_logs
            .entry(user_id.to_string())
            .or_insert_with(|| PropertyAccessLog {
                user_id: user_id.to_string(),
                property_id: None,
                viewed_count: 0,
                last_viewed: now,
            });

        if log.viewed_count >= limit {
            return Ok(None);
        }

        log.viewed_count += 1;
        log.property_id = Some(property_id.to_string());
        log.last_viewed = now;
        Ok(Some(log.clone()))
    }
}
