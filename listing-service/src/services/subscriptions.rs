use crate::models::{
    HistoryChange, PropertyAccessLog, SubscriptionHistory, SubscriptionPlan, UserSubscription,
};
use crate::services::{ServiceError, SubscriptionStore};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use tracing::instrument;

/// Result of a metered view that was allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewReceipt {
    pub viewed_count: i64,
    pub limit: i64,
    pub last_viewed: DateTime<Utc>,
}

impl ViewReceipt {
    pub fn remaining(&self) -> i64 {
        (self.limit - self.viewed_count).max(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
    Created(UserSubscription),
    Changed {
        previous_subscription_id: String,
        current: UserSubscription,
    },
    AlreadySubscribed(UserSubscription),
}

#[derive(Debug, Clone)]
pub struct SubscriptionUsage {
    pub subscription: UserSubscription,
    pub plan: SubscriptionPlan,
    pub access_log: Option<PropertyAccessLog>,
}

impl SubscriptionUsage {
    pub fn viewed_count(&self) -> i64 {
        self.access_log.as_ref().map_or(0, |l| l.viewed_count)
    }
}

/// Subscription accounting: plan assignment with history, and the metered
/// property view counter.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    /// Counts one property view against the caller's plan limit.
    ///
    /// Fails with `SubscriptionNotFound`/`PlanNotFound` when the user has no
    /// usable subscription, `PlanLimitMissing` when the plan has no limit, and
    /// `QuotaExceeded` when the counter already sits at the limit. A rejected
    /// view never changes the counter.
    #[instrument(skip(self))]
    pub async fn record_view(
        &self,
        user_id: &str,
        property_id: &str,
    ) -> Result<ViewReceipt, ServiceError> {
        let subscription = self
            .store
            .find_subscription(user_id)
            .await?
            .ok_or(ServiceError::SubscriptionNotFound)?;

        let plan = self
            .store
            .find_plan(&subscription.subscription_id)
            .await?
            .ok_or(ServiceError::PlanNotFound)?;

        let limit = plan.limits.ok_or_else(|| {
            tracing::error!(plan = %plan.subscription_id, "Subscription plan has no limits");
            ServiceError::PlanLimitMissing(plan.subscription_id.clone())
        })?;

        let updated = if limit > 0 {
            self.store
                .increment_views_within(user_id, property_id, limit, Utc::now())
                .await?
        } else {
            None
        };

        match updated {
            Some(log) => {
                counter!("property_views_total").increment(1);
                tracing::info!(
                    viewed_count = log.viewed_count,
                    limit,
                    "Property view recorded"
                );
                Ok(ViewReceipt {
                    viewed_count: log.viewed_count,
                    limit,
                    last_viewed: log.last_viewed,
                })
            }
            None => {
                counter!("property_view_quota_exceeded_total").increment(1);
                tracing::info!(limit, "Property view rejected, plan limit reached");
                Err(ServiceError::QuotaExceeded { limit })
            }
        }
    }

    /// Assigns `subscription_id` to the user. Switching plans archives the
    /// previous assignment; re-subscribing to the current plan is a no-op.
    #[instrument(skip(self))]
    pub async fn subscribe(
        &self,
        user_id: &str,
        subscription_id: &str,
    ) -> Result<SubscribeOutcome, ServiceError> {
        self.store
            .find_plan(subscription_id)
            .await?
            .ok_or(ServiceError::PlanNotFound)?;

        match self.store.find_subscription(user_id).await? {
            None => {
                let subscription =
                    UserSubscription::new(user_id.to_string(), subscription_id.to_string());
                self.store.insert_subscription(&subscription).await?;
                tracing::info!("User subscribed to plan");
                Ok(SubscribeOutcome::Created(subscription))
            }
            Some(active) if active.subscription_id == subscription_id => {
                Ok(SubscribeOutcome::AlreadySubscribed(active))
            }
            Some(active) => {
                let snapshot = SubscriptionHistory::snapshot(&active, HistoryChange::Replaced);
                self.store.append_history(&snapshot).await?;

                let now = Utc::now();
                self.store
                    .replace_subscription(user_id, subscription_id, now)
                    .await?;

                tracing::info!(
                    previous = %active.subscription_id,
                    "User changed subscription plan"
                );
                Ok(SubscribeOutcome::Changed {
                    current: UserSubscription {
                        user_id: user_id.to_string(),
                        subscription_id: subscription_id.to_string(),
                        created_on: active.created_on,
                        updated_on: now,
                    },
                    previous_subscription_id: active.subscription_id,
                })
            }
        }
    }

    /// Archives and removes the user's active subscription.
    #[instrument(skip(self))]
    pub async fn unsubscribe(&self, user_id: &str) -> Result<SubscriptionHistory, ServiceError> {
        let active = self
            .store
            .find_subscription(user_id)
            .await?
            .ok_or(ServiceError::SubscriptionNotFound)?;

        let entry = SubscriptionHistory::snapshot(&active, HistoryChange::Deleted);
        self.store.append_history(&entry).await?;

        if !self.store.delete_subscription(user_id).await? {
            tracing::warn!("Subscription disappeared before it could be deleted");
        }
        tracing::info!(subscription_id = %active.subscription_id, "User unsubscribed");
        Ok(entry)
    }

    pub async fn usage(&self, user_id: &str) -> Result<SubscriptionUsage, ServiceError> {
        let subscription = self
            .store
            .find_subscription(user_id)
            .await?
            .ok_or(ServiceError::SubscriptionNotFound)?;
        let plan = self
            .store
            .find_plan(&subscription.subscription_id)
            .await?
            .ok_or(ServiceError::PlanNotFound)?;
        let access_log = self.store.find_access_log(user_id).await?;

        Ok(SubscriptionUsage {
            subscription,
            plan,
            access_log,
        })
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<SubscriptionHistory>, ServiceError> {
        self.store.history(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemorySubscriptionStore;

    fn plan(plan_type: &str, limits: Option<i64>) -> SubscriptionPlan {
        let mut plan = SubscriptionPlan::new(plan_type.to_string(), 0, None, Some(99.0));
        plan.limits = limits;
        plan
    }

    fn setup(plans: &[SubscriptionPlan]) -> (Arc<InMemorySubscriptionStore>, SubscriptionService) {
        let store = Arc::new(InMemorySubscriptionStore::new());
        for p in plans {
            store.insert_plan(p.clone());
        }
        let service = SubscriptionService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn first_view_creates_counter_at_one() {
        let basic = plan("basic", Some(3));
        let (store, service) = setup(&[basic.clone()]);
        service.subscribe("u1", &basic.subscription_id).await.unwrap();

        let receipt = service.record_view("u1", "p1").await.unwrap();
        assert_eq!(receipt.viewed_count, 1);
        assert_eq!(receipt.remaining(), 2);

        let log = store.find_access_log("u1").await.unwrap().unwrap();
        assert_eq!(log.viewed_count, 1);
        assert_eq!(log.property_id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn views_beyond_limit_are_rejected_without_incrementing() {
        let basic = plan("basic", Some(2));
        let (store, service) = setup(&[basic.clone()]);
        service.subscribe("u1", &basic.subscription_id).await.unwrap();

        service.record_view("u1", "p1").await.unwrap();
        service.record_view("u1", "p2").await.unwrap();

        for _ in 0..3 {
            let err = service.record_view("u1", "p3").await.unwrap_err();
            assert!(matches!(err, ServiceError::QuotaExceeded { limit: 2 }));
        }

        let log = store.find_access_log("u1").await.unwrap().unwrap();
        assert_eq!(log.viewed_count, 2);
        assert_eq!(log.property_id.as_deref(), Some("p2"));
    }

    #[tokio::test]
    async fn view_without_subscription_is_not_found() {
        let (_, service) = setup(&[]);
        let err = service.record_view("nobody", "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::SubscriptionNotFound));
    }

    #[tokio::test]
    async fn view_with_dangling_plan_is_not_found() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store
            .insert_subscription(&UserSubscription::new("u1".into(), "gone".into()))
            .await
            .unwrap();
        let service = SubscriptionService::new(store);

        let err = service.record_view("u1", "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::PlanNotFound));
    }

    #[tokio::test]
    async fn plan_without_limits_is_an_internal_error() {
        let broken = plan("broken", None);
        let (store, service) = setup(&[broken.clone()]);
        service.subscribe("u1", &broken.subscription_id).await.unwrap();

        let err = service.record_view("u1", "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::PlanLimitMissing(_)));
        assert!(store.find_access_log("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_limit_rejects_first_view() {
        let free = plan("free", Some(0));
        let (store, service) = setup(&[free.clone()]);
        service.subscribe("u1", &free.subscription_id).await.unwrap();

        let err = service.record_view("u1", "p1").await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded { limit: 0 }));
        assert!(store.find_access_log("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_views_never_exceed_limit() {
        let basic = plan("basic", Some(5));
        let (store, service) = setup(&[basic.clone()]);
        service.subscribe("u1", &basic.subscription_id).await.unwrap();

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.record_view("u1", &format!("p{}", i)).await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 5);
        let log = store.find_access_log("u1").await.unwrap().unwrap();
        assert_eq!(log.viewed_count, 5);
    }

    #[tokio::test]
    async fn upgrading_plan_allows_more_views() {
        let basic = plan("basic", Some(1));
        let premium = plan("premium", Some(3));
        let (_, service) = setup(&[basic.clone(), premium.clone()]);

        service.subscribe("u1", &basic.subscription_id).await.unwrap();
        service.record_view("u1", "p1").await.unwrap();
        assert!(service.record_view("u1", "p2").await.is_err());

        service.subscribe("u1", &premium.subscription_id).await.unwrap();
        let receipt = service.record_view("u1", "p2").await.unwrap();
        assert_eq!(receipt.viewed_count, 2);
        assert_eq!(receipt.limit, 3);
    }

    #[tokio::test]
    async fn each_plan_switch_writes_exactly_one_history_record() {
        let basic = plan("basic", Some(1));
        let premium = plan("premium", Some(10));
        let (store, service) = setup(&[basic.clone(), premium.clone()]);

        let created = service.subscribe("u1", &basic.subscription_id).await.unwrap();
        assert!(matches!(created, SubscribeOutcome::Created(_)));
        assert_eq!(store.history_len(), 0);

        let changed = service
            .subscribe("u1", &premium.subscription_id)
            .await
            .unwrap();
        match changed {
            SubscribeOutcome::Changed {
                previous_subscription_id,
                current,
            } => {
                assert_eq!(previous_subscription_id, basic.subscription_id);
                assert_eq!(current.subscription_id, premium.subscription_id);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.history_len(), 1);

        service.subscribe("u1", &basic.subscription_id).await.unwrap();
        assert_eq!(store.history_len(), 2);

        let history = service.history("u1").await.unwrap();
        assert!(history.iter().all(|h| h.change == HistoryChange::Replaced));
        let ids: Vec<_> = history.iter().map(|h| h.history_id.clone()).collect();
        assert_ne!(ids[0], ids[1]);

        let active = store.find_subscription("u1").await.unwrap().unwrap();
        assert_eq!(active.subscription_id, basic.subscription_id);
    }

    #[tokio::test]
    async fn plan_change_keeps_original_subscription_date() {
        let basic = plan("basic", Some(1));
        let premium = plan("premium", Some(10));
        let (store, service) = setup(&[basic.clone(), premium.clone()]);

        let original = match service.subscribe("u1", &basic.subscription_id).await.unwrap() {
            SubscribeOutcome::Created(subscription) => subscription,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let current = match service
            .subscribe("u1", &premium.subscription_id)
            .await
            .unwrap()
        {
            SubscribeOutcome::Changed { current, .. } => current,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(current.created_on, original.created_on);
        assert!(current.updated_on >= original.updated_on);

        let stored = store.find_subscription("u1").await.unwrap().unwrap();
        assert_eq!(stored.created_on, original.created_on);
        assert_eq!(stored.subscription_id, premium.subscription_id);
    }

    #[tokio::test]
    async fn resubscribing_to_same_plan_writes_no_history() {
        let basic = plan("basic", Some(1));
        let (store, service) = setup(&[basic.clone()]);

        service.subscribe("u1", &basic.subscription_id).await.unwrap();
        let again = service.subscribe("u1", &basic.subscription_id).await.unwrap();

        assert!(matches!(again, SubscribeOutcome::AlreadySubscribed(_)));
        assert_eq!(store.history_len(), 0);
    }

    #[tokio::test]
    async fn subscribing_to_unknown_plan_is_not_found() {
        let (store, service) = setup(&[]);
        let err = service.subscribe("u1", "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::PlanNotFound));
        assert!(store.find_subscription("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unsubscribe_archives_once_and_removes_active_record() {
        let basic = plan("basic", Some(1));
        let (store, service) = setup(&[basic.clone()]);
        service.subscribe("u1", &basic.subscription_id).await.unwrap();

        let entry = service.unsubscribe("u1").await.unwrap();
        assert_eq!(entry.change, HistoryChange::Deleted);
        assert_eq!(entry.subscription_id, basic.subscription_id);
        assert_eq!(store.history_len(), 1);
        assert!(store.find_subscription("u1").await.unwrap().is_none());

        let err = service.unsubscribe("u1").await.unwrap_err();
        assert!(matches!(err, ServiceError::SubscriptionNotFound));
        assert_eq!(store.history_len(), 1);
    }

    #[tokio::test]
    async fn usage_reports_plan_and_counter() {
        let basic = plan("basic", Some(4));
        let (_, service) = setup(&[basic.clone()]);
        service.subscribe("u1", &basic.subscription_id).await.unwrap();

        let usage = service.usage("u1").await.unwrap();
        assert_eq!(usage.viewed_count(), 0);

        service.record_view("u1", "p1").await.unwrap();
        let usage = service.usage("u1").await.unwrap();
        assert_eq!(usage.viewed_count(), 1);
        assert_eq!(usage.plan.plan_type, "basic");
    }
}
