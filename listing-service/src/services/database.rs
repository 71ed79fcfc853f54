use crate::models::{
    FavoriteProperties, Feedback, Owner, Property, PropertyAccessLog, PropertyReport,
    ServiceRequest, SubscriptionHistory, SubscriptionPlan, Tenant, User, UserAddress,
    UserProfile, UserSubscription,
};
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for listing-service");

        create_index(&self.users(), doc! { "email": 1 }, "user_email_unique", true).await?;
        create_index(
            &self.subscription_plans(),
            doc! { "plan_type": 1 },
            "plan_type_unique",
            true,
        )
        .await?;
        create_index(
            &self.user_subscriptions(),
            doc! { "subscription_id": 1 },
            "user_subscription_plan_lookup",
            false,
        )
        .await?;
        create_index(
            &self.subscription_history(),
            doc! { "user_id": 1, "recorded_at": -1 },
            "subscription_history_user_lookup",
            false,
        )
        .await?;
        create_index(
            &self.properties(),
            doc! { "user_id": 1 },
            "property_lister_lookup",
            false,
        )
        .await?;
        create_index(
            &self.properties(),
            doc! { "kind": 1, "ad_category": 1 },
            "property_kind_category_lookup",
            false,
        )
        .await?;
        create_index(
            &self.properties(),
            doc! { "locality.city": 1, "locality.locality": 1 },
            "property_locality_lookup",
            false,
        )
        .await?;
        create_index(&self.tenants(), doc! { "owner_id": 1 }, "tenant_owner_lookup", false)
            .await?;
        create_index(&self.owners(), doc! { "email": 1 }, "owner_email_unique", true).await?;
        create_index(
            &self.property_reports(),
            doc! { "property_id": 1 },
            "report_property_lookup",
            false,
        )
        .await?;
        create_index(
            &self.service_requests(),
            doc! { "user_id": 1 },
            "service_request_user_lookup",
            false,
        )
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn properties(&self) -> Collection<Property> {
        self.db.collection("property_detail")
    }

    pub fn subscription_plans(&self) -> Collection<SubscriptionPlan> {
        self.db.collection("subscription_plans")
    }

    pub fn user_subscriptions(&self) -> Collection<UserSubscription> {
        self.db.collection("user_subscription")
    }

    pub fn subscription_history(&self) -> Collection<SubscriptionHistory> {
        self.db.collection("user_subscription_history")
    }

    pub fn access_logs(&self) -> Collection<PropertyAccessLog> {
        self.db.collection("property_access_log")
    }

    pub fn tenants(&self) -> Collection<Tenant> {
        self.db.collection("tenants")
    }

    pub fn owners(&self) -> Collection<Owner> {
        self.db.collection("owners")
    }

    pub fn profiles(&self) -> Collection<UserProfile> {
        self.db.collection("users_profile")
    }

    pub fn addresses(&self) -> Collection<UserAddress> {
        self.db.collection("users_address")
    }

    pub fn favorites(&self) -> Collection<FavoriteProperties> {
        self.db.collection("users_favorites_properties")
    }

    pub fn feedback(&self) -> Collection<Feedback> {
        self.db.collection("users_feedback")
    }

    pub fn property_reports(&self) -> Collection<PropertyReport> {
        self.db.collection("property_reports")
    }

    pub fn service_requests(&self) -> Collection<ServiceRequest> {
        self.db.collection("service_request")
    }

    /// Untyped view of a collection, for aggregation pipelines.
    pub fn raw<T: Send + Sync>(&self, collection: &Collection<T>) -> Collection<Document> {
        self.db.collection(collection.name())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

async fn create_index<T: Send + Sync>(
    collection: &Collection<T>,
    keys: Document,
    name: &str,
    unique: bool,
) -> Result<(), AppError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(
            "Failed to create {} index on {} collection: {}",
            name,
            collection.name(),
            e
        );
        AppError::from(e)
    })?;
    tracing::info!("Created index {} on {}", name, collection.name());
    Ok(())
}

/// True when a write failed on a unique index.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}
