use crate::dtos::admin::{PlanUsage, SubscriptionOverview};
use crate::dtos::property::CategoryCount;
use crate::services::MongoDb;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use service_core::error::AppError;

/// `$sum` yields Int32 or Int64 depending on magnitude.
pub fn bson_count(document: &Document, key: &str) -> i64 {
    match document.get(key) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

/// Escapes regex metacharacters so user input matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive whole-value match.
pub fn exact_ci(value: &str) -> Document {
    doc! { "$regex": format!("^{}$", escape_regex(value.trim())), "$options": "i" }
}

/// Listing counts grouped by ad category for properties matching `filter`.
pub async fn count_properties_by_category(
    db: &MongoDb,
    filter: Document,
) -> Result<Vec<CategoryCount>, AppError> {
    let pipeline = vec![
        doc! { "$match": filter },
        doc! { "$group": { "_id": "$ad_category", "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ];

    let cursor = db
        .raw(&db.properties())
        .aggregate(pipeline, None)
        .await?;
    let rows: Vec<Document> = cursor.try_collect().await?;

    Ok(rows
        .iter()
        .map(|row| CategoryCount {
            ad_category: row.get_str("_id").unwrap_or("unknown").to_string(),
            count: bson_count(row, "count"),
        })
        .collect())
}

/// Subscriber count per plan type. Subscriptions whose plan no longer
/// exists are grouped under `unknown`.
pub async fn subscribers_by_plan(db: &MongoDb) -> Result<Vec<PlanUsage>, AppError> {
    let pipeline = vec![
        doc! { "$group": { "_id": "$subscription_id", "subscribers": { "$sum": 1 } } },
        doc! { "$lookup": {
            "from": db.subscription_plans().name(),
            "localField": "_id",
            "foreignField": "_id",
            "as": "plan",
        } },
        doc! { "$project": {
            "subscribers": 1,
            "plan_type": { "$ifNull": [{ "$arrayElemAt": ["$plan.plan_type", 0] }, "unknown"] },
        } },
        doc! { "$sort": { "plan_type": 1 } },
    ];

    let rows: Vec<Document> = db
        .raw(&db.user_subscriptions())
        .aggregate(pipeline, None)
        .await?
        .try_collect()
        .await?;

    Ok(rows
        .iter()
        .map(|row| PlanUsage {
            plan_type: row.get_str("plan_type").unwrap_or("unknown").to_string(),
            subscribers: bson_count(row, "subscribers"),
        })
        .collect())
}

/// Every active subscription joined with its plan, user and view counter.
pub async fn subscription_overview(db: &MongoDb) -> Result<Vec<SubscriptionOverview>, AppError> {
    let pipeline = vec![
        doc! { "$lookup": {
            "from": db.subscription_plans().name(),
            "localField": "subscription_id",
            "foreignField": "_id",
            "as": "plan",
        } },
        doc! { "$lookup": {
            "from": db.users().name(),
            "localField": "_id",
            "foreignField": "_id",
            "as": "user",
        } },
        doc! { "$lookup": {
            "from": db.access_logs().name(),
            "localField": "_id",
            "foreignField": "_id",
            "as": "access",
        } },
        doc! { "$sort": { "updated_on": -1 } },
    ];

    let rows: Vec<Document> = db
        .raw(&db.user_subscriptions())
        .aggregate(pipeline, None)
        .await?
        .try_collect()
        .await?;

    Ok(rows.iter().filter_map(overview_row).collect())
}

fn first_joined<'a>(row: &'a Document, key: &str) -> Option<&'a Document> {
    row.get_array(key)
        .ok()
        .and_then(|joined| joined.first())
        .and_then(Bson::as_document)
}

fn overview_row(row: &Document) -> Option<SubscriptionOverview> {
    let plan = first_joined(row, "plan");
    let user = first_joined(row, "user");
    let access = first_joined(row, "access");

    Some(SubscriptionOverview {
        user_id: row.get_str("_id").ok()?.to_string(),
        email: user.and_then(|u| u.get_str("email").ok()).map(str::to_string),
        name: user.and_then(|u| u.get_str("name").ok()).map(str::to_string),
        subscription_id: row.get_str("subscription_id").ok()?.to_string(),
        plan_type: plan
            .and_then(|p| p.get_str("plan_type").ok())
            .map(str::to_string),
        limits: plan.and_then(|p| match p.get("limits") {
            Some(Bson::Int32(n)) => Some(i64::from(*n)),
            Some(Bson::Int64(n)) => Some(*n),
            _ => None,
        }),
        viewed_count: access.map_or(0, |a| bson_count(a, "viewed_count")),
        created_on: row.get_datetime("created_on").ok()?.to_chrono(),
        updated_on: row.get_datetime("updated_on").ok()?.to_chrono(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accept_any_integer_width() {
        let row = doc! { "a": 3_i32, "b": 5_000_000_000_i64, "c": "x" };
        assert_eq!(bson_count(&row, "a"), 3);
        assert_eq!(bson_count(&row, "b"), 5_000_000_000);
        assert_eq!(bson_count(&row, "c"), 0);
        assert_eq!(bson_count(&row, "missing"), 0);
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("a.b*(c)"), "a\\.b\\*\\(c\\)");
        let filter = exact_ci(" Bengaluru ");
        assert_eq!(filter.get_str("$regex").unwrap(), "^Bengaluru$");
    }

    #[test]
    fn overview_row_reads_joined_documents() {
        let now = mongodb::bson::DateTime::now();
        let row = doc! {
            "_id": "u1",
            "subscription_id": "p1",
            "created_on": now,
            "updated_on": now,
            "plan": [{ "_id": "p1", "plan_type": "gold", "limits": 25_i64 }],
            "user": [{ "_id": "u1", "email": "u1@example.com", "name": "Asha" }],
            "access": [{ "_id": "u1", "viewed_count": 4_i32 }],
        };

        let overview = overview_row(&row).unwrap();
        assert_eq!(overview.plan_type.as_deref(), Some("gold"));
        assert_eq!(overview.limits, Some(25));
        assert_eq!(overview.viewed_count, 4);
        assert_eq!(overview.email.as_deref(), Some("u1@example.com"));
    }

    #[test]
    fn overview_row_tolerates_missing_joins() {
        let now = mongodb::bson::DateTime::now();
        let row = doc! {
            "_id": "u2",
            "subscription_id": "gone",
            "created_on": now,
            "updated_on": now,
            "plan": [],
            "user": [],
            "access": [],
        };

        let overview = overview_row(&row).unwrap();
        assert!(overview.plan_type.is_none());
        assert!(overview.limits.is_none());
        assert_eq!(overview.viewed_count, 0);
    }
}
