//! One-to-one proxies over the server's administrative commands.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::results::CollectionType;
use mongodb::Client;
use serde::Serialize;

/// Collection created so a "new database" materializes immediately; MongoDB
/// itself only creates databases on first write.
const SEED_COLLECTION: &str = "placeholder";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSummary {
    pub name: String,
    pub size_on_disk: u64,
}

#[derive(Debug, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub async fn list_databases(client: &Client) -> mongodb::error::Result<Vec<DatabaseSummary>> {
    let specs = client.list_databases(None, None).await?;
    Ok(specs
        .into_iter()
        .map(|spec| DatabaseSummary {
            name: spec.name,
            size_on_disk: spec.size_on_disk,
        })
        .collect())
}

pub async fn list_collections(
    client: &Client,
    db: &str,
) -> mongodb::error::Result<Vec<CollectionSummary>> {
    let mut cursor = client.database(db).list_collections(None, None).await?;
    let mut collections = Vec::new();
    while let Some(spec) = cursor.try_next().await? {
        collections.push(CollectionSummary {
            name: spec.name,
            kind: collection_type_name(&spec.collection_type),
        });
    }
    collections.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(collections)
}

fn collection_type_name(collection_type: &CollectionType) -> String {
    match collection_type {
        CollectionType::View => "view",
        CollectionType::Timeseries => "timeseries",
        _ => "collection",
    }
    .to_string()
}

pub async fn collection_stats(
    client: &Client,
    db: &str,
    coll: &str,
) -> mongodb::error::Result<Document> {
    let stats = client
        .database(db)
        .run_command(doc! { "collStats": coll }, None)
        .await?;
    Ok(trim_collection_stats(stats))
}

/// Keep only the fields the dashboard contract names.
fn trim_collection_stats(stats: Document) -> Document {
    let mut trimmed = Document::new();
    for key in [
        "count",
        "size",
        "avgObjSize",
        "storageSize",
        "totalIndexSize",
        "indexSizes",
    ] {
        if let Some(value) = stats.get(key) {
            trimmed.insert(key, value.clone());
        }
    }
    trimmed
}

pub async fn database_stats(client: &Client, db: &str) -> mongodb::error::Result<Document> {
    client
        .database(db)
        .run_command(doc! { "dbStats": 1 }, None)
        .await
}

pub async fn create_collection(
    client: &Client,
    db: &str,
    coll: &str,
) -> mongodb::error::Result<()> {
    client.database(db).create_collection(coll, None).await
}

pub async fn drop_collection(client: &Client, db: &str, coll: &str) -> mongodb::error::Result<()> {
    client
        .database(db)
        .collection::<Document>(coll)
        .drop(None)
        .await
}

pub async fn create_database(client: &Client, db: &str) -> mongodb::error::Result<()> {
    client
        .database(db)
        .create_collection(SEED_COLLECTION, None)
        .await
}

pub async fn drop_database(client: &Client, db: &str) -> mongodb::error::Result<()> {
    client.database(db).drop(None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_are_trimmed_to_the_contract_fields() {
        let raw = doc! {
            "ns": "db.coll",
            "count": 12,
            "size": 4096,
            "avgObjSize": 341,
            "storageSize": 8192,
            "totalIndexSize": 4096,
            "indexSizes": { "_id_": 4096 },
            "wiredTiger": { "uri": "statistics:table:..." },
        };
        let trimmed = trim_collection_stats(raw);
        assert_eq!(trimmed.len(), 6);
        assert!(trimmed.get("ns").is_none());
        assert!(trimmed.get("wiredTiger").is_none());
        assert_eq!(trimmed.get_i32("count").unwrap(), 12);
    }

    #[test]
    fn database_summaries_serialize_with_camel_case_size() {
        let summary = DatabaseSummary {
            name: "app".to_string(),
            size_on_disk: 4096,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "app", "sizeOnDisk": 4096})
        );
    }

    #[test]
    fn view_and_timeseries_types_are_named() {
        assert_eq!(collection_type_name(&CollectionType::View), "view");
        assert_eq!(
            collection_type_name(&CollectionType::Timeseries),
            "timeseries"
        );
        assert_eq!(
            collection_type_name(&CollectionType::Collection),
            "collection"
        );
    }
}
