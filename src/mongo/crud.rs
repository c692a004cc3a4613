//! Single-document mutations. Update and delete are deliberately
//! first-match-only; callers depend on at-most-one-document-affected.

use mongodb::bson::{doc, Bson, Document};
use mongodb::Client;

pub async fn insert_one(
    client: &Client,
    db: &str,
    coll: &str,
    document: Document,
) -> mongodb::error::Result<Bson> {
    let result = client
        .database(db)
        .collection::<Document>(coll)
        .insert_one(document, None)
        .await?;
    Ok(result.inserted_id)
}

/// Field-level replacement: only the named fields are overwritten.
pub async fn update_one(
    client: &Client,
    db: &str,
    coll: &str,
    filter: Document,
    update: Document,
) -> mongodb::error::Result<u64> {
    let result = client
        .database(db)
        .collection::<Document>(coll)
        .update_one(filter, doc! { "$set": update }, None)
        .await?;
    Ok(result.modified_count)
}

pub async fn delete_one(
    client: &Client,
    db: &str,
    coll: &str,
    filter: Document,
) -> mongodb::error::Result<u64> {
    let result = client
        .database(db)
        .collection::<Document>(coll)
        .delete_one(filter, None)
        .await?;
    Ok(result.deleted_count)
}
