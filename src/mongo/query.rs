use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::FindOptions;
use mongodb::Client;

/// Page size applied when the request leaves `limit` unset.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

pub struct Page {
    pub documents: Vec<Document>,
    /// Full matching count under the filter alone, uncapped by limit/skip.
    pub total: u64,
}

pub async fn find_page(
    client: &Client,
    db: &str,
    coll: &str,
    filter: Document,
    projection: Option<Document>,
    sort: Option<Document>,
    limit: i64,
    skip: u64,
) -> mongodb::error::Result<Page> {
    let collection = client.database(db).collection::<Document>(coll);

    let options = FindOptions::builder()
        .projection(projection)
        .sort(sort)
        .limit(limit)
        .skip(skip)
        .build();

    let mut cursor = collection.find(filter.clone(), options).await?;
    let mut documents = Vec::new();
    while let Some(doc) = cursor.try_next().await? {
        documents.push(doc);
    }

    let total = collection.count_documents(filter, None).await?;
    Ok(Page { documents, total })
}
