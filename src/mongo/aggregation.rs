use std::time::Instant;

use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::Client;

pub struct AggregationOutcome {
    pub results: Vec<Document>,
    pub execution_time_ms: u64,
}

/// Runs the pipeline exactly as given, no stage validation or rewriting.
/// Elapsed time covers the driver call plus draining the cursor.
pub async fn run_pipeline(
    client: &Client,
    db: &str,
    coll: &str,
    pipeline: Vec<Document>,
) -> mongodb::error::Result<AggregationOutcome> {
    let started = Instant::now();

    let mut cursor = client
        .database(db)
        .collection::<Document>(coll)
        .aggregate(pipeline, None)
        .await?;
    let mut results = Vec::new();
    while let Some(doc) = cursor.try_next().await? {
        results.push(doc);
    }

    Ok(AggregationOutcome {
        results,
        execution_time_ms: millis_since(started),
    })
}

fn millis_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_millis_fit_in_the_wire_field() {
        let started = Instant::now();
        assert!(millis_since(started) < 1_000);
        assert_eq!(u64::try_from(u128::from(u64::MAX) + 1).unwrap_or(u64::MAX), u64::MAX);
    }
}
