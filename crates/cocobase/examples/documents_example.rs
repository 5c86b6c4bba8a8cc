/*
[INPUT]:  COCOBASE_API_KEY and an optional COCOBASE_BASE_URL
[OUTPUT]: Created, filtered and deleted documents printed to stdout
[POS]:    Examples - document CRUD and query builder
[UPDATE]: When document endpoints or query builder change
*/

use cocobase::*;
use serde_json::json;

/// Example: document CRUD
///
/// 1. Create a document
/// 2. List documents with a filter
/// 3. Update and delete it
#[tokio::main]
async fn main() {
    println!("=== Cocobase Documents Example ===\n");

    let api_key = std::env::var("COCOBASE_API_KEY").unwrap_or_default();
    let base_url =
        std::env::var("COCOBASE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let client = match CocobaseClient::with_config(ClientConfig::new(api_key).with_base_url(base_url)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ Client created for {}", client.base_url());

    let created = match client
        .create_document("posts", &json!({"title": "Hello", "status": "draft", "views": 0}))
        .await
    {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("✗ Create failed: {}", e);
            return;
        }
    };
    println!("✓ Created document {}", created.id);

    let query = QueryBuilder::new()
        .eq("status", "draft")
        .or()
        .contains("title", "hello")
        .contains("title", "world")
        .done()
        .recent()
        .limit(5);
    println!("  Query: {}", query);

    match client.list_documents("posts", Some(&query)).await {
        Ok(docs) => {
            println!("✓ {} matching documents", docs.len());
            for doc in docs {
                println!("  - {} {}", doc.id, serde_json::Value::Object(doc.data));
            }
        }
        Err(e) => eprintln!("✗ List failed: {}", e),
    }

    match client
        .update_document("posts", &created.id, &json!({"status": "published"}))
        .await
    {
        Ok(doc) => println!("✓ Updated: {}", serde_json::Value::Object(doc.data)),
        Err(e) => eprintln!("✗ Update failed: {}", e),
    }

    match client.delete_document("posts", &created.id).await {
        Ok(()) => println!("✓ Deleted {}", created.id),
        Err(e) => eprintln!("✗ Delete failed: {}", e),
    }
}
