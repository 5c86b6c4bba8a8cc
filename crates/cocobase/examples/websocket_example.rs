/*
[INPUT]:  COCOBASE_API_KEY and a collection name argument
[OUTPUT]: Realtime change events printed to stdout
[POS]:    Examples - realtime subscription
[UPDATE]: When realtime subscription API changes
*/

use std::time::Duration;

use cocobase::*;

/// Example: watch a collection for 60 seconds
#[tokio::main]
async fn main() {
    println!("=== Cocobase Realtime Example ===\n");

    let api_key = std::env::var("COCOBASE_API_KEY").unwrap_or_default();
    let collection = std::env::args().nth(1).unwrap_or_else(|| "posts".to_string());

    let client = match CocobaseClient::new(api_key) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let mut connection = match client.watch_collection(&collection, None).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("✗ Subscription failed: {}", e);
            return;
        }
    };
    println!("✓ Watching {} as {}", collection, connection.name());

    let deadline = tokio::time::sleep(Duration::from_secs(60));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = connection.recv() => match event {
                Some(event) => println!("  {} {}", event.event, event.data.id),
                None => {
                    println!("Connection closed by server");
                    break;
                }
            },
        }
    }

    connection.close().await;
    println!("✓ Done");
}
