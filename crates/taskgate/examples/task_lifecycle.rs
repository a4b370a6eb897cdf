/*
[INPUT]:  A task reducer and a simulated async task
[OUTPUT]: Console walkthrough of one tracked task lifecycle
[POS]:    Examples - task action demonstration
[UPDATE]: When the task dispatch flow changes
*/

use std::time::Duration;

use serde_json::json;
use taskgate::{StateKey, TaskAction, TaskReducer, TaskStore};
use tracing_subscriber::EnvFilter;

/// Example: Task lifecycle
///
/// This example demonstrates the full task flow:
/// 1. Build a store from a task reducer
/// 2. Subscribe to state changes
/// 3. Dispatch a task action and watch performing -> complete
/// 4. Dispatch again with only_once and observe the short-circuit
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Task Lifecycle Example ===\n");

    let key = StateKey::new("reports.refresh")?;
    let store = TaskStore::new(TaskReducer::new(key.clone()));
    println!("✓ Store created for '{key}'");

    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let slice = changes.borrow_and_update().clone();
            println!(
                "  state change: performing={} complete={}",
                slice.meta.performing, slice.meta.complete
            );
        }
    });

    let action = TaskAction::new(key.clone(), |_| async {
        tokio::time::sleep(Duration::from_millis(120)).await;
        Ok(json!({"rows": 128, "source": "warehouse"}))
    })
    .only_once(true);

    let run = action.perform(&store).await?;
    println!("\n✓ First dispatch: {}", serde_json::to_string_pretty(&run)?);

    // Complete + only_once: this one never invokes the task again.
    let run = action.perform(&store).await?;
    println!("\n✓ Second dispatch: {}", serde_json::to_string_pretty(&run)?);

    let slice = store.state();
    println!(
        "\nFinal slice: complete={} results={}",
        slice.meta.complete, slice.results
    );

    Ok(())
}
