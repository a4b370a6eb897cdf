/*
[INPUT]:  A check reducer, YAML-configured options, and a gated task
[OUTPUT]: Console walkthrough of the check-then-task workflow
[POS]:    Examples - check action demonstration
[UPDATE]: When gating options or the workflow change
*/

use std::time::Duration;

use serde_json::json;
use taskgate::{CheckAction, CheckOptions, CheckReducer, StateKey, TaskStore};
use tracing_subscriber::EnvFilter;

const OPTIONS_YAML: &str = r#"
checkOnlyOnce: true
autoPerformTask: true
taskOnlyOnce: true
"#;

/// Example: Check-gated task
///
/// This example demonstrates the two-step workflow:
/// 1. Load CheckOptions from YAML
/// 2. Build a store from a check reducer (`<key>.check` / `<key>.task`)
/// 3. Dispatch the check action: check passes, task auto-runs
/// 4. Dispatch again: checkOnlyOnce short-circuits the whole workflow
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Check Gate Example ===\n");

    let options: CheckOptions = serde_yaml::from_str(OPTIONS_YAML)?;
    println!("✓ Options loaded: {options:?}");

    let key = StateKey::new("session.migrate")?;
    let store = TaskStore::new(CheckReducer::new(key.clone()));
    println!("✓ Store created for '{key}'");

    let action = CheckAction::new(
        key,
        |_| async {
            // Pretend to probe whether a migration is pending.
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(true)
        },
        |_| async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok(json!({"migrated": 3, "skipped": 0}))
        },
    )
    .options(options);

    let run = store.dispatch_thunk(&action).await?;
    println!("\n✓ First dispatch: {}", serde_json::to_string_pretty(&run)?);
    println!("  check passed: {}", run.check_passed());
    println!("  task performed: {}", run.task_performed());

    let run = store.dispatch_thunk(&action).await?;
    println!("\n✓ Second dispatch: {}", serde_json::to_string_pretty(&run)?);

    let state = store.state();
    println!(
        "\nFinal state: check.complete={} task.complete={} task.results={}",
        state.check.meta.complete, state.task.meta.complete, state.task.results
    );

    Ok(())
}
