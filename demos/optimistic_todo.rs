//! Optimistic save with server confirmation and rollback

use optimist::{
    create_store, MutationTable, Store, StoreConfig, StoreError, Subscription, SubscriptionTable,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOCAL_ID: &str = "local";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Todo {
    id: String,
    text: String,
    synced: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AppState {
    current: Todo,
}

/// Pretend backend: hands out ids, refuses empty todos.
async fn server_save(next_id: &AtomicUsize, text: &str) -> Result<String, StoreError> {
    tokio::task::yield_now().await;
    if text.trim().is_empty() {
        return Err(StoreError::rejected("todo text is empty"));
    }
    Ok(format!("srv-{}", next_id.fetch_add(1, Ordering::SeqCst)))
}

fn todo_store() -> Store<AppState> {
    let next_id = Arc::new(AtomicUsize::new(1));

    create_store(
        StoreConfig::new(AppState::default())
            .mutations(|ops| {
                MutationTable::new().with("save", move |text| {
                    let ops = ops.clone();
                    async move {
                        let id = ops.optimistic("id", LOCAL_ID.to_string());
                        let synced = id != LOCAL_ID;
                        ops.merge(json!({"current": {"id": id, "text": text, "synced": synced}}))
                            .await
                    }
                })
            })
            .subscriptions(move |ops| {
                let will = ops.clone();
                let did = ops;
                SubscriptionTable::new().on(
                    "save",
                    Subscription::new()
                        .will_commit(move |text| {
                            let ops = will.clone();
                            let next_id = Arc::clone(&next_id);
                            async move {
                                let text = text.as_str().unwrap_or_default().to_string();
                                match server_save(&next_id, &text).await {
                                    Ok(id) => ops.forward("id", json!(id)).await,
                                    Err(err) => {
                                        ops.rollback();
                                        Err(err)
                                    }
                                }
                            }
                        })
                        .did_commit(move |_| {
                            let ops = did.clone();
                            async move {
                                println!("  committed: {:?}", ops.get().current);
                                Ok(())
                            }
                        }),
                )
            }),
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Optimistic Todo Example ===\n");

    let store = todo_store();
    let _guard = store
        .subscribe(|state: &AppState| {
            let todo = &state.current;
            println!("  render: [{}] {} (synced: {})", todo.id, todo.text, todo.synced);
        })
        .guard();

    println!("Saving a todo...");
    if let Err(err) = store.mutations().dispatch("save", "buy milk").await {
        println!("  failed: {err}");
    }

    println!("\nSaving an empty todo...");
    if let Err(err) = store.mutations().dispatch("save", "").await {
        println!("  failed: {err}");
    }

    println!("\nFinal state: {:#?}", store.current());
}
