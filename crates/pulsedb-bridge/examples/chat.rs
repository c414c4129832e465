use futures::StreamExt;
use pulsedb_bridge::{push_value, read_value, watch, write_value};
use pulsedb_client::{MemoryDb, Query};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db = MemoryDb::new();
    let topic = db.reference("rooms/lobby/topic");

    write_value(&topic, json!("general")).await?;
    let current: String = read_value(&topic).await?;
    println!("topic: {current}");

    let messages = db.reference("rooms/lobby/messages");
    let first = push_value(&messages, json!("hello")).await?;
    let second = push_value(&messages, json!("world")).await?;
    println!("appended at {} and {}", first.path(), second.path());

    let mut updates = watch::<_, String>(topic.to_query());
    write_value(&topic, json!("announcements")).await?;
    while let Some(update) = updates.next().await {
        let topic = update?;
        println!("topic changed: {topic}");
        if topic == "announcements" {
            break;
        }
    }
    Ok(())
}
