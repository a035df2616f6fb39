//! Basic example demonstrating JSON requests through the callback and async APIs.
//!
//! This example shows how to:
//! - Create a JSON client for one host
//! - Register an interceptor that adds a header to every request
//! - Make async GET and POST requests
//! - Make a request with callbacks
//!
//! Run with: `cargo run --example basic_call`

use hostwire::{Error, HeaderSet, JsonClient, Method, RequestMetadata, MAGIC_ARRAY_KEY};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("hostwire=debug,basic_call=info")
        .init();

    let mut client = JsonClient::builder()
        .host("jsonplaceholder.typicode.com")
        .https(true)
        .build_json()?;

    client.add_interceptor(|headers: &mut HeaderSet| {
        headers.set("User-Agent", "hostwire-demo/0.1");
    });

    println!("=== GET Request Example ===");
    let response = client.get("/posts/1").await?;
    let post: Post = response.parse_data()?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!("Request latency: {:?}", response.latency);
    println!();

    println!("=== Array Response Example ===");
    let response = client
        .call(
            RequestMetadata::new(Method::GET, "/comments").with_query_param("postId", "1"),
            &json!({}),
        )
        .await?;
    let count = response.data[MAGIC_ARRAY_KEY]
        .as_array()
        .map(Vec::len)
        .unwrap_or_default();
    println!("Comments on post 1: {}", count);
    println!();

    println!("=== POST Request Example ===");
    // jsonplaceholder answers 201 Created, which counts as a failure here.
    match client
        .post("/posts", &json!({"title": "My New Post", "body": "Hello", "userId": 1}))
        .await
    {
        Ok(response) => println!("Created: {:?}", response.data),
        Err(Error::Transport(failure)) => println!(
            "Not accepted: {} (code {}, HTTP {})",
            failure.message,
            failure.code(),
            failure.status
        ),
        Err(e) => return Err(e),
    }
    println!();

    println!("=== Callback Example ===");
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<String>();
    let (error_tx, error_rx) = tokio::sync::oneshot::channel::<Error>();
    client.send_request(
        RequestMetadata::new(Method::GET, "/users/1"),
        &json!({}),
        move |user, headers| {
            let _ = done_tx.send(format!(
                "User {:?} ({} response headers)",
                user.get("name"),
                headers.len()
            ));
        },
        move |error| {
            let _ = error_tx.send(error);
        },
    );

    tokio::select! {
        Ok(summary) = done_rx => println!("{}", summary),
        Ok(error) = error_rx => println!("Request failed: {}", error),
        else => println!("No callback ran"),
    }

    Ok(())
}
