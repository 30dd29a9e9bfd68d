#![allow(dead_code)]

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

// Serve the router on an ephemeral local port
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// A URL on a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/gone.m3u8")
}

pub fn channels_dataset() -> Value {
    json!([
        {
            "id": "c1", "name": "One", "country": "UK",
            "broadcast_area": ["c/UK"], "languages": ["eng"],
            "categories": ["News"], "is_nsfw": false, "logo": "l1"
        },
        {
            "id": "c2", "name": "Two", "country": "FR",
            "broadcast_area": ["c/FR"], "languages": ["fra"],
            "categories": ["Movies"], "is_nsfw": false, "logo": "l2"
        }
    ])
}

/// Stream origin with a live route, a 404 route and a route slower than any
/// probe timeout used in the tests
pub fn stream_origin() -> Router {
    Router::new()
        .route("/live.m3u8", get(|| async { "#EXTM3U\n" }))
        .route("/missing.m3u8", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/slow.m3u8",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "#EXTM3U\n"
            }),
        )
}

/// Dataset host serving `streams` next to the fixed channels dataset
pub fn dataset_origin(streams: Value) -> Router {
    Router::new()
        .route("/channels.json", get(|| async { Json(channels_dataset()) }))
        .route(
            "/streams.json",
            get(move || {
                let streams = streams.clone();
                async move { Json(streams) }
            }),
        )
        .route(
            "/broken.json",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/garbage.json", get(|| async { "this is not json" }))
}
