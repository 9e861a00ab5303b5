//! Integration tests for web application resource operations

use std::sync::Arc;

use chrono::Utc;
use s7web_core::domain::newtypes::ResourcePath;
use s7web_core::domain::resource::Visibility;
use s7web_core::ports::rpc_transport::{is_not_found, IRpcTransport, ResourceMeta};
use s7web_rpc::transport::WebAppTransport;

use crate::common;

async fn transport(server: &wiremock::MockServer) -> WebAppTransport {
    let client = s7web_rpc::RpcClient::new(server.uri());
    client.set_token("test-session-token");
    WebAppTransport::new(Arc::new(client), "app")
}

fn meta() -> ResourceMeta {
    ResourceMeta {
        media_type: Some("text/html".to_string()),
        last_modified: Utc::now(),
        visibility: Visibility::Public,
        etag: None,
    }
}

#[tokio::test]
async fn test_create_resource_returns_ticket() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(
        &server,
        "WebApp.CreateResource",
        serde_json::json!(common::TICKET_ID),
    )
    .await;

    let transport = transport(&server).await;
    let path = ResourcePath::new("index.html").unwrap();
    let ticket = transport.create_resource(&path, &meta()).await.expect("Create failed");
    assert_eq!(ticket.as_str(), common::TICKET_ID);
}

#[tokio::test]
async fn test_create_resource_rejects_malformed_ticket() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(&server, "WebApp.CreateResource", serde_json::json!("short")).await;

    let transport = transport(&server).await;
    let path = ResourcePath::new("index.html").unwrap();
    assert!(transport.create_resource(&path, &meta()).await.is_err());
}

#[tokio::test]
async fn test_browse_resource_tree_builds_nested_tree() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(
        &server,
        "WebApp.BrowseResources",
        serde_json::json!({
            "max_resources": 200,
            "resources": [
                {"name": "index.html", "type": "file", "size": 100,
                 "last_modified": "2026-03-01T12:00:00Z", "media_type": "text/html"},
                {"name": "css", "type": "dir", "resources": [
                    {"name": "main.css", "type": "file", "size": 64,
                     "last_modified": "2026-03-01T12:00:00Z"}
                ]}
            ]
        }),
    )
    .await;

    let transport = transport(&server).await;
    let tree = transport.browse_resource_tree(None).await.expect("Browse failed");

    assert_eq!(tree.len(), 4);
    assert!(tree.find(&ResourcePath::new("css/main.css").unwrap()).is_some());
}

#[tokio::test]
async fn test_browse_missing_app_is_classified_not_found() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc_error(
        &server,
        "WebApp.BrowseResources",
        200,
        "application does not exist",
    )
    .await;

    let transport = transport(&server).await;
    let err = transport.browse_resource_tree(None).await.unwrap_err();
    assert!(is_not_found(&err));
}

#[tokio::test]
async fn test_delete_resource_and_directory() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(&server, "WebApp.DeleteResource", serde_json::json!(true)).await;
    common::mount_rpc(&server, "WebApp.DeleteDirectory", serde_json::json!(true)).await;

    let transport = transport(&server).await;
    transport
        .delete_resource(&ResourcePath::new("old.txt").unwrap())
        .await
        .expect("Delete resource failed");
    transport
        .delete_directory(&ResourcePath::new("old").unwrap())
        .await
        .expect("Delete directory failed");
}

#[tokio::test]
async fn test_create_directory() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(&server, "WebApp.CreateDirectory", serde_json::json!(true)).await;

    let transport = transport(&server).await;
    transport
        .create_directory(&ResourcePath::new("assets").unwrap())
        .await
        .expect("Create directory failed");
}

#[tokio::test]
async fn test_download_resource_returns_ticket() {
    let server = wiremock::MockServer::start().await;
    common::mount_rpc(
        &server,
        "WebApp.DownloadResource",
        serde_json::json!(common::TICKET_ID),
    )
    .await;

    let transport = transport(&server).await;
    let ticket = transport
        .download_resource(&ResourcePath::new("index.html").unwrap())
        .await
        .expect("Download request failed");
    assert_eq!(ticket.as_str(), common::TICKET_ID);
}
