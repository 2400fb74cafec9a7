use bytes::Bytes;
use echobench::bench::{Mode, Stage};
use echobench::common::spawn_test_server;
use echobench::http::GREETING;
use echobench::server::{EchoServer, ServerConfig};
use echobench::stream::Transport;
use echobench::{
    ClientConfig, ClientConfigBuilder, EchoClient, EchoError, Harness, HttpEchoClient,
    RequestBenchmarkDriver, RunConfig, StreamBenchmarkDriver, ws,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

fn ws_uri(addr: SocketAddr) -> String {
    format!("ws://{addr}/ws")
}

fn http_uri(addr: SocketAddr) -> String {
    format!("http://{addr}/api")
}

#[tokio::test]
async fn test_stream_driver_against_server() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let result = StreamBenchmarkDriver::default()
        .run(&ws_uri(addr), 250, "hello, world!")
        .await
        .unwrap();
    assert_eq!(result.mode, Mode::Stream);
    assert_eq!(result.count, 250);
    assert!(result.elapsed_seconds > 0.0);
    assert!(result.rate_hz > 0.0);

    server_handle.abort();
}

#[tokio::test]
async fn test_request_driver_against_server() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let result = RequestBenchmarkDriver::default()
        .run(&http_uri(addr), 250, "hello, world!")
        .await
        .unwrap();
    assert_eq!(result.mode, Mode::Request);
    assert_eq!(result.count, 250);
    assert!(result.rate_hz > 0.0);

    server_handle.abort();
}

#[tokio::test]
async fn test_harness_runs_both_phases_in_order() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();
    let run = RunConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        message_count: 20,
        payload_body: "hello, world!".to_string(),
    };

    let mut reported = Vec::new();
    let results = Harness::new(run.clone(), ClientConfig::default())
        .run(|r| reported.push(r.to_string()))
        .await
        .unwrap();
    assert_eq!(
        results.iter().map(|r| r.mode).collect::<Vec<_>>(),
        vec![Mode::Stream, Mode::Request]
    );
    assert_eq!(reported.len(), 2);
    assert!(reported[0].starts_with("WebSocket: sent and received 20 messages in "));
    assert!(reported[1].starts_with("HTTP PUT: sent and received 20 messages in "));

    let results = Harness::new(run, ClientConfig::default())
        .skip_http(true)
        .run(|_| {})
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].mode, Mode::Stream);

    server_handle.abort();
}

#[tokio::test]
async fn test_harness_fails_when_server_missing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let run = RunConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        ..RunConfig::default()
    };
    let client = ClientConfigBuilder::new()
        .connect_timeout(Duration::from_secs(2))
        .build();

    let mut reported = 0;
    let err = Harness::new(run, client)
        .run(|_| reported += 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EchoError::Connection {
            mode: Mode::Stream,
            stage: Stage::Connect,
            ..
        }
    ));
    assert_eq!(reported, 0);
}

#[tokio::test]
async fn test_http_probe_and_echo() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let mut client = HttpEchoClient::connect(&http_uri(addr), ClientConfig::default())
        .await
        .unwrap();
    assert_eq!(client.probe().await.unwrap(), GREETING);

    let body = r#"{"body":"hello, world!","idx":41}"#;
    assert_eq!(client.echo_string(body).await.unwrap(), body);
    assert!(client.is_connected());

    // A rejected payload is reported, and the client keeps working
    let err = client.echo_string(r#"{"idx":"nope"}"#).await.unwrap_err();
    assert!(matches!(err, EchoError::Http(ref msg) if msg.contains("400")), "{err:?}");
    assert_eq!(client.probe().await.unwrap(), GREETING);

    client.close().await.unwrap();
    assert!(!client.is_connected());

    server_handle.abort();
}

#[tokio::test]
async fn test_http_client_survives_idle_server_close() {
    let config = ServerConfig {
        read_timeout: Duration::from_millis(100),
        ..ServerConfig::default()
    };
    let (server_handle, addr, _shutdown) = spawn_test_server(config).await.unwrap();

    let mut client = HttpEchoClient::connect(&http_uri(addr), ClientConfig::default())
        .await
        .unwrap();
    // Let the server drop the idle keep-alive connection
    tokio::time::sleep(Duration::from_millis(400)).await;

    let body = r#"{"body":"after idle","idx":0}"#;
    assert_eq!(client.echo_string(body).await.unwrap(), body);
    assert!(client.is_connected());

    client.close().await.unwrap();
    server_handle.abort();
}

#[tokio::test]
async fn test_websocket_echoes_text_and_binary_frames() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let mut client = ws::connect(&ws_uri(addr), &ClientConfig::default()).await.unwrap();
    assert_eq!(client.echo_string("plain text").await.unwrap(), "plain text");

    let binary = Bytes::from((0..=255u8).collect::<Vec<_>>());
    assert_eq!(client.echo(binary.clone()).await.unwrap(), binary);

    let mut messages = Vec::new();
    for i in 0..10 {
        messages.push(client.echo_string(&format!("message {i}")).await.unwrap());
    }
    assert_eq!(
        messages,
        (0..10).map(|i| format!("message {i}")).collect::<Vec<_>>()
    );

    client.close().await.unwrap();
    server_handle.abort();
}

#[tokio::test]
async fn test_concurrent_streams_never_cross() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let mut handles = Vec::new();
    for client_id in 0..4u64 {
        let uri = ws_uri(addr);
        handles.push(tokio::spawn(async move {
            let mut client = ws::connect(&uri, &ClientConfig::default()).await?;
            for i in 0..25u64 {
                let message = format!("client {client_id} message {i}");
                let reply = client.echo_string(&message).await?;
                assert_eq!(reply, message);
                // Stagger the clients so their traffic interleaves
                tokio::time::sleep(Duration::from_millis((client_id * 3 + i) % 4)).await;
            }
            client.close().await?;
            Ok::<(), EchoError>(())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    server_handle.abort();
}

#[tokio::test]
async fn test_client_close_releases_server_connection() {
    let config = ServerConfig {
        max_connections: 1,
        ..ServerConfig::default()
    };
    let (server_handle, addr, _shutdown) = spawn_test_server(config).await.unwrap();

    let mut first = ws::connect(&ws_uri(addr), &ClientConfig::default()).await.unwrap();
    assert_eq!(first.echo_string("first").await.unwrap(), "first");
    first.close().await.unwrap();

    // The only slot frees up once the server-side responder has finished
    let mut second = None;
    for _ in 0..50 {
        if let Ok(mut client) = ws::connect(&ws_uri(addr), &ClientConfig::default()).await {
            if client.echo_string("second").await.is_ok() {
                second = Some(client);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let mut second = second.expect("server never released the first connection");
    second.close().await.unwrap();

    server_handle.abort();
}

#[tokio::test]
async fn test_connection_limit_rejects_excess() {
    let config = ServerConfig {
        max_connections: 1,
        ..ServerConfig::default()
    };
    let (server_handle, addr, _shutdown) = spawn_test_server(config).await.unwrap();

    let mut held = ws::connect(&ws_uri(addr), &ClientConfig::default()).await.unwrap();
    assert_eq!(held.echo_string("holding").await.unwrap(), "holding");

    let client = ClientConfigBuilder::new()
        .connect_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(2))
        .build();
    assert!(ws::connect(&ws_uri(addr), &client).await.is_err());

    // The held connection is unaffected
    assert_eq!(held.echo_string("still here").await.unwrap(), "still here");
    held.close().await.unwrap();

    server_handle.abort();
}

#[tokio::test]
async fn test_peer_close_seen_by_client_transport() {
    let (server_handle, addr, _shutdown) = spawn_test_server(ServerConfig::default()).await.unwrap();

    let mut transport = echobench::WsTransport::connect(&ws_uri(addr), &ClientConfig::default())
        .await
        .unwrap();
    transport.close().await.unwrap();
    assert_eq!(transport.receive().await.unwrap(), None);

    server_handle.abort();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = EchoServer::new(ServerConfig {
        bind_addr: addr,
        ..ServerConfig::default()
    });
    let shutdown_signal = server.shutdown_signal();
    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    // Once a request has been answered the accept loop is subscribed
    let mut client = HttpEchoClient::connect(&http_uri(addr), ClientConfig::default())
        .await
        .unwrap();
    assert_eq!(client.probe().await.unwrap(), GREETING);

    shutdown_signal.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server_handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();
}
