/*
[INPUT]:  Test configuration, mock server and local WebSocket peer requirements
[OUTPUT]: Shared test utilities: HTTP mock server, scripted WebSocket peer, queue drain
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for binance-adapter tests

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use binance_adapter::StreamItem;
use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async};
use wiremock::MockServer;

/// Server side of a local WebSocket connection
pub type PeerSocket = WebSocketStream<TcpStream>;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Binds a WebSocket peer on a free local port and runs `script` on the
/// first connection it accepts. Returns `ws://127.0.0.1:<port>`.
pub async fn spawn_peer<F, Fut>(script: F) -> String
where
    F: FnOnce(PeerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind peer");
    let addr = listener.local_addr().expect("peer addr");
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let socket = accept_async(tcp).await.expect("upgrade");
        script(socket).await;
    });
    format!("ws://{addr}")
}

/// Reads until the client goes away; reading is what answers its pings
pub async fn serve_until_closed(mut socket: PeerSocket) {
    while let Some(Ok(_)) = socket.next().await {}
}

/// Holds the socket open without ever reading from it
pub async fn stay_silent(socket: PeerSocket) {
    tokio::time::sleep(Duration::from_secs(30)).await;
    drop(socket);
}

/// Collects every remaining item until the handler is dropped
pub async fn drain<T>(rx: &mut UnboundedReceiver<StreamItem<T>>) -> Vec<StreamItem<T>> {
    timeout(Duration::from_secs(5), async {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    })
    .await
    .expect("handler released after the subscription finished")
}

/// Next item, failing the test if none arrives in time
pub async fn next_item<T>(rx: &mut UnboundedReceiver<StreamItem<T>>) -> StreamItem<T> {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("item in time")
        .expect("queue still open")
}

/// Spot diff-depth update as Binance sends it
pub fn depth_update(symbol: &str, update_id: i64) -> String {
    format!(
        r#"{{"e":"depthUpdate","E":1672515782136,"s":"{symbol}","U":{update_id},"u":{update_id},"b":[["0.0024","10"]],"a":[["0.0026","100"]]}}"#
    )
}
