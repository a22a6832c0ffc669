/*
[INPUT]:  WebSocket test scenarios against a scripted local peer
[OUTPUT]: Test results for serve, keepalive and the stream catalogues
[POS]:    Integration tests - WebSocket
[UPDATE]: When subscription lifecycle or stream decoding changes
*/

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use binance_adapter::futures::{ContinuousKlineArgs, ContinuousKlineEvent, FuturesStreams};
use binance_adapter::spot::{DiffDepthEvent, SpotStreams, UpdateSpeed};
use binance_adapter::ws::{Flat, Raw};
use binance_adapter::{
    CancellationToken, KeepAlive, ServeOptions, StreamItem, WsConfig, WsError, channel,
    handler_fn, serve,
};
use common::{depth_update, drain, next_item, serve_until_closed, spawn_peer, stay_silent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as TransportError, Message};

fn spot_streams(peer: &str) -> SpotStreams {
    SpotStreams::with_base_urls(
        format!("{peer}/ws"),
        format!("{peer}/stream?streams="),
        ServeOptions::default(),
    )
}

#[tokio::test]
async fn test_frames_arrive_in_wire_order() {
    let peer = spawn_peer(|mut socket| async move {
        for update_id in 1..=50 {
            socket
                .send(Message::text(depth_update("BNBBTC", update_id)))
                .await
                .expect("send");
        }
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let subscription = spot_streams(&peer)
        .diff_depth(&ctx, "bnbbtc", UpdateSpeed::Ms1000, handler)
        .await
        .expect("subscribe");

    let mut update_ids = Vec::new();
    while update_ids.len() < 50 {
        match next_item(&mut rx).await {
            StreamItem::Event(event) => update_ids.push(event.last_update_id),
            other => panic!("unexpected item: {other:?}"),
        }
    }
    assert_eq!(update_ids, (1..=50).collect::<Vec<_>>());

    subscription.stop();
    assert!(drain(&mut rx).await.is_empty());
    assert!(subscription.is_done());
}

#[tokio::test]
async fn test_bad_frame_does_not_end_subscription() {
    let peer = spawn_peer(|mut socket| async move {
        socket.send(Message::text(depth_update("BNBBTC", 1))).await.expect("send");
        socket.send(Message::text("{not json")).await.expect("send");
        socket.send(Message::text(depth_update("BNBBTC", 2))).await.expect("send");
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let subscription = spot_streams(&peer)
        .diff_depth(&ctx, "bnbbtc", UpdateSpeed::Ms100, handler)
        .await
        .expect("subscribe");

    assert!(matches!(next_item(&mut rx).await, StreamItem::Event(DiffDepthEvent { last_update_id: 1, .. })));
    match next_item(&mut rx).await {
        StreamItem::DecodeError(err) => assert!(err.is_decode()),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(matches!(next_item(&mut rx).await, StreamItem::Event(DiffDepthEvent { last_update_id: 2, .. })));
    assert!(!subscription.is_done());

    ctx.cancel();
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_bad_frames_then_transport_error() {
    let peer = spawn_peer(|mut socket| async move {
        for update_id in 1..=3 {
            socket.send(Message::text("[not a depth update")).await.expect("send");
            socket
                .send(Message::text(depth_update("BNBBTC", update_id)))
                .await
                .expect("send");
        }
        // no close handshake
        drop(socket);
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let subscription = spot_streams(&peer)
        .diff_depth(&ctx, "bnbbtc", UpdateSpeed::Ms1000, handler)
        .await
        .expect("subscribe");

    let items = drain(&mut rx).await;
    let kinds: Vec<&str> = items
        .iter()
        .map(|item| match item {
            StreamItem::DecodeError(_) => "D",
            StreamItem::Event(_) => "E",
            StreamItem::Closed(_) => "C",
        })
        .collect();
    assert_eq!(kinds, ["D", "E", "D", "E", "D", "E", "C"]);

    let update_ids: Vec<i64> = items
        .iter()
        .filter_map(|item| match item {
            StreamItem::Event(event) => Some(event.last_update_id),
            _ => None,
        })
        .collect();
    assert_eq!(update_ids, [1, 2, 3]);
    match items.last() {
        Some(StreamItem::Closed(err)) => assert!(err.is_transport()),
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(subscription.is_done());
}

#[tokio::test]
async fn test_oversized_frame_ends_subscription() {
    let peer = spawn_peer(|mut socket| async move {
        // the client may hang up while this is still being written
        let _ = socket.send(Message::text("x".repeat(700_000))).await;
        let _ = socket.send(Message::text("after")).await;
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws")),
        &ServeOptions::default(),
        handler,
    )
    .await
    .expect("subscribe");

    let items = drain(&mut rx).await;
    assert_eq!(items.len(), 1, "items: {items:?}");
    match &items[0] {
        StreamItem::Closed(WsError::Read(TransportError::Capacity(_))) => {}
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(subscription.is_done());
}

#[tokio::test]
async fn test_unsent_priming_message_is_not_fatal() {
    let peer = spawn_peer(|mut socket| async move {
        // never reads, so the large priming frame stalls in the socket buffers
        tokio::time::sleep(Duration::from_millis(500)).await;
        socket.send(Message::text(depth_update("BNBBTC", 1))).await.expect("send");
        socket.send(Message::text(depth_update("BNBBTC", 2))).await.expect("send");
        stay_silent(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let options = ServeOptions {
        write_timeout: Duration::from_millis(100),
        ..ServeOptions::default()
    }
    .with_keepalive(KeepAlive::disabled());
    let config = WsConfig::new(format!("{peer}/ws")).with_message("p".repeat(32 * 1024 * 1024));
    let subscription = serve(&ctx, config, &options, Flat::<DiffDepthEvent, _>::new(handler))
        .await
        .expect("subscribe");

    for expected in 1..=2 {
        match next_item(&mut rx).await {
            StreamItem::Event(event) => assert_eq!(event.last_update_id, expected),
            other => panic!("unexpected item: {other:?}"),
        }
    }
    assert!(!subscription.is_done());

    subscription.stop();
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_peer_close_reported_once() {
    let peer = spawn_peer(|mut socket| async move {
        socket.send(Message::text(depth_update("BNBBTC", 1))).await.expect("send");
        socket.close(None).await.expect("close");
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let subscription = spot_streams(&peer)
        .diff_depth(&ctx, "bnbbtc", UpdateSpeed::Ms1000, handler)
        .await
        .expect("subscribe");

    let items = drain(&mut rx).await;
    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], StreamItem::Event(_)));
    match &items[1] {
        StreamItem::Closed(err) => {
            assert!(err.is_transport());
            assert!(matches!(err, WsError::ClosedByPeer { .. }));
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(subscription.is_done());
}

#[tokio::test]
async fn test_stop_is_silent() {
    let peer = spawn_peer(serve_until_closed).await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws")),
        &ServeOptions::default(),
        handler,
    )
    .await
    .expect("subscribe");

    let done = subscription.done();
    assert!(!done.is_done());
    subscription.stop();
    subscription.stop();
    tokio::time::timeout(Duration::from_secs(5), done.wait())
        .await
        .expect("done after stop");

    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_context_cancel_is_silent() {
    let peer = spawn_peer(serve_until_closed).await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws")),
        &ServeOptions::default(),
        handler,
    )
    .await
    .expect("subscribe");

    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(5), subscription.wait())
        .await
        .expect("done after cancel");

    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_concurrent_stop_and_cancel() {
    let peer = spawn_peer(serve_until_closed).await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws")),
        &ServeOptions::default(),
        handler,
    )
    .await
    .expect("subscribe");

    let mut tasks = Vec::new();
    for index in 0..8 {
        let stop = subscription.stop_handle();
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            if index % 2 == 0 {
                stop.stop();
            } else {
                ctx.cancel();
            }
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    subscription.wait().await;
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_keepalive_closes_silent_peer() {
    let peer = spawn_peer(stay_silent).await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let options = ServeOptions::default().with_keepalive(KeepAlive {
        enabled: true,
        timeout: Duration::from_millis(400),
    });
    let started = Instant::now();
    let subscription = serve(&ctx, WsConfig::new(format!("{peer}/ws")), &options, handler)
        .await
        .expect("subscribe");

    tokio::time::timeout(Duration::from_secs(5), subscription.wait())
        .await
        .expect("silent peer closed");
    // timeout plus one probe interval, with room for scheduling
    let closed_after = started.elapsed();
    assert!(
        closed_after <= Duration::from_millis(600 + 250),
        "closed after {closed_after:?}"
    );

    let items = drain(&mut rx).await;
    assert_eq!(items.len(), 1);
    match &items[0] {
        StreamItem::Closed(WsError::KeepAliveTimeout { elapsed }) => {
            assert!(*elapsed > Duration::from_millis(400));
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(subscription.is_done());
}

#[tokio::test]
async fn test_keepalive_keeps_responsive_peer() {
    let peer = spawn_peer(serve_until_closed).await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let options = ServeOptions::default().with_keepalive(KeepAlive {
        enabled: true,
        timeout: Duration::from_millis(300),
    });
    let subscription = serve(&ctx, WsConfig::new(format!("{peer}/ws")), &options, handler)
        .await
        .expect("subscribe");

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!subscription.is_done());
    assert!(rx.try_recv().is_err());

    subscription.stop();
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_closure_handler_receives_raw_frames() {
    let peer = spawn_peer(|mut socket| async move {
        socket.send(Message::text("first")).await.expect("send");
        socket.send(Message::binary(b"second".to_vec())).await.expect("send");
        serve_until_closed(socket).await;
    })
    .await;

    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    let ctx = CancellationToken::new();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws")),
        &ServeOptions::default(),
        handler_fn(
            move |message: &[u8]| sink.lock().expect("lock").push(message.to_vec()),
            |err: WsError| panic!("unexpected error: {err}"),
        ),
    )
    .await
    .expect("subscribe");

    tokio::time::timeout(Duration::from_secs(5), async {
        while frames.lock().expect("lock").len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("frames in time");

    subscription.stop();
    subscription.wait().await;
    assert_eq!(
        *frames.lock().expect("lock"),
        vec![b"first".to_vec(), b"second".to_vec()]
    );
}

#[tokio::test]
async fn test_priming_messages_reach_peer() {
    let (primed_tx, primed_rx) = oneshot::channel();
    let peer = spawn_peer(|mut socket| async move {
        let first = match socket.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_string(),
            other => panic!("expected a subscribe frame, got {other:?}"),
        };
        let _ = primed_tx.send(first);

        socket
            .send(Message::text(r#"{"result":null,"id":1}"#))
            .await
            .expect("send");
        socket
            .send(Message::text(
                r#"{"stream":"btcusdt_perpetual@continuousKline_1m","data":{"e":"continuous_kline","E":1607443058651,"ps":"BTCUSDT","ct":"PERPETUAL","k":{"t":1607443020000,"T":1607443079999,"i":"1m","f":116467658886,"L":116468012423,"o":"18787.00","c":"18804.04","h":"18804.04","l":"18786.54","v":"197.664","n":543,"x":false,"q":"3715253.19494","V":"184.769","Q":"3472925.84746","B":"0"}}}"#,
            ))
            .await
            .expect("send");
        serve_until_closed(socket).await;
    })
    .await;

    let streams = FuturesStreams::with_base_urls(
        format!("{peer}/ws"),
        format!("{peer}/stream?streams="),
        format!("{peer}/stream"),
        ServeOptions::default(),
    );
    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<ContinuousKlineEvent>();
    let subscription = streams
        .combined_continuous_kline(
            &ctx,
            &[ContinuousKlineArgs::new("BTCUSDT", "PERPETUAL", "1m")],
            handler,
        )
        .await
        .expect("subscribe");

    let primed = tokio::time::timeout(Duration::from_secs(5), primed_rx)
        .await
        .expect("priming in time")
        .expect("peer saw a frame");
    assert_eq!(
        primed,
        r#"{"method":"SUBSCRIBE","params":["btcusdt_perpetual@continuousKline_1m"],"id":1}"#
    );

    match next_item(&mut rx).await {
        StreamItem::Event(event) => {
            assert_eq!(event.pair, "BTCUSDT");
            assert_eq!(event.kline.interval, "1m");
        }
        other => panic!("unexpected item: {other:?}"),
    }

    subscription.stop();
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_combined_stream_symbol_from_stream_name() {
    let peer = spawn_peer(|mut socket| async move {
        let frame = format!(
            r#"{{"stream":"ethbtc@depth","data":{}}}"#,
            depth_update("SOMETHINGELSE", 9)
        );
        socket.send(Message::text(frame)).await.expect("send");
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<DiffDepthEvent>();
    let subscription = spot_streams(&peer)
        .combined_diff_depth(&ctx, &["ethbtc", "bnbbtc"], UpdateSpeed::Ms1000, handler)
        .await
        .expect("subscribe");
    assert!(subscription.endpoint().ends_with("/stream?streams=ethbtc@depth/bnbbtc@depth"));

    match next_item(&mut rx).await {
        StreamItem::Event(event) => {
            assert_eq!(event.symbol, "ETHBTC");
            assert_eq!(event.last_update_id, 9);
        }
        other => panic!("unexpected item: {other:?}"),
    }

    ctx.cancel();
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test]
async fn test_empty_combined_list_rejected() {
    let ctx = CancellationToken::new();
    let (handler, _rx) = channel::<DiffDepthEvent>();
    let symbols: [&str; 0] = [];

    let result = SpotStreams::new()
        .combined_diff_depth(&ctx, &symbols, UpdateSpeed::Ms1000, handler)
        .await;

    assert!(matches!(result, Err(WsError::InvalidEndpoint(_))));
}

#[tokio::test]
async fn test_raw_wrapper_over_serve() {
    let peer = spawn_peer(|mut socket| async move {
        socket.send(Message::text(r#"{"e":"outboundAccountPosition"}"#)).await.expect("send");
        serve_until_closed(socket).await;
    })
    .await;

    let ctx = CancellationToken::new();
    let (handler, mut rx) = channel::<Vec<u8>>();
    let subscription = serve(
        &ctx,
        WsConfig::new(format!("{peer}/ws/listen-key")),
        &ServeOptions::default(),
        Raw::new(handler),
    )
    .await
    .expect("subscribe");

    let frame = next_item(&mut rx).await.into_event().expect("event");
    assert_eq!(frame, br#"{"e":"outboundAccountPosition"}"#.to_vec());

    subscription.stop();
    assert!(drain(&mut rx).await.is_empty());
}
