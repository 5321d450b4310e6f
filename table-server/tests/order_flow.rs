//! End-to-end ordering scenarios against a disk-backed server state
//!
//! These exercise the full pipeline: PIN join -> cart -> idempotent
//! placement -> kitchen lifecycle -> broadcast, plus the reconnect
//! re-fetch contract and the TCP bus RPC path.

use std::sync::Arc;
use std::time::Duration;

use table_server::api::{self, OneshotRouter};
use table_server::message::transport::{MemoryTransport, read_frame, write_frame};
use table_server::{Config, ServerState};

use shared::error::ErrorCode;
use shared::message::{
    BusMessage, CartUpdatePayload, ClientRole, EventType, HandshakePayload, ItemStatusPayload,
    ItemTransitionParams, OrderPlacedPayload, PROTOCOL_VERSION, RequestCommandPayload,
    ResponsePayload, Topic, actions,
};
use shared::models::{ItemStatus, Order, OrderStatus, Session, StaffIdentity, StaffRole};

/// Catalog fixture: prices in whole rupees, no tax, so the expected totals
/// fall out directly (2 x 100 = 200).
fn catalog_json() -> serde_json::Value {
    serde_json::json!({
        "restaurant_id": "r1",
        "tables": [
            { "table_id": "t1", "restaurant_id": "r1", "name": "Table 1", "pin": "1234" },
            { "table_id": "t2", "restaurant_id": "r1", "name": "Table 2", "pin": "5678" }
        ],
        "stations": [
            { "station_id": "st1", "restaurant_id": "r1", "name": "grill", "is_archived": false },
            { "station_id": "st2", "restaurant_id": "r1", "name": "curry", "is_archived": false }
        ],
        "items": [
            { "menu_item_id": "m1", "restaurant_id": "r1", "name": "Masala Dosa",
              "price": 100.0, "tax_rate": 0.0, "station": "grill" },
            { "menu_item_id": "m2", "restaurant_id": "r1", "name": "Paneer Butter Masala",
              "price": 150.0, "tax_rate": 0.0, "station": "curry" }
        ]
    })
}

async fn server_state(dir: &tempfile::TempDir, bus_port: u16) -> ServerState {
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0, bus_port);
    std::fs::write(
        &config.catalog_path,
        serde_json::to_vec_pretty(&catalog_json()).unwrap(),
    )
    .unwrap();
    ServerState::initialize(&config).await
}

fn chef(id: &str, stations: &[&str]) -> StaffIdentity {
    StaffIdentity {
        staff_id: id.to_string(),
        name: format!("Chef {id}"),
        role: StaffRole::Chef,
        restaurant_id: "r1".to_string(),
        stations: stations.iter().map(|s| s.to_string()).collect(),
    }
}

fn waiter(id: &str) -> StaffIdentity {
    StaffIdentity {
        staff_id: id.to_string(),
        name: format!("Waiter {id}"),
        role: StaffRole::Waiter,
        restaurant_id: "r1".to_string(),
        stations: vec![],
    }
}

// =======================================================================
// Scenario: join -> add 2 x ₹100 -> place "k1" -> retry "k1"
// =======================================================================

#[tokio::test]
async fn join_order_and_retry_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let state = server_state(&dir, 0).await;

    let session = state.sessions.join("t1", "1234").await.unwrap();

    let cart = state
        .carts
        .add(&session.session_id, "m1", 2, &[])
        .await
        .unwrap();
    assert_eq!(cart.total, 200.0);

    let order = state.orders.place(&session.session_id, "k1").await.unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.total, 200.0);
    assert!(state.carts.get(&session.session_id).unwrap().is_empty());

    // Retried placement with the same key returns the identical order
    let retried = state.orders.place(&session.session_id, "k1").await.unwrap();
    assert_eq!(retried.order_id, order.order_id);
    assert_eq!(retried, order);
    assert!(state.carts.get(&session.session_id).unwrap().is_empty());
    assert_eq!(
        state.orders.get_by_session(&session.session_id).unwrap().len(),
        1
    );
}

// =======================================================================
// Scenario: claim race -> ready -> serve -> derived order status
// =======================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn kitchen_lifecycle_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let state = server_state(&dir, 0).await;

    let session = state.sessions.join("t1", "1234").await.unwrap();
    state
        .carts
        .add(&session.session_id, "m1", 1, &[])
        .await
        .unwrap();
    let order = state.orders.place(&session.session_id, "k1").await.unwrap();
    let item_id = order.items[0].item_id.clone();

    let c1 = chef("c1", &["grill"]);
    let c2 = chef("c2", &["grill"]);

    // Concurrent claims: exactly one winner
    let (a, b) = tokio::join!(
        state.kitchen.claim(&c1, &order.order_id, &item_id),
        state.kitchen.claim(&c2, &order.order_id, &item_id),
    );
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    let loser = if a.is_err() { a } else { b };
    assert_eq!(loser.unwrap_err().code, ErrorCode::AlreadyClaimed);

    // Whoever won marks ready; the waiter serves
    let winner = state.orders.get(&order.order_id).unwrap().items[0]
        .claimed_by
        .clone()
        .unwrap();
    let winner_chef = chef(&winner, &["grill"]);
    state
        .kitchen
        .mark_ready(&winner_chef, &order.order_id, &item_id)
        .await
        .unwrap();
    let payload = state
        .kitchen
        .serve(&waiter("w1"), &order.order_id, &item_id)
        .await
        .unwrap();
    assert_eq!(payload.item.status, ItemStatus::Served);
    assert_eq!(payload.order_status, OrderStatus::Served);

    // Persisted order agrees with the broadcast payload
    let stored = state.orders.get(&order.order_id).unwrap();
    assert_eq!(stored.derived_status(), OrderStatus::Served);
}

// =======================================================================
// Scenario: disconnect, miss a mutation, reconnect and re-fetch
// =======================================================================

#[tokio::test]
async fn reconnect_refetch_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let state = server_state(&dir, 0).await;

    let session = state.sessions.join("t1", "1234").await.unwrap();
    let room = vec![Topic::session(&session.session_id)];

    // Customer device connects
    let (transport, mut rx) = MemoryTransport::channel("phone");
    state
        .hub
        .register("phone", ClientRole::Customer, room.clone(), Arc::new(transport));

    state
        .carts
        .add(&session.session_id, "m1", 1, &[])
        .await
        .unwrap();
    let live: CartUpdatePayload = rx.recv().await.unwrap().parse_payload().unwrap();
    assert_eq!(live.cart.lines.len(), 1);

    // Device drops; a mutation happens while it is away
    state.hub.unregister("phone");
    state
        .carts
        .add(&session.session_id, "m2", 1, &[])
        .await
        .unwrap();
    assert!(rx.try_recv().is_err(), "no delivery while disconnected");

    // Reconnect: no replay — the device re-fetches the authoritative cart
    let (transport, mut rx) = MemoryTransport::channel("phone");
    state
        .hub
        .register("phone", ClientRole::Customer, room, Arc::new(transport));
    let refetched = state.carts.get(&session.session_id).unwrap();
    assert_eq!(refetched.lines.len(), 2);
    assert_eq!(refetched.total, 250.0);

    // New events flow again
    state
        .carts
        .add(&session.session_id, "m1", 1, &[])
        .await
        .unwrap();
    let next: CartUpdatePayload = rx.recv().await.unwrap().parse_payload().unwrap();
    assert_eq!(next.cart, state.carts.get(&session.session_id).unwrap());
}

// =======================================================================
// HTTP surface
// =======================================================================

async fn json_request(
    router: &mut axum::Router<ServerState>,
    state: &ServerState,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (http::StatusCode, serde_json::Value) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("x-session-token", token);
    }
    let request = match body {
        Some(value) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = router.oneshot(state, request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn http_surface_covers_the_customer_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = server_state(&dir, 0).await;
    let mut router = api::build_router();

    let (status, health) = json_request(&mut router, &state, "GET", "/api/health", None, None).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(health["status"], "ok");

    // Join
    let (status, body) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/sessions/join",
        None,
        Some(serde_json::json!({"table_id": "t1", "table_pin": "1234"})),
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    let session: Session = serde_json::from_value(body).unwrap();

    // Wrong PIN surfaces the error envelope
    let (status, body) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/sessions/join",
        None,
        Some(serde_json::json!({"table_id": "t1", "table_pin": "9999"})),
    )
    .await;
    assert_eq!(status, http::StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], u16::from(ErrorCode::InvalidPin));

    // Add to cart with the session token
    let (status, body) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/cart/add",
        Some(&session.session_id),
        Some(serde_json::json!({"menu_item_id": "m1", "quantity": 2})),
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body["total"], 200.0);

    // Place, then retry with the same key over HTTP
    let place_body = serde_json::json!({"idempotency_key": "http-k1"});
    let (status, first) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/orders/place",
        Some(&session.session_id),
        Some(place_body.clone()),
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    let (_, second) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/orders/place",
        Some(&session.session_id),
        Some(place_body),
    )
    .await;
    assert_eq!(first["order_id"], second["order_id"]);

    // Placement status lookup by key
    let (status, by_key) = json_request(
        &mut router,
        &state,
        "GET",
        "/api/orders/status/http-k1",
        Some(&session.session_id),
        None,
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(by_key["order_id"], first["order_id"]);

    // Placing with an empty cart is a business rejection
    let (status, body) = json_request(
        &mut router,
        &state,
        "GET",
        "/api/cart",
        Some(&session.session_id),
        None,
    )
    .await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body["lines"].as_array().unwrap().len(), 0);
    let (status, body) = json_request(
        &mut router,
        &state,
        "POST",
        "/api/orders/place",
        Some(&session.session_id),
        Some(serde_json::json!({"idempotency_key": "http-k2"})),
    )
    .await;
    assert_eq!(status, http::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], u16::from(ErrorCode::EmptyCart));
}

#[tokio::test]
async fn http_staff_surface_requires_jwt() {
    let dir = tempfile::tempdir().unwrap();
    let state = server_state(&dir, 0).await;
    let mut router = api::build_router();

    // No token
    let (status, _) =
        json_request(&mut router, &state, "GET", "/api/kitchen/orders", None, None).await;
    assert_eq!(status, http::StatusCode::UNAUTHORIZED);

    // Valid chef token sees the queue
    let session = state.sessions.join("t1", "1234").await.unwrap();
    state
        .carts
        .add(&session.session_id, "m1", 1, &[])
        .await
        .unwrap();
    state.orders.place(&session.session_id, "k1").await.unwrap();

    let token = state.jwt.issue(&chef("c1", &["grill"]), 60).unwrap();
    let request = http::Request::builder()
        .method("GET")
        .uri("/api/kitchen/orders?station=grill")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = router.oneshot(&state, request).await.unwrap();
    assert_eq!(response.status(), http::StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let views: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(views.as_array().unwrap().len(), 1);
}

// =======================================================================
// TCP bus: handshake, order:placed fan-out, claim RPC with ack
// =======================================================================

async fn connect_bus(port: u16) -> tokio::net::TcpStream {
    for _ in 0..50 {
        if let Ok(stream) = tokio::net::TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("bus port {port} never came up");
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tcp_bus_delivers_events_and_answers_rpcs() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let state = server_state(&dir, port).await;
    state.start_background_tasks();

    // Kitchen display connects and subscribes to the grill room
    let mut stream = connect_bus(port).await;
    let handshake = BusMessage::handshake(&HandshakePayload {
        version: PROTOCOL_VERSION,
        client_id: "display-grill".to_string(),
        role: ClientRole::Kitchen,
        rooms: vec![Topic::station("r1", "grill")],
        client_name: Some("grill display".to_string()),
    });
    write_frame(&mut stream, &handshake).await.unwrap();
    let ack = read_frame(&mut stream).await.unwrap();
    assert_eq!(ack.event_type, EventType::Response);
    assert_eq!(ack.correlation_id, Some(handshake.request_id));

    // Place an order routed to the grill
    let session = state.sessions.join("t1", "1234").await.unwrap();
    state
        .carts
        .add(&session.session_id, "m1", 1, &[])
        .await
        .unwrap();
    let order = state.orders.place(&session.session_id, "k1").await.unwrap();

    let placed = read_frame(&mut stream).await.unwrap();
    assert_eq!(placed.event_type, EventType::OrderPlaced);
    let placed: OrderPlacedPayload = placed.parse_payload().unwrap();
    assert_eq!(placed.order.order_id, order.order_id);

    // Claim over the socket RPC
    let token = state.jwt.issue(&chef("c1", &["grill"]), 60).unwrap();
    let request = BusMessage::request_command(&RequestCommandPayload {
        action: actions::KITCHEN_CLAIM_ITEM.to_string(),
        params: Some(
            serde_json::to_value(ItemTransitionParams {
                token,
                order_id: order.order_id.clone(),
                item_id: order.items[0].item_id.clone(),
            })
            .unwrap(),
        ),
    });
    write_frame(&mut stream, &request).await.unwrap();

    // The station room sees the status change; the RPC gets its ack.
    let mut saw_status = false;
    let mut ack: Option<ResponsePayload> = None;
    for _ in 0..2 {
        let frame = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut stream))
            .await
            .unwrap()
            .unwrap();
        match frame.event_type {
            EventType::ItemStatusChanged => {
                let payload: ItemStatusPayload = frame.parse_payload().unwrap();
                assert_eq!(payload.item.status, ItemStatus::InProgress);
                saw_status = true;
            }
            EventType::Response => {
                assert_eq!(frame.correlation_id, Some(request.request_id));
                ack = Some(frame.parse_payload().unwrap());
            }
            other => panic!("unexpected frame {other}"),
        }
    }
    assert!(saw_status);
    assert!(ack.unwrap().ok);

    // The persisted item agrees
    let stored: Order = state.orders.get(&order.order_id).unwrap();
    assert_eq!(stored.items[0].status, ItemStatus::InProgress);
    assert_eq!(stored.items[0].claimed_by.as_deref(), Some("c1"));

    state.hub.shutdown();
}
