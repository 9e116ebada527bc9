// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests against a scripted mock controller speaking the
//! Termowifi TCP protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use termowifi::codec::values::{value_from_ambient, value_from_target};
use termowifi::{
    ClientConfig, ClientEvent, ConnectionState, Error, HvacMode, ReconnectionPolicy, RoomId,
    TermowifiClient,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

/// Builds a device answer frame (header `3B 01 01 04`, checksum diff 6).
fn answer(cid: u8, data: u8) -> [u8; 7] {
    let checksum = cid.wrapping_add(data).wrapping_add(0x06);
    [0x3B, 0x01, 0x01, 0x04, cid, data, checksum]
}

/// Builds a device confirmation frame (header `3B FE 01 01`, no diff).
fn confirmation(cid: u8, data: u8) -> [u8; 7] {
    [0x3B, 0xFE, 0x01, 0x01, cid, data, cid.wrapping_add(data)]
}

/// One simulated thermostat zone.
#[derive(Debug, Clone)]
struct SimRoom {
    id: u8,
    power_on: bool,
    cooling: bool,
    target_value: u8,
    ambient_value: u8,
    humidity_value: u8,
}

impl SimRoom {
    fn new(id: u8) -> Self {
        Self {
            id,
            power_on: true,
            cooling: false,
            target_value: value_from_target(20.0),
            ambient_value: value_from_ambient(20.0),
            humidity_value: 115, // 45 %
        }
    }

    fn info_answers(&self) -> Vec<[u8; 7]> {
        let base = self.id * 4;
        vec![
            answer(base, if self.power_on { 0x03 } else { 0x02 }),
            answer(base + 1, if self.cooling { 0x03 } else { 0x02 }),
            answer(base + 2, self.target_value),
            answer(base + 3, self.ambient_value),
            answer(self.id + 0x64, self.humidity_value),
        ]
    }
}

/// Shared, inspectable state of the mock controller.
#[derive(Debug, Default)]
struct SimState {
    rooms: Vec<SimRoom>,
    /// Command ids of received write traces, in arrival order.
    received: Vec<u8>,
    /// When set, info requests go unanswered.
    muted: bool,
}

/// Mock controller: accepts connections sequentially and answers traces
/// from the shared state.
struct MockController {
    address: (String, u16),
    state: Arc<Mutex<SimState>>,
    /// One-shot: close the current connection on the next trace.
    drop_next: Arc<AtomicBool>,
}

impl MockController {
    async fn start(rooms: &[u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let state = Arc::new(Mutex::new(SimState {
            rooms: rooms.iter().map(|&id| SimRoom::new(id)).collect(),
            ..SimState::default()
        }));
        let drop_next = Arc::new(AtomicBool::new(false));

        let task_state = Arc::clone(&state);
        let task_drop = Arc::clone(&drop_next);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 7];
                while socket.read_exact(&mut buf).await.is_ok() {
                    if task_drop.swap(false, Ordering::SeqCst) {
                        break;
                    }
                    let replies = handle_trace(&task_state, &buf);
                    let mut failed = false;
                    for reply in replies {
                        if socket.write_all(&reply).await.is_err() {
                            failed = true;
                            break;
                        }
                    }
                    if failed {
                        break;
                    }
                }
            }
        });

        Self {
            address: ("127.0.0.1".to_string(), port),
            state,
            drop_next,
        }
    }

    fn client_config() -> ClientConfig {
        ClientConfig::new()
            .with_poll_interval(Duration::from_millis(300))
            .with_connect_timeout(Duration::from_secs(1))
            .with_read_timeout(Duration::from_millis(250))
            .with_write_timeout(Duration::from_millis(250))
            .with_reconnection(
                ReconnectionPolicy::new()
                    .with_initial_delay(Duration::from_millis(100))
                    .with_max_delay(Duration::from_millis(400)),
            )
    }

    fn client(&self) -> TermowifiClient {
        TermowifiClient::builder(self.address.0.clone(), self.address.1)
            .with_config(Self::client_config())
            .build()
    }
}

/// Decodes one host trace and produces the scripted replies.
fn handle_trace(state: &Mutex<SimState>, frame: &[u8; 7]) -> Vec<[u8; 7]> {
    let cid = frame[4];
    let data = frame[5];
    let mut state = state.lock().unwrap();

    // Discovery request.
    if cid == 0x23 {
        return state.rooms.iter().map(|r| answer(0x32 + r.id, 0x00)).collect();
    }

    let room_id = cid / 4;
    let slot = cid % 4;
    let Some(index) = state.rooms.iter().position(|r| r.id == room_id) else {
        return Vec::new();
    };

    // Writes are confirmed with a zero data byte, as the real controller
    // does.
    match slot {
        0 => {
            state.received.push(cid);
            state.rooms[index].power_on = data == 0x03;
            vec![confirmation(cid, 0x00)]
        }
        1 => {
            state.received.push(cid);
            state.rooms[index].cooling = data == 0x03;
            vec![confirmation(cid, 0x00)]
        }
        2 => {
            state.received.push(cid);
            state.rooms[index].target_value = data;
            vec![confirmation(cid, 0x00)]
        }
        _ => {
            if state.muted {
                Vec::new()
            } else {
                state.rooms[index].info_answers()
            }
        }
    }
}

/// Waits until a room's state satisfies a predicate.
async fn wait_for_room<F>(client: &TermowifiClient, room: RoomId, what: &str, predicate: F)
where
    F: Fn(&termowifi::RoomState) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(state) = client.get_room_state(room).await {
            if predicate(&state) {
                return;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        sleep(Duration::from_millis(25)).await;
    }
}

/// Receives events until one matches, failing after a few seconds.
async fn wait_for_event<F>(
    events: &mut tokio::sync::broadcast::Receiver<ClientEvent>,
    what: &str,
    predicate: F,
) -> ClientEvent
where
    F: Fn(&ClientEvent) -> bool,
{
    let deadline = Duration::from_secs(5);
    loop {
        let event = timeout(deadline, events.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
            .expect("event stream closed");
        if predicate(&event) {
            return event;
        }
    }
}

// ============================================================================
// Discovery and polling
// ============================================================================

#[tokio::test]
async fn discovers_rooms_and_mirrors_their_state() {
    let controller = MockController::start(&[1]).await;
    let client = controller.client();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "first poll answers", |state| {
        state.current_temperature().is_some() && state.humidity().is_some()
    })
    .await;

    let state = client.get_room_state(room).await.unwrap();
    assert_eq!(state.current_temperature(), Some(20.0));
    assert_eq!(state.humidity(), Some(45));
    assert_eq!(state.hvac_mode(), Some(HvacMode::Heat));
    assert_eq!(state.target_temperature().map(|t| t.celsius()), Some(20.0));
    assert!(state.is_available());

    assert_eq!(client.rooms().await, vec![room]);

    client.stop().await;
}

#[tokio::test]
async fn discovery_announces_every_room() {
    let controller = MockController::start(&[0, 2]).await;
    let client = controller.client();
    let mut events = client.subscribe();
    client.start();

    wait_for_event(&mut events, "room 0 discovery", |e| {
        matches!(e, ClientEvent::RoomDiscovered { room } if room.value() == 0)
    })
    .await;
    wait_for_event(&mut events, "room 2 discovery", |e| {
        matches!(e, ClientEvent::RoomDiscovered { room } if room.value() == 2)
    })
    .await;

    let rooms: Vec<u8> = client.rooms().await.iter().map(RoomId::value).collect();
    assert_eq!(rooms, vec![0, 2]);

    client.stop().await;
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn set_target_reaches_the_wire_and_the_store() {
    let controller = MockController::start(&[1]).await;
    let client = controller.client();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.target_temperature().is_some()
    })
    .await;

    client.set_target_temperature(room, 21.5).await.unwrap();

    wait_for_room(&client, room, "setpoint update", |state| {
        state.target_temperature().map(|t| t.celsius()) == Some(21.5)
    })
    .await;

    // The controller itself was reprogrammed: wire value 43 for 21.5 °C.
    {
        let sim = controller.state.lock().unwrap();
        assert_eq!(sim.rooms[0].target_value, 43);
        assert!(sim.received.contains(&6)); // cid 1 * 4 + 2
    }

    client.stop().await;
}

#[tokio::test]
async fn switching_on_precedes_mode_selection() {
    let controller = MockController::start(&[1]).await;
    let client = controller.client();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.hvac_mode().is_some()
    })
    .await;

    client.set_hvac_mode(room, HvacMode::Cool).await.unwrap();

    wait_for_room(&client, room, "mode update", |state| {
        state.hvac_mode() == Some(HvacMode::Cool)
    })
    .await;

    {
        let sim = controller.state.lock().unwrap();
        assert!(sim.rooms[0].power_on);
        assert!(sim.rooms[0].cooling);
        // The power-on trace (cid 4) must hit the wire before the mode trace
        // (cid 5).
        let switch_pos = sim.received.iter().position(|&c| c == 4).unwrap();
        let mode_pos = sim.received.iter().position(|&c| c == 5).unwrap();
        assert!(switch_pos < mode_pos);
    }

    client.stop().await;
}

#[tokio::test]
async fn switching_off_uses_the_power_slot_only() {
    let controller = MockController::start(&[0]).await;
    let client = controller.client();
    client.start();

    let room = RoomId::new(0).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.hvac_mode().is_some()
    })
    .await;

    client.set_hvac_mode(room, HvacMode::Off).await.unwrap();

    wait_for_room(&client, room, "off update", |state| {
        state.hvac_mode() == Some(HvacMode::Off)
    })
    .await;

    {
        let sim = controller.state.lock().unwrap();
        assert!(!sim.rooms[0].power_on);
        // No operating-mode trace (cid 1) was sent for Off.
        assert!(!sim.received.contains(&1));
    }

    client.stop().await;
}

#[tokio::test]
async fn zero_data_confirmations_do_not_break_the_session() {
    let controller = MockController::start(&[1]).await;
    let client = controller.client();
    let mut events = client.subscribe();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.target_temperature().is_some()
    })
    .await;

    // Both writes are answered with bare `data 0x00` confirmations.
    client.set_target_temperature(room, 21.5).await.unwrap();
    client.set_hvac_mode(room, HvacMode::Heat).await.unwrap();

    // Ride out a few poll cycles: the session must stay up and the
    // setpoint must not collapse to a conversion of the zero byte.
    sleep(Duration::from_millis(900)).await;
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(
                event,
                ClientEvent::ConnectionChanged {
                    state: ConnectionState::Failed(_)
                }
            ),
            "session dropped: {event:?}"
        );
    }
    let state = client.get_room_state(room).await.unwrap();
    assert_eq!(state.target_temperature().map(|t| t.celsius()), Some(21.5));
    assert_eq!(state.hvac_mode(), Some(HvacMode::Heat));

    client.stop().await;
}

// ============================================================================
// Availability
// ============================================================================

#[tokio::test]
async fn silent_room_goes_stale_and_recovers() {
    let controller = MockController::start(&[1]).await;
    let client = TermowifiClient::builder(
        controller.address.0.clone(),
        controller.address.1,
    )
    .with_config(MockController::client_config().with_max_missed_polls(2))
    .build();
    let mut events = client.subscribe();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.current_temperature().is_some()
    })
    .await;

    controller.state.lock().unwrap().muted = true;
    wait_for_event(&mut events, "room marked unavailable", |e| {
        matches!(
            e,
            ClientEvent::AvailabilityChanged {
                available: false,
                ..
            }
        )
    })
    .await;
    assert!(!client.get_room_state(room).await.unwrap().is_available());

    controller.state.lock().unwrap().muted = false;
    wait_for_event(&mut events, "room available again", |e| {
        matches!(
            e,
            ClientEvent::AvailabilityChanged {
                available: true,
                ..
            }
        )
    })
    .await;
    assert!(client.get_room_state(room).await.unwrap().is_available());

    client.stop().await;
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn unreachable_controller_keeps_cycling_and_rejects_commands() {
    // Bind and immediately drop to get a port nothing listens on.
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = TermowifiClient::builder("127.0.0.1", dead_port)
        .with_config(MockController::client_config())
        .build();
    let mut connection = client.watch_connection();
    client.start();

    // The worker must cycle through Connecting and Failed without blocking.
    let deadline = Duration::from_secs(5);
    timeout(deadline, async {
        loop {
            connection.changed().await.unwrap();
            if matches!(*connection.borrow(), ConnectionState::Failed(_)) {
                break;
            }
        }
    })
    .await
    .expect("never reached Failed state");

    // No rooms were ever discovered.
    let room = RoomId::new(0).unwrap();
    assert!(matches!(
        client.get_room_state(room).await,
        Err(Error::RoomNotFound(0))
    ));
    assert!(matches!(
        client.set_target_temperature(room, 21.0).await,
        Err(Error::RoomNotFound(0))
    ));

    // Stop returns promptly even mid-backoff.
    timeout(Duration::from_secs(2), client.stop())
        .await
        .expect("stop deadlocked");
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn full_queue_rejects_instead_of_blocking() {
    // A refused port keeps the worker in its connect/backoff loop, where the
    // command queue is never drained.
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = TermowifiClient::builder("127.0.0.1", dead_port)
        .with_config(MockController::client_config())
        .with_queue_capacity(1)
        .build();
    client.start();

    client.refresh().await.unwrap();
    assert!(matches!(
        client.refresh().await,
        Err(Error::Command(termowifi::CommandError::QueueFull(1)))
    ));

    client.stop().await;
}

#[tokio::test]
async fn refresh_room_polls_outside_the_cycle() {
    let controller = MockController::start(&[2]).await;
    let client = controller.client();
    client.start();

    let room = RoomId::new(2).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.current_temperature().is_some()
    })
    .await;

    controller.state.lock().unwrap().rooms[0].ambient_value = value_from_ambient(22.5);
    client.refresh_room(room).await.unwrap();

    wait_for_room(&client, room, "refreshed ambient", |state| {
        state.current_temperature() == Some(22.5)
    })
    .await;

    client.stop().await;
}

#[tokio::test]
async fn dropped_session_reconnects_and_resumes_polling() {
    let controller = MockController::start(&[1]).await;
    let client = controller.client();
    let mut events = client.subscribe();
    client.start();

    let room = RoomId::new(1).unwrap();
    wait_for_room(&client, room, "initial poll", |state| {
        state.current_temperature().is_some()
    })
    .await;

    // Kill the session mid-flight.
    controller.drop_next.store(true, Ordering::SeqCst);

    wait_for_event(&mut events, "session failure", |e| {
        matches!(
            e,
            ClientEvent::ConnectionChanged {
                state: ConnectionState::Failed(_)
            }
        )
    })
    .await;
    wait_for_event(&mut events, "reconnect", |e| {
        matches!(
            e,
            ClientEvent::ConnectionChanged {
                state: ConnectionState::Connected
            }
        )
    })
    .await;

    // Polling resumes on the new session.
    wait_for_room(&client, room, "poll after reconnect", |state| {
        state.is_available() && state.current_temperature().is_some()
    })
    .await;

    client.stop().await;
}

// ============================================================================
// Callbacks
// ============================================================================

#[tokio::test]
async fn callbacks_fire_alongside_events() {
    let controller = MockController::start(&[3]).await;
    let client = controller.client();

    let discovered = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&discovered);
    client.on_room_discovered(move |room| {
        if room.value() == 3 {
            flag.store(true, Ordering::SeqCst);
        }
    });

    client.start();

    // Poll answers land well after the discovery dispatch, so the callback
    // has fired by the time sensor data shows up.
    let room = RoomId::new(3).unwrap();
    wait_for_room(&client, room, "first poll", |state| {
        state.current_temperature().is_some()
    })
    .await;
    assert!(discovered.load(Ordering::SeqCst));

    client.stop().await;
}
