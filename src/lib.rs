// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Termowifi - A Rust library to control Orkli Termowifi thermostat
//! controllers over TCP.
//!
//! The controller manages up to five rooms, each with a target temperature,
//! an ambient temperature and humidity reading, and a heat/cool/off mode.
//! This library keeps a local mirror of that state: a background worker owns
//! the TCP session, discovers rooms, polls them on an interval, and pushes
//! write commands from a bounded queue onto the wire.
//!
//! # Supported Features
//!
//! - **Room discovery**: The controller announces its rooms at session start
//! - **Climate control**: Target temperature in 0.5 °C steps, heat/cool/off
//! - **Sensor readings**: Ambient temperature and relative humidity
//! - **Availability tracking**: Rooms that stop answering polls are flagged
//! - **Auto-reconnect**: Exponential backoff with no upper attempt limit
//!
//! # Quick Start
//!
//! ```no_run
//! use termowifi::{HvacMode, RoomId, TermowifiClient};
//!
//! #[tokio::main]
//! async fn main() -> termowifi::Result<()> {
//!     let client = TermowifiClient::new("192.168.1.50", 5000);
//!     client.start();
//!
//!     // The worker discovers rooms in the background; give it a moment
//!     // or watch events to know when a room appears.
//!     let room = RoomId::new(0)?;
//!     client.set_hvac_mode(room, HvacMode::Heat).await?;
//!     client.set_target_temperature(room, 21.5).await?;
//!
//!     let state = client.get_room_state(room).await?;
//!     println!("{:?}", state.current_temperature());
//!
//!     client.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Events and Callbacks
//!
//! State changes can be observed as a broadcast stream or via callbacks:
//!
//! ```no_run
//! use termowifi::{ClientEvent, TermowifiClient};
//!
//! #[tokio::main]
//! async fn main() -> termowifi::Result<()> {
//!     let client = TermowifiClient::new("192.168.1.50", 5000);
//!
//!     client.on_room_updated(|room, state| {
//!         println!("{room}: {:?} °C", state.current_temperature());
//!     });
//!
//!     let mut events = client.subscribe();
//!     client.start();
//!
//!     while let Ok(event) = events.recv().await {
//!         if let ClientEvent::ConnectionChanged { state } = event {
//!             println!("connection: {state}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod state;
pub mod subscription;
pub mod types;
mod worker;

pub use client::{TermowifiClient, TermowifiClientBuilder};
pub use codec::{Frame, FrameDecoder, RoomField, TraceBuilder};
pub use config::ClientConfig;
pub use connection::{ConnectionState, DeviceAddress, ReconnectionPolicy};
pub use error::{CommandError, ConnectionError, Error, ParseError, Result, ValueError};
pub use event::{ClientEvent, EventBus};
pub use state::{RoomState, RoomStore};
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use types::{HvacMode, RoomId, TargetTemperature};
