// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client events and the broadcast bus that delivers them.

mod event_bus;
mod room_event;

pub use event_bus::EventBus;
pub use room_event::ClientEvent;
