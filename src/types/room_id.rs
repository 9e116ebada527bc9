// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Identifier of a thermostat zone on the device.
///
/// The Termowifi controller addresses at most five zones; room ids are the
/// stable integers `0..=4` reported by the device during discovery.
///
/// # Examples
///
/// ```
/// use termowifi::types::RoomId;
///
/// let room = RoomId::new(1).unwrap();
/// assert_eq!(room.value(), 1);
///
/// assert!(RoomId::new(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(u8);

impl RoomId {
    /// Highest room id the device can address.
    pub const MAX: u8 = 4;

    /// Creates a new room id.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::RoomIdOutOfRange` if `id` exceeds [`RoomId::MAX`].
    pub fn new(id: u8) -> Result<Self, ValueError> {
        if id > Self::MAX {
            return Err(ValueError::RoomIdOutOfRange {
                max: Self::MAX,
                actual: id,
            });
        }
        Ok(Self(id))
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Command id base for this room's field answers (`id * 4`).
    #[must_use]
    pub(crate) const fn command_base(&self) -> u8 {
        self.0 * 4
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Room {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids_accepted() {
        for id in 0..=RoomId::MAX {
            assert_eq!(RoomId::new(id).unwrap().value(), id);
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(matches!(
            RoomId::new(5),
            Err(ValueError::RoomIdOutOfRange { max: 4, actual: 5 })
        ));
    }

    #[test]
    fn command_bases() {
        assert_eq!(RoomId::new(2).unwrap().command_base(), 8);
        assert_eq!(RoomId::new(0).unwrap().command_base(), 0);
    }

    #[test]
    fn display_format() {
        assert_eq!(RoomId::new(3).unwrap().to_string(), "Room 3");
    }
}
