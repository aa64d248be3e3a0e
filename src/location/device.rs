use log::debug;

use super::resolver::{Permission, PositionProvider};
use crate::config::LocationConfig;
use crate::error::LocationError;
use crate::state::data::Coordinate;

/// On-device position source for desktops
///
/// Desktops rarely carry a positioning sensor, so the "fix" is whatever
/// the user pinned in the config. Turning location off in the config is
/// the foreground permission being denied.
#[derive(Debug, Clone, Default)]
pub struct DevicePosition {
    enabled: bool,
    pinned: Option<Coordinate>,
}

impl DevicePosition {
    pub fn new(enabled: bool, pinned: Option<Coordinate>) -> Self {
        Self { enabled, pinned }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(config.enabled, config.device_coordinate())
    }
}

impl PositionProvider for DevicePosition {
    async fn request_permission(&self) -> Result<Permission, LocationError> {
        debug!("Location permission: {}", if self.enabled { "granted" } else { "denied" });
        Ok(if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        })
    }

    async fn precise_fix(&self) -> Result<Coordinate, LocationError> {
        self.pinned
            .ok_or_else(|| LocationError::FixFailed("no device position configured".to_string()))
    }
}
