use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;

use crate::error::LocationError;
use crate::state::data::Coordinate;

/// How long the precise fix may take before we fall back
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_millis(5000);

/// Outcome of a foreground location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// An on-device position source (GPS, OS location service, fixed config)
pub trait PositionProvider: Send + Sync {
    /// Ask for foreground location access. An `Err` means the check itself failed.
    fn request_permission(&self) -> impl Future<Output = Result<Permission, LocationError>> + Send;

    /// A single low-accuracy fix. The resolver bounds how long it may take.
    fn precise_fix(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// A coarse coordinate for the caller's public network egress point
pub trait NetworkLocator: Send + Sync {
    fn lookup(&self) -> impl Future<Output = Result<Coordinate, LocationError>> + Send;
}

/// Resolves the current coordinate through a strict fallback chain:
///
/// 1. Foreground permission. Denied or errored skips straight to step 3.
/// 2. One precise fix, bounded by `fix_timeout`. Any failure falls through.
/// 3. Exactly one network lookup. Its failure is the only error callers see.
///
/// Steps never run in parallel.
pub struct Resolver<P, N> {
    device: P,
    network: N,
    fix_timeout: Duration,
}

impl<P: PositionProvider, N: NetworkLocator> Resolver<P, N> {
    pub fn new(device: P, network: N) -> Self {
        Self {
            device,
            network,
            fix_timeout: DEFAULT_FIX_TIMEOUT,
        }
    }

    /// Replace the bound on the precise fix wait
    pub fn with_timeout(mut self, fix_timeout: Duration) -> Self {
        self.fix_timeout = fix_timeout;
        self
    }

    /// Returns a full coordinate or `LocationError::Unavailable`, never anything partial
    pub async fn resolve_current_coordinate(&self) -> Result<Coordinate, LocationError> {
        match self.device_fix().await {
            Ok(coordinate) => {
                debug!("📍 Device fix: {}", coordinate.display());
                return Ok(coordinate);
            }
            Err(e) => info!("📍 Device location unavailable ({}), trying network lookup", e),
        }

        match self.network.lookup().await {
            Ok(coordinate) => {
                debug!("📍 Network lookup: {}", coordinate.display());
                Ok(coordinate)
            }
            Err(e) => {
                warn!("⚠️  Network location lookup failed: {}", e);
                Err(LocationError::Unavailable {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Steps 1 and 2. Every error here is recoverable.
    async fn device_fix(&self) -> Result<Coordinate, LocationError> {
        match self.device.request_permission().await? {
            Permission::Granted => {}
            Permission::Denied => return Err(LocationError::PermissionDenied),
        }

        let coordinate = tokio::time::timeout(self.fix_timeout, self.device.precise_fix())
            .await
            .map_err(|_| LocationError::Timeout(self.fix_timeout))??;

        // A sensor reporting garbage counts as a failed fix
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(LocationError::FixFailed(format!(
                "out-of-range fix {}",
                coordinate.display()
            )))
        }
    }
}
