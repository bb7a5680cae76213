//! Device session conveniences layered on top of [`crate::binding::Runtime`]:
//! a blocking fetch/set-setting round trip, a drain helper, a time-windowed
//! collect, and a broadcast enumerate — all pure transformations over
//! frames plus a caller-supplied [`Transport`], mirroring how `fuel-vm`'s
//! interpreter takes a generic storage backend instead of performing its
//! own I/O.
//!
//! Grounded in `pycanandmessage/device.py`'s `fetch_setting`/`set_setting`
//! device-session methods, reworked behind a trait so this crate stays
//! transport-agnostic (no SocketCAN, no USB-CAN adapter, no actual blocking
//! reads live here).

use std::time::Duration;

use dbc_types::Frame;

use crate::binding::{
    DecodedMessage,
    Runtime,
    SettingReport,
};
use crate::error::RuntimeError;

/// A bus transport the session helpers drive requests through. Implementors
/// own the actual SocketCAN/USB-CAN/simulated connection; this trait only
/// describes the synchronous send/receive shape the session needs.
pub trait Transport {
    /// Sends `frame` on the bus.
    fn send(&mut self, frame: &Frame) -> Result<(), RuntimeError>;

    /// Blocks for up to `timeout` waiting for the next received frame, or
    /// returns `None` on timeout with no error.
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Frame>, RuntimeError>;
}

/// A device session: a bound [`Runtime`] plus a transport, offering the
/// request/response ergonomics a live bus conversation needs.
pub struct Session<'a, T: Transport> {
    runtime: &'a Runtime,
    transport: T,
    device_id: u8,
}

impl<'a, T: Transport> Session<'a, T> {
    /// Opens a session against `device_id` over `transport`.
    pub fn new(runtime: &'a Runtime, transport: T, device_id: u8) -> Self {
        Self {
            runtime,
            transport,
            device_id,
        }
    }

    /// Sends a "fetch setting" request and blocks until a matching
    /// "report setting" response arrives or `timeout` elapses.
    #[tracing::instrument(skip(self))]
    pub fn fetch_setting(
        &mut self,
        setting_name: &str,
        timeout: Duration,
    ) -> Result<SettingReport, RuntimeError> {
        let setting = self
            .runtime
            .device()
            .settings
            .get(setting_name)
            .ok_or_else(|| RuntimeError::UnknownSetting(setting_name.to_string()))?;
        let address = setting.id;
        let request = self.runtime.setting_read(setting_name, self.device_id)?;
        self.transport.send(&request)?;

        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Err(RuntimeError::Timeout(setting_name.to_string()));
            }
            let Some(frame) = self.transport.recv_timeout(remaining)? else {
                return Err(RuntimeError::Timeout(setting_name.to_string()));
            };
            if let Some(report) = self.runtime.decode_setting_report(&frame) {
                if report.address == address {
                    return Ok(report);
                }
            }
        }
    }

    /// Sends a "set setting" request writing `value`, then blocks for the
    /// device's echoed "report setting" confirmation.
    #[tracing::instrument(skip(self, value))]
    pub fn set_setting(
        &mut self,
        setting_name: &str,
        value: &[u8],
        timeout: Duration,
    ) -> Result<SettingReport, RuntimeError> {
        let setting = self
            .runtime
            .device()
            .settings
            .get(setting_name)
            .ok_or_else(|| RuntimeError::UnknownSetting(setting_name.to_string()))?;
        let address = setting.id;
        let request = self.runtime.setting_write(setting_name, value, self.device_id)?;
        self.transport.send(&request)?;

        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Err(RuntimeError::Timeout(setting_name.to_string()));
            }
            let Some(frame) = self.transport.recv_timeout(remaining)? else {
                return Err(RuntimeError::Timeout(setting_name.to_string()));
            };
            if let Some(report) = self.runtime.decode_setting_report(&frame) {
                if report.address == address {
                    return Ok(report);
                }
            }
        }
    }

    /// Drains and decodes every frame currently waiting on the transport,
    /// without blocking once it is empty.
    pub fn drain(&mut self) -> Result<Vec<DecodedMessage>, RuntimeError> {
        let mut out = Vec::new();
        while let Some(frame) = self.transport.recv_timeout(Duration::ZERO)? {
            if let Some(decoded) = self.runtime.decode_any(&frame) {
                out.push(decoded);
            }
        }
        Ok(out)
    }

    /// Collects decoded messages arriving within `window`, stopping early
    /// once the window elapses.
    pub fn collect(&mut self, window: Duration) -> Result<Vec<DecodedMessage>, RuntimeError> {
        let deadline = std::time::Instant::now() + window;
        let mut out = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return Ok(out);
            }
            match self.transport.recv_timeout(remaining)? {
                Some(frame) => {
                    if let Some(decoded) = self.runtime.decode_any(&frame) {
                        out.push(decoded);
                    }
                }
                None => return Ok(out),
            }
        }
    }

    /// Broadcasts an "enumerate" request (device id 0x3F, the all-devices
    /// instance slot) and collects replies for `window`.
    pub fn enumerate(&mut self, window: Duration) -> Result<Vec<DecodedMessage>, RuntimeError> {
        const BROADCAST_DEVICE_ID: u8 = 0x3F;
        let public = self.runtime.device().public_messages_descending();
        let Some(enumerate_message) = public.iter().find(|m| m.signals.is_empty()) else {
            return self.collect(window);
        };
        let arb = dbc_types::Arbitration::new(
            self.runtime.device().dev_type,
            enumerate_message.id as u16,
            BROADCAST_DEVICE_ID,
        )
        .map_err(|e| RuntimeError::Transport(e.to_string()))?;
        self.transport.send(&Frame::new(arb.pack(), 0, 0))?;
        self.collect(window)
    }
}
