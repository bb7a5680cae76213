//! Runtime message/setting binding: turns a resolved [`Device`] IR plus a
//! device instance id into [`Frame`]s, and routes incoming frames back to a
//! typed record without regenerating per-message code.
//!
//! This is the "option b" interpreter side of a pack/unpack duality also
//! seen in `fuel-asm`/`fuel-vm`, which draw the same line between a
//! generated instruction table and a runtime-driven one: `dbc-derive`'s
//! `#[derive(CanFrame)]` is option (a), this module is option (b), and both
//! must agree with [`dbc_asm::codec`]'s bit layout.

use std::collections::BTreeMap;
use std::sync::Arc;

use dbc_asm::{
    Device,
    Signal,
    Value,
};
use dbc_types::{
    Arbitration,
    Frame,
    VENDOR_ID,
};

use crate::error::RuntimeError;

/// Message id carrying a "set setting" request: `{address, value, flags}`.
pub const SET_SETTING_MESSAGE_ID: u8 = 0x1E;

/// Message id carrying a "report setting" response, same shape as
/// [`SET_SETTING_MESSAGE_ID`].
pub const REPORT_SETTING_MESSAGE_ID: u8 = 0x1F;

/// One decoded message, identified by name, with its signal values in
/// declaration order (parallel to `Message::signals`).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Message name, as declared in the device spec.
    pub name: String,
    /// Decoded values, one per declared signal (`None` for an absent
    /// trailing optional, or a signal that fell past the frame's `dlc`).
    pub values: Vec<Option<Value>>,
}

/// A decoded "report setting" response: the setting's id and its raw value
/// bytes, read back off the standard setting-response shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingReport {
    /// Setting id the response is addressing.
    pub address: u8,
    /// Raw little-endian value bytes, as reported by the device.
    pub value: Vec<u8>,
}

/// Binds a resolved [`Device`] IR to runtime encode/decode, caching the
/// message-id → name index built once at construction so lookups during
/// decode don't walk the whole message map per frame.
#[derive(Debug, Clone)]
pub struct Runtime {
    device: Arc<Device>,
    message_by_id: BTreeMap<u8, String>,
}

impl Runtime {
    /// Binds to `device`, indexing its messages by id.
    pub fn new(device: Arc<Device>) -> Self {
        let message_by_id = device
            .messages
            .iter()
            .map(|(name, m)| (m.id, name.clone()))
            .collect();
        Self {
            device,
            message_by_id,
        }
    }

    /// The bound device IR.
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Packs `values` against the named message's signal list and composes
    /// the frame's arbitration id for `device_id`. DLC is the message's
    /// `min_length` unless a trailing optional was populated, in which case
    /// it is promoted to `max_length`.
    #[tracing::instrument(skip(self, values), fields(message = message_name))]
    pub fn encode(
        &self,
        message_name: &str,
        values: &[Option<Value>],
        device_id: u8,
    ) -> Result<Frame, RuntimeError> {
        let message = self
            .device
            .messages
            .get(message_name)
            .ok_or_else(|| RuntimeError::UnknownMessage(message_name.to_string()))?;
        let (payload, used_optional) = dbc_asm::encode(&message.signals, values)?;
        let dlc = if used_optional {
            message.max_length
        } else {
            message.min_length
        };
        let arb = self.arbitration(message.id, device_id)?;
        tracing::trace!(dlc, arb_id = arb.pack(), "encoded message");
        Ok(Frame::new(arb.pack(), dlc, payload))
    }

    /// Identifies and decodes `frame`, returning `None` if it does not
    /// belong to this device family or carries an unknown message id.
    /// Lenient: a required signal past the frame's `dlc` decodes to `None`
    /// rather than failing — see [`Runtime::decode_any_strict`] for the
    /// caller-selectable strict mode.
    #[tracing::instrument(skip(self, frame))]
    pub fn decode_any(&self, frame: &Frame) -> Option<DecodedMessage> {
        let (name, message) = self.identify(frame)?;
        let values = dbc_asm::decode(&message.signals, frame.payload, frame.payload_bits());
        tracing::trace!(message = name.as_str(), dlc = frame.dlc, "decoded message");
        Some(DecodedMessage {
            name: name.clone(),
            values,
        })
    }

    /// Strict variant of [`Runtime::decode_any`]: fails with
    /// [`RuntimeError::Codec`]`(`[`dbc_asm::CodecError::ShortPayload`]`)` if a
    /// required signal's offset exceeds the frame's `dlc * 8` bits, instead
    /// of silently decoding it to `None`. Returns `Ok(None)` for a frame
    /// outside this device family, same as the lenient path.
    #[tracing::instrument(skip(self, frame))]
    pub fn decode_any_strict(&self, frame: &Frame) -> Result<Option<DecodedMessage>, RuntimeError> {
        let Some((name, message)) = self.identify(frame) else {
            return Ok(None);
        };
        let values = dbc_asm::decode_strict(&message.signals, frame.payload, frame.payload_bits())?;
        tracing::trace!(message = name.as_str(), dlc = frame.dlc, "decoded message (strict)");
        Ok(Some(DecodedMessage {
            name: name.clone(),
            values,
        }))
    }

    fn identify(&self, frame: &Frame) -> Option<(&String, &dbc_asm::Message)> {
        let arb = Arbitration::unpack(frame.arb_id);
        if arb.device_type != self.device.dev_type {
            return None;
        }
        if dbc_types::vendor_id(frame.arb_id) != VENDOR_ID {
            return None;
        }
        let name = self.message_by_id.get(&arb.message_id())?;
        let message = self.device.messages.get(name)?;
        Some((name, message))
    }

    /// Builds a "fetch setting" request frame for the named setting.
    pub fn setting_read(&self, setting_name: &str, device_id: u8) -> Result<Frame, RuntimeError> {
        let setting = self.lookup_setting(setting_name)?;
        let values = setting_request_values(setting.id, &[]);
        let (payload, _) = dbc_asm::encode(&setting_request_signals(), &values)?;
        let arb = self.arbitration(SET_SETTING_MESSAGE_ID, device_id)?;
        tracing::trace!(setting = setting_name, "built setting read request");
        Ok(Frame::new(arb.pack(), 8, payload))
    }

    /// Builds a "set setting" request frame writing `value` (little-endian
    /// bytes, at most 6 per the `buf48` shape) to the named setting.
    pub fn setting_write(
        &self,
        setting_name: &str,
        value: &[u8],
        device_id: u8,
    ) -> Result<Frame, RuntimeError> {
        let setting = self.lookup_setting(setting_name)?;
        let values = setting_request_values(setting.id, value);
        let (payload, _) = dbc_asm::encode(&setting_request_signals(), &values)?;
        let arb = self.arbitration(SET_SETTING_MESSAGE_ID, device_id)?;
        tracing::trace!(setting = setting_name, "built setting write request");
        Ok(Frame::new(arb.pack(), 8, payload))
    }

    /// Decodes a "report setting" response frame into its address and raw
    /// value bytes, or `None` if `frame` is not a report-setting response
    /// from this device. Lenient, like [`Runtime::decode_any`].
    pub fn decode_setting_report(&self, frame: &Frame) -> Option<SettingReport> {
        if !self.is_setting_report(frame) {
            return None;
        }
        let values = dbc_asm::decode(&setting_request_signals(), frame.payload, frame.payload_bits());
        Self::setting_report_from_values(&values)
    }

    /// Strict variant of [`Runtime::decode_setting_report`]: fails with
    /// [`RuntimeError::Codec`]`(`[`dbc_asm::CodecError::ShortPayload`]`)` if
    /// the frame's `dlc` is too short for the setting envelope's `address`
    /// or `value` fields. Returns `Ok(None)` for a non-report frame, same as
    /// the lenient path.
    pub fn decode_setting_report_strict(
        &self,
        frame: &Frame,
    ) -> Result<Option<SettingReport>, RuntimeError> {
        if !self.is_setting_report(frame) {
            return Ok(None);
        }
        let values =
            dbc_asm::decode_strict(&setting_request_signals(), frame.payload, frame.payload_bits())?;
        Ok(Self::setting_report_from_values(&values))
    }

    fn is_setting_report(&self, frame: &Frame) -> bool {
        let arb = Arbitration::unpack(frame.arb_id);
        arb.device_type == self.device.dev_type && arb.message_id() == REPORT_SETTING_MESSAGE_ID
    }

    fn setting_report_from_values(values: &[Option<Value>]) -> Option<SettingReport> {
        let Some(Some(Value::UInt(address))) = values.first().cloned() else {
            return None;
        };
        let Some(Some(Value::Buf(value))) = values.get(1).cloned() else {
            return None;
        };
        Some(SettingReport {
            address: address as u8,
            value,
        })
    }

    fn lookup_setting(&self, setting_name: &str) -> Result<&dbc_asm::Setting, RuntimeError> {
        self.device
            .settings
            .get(setting_name)
            .ok_or_else(|| RuntimeError::UnknownSetting(setting_name.to_string()))
    }

    fn arbitration(&self, api_index: u8, device_id: u8) -> Result<Arbitration, RuntimeError> {
        Arbitration::new(self.device.dev_type, api_index as u16, device_id)
            .map_err(|e| RuntimeError::Transport(e.to_string()))
    }
}

/// The standard "set/report setting" message shape: `{address: u8,
/// value: buf48, flags: struct}`. The `flags` struct's exact bit layout is
/// not pinned down by the schema this binds against — it is a fixed,
/// device-independent envelope — so it is kept as a single reserved byte
/// here rather than modelled as a named bitset.
fn setting_request_signals() -> Vec<Signal> {
    vec![
        Signal::required("address", dbc_asm::DType::UInt {
            width: 8,
            min: 0,
            max: 255,
            default: 0,
            factor_num: 1,
            factor_den: 1,
            offset: 0.0,
        }),
        Signal::required("value", dbc_asm::DType::Buf { width: 48, default: 0 }),
        Signal::required("flags", dbc_asm::DType::UInt {
            width: 8,
            min: 0,
            max: 255,
            default: 0,
            factor_num: 1,
            factor_den: 1,
            offset: 0.0,
        }),
    ]
}

fn setting_request_values(address: u8, value: &[u8]) -> Vec<Option<Value>> {
    vec![
        Some(Value::UInt(address as u64)),
        Some(Value::Buf(value.to_vec())),
        Some(Value::UInt(0)),
    ]
}
