//! The generator interface (C8): a narrow, read-only view over a [`Device`]
//! that a code emitter and a doc emitter can share without either depending
//! on the other's output format.
//!
//! Generators must never re-derive bit layout themselves — they ask the IR
//! for each signal's effective `(offset, width)` via [`dbc_asm::signal_offsets`]
//! and replicate the codec's semantics exactly when emitting target-language
//! pack/unpack code. No concrete code emitter ships here; [`OffsetTableEmitter`]
//! is the reference emitter used to exercise the walk and the
//! monotone-offset property.

use dbc_asm::{
    Device,
    Message,
    Setting,
};

/// A read-only walk over a [`Device`]'s generator-facing surface, in the
/// guaranteed iteration order: messages descending by id (public only),
/// settings ascending by id.
pub trait DeviceView {
    /// Public messages with their names, descending by id.
    fn messages(&self) -> Vec<(&str, &Message)>;

    /// Settings, ascending by id.
    fn settings(&self) -> Vec<&Setting>;

    /// The `(offset, width)` of every non-padding signal in a message, in
    /// declaration order.
    fn message_layout(&self, message: &Message) -> Vec<(u32, u32)>;
}

impl DeviceView for Device {
    fn messages(&self) -> Vec<(&str, &Message)> {
        let mut out: Vec<(&str, &Message)> = self
            .messages
            .iter()
            .filter(|(_, m)| m.is_public)
            .map(|(name, m)| (name.as_str(), m))
            .collect();
        out.sort_by_key(|(_, m)| std::cmp::Reverse(m.id));
        out
    }

    fn settings(&self) -> Vec<&Setting> {
        self.settings_ascending()
    }

    fn message_layout(&self, message: &Message) -> Vec<(u32, u32)> {
        dbc_asm::signal_offsets(&message.signals)
    }
}

/// One row of the reference offset-table emitter's output: a message name
/// and its signals' `(name, offset, width)` triples.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTableRow {
    /// Message name.
    pub message: String,
    /// `(signal name, bit offset, bit width)`, in declaration order,
    /// padding signals omitted.
    pub signals: Vec<(String, u32, u32)>,
}

/// A minimal reference emitter: walks a [`DeviceView`] and produces one
/// [`OffsetTableRow`] per public message. Exists to demonstrate the
/// generator interface and to give the monotone-offset invariant (spec
/// testable property 4) a concrete consumer to check against.
pub struct OffsetTableEmitter;

impl OffsetTableEmitter {
    /// Emits the offset table for every public message on `device`.
    pub fn emit(device: &impl DeviceView) -> Vec<OffsetTableRow> {
        device
            .messages()
            .into_iter()
            .map(|(name, message)| {
                let offsets = device.message_layout(message);
                let named: Vec<(String, u32, u32)> = message
                    .signals
                    .iter()
                    .filter(|s| !matches!(s.dtype, dbc_asm::DType::Pad { .. }))
                    .zip(offsets)
                    .map(|(signal, (offset, width))| (signal.name.clone(), offset, width))
                    .collect();
                OffsetTableRow {
                    message: name.to_string(),
                    signals: named,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dbc_asm::{
        DType,
        Signal,
        Source,
    };

    use super::*;

    fn uint(width: u32) -> DType {
        DType::UInt {
            width,
            min: 0,
            max: DType::default_uint_max(width),
            default: 0,
            factor_num: 1,
            factor_den: 1,
            offset: 0.0,
        }
    }

    fn test_device() -> Device {
        let mut messages = BTreeMap::new();
        messages.insert(
            "Status".to_string(),
            Message {
                id: 5,
                comment: String::new(),
                min_length: 3,
                max_length: 3,
                source: Source::Device,
                is_public: true,
                signals: vec![
                    Signal::required("a", uint(8)),
                    Signal::required("gap", DType::Pad { width: 4 }),
                    Signal::required("b", uint(12)),
                ],
            },
        );
        messages.insert(
            "Internal".to_string(),
            Message {
                id: 1,
                comment: String::new(),
                min_length: 1,
                max_length: 1,
                source: Source::Device,
                is_public: false,
                signals: vec![],
            },
        );
        Device {
            name: "Test".into(),
            arch: "test".into(),
            dev_type: 1,
            dev_class: "test".into(),
            messages,
            settings: BTreeMap::new(),
            enums: BTreeMap::new(),
            structs: BTreeMap::new(),
            bitsets: BTreeMap::new(),
        }
    }

    #[test]
    fn emit_skips_non_public_messages() {
        let device = test_device();
        let rows = OffsetTableEmitter::emit(&device);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn emit_reports_monotone_non_overlapping_offsets() {
        let device = test_device();
        let rows = OffsetTableEmitter::emit(&device);
        let row = &rows[0];
        assert_eq!(row.signals, vec![
            ("a".to_string(), 0, 8),
            ("b".to_string(), 12, 12),
        ]);
        for pair in row.signals.windows(2) {
            assert!(pair[0].1 + pair[0].2 <= pair[1].1);
        }
    }
}
