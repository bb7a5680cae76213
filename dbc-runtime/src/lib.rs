//! Runtime message/setting binding, device session helpers, and the
//! generator interface over a resolved CAN device IR.
//!
//! `dbc-schema::load_device` produces an immutable [`dbc_asm::Device`];
//! [`binding::Runtime`] binds it to one device instance, turning records
//! into [`dbc_types::Frame`]s and back. [`session::Session`] layers the
//! blocking fetch/set-setting conveniences a live bus conversation needs on
//! top of a caller-supplied [`session::Transport`]. [`generator::DeviceView`]
//! exposes the read-only walk code/doc emitters drive.

#![warn(missing_docs)]

pub mod binding;
pub mod error;
pub mod generator;
pub mod session;

pub use binding::{
    DecodedMessage,
    Runtime,
    SettingReport,
    REPORT_SETTING_MESSAGE_ID,
    SET_SETTING_MESSAGE_ID,
};
pub use error::RuntimeError;
pub use generator::{
    DeviceView,
    OffsetTableEmitter,
    OffsetTableRow,
};
pub use session::{
    Session,
    Transport,
};
