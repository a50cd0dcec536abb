//! The custom HID Prelude.
//!
//! The purpose of this module is to alleviate imports of structs and enums
//! required to instance a custom HID device:
//!
//! ```
//! # #![allow(unused_imports)]
//! use usbd_custom_hid::prelude::*;
//! ```

pub use crate::config::{DeviceConfig, DeviceConfigBuilder, UsbHidBuilderError};
pub use crate::descriptor::{HidProtocol, PowerStatus, ReportType};
pub use crate::device::{CustomHidDevice, DeviceParts, InitError};
pub use crate::event::{
    ControlEvent, ControlResponse, EventHandler, Notification, TransmitEvent,
};
pub use crate::report::{IdleRecord, TransferState};
pub use crate::transport::{DeviceRegistration, HidClassDriver, RegistrationError};
pub use crate::usb_class::{EndpointTransport, UsbCustomHidClass};
pub use crate::CustomHidError;
