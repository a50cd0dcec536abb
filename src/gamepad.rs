//!HID Gamepad, a ready made report layout for [`CustomHidDevice`](crate::device::CustomHidDevice)
use packed_struct::prelude::*;

/// Size of a packed [`GamepadReport`]
pub const GAMEPAD_REPORT_SIZE: usize = 6;

/// 16 buttons and four signed axes, no report id
#[rustfmt::skip]
pub const GAMEPAD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop),
    0x09, 0x05, // Usage (Game Pad),
    0xA1, 0x01, // Collection (Application),
    0xA1, 0x00, //   Collection (Physical),
    0x05, 0x09, //     Usage Page (Buttons),
    0x19, 0x01, //     Usage Minimum (1),
    0x29, 0x10, //     Usage Maximum (16),
    0x15, 0x00, //     Logical Minimum (0),
    0x25, 0x01, //     Logical Maximum (1),
    0x75, 0x01, //     Report Size (1),
    0x95, 0x10, //     Report Count (16),
    0x81, 0x02, //     Input (Data, Variable, Absolute),
    0x05, 0x01, //     Usage Page (Generic Desktop),
    0x09, 0x30, //     Usage (X),
    0x09, 0x31, //     Usage (Y),
    0x09, 0x32, //     Usage (Z),
    0x09, 0x33, //     Usage (Rx),
    0x15, 0x81, //     Logical Minimum (-127),
    0x25, 0x7F, //     Logical Maximum (127),
    0x75, 0x08, //     Report Size (8),
    0x95, 0x04, //     Report Count (4),
    0x81, 0x02, //     Input (Data, Variable, Absolute),
    0xC0,       //   End Collection
    0xC0,       // End Collection
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, PackedStruct)]
#[packed_struct(endian = "lsb", size_bytes = "6")]
pub struct GamepadReport {
    /// Bit 0 is button 1
    #[packed_field]
    pub buttons: u16,
    #[packed_field]
    pub x: i8,
    #[packed_field]
    pub y: i8,
    #[packed_field]
    pub z: i8,
    #[packed_field]
    pub rx: i8,
}
