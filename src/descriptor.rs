//! HID descriptor constants and enumerations
use num_enum::{IntoPrimitive, TryFromPrimitive};
use packed_struct::prelude::*;

pub(crate) const USB_CLASS_HID: u8 = 0x03;
pub(crate) const SPEC_VERSION_1_11: u16 = 0x0111; //1.11 in BCD
pub(crate) const COUNTRY_CODE_NOT_SUPPORTED: u8 = 0x0;

/// Largest interrupt packet a full speed device may send
pub const MAX_REPORT_SIZE: usize = 64;

/// Positions within [`DeviceConfig::strings`](crate::config::DeviceConfig::strings)
pub const STRING_MANUFACTURER: usize = 0;
pub const STRING_PRODUCT: usize = 1;
pub const STRING_SERIAL_NUMBER: usize = 2;
pub const STRING_INTERFACE: usize = 3;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum InterfaceProtocol {
    None = 0x00,
    Keyboard = 0x01,
    Mouse = 0x02,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PrimitiveEnum, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum DescriptorType {
    Hid = 0x21,
    Report = 0x22,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum InterfaceSubClass {
    None = 0x00,
    Boot = 0x01,
}

/// Report protocol negotiated with the host - HID spec 7.2.5
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HidProtocol {
    Boot = 0x00,
    Report = 0x01,
}

impl Default for HidProtocol {
    //When initialized, all devices default to report protocol - Hid spec 7.2.6 Set_Protocol Request
    fn default() -> Self {
        Self::Report
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub(crate) enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0A,
    SetProtocol = 0x0B,
}

/// Report type carried in the high byte of a Get_Report / Set_Report value - HID spec 7.2.1
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ReportType {
    Input = 0x01,
    Output = 0x02,
    Feature = 0x03,
}

/// Device power source, reported to the host in the Get_Status response
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PowerStatus {
    BusPowered = 0x00,
    SelfPowered = 0x01,
}

#[derive(Debug, PackedStruct)]
#[packed_struct(endian = "lsb", size_bytes = 7)]
struct HidDescriptorBody {
    bcd_hid: u16,
    country_code: u8,
    num_descriptors: u8,
    #[packed_field(ty = "enum", size_bytes = "1")]
    descriptor_type: DescriptorType,
    descriptor_length: u16,
}

/// Body of the class specific HID descriptor, without the length and type header
pub(crate) fn hid_descriptor_body(report_descriptor_length: u16) -> [u8; 7] {
    match (HidDescriptorBody {
        bcd_hid: SPEC_VERSION_1_11,
        country_code: COUNTRY_CODE_NOT_SUPPORTED,
        num_descriptors: 1,
        descriptor_type: DescriptorType::Report,
        descriptor_length: report_descriptor_length,
    }
    .pack())
    {
        Ok(d) => d,
        Err(_) => panic!("Failed to pack HidDescriptor"),
    }
}
