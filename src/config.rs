//! Static configuration of a custom HID device

use crate::descriptor::{
    InterfaceProtocol, InterfaceSubClass, STRING_INTERFACE, STRING_MANUFACTURER, STRING_PRODUCT,
    STRING_SERIAL_NUMBER,
};
use fugit::{ExtU32, MillisDurationU32};
use usb_device::bus::{UsbBus, UsbBusAllocator};
use usb_device::device::{UsbDeviceBuilder, UsbVidPid};

const MAX_POWER_MA: u16 = 500;

const CONFIG_ATTR_BUS_POWERED: u8 = 0x80;
const CONFIG_ATTR_SELF_POWERED: u8 = 0x40;
const CONFIG_ATTR_REMOTE_WAKEUP: u8 = 0x20;

/// [`DeviceConfigBuilder`] error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbHidBuilderError {
    /// A value is greater than the acceptable range of input values
    ValueOverflow,
    /// A slice of data is longer than permitted
    SliceLengthOverflow,
}

pub type BuilderResult<B> = core::result::Result<B, UsbHidBuilderError>;

/// Immutable device description, owned by the caller and referenced by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig<'a> {
    report_descriptor: &'a [u8],
    report_descriptor_length: u16,
    strings: &'a [&'a str],
    vid: u16,
    pid: u16,
    max_power_ma: u16,
    self_powered: bool,
    remote_wakeup: bool,
    in_poll_interval: u8,
    subclass: InterfaceSubClass,
    protocol: InterfaceProtocol,
}

impl<'a> DeviceConfig<'a> {
    #[must_use]
    pub fn report_descriptor(&self) -> &'a [u8] {
        self.report_descriptor
    }

    #[must_use]
    pub fn report_descriptor_length(&self) -> u16 {
        self.report_descriptor_length
    }

    /// String table, ordered manufacturer, product, serial number, interface
    #[must_use]
    pub fn strings(&self) -> &'a [&'a str] {
        self.strings
    }

    #[must_use]
    pub fn string(&self, index: usize) -> Option<&'a str> {
        self.strings.get(index).copied()
    }

    #[must_use]
    pub fn manufacturer(&self) -> Option<&'a str> {
        self.string(STRING_MANUFACTURER)
    }

    #[must_use]
    pub fn product(&self) -> Option<&'a str> {
        self.string(STRING_PRODUCT)
    }

    #[must_use]
    pub fn serial_number(&self) -> Option<&'a str> {
        self.string(STRING_SERIAL_NUMBER)
    }

    #[must_use]
    pub fn interface_description(&self) -> Option<&'a str> {
        self.string(STRING_INTERFACE)
    }

    #[must_use]
    pub fn vid_pid(&self) -> (u16, u16) {
        (self.vid, self.pid)
    }

    #[must_use]
    pub fn max_power_ma(&self) -> u16 {
        self.max_power_ma
    }

    /// `bmAttributes` of the configuration descriptor
    #[must_use]
    pub fn power_attributes(&self) -> u8 {
        let mut attributes = CONFIG_ATTR_BUS_POWERED;
        if self.self_powered {
            attributes |= CONFIG_ATTR_SELF_POWERED;
        }
        if self.remote_wakeup {
            attributes |= CONFIG_ATTR_REMOTE_WAKEUP;
        }
        attributes
    }

    #[must_use]
    pub fn self_powered(&self) -> bool {
        self.self_powered
    }

    #[must_use]
    pub fn supports_remote_wakeup(&self) -> bool {
        self.remote_wakeup
    }

    #[must_use]
    pub fn in_poll_interval(&self) -> MillisDurationU32 {
        u32::from(self.in_poll_interval).millis()
    }

    pub(crate) fn in_poll_interval_ms(&self) -> u8 {
        self.in_poll_interval
    }

    /// [`UsbDeviceBuilder`] carrying the IDs, device strings and power settings of this config
    pub fn usb_device_builder<'b, B: UsbBus>(
        &self,
        usb_alloc: &'b UsbBusAllocator<B>,
    ) -> UsbDeviceBuilder<'b, B>
    where
        'a: 'b,
    {
        let mut builder = UsbDeviceBuilder::new(usb_alloc, UsbVidPid(self.vid, self.pid))
            .max_power(usize::from(self.max_power_ma))
            .self_powered(self.self_powered)
            .supports_remote_wakeup(self.remote_wakeup);
        if let Some(manufacturer) = self.manufacturer() {
            builder = builder.manufacturer(manufacturer);
        }
        if let Some(product) = self.product() {
            builder = builder.product(product);
        }
        if let Some(serial_number) = self.serial_number() {
            builder = builder.serial_number(serial_number);
        }
        builder
    }

    #[must_use]
    pub fn subclass(&self) -> InterfaceSubClass {
        self.subclass
    }

    #[must_use]
    pub fn protocol(&self) -> InterfaceProtocol {
        self.protocol
    }
}

#[must_use = "this `DeviceConfigBuilder` must be assigned or consumed by `::build()`"]
#[derive(Copy, Clone, Debug)]
pub struct DeviceConfigBuilder<'a> {
    config: DeviceConfig<'a>,
}

impl<'a> DeviceConfigBuilder<'a> {
    pub fn new(report_descriptor: &'a [u8]) -> BuilderResult<Self> {
        Ok(DeviceConfigBuilder {
            config: DeviceConfig {
                report_descriptor,
                report_descriptor_length: u16::try_from(report_descriptor.len())
                    .map_err(|_| UsbHidBuilderError::SliceLengthOverflow)?,
                strings: &[],
                vid: 0x1209,
                pid: 0x0001,
                max_power_ma: 100,
                self_powered: false,
                remote_wakeup: false,
                in_poll_interval: 10,
                //custom reports are always declared as boot subclass without a boot protocol
                subclass: InterfaceSubClass::Boot,
                protocol: InterfaceProtocol::None,
            },
        })
    }

    pub fn vid_pid(mut self, vid: u16, pid: u16) -> Self {
        self.config.vid = vid;
        self.config.pid = pid;
        self
    }

    pub fn max_power(mut self, milliamps: u16) -> BuilderResult<Self> {
        if milliamps > MAX_POWER_MA {
            return Err(UsbHidBuilderError::ValueOverflow);
        }
        self.config.max_power_ma = milliamps;
        Ok(self)
    }

    pub fn self_powered(mut self, self_powered: bool) -> Self {
        self.config.self_powered = self_powered;
        self
    }

    pub fn remote_wakeup(mut self, remote_wakeup: bool) -> Self {
        self.config.remote_wakeup = remote_wakeup;
        self
    }

    pub fn strings(mut self, strings: &'a [&'a str]) -> Self {
        self.config.strings = strings;
        self
    }

    pub fn in_endpoint(mut self, poll_interval: MillisDurationU32) -> BuilderResult<Self> {
        self.config.in_poll_interval = u8::try_from(poll_interval.to_millis())
            .map_err(|_| UsbHidBuilderError::ValueOverflow)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> DeviceConfig<'a> {
        self.config
    }
}
