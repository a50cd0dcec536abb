//! Interface to the HID class driver that schedules transfers on the bus

use crate::config::DeviceConfig;
use crate::descriptor::{hid_descriptor_body, InterfaceProtocol, InterfaceSubClass, PowerStatus};

/// Reasons a class driver refuses a device
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    AlreadyRegistered,
    /// The registration asks for something the driver cannot provide, e.g. an OUT endpoint
    Unsupported,
    /// The report does not fit in a single packet of the IN endpoint
    ReportTooLarge,
}

/// Everything a class driver needs to enumerate the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceRegistration<'a> {
    pub vid: u16,
    pub pid: u16,
    pub max_power_ma: u16,
    pub power_attributes: u8,
    pub subclass: InterfaceSubClass,
    pub protocol: InterfaceProtocol,
    pub num_input_reports: u8,
    pub use_out_endpoint: bool,
    pub report_size: usize,
    pub hid_descriptor: [u8; 7],
    pub report_descriptor: &'a [u8],
    pub strings: &'a [&'a str],
}

impl<'a> DeviceRegistration<'a> {
    pub(crate) fn new(config: &DeviceConfig<'a>, report_size: usize) -> Self {
        let (vid, pid) = config.vid_pid();
        Self {
            vid,
            pid,
            max_power_ma: config.max_power_ma(),
            power_attributes: config.power_attributes(),
            subclass: config.subclass(),
            protocol: config.protocol(),
            num_input_reports: 1,
            use_out_endpoint: false,
            report_size,
            hid_descriptor: hid_descriptor_body(config.report_descriptor_length()),
            report_descriptor: config.report_descriptor(),
            strings: config.strings(),
        }
    }
}

/// Operations the device core consumes from the HID class driver.
///
/// Every method is called with interrupts masked and must complete quickly.
pub trait HidClassDriver {
    type Handle: Copy;

    fn register_device(
        &mut self,
        controller_index: u8,
        registration: &DeviceRegistration<'_>,
    ) -> Result<Self::Handle, RegistrationError>;

    fn unregister_device(&mut self, handle: Self::Handle);

    /// `true` if a report can be handed to [`Self::write_report`] now
    fn tx_packet_available(&self, handle: Self::Handle) -> bool;

    /// Schedule `data` for transmission. Returns the number of bytes accepted, 0 on failure.
    fn write_report(&mut self, handle: Self::Handle, data: &[u8], use_interrupt: bool) -> usize;

    fn set_power_status(&mut self, handle: Self::Handle, status: PowerStatus);

    /// Start remote wakeup signalling, `false` if the host disabled it or signalling is ongoing
    fn remote_wakeup_request(&mut self, handle: Self::Handle) -> bool;
}
