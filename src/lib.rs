//! Custom HID device core for [usb-device](https://crates.io/crates/usb-device). Exposes a single
//! input report, described by a caller supplied report descriptor, and keeps it in step with the
//! host: configuration, protocol, idle rate and one interrupt IN transfer in flight at a time.
//!
//! The core ([`device::CustomHidDevice`]) talks to the bus through the
//! [`transport::HidClassDriver`] trait. [`usb_class::UsbCustomHidClass`] binds it to usb-device.
//!
//! ```rust, no_run
//! # use core::option::Option;
//! # use core::result::Result;
//! # use core::todo;
//! # use usb_device::bus::PollResult;
//! use usbd_custom_hid::gamepad::{GamepadReport, GAMEPAD_REPORT_DESCRIPTOR, GAMEPAD_REPORT_SIZE};
//! use usbd_custom_hid::prelude::*;
//! # use usb_device::class_prelude::*;
//! # use usb_device::prelude::*;
//! # use usb_device::UsbDirection;
//! #
//! # trait InputPin {
//! #     fn is_low(&self) -> Result<bool, core::convert::Infallible>;
//! # }
//! #
//! # struct DummyUsbBus;
//! # impl UsbBus for DummyUsbBus{fn alloc_ep(&mut self, ep_dir: UsbDirection, ep_addr: Option<EndpointAddress>, ep_type: EndpointType, max_packet_size: u16, interval: u8) -> usb_device::Result<EndpointAddress> {
//! #         todo!()
//! #     }
//! #
//! # fn enable(&mut self) {
//! #         todo!()
//! #     }
//! #
//! # fn reset(&self) {
//! #         todo!()
//! #     }
//! #
//! # fn set_device_address(&self, addr: u8) {
//! #         todo!()
//! #     }
//! #
//! # fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> usb_device::Result<usize> {
//! #         todo!()
//! #     }
//! #
//! # fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> usb_device::Result<usize> {
//! #         todo!()
//! #     }
//! #
//! # fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
//! #         todo!()
//! #     }
//! #
//! # fn is_stalled(&self, ep_addr: EndpointAddress) -> bool {
//! #         todo!()
//! #     }
//! #
//! # fn suspend(&self) {
//! #         todo!()
//! #     }
//! #
//! # fn resume(&self) {
//! #         todo!()
//! #     }
//! #
//! # fn poll(&self) -> PollResult {
//! #         todo!()
//! #     }}
//! #
//! # let usb_bus = DummyUsbBus{};
//! # let pin: &dyn InputPin = todo!();
//! #
//! # struct CountDown;
//! # impl CountDown{
//! #     fn wait(&mut self) -> Result<(), ()>{ todo!() }
//! # }
//! # let mut tick_timer: CountDown = todo!();
//! #
//! let usb_alloc = UsbBusAllocator::new(usb_bus);
//!
//! let config = DeviceConfigBuilder::new(GAMEPAD_REPORT_DESCRIPTOR)
//!     .unwrap()
//!     .vid_pid(0x1209, 0x0001)
//!     .strings(&["usbd-custom-hid", "Gamepad"])
//!     .build();
//!
//! let mut gamepad = UsbCustomHidClass::<_, _, _, GAMEPAD_REPORT_SIZE>::new(
//!     &usb_alloc,
//!     config,
//!     |_: (), _: Notification| 0_u32,
//!     (),
//! )
//! .unwrap();
//!
//! let mut usb_dev = config.usb_device_builder(&usb_alloc).build();
//!
//! loop {
//!     let report = GamepadReport {
//!         buttons: u16::from(pin.is_low().unwrap()),
//!         ..Default::default()
//!     };
//!     gamepad.device().submit_packed(0, &report).ok();
//!
//!     //tick once per ms
//!     if tick_timer.wait().is_ok() {
//!         gamepad.tick().ok();
//!     }
//!
//!     usb_dev.poll(&mut [&mut gamepad]);
//!     gamepad.update_device_state(&mut usb_dev);
//! }
//! ```
//!
//! Features
//! --------
//!
//! * Any report layout up to 64 bytes, with or without a report id
//! * Host Get_Report, Set/Get_Idle and Set/Get_Protocol
//! * Idle rate driven report resend
//! * Application callback for configuration, completion, suspend/resume and bus errors
//! * Remote wakeup and power status bookkeeping
//! * Ready made gamepad report

#![no_std]

//Allow the use of std in tests
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod descriptor;
pub mod device;
mod dispatch;
pub mod event;
pub mod gamepad;
pub mod prelude;
pub mod report;
pub mod transport;
pub mod usb_class;

/// Reasons a report could not be sent
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomHidError {
    /// The host has not configured the device, only the report buffer was updated
    NotConfigured,
    /// A transfer is in flight or the class driver refused the report
    TxError,
    SerializationError,
}
