//! USB Class binding a [`CustomHidDevice`] to [usb-device](https://crates.io/crates/usb-device)

use crate::config::DeviceConfig;
use crate::descriptor::{
    DescriptorType, HidProtocol, HidRequest, PowerStatus, ReportType, MAX_REPORT_SIZE,
    USB_CLASS_HID,
};
use crate::device::{CustomHidDevice, InitError};
use crate::event::{ControlEvent, ControlResponse, EventHandler, TransmitEvent};
use crate::report::{IdleRecord, TransferState};
use crate::transport::{DeviceRegistration, HidClassDriver, RegistrationError};
use crate::CustomHidError;
use delegate::delegate;
use fugit::MillisDurationU32;
use log::{error, info, trace, warn};
#[allow(clippy::wildcard_imports)]
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::device::{UsbDevice, UsbDeviceState, DEFAULT_ALTERNATE_SETTING};
use usb_device::{Result, UsbError};

const TICK: MillisDurationU32 = MillisDurationU32::millis(1);

/// [`HidClassDriver`] writing reports to a usb-device interrupt IN endpoint
pub struct EndpointTransport<'a, B: UsbBus> {
    endpoint: EndpointIn<'a, B>,
    interface: InterfaceNumber,
    registered: bool,
    in_flight: Option<usize>,
    power_status: PowerStatus,
    suspended: bool,
    remote_wakeup_enabled: bool,
    wakeup_pending: bool,
}

impl<'a, B: UsbBus> EndpointTransport<'a, B> {
    #[must_use]
    pub fn new(endpoint: EndpointIn<'a, B>, interface: InterfaceNumber) -> Self {
        Self {
            endpoint,
            interface,
            registered: false,
            in_flight: None,
            power_status: PowerStatus::BusPowered,
            suspended: false,
            remote_wakeup_enabled: false,
            wakeup_pending: false,
        }
    }

    #[must_use]
    pub fn power_status(&self) -> PowerStatus {
        self.power_status
    }

    /// `true` once remote wakeup was granted and until the bus resumes
    #[must_use]
    pub fn wakeup_pending(&self) -> bool {
        self.wakeup_pending
    }

    fn transfer_complete(&mut self) -> Option<usize> {
        self.in_flight.take()
    }

    fn abort_in_flight(&mut self) {
        if let Some(bytes) = self.in_flight.take() {
            trace!("Dropped {} byte transfer", bytes);
        }
    }

    fn set_bus_state(&mut self, suspended: bool, remote_wakeup_enabled: bool) {
        if !suspended {
            self.wakeup_pending = false;
        }
        self.suspended = suspended;
        self.remote_wakeup_enabled = remote_wakeup_enabled;
    }

    fn reset(&mut self) {
        self.in_flight = None;
        self.suspended = false;
        self.wakeup_pending = false;
    }
}

impl<'a, B: UsbBus> HidClassDriver for EndpointTransport<'a, B> {
    type Handle = InterfaceNumber;

    fn register_device(
        &mut self,
        _controller_index: u8,
        registration: &DeviceRegistration<'_>,
    ) -> core::result::Result<InterfaceNumber, RegistrationError> {
        if self.registered {
            return Err(RegistrationError::AlreadyRegistered);
        }
        if registration.use_out_endpoint || registration.num_input_reports != 1 {
            return Err(RegistrationError::Unsupported);
        }
        if registration.report_size > usize::from(self.endpoint.max_packet_size()) {
            return Err(RegistrationError::ReportTooLarge);
        }
        self.power_status = if registration.power_attributes & 0x40 == 0 {
            PowerStatus::BusPowered
        } else {
            PowerStatus::SelfPowered
        };
        self.registered = true;
        Ok(self.interface)
    }

    fn unregister_device(&mut self, _handle: InterfaceNumber) {
        self.registered = false;
        self.in_flight = None;
    }

    fn tx_packet_available(&self, _handle: InterfaceNumber) -> bool {
        self.registered && self.in_flight.is_none()
    }

    fn write_report(
        &mut self,
        _handle: InterfaceNumber,
        data: &[u8],
        _use_interrupt: bool,
    ) -> usize {
        match self.endpoint.write(data) {
            Ok(n) => {
                self.in_flight = Some(n);
                n
            }
            Err(UsbError::WouldBlock) => {
                trace!("IN endpoint busy");
                0
            }
            Err(e) => {
                error!("Failed to write report - {:?}", e);
                0
            }
        }
    }

    fn set_power_status(&mut self, _handle: InterfaceNumber, status: PowerStatus) {
        self.power_status = status;
        info!("Power status {:?}", status);
    }

    fn remote_wakeup_request(&mut self, _handle: InterfaceNumber) -> bool {
        if self.suspended && self.remote_wakeup_enabled && !self.wakeup_pending {
            self.wakeup_pending = true;
            true
        } else {
            false
        }
    }
}

/// USB Human Interface Device class with one custom `N` byte input report
pub struct UsbCustomHidClass<'a, B: UsbBus, H, C, const N: usize> {
    device: CustomHidDevice<'a, EndpointTransport<'a, B>, H, C, N>,
    interface: InterfaceNumber,
    endpoint_address: EndpointAddress,
    description_index: Option<StringIndex>,
    usb_state: UsbDeviceState,
}

impl<'a, B, H, C, const N: usize> UsbCustomHidClass<'a, B, H, C, N>
where
    B: UsbBus,
    H: EventHandler<C>,
    C: Copy,
{
    /// Allocate the interface and its interrupt IN endpoint
    pub fn new(
        usb_alloc: &'a UsbBusAllocator<B>,
        config: DeviceConfig<'a>,
        handler: H,
        context: C,
    ) -> core::result::Result<Self, InitError> {
        if N > MAX_REPORT_SIZE {
            error!("{} byte report does not fit in an interrupt packet", N);
            return Err(InitError::InvalidReportSize);
        }
        let max_packet_size = u16::try_from(N).map_err(|_| InitError::InvalidReportSize)?;

        let interface = usb_alloc.interface();
        let endpoint = usb_alloc.interrupt(max_packet_size, config.in_poll_interval_ms());
        let endpoint_address = endpoint.address();
        let description_index = config.interface_description().map(|_| usb_alloc.string());

        let device = CustomHidDevice::init(
            0,
            config,
            EndpointTransport::new(endpoint, interface),
            handler,
            context,
        )?;

        Ok(Self {
            device,
            interface,
            endpoint_address,
            description_index,
            usb_state: UsbDeviceState::Default,
        })
    }

    delegate! {
        to self.device {
            pub fn submit(
                &self,
                report_id: u8,
                payload: &[u8],
            ) -> core::result::Result<(), CustomHidError>;
            pub fn set_callback_context(&self, context: C) -> C;
            pub fn set_power_status(&self, status: PowerStatus);
            pub fn remote_wakeup_request(&self) -> bool;
            pub fn report(&self) -> [u8; N];
            pub fn is_configured(&self) -> bool;
            pub fn transfer_state(&self) -> TransferState;
            pub fn protocol(&self) -> HidProtocol;
            pub fn idle_record(&self) -> IdleRecord;
        }
    }

    /// Borrow the device, e.g. for [`CustomHidDevice::submit_packed`]
    #[must_use]
    pub fn device(&self) -> &CustomHidDevice<'a, EndpointTransport<'a, B>, H, C, N> {
        &self.device
    }

    #[must_use]
    pub fn endpoint_address(&self) -> EndpointAddress {
        self.endpoint_address
    }

    #[must_use]
    pub fn power_status(&self) -> PowerStatus {
        self.device.with_transport(|t| t.power_status())
    }

    /// `true` after [`Self::remote_wakeup_request`] was granted, until the bus resumes.
    /// The application drives resume signalling on the peripheral while this is set.
    #[must_use]
    pub fn wakeup_pending(&self) -> bool {
        self.device.with_transport(|t| t.wakeup_pending())
    }

    /// Follow the state of the [`UsbDevice`] and push the power status to it, call after each poll
    pub fn update_device_state(&mut self, usb_dev: &mut UsbDevice<'_, B>) {
        self.apply_power_status(usb_dev);
        self.set_device_state(usb_dev.state(), usb_dev.remote_wakeup_enabled());
    }

    /// Report the current [`PowerStatus`] in the device's GET_STATUS response
    pub fn apply_power_status(&self, usb_dev: &mut UsbDevice<'_, B>) {
        usb_dev.set_self_powered(self.power_status() == PowerStatus::SelfPowered);
    }

    pub fn set_device_state(&mut self, state: UsbDeviceState, remote_wakeup_enabled: bool) {
        self.device.with_transport(|t| {
            t.set_bus_state(state == UsbDeviceState::Suspend, remote_wakeup_enabled);
        });
        self.change_state(state);
    }

    /// Provide a clock tick to allow the tracking of time. Call this every 1ms / at 1KHz
    ///
    /// Resends the current report when the host set an idle rate and it expired.
    /// [`CustomHidError::TxError`] means the resend was skipped, a transfer is already in flight.
    pub fn tick(&self) -> core::result::Result<(), CustomHidError> {
        let mut idle = self.device.idle_record();
        if idle.duration_4ms == 0 || !self.device.is_configured() {
            return Ok(());
        }

        idle.time_since_report += TICK;
        match idle.time_till_next.checked_sub(TICK) {
            Some(remaining) if remaining.ticks() > 0 => {
                idle.time_till_next = remaining;
                self.device.set_idle_record(idle);
                return Ok(());
            }
            _ => {}
        }

        idle.time_since_report = MillisDurationU32::from_ticks(0);
        idle.time_till_next = idle.duration();
        self.device.set_idle_record(idle);

        match self.device.control_event(ControlEvent::IdleTimeout {
            report_id: idle.report_id,
        }) {
            ControlResponse::Report(data) => self.device.submit(0, &data),
            _ => Ok(()),
        }
    }

    fn change_state(&mut self, state: UsbDeviceState) {
        let previous = core::mem::replace(&mut self.usb_state, state);
        if previous == state {
            return;
        }
        trace!("Device state {:?} -> {:?}", previous, state);

        if state == UsbDeviceState::Suspend {
            self.device.control_event(ControlEvent::Suspend);
            return;
        }
        if previous == UsbDeviceState::Suspend {
            self.device.control_event(ControlEvent::Resume);
        }

        let configured = state == UsbDeviceState::Configured;
        if configured != self.device.is_configured() {
            //endpoints are reset by a configuration change
            self.device.with_transport(EndpointTransport::abort_in_flight);
            self.device.control_event(if configured {
                ControlEvent::Connected
            } else {
                ControlEvent::Disconnected
            });
        }
    }

    fn restart_idle(&self) {
        let mut idle = self.device.idle_record();
        idle.time_since_report = MillisDurationU32::from_ticks(0);
        idle.time_till_next = idle.duration();
        self.device.set_idle_record(idle);
    }

    fn get_descriptor(&self, transfer: ControlIn<B>) {
        let request: &Request = transfer.request();
        match DescriptorType::try_from((request.value >> 8) as u8) {
            Ok(DescriptorType::Report) => {
                match transfer.accept_with(self.device.config().report_descriptor()) {
                    Err(e) => error!("Failed to send report descriptor - {:?}", e),
                    Ok(_) => {
                        trace!("Sent report descriptor");
                    }
                }
            }
            Ok(DescriptorType::Hid) => {
                const LEN: u8 = 9;
                let mut buffer = [0; LEN as usize];
                buffer[0] = LEN;
                buffer[1] = u8::from(DescriptorType::Hid);
                buffer[2..].copy_from_slice(&self.device.registration().hid_descriptor);
                match transfer.accept_with(&buffer) {
                    Err(e) => {
                        error!("Failed to send Hid descriptor - {:?}", e);
                    }
                    Ok(_) => {
                        trace!("Sent hid descriptor");
                    }
                }
            }
            _ => {
                warn!(
                    "Unsupported descriptor type, request type:{:?}, request:{}, value:{}",
                    request.request_type, request.request, request.value
                );
            }
        }
    }

    fn is_for_interface(&self, request: &Request) -> bool {
        request.recipient == Recipient::Interface
            && request.index == u16::from(u8::from(self.interface))
    }
}

impl<'a, B, H, C, const N: usize> UsbClass<B> for UsbCustomHidClass<'a, B, H, C, N>
where
    B: UsbBus + 'a,
    H: EventHandler<C>,
    C: Copy,
{
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> Result<()> {
        let registration = self.device.registration();
        writer.interface_alt(
            self.interface,
            DEFAULT_ALTERNATE_SETTING,
            USB_CLASS_HID,
            registration.subclass.into(),
            registration.protocol.into(),
            self.description_index,
        )?;

        //Hid descriptor
        writer.write(DescriptorType::Hid.into(), &registration.hid_descriptor)?;

        self.device.with_transport(|t| writer.endpoint(&t.endpoint))?;
        info!("wrote class config descriptor");
        Ok(())
    }

    fn get_string(&self, index: StringIndex, _lang_id: u16) -> Option<&str> {
        self.description_index
            .filter(|&i| i == index)
            .and(self.device.config().interface_description())
    }

    fn reset(&mut self) {
        info!("Reset");
        if self.device.is_configured() {
            self.device.control_event(ControlEvent::Disconnected);
        }
        self.device.control_event(ControlEvent::SetProtocol(HidProtocol::Report));
        self.device.set_idle_record(IdleRecord::new());
        self.device.with_transport(EndpointTransport::reset);
        self.usb_state = UsbDeviceState::Default;
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr != self.endpoint_address {
            return;
        }
        if let Some(bytes) = self.device.with_transport(EndpointTransport::transfer_complete) {
            self.restart_idle();
            self.device.transmit_event(TransmitEvent::TransferComplete { bytes });
        }
    }

    fn control_out(&mut self, transfer: ControlOut<B>) {
        let request: &Request = transfer.request();

        //observe configuration changes, usb-device answers the request itself
        if request.request_type == RequestType::Standard
            && request.recipient == Recipient::Device
            && request.request == Request::SET_CONFIGURATION
        {
            match request.value {
                0 => self.change_state(UsbDeviceState::Addressed),
                1 => self.change_state(UsbDeviceState::Configured),
                _ => {}
            }
            return;
        }

        //only respond to Class requests for this interface
        if !(request.request_type == RequestType::Class && self.is_for_interface(request)) {
            return;
        }

        trace!(
            "ctrl_out: request type: {:?}, request: {}, value: {}",
            request.request_type,
            request.request,
            request.value
        );

        match HidRequest::try_from(request.request) {
            Ok(HidRequest::SetReport) => {
                let event = ReportType::try_from((request.value >> 8) as u8).map(|report_type| {
                    ControlEvent::GetReportBuffer {
                        report_type,
                        report_id: (request.value & 0xFF) as u8,
                        length: request.length,
                    }
                });
                match event.map(|e| self.device.control_event(e)) {
                    Ok(ControlResponse::NoBuffer) | Err(_) => {
                        transfer.reject().ok();
                    }
                    Ok(_) => {
                        transfer.accept().ok();
                    }
                }
            }
            Ok(HidRequest::SetIdle) => {
                if request.length != 0 {
                    warn!(
                        "Expected SetIdle to have length 0, received {}",
                        request.length
                    );
                }

                let mut idle = IdleRecord {
                    report_id: (request.value & 0xFF) as u8,
                    duration_4ms: (request.value >> 8) as u8,
                    ..IdleRecord::new()
                };
                idle.time_till_next = idle.duration();
                self.device.set_idle_record(idle);
                info!("Set idle for ID{} to {}", idle.report_id, idle.duration_4ms);
                transfer.accept().ok();
            }
            Ok(HidRequest::SetProtocol) => {
                if request.length != 0 {
                    warn!(
                        "Expected SetProtocol to have length 0, received {}",
                        request.length
                    );
                }
                if let Ok(protocol) = HidProtocol::try_from((request.value & 0xFF) as u8) {
                    self.device.control_event(ControlEvent::SetProtocol(protocol));
                    transfer.accept().ok();
                } else {
                    error!(
                        "Unable to set protocol, unsupported value:{}",
                        request.value
                    );
                    transfer.reject().ok();
                }
            }
            _ => {
                warn!(
                    "Unsupported control_out request type: {:?}, request: {}, value: {}",
                    request.request_type, request.request, request.value
                );
            }
        }
    }

    fn control_in(&mut self, transfer: ControlIn<B>) {
        let request: &Request = transfer.request();
        //only respond to requests for this interface
        if !self.is_for_interface(request) {
            return;
        }

        trace!(
            "ctrl_in: request type: {:?}, request: {}, value: {}",
            request.request_type,
            request.request,
            request.value
        );

        match request.request_type {
            RequestType::Standard => {
                if request.request == Request::GET_DESCRIPTOR {
                    info!("Get descriptor");
                    self.get_descriptor(transfer);
                }
            }

            RequestType::Class => match HidRequest::try_from(request.request) {
                Ok(HidRequest::GetReport) => {
                    let response = ReportType::try_from((request.value >> 8) as u8).map(
                        |report_type| {
                            self.device.control_event(ControlEvent::GetReport {
                                report_type,
                                report_id: (request.value & 0xFF) as u8,
                            })
                        },
                    );

                    if let Ok(ControlResponse::Report(data)) = response {
                        let n = N.min(usize::from(request.length));
                        if let Err(e) = transfer.accept_with(&data[..n]) {
                            error!("Failed to send report - {:?}", e);
                        } else {
                            trace!("Sent report, {} bytes", n);
                            self.device.control_event(ControlEvent::ReportSent);
                        }
                    } else {
                        warn!("No report for GetReport value:{}", request.value);
                        transfer.reject().ok();
                    }
                }
                Ok(HidRequest::GetIdle) => {
                    if request.length != 1 {
                        warn!(
                            "Expected GetIdle to have length 1, received {}",
                            request.length
                        );
                    }

                    let report_id = (request.value & 0xFF) as u8;
                    let idle = self.device.idle_record().duration_4ms;
                    if let Err(e) = transfer.accept_with(&[idle]) {
                        error!("Failed to send idle data - {:?}", e);
                    } else {
                        info!("Get Idle for ID{}: {}", report_id, idle);
                    }
                }
                Ok(HidRequest::GetProtocol) => {
                    if request.length != 1 {
                        warn!(
                            "Expected GetProtocol to have length 1, received {}",
                            request.length
                        );
                    }

                    if let ControlResponse::Protocol(protocol) =
                        self.device.control_event(ControlEvent::GetProtocol)
                    {
                        if let Err(e) = transfer.accept_with(&[protocol.into()]) {
                            error!("Failed to send protocol data - {:?}", e);
                        } else {
                            info!("Get protocol: {:?}", protocol);
                        }
                    }
                }
                _ => {
                    warn!(
                        "Unsupported control_in request type: {:?}, request: {}, value: {}",
                        request.request_type, request.request, request.value
                    );
                }
            },
            _ => {}
        }
    }
}
