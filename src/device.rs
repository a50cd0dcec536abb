//! Custom HID device instance shared between application and interrupt context

use crate::config::DeviceConfig;
use crate::descriptor::PowerStatus;
use crate::dispatch::{self, Action};
use crate::event::{ControlEvent, ControlResponse, EventHandler, Notification, TransmitEvent};
use crate::report::{IdleRecord, ReportState, TransferState};
use crate::transport::{DeviceRegistration, HidClassDriver, RegistrationError};
use crate::CustomHidError;
use core::cell::{Cell, RefCell};
use critical_section::Mutex;
use log::{error, info, trace, warn};
use packed_struct::PackedStruct;

/// [`CustomHidDevice::init`] error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The configuration has an empty string descriptor table
    MissingStringDescriptors,
    /// The report size is zero or too large for the class driver
    InvalidReportSize,
    Registration(RegistrationError),
}

impl From<RegistrationError> for InitError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::ReportTooLarge => InitError::InvalidReportSize,
            _ => InitError::Registration(e),
        }
    }
}

/// What is left of a device after [`CustomHidDevice::terminate`]
pub struct DeviceParts<T, H, C> {
    pub transport: T,
    pub handler: H,
    pub context: C,
}

/// A HID device with a single `N` byte input report.
///
/// `submit` is called from the application while the class driver calls `control_event` and
/// `transmit_event`, possibly from an interrupt handler. All of them take `&self`; the shared
/// state is only touched inside a critical section.
pub struct CustomHidDevice<'a, T, H, C, const N: usize>
where
    T: HidClassDriver,
{
    config: DeviceConfig<'a>,
    handle: T::Handle,
    state: Mutex<RefCell<ReportState<N>>>,
    transport: Mutex<RefCell<T>>,
    handler: Mutex<RefCell<H>>,
    context: Mutex<Cell<C>>,
}

impl<'a, T, H, C, const N: usize> CustomHidDevice<'a, T, H, C, N>
where
    T: HidClassDriver,
    H: EventHandler<C>,
    C: Copy,
{
    /// Register the device with the class driver.
    ///
    /// The device starts unconfigured, in report protocol, with a zeroed idle record.
    pub fn init(
        controller_index: u8,
        config: DeviceConfig<'a>,
        mut transport: T,
        handler: H,
        context: C,
    ) -> Result<Self, InitError> {
        if config.strings().is_empty() {
            error!("Custom HID init failed, no string descriptors");
            return Err(InitError::MissingStringDescriptors);
        }
        if N == 0 {
            error!("Custom HID init failed, zero length report");
            return Err(InitError::InvalidReportSize);
        }

        let registration = DeviceRegistration::new(&config, N);
        let handle = transport
            .register_device(controller_index, &registration)
            .map_err(|e| {
                error!("Custom HID registration failed - {:?}", e);
                InitError::from(e)
            })?;
        info!(
            "Custom HID registered on controller {}, {} byte report",
            controller_index, N
        );

        Ok(Self {
            config,
            handle,
            state: Mutex::new(RefCell::new(ReportState::new())),
            transport: Mutex::new(RefCell::new(transport)),
            handler: Mutex::new(RefCell::new(handler)),
            context: Mutex::new(Cell::new(context)),
        })
    }

    /// Release the class driver registration and hand back the parts
    pub fn terminate(self) -> DeviceParts<T, H, C> {
        let Self {
            handle,
            transport,
            handler,
            context,
            ..
        } = self;

        let mut transport = transport.into_inner().into_inner();
        transport.unregister_device(handle);
        info!("Custom HID terminated");

        DeviceParts {
            transport,
            handler: handler.into_inner().into_inner(),
            context: context.into_inner().get(),
        }
    }

    /// Send a report to the host.
    ///
    /// The buffer is always updated, even when the report cannot be sent. `report_id == 0`
    /// means the descriptor declares no report ids and `payload` must be `N` bytes, otherwise
    /// the id is prefixed and `payload` must be `N - 1` bytes.
    ///
    /// Completion is signalled asynchronously by [`Notification::TxComplete`]. A report
    /// submitted while another is in flight is rejected with [`CustomHidError::TxError`], not
    /// queued.
    pub fn submit(&self, report_id: u8, payload: &[u8]) -> Result<(), CustomHidError> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow(cs).borrow_mut();
            state.stage(report_id, payload);

            if !state.is_configured() {
                return Err(CustomHidError::NotConfigured);
            }

            let mut transport = self.transport.borrow(cs).borrow_mut();
            if state.transfer_state() == TransferState::Sending
                || !transport.tx_packet_available(self.handle)
            {
                trace!("Submit failed, transmitter busy");
                return Err(CustomHidError::TxError);
            }

            state.begin_transfer();
            if transport.write_report(self.handle, state.report(), true) == 0 {
                warn!("Submit failed, report not accepted by class driver");
                state.abort_transfer();
                Err(CustomHidError::TxError)
            } else {
                Ok(())
            }
        })
    }

    /// Pack `report` and [`submit`](Self::submit) it
    pub fn submit_packed<R, const LEN: usize>(
        &self,
        report_id: u8,
        report: &R,
    ) -> Result<(), CustomHidError>
    where
        R: PackedStruct<ByteArray = [u8; LEN]>,
    {
        let data = report.pack().map_err(|_| {
            error!("Error packing report");
            CustomHidError::SerializationError
        })?;
        self.submit(report_id, &data)
    }

    /// Replace the context passed to the event handler, returning the previous one
    pub fn set_callback_context(&self, context: C) -> C {
        critical_section::with(|cs| self.context.borrow(cs).replace(context))
    }

    pub fn set_power_status(&self, status: PowerStatus) {
        critical_section::with(|cs| {
            self.transport
                .borrow(cs)
                .borrow_mut()
                .set_power_status(self.handle, status);
        });
    }

    pub fn remote_wakeup_request(&self) -> bool {
        critical_section::with(|cs| {
            self.transport
                .borrow(cs)
                .borrow_mut()
                .remote_wakeup_request(self.handle)
        })
    }

    /// Control plane entry point for the class driver
    pub fn control_event(&self, event: ControlEvent) -> ControlResponse<N> {
        let action = critical_section::with(|cs| {
            dispatch::control(&mut self.state.borrow(cs).borrow_mut(), event)
        });

        match action {
            Action::Respond(response) => response,
            Action::Notify(notification) => {
                self.notify(notification);
                ControlResponse::Handled
            }
            Action::Forward(notification) => ControlResponse::Forwarded(self.notify(notification)),
        }
    }

    /// Transmit plane entry point for the class driver
    pub fn transmit_event(&self, event: TransmitEvent) {
        let notification = critical_section::with(|cs| {
            dispatch::transmit(&mut self.state.borrow(cs).borrow_mut(), event)
        });

        if let Some(n) = notification {
            self.notify(n);
        }
    }

    fn notify(&self, event: Notification) -> u32 {
        critical_section::with(|cs| {
            let context = self.context.borrow(cs).get();
            self.handler.borrow(cs).borrow_mut().on_event(context, event)
        })
    }
}

impl<'a, T, H, C, const N: usize> CustomHidDevice<'a, T, H, C, N>
where
    T: HidClassDriver,
{
    #[must_use]
    pub fn config(&self) -> &DeviceConfig<'a> {
        &self.config
    }

    #[must_use]
    pub fn handle(&self) -> T::Handle {
        self.handle
    }

    #[must_use]
    pub fn registration(&self) -> DeviceRegistration<'a> {
        DeviceRegistration::new(&self.config, N)
    }

    /// Copy of the whole device state
    #[must_use]
    pub fn snapshot(&self) -> ReportState<N> {
        critical_section::with(|cs| *self.state.borrow(cs).borrow())
    }

    #[must_use]
    pub fn report(&self) -> [u8; N] {
        critical_section::with(|cs| *self.state.borrow(cs).borrow().report())
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).borrow().is_configured())
    }

    #[must_use]
    pub fn transfer_state(&self) -> TransferState {
        critical_section::with(|cs| self.state.borrow(cs).borrow().transfer_state())
    }

    #[must_use]
    pub fn protocol(&self) -> crate::descriptor::HidProtocol {
        critical_section::with(|cs| self.state.borrow(cs).borrow().protocol())
    }

    #[must_use]
    pub fn idle_record(&self) -> IdleRecord {
        critical_section::with(|cs| self.state.borrow(cs).borrow().idle_record())
    }

    pub fn set_idle_record(&self, idle: IdleRecord) {
        critical_section::with(|cs| self.state.borrow(cs).borrow_mut().set_idle_record(idle));
    }

    pub(crate) fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.transport.borrow(cs).borrow_mut()))
    }
}
