//! Events exchanged with the class driver and the application

use crate::descriptor::{HidProtocol, ReportType};

/// Control plane events delivered by the class driver
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Host configured the device
    Connected,
    /// Host deconfigured the device or the bus was reset
    Disconnected,
    /// The idle timer expired and the current report must be resent
    IdleTimeout { report_id: u8 },
    /// Host Get_Report request
    GetReport {
        report_type: ReportType,
        report_id: u8,
    },
    /// A report requested with `GetReport` reached the host
    ReportSent,
    /// Host Set_Report request, the class driver needs somewhere to put the data
    GetReportBuffer {
        report_type: ReportType,
        report_id: u8,
        length: u16,
    },
    SetProtocol(HidProtocol),
    GetProtocol,
    /// Bus error, the value is driver specific
    Error(u32),
    Suspend,
    Resume,
    /// Class driver event this device does not know about
    Unhandled(u32),
}

/// Transmit plane events delivered by the class driver
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitEvent {
    /// The interrupt IN transfer was acknowledged by the host
    TransferComplete { bytes: usize },
    Unhandled(u32),
}

/// Answer to a [`ControlEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlResponse<const N: usize> {
    Handled,
    /// Copy of the report to transmit
    Report([u8; N]),
    /// No buffer for the requested report, the class driver should stall
    NoBuffer,
    Protocol(HidProtocol),
    /// Value returned by the application for a forwarded event
    Forwarded(u32),
}

/// Notification passed to the application [`EventHandler`]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Connected,
    Disconnected,
    TxComplete { bytes: usize },
    Error(u32),
    Suspend,
    Resume,
}

/// Application callback.
///
/// May run in interrupt context, so implementations must return promptly and never block. The
/// handler may call [`CustomHidDevice::submit`](crate::device::CustomHidDevice::submit) but must
/// not feed events back into the device.
pub trait EventHandler<C> {
    /// Return value is only meaningful for `Error`, `Suspend` and `Resume`, where it is handed
    /// back to the class driver unchanged.
    fn on_event(&mut self, context: C, event: Notification) -> u32;
}

impl<C, F> EventHandler<C> for F
where
    F: FnMut(C, Notification) -> u32,
{
    fn on_event(&mut self, context: C, event: Notification) -> u32 {
        self(context, event)
    }
}
