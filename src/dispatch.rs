//! Maps class driver events onto report state transitions

use crate::descriptor::ReportType;
use crate::event::{ControlEvent, ControlResponse, Notification, TransmitEvent};
use crate::report::ReportState;
use log::{trace, warn};

/// What the device must do once the state borrow is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action<const N: usize> {
    /// Answer the class driver directly
    Respond(ControlResponse<N>),
    /// Tell the application, then answer [`ControlResponse::Handled`]
    Notify(Notification),
    /// Tell the application and pass its return value back to the class driver
    Forward(Notification),
}

pub(crate) fn control<const N: usize>(
    state: &mut ReportState<N>,
    event: ControlEvent,
) -> Action<N> {
    match event {
        ControlEvent::Connected => {
            state.connect();
            Action::Notify(Notification::Connected)
        }
        ControlEvent::Disconnected => {
            state.disconnect();
            Action::Notify(Notification::Disconnected)
        }
        ControlEvent::IdleTimeout { report_id } => {
            trace!("Idle timeout for ID{}", report_id);
            Action::Respond(report_response(state, ReportType::Input))
        }
        ControlEvent::GetReport {
            report_type,
            report_id,
        } => {
            //single report device, the id is not checked
            trace!("Get report {:?} ID{}", report_type, report_id);
            Action::Respond(report_response(state, report_type))
        }
        ControlEvent::GetReportBuffer {
            report_type,
            report_id,
            length,
        } => {
            warn!(
                "No {:?} report ID{} to receive {} bytes",
                report_type, report_id, length
            );
            Action::Respond(ControlResponse::NoBuffer)
        }
        ControlEvent::SetProtocol(protocol) => {
            state.set_protocol(protocol);
            Action::Respond(ControlResponse::Handled)
        }
        ControlEvent::GetProtocol => Action::Respond(ControlResponse::Protocol(state.protocol())),
        ControlEvent::Error(code) => Action::Forward(Notification::Error(code)),
        ControlEvent::Suspend => Action::Forward(Notification::Suspend),
        ControlEvent::Resume => Action::Forward(Notification::Resume),
        ControlEvent::ReportSent => Action::Respond(ControlResponse::Handled),
        ControlEvent::Unhandled(code) => {
            trace!("Ignoring control event {}", code);
            Action::Respond(ControlResponse::Handled)
        }
    }
}

pub(crate) fn transmit<const N: usize>(
    state: &mut ReportState<N>,
    event: TransmitEvent,
) -> Option<Notification> {
    match event {
        TransmitEvent::TransferComplete { bytes } => {
            state.complete_transfer();
            trace!("Transfer complete, {} bytes", bytes);
            Some(Notification::TxComplete { bytes })
        }
        TransmitEvent::Unhandled(code) => {
            trace!("Ignoring transmit event {}", code);
            None
        }
    }
}

fn report_response<const N: usize>(
    state: &ReportState<N>,
    report_type: ReportType,
) -> ControlResponse<N> {
    state
        .report_for_host(report_type)
        .map_or(ControlResponse::NoBuffer, |r| ControlResponse::Report(*r))
}
