//! Report buffer and transfer state for a single input report

use crate::descriptor::{HidProtocol, ReportType};
use fugit::MillisDurationU32;
use log::{info, trace};

/// Lifecycle of the single report transfer a device may have in flight
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// Host has not configured the device
    #[default]
    Unconfigured,
    /// Configured, transmitter free
    Idle,
    /// One report handed to the class driver, awaiting completion
    Sending,
}

/// Idle rate bookkeeping for the input report - HID spec 7.2.4
///
/// Only stored here, the class driver owns the timer that advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleRecord {
    pub report_id: u8,
    /// Idle rate in 4ms units, 0 means report only on change
    pub duration_4ms: u8,
    pub time_since_report: MillisDurationU32,
    pub time_till_next: MillisDurationU32,
}

impl IdleRecord {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            report_id: 0,
            duration_4ms: 0,
            time_since_report: MillisDurationU32::from_ticks(0),
            time_till_next: MillisDurationU32::from_ticks(0),
        }
    }

    #[must_use]
    pub fn duration(&self) -> MillisDurationU32 {
        MillisDurationU32::from_ticks(u32::from(self.duration_4ms) * 4)
    }
}

impl Default for IdleRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one custom HID device instance with an `N` byte report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportState<const N: usize> {
    configured: bool,
    protocol: HidProtocol,
    idle: IdleRecord,
    transfer: TransferState,
    report: [u8; N],
}

impl<const N: usize> Default for ReportState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReportState<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: false,
            protocol: HidProtocol::Report,
            idle: IdleRecord::new(),
            transfer: TransferState::Unconfigured,
            report: [0; N],
        }
    }

    /// Copy a report into the buffer.
    ///
    /// A non zero `report_id` is written to byte 0 and `payload` follows it, so the payload must
    /// be `N - 1` bytes long. With `report_id == 0` the payload fills the whole buffer.
    pub fn stage(&mut self, report_id: u8, payload: &[u8]) {
        let data = if report_id > 0 {
            self.report[0] = report_id;
            &mut self.report[1..]
        } else {
            &mut self.report[..]
        };

        debug_assert_eq!(
            payload.len(),
            data.len(),
            "payload must fill the declared report exactly"
        );

        let n = data.len().min(payload.len());
        data[..n].copy_from_slice(&payload[..n]);
        trace!("Staged report ID{}, {} bytes", report_id, n);
    }

    pub fn connect(&mut self) {
        self.configured = true;
        self.transfer = TransferState::Idle;
        info!("Configured");
    }

    pub fn disconnect(&mut self) {
        self.configured = false;
        self.transfer = TransferState::Unconfigured;
        info!("Unconfigured");
    }

    /// Claim the transmitter, `Idle -> Sending`
    pub fn begin_transfer(&mut self) {
        debug_assert_eq!(self.transfer, TransferState::Idle);
        self.transfer = TransferState::Sending;
    }

    /// Release a transfer the class driver refused to accept
    pub fn abort_transfer(&mut self) {
        if self.transfer == TransferState::Sending {
            self.transfer = TransferState::Idle;
        }
    }

    /// A transfer finished. A device disconnected in the meantime stays unconfigured.
    pub fn complete_transfer(&mut self) {
        if self.configured {
            self.transfer = TransferState::Idle;
        }
    }

    /// Report returned for a host Get_Report or an idle timeout. Only the input report exists.
    #[must_use]
    pub fn report_for_host(&self, report_type: ReportType) -> Option<&[u8; N]> {
        match report_type {
            ReportType::Input => Some(&self.report),
            ReportType::Output | ReportType::Feature => None,
        }
    }

    pub fn set_protocol(&mut self, protocol: HidProtocol) {
        self.protocol = protocol;
        info!("Set protocol to {:?}", protocol);
    }

    #[must_use]
    pub fn protocol(&self) -> HidProtocol {
        self.protocol
    }

    #[must_use]
    pub fn idle_record(&self) -> IdleRecord {
        self.idle
    }

    pub fn set_idle_record(&mut self, idle: IdleRecord) {
        self.idle = idle;
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    #[must_use]
    pub fn transfer_state(&self) -> TransferState {
        self.transfer
    }

    #[must_use]
    pub fn report(&self) -> &[u8; N] {
        &self.report
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_state_is_unconfigured_report_protocol() {
        let state = ReportState::<8>::new();

        assert!(!state.is_configured());
        assert_eq!(state.transfer_state(), TransferState::Unconfigured);
        assert_eq!(state.protocol(), HidProtocol::Report);
        assert_eq!(state.idle_record(), IdleRecord::default());
        assert_eq!(state.report(), &[0; 8]);
    }

    #[test]
    fn stage_without_report_id_copies_verbatim() {
        let mut state = ReportState::<4>::new();
        state.stage(0, &[1, 2, 3, 4]);
        assert_eq!(state.report(), &[1, 2, 3, 4]);
    }

    #[test]
    fn stage_with_report_id_prefixes_buffer() {
        let mut state = ReportState::<4>::new();
        state.stage(2, &[7, 8, 9]);
        assert_eq!(state.report(), &[2, 7, 8, 9]);
    }

    #[test]
    fn transfer_cycle() {
        let mut state = ReportState::<2>::new();
        state.connect();
        assert_eq!(state.transfer_state(), TransferState::Idle);

        state.begin_transfer();
        assert_eq!(state.transfer_state(), TransferState::Sending);

        state.complete_transfer();
        assert_eq!(state.transfer_state(), TransferState::Idle);

        state.begin_transfer();
        state.abort_transfer();
        assert_eq!(state.transfer_state(), TransferState::Idle);
    }

    #[test]
    fn completion_after_disconnect_stays_unconfigured() {
        let mut state = ReportState::<2>::new();
        state.connect();
        state.begin_transfer();
        state.disconnect();
        state.complete_transfer();

        assert!(!state.is_configured());
        assert_eq!(state.transfer_state(), TransferState::Unconfigured);
    }

    #[test]
    fn only_input_report_is_available_to_host() {
        let mut state = ReportState::<3>::new();
        state.stage(0, &[5, 6, 7]);

        assert_eq!(state.report_for_host(ReportType::Input), Some(&[5, 6, 7]));
        assert_eq!(state.report_for_host(ReportType::Output), None);
        assert_eq!(state.report_for_host(ReportType::Feature), None);
    }

    #[test]
    fn protocol_round_trip_independent_of_configuration() {
        let mut state = ReportState::<1>::new();

        state.set_protocol(HidProtocol::Boot);
        assert_eq!(state.protocol(), HidProtocol::Boot);
        state.set_protocol(HidProtocol::Report);
        assert_eq!(state.protocol(), HidProtocol::Report);

        state.connect();
        state.set_protocol(HidProtocol::Boot);
        assert_eq!(state.protocol(), HidProtocol::Boot);
    }

    #[test]
    fn idle_duration_is_in_4ms_units() {
        let idle = IdleRecord {
            duration_4ms: 125,
            ..IdleRecord::new()
        };
        assert_eq!(idle.duration(), MillisDurationU32::from_ticks(500));
    }
}
