use tracing::{debug, info, warn};

use crate::models::{AppointmentStatus, BookingError};

/// Guards the appointment state machine. The transition matrix is fixed:
/// scheduled confirms or cancels, confirmed completes, cancels or no-shows,
/// and terminal statuses admit nothing further.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        let valid_transitions = self.get_valid_transitions(current_status);

        if !valid_transitions.contains(new_status) {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(BookingError::InvalidTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Canceled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Canceled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Canceled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
