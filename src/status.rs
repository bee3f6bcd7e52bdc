//! Progress of a booking as shown on the lookup page

use crate::api::BookingDetails;

/// Server-side payment state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Created, proof of payment not yet verified
    Pending,
    /// Payment verified, work can start
    Paid,
}

/// How much of a progress step is highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Full,
    Half,
    None,
}

/// One of the three steps on the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageView {
    pub label: &'static str,
    pub fill: Fill,
}

/// Labels of the three progress steps, in order
pub const STAGE_LABELS: [&str; 3] = ["Booking Created", "Verifying Payment", "Start Working"];

impl ProgressStage {
    /// Stage of a booking record
    pub fn of(details: &BookingDetails) -> Self {
        Self::from_paid(details.is_paid)
    }

    /// Stage for a paid flag
    pub fn from_paid(is_paid: bool) -> Self {
        if is_paid {
            ProgressStage::Paid
        } else {
            ProgressStage::Pending
        }
    }

    /// Fill of each step
    pub fn fills(self) -> [Fill; 3] {
        match self {
            ProgressStage::Pending => [Fill::Full, Fill::Half, Fill::None],
            ProgressStage::Paid => [Fill::Full, Fill::Full, Fill::Full],
        }
    }

    /// The three steps with their labels
    pub fn stages(self) -> [StageView; 3] {
        let fills = self.fills();
        [0, 1, 2].map(|i| StageView {
            label: STAGE_LABELS[i],
            fill: fills[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaid_booking_is_half_way() {
        assert_eq!(
            ProgressStage::from_paid(false).fills(),
            [Fill::Full, Fill::Half, Fill::None]
        );
    }

    #[test]
    fn test_paid_booking_is_fully_lit() {
        let stages = ProgressStage::from_paid(true).stages();
        assert!(stages.iter().all(|s| s.fill == Fill::Full));
        assert_eq!(stages[1].label, "Verifying Payment");
    }
}
