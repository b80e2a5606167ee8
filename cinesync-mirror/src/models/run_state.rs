//! Sync run state machine
//!
//! A run moves through these stages:
//! IDLE → DIFF_CHECKING → AWAITING_CONFIRMATION → FETCHING_DETAILS → FETCHING_IMAGES →
//! FETCHING_VIDEOS → FETCHING_KEYWORDS → FETCHING_SIMILAR → FETCHING_CREDITS →
//! FETCHING_PEOPLE → AWAITING_PROMOTION → TRANSFERRING → DONE
//!
//! `transition` is pure: it maps the current stage and the event a stage handler
//! reported to the next stage and the effect the driver must perform next.
//! Terminal stages are DONE, EXIT and ERROR.

use super::movie::EnrichmentSlot;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Inclusive range of catalog ids to download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: i64,
    pub end: i64,
}

impl IdRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn ids(&self) -> RangeInclusive<i64> {
        self.start..=self.end
    }

    /// Number of ids covered by the range
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as u64 + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stage of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "stage")]
pub enum Stage {
    Idle,
    /// Comparing local and remote latest ids
    DiffChecking,
    /// Waiting for the operator to accept the download
    AwaitingConfirmation {
        range: IdRange,
        local_latest: i64,
        remote_latest: i64,
    },
    FetchingDetails {
        range: IdRange,
    },
    FetchingImages,
    FetchingVideos,
    FetchingKeywords,
    FetchingSimilar,
    FetchingCredits,
    FetchingPeople,
    /// Waiting for the operator to accept promotion to the main collections
    AwaitingPromotion,
    Transferring,
    /// Run finished normally
    Done,
    /// Operator declined a prompt
    Exit,
    /// Run aborted on a fatal error
    Error,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::DiffChecking => "DIFF_CHECKING",
            Stage::AwaitingConfirmation { .. } => "AWAITING_CONFIRMATION",
            Stage::FetchingDetails { .. } => "FETCHING_DETAILS",
            Stage::FetchingImages => "FETCHING_IMAGES",
            Stage::FetchingVideos => "FETCHING_VIDEOS",
            Stage::FetchingKeywords => "FETCHING_KEYWORDS",
            Stage::FetchingSimilar => "FETCHING_SIMILAR",
            Stage::FetchingCredits => "FETCHING_CREDITS",
            Stage::FetchingPeople => "FETCHING_PEOPLE",
            Stage::AwaitingPromotion => "AWAITING_PROMOTION",
            Stage::Transferring => "TRANSFERRING",
            Stage::Done => "DONE",
            Stage::Exit => "EXIT",
            Stage::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Exit | Stage::Error)
    }

    /// Stage that fetches the given enrichment slot
    pub fn fetching(slot: EnrichmentSlot) -> Stage {
        match slot {
            EnrichmentSlot::Images => Stage::FetchingImages,
            EnrichmentSlot::Videos => Stage::FetchingVideos,
            EnrichmentSlot::Keywords => Stage::FetchingKeywords,
            EnrichmentSlot::Similar => Stage::FetchingSimilar,
            EnrichmentSlot::Credits => Stage::FetchingCredits,
        }
    }

    /// Enrichment slot this stage fetches, if any
    pub fn slot(&self) -> Option<EnrichmentSlot> {
        match self {
            Stage::FetchingImages => Some(EnrichmentSlot::Images),
            Stage::FetchingVideos => Some(EnrichmentSlot::Videos),
            Stage::FetchingKeywords => Some(EnrichmentSlot::Keywords),
            Stage::FetchingSimilar => Some(EnrichmentSlot::Similar),
            Stage::FetchingCredits => Some(EnrichmentSlot::Credits),
            _ => None,
        }
    }
}

/// Outcome reported by a stage handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    NoNewMovies {
        local_latest: i64,
        remote_latest: i64,
    },
    NewMoviesFound {
        range: IdRange,
        local_latest: i64,
        remote_latest: i64,
    },
    DownloadConfirmed,
    DetailsDownloaded,
    SlotDownloaded(EnrichmentSlot),
    PeopleDownloaded,
    PromotionConfirmed,
    Transferred,
    /// Operator answered anything but the affirmative
    Declined,
    Failed(String),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::NoNewMovies { .. } => "no_new_movies",
            Event::NewMoviesFound { .. } => "new_movies_found",
            Event::DownloadConfirmed => "download_confirmed",
            Event::DetailsDownloaded => "details_downloaded",
            Event::SlotDownloaded(_) => "slot_downloaded",
            Event::PeopleDownloaded => "people_downloaded",
            Event::PromotionConfirmed => "promotion_confirmed",
            Event::Transferred => "transferred",
            Event::Declined => "declined",
            Event::Failed(_) => "failed",
        }
    }
}

/// Work the driver performs on entering a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    CheckDiff,
    AskDownload {
        range: IdRange,
        local_latest: i64,
        remote_latest: i64,
    },
    FetchDetails(IdRange),
    FetchSlot(EnrichmentSlot),
    FetchPeople,
    AskPromotion,
    Transfer,
    /// Nothing left to do
    Halt,
}

/// Compute the next stage and effect
///
/// Any failure moves to ERROR. Terminal stages absorb every event. An event
/// that does not belong to the current stage is treated as a failure.
pub fn transition(stage: &Stage, event: Event) -> (Stage, Effect) {
    if stage.is_terminal() {
        return (*stage, Effect::Halt);
    }

    match (stage, event) {
        (_, Event::Failed(_)) => (Stage::Error, Effect::Halt),

        (Stage::Idle, Event::Start) => (Stage::DiffChecking, Effect::CheckDiff),

        (Stage::DiffChecking, Event::NoNewMovies { .. }) => (Stage::Done, Effect::Halt),
        (
            Stage::DiffChecking,
            Event::NewMoviesFound {
                range,
                local_latest,
                remote_latest,
            },
        ) => (
            Stage::AwaitingConfirmation {
                range,
                local_latest,
                remote_latest,
            },
            Effect::AskDownload {
                range,
                local_latest,
                remote_latest,
            },
        ),

        (Stage::AwaitingConfirmation { range, .. }, Event::DownloadConfirmed) => (
            Stage::FetchingDetails { range: *range },
            Effect::FetchDetails(*range),
        ),
        (Stage::AwaitingConfirmation { .. }, Event::Declined) => (Stage::Exit, Effect::Halt),

        (Stage::FetchingDetails { .. }, Event::DetailsDownloaded) => {
            let first = EnrichmentSlot::ORDER[0];
            (Stage::fetching(first), Effect::FetchSlot(first))
        }

        (current, Event::SlotDownloaded(done)) if current.slot() == Some(done) => {
            match done.next() {
                Some(next) => (Stage::fetching(next), Effect::FetchSlot(next)),
                None => (Stage::FetchingPeople, Effect::FetchPeople),
            }
        }

        (Stage::FetchingPeople, Event::PeopleDownloaded) => {
            (Stage::AwaitingPromotion, Effect::AskPromotion)
        }

        (Stage::AwaitingPromotion, Event::PromotionConfirmed) => {
            (Stage::Transferring, Effect::Transfer)
        }
        (Stage::AwaitingPromotion, Event::Declined) => (Stage::Exit, Effect::Halt),

        (Stage::Transferring, Event::Transferred) => (Stage::Done, Effect::Halt),

        _ => (Stage::Error, Effect::Halt),
    }
}

/// Stage a run can be resumed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Movies,
    Images,
    Videos,
    Keywords,
    Similar,
    Credits,
    People,
}

/// How a run starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Full run starting with the diff check
    Fresh,
    /// Skip the stages before `Step`, reusing what is already staged
    ResumeAt(Step),
    /// Promote staged collections and stop
    TransferOnly,
}

impl EntryPoint {
    /// Resolve command-line flags; promotion-only wins over a resume step
    pub fn from_flags(transfer_only: bool, step: Option<Step>) -> Self {
        match (transfer_only, step) {
            (true, _) => EntryPoint::TransferOnly,
            (false, None) | (false, Some(Step::Movies)) => EntryPoint::Fresh,
            (false, Some(step)) => EntryPoint::ResumeAt(step),
        }
    }

    /// Stage and effect the run begins with
    pub fn initial(&self) -> (Stage, Effect) {
        match self {
            EntryPoint::Fresh | EntryPoint::ResumeAt(Step::Movies) => {
                transition(&Stage::Idle, Event::Start)
            }
            EntryPoint::ResumeAt(Step::Images) => resume_slot(EnrichmentSlot::Images),
            EntryPoint::ResumeAt(Step::Videos) => resume_slot(EnrichmentSlot::Videos),
            EntryPoint::ResumeAt(Step::Keywords) => resume_slot(EnrichmentSlot::Keywords),
            EntryPoint::ResumeAt(Step::Similar) => resume_slot(EnrichmentSlot::Similar),
            EntryPoint::ResumeAt(Step::Credits) => resume_slot(EnrichmentSlot::Credits),
            EntryPoint::ResumeAt(Step::People) => (Stage::FetchingPeople, Effect::FetchPeople),
            EntryPoint::TransferOnly => (Stage::Transferring, Effect::Transfer),
        }
    }
}

fn resume_slot(slot: EnrichmentSlot) -> (Stage, Effect) {
    (Stage::fetching(slot), Effect::FetchSlot(slot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(start: i64, end: i64) -> Event {
        Event::NewMoviesFound {
            range: IdRange::new(start, end),
            local_latest: start - 1,
            remote_latest: end,
        }
    }

    #[test]
    fn test_range_len() {
        assert_eq!(IdRange::new(101, 103).len(), 3);
        assert_eq!(IdRange::new(5, 5).len(), 1);
        assert!(IdRange::new(6, 5).is_empty());
    }

    #[test]
    fn test_happy_path_visits_every_stage_in_order() {
        let mut stage = Stage::Idle;
        let mut visited = vec![stage.name()];
        let events = vec![
            Event::Start,
            found(101, 103),
            Event::DownloadConfirmed,
            Event::DetailsDownloaded,
            Event::SlotDownloaded(EnrichmentSlot::Images),
            Event::SlotDownloaded(EnrichmentSlot::Videos),
            Event::SlotDownloaded(EnrichmentSlot::Keywords),
            Event::SlotDownloaded(EnrichmentSlot::Similar),
            Event::SlotDownloaded(EnrichmentSlot::Credits),
            Event::PeopleDownloaded,
            Event::PromotionConfirmed,
            Event::Transferred,
        ];
        for event in events {
            stage = transition(&stage, event).0;
            visited.push(stage.name());
        }

        assert_eq!(
            visited,
            vec![
                "IDLE",
                "DIFF_CHECKING",
                "AWAITING_CONFIRMATION",
                "FETCHING_DETAILS",
                "FETCHING_IMAGES",
                "FETCHING_VIDEOS",
                "FETCHING_KEYWORDS",
                "FETCHING_SIMILAR",
                "FETCHING_CREDITS",
                "FETCHING_PEOPLE",
                "AWAITING_PROMOTION",
                "TRANSFERRING",
                "DONE",
            ]
        );
    }

    #[test]
    fn test_confirmation_carries_range_into_details() {
        let (stage, effect) = transition(&Stage::DiffChecking, found(101, 103));
        assert_eq!(
            effect,
            Effect::AskDownload {
                range: IdRange::new(101, 103),
                local_latest: 100,
                remote_latest: 103
            }
        );

        let (stage, effect) = transition(&stage, Event::DownloadConfirmed);
        assert_eq!(stage, Stage::FetchingDetails { range: IdRange::new(101, 103) });
        assert_eq!(effect, Effect::FetchDetails(IdRange::new(101, 103)));
    }

    #[test]
    fn test_no_new_movies_is_done() {
        let event = Event::NoNewMovies {
            local_latest: 100,
            remote_latest: 100,
        };
        assert_eq!(transition(&Stage::DiffChecking, event), (Stage::Done, Effect::Halt));
    }

    #[test]
    fn test_declines_exit() {
        let waiting = Stage::AwaitingConfirmation {
            range: IdRange::new(1, 2),
            local_latest: 0,
            remote_latest: 2,
        };
        assert_eq!(transition(&waiting, Event::Declined).0, Stage::Exit);
        assert_eq!(transition(&Stage::AwaitingPromotion, Event::Declined).0, Stage::Exit);
    }

    #[test]
    fn test_failure_from_any_working_stage_is_error() {
        for stage in [
            Stage::DiffChecking,
            Stage::FetchingDetails { range: IdRange::new(1, 2) },
            Stage::FetchingSimilar,
            Stage::FetchingPeople,
            Stage::Transferring,
        ] {
            let (next, effect) = transition(&stage, Event::Failed("boom".into()));
            assert_eq!(next, Stage::Error, "from {}", stage.name());
            assert_eq!(effect, Effect::Halt);
        }
    }

    #[test]
    fn test_out_of_order_event_is_error() {
        assert_eq!(
            transition(&Stage::FetchingImages, Event::SlotDownloaded(EnrichmentSlot::Videos)).0,
            Stage::Error
        );
        assert_eq!(transition(&Stage::Idle, Event::Transferred).0, Stage::Error);
    }

    #[test]
    fn test_terminal_stages_absorb_events() {
        for stage in [Stage::Done, Stage::Exit, Stage::Error] {
            assert_eq!(transition(&stage, Event::Start), (stage, Effect::Halt));
        }
    }

    #[test]
    fn test_entry_points() {
        assert_eq!(
            EntryPoint::Fresh.initial(),
            (Stage::DiffChecking, Effect::CheckDiff)
        );
        assert_eq!(
            EntryPoint::ResumeAt(Step::Keywords).initial(),
            (Stage::FetchingKeywords, Effect::FetchSlot(EnrichmentSlot::Keywords))
        );
        assert_eq!(
            EntryPoint::ResumeAt(Step::People).initial(),
            (Stage::FetchingPeople, Effect::FetchPeople)
        );
        assert_eq!(
            EntryPoint::TransferOnly.initial(),
            (Stage::Transferring, Effect::Transfer)
        );
    }

    #[test]
    fn test_transfer_flag_wins_over_step() {
        assert_eq!(
            EntryPoint::from_flags(true, Some(Step::Credits)),
            EntryPoint::TransferOnly
        );
        assert_eq!(EntryPoint::from_flags(false, Some(Step::Movies)), EntryPoint::Fresh);
        assert_eq!(
            EntryPoint::from_flags(false, Some(Step::Similar)),
            EntryPoint::ResumeAt(Step::Similar)
        );
    }
}
