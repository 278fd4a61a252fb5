//! Stage/chapter status state machine and its serialization shape.

use serde::Serialize;

use crate::chapter::{Chapter, StageName};

/// Execution state of a single stage. Transitions are strictly forward:
/// `Pending → Running → {Success | Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl StageStatus {
    /// Both outcomes count as finished for polling purposes; only the
    /// outcome differs.
    pub fn is_terminal(self) -> bool {
        matches!(self, StageStatus::Success | StageStatus::Error)
    }

    fn rank(self) -> u8 {
        match self {
            StageStatus::Pending => 0,
            StageStatus::Running => 1,
            StageStatus::Success | StageStatus::Error => 2,
        }
    }
}

/// Status record of one stage within a chapter.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub name: StageName,
    pub status: StageStatus,
    pub error: Option<String>,
}

/// A chapter plus its parallel ordered stage records. The record list length
/// is fixed at creation from the static chapter→stages table.
#[derive(Debug, Clone)]
pub struct ChapterStatus {
    chapter: Chapter,
    stages: Vec<StageRecord>,
}

impl ChapterStatus {
    pub fn new(chapter: Chapter) -> Self {
        let stages = chapter
            .stages()
            .iter()
            .map(|&name| StageRecord {
                name,
                status: StageStatus::Pending,
                error: None,
            })
            .collect();
        Self { chapter, stages }
    }

    pub fn chapter(&self) -> Chapter {
        self.chapter
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// Update a stage by index. Regressing updates are dropped so a terminal
    /// status is never overwritten.
    pub fn set_stage_status(&mut self, stage_idx: usize, status: StageStatus, error: Option<String>) {
        let record = &mut self.stages[stage_idx];
        if status.rank() < record.status.rank() {
            return;
        }
        record.status = status;
        record.error = error;
    }

    /// Whether the final stage of this chapter has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.stages
            .last()
            .is_some_and(|record| record.status.is_terminal())
    }

    pub fn to_view(&self, chapter_idx: usize) -> ChapterStatusView {
        ChapterStatusView {
            chapter_id: format!("{}{}", self.chapter.snake_id(), chapter_idx),
            chapter_name: self.chapter.display_name().to_owned(),
            stage_statuses: self
                .stages
                .iter()
                .enumerate()
                .map(|(stage_idx, record)| StageStatusView {
                    id: format!("{}{}", record.name.snake_id(), stage_idx),
                    name: record.name.display_name().to_owned(),
                    status: record.status,
                    error: record.error.clone(),
                })
                .collect(),
        }
    }
}

/// Serialized status of one stage, as exposed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct StageStatusView {
    pub id: String,
    pub name: String,
    pub status: StageStatus,
    pub error: Option<String>,
}

/// Serialized status of one chapter.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterStatusView {
    pub chapter_id: String,
    pub chapter_name: String,
    pub stage_statuses: Vec<StageStatusView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chapter_is_all_pending() {
        let status = ChapterStatus::new(Chapter::SimpleCoupling);
        assert_eq!(status.stages().len(), Chapter::SimpleCoupling.stages().len());
        assert!(
            status
                .stages()
                .iter()
                .all(|record| record.status == StageStatus::Pending)
        );
        assert!(!status.is_finished());
    }

    #[test]
    fn status_never_regresses() {
        let mut status = ChapterStatus::new(Chapter::SimpleCoupling);
        status.set_stage_status(0, StageStatus::Running, None);
        status.set_stage_status(0, StageStatus::Success, None);
        status.set_stage_status(0, StageStatus::Pending, None);
        status.set_stage_status(0, StageStatus::Running, None);
        assert_eq!(status.stages()[0].status, StageStatus::Success);
    }

    #[test]
    fn error_carries_message_and_finishes_chapter() {
        let mut status = ChapterStatus::new(Chapter::FeedbackSimulationFinalization);
        let last = status.stages().len() - 1;
        status.set_stage_status(last, StageStatus::Error, Some("disk full".into()));
        assert!(status.is_finished());
        assert_eq!(status.stages()[last].error.as_deref(), Some("disk full"));
    }

    #[test]
    fn view_derives_ids_from_positions() {
        let status = ChapterStatus::new(Chapter::SimpleCoupling);
        let view = status.to_view(2);
        assert_eq!(view.chapter_id, "simple_coupling2");
        assert_eq!(view.chapter_name, "Simple coupling");
        assert_eq!(view.stage_statuses[0].id, "initialization0");
        assert_eq!(view.stage_statuses[4].id, "modflow_simulation4");
    }

    #[test]
    fn view_serializes_with_stable_fields() {
        let mut status = ChapterStatus::new(Chapter::SimpleCoupling);
        status.set_stage_status(0, StageStatus::Running, None);
        let json = serde_json::to_value(status.to_view(0)).unwrap();
        assert_eq!(json["chapter_id"], "simple_coupling0");
        assert_eq!(json["stage_statuses"][0]["status"], "RUNNING");
        assert!(json["stage_statuses"][0]["error"].is_null());
    }
}
