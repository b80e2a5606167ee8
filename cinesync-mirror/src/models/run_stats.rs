//! Per-run statistics
//!
//! Counters start at zero for every run and only grow when a staging write
//! succeeds. Stage handlers return a `StageReport`; the driver folds it into
//! `RunStats`.

use serde::Serialize;

/// Kind of staged artifact a counter tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    Movies,
    Images,
    Videos,
    Keywords,
    Similar,
    Credits,
    People,
}

impl Artifact {
    pub const ALL: [Artifact; 7] = [
        Artifact::Movies,
        Artifact::Images,
        Artifact::Videos,
        Artifact::Keywords,
        Artifact::Similar,
        Artifact::Credits,
        Artifact::People,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Artifact::Movies => "movies",
            Artifact::Images => "images",
            Artifact::Videos => "videos",
            Artifact::Keywords => "keywords",
            Artifact::Similar => "similar",
            Artifact::Credits => "credits",
            Artifact::People => "people",
        }
    }
}

/// Result of a single fetch-and-stage task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Written,
    /// Upstream reported the id does not exist
    NotFound,
    /// Upstream body lacked its identity field or did not match the schema
    Malformed,
}

/// Tally of one stage's tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub artifact: Artifact,
    pub attempted: u64,
    pub written: u64,
    pub not_found: u64,
    pub malformed: u64,
}

impl StageReport {
    pub fn from_outcomes(artifact: Artifact, outcomes: &[TaskOutcome]) -> Self {
        let mut report = StageReport {
            artifact,
            attempted: outcomes.len() as u64,
            written: 0,
            not_found: 0,
            malformed: 0,
        };
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Written => report.written += 1,
                TaskOutcome::NotFound => report.not_found += 1,
                TaskOutcome::Malformed => report.malformed += 1,
            }
        }
        report
    }
}

/// Staged-count check failure after the detail stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub expected: u64,
    pub actual: u64,
}

/// Successful staging writes of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub movies: u64,
    pub images: u64,
    pub videos: u64,
    pub keywords: u64,
    pub similar: u64,
    pub credits: u64,
    pub people: u64,
}

impl RunStats {
    pub fn get(&self, artifact: Artifact) -> u64 {
        match artifact {
            Artifact::Movies => self.movies,
            Artifact::Images => self.images,
            Artifact::Videos => self.videos,
            Artifact::Keywords => self.keywords,
            Artifact::Similar => self.similar,
            Artifact::Credits => self.credits,
            Artifact::People => self.people,
        }
    }

    fn counter_mut(&mut self, artifact: Artifact) -> &mut u64 {
        match artifact {
            Artifact::Movies => &mut self.movies,
            Artifact::Images => &mut self.images,
            Artifact::Videos => &mut self.videos,
            Artifact::Keywords => &mut self.keywords,
            Artifact::Similar => &mut self.similar,
            Artifact::Credits => &mut self.credits,
            Artifact::People => &mut self.people,
        }
    }

    pub fn absorb(&mut self, report: &StageReport) {
        *self.counter_mut(report.artifact) += report.written;
    }

    /// `new <artifact> collected: N` lines for the promotion prompt
    pub fn summary_lines(&self) -> Vec<String> {
        Artifact::ALL
            .iter()
            .map(|artifact| format!("new {} collected: {}", artifact.as_str(), self.get(*artifact)))
            .collect()
    }
}
