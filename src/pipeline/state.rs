//! Pipeline stages and the linear state machine they drive.

use crate::utils::error::StageError;
use std::fmt;

/// One timed step of a run
///
/// Every stage except `Setup` is named after the state it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Setup,
    SourcePublished,
    ResultHarvested,
    Converted,
    TracePublished,
}

impl PipelineStage {
    /// All stages in execution order
    pub const ALL: [PipelineStage; 5] = [
        Self::Setup,
        Self::SourcePublished,
        Self::ResultHarvested,
        Self::Converted,
        Self::TracePublished,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::SourcePublished => "SourcePublished",
            Self::ResultHarvested => "ResultHarvested",
            Self::Converted => "Converted",
            Self::TracePublished => "TracePublished",
        }
    }

    /// Progress line shown while the stage runs
    pub fn description(&self) -> &'static str {
        match self {
            Self::Setup => "Setting up...",
            Self::SourcePublished => "Uploading TTPASM source to the assembler sheet...",
            Self::ResultHarvested => "Getting RAM file from the assembler sheet...",
            Self::Converted => "Creating CSV and TSV files...",
            Self::TracePublished => "Uploading trace data...",
        }
    }

    /// Label used in the timing summary
    pub fn summary_label(&self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::SourcePublished => "Uploading code",
            Self::ResultHarvested => "Downloading RAM file",
            Self::Converted => "Creating output files",
            Self::TracePublished => "Uploading trace data",
        }
    }

    /// State reached when this stage succeeds
    pub fn completed_state(&self) -> PipelineState {
        match self {
            Self::Setup => PipelineState::Init,
            Self::SourcePublished => PipelineState::SourcePublished,
            Self::ResultHarvested => PipelineState::ResultHarvested,
            Self::Converted => PipelineState::Converted,
            Self::TracePublished => PipelineState::TracePublished,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a run currently stands
#[derive(Debug)]
pub enum PipelineState {
    Init,
    SourcePublished,
    ResultHarvested,
    Converted,
    TracePublished,
    Done,
    Failed {
        stage: PipelineStage,
        cause: StageError,
    },
}

impl PipelineState {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::SourcePublished => write!(f, "SourcePublished"),
            Self::ResultHarvested => write!(f, "ResultHarvested"),
            Self::Converted => write!(f, "Converted"),
            Self::TracePublished => write!(f, "TracePublished"),
            Self::Done => write!(f, "Done"),
            Self::Failed { stage, cause } => write!(f, "Failed({}, {})", stage, cause),
        }
    }
}
