//! Pipeline orchestration.
//!
//! A run is strictly linear:
//! 1. Setup - read the source file and log in
//! 2. Publish the source (clear, then write as one column)
//! 3. Poll the RAM file range until the assembler has filled it
//! 4. Convert it and run the simulator
//! 5. Publish the trace (clear, then write row-major)
//!
//! The first failing stage ends the run. Nothing already written, locally or
//! remotely, is rolled back.

use super::state::{PipelineStage, PipelineState};
use crate::converter::FormatConverter;
use crate::store::{Grid, GridBackend, MajorDimension, RangeAddress, RemoteStore};
use crate::utils::config::{RAMFILE_RANGE, SOURCE_RANGE, TRACE_RANGE};
use crate::utils::error::StageError;
use crate::utils::timer::{time_stage, StageTiming};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a run reads and writes
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Local assembly source
    pub source_path: PathBuf,

    /// Output path without extension
    pub output_base: PathBuf,

    pub source_range: RangeAddress,
    pub result_range: RangeAddress,
    pub trace_range: RangeAddress,
}

impl PipelineConfig {
    /// Config using the standard assembler and trace analyzer ranges
    pub fn new(
        source_path: impl Into<PathBuf>,
        output_base: impl Into<PathBuf>,
        assembler_id: &str,
        trace_id: &str,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_base: output_base.into(),
            source_range: RangeAddress::new(assembler_id, SOURCE_RANGE),
            result_range: RangeAddress::new(assembler_id, RAMFILE_RANGE),
            trace_range: RangeAddress::new(trace_id, TRACE_RANGE),
        }
    }
}

/// One execution of the pipeline
#[derive(Debug)]
pub struct PipelineRun {
    pub state: PipelineState,

    /// Source lines as a single column
    pub source: Grid,

    /// RAM file rows read back from the store
    pub harvested: Grid,

    /// Lines written to the intermediate file
    pub intermediate: Vec<String>,

    /// Parsed simulator output
    pub trace: Grid,

    pub intermediate_path: Option<PathBuf>,
    pub trace_path: Option<PathBuf>,

    /// Timing of every stage that ran, in order
    pub timings: Vec<(PipelineStage, StageTiming)>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: PipelineState::Init,
            source: Grid::new(),
            harvested: Grid::new(),
            intermediate: Vec::new(),
            trace: Grid::new(),
            intermediate_path: None,
            trace_path: None,
            timings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state.is_done()
    }

    /// Failed stage and its cause, if the run failed
    pub fn failure(&self) -> Option<(PipelineStage, &StageError)> {
        match &self.state {
            PipelineState::Failed { stage, cause } => Some((*stage, cause)),
            _ => None,
        }
    }

    pub fn elapsed_for(&self, stage: PipelineStage) -> Option<Duration> {
        self.timings
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, timing)| timing.elapsed)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.timings.iter().map(|(_, timing)| timing.elapsed).sum()
    }
}

/// Signature shared by all stage bodies
type StageFn<B> = fn(&mut Pipeline<B>, &mut PipelineRun) -> Result<(), StageError>;

/// Sequences store, converter and simulator for one run
pub struct Pipeline<B> {
    store: RemoteStore<B>,
    converter: FormatConverter,
    config: PipelineConfig,
}

impl<B: GridBackend> Pipeline<B> {
    pub fn new(store: RemoteStore<B>, converter: FormatConverter, config: PipelineConfig) -> Self {
        Self {
            store,
            converter,
            config,
        }
    }

    pub fn store(&self) -> &RemoteStore<B> {
        &self.store
    }

    /// Execute every stage in order, stopping at the first failure
    ///
    /// **Public** - main entry point
    ///
    /// # Returns
    /// The finished run, either `Done` or `Failed`. Errors are recorded in
    /// the run rather than returned.
    pub fn run(&mut self) -> PipelineRun {
        let mut run = PipelineRun::new();

        info!(
            "Starting pipeline for {}",
            self.config.source_path.display()
        );

        let finished = self.advance(&mut run, PipelineStage::Setup, Self::setup)
            && self.advance(&mut run, PipelineStage::SourcePublished, Self::publish_source)
            && self.advance(&mut run, PipelineStage::ResultHarvested, Self::harvest_result)
            && self.advance(&mut run, PipelineStage::Converted, Self::convert)
            && self.advance(&mut run, PipelineStage::TracePublished, Self::publish_trace);

        if finished {
            run.state = PipelineState::Done;
            info!(
                "Pipeline completed in {:.2}s",
                run.total_elapsed().as_secs_f64()
            );
        }

        run
    }

    /// Time one stage and record its outcome
    ///
    /// **Private** - returns whether the run may continue
    fn advance(&mut self, run: &mut PipelineRun, stage: PipelineStage, op: StageFn<B>) -> bool {
        let timed = time_stage(stage.description(), || op(self, run));
        debug!(
            "Stage {} started at {} and took {:.3}s",
            stage,
            timed.timing.started_at.to_rfc3339(),
            timed.timing.seconds()
        );
        run.timings.push((stage, timed.timing));

        match timed.value {
            Ok(()) => {
                run.state = stage.completed_state();
                true
            }
            Err(cause) => {
                error!("Stage {} failed: {}", stage, cause);
                run.state = PipelineState::Failed { stage, cause };
                false
            }
        }
    }

    fn setup(&mut self, run: &mut PipelineRun) -> Result<(), StageError> {
        run.source = vec![read_source(&self.config.source_path)?];
        self.store.connect()?;
        Ok(())
    }

    fn publish_source(&mut self, run: &mut PipelineRun) -> Result<(), StageError> {
        // A write only covers its own cells; a longer previous program would
        // otherwise leave stale lines behind
        self.store.clear(&self.config.source_range)?;
        self.store
            .write(&self.config.source_range, &run.source, MajorDimension::Columns)?;
        Ok(())
    }

    fn harvest_result(&mut self, run: &mut PipelineRun) -> Result<(), StageError> {
        run.harvested = self.store.read(&self.config.result_range)?;
        info!("Harvested {} RAM file rows", run.harvested.len());
        Ok(())
    }

    fn convert(&mut self, run: &mut PipelineRun) -> Result<(), StageError> {
        let conversion = self
            .converter
            .convert(&run.harvested, &self.config.output_base)?;

        run.intermediate = conversion.intermediate;
        run.trace = conversion.trace;
        run.intermediate_path = Some(conversion.intermediate_path);
        run.trace_path = Some(conversion.trace_path);
        Ok(())
    }

    fn publish_trace(&mut self, run: &mut PipelineRun) -> Result<(), StageError> {
        self.store.clear(&self.config.trace_range)?;
        self.store
            .write(&self.config.trace_range, &run.trace, MajorDimension::Rows)?;
        Ok(())
    }
}

/// Read the source file as lines without terminators
fn read_source(path: &Path) -> Result<Vec<String>, StageError> {
    let contents = std::fs::read_to_string(path).map_err(|source| StageError::Source {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents.lines().map(str::to_string).collect())
}
