/// Sweep runner: renders macros, drives JavaFoil and collects the dataset
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam::channel::{self, Receiver};
use log::{debug, info, warn};
use rayon::prelude::*;

use super::config::{SweepCase, SweepConfig};
use super::export::{build_rows, DatasetRow, DatasetWriter, FailedCase, RunSummary};
use crate::config::PROGRESS_REPORTS;
use crate::error::{SweepError, SweepResult};
use crate::javafoil::{parse_polar_file, JavaFoilExecutor, MacroExecutor, MacroScript};
use crate::naca::cached_coordinates;
use crate::profile_scope;

type CaseMessage = (String, SweepResult<Vec<DatasetRow>>);

pub struct SweepRunner {
    config: SweepConfig,
    executor: Box<dyn MacroExecutor>,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> Self {
        let executor = Box::new(JavaFoilExecutor::new(&config.javafoil));
        Self { config, executor }
    }

    pub fn with_executor(config: SweepConfig, executor: Box<dyn MacroExecutor>) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn prepare_directories(&self) -> SweepResult<()> {
        std::fs::create_dir_all(self.config.macro_dir())?;
        std::fs::create_dir_all(self.config.results_dir())?;
        debug!("Macros in {}", self.config.macro_dir().display());
        debug!("Results in {}", self.config.results_dir().display());
        Ok(())
    }

    /// Write every case's macro without running JavaFoil
    pub fn generate_macros(&self) -> SweepResult<usize> {
        self.prepare_directories()?;
        let cases = self.config.cases()?;
        for case in &cases {
            MacroScript::for_case(case, &self.config).write_to(self.config.macro_path(case))?;
        }
        info!(
            "Wrote {} macros to {}",
            cases.len(),
            self.config.macro_dir().display()
        );
        Ok(cases.len())
    }

    /// Run a single case by ID and write its rows to a per-case CSV
    pub fn run_case(&self, case_id: &str) -> SweepResult<Vec<DatasetRow>> {
        self.config.validate()?;
        let case = self.config.find_case(case_id)?;
        self.prepare_directories()?;

        println!("\n╔══════════════════════════════════════════╗");
        println!("║  Running case: {}  ", case.case_id);
        println!("╚══════════════════════════════════════════╝\n");

        let rows = self.process_case(&case)?;

        let path = self.config.case_csv_path(&case);
        let mut writer = DatasetWriter::create(&path)?;
        writer.write_header(self.config.execution.num_points)?;
        writer.write_rows(&rows)?;
        writer.finish()?;

        info!("Exported {} rows for case {} to {}", rows.len(), case.case_id, path.display());
        Ok(rows)
    }

    /// Run the whole sweep in parallel and write the master dataset.
    ///
    /// A failed case is logged and recorded in the summary; only output
    /// errors abort the run.
    pub fn run_all(&self) -> SweepResult<RunSummary> {
        self.config.validate()?;
        self.prepare_directories()?;
        let writer = DatasetWriter::create(self.config.dataset_path())?;
        self.run_all_into(writer)
    }

    /// Run the sweep, streaming rows into an already opened dataset writer
    pub(crate) fn run_all_into<W: Write>(
        &self,
        mut writer: DatasetWriter<W>,
    ) -> SweepResult<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        let cases = self.config.cases()?;
        let total = cases.len();

        writer.write_header(self.config.execution.num_points)?;
        writer.flush()?;

        let threads = self.config.worker_threads();
        info!(
            "Study '{}': {} cases on {} workers",
            self.config.study_name, total, threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sweep-worker-{}", i))
            .build()?;
        let (tx, rx) = channel::unbounded::<CaseMessage>();
        let cancelled = AtomicBool::new(false);

        let collected = thread::scope(|scope| {
            let (cases, pool, cancelled) = (&cases, &pool, &cancelled);
            scope.spawn(move || {
                pool.install(|| {
                    cases.par_iter().for_each_with(tx, |tx, case| {
                        if cancelled.load(Ordering::Relaxed) {
                            return;
                        }
                        let result = self.process_case(case);
                        let _ = tx.send((case.case_id.clone(), result));
                    });
                });
            });

            let collected = self.collect_results(rx, &mut writer, total);
            if collected.is_err() {
                cancelled.store(true, Ordering::Relaxed);
            }
            collected
        });
        let (completed, mut failed_cases) = collected?;

        let dataset_path = writer.path().to_path_buf();
        let rows_written = writer.finish()?;
        failed_cases.sort_by(|a, b| a.case_id.cmp(&b.case_id));

        let summary = RunSummary {
            study_name: self.config.study_name.clone(),
            started_at,
            elapsed_s: start.elapsed().as_secs_f64(),
            total_cases: total,
            completed_cases: completed,
            rows_written,
            dataset_path,
            failed_cases,
        };
        summary.write_to(self.config.summary_path())?;

        info!(
            "Sweep finished in {:.1}s: {}/{} cases, {} rows",
            summary.elapsed_s, completed, total, rows_written
        );
        crate::profiler::log_report();
        Ok(summary)
    }

    /// Drain worker results, writing rows in batches.
    fn collect_results<W: Write>(
        &self,
        rx: Receiver<CaseMessage>,
        writer: &mut DatasetWriter<W>,
        total: usize,
    ) -> SweepResult<(usize, Vec<FailedCase>)> {
        let batch_size = self.config.execution.csv_batch_size;
        let report_every = (total / PROGRESS_REPORTS).max(1);

        let mut batch: Vec<DatasetRow> = Vec::with_capacity(batch_size);
        let mut completed = 0;
        let mut received = 0;
        let mut failed = Vec::new();

        for (case_id, result) in rx {
            received += 1;
            match result {
                Ok(rows) => {
                    completed += 1;
                    batch.extend(rows);
                    if batch.len() >= batch_size {
                        profile_scope!("csv_flush");
                        writer.write_rows(&batch)?;
                        writer.flush()?;
                        batch.clear();
                    }
                }
                Err(e) => {
                    warn!("Case {} failed: {}", case_id, e);
                    failed.push(FailedCase {
                        case_id,
                        reason: e.to_string(),
                    });
                }
            }

            if received % report_every == 0 || received == total {
                info!(
                    "Progress: {}% ({}/{} cases, {} failed)",
                    received * 100 / total.max(1),
                    received,
                    total,
                    failed.len()
                );
            }
        }

        if !batch.is_empty() {
            writer.write_rows(&batch)?;
        }
        writer.flush()?;
        Ok((completed, failed))
    }

    /// Generate, run and parse one case.
    pub fn process_case(&self, case: &SweepCase) -> SweepResult<Vec<DatasetRow>> {
        profile_scope!("case_total");

        let macro_path = self.config.macro_path(case);
        MacroScript::for_case(case, &self.config).write_to(&macro_path)?;

        // A polar left over from an earlier run must not pass for this one
        let polar_path = self.config.polar_path(case);
        if polar_path.exists() {
            std::fs::remove_file(&polar_path)?;
        }

        let output = self.executor.execute(&macro_path)?;

        let wait = self.config.execution.post_run_wait_s;
        if wait > 0.0 {
            let wait = Duration::try_from_secs_f64(wait).map_err(|e| {
                SweepError::Config(format!("post_run_wait_s {}: {}", wait, e))
            })?;
            thread::sleep(wait);
        }

        if !output.success() {
            return Err(SweepError::Solver {
                case_id: case.case_id.clone(),
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !polar_path.exists() {
            return Err(SweepError::MissingPolar(polar_path));
        }

        let polar = parse_polar_file(&polar_path)?;
        if polar.is_empty() {
            return Err(SweepError::EmptyPolar(polar_path));
        }

        let coords = cached_coordinates(case.airfoil, self.config.execution.num_points);
        debug!("Case {}: {} polar points", case.case_id, polar.len());
        Ok(build_rows(case, &polar, &coords))
    }

    /// List all cases of the study
    pub fn list_cases(&self) -> SweepResult<()> {
        let cases = self.config.cases()?;

        println!("\n╔══════════════════════════════════════════╗");
        println!("║  Sweep study: {}  ", self.config.study_name);
        println!("╚══════════════════════════════════════════╝\n");

        println!("Total cases: {}", cases.len());
        println!(
            "Alpha: {} to {} step {} deg, {} panels\n",
            self.config.alpha.start,
            self.config.alpha.end,
            self.config.alpha.step,
            self.config.execution.num_points
        );

        for (idx, case) in cases.iter().enumerate() {
            println!(
                "  [{}] {}  (m={}%, p={}%, t={}%, Re={}, M={})",
                idx + 1,
                case.case_id,
                case.airfoil.max_camber(),
                case.airfoil.camber_location(),
                case.airfoil.thickness(),
                case.reynolds,
                case.mach
            );
        }
        println!();
        Ok(())
    }
}
