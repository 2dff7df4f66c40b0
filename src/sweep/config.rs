/// Sweep configuration structures
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{SweepError, SweepResult};
use crate::naca::NacaFourDigit;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Name of the study, used in logs and the run summary
    pub study_name: String,

    pub javafoil: JavaFoilConfig,

    pub output: OutputConfig,

    pub airfoils: AirfoilSweep,

    pub flow: FlowSweep,

    pub alpha: AlphaSweep,

    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaFoilConfig {
    pub java_bin: PathBuf,
    pub javafoil_jar: PathBuf,
    pub mhclasses_jar: PathBuf,
    /// Argument of `Options.Country`
    pub country: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Relative directories below resolve against this one
    pub base_dir: PathBuf,
    pub macro_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Dataset file name inside `results_dir`
    pub dataset_file: String,
    /// Gzip the dataset (`.gz` is appended to the file name)
    pub compress: bool,
    pub summary_file: String,
}

/// NACA 4-digit parameters, all in percent chord.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirfoilSweep {
    pub max_camber: Vec<u8>,
    pub camber_location: Vec<u8>,
    pub thickness: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSweep {
    pub reynolds: Vec<u64>,
    pub mach: Vec<f64>,
}

/// Angle-of-attack range in degrees, inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaSweep {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Panel count and number of cosine-spaced geometry stations
    pub num_points: usize,
    pub post_run_wait_s: f64,
    pub csv_batch_size: usize,
    /// Worker count; all available cores when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

/// One fully parameterised analysis: an airfoil at one Reynolds and Mach number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCase {
    /// e.g. `NACA2412_Re100000_M0p1`
    pub case_id: String,
    pub airfoil: NacaFourDigit,
    pub reynolds: u64,
    pub mach: f64,
}

impl SweepCase {
    pub fn new(airfoil: NacaFourDigit, reynolds: u64, mach: f64) -> Self {
        let case_id = format!("{}_Re{}_M{}", airfoil.name(), reynolds, mach_label(mach));
        Self {
            case_id,
            airfoil,
            reynolds,
            mach,
        }
    }
}

/// Mach number as it appears in file names: `0.1` becomes `0p1`.
pub fn mach_label(mach: f64) -> String {
    format!("{:?}", mach).replace('.', "p")
}

/// First value whose key has already been seen.
fn first_repeat<T>(values: &[T], key: impl Fn(&T) -> String) -> Option<String> {
    let mut seen = HashSet::new();
    values.iter().map(key).find(|k| !seen.insert(k.clone()))
}

fn default_base_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(config::DEFAULT_BASE_DIR_NAME)
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            study_name: "NACA 4-digit polar dataset".to_string(),
            javafoil: JavaFoilConfig::default(),
            output: OutputConfig::default(),
            airfoils: AirfoilSweep::default(),
            flow: FlowSweep::default(),
            alpha: AlphaSweep::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl Default for JavaFoilConfig {
    fn default() -> Self {
        Self {
            java_bin: PathBuf::from(config::DEFAULT_JAVA_BIN),
            javafoil_jar: PathBuf::from(config::DEFAULT_JAVAFOIL_JAR),
            mhclasses_jar: PathBuf::from(config::DEFAULT_MHCLASSES_JAR),
            country: config::DEFAULT_COUNTRY,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            macro_dir: PathBuf::from(config::DEFAULT_MACRO_DIR),
            results_dir: PathBuf::from(config::DEFAULT_RESULTS_DIR),
            dataset_file: config::DEFAULT_DATASET_FILE.to_string(),
            compress: false,
            summary_file: config::DEFAULT_SUMMARY_FILE.to_string(),
        }
    }
}

impl Default for AirfoilSweep {
    fn default() -> Self {
        Self {
            max_camber: config::default_max_camber(),
            camber_location: config::default_camber_location(),
            thickness: config::default_thickness(),
        }
    }
}

impl Default for FlowSweep {
    fn default() -> Self {
        Self {
            reynolds: config::default_reynolds(),
            mach: config::default_mach(),
        }
    }
}

impl Default for AlphaSweep {
    fn default() -> Self {
        Self {
            start: config::AOA_START_DEG,
            end: config::AOA_END_DEG,
            step: config::AOA_STEP_DEG,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            num_points: config::NUM_COORDINATE_POINTS,
            post_run_wait_s: config::POST_RUN_WAIT_S,
            csv_batch_size: config::CSV_WRITE_BATCH_SIZE,
            threads: None,
        }
    }
}

impl SweepConfig {
    /// Load and validate a sweep configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SweepConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> SweepResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> SweepResult<()> {
        let lists = [
            ("airfoils.max_camber", self.airfoils.max_camber.is_empty()),
            ("airfoils.camber_location", self.airfoils.camber_location.is_empty()),
            ("airfoils.thickness", self.airfoils.thickness.is_empty()),
            ("flow.reynolds", self.flow.reynolds.is_empty()),
            ("flow.mach", self.flow.mach.is_empty()),
        ];
        if let Some((name, _)) = lists.iter().find(|(_, empty)| *empty) {
            return Err(SweepError::Config(format!("{} must not be empty", name)));
        }

        // Repeated values would give two cases the same id and the same files
        let repeated = [
            ("airfoils.max_camber", first_repeat(&self.airfoils.max_camber, |v| v.to_string())),
            (
                "airfoils.camber_location",
                first_repeat(&self.airfoils.camber_location, |v| v.to_string()),
            ),
            ("airfoils.thickness", first_repeat(&self.airfoils.thickness, |v| v.to_string())),
            ("flow.reynolds", first_repeat(&self.flow.reynolds, |v| v.to_string())),
            ("flow.mach", first_repeat(&self.flow.mach, |&v| mach_label(v))),
        ];
        if let Some((name, Some(value))) = repeated.iter().find(|(_, dup)| dup.is_some()) {
            return Err(SweepError::Config(format!("{} lists {} more than once", name, value)));
        }

        if let Some(re) = self.flow.reynolds.iter().find(|&&re| re == 0) {
            return Err(SweepError::Config(format!("Reynolds number {} must be positive", re)));
        }
        if let Some(mach) = self.flow.mach.iter().find(|m| !(0.0..1.0).contains(*m)) {
            return Err(SweepError::Config(format!(
                "Mach number {} must lie in [0, 1)",
                mach
            )));
        }

        let alpha = &self.alpha;
        if !(alpha.step > 0.0) {
            return Err(SweepError::Config(format!(
                "alpha step {} must be positive",
                alpha.step
            )));
        }
        if alpha.end < alpha.start {
            return Err(SweepError::Config(format!(
                "alpha end {} is below start {}",
                alpha.end, alpha.start
            )));
        }

        if self.execution.num_points < 3 {
            return Err(SweepError::Config(format!(
                "num_points {} leaves no interior stations",
                self.execution.num_points
            )));
        }
        if self.execution.csv_batch_size == 0 {
            return Err(SweepError::Config("csv_batch_size must be positive".to_string()));
        }
        if self.execution.threads == Some(0) {
            return Err(SweepError::Config("threads must be positive".to_string()));
        }
        if !self.execution.post_run_wait_s.is_finite() || self.execution.post_run_wait_s < 0.0 {
            return Err(SweepError::Config(format!(
                "post_run_wait_s {} must be a non-negative number",
                self.execution.post_run_wait_s
            )));
        }

        self.airfoils()?;
        Ok(())
    }

    /// Every airfoil of the sweep, camber varying slowest.
    pub fn airfoils(&self) -> SweepResult<Vec<NacaFourDigit>> {
        let sweep = &self.airfoils;
        let mut foils = Vec::with_capacity(
            sweep.max_camber.len() * sweep.camber_location.len() * sweep.thickness.len(),
        );
        for &m in &sweep.max_camber {
            for &p in &sweep.camber_location {
                for &t in &sweep.thickness {
                    foils.push(NacaFourDigit::new(m, p, t)?);
                }
            }
        }
        Ok(foils)
    }

    /// Full-factorial case list: max camber, camber location, thickness,
    /// Reynolds number, Mach number (last varies fastest).
    pub fn cases(&self) -> SweepResult<Vec<SweepCase>> {
        let mut cases = Vec::new();
        for airfoil in self.airfoils()? {
            for &re in &self.flow.reynolds {
                for &mach in &self.flow.mach {
                    cases.push(SweepCase::new(airfoil, re, mach));
                }
            }
        }
        Ok(cases)
    }

    pub fn find_case(&self, case_id: &str) -> SweepResult<SweepCase> {
        self.cases()?
            .into_iter()
            .find(|c| c.case_id == case_id)
            .ok_or_else(|| SweepError::CaseNotFound(case_id.to_string()))
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.output.base_dir.join(dir)
        }
    }

    pub fn macro_dir(&self) -> PathBuf {
        self.resolve(&self.output.macro_dir)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.resolve(&self.output.results_dir)
    }

    pub fn dataset_path(&self) -> PathBuf {
        let mut name = self.output.dataset_file.clone();
        if self.output.compress {
            name.push_str(".gz");
        }
        self.results_dir().join(name)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.results_dir().join(&self.output.summary_file)
    }

    pub fn polar_path(&self, case: &SweepCase) -> PathBuf {
        self.results_dir().join(format!("{}_polar.xml", case.case_id))
    }

    pub fn macro_path(&self, case: &SweepCase) -> PathBuf {
        self.macro_dir().join(format!("macro_{}.js", case.case_id))
    }

    /// Per-case CSV written by single-case runs
    pub fn case_csv_path(&self, case: &SweepCase) -> PathBuf {
        self.results_dir().join(format!("{}.csv", case.case_id))
    }

    pub fn worker_threads(&self) -> usize {
        self.execution
            .threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(config::MIN_THREADS)
            })
            .max(config::MIN_THREADS)
    }

    pub fn case_count(&self) -> usize {
        self.airfoils.max_camber.len()
            * self.airfoils.camber_location.len()
            * self.airfoils.thickness.len()
            * self.flow.reynolds.len()
            * self.flow.mach.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sweep_matches_dataset_layout() {
        let config = SweepConfig::default();
        config.validate().unwrap();
        let cases = config.cases().unwrap();
        assert_eq!(cases.len(), 10 * 7 * 7 * 5 * 3);
        assert_eq!(cases.len(), config.case_count());
        assert_eq!(cases[0].case_id, "NACA0105_Re100000_M0p1");
        assert_eq!(cases[1].case_id, "NACA0105_Re100000_M0p2");
        assert_eq!(cases[3].case_id, "NACA0105_Re200000_M0p1");
        assert_eq!(cases.last().unwrap().case_id, "NACA9735_Re500000_M0p3");
    }

    #[test]
    fn case_paths_encode_identity() {
        let mut config = SweepConfig::default();
        config.output.base_dir = PathBuf::from("/srv/aero");
        config.output.results_dir = PathBuf::from("/scratch/polars");
        let case = SweepCase::new(NacaFourDigit::new(2, 40, 12).unwrap(), 300_000, 0.25);

        assert_eq!(case.case_id, "NACA2412_Re300000_M0p25");
        assert_eq!(
            config.polar_path(&case),
            PathBuf::from("/scratch/polars/NACA2412_Re300000_M0p25_polar.xml")
        );
        assert_eq!(
            config.macro_path(&case),
            PathBuf::from("/srv/aero/macros_temp/macro_NACA2412_Re300000_M0p25.js")
        );
    }

    #[test]
    fn compressed_dataset_gets_gz_suffix() {
        let mut config = SweepConfig::default();
        config.output.base_dir = PathBuf::from("/srv/aero");
        assert!(config.dataset_path().ends_with("results/master_airfoil_dataset.csv"));
        config.output.compress = true;
        assert!(config.dataset_path().ends_with("results/master_airfoil_dataset.csv.gz"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = r#"
            study_name = "thin sections"

            [airfoils]
            thickness = [6, 9]

            [flow]
            mach = [0.15]

            [execution]
            threads = 2
        "#;
        let config: SweepConfig = toml::from_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.study_name, "thin sections");
        assert_eq!(config.airfoils.thickness, vec![6, 9]);
        assert_eq!(config.airfoils.max_camber.len(), 10);
        assert_eq!(config.flow.reynolds.len(), 5);
        assert_eq!(config.execution.num_points, 101);
        assert_eq!(config.worker_threads(), 2);
    }

    #[test]
    fn toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        let mut config = SweepConfig::default();
        config.flow.reynolds = vec![250_000];
        config.to_file(&path).unwrap();

        let loaded = SweepConfig::from_file(&path).unwrap();
        assert_eq!(loaded.flow.reynolds, vec![250_000]);
        assert_eq!(loaded.case_count(), config.case_count());
    }

    #[test]
    fn rejects_invalid_sweeps() {
        let mut config = SweepConfig::default();
        config.flow.mach = vec![];
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));

        let mut config = SweepConfig::default();
        config.alpha.step = 0.0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.alpha.start = 5.0;
        config.alpha.end = -5.0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.flow.mach = vec![1.2];
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.airfoils.camber_location = vec![45];
        assert!(matches!(config.validate(), Err(SweepError::InvalidAirfoil(_))));
    }

    #[test]
    fn rejects_repeated_sweep_values() {
        let mut config = SweepConfig::default();
        config.airfoils.thickness = vec![12, 15, 12];
        match config.validate() {
            Err(SweepError::Config(msg)) => assert!(msg.contains("airfoils.thickness"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }

        let mut config = SweepConfig::default();
        config.flow.mach = vec![0.1, 0.2, 0.1];
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));

        let mut config = SweepConfig::default();
        config.flow.reynolds = vec![100_000, 100_000];
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));

        // Distinct values still give distinct case ids
        let mut config = SweepConfig::default();
        config.airfoils.thickness = vec![12, 15];
        config.flow.mach = vec![0.1, 0.15];
        config.validate().unwrap();
        let ids: HashSet<String> = config.cases().unwrap().into_iter().map(|c| c.case_id).collect();
        assert_eq!(ids.len(), config.case_count());
    }

    #[test]
    fn unknown_case_is_reported() {
        let config = SweepConfig::default();
        assert!(config.find_case("NACA2412_Re100000_M0p1").is_ok());
        assert!(matches!(
            config.find_case("NACA2412_Re123_M0p1"),
            Err(SweepError::CaseNotFound(_))
        ));
    }
}
