// Centralized defaults for sweep parameters

// ====================
// JavaFoil Installation
// ====================
pub const DEFAULT_JAVA_BIN: &str = "/usr/lib/jvm/java-8-openjdk-amd64/jre/bin/java";
pub const DEFAULT_JAVAFOIL_JAR: &str = "/opt/MH-AeroTools/JavaFoil/javafoil.jar";
pub const DEFAULT_MHCLASSES_JAR: &str = "/opt/MH-AeroTools/JavaFoil/mhclasses.jar";
/// Locale/unit option passed to `Options.Country`
pub const DEFAULT_COUNTRY: u32 = 1;

// ====================
// Output Layout
// ====================
/// Directory under $HOME holding macros and results
pub const DEFAULT_BASE_DIR_NAME: &str = "ML_Aero";
pub const DEFAULT_MACRO_DIR: &str = "macros_temp";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_DATASET_FILE: &str = "master_airfoil_dataset.csv";
pub const DEFAULT_SUMMARY_FILE: &str = "run_summary.json";

// ====================
// NACA 4-digit Sweep
// ====================
/// Max camber in percent chord (0% to 9%)
pub fn default_max_camber() -> Vec<u8> {
    (0..10).collect()
}
/// Camber location in percent chord (10% to 70%)
pub fn default_camber_location() -> Vec<u8> {
    (10..=70).step_by(10).collect()
}
/// Max thickness in percent chord (5% to 35%)
pub fn default_thickness() -> Vec<u8> {
    (5..=35).step_by(5).collect()
}

// ====================
// Flow Conditions
// ====================
pub fn default_reynolds() -> Vec<u64> {
    vec![100_000, 200_000, 300_000, 400_000, 500_000]
}
pub fn default_mach() -> Vec<f64> {
    vec![0.1, 0.2, 0.3]
}

// ====================
// Angle of Attack
// ====================
pub const AOA_START_DEG: f64 = -10.0;
pub const AOA_END_DEG: f64 = 10.0;
pub const AOA_STEP_DEG: f64 = 1.0;

// ====================
// Geometry / Execution
// ====================
/// Panel count handed to JavaFoil and number of cosine-spaced stations
pub const NUM_COORDINATE_POINTS: usize = 101;
/// Pause after each JavaFoil run (seconds)
pub const POST_RUN_WAIT_S: f64 = 0.1;
/// Rows buffered before each CSV flush
pub const CSV_WRITE_BATCH_SIZE: usize = 500;
/// Geometry cache entries kept before the cache is reset
pub const GEOMETRY_CACHE_CAPACITY: usize = 1024;
/// Minimum worker count when no thread count is configured
pub const MIN_THREADS: usize = 1;
/// Number of progress log lines over a full sweep
pub const PROGRESS_REPORTS: usize = 20;
