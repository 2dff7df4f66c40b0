/// Interface to the external JavaFoil tool
///
/// JavaFoil is driven entirely through macro scripts:
/// - `script` renders and reads back the fixed per-case macro
/// - `executor` launches the tool on a macro file
/// - `polar` reads the XML polar the tool saves

pub mod executor;
pub mod polar;
pub mod script;

pub use executor::{ExecutionOutput, JavaFoilExecutor, MacroExecutor};
pub use polar::{parse_polar_file, parse_polar_str, PolarPoint};
pub use script::{MacroCall, MacroScript};
