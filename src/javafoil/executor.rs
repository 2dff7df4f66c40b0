use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SweepResult;
use crate::profile_scope;
use crate::sweep::config::JavaFoilConfig;

/// Captured result of one macro run.
#[derive(Clone, Debug, Default)]
pub struct ExecutionOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a macro file to completion in the external host.
pub trait MacroExecutor: Send + Sync {
    fn execute(&self, script: &Path) -> SweepResult<ExecutionOutput>;
}

/// Launches JavaFoil headless: `java -cp mhclasses.jar -jar javafoil.jar Script=<macro>`.
#[derive(Clone, Debug)]
pub struct JavaFoilExecutor {
    java_bin: PathBuf,
    javafoil_jar: PathBuf,
    mhclasses_jar: PathBuf,
}

impl JavaFoilExecutor {
    pub fn new(config: &JavaFoilConfig) -> Self {
        Self {
            java_bin: config.java_bin.clone(),
            javafoil_jar: config.javafoil_jar.clone(),
            mhclasses_jar: config.mhclasses_jar.clone(),
        }
    }

    pub fn command(&self, script: &Path) -> Command {
        let mut cmd = Command::new(&self.java_bin);
        cmd.arg("-cp")
            .arg(&self.mhclasses_jar)
            .arg("-jar")
            .arg(&self.javafoil_jar)
            .arg(format!("Script={}", script.display()));
        cmd
    }
}

impl MacroExecutor for JavaFoilExecutor {
    fn execute(&self, script: &Path) -> SweepResult<ExecutionOutput> {
        profile_scope!("javafoil_run");
        log::debug!("Running JavaFoil on {}", script.display());

        let output = self.command(script).output()?;
        Ok(ExecutionOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
