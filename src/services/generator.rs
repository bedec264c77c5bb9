use crate::error::{ComposerError, Result};
use crate::models::{WorkspaceConfig, WorkspacePaths};
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Invocation of the iPlug2 `duplicate.py` script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Utf8PathBuf,
}

impl GeneratorCommand {
    /// Display form for logs
    pub fn to_command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|arg| {
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Runs the external generator that produces the IDE project tree
pub struct ProjectGenerator {
    python: String,
    timeout: Duration,
}

impl ProjectGenerator {
    pub fn new(python: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    /// Build the duplicate command for `config`.
    ///
    /// # Arguments
    /// * `iplug2_dir` - Root of the installed iPlug2 checkout
    /// * `config` - Selects the template and supplies name and manufacturer
    /// * `paths` - Output goes to the workspace directory
    pub fn build_command(
        &self,
        iplug2_dir: &Utf8Path,
        config: &WorkspaceConfig,
        paths: &WorkspacePaths,
    ) -> GeneratorCommand {
        GeneratorCommand {
            program: self.python.clone(),
            args: vec![
                "duplicate.py".to_string(),
                config.plugin_type.template_project().to_string(),
                config.project_name.clone(),
                config.manufacturer_name.clone(),
                paths.workspace_dir.to_string(),
            ],
            cwd: iplug2_dir.join("Examples"),
        }
    }

    /// Run the generator and check that it produced the IDE project directory
    pub async fn generate(
        &self,
        iplug2_dir: &Utf8Path,
        config: &WorkspaceConfig,
        paths: &WorkspacePaths,
    ) -> Result<()> {
        let command = self.build_command(iplug2_dir, config, paths);
        if !command.cwd.join("duplicate.py").is_file() {
            return Err(ComposerError::Process(format!(
                "Generator script not found in {}",
                command.cwd
            )));
        }

        let exit_code = self.execute(&command).await?;
        if exit_code != 0 {
            return Err(ComposerError::Process(format!(
                "Generator exited with code {}",
                exit_code
            )));
        }
        if !paths.ide_project_dir.is_dir() {
            return Err(ComposerError::Process(format!(
                "Generator did not create {}",
                paths.ide_project_dir
            )));
        }
        Ok(())
    }

    /// # Returns
    /// The process exit code (-1 when terminated by a signal)
    pub async fn execute(&self, command: &GeneratorCommand) -> Result<i32> {
        info!("Executing: {}", command.to_command_line());
        let start = Instant::now();

        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ComposerError::Process(format!("Failed to spawn {}: {}", command.program, e)))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("Generator timed out after {:?}", self.timeout);
                ComposerError::Process(format!("Generator timed out after {:?}", self.timeout))
            })?
            .map_err(|e| ComposerError::Process(format!("Failed to wait for generator: {}", e)))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("generator: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!("generator: {}", line);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        info!(
            "Generator completed in {:.2}s with exit code {}",
            start.elapsed().as_secs_f32(),
            exit_code
        );
        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperatingSystem, PluginType};

    #[test]
    fn test_build_command_for_instrument() {
        let generator = ProjectGenerator::new("python3", Duration::from_secs(5));
        let mut config = WorkspaceConfig::default();
        config.plugin_type = PluginType::Instrument;
        config.project_name = "Synth".to_string();
        let paths = WorkspacePaths::resolve("/w/composer.json", &config, OperatingSystem::Windows);

        let command = generator.build_command(Utf8Path::new("/deps/iPlug2-x"), &config, &paths);

        assert_eq!(command.program, "python3");
        assert_eq!(
            command.args,
            vec!["duplicate.py", "IPlugInstrument", "Synth", "MyPlugInCompany", "/w/build-win"]
        );
        assert_eq!(command.cwd, Utf8PathBuf::from("/deps/iPlug2-x/Examples"));
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let command = GeneratorCommand {
            program: "python".to_string(),
            args: vec!["duplicate.py".to_string(), "C:\\My Plugins".to_string()],
            cwd: Utf8PathBuf::from("."),
        };
        assert_eq!(command.to_command_line(), "python duplicate.py \"C:\\My Plugins\"");
    }

    #[tokio::test]
    async fn test_missing_script_is_process_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let config = WorkspaceConfig::default();
        let paths = WorkspacePaths::resolve(root.join("composer.json"), &config, OperatingSystem::Windows);

        let generator = ProjectGenerator::new("python3", Duration::from_secs(5));
        let result = generator.generate(&root.join("iPlug2"), &config, &paths).await;
        assert!(matches!(result, Err(ComposerError::Process(_))));
    }
}
