//! Visual Studio variant of the IDE project.
//!
//! Works on the project tree produced by the iPlug2 duplicate script:
//! `<Name>.sln`, `config.h`, `resources/main.rc` and one
//! `projects/<Name>-<format>.vcxproj` (plus `.vcxproj.filters`) per format.
//! The first customization swaps the prototype entries for markers such as
//! [`CL_COMPILE_MARKER`]; later insertions go directly above those markers.

use crate::error::{ComposerError, Result};
use crate::models::{
    OperatingSystem, PluginFormat, WorkspaceConfig, WorkspacePaths, relative_path, to_windows_path,
};
use crate::services::ide::{DependencyArchive, IdeProject};
use crate::services::text_patch::{
    assert_remove_line, assert_replace, contains_line, insert_before_marker, line_ending,
};
use camino::{Utf8Path, Utf8PathBuf};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

pub const CL_COMPILE_MARKER: &str = "<!-- composer:cl-compile -->";
pub const CL_INCLUDE_MARKER: &str = "<!-- composer:cl-include -->";
pub const FONTS_MARKER: &str = "// composer:fonts";
pub const IMAGES_MARKER: &str = "// composer:images";
pub const FILTERS_MARKER: &str = "<!-- composer:filters -->";

const FILTERS_BEGIN: &str = "<!-- composer:filters-begin -->";
const FILTERS_END: &str = "<!-- composer:filters-end -->";
const FILTER_NAME: &str = "Composer Sources";
const FILTER_GUID: &str = "{5b1f6c0e-7c3a-4d1e-9a4f-2c6b8e0d1a37}";

const PROTOTYPE_FONT: &str = "Roboto-Regular.ttf";
const PROTOTYPE_FONT_ALIAS: &str = "ROBOTO_FN";

/// Directory inside the IDE project holding projects of disabled formats
const STASH_DIR: &str = ".composer";
const PROJECT_FILE_EXTENSIONS: [&str; 3] = ["vcxproj", "vcxproj.filters", "vcxproj.user"];

/// Project suffix of a format, `None` for formats Visual Studio does not build
pub fn project_suffix(format: PluginFormat) -> Option<&'static str> {
    match format {
        PluginFormat::App => Some("app"),
        PluginFormat::Vst2 => Some("vst2"),
        PluginFormat::Vst3 => Some("vst3"),
        PluginFormat::Aax => Some("aax"),
        PluginFormat::Au2 | PluginFormat::Au3 => None,
    }
}

/// Solution text removed while a format is disabled
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FormatStash {
    format: PluginFormat,
    project_block: Vec<String>,
    section_lines: Vec<SectionLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SectionLine {
    section: String,
    /// GUID of the project owning a `ProjectSection`, `None` for global sections
    #[serde(default)]
    owner: Option<String>,
    line: String,
}

pub struct VisualStudioProject {
    ide_command: Option<String>,
    github_base_url: String,
    project_guid: Regex,
}

impl VisualStudioProject {
    pub fn new(ide_command: Option<String>, github_base_url: String) -> Self {
        Self {
            ide_command,
            github_base_url: github_base_url.trim_end_matches('/').to_string(),
            project_guid: Regex::new(r"\{[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}\}")
                .expect("Invalid GUID regex"),
        }
    }

    pub fn solution_file(paths: &WorkspacePaths) -> Utf8PathBuf {
        paths.ide_project_dir.join(format!("{}.sln", paths.project_name))
    }

    pub fn config_header(paths: &WorkspacePaths) -> Utf8PathBuf {
        paths.ide_project_dir.join("config.h")
    }

    pub fn resource_script(paths: &WorkspacePaths) -> Utf8PathBuf {
        paths.ide_resources_dir().join("main.rc")
    }

    fn project_file(paths: &WorkspacePaths, suffix: &str, extension: &str) -> Utf8PathBuf {
        paths
            .ide_projects_dir()
            .join(format!("{}-{}.{}", paths.project_name, suffix, extension))
    }

    /// Existing `.vcxproj` files; at least one is required
    fn project_files(paths: &WorkspacePaths) -> Result<Vec<Utf8PathBuf>> {
        let files: Vec<Utf8PathBuf> = PluginFormat::ALL
            .into_iter()
            .filter_map(project_suffix)
            .map(|suffix| Self::project_file(paths, suffix, "vcxproj"))
            .filter(|path| path.is_file())
            .collect();

        if files.is_empty() {
            return Err(ComposerError::Assertion(format!(
                "No Visual Studio projects found in {}",
                paths.ide_projects_dir()
            )));
        }
        Ok(files)
    }

    fn filter_files(paths: &WorkspacePaths) -> Vec<Utf8PathBuf> {
        PluginFormat::ALL
            .into_iter()
            .filter_map(project_suffix)
            .map(|suffix| Self::project_file(paths, suffix, "vcxproj.filters"))
            .filter(|path| path.is_file())
            .collect()
    }

    /// `<ClCompile .../>` or `<ClInclude .../>` entry and the marker it goes above
    fn source_entry(paths: &WorkspacePaths, name: &str) -> (String, &'static str) {
        let relative = relative_path(&paths.ide_projects_dir(), &paths.sources_dir.join(name));
        let include = xml_attribute(&to_windows_path(&relative));
        if is_compiled(name) {
            (format!("<ClCompile Include=\"{}\" />", include), CL_COMPILE_MARKER)
        } else {
            (format!("<ClInclude Include=\"{}\" />", include), CL_INCLUDE_MARKER)
        }
    }

    fn add_resource(
        &self,
        paths: &WorkspacePaths,
        dir: &Utf8Path,
        name: &str,
        alias: &str,
        resource_type: &str,
        marker: &str,
    ) -> Result<bool> {
        let define = format!("#define {} \"{}\"", alias, name);
        let relative = relative_path(&paths.ide_resources_dir(), &dir.join(name));
        let resource = format!(
            "{} {} \"{}\"",
            alias,
            resource_type,
            to_windows_path(&relative).replace('\\', "\\\\")
        );

        let header = Self::config_header(paths);
        if let Some(existing) = defined_file(&read(&header)?, alias) {
            if existing != name {
                warn!("{} of {} is already defined for {}", alias, name, existing);
                return Err(ComposerError::Conflict(name.to_string()));
            }
        }

        let mut added = false;
        for (path, entry) in [
            (header, define),
            (Self::resource_script(paths), resource),
        ] {
            let content = read(&path)?;
            if contains_line(&content, &entry) {
                debug!("{} already references {}", path, name);
                continue;
            }
            write(&path, &insert_before_marker(&content, marker, &entry)?)?;
            added = true;
        }

        if added {
            info!("Added {} {} as {}", resource_type, name, alias);
        }
        Ok(added)
    }

    fn remove_resource(
        &self,
        paths: &WorkspacePaths,
        dir: &Utf8Path,
        name: &str,
        alias: &str,
        resource_type: &str,
    ) -> Result<()> {
        let define = format!("#define {} \"{}\"", alias, name);
        let relative = relative_path(&paths.ide_resources_dir(), &dir.join(name));
        let resource = format!(
            "{} {} \"{}\"",
            alias,
            resource_type,
            to_windows_path(&relative).replace('\\', "\\\\")
        );

        let header = Self::config_header(paths);
        write(&header, &assert_remove_line(&read(&header)?, &define)?)?;
        let script = Self::resource_script(paths);
        write(&script, &assert_remove_line(&read(&script)?, &resource)?)?;

        info!("Removed {} {}", resource_type, name);
        Ok(())
    }

    fn filters_section(paths: &WorkspacePaths, source_files: &[String], newline: &str) -> String {
        let mut lines = vec![
            FILTERS_BEGIN.to_string(),
            "  <ItemGroup>".to_string(),
            format!("    <Filter Include=\"{}\">", FILTER_NAME),
            format!("      <UniqueIdentifier>{}</UniqueIdentifier>", FILTER_GUID),
            "    </Filter>".to_string(),
            "  </ItemGroup>".to_string(),
        ];

        if !source_files.is_empty() {
            lines.push("  <ItemGroup>".to_string());
            for name in source_files {
                let relative = relative_path(&paths.ide_projects_dir(), &paths.sources_dir.join(name));
                let tag = if is_compiled(name) { "ClCompile" } else { "ClInclude" };
                lines.push(format!(
                    "    <{} Include=\"{}\">",
                    tag,
                    xml_attribute(&to_windows_path(&relative))
                ));
                lines.push(format!("      <Filter>{}</Filter>", FILTER_NAME));
                lines.push(format!("    </{}>", tag));
            }
            lines.push("  </ItemGroup>".to_string());
        }

        lines.push(FILTERS_END.to_string());
        lines.join(newline)
    }

    fn stash_dir(paths: &WorkspacePaths) -> Utf8PathBuf {
        paths.ide_project_dir.join(STASH_DIR)
    }

    fn stash_file(paths: &WorkspacePaths, suffix: &str) -> Utf8PathBuf {
        Self::stash_dir(paths).join(format!("{}.json", suffix))
    }

    fn find_project_line(lines: &[String], project: &str) -> Option<usize> {
        let quoted = format!("\"{}\"", project);
        lines
            .iter()
            .position(|line| line.trim_start().starts_with("Project(") && line.contains(&quoted))
    }

    fn define_values(config: &WorkspaceConfig) -> Result<Vec<(&'static str, String)>> {
        let version = config.version()?;
        let flag = |value: bool| if value { "1" } else { "0" }.to_string();

        Ok(vec![
            ("PLUG_NAME", c_string(&config.project_name)),
            ("PLUG_MFR", c_string(&config.manufacturer_name)),
            ("PLUG_VERSION_HEX", version.to_hex()),
            ("PLUG_VERSION_STR", c_string(&version.to_string())),
            ("PLUG_UNIQUE_ID", format!("'{}'", config.vst_unique_id)),
            ("PLUG_MFR_ID", format!("'{}'", config.manufacturer_id)),
            ("PLUG_URL_STR", c_string(&config.manufacturer_website)),
            ("PLUG_EMAIL_STR", c_string(&config.manufacturer_email)),
            ("PLUG_COPYRIGHT_STR", c_string(&config.manufacturer_copyright_notice)),
            ("BUNDLE_NAME", c_string(&config.audio_unit_bundle_name)),
            ("BUNDLE_MFR", c_string(&config.audio_unit_bundle_manufacturer)),
            ("BUNDLE_DOMAIN", c_string(&config.audio_unit_bundle_domain)),
            (
                "PLUG_CHANNEL_IO",
                c_string(&format!("{}-{}", config.input_channels, config.output_channels)),
            ),
            ("PLUG_LATENCY", config.plugin_latency.to_string()),
            ("PLUG_TYPE", config.plugin_type.plug_type().to_string()),
            ("PLUG_DOES_MIDI_IN", flag(config.midi_in)),
            ("PLUG_DOES_MIDI_OUT", flag(config.midi_out)),
            ("PLUG_DOES_MPE", flag(config.mpe)),
            ("PLUG_DOES_STATE_CHUNKS", flag(config.state_chunks)),
            ("PLUG_HAS_UI", flag(config.ui_enabled)),
            ("PLUG_WIDTH", config.ui_width.to_string()),
            ("PLUG_HEIGHT", config.ui_height.to_string()),
            ("PLUG_FPS", config.fps.to_string()),
            ("PLUG_HOST_RESIZE", flag(config.ui_resizable)),
            ("VST3_SUBCATEGORY", c_string(config.vst3_subcategory.as_vst3_str())),
            ("APP_NUM_CHANNELS", config.output_channels.to_string()),
            ("APP_N_VECTOR_WAIT", config.app_vector_wait_multiplier.to_string()),
            ("APP_MULT", config.app_output_multiplier.to_string()),
            ("APP_SIGNAL_VECTOR_SIZE", config.app_signal_vector_size.to_string()),
        ])
    }
}

impl IdeProject for VisualStudioProject {
    fn os(&self) -> OperatingSystem {
        OperatingSystem::Windows
    }

    fn ide_name(&self) -> &'static str {
        "Visual Studio"
    }

    fn dependency_archives(&self, config: &WorkspaceConfig) -> Result<Vec<DependencyArchive>> {
        let iplug2_dir = format!("iPlug2-{}", config.iplug2_git_hash);
        Ok(vec![
            DependencyArchive {
                name: "iPlug2".to_string(),
                url: format!(
                    "{}/iPlug2/iPlug2/archive/{}.zip",
                    self.github_base_url, config.iplug2_git_hash
                ),
                root_dir: iplug2_dir.clone(),
                install_dir: Utf8PathBuf::from(&iplug2_dir),
            },
            DependencyArchive {
                name: "VST3 SDK".to_string(),
                url: format!(
                    "{}/steinbergmedia/vst3sdk/archive/{}.zip",
                    self.github_base_url, config.vst3_sdk_git_hash
                ),
                root_dir: format!("vst3sdk-{}", config.vst3_sdk_git_hash),
                install_dir: Utf8PathBuf::from(iplug2_dir)
                    .join("Dependencies")
                    .join("IPlug")
                    .join("VST3_SDK"),
            },
        ])
    }

    fn start_ide_project(&self, paths: &WorkspacePaths) -> Result<()> {
        let solution = Self::solution_file(paths);
        if !solution.is_file() {
            return Err(ComposerError::Process(format!(
                "Solution {} does not exist, generate the project first",
                solution
            )));
        }

        let mut command = match &self.ide_command {
            Some(template) => {
                let mut parts = template
                    .split_whitespace()
                    .map(|part| part.replace("{project}", solution.as_str()));
                let program = parts
                    .next()
                    .ok_or_else(|| ComposerError::Process("IDE command is empty".to_string()))?;
                let mut command = Command::new(program);
                command.args(parts);
                command
            }
            None => {
                let mut command = Command::new("cmd");
                command.args(["/C", "start", "\"\""]).arg(solution.as_str());
                command
            }
        };

        command
            .current_dir(&paths.ide_project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        info!("Starting {} with {:?}", self.ide_name(), command);
        command
            .spawn()
            .map_err(|e| ComposerError::Process(format!("Failed to start {}: {}", self.ide_name(), e)))?;
        Ok(())
    }

    fn remove_default_prototype_source_files(
        &self,
        paths: &WorkspacePaths,
        prototype_files: &[String],
    ) -> Result<()> {
        for project in Self::project_files(paths)? {
            let mut content = read(&project)?;
            for name in prototype_files {
                let (tag, marker) = if is_compiled(name) {
                    ("ClCompile", CL_COMPILE_MARKER)
                } else {
                    ("ClInclude", CL_INCLUDE_MARKER)
                };
                let entry = format!("<{} Include=\"..\\{}\" />", tag, name);

                content = match (content.contains(&entry), content.contains(marker)) {
                    (true, false) => assert_replace(&content, &entry, marker)?,
                    (true, true) => assert_remove_line(&content, &entry)?,
                    (false, true) => {
                        debug!("{} no longer references {}", project, name);
                        content
                    }
                    (false, false) => {
                        return Err(ComposerError::Assertion(format!(
                            "Could not find prototype entry '{}' in {}",
                            entry, project
                        )));
                    }
                };
            }
            write(&project, &content)?;
        }

        for name in prototype_files {
            remove_file_if_exists(&paths.ide_project_dir.join(name))?;
        }
        info!("Removed prototype sources {:?}", prototype_files);
        Ok(())
    }

    fn remove_default_prototype_font_files(&self, paths: &WorkspacePaths) -> Result<()> {
        let define = format!("#define {} \"{}\"", PROTOTYPE_FONT_ALIAS, PROTOTYPE_FONT);
        let resource = format!("{} TTF {}", PROTOTYPE_FONT_ALIAS, PROTOTYPE_FONT_ALIAS);

        for (path, entry) in [
            (Self::config_header(paths), define),
            (Self::resource_script(paths), resource),
        ] {
            let content = read(&path)?;
            if !content.contains(&entry) && content.contains(FONTS_MARKER) {
                debug!("{} no longer references the prototype font", path);
                continue;
            }
            let markers = format!("{}{}{}", FONTS_MARKER, line_ending(&content), IMAGES_MARKER);
            write(&path, &assert_replace(&content, &entry, &markers)?)?;
        }

        remove_file_if_exists(&paths.ide_resources_dir().join("fonts").join(PROTOTYPE_FONT))?;
        info!("Removed prototype font {}", PROTOTYPE_FONT);
        Ok(())
    }

    fn add_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<bool> {
        let (entry, marker) = Self::source_entry(paths, name);
        let mut added = false;

        for project in Self::project_files(paths)? {
            let content = read(&project)?;
            if contains_line(&content, &entry) {
                debug!("{} already references {}", project, name);
                continue;
            }
            write(&project, &insert_before_marker(&content, marker, &entry)?)?;
            added = true;
        }

        if added {
            info!("Added source file {}", name);
        }
        Ok(added)
    }

    fn remove_source_file(&self, paths: &WorkspacePaths, name: &str) -> Result<()> {
        let (entry, _) = Self::source_entry(paths, name);
        for project in Self::project_files(paths)? {
            let content = read(&project)?;
            write(&project, &assert_remove_line(&content, &entry)?)?;
        }
        info!("Removed source file {}", name);
        Ok(())
    }

    fn add_font_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<bool> {
        self.add_resource(paths, &paths.fonts_dir, name, alias, "TTF", FONTS_MARKER)
    }

    fn remove_font_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<()> {
        self.remove_resource(paths, &paths.fonts_dir, name, alias, "TTF")
    }

    fn add_image_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<bool> {
        self.add_resource(paths, &paths.images_dir, name, alias, "PNG", IMAGES_MARKER)
    }

    fn remove_image_file(&self, paths: &WorkspacePaths, name: &str, alias: &str) -> Result<()> {
        self.remove_resource(paths, &paths.images_dir, name, alias, "PNG")
    }

    fn reconfigure_file_filters(&self, paths: &WorkspacePaths, source_files: &[String]) -> Result<()> {
        for filters in Self::filter_files(paths) {
            let mut content = read(&filters)?;
            let newline = line_ending(&content);

            if let (Some(begin), Some(end)) = (content.find(FILTERS_BEGIN), content.find(FILTERS_END)) {
                let start = content[..begin].rfind('\n').map(|i| i + 1).unwrap_or(0);
                let stop = content[end..]
                    .find('\n')
                    .map(|i| end + i + 1)
                    .unwrap_or(content.len());
                content.replace_range(start..stop, "");
            }
            if !content.contains(FILTERS_MARKER) {
                content = insert_before_marker(&content, "<ItemGroup>", FILTERS_MARKER)?;
            }

            let section = Self::filters_section(paths, source_files, newline);
            write(&filters, &insert_before_marker(&content, FILTERS_MARKER, &section)?)?;
            debug!("Reconfigured filters in {}", filters);
        }
        info!("Reconfigured file filters for {} source files", source_files.len());
        Ok(())
    }

    fn apply_config(&self, paths: &WorkspacePaths, config: &WorkspaceConfig) -> Result<()> {
        let header = Self::config_header(paths);
        let mut content = read(&header)?;

        for (name, value) in Self::define_values(config)? {
            let pattern = Regex::new(&format!(r"(?mR)^[ \t]*#define[ \t]+{}(?:[ \t].*)?$", name))
                .map_err(|e| ComposerError::Assertion(format!("Invalid define pattern {}: {}", name, e)))?;
            if !pattern.is_match(&content) {
                return Err(ComposerError::Assertion(format!(
                    "Could not find '#define {}' in {}",
                    name, header
                )));
            }
            let line = format!("#define {} {}", name, value);
            content = pattern.replace_all(&content, NoExpand(&line)).into_owned();
        }

        write(&header, &content)?;
        info!("Applied configuration of {} to {}", config.project_name, header);
        Ok(())
    }

    fn remove_format(&self, paths: &WorkspacePaths, format: PluginFormat) -> Result<()> {
        let Some(suffix) = project_suffix(format) else {
            debug!("{} is not built by {}, nothing to remove", format, self.ide_name());
            return Ok(());
        };

        let solution = Self::solution_file(paths);
        let content = read(&solution)?;
        let newline = line_ending(&content);
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let project = format!("{}-{}", paths.project_name, suffix);
        let stash_file = Self::stash_file(paths, suffix);

        let Some(start) = Self::find_project_line(&lines, &project) else {
            if stash_file.is_file() {
                debug!("{} is already disabled", format);
                return Ok(());
            }
            return Err(ComposerError::Assertion(format!(
                "Could not find project '{}' in {}",
                project, solution
            )));
        };
        let end = lines[start..]
            .iter()
            .position(|line| line.trim() == "EndProject")
            .map(|offset| start + offset)
            .ok_or_else(|| {
                ComposerError::Assertion(format!("Project '{}' in {} is not terminated", project, solution))
            })?;
        let guid = self
            .project_guid
            .find_iter(&lines[start])
            .last()
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ComposerError::Assertion(format!("Project '{}' has no GUID", project)))?;

        let mut kept = Vec::with_capacity(lines.len());
        let mut section_lines = Vec::new();
        let mut section = String::new();
        let mut owner: Option<String> = None;
        for (index, line) in lines.iter().enumerate() {
            if (start..=end).contains(&index) {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.starts_with("Project(") {
                owner = self.project_guid.find_iter(trimmed).last().map(|m| m.as_str().to_string());
            } else if trimmed == "EndProject" {
                owner = None;
            }
            if trimmed.starts_with("GlobalSection(") || trimmed.starts_with("ProjectSection(") {
                section = trimmed.to_string();
            }
            if line.contains(&guid) {
                section_lines.push(SectionLine {
                    section: section.clone(),
                    owner: owner.clone(),
                    line: line.clone(),
                });
                continue;
            }
            kept.push(line.clone());
        }

        let stash = FormatStash {
            format,
            project_block: lines[start..=end].to_vec(),
            section_lines,
        };
        let stash_dir = Self::stash_dir(paths);
        fs::create_dir_all(&stash_dir)
            .map_err(|e| ComposerError::io(format!("Failed to create {}", stash_dir), e))?;
        let stash_json = serde_json::to_string_pretty(&stash)
            .map_err(|e| ComposerError::Assertion(format!("Failed to serialize format stash: {}", e)))?;
        write(&stash_file, &stash_json)?;

        for extension in PROJECT_FILE_EXTENSIONS {
            let file = Self::project_file(paths, suffix, extension);
            if file.is_file() {
                let target = stash_dir.join(file.file_name().unwrap_or(extension));
                fs::rename(&file, &target)
                    .map_err(|e| ComposerError::io(format!("Failed to move {}", file), e))?;
            }
        }

        write(&solution, &join_lines(&kept, newline, &content))?;
        info!("Removed format {} from {}", format, solution);
        Ok(())
    }

    fn add_format(&self, paths: &WorkspacePaths, format: PluginFormat) -> Result<()> {
        let Some(suffix) = project_suffix(format) else {
            debug!("{} is not built by {}, nothing to add", format, self.ide_name());
            return Ok(());
        };

        let solution = Self::solution_file(paths);
        let content = read(&solution)?;
        let newline = line_ending(&content);
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        let project = format!("{}-{}", paths.project_name, suffix);

        if Self::find_project_line(&lines, &project).is_some() {
            debug!("{} is already enabled", format);
            return Ok(());
        }

        let stash_file = Self::stash_file(paths, suffix);
        let stash: FormatStash = match fs::read_to_string(&stash_file) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| ComposerError::Parse {
                path: stash_file.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ComposerError::Assertion(format!(
                    "Format {} cannot be restored, {} was never disabled by the composer",
                    format, project
                )));
            }
            Err(e) => return Err(ComposerError::io(format!("Failed to read {}", stash_file), e)),
        };

        let global = lines
            .iter()
            .position(|line| line.trim() == "Global")
            .ok_or_else(|| ComposerError::Assertion(format!("Could not find 'Global' in {}", solution)))?;
        for (offset, line) in stash.project_block.iter().enumerate() {
            lines.insert(global + offset, line.clone());
        }

        for entry in &stash.section_lines {
            let close = section_end(&lines, entry).ok_or_else(|| {
                ComposerError::Assertion(format!("Could not find '{}' in {}", entry.section, solution))
            })?;
            lines.insert(close, entry.line.clone());
        }

        let stash_dir = Self::stash_dir(paths);
        for extension in PROJECT_FILE_EXTENSIONS {
            let target = Self::project_file(paths, suffix, extension);
            let Some(file_name) = target.file_name() else {
                continue;
            };
            let stashed = stash_dir.join(file_name);
            if stashed.is_file() {
                fs::rename(&stashed, &target)
                    .map_err(|e| ComposerError::io(format!("Failed to restore {}", target), e))?;
            }
        }

        write(&solution, &join_lines(&lines, newline, &content))?;
        remove_file_if_exists(&stash_file)?;
        info!("Restored format {} in {}", format, solution);
        Ok(())
    }
}

/// Index of the line closing the section an entry was taken from
fn section_end(lines: &[String], entry: &SectionLine) -> Option<usize> {
    let (first, last) = match &entry.owner {
        Some(owner) => {
            let start = lines
                .iter()
                .position(|line| line.trim().starts_with("Project(") && line.contains(owner.as_str()))?;
            let end = lines[start..].iter().position(|line| line.trim() == "EndProject")?;
            (start, start + end)
        }
        None => (0, lines.len()),
    };
    let header = first + lines[first..last].iter().position(|line| line.trim() == entry.section)?;
    let close = lines[header..last]
        .iter()
        .position(|line| line.trim().starts_with("End"))?;
    Some(header + close)
}

fn is_compiled(name: &str) -> bool {
    Utf8Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("cpp"))
        .unwrap_or(false)
}

/// Escape a value for use inside a double-quoted XML attribute
fn xml_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// File name a `#define <alias> "<file>"` line in `content` points at
fn defined_file<'a>(content: &'a str, alias: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("#define")?;
        let rest = rest.trim_start().strip_prefix(alias)?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let value = rest.trim();
        Some(value.strip_prefix('"')?.strip_suffix('"').unwrap_or(value))
    })
}

/// Quote a value as a C string literal
fn c_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn join_lines(lines: &[String], newline: &str, original: &str) -> String {
    let mut joined = lines.join(newline);
    if original.ends_with('\n') {
        joined.push_str(newline);
    }
    joined
}

fn read(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ComposerError::io(format!("Failed to read {}", path), e))
}

fn write(path: &Utf8Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| ComposerError::io(format!("Failed to write {}", path), e))
}

fn remove_file_if_exists(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Expected {} to exist", path);
            Ok(())
        }
        Err(e) => Err(ComposerError::io(format!("Failed to delete {}", path), e)),
    }
}
