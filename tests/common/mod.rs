//! Shared fixtures: a temporary workspace and a generated Visual Studio
//! project in the shape the iPlug2 duplicate script produces.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use iplug_composer::models::{OperatingSystem, WorkspaceConfig, WorkspacePaths};
use std::fs;
use tempfile::TempDir;

pub const APP_GUID: &str = "{11111111-1111-1111-1111-111111111111}";
pub const VST2_GUID: &str = "{22222222-2222-2222-2222-222222222222}";
pub const VST3_GUID: &str = "{33333333-3333-3333-3333-333333333333}";
pub const AAX_GUID: &str = "{44444444-4444-4444-4444-444444444444}";

const PROJECT_TYPE_GUID: &str = "{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}";

pub struct Workspace {
    pub temp: TempDir,
    pub root: Utf8PathBuf,
    pub config: WorkspaceConfig,
    pub paths: WorkspacePaths,
}

/// Empty workspace with its resource directories
pub fn workspace() -> Workspace {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
    let config = WorkspaceConfig::default();
    let paths = WorkspacePaths::resolve(root.join("composer.json"), &config, OperatingSystem::Windows);

    for dir in [&paths.sources_dir, &paths.fonts_dir, &paths.images_dir] {
        fs::create_dir_all(dir).unwrap();
    }

    Workspace {
        temp,
        root,
        config,
        paths,
    }
}

/// Workspace whose IDE project has just been generated
pub fn generated_workspace() -> Workspace {
    let workspace = workspace();
    write_visual_studio_template(&workspace.paths);
    workspace
}

pub fn read(path: impl AsRef<Utf8Path>) -> String {
    fs::read_to_string(path.as_ref()).unwrap()
}

pub fn solution(paths: &WorkspacePaths) -> Utf8PathBuf {
    paths.ide_project_dir.join(format!("{}.sln", paths.project_name))
}

pub fn vcxproj(paths: &WorkspacePaths, suffix: &str) -> Utf8PathBuf {
    paths
        .ide_projects_dir()
        .join(format!("{}-{}.vcxproj", paths.project_name, suffix))
}

pub fn config_header(paths: &WorkspacePaths) -> Utf8PathBuf {
    paths.ide_project_dir.join("config.h")
}

pub fn resource_script(paths: &WorkspacePaths) -> Utf8PathBuf {
    paths.ide_resources_dir().join("main.rc")
}

pub fn write_visual_studio_template(paths: &WorkspacePaths) {
    let name = &paths.project_name;
    let projects_dir = paths.ide_projects_dir();
    fs::create_dir_all(&projects_dir).unwrap();
    fs::create_dir_all(paths.ide_resources_dir().join("fonts")).unwrap();

    let projects = [
        ("app", APP_GUID),
        ("vst2", VST2_GUID),
        ("vst3", VST3_GUID),
        ("aax", AAX_GUID),
    ];

    let mut sln = String::from("Microsoft Visual Studio Solution File, Format Version 12.00\n");
    for (suffix, guid) in projects {
        sln.push_str(&format!(
            "Project(\"{}\") = \"{}-{}\", \"projects\\{}-{}.vcxproj\", \"{}\"\nEndProject\n",
            PROJECT_TYPE_GUID, name, suffix, name, suffix, guid
        ));
    }
    sln.push_str("Global\n");
    sln.push_str("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n");
    sln.push_str("\t\tDebug|x64 = Debug|x64\n");
    sln.push_str("\tEndGlobalSection\n");
    sln.push_str("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
    for (_, guid) in projects {
        sln.push_str(&format!("\t\t{}.Debug|x64.ActiveCfg = Debug|x64\n", guid));
        sln.push_str(&format!("\t\t{}.Debug|x64.Build.0 = Debug|x64\n", guid));
    }
    sln.push_str("\tEndGlobalSection\n");
    sln.push_str("EndGlobal\n");
    fs::write(solution(paths), sln).unwrap();

    for (suffix, _) in projects {
        let project = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <Project DefaultTargets=\"Build\" ToolsVersion=\"15.0\">\n\
             \x20 <ItemGroup>\n\
             \x20   <ClCompile Include=\"..\\{name}.cpp\" />\n\
             \x20 </ItemGroup>\n\
             \x20 <ItemGroup>\n\
             \x20   <ClInclude Include=\"..\\config.h\" />\n\
             \x20   <ClInclude Include=\"..\\{name}.h\" />\n\
             \x20 </ItemGroup>\n\
             </Project>\n"
        );
        fs::write(vcxproj(paths, suffix), project).unwrap();

        let filters = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <Project ToolsVersion=\"4.0\">\n\
             \x20 <ItemGroup>\n\
             \x20   <Filter Include=\"resources\">\n\
             \x20   </Filter>\n\
             \x20 </ItemGroup>\n\
             </Project>\n";
        fs::write(
            projects_dir.join(format!("{}-{}.vcxproj.filters", name, suffix)),
            filters,
        )
        .unwrap();
    }

    let defines = [
        ("PLUG_NAME", format!("\"{}\"", name)),
        ("PLUG_MFR", "\"AcmeInc\"".to_string()),
        ("PLUG_VERSION_HEX", "0x00010000".to_string()),
        ("PLUG_VERSION_STR", "\"1.0.0\"".to_string()),
        ("PLUG_UNIQUE_ID", "'Ipef'".to_string()),
        ("PLUG_MFR_ID", "'Acme'".to_string()),
        ("PLUG_URL_STR", "\"https://iplug2.github.io\"".to_string()),
        ("PLUG_EMAIL_STR", "\"spam@me.com\"".to_string()),
        ("PLUG_COPYRIGHT_STR", "\"Copyright 2020 Acme Inc\"".to_string()),
        ("BUNDLE_NAME", format!("\"{}\"", name)),
        ("BUNDLE_MFR", "\"AcmeInc\"".to_string()),
        ("BUNDLE_DOMAIN", "\"com\"".to_string()),
        ("PLUG_CHANNEL_IO", "\"1-1 2-2\"".to_string()),
        ("PLUG_LATENCY", "0".to_string()),
        ("PLUG_TYPE", "0".to_string()),
        ("PLUG_DOES_MIDI_IN", "0".to_string()),
        ("PLUG_DOES_MIDI_OUT", "0".to_string()),
        ("PLUG_DOES_MPE", "0".to_string()),
        ("PLUG_DOES_STATE_CHUNKS", "0".to_string()),
        ("PLUG_HAS_UI", "1".to_string()),
        ("PLUG_WIDTH", "600".to_string()),
        ("PLUG_HEIGHT", "600".to_string()),
        ("PLUG_FPS", "60".to_string()),
        ("PLUG_HOST_RESIZE", "0".to_string()),
        ("VST3_SUBCATEGORY", "\"Fx\"".to_string()),
        ("APP_NUM_CHANNELS", "2".to_string()),
        ("APP_N_VECTOR_WAIT", "0".to_string()),
        ("APP_MULT", "1".to_string()),
        ("APP_SIGNAL_VECTOR_SIZE", "64".to_string()),
        ("ROBOTO_FN", "\"Roboto-Regular.ttf\"".to_string()),
    ];
    let mut header = String::from("#define PLUG_NAME_SHORT \"Ipef\"\n");
    for (define, value) in defines {
        header.push_str(&format!("#define {} {}\n", define, value));
    }
    fs::write(config_header(paths), header).unwrap();

    fs::write(
        resource_script(paths),
        "#include \"../config.h\"\n\nROBOTO_FN TTF ROBOTO_FN\n",
    )
    .unwrap();
    fs::write(
        paths.ide_resources_dir().join("fonts").join("Roboto-Regular.ttf"),
        [0u8, 1, 0, 0],
    )
    .unwrap();

    fs::write(
        paths.ide_project_dir.join(format!("{}.cpp", name)),
        format!(
            "#include \"{}.h\"\n\nvoid Layout() {{ LoadFont(\"Roboto-Regular\", ROBOTO_FN); }}\n",
            name
        ),
    )
    .unwrap();
    fs::write(
        paths.ide_project_dir.join(format!("{}.h", name)),
        "#pragma once\n",
    )
    .unwrap();
}
