//! Integration tests for the Visual Studio project patching
//!
//! These tests verify, against a generated template fixture:
//! - First customization (prototype removal, seeding, resource wiring, config)
//! - Idempotence of a repeated customization
//! - Adding and removing sources, fonts and images
//! - Disabling and re-enabling build formats
//! - Fail-fast behavior when anchors are missing

mod common;

use common::{
    AAX_GUID, APP_GUID, VST2_GUID, VST3_GUID, config_header, generated_workspace, read,
    resource_script, solution, vcxproj,
};
use iplug_composer::ComposerError;
use iplug_composer::models::{AppSettings, PluginFormat, WorkspacePaths};
use iplug_composer::services::ide::windows::{CL_COMPILE_MARKER, FONTS_MARKER, IMAGES_MARKER};
use iplug_composer::services::ide::{IdeProject, VisualStudioProject};
use iplug_composer::services::workspace::WorkspaceService;
use std::fs;
use std::sync::Arc;

fn visual_studio() -> VisualStudioProject {
    VisualStudioProject::new(None, "https://github.com".to_string())
}

fn service() -> WorkspaceService {
    WorkspaceService::new(Arc::new(visual_studio()), &AppSettings::default())
}

#[tokio::test]
async fn test_first_customization() {
    let mut workspace = generated_workspace();
    workspace.config.plugin_version = "1.2.3".to_string();
    let paths = &workspace.paths;

    service()
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    // Prototype sources and font become workspace files
    let seeded = read(paths.sources_dir.join("NewProject.cpp"));
    assert!(seeded.contains("LoadFont(\"Roboto-Regular\", TTF_ROBOTO_REGULAR_FN)"));
    assert!(paths.sources_dir.join("NewProject.h").is_file());
    assert!(paths.fonts_dir.join("Roboto-Regular.ttf").is_file());
    assert!(!paths.ide_project_dir.join("NewProject.cpp").exists());
    assert!(!paths.ide_resources_dir().join("fonts/Roboto-Regular.ttf").exists());

    let project = read(vcxproj(paths, "app"));
    assert!(project.contains("<ClCompile Include=\"..\\..\\..\\sources\\NewProject.cpp\" />"));
    assert!(project.contains("<ClInclude Include=\"..\\..\\..\\sources\\NewProject.h\" />"));
    assert!(!project.contains("Include=\"..\\NewProject.cpp\""));
    assert!(project.contains(CL_COMPILE_MARKER));

    let header = read(config_header(paths));
    assert!(header.contains("#define TTF_ROBOTO_REGULAR_FN \"Roboto-Regular.ttf\""));
    assert!(!header.contains("#define ROBOTO_FN"));
    assert!(header.contains("#define PLUG_VERSION_HEX 0x00010203"));
    assert!(header.contains("#define PLUG_VERSION_STR \"1.2.3\""));
    assert!(header.contains("#define PLUG_MFR \"MyPlugInCompany\""));
    assert!(header.contains("#define PLUG_CHANNEL_IO \"2-2\""));
    assert!(header.contains("#define PLUG_HOST_RESIZE 1"));
    assert!(header.contains("#define PLUG_NAME_SHORT \"Ipef\""));
    assert!(header.contains(FONTS_MARKER));
    assert!(header.contains(IMAGES_MARKER));

    let script = read(resource_script(paths));
    assert!(script.contains(
        r#"TTF_ROBOTO_REGULAR_FN TTF "..\\..\\..\\resources\\fonts\\Roboto-Regular.ttf""#
    ));
    assert!(!script.contains("ROBOTO_FN TTF ROBOTO_FN"));

    let filters = read(paths.ide_projects_dir().join("NewProject-app.vcxproj.filters"));
    assert!(filters.contains("<Filter Include=\"Composer Sources\">"));
    assert!(filters.contains("<ClCompile Include=\"..\\..\\..\\sources\\NewProject.cpp\">"));

    // Default formats are AU2, VST3 and APP: VST2 and AAX go away
    let sln = read(solution(paths));
    assert!(sln.contains("\"NewProject-app\""));
    assert!(sln.contains("\"NewProject-vst3\""));
    assert!(!sln.contains("\"NewProject-vst2\""));
    assert!(!sln.contains(VST2_GUID));
    assert!(!sln.contains(AAX_GUID));
    assert!(!vcxproj(paths, "vst2").exists());
    assert!(paths.ide_project_dir.join(".composer/NewProject-vst2.vcxproj").is_file());
}

#[tokio::test]
async fn test_repeated_customization_is_stable() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    let service = service();

    service
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();
    let snapshot = |paths: &WorkspacePaths| {
        [
            read(vcxproj(paths, "app")),
            read(config_header(paths)),
            read(resource_script(paths)),
            read(solution(paths)),
            read(paths.ide_projects_dir().join("NewProject-app.vcxproj.filters")),
        ]
    };
    let first = snapshot(paths);

    service
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    assert_eq!(snapshot(paths), first);
}

#[tokio::test]
async fn test_add_and_remove_resources() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    let service = service();
    service
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    fs::write(paths.sources_dir.join("Dsp.cpp"), "").unwrap();
    fs::write(paths.images_dir.join("knob.png"), [137u8, 80, 78, 71]).unwrap();
    let summary = service.sync_resources(paths).await.unwrap();
    assert_eq!(summary.added, 2);

    let header = read(config_header(paths));
    let knob = "#define PNG_KNOB_FN \"knob.png\"";
    assert!(header.contains(knob));
    // Images sit between the fonts and images anchors
    assert!(header.find(FONTS_MARKER).unwrap() < header.find(knob).unwrap());
    assert!(header.find(knob).unwrap() < header.find(IMAGES_MARKER).unwrap());
    assert!(read(vcxproj(paths, "vst3")).contains("sources\\Dsp.cpp\" />"));

    // Already referenced files are left alone
    assert_eq!(service.sync_resources(paths).await.unwrap().added, 0);

    let ide = visual_studio();
    ide.remove_image_file(paths, "knob.png", "PNG_KNOB_FN").unwrap();
    ide.remove_source_file(paths, "Dsp.cpp").unwrap();

    assert!(!read(config_header(paths)).contains("PNG_KNOB_FN"));
    assert!(!read(resource_script(paths)).contains("PNG_KNOB_FN"));
    assert!(!read(vcxproj(paths, "app")).contains("Dsp.cpp"));

    // Removing again means the anchor is gone
    let result = ide.remove_source_file(paths, "Dsp.cpp");
    assert!(matches!(result, Err(ComposerError::Assertion(_))));
}

#[tokio::test]
async fn test_source_names_are_escaped_in_project_xml() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    let service = service();
    service
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    fs::write(paths.sources_dir.join("R&D.cpp"), "").unwrap();
    assert_eq!(service.sync_resources(paths).await.unwrap().added, 1);

    let project = read(vcxproj(paths, "app"));
    assert!(project.contains("sources\\R&amp;D.cpp\" />"));
    assert!(!project.contains("R&D.cpp"));

    visual_studio().remove_source_file(paths, "R&D.cpp").unwrap();
    assert!(!read(vcxproj(paths, "app")).contains("R&amp;D.cpp"));
}

#[tokio::test]
async fn test_colliding_resource_alias_is_conflict() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    let service = service();
    service
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    fs::write(paths.images_dir.join("my-knob.png"), [0u8]).unwrap();
    fs::write(paths.images_dir.join("my_knob.png"), [1u8]).unwrap();

    let result = service.sync_resources(paths).await;
    assert!(matches!(result, Err(ComposerError::Conflict(name)) if name == "my_knob.png"));

    let header = read(config_header(paths));
    assert_eq!(header.matches("#define PNG_MY_KNOB_FN ").count(), 1);
    assert!(header.contains("#define PNG_MY_KNOB_FN \"my-knob.png\""));
    assert_eq!(read(resource_script(paths)).matches("PNG_MY_KNOB_FN PNG").count(), 1);
}

#[test]
fn test_project_section_lines_return_to_their_project() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    let kind = "{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}";
    let project = |suffix: &str, guid: &str| {
        format!(
            "Project(\"{}\") = \"NewProject-{}\", \"projects\\NewProject-{}.vcxproj\", \"{}\"\n",
            kind, suffix, suffix, guid
        )
    };

    // AAX declares a dependency section of the same name ahead of the app
    let mut sln = String::from("Microsoft Visual Studio Solution File, Format Version 12.00\n");
    sln.push_str(&project("aax", AAX_GUID));
    sln.push_str("\tProjectSection(ProjectDependencies) = postProject\n");
    sln.push_str(&format!("\t\t{} = {}\n", APP_GUID, APP_GUID));
    sln.push_str("\tEndProjectSection\nEndProject\n");
    sln.push_str(&project("app", APP_GUID));
    sln.push_str("\tProjectSection(ProjectDependencies) = postProject\n");
    sln.push_str(&format!("\t\t{} = {}\n", VST3_GUID, VST3_GUID));
    sln.push_str("\tEndProjectSection\nEndProject\n");
    sln.push_str(&project("vst3", VST3_GUID));
    sln.push_str("EndProject\nGlobal\n");
    sln.push_str("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution\n");
    for guid in [AAX_GUID, APP_GUID, VST3_GUID] {
        sln.push_str(&format!("\t\t{}.Debug|x64.ActiveCfg = Debug|x64\n", guid));
    }
    sln.push_str("\tEndGlobalSection\nEndGlobal\n");
    fs::write(solution(paths), &sln).unwrap();

    let ide = visual_studio();
    ide.remove_format(paths, PluginFormat::Vst3).unwrap();
    assert!(!read(solution(paths)).contains(VST3_GUID));

    ide.add_format(paths, PluginFormat::Vst3).unwrap();
    assert_eq!(read(solution(paths)), sln);
}

#[tokio::test]
async fn test_disable_and_enable_format() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    service()
        .customize_ide_project(&workspace.config, paths)
        .await
        .unwrap();

    let ide = visual_studio();
    let before = read(solution(paths));

    ide.remove_format(paths, PluginFormat::Vst3).unwrap();
    assert!(!read(solution(paths)).contains("NewProject-vst3"));
    assert!(!vcxproj(paths, "vst3").exists());

    // Disabling twice is a no-op
    ide.remove_format(paths, PluginFormat::Vst3).unwrap();

    ide.add_format(paths, PluginFormat::Vst3).unwrap();
    let after = read(solution(paths));
    assert!(after.contains("\"NewProject-vst3\""));
    assert!(vcxproj(paths, "vst3").is_file());
    assert_eq!(
        after.matches("{33333333-3333-3333-3333-333333333333}").count(),
        before.matches("{33333333-3333-3333-3333-333333333333}").count()
    );

    // Enabling an enabled format is a no-op
    ide.add_format(paths, PluginFormat::Vst3).unwrap();
    assert_eq!(read(solution(paths)), after);
}

#[test]
fn test_audio_unit_formats_ignored_on_windows() {
    let workspace = generated_workspace();
    let ide = visual_studio();
    let before = read(solution(&workspace.paths));

    ide.remove_format(&workspace.paths, PluginFormat::Au2).unwrap();
    ide.add_format(&workspace.paths, PluginFormat::Au3).unwrap();

    assert_eq!(read(solution(&workspace.paths)), before);
}

#[test]
fn test_enable_never_disabled_format_fails() {
    let workspace = generated_workspace();
    let ide = visual_studio();
    let paths = &workspace.paths;

    ide.remove_format(paths, PluginFormat::Vst2).unwrap();
    fs::remove_dir_all(paths.ide_project_dir.join(".composer")).unwrap();

    let result = ide.add_format(paths, PluginFormat::Vst2);
    assert!(matches!(result, Err(ComposerError::Assertion(_))));
}

#[test]
fn test_template_drift_is_assertion() {
    let workspace = generated_workspace();
    let paths = &workspace.paths;
    fs::write(config_header(paths), "#define PLUG_NAME \"x\"\n").unwrap();

    let result = visual_studio().apply_config(paths, &workspace.config);
    match result {
        Err(ComposerError::Assertion(message)) => assert!(message.contains("#define PLUG_MFR")),
        other => panic!("expected assertion error, got {:?}", other),
    }
}

#[test]
fn test_start_ide_requires_solution() {
    let workspace = common::workspace();
    let result = visual_studio().start_ide_project(&workspace.paths);
    assert!(matches!(result, Err(ComposerError::Process(_))));
}
