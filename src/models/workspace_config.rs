use crate::services::text_patch::{Version, parse_version_number};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build targets an iPlug2 project can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginFormat {
    #[serde(rename = "APP")]
    App,
    #[serde(rename = "VST2")]
    Vst2,
    #[serde(rename = "VST3")]
    Vst3,
    #[serde(rename = "AU2")]
    Au2,
    #[serde(rename = "AU3")]
    Au3,
    #[serde(rename = "AAX")]
    Aax,
}

impl PluginFormat {
    pub const ALL: [PluginFormat; 6] = [
        PluginFormat::App,
        PluginFormat::Vst2,
        PluginFormat::Vst3,
        PluginFormat::Au2,
        PluginFormat::Au3,
        PluginFormat::Aax,
    ];

    /// Name used in composer.json and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginFormat::App => "APP",
            PluginFormat::Vst2 => "VST2",
            PluginFormat::Vst3 => "VST3",
            PluginFormat::Au2 => "AU2",
            PluginFormat::Au3 => "AU3",
            PluginFormat::Aax => "AAX",
        }
    }

    pub fn is_audio_unit(&self) -> bool {
        matches!(self, PluginFormat::Au2 | PluginFormat::Au3)
    }

    /// Parse a format name, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for PluginFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of plugin, selects the iPlug2 example used as generation template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginType {
    Effect,
    Instrument,
    MidiEffect,
}

impl PluginType {
    /// Value of `PLUG_TYPE` in config.h
    pub fn plug_type(&self) -> u8 {
        match self {
            PluginType::Effect => 0,
            PluginType::Instrument => 1,
            PluginType::MidiEffect => 2,
        }
    }

    /// iPlug2 example project duplicated for this plugin type
    pub fn template_project(&self) -> &'static str {
        match self {
            PluginType::Effect => "IPlugEffect",
            PluginType::Instrument => "IPlugInstrument",
            PluginType::MidiEffect => "IPlugMidiEffect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vst3Subcategory {
    Other,
    Analyzer,
    Delay,
    Distortion,
    Dynamics,
    Eq,
    Filter,
    Generator,
    Mastering,
    Modulation,
    PitchShift,
    Restoration,
    Reverb,
    Spatial,
    Surround,
    Tools,
    Instrument,
    Drum,
    Sampler,
    Synth,
}

impl Vst3Subcategory {
    /// Category string as understood by the VST3 SDK
    pub fn as_vst3_str(&self) -> &'static str {
        match self {
            Vst3Subcategory::Other => "Fx",
            Vst3Subcategory::Analyzer => "Fx|Analyzer",
            Vst3Subcategory::Delay => "Fx|Delay",
            Vst3Subcategory::Distortion => "Fx|Distortion",
            Vst3Subcategory::Dynamics => "Fx|Dynamics",
            Vst3Subcategory::Eq => "Fx|EQ",
            Vst3Subcategory::Filter => "Fx|Filter",
            Vst3Subcategory::Generator => "Fx|Generator",
            Vst3Subcategory::Mastering => "Fx|Mastering",
            Vst3Subcategory::Modulation => "Fx|Modulation",
            Vst3Subcategory::PitchShift => "Fx|Pitch Shift",
            Vst3Subcategory::Restoration => "Fx|Restoration",
            Vst3Subcategory::Reverb => "Fx|Reverb",
            Vst3Subcategory::Spatial => "Fx|Spatial",
            Vst3Subcategory::Surround => "Fx|Surround",
            Vst3Subcategory::Tools => "Fx|Tools",
            Vst3Subcategory::Instrument => "Instrument",
            Vst3Subcategory::Drum => "Instrument|Drum",
            Vst3Subcategory::Sampler => "Instrument|Sampler",
            Vst3Subcategory::Synth => "Instrument|Synth",
        }
    }

    pub fn is_instrument(&self) -> bool {
        matches!(
            self,
            Vst3Subcategory::Instrument
                | Vst3Subcategory::Drum
                | Vst3Subcategory::Sampler
                | Vst3Subcategory::Synth
        )
    }
}

/// Plugin metadata persisted in composer.json
///
/// Field order is the key order of the written file. Missing keys fall back to
/// the values of [`WorkspaceConfig::default`], unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    pub project_name: String,
    pub ui_enabled: bool,
    pub fps: u32,
    pub ui_height: u32,
    pub ui_width: u32,
    pub plugin_version: String,
    pub formats: Vec<PluginFormat>,
    pub mpe: bool,
    pub midi_out: bool,
    pub midi_in: bool,
    pub state_chunks: bool,
    pub output_channels: u32,
    pub input_channels: u32,
    pub plugin_latency: u32,
    pub manufacturer_website: String,
    pub manufacturer_copyright_notice: String,
    pub manufacturer_email: String,
    pub manufacturer_name: String,
    pub manufacturer_id: String,
    pub audio_unit_bundle_manufacturer: String,
    pub audio_unit_bundle_domain: String,
    pub audio_unit_bundle_name: String,
    pub plugin_type: PluginType,
    pub vst3_subcategory: Vst3Subcategory,
    pub vst_unique_id: String,
    pub ui_resizable: bool,
    #[serde(rename = "iPlug2GitHash")]
    pub iplug2_git_hash: String,
    pub vst3_sdk_git_hash: String,
    pub app_output_multiplier: u32,
    pub app_signal_vector_size: u32,
    pub app_vector_wait_multiplier: u32,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            project_name: "NewProject".to_string(),
            ui_enabled: true,
            fps: 60,
            ui_height: 600,
            ui_width: 600,
            plugin_version: "0.0.0".to_string(),
            formats: vec![PluginFormat::Au2, PluginFormat::Vst3, PluginFormat::App],
            mpe: false,
            midi_out: false,
            midi_in: false,
            state_chunks: false,
            output_channels: 2,
            input_channels: 2,
            plugin_latency: 0,
            manufacturer_website: "www.my-plugin-company.com".to_string(),
            manufacturer_copyright_notice: "© www.my-plugin-company.com".to_string(),
            manufacturer_email: "mail@my-plugin-company.com".to_string(),
            manufacturer_name: "MyPlugInCompany".to_string(),
            manufacturer_id: "MPUC".to_string(),
            audio_unit_bundle_manufacturer: "MyPlugInCompany".to_string(),
            audio_unit_bundle_domain: "com".to_string(),
            audio_unit_bundle_name: "NewProject".to_string(),
            plugin_type: PluginType::Effect,
            vst3_subcategory: Vst3Subcategory::Other,
            vst_unique_id: "nprj".to_string(),
            ui_resizable: true,
            iplug2_git_hash: "33700e4a498c8e9440b7281008d32d4b2a24a12f".to_string(),
            vst3_sdk_git_hash: "0908f475f52af56682321192d800ef25d1823dd2".to_string(),
            app_output_multiplier: 1,
            app_signal_vector_size: 64,
            app_vector_wait_multiplier: 0,
        }
    }
}

impl WorkspaceConfig {
    pub fn has_format(&self, format: PluginFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn has_audio_unit_format(&self) -> bool {
        self.formats.iter().any(PluginFormat::is_audio_unit)
    }

    /// C++ class name of the plugin, which is also its project directory name
    pub fn class_name(&self) -> &str {
        &self.project_name
    }

    pub fn version(&self) -> crate::Result<Version> {
        parse_version_number(&self.plugin_version)
    }

    /// Enable or disable a format, keeping the list free of duplicates
    pub fn set_format_enabled(&mut self, format: PluginFormat, enabled: bool) {
        if enabled {
            if !self.has_format(format) {
                self.formats.push(format);
            }
        } else {
            self.formats.retain(|f| *f != format);
        }
    }
}

/// Identifies a single field of [`WorkspaceConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkspaceConfigKey {
    ProjectName,
    UiEnabled,
    Fps,
    UiHeight,
    UiWidth,
    PluginVersion,
    Formats,
    Mpe,
    MidiOut,
    MidiIn,
    StateChunks,
    OutputChannels,
    InputChannels,
    PluginLatency,
    ManufacturerWebsite,
    ManufacturerCopyrightNotice,
    ManufacturerEmail,
    ManufacturerName,
    ManufacturerId,
    AudioUnitBundleManufacturer,
    AudioUnitBundleDomain,
    AudioUnitBundleName,
    PluginType,
    Vst3Subcategory,
    VstUniqueId,
    UiResizable,
    #[serde(rename = "iPlug2GitHash")]
    IPlug2GitHash,
    Vst3SdkGitHash,
    AppOutputMultiplier,
    AppSignalVectorSize,
    AppVectorWaitMultiplier,
}

impl WorkspaceConfigKey {
    pub const ALL: [WorkspaceConfigKey; 31] = [
        WorkspaceConfigKey::ProjectName,
        WorkspaceConfigKey::UiEnabled,
        WorkspaceConfigKey::Fps,
        WorkspaceConfigKey::UiHeight,
        WorkspaceConfigKey::UiWidth,
        WorkspaceConfigKey::PluginVersion,
        WorkspaceConfigKey::Formats,
        WorkspaceConfigKey::Mpe,
        WorkspaceConfigKey::MidiOut,
        WorkspaceConfigKey::MidiIn,
        WorkspaceConfigKey::StateChunks,
        WorkspaceConfigKey::OutputChannels,
        WorkspaceConfigKey::InputChannels,
        WorkspaceConfigKey::PluginLatency,
        WorkspaceConfigKey::ManufacturerWebsite,
        WorkspaceConfigKey::ManufacturerCopyrightNotice,
        WorkspaceConfigKey::ManufacturerEmail,
        WorkspaceConfigKey::ManufacturerName,
        WorkspaceConfigKey::ManufacturerId,
        WorkspaceConfigKey::AudioUnitBundleManufacturer,
        WorkspaceConfigKey::AudioUnitBundleDomain,
        WorkspaceConfigKey::AudioUnitBundleName,
        WorkspaceConfigKey::PluginType,
        WorkspaceConfigKey::Vst3Subcategory,
        WorkspaceConfigKey::VstUniqueId,
        WorkspaceConfigKey::UiResizable,
        WorkspaceConfigKey::IPlug2GitHash,
        WorkspaceConfigKey::Vst3SdkGitHash,
        WorkspaceConfigKey::AppOutputMultiplier,
        WorkspaceConfigKey::AppSignalVectorSize,
        WorkspaceConfigKey::AppVectorWaitMultiplier,
    ];

    /// JSON key of the field in composer.json
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceConfigKey::ProjectName => "projectName",
            WorkspaceConfigKey::UiEnabled => "uiEnabled",
            WorkspaceConfigKey::Fps => "fps",
            WorkspaceConfigKey::UiHeight => "uiHeight",
            WorkspaceConfigKey::UiWidth => "uiWidth",
            WorkspaceConfigKey::PluginVersion => "pluginVersion",
            WorkspaceConfigKey::Formats => "formats",
            WorkspaceConfigKey::Mpe => "mpe",
            WorkspaceConfigKey::MidiOut => "midiOut",
            WorkspaceConfigKey::MidiIn => "midiIn",
            WorkspaceConfigKey::StateChunks => "stateChunks",
            WorkspaceConfigKey::OutputChannels => "outputChannels",
            WorkspaceConfigKey::InputChannels => "inputChannels",
            WorkspaceConfigKey::PluginLatency => "pluginLatency",
            WorkspaceConfigKey::ManufacturerWebsite => "manufacturerWebsite",
            WorkspaceConfigKey::ManufacturerCopyrightNotice => "manufacturerCopyrightNotice",
            WorkspaceConfigKey::ManufacturerEmail => "manufacturerEmail",
            WorkspaceConfigKey::ManufacturerName => "manufacturerName",
            WorkspaceConfigKey::ManufacturerId => "manufacturerId",
            WorkspaceConfigKey::AudioUnitBundleManufacturer => "audioUnitBundleManufacturer",
            WorkspaceConfigKey::AudioUnitBundleDomain => "audioUnitBundleDomain",
            WorkspaceConfigKey::AudioUnitBundleName => "audioUnitBundleName",
            WorkspaceConfigKey::PluginType => "pluginType",
            WorkspaceConfigKey::Vst3Subcategory => "vst3Subcategory",
            WorkspaceConfigKey::VstUniqueId => "vstUniqueId",
            WorkspaceConfigKey::UiResizable => "uiResizable",
            WorkspaceConfigKey::IPlug2GitHash => "iPlug2GitHash",
            WorkspaceConfigKey::Vst3SdkGitHash => "vst3SdkGitHash",
            WorkspaceConfigKey::AppOutputMultiplier => "appOutputMultiplier",
            WorkspaceConfigKey::AppSignalVectorSize => "appSignalVectorSize",
            WorkspaceConfigKey::AppVectorWaitMultiplier => "appVectorWaitMultiplier",
        }
    }

    /// Look up a key by its JSON name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

impl fmt::Display for WorkspaceConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
