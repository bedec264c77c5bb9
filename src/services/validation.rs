//! Field-level rules for [`WorkspaceConfig`].
//!
//! Validation is pure: the validator inspects a config and reports the fields
//! that fail, each with exactly one human-readable message. Fields without a
//! constraint always pass. Only two rules look at other fields: the Audio Unit
//! bundle fields are checked when an AU format is enabled, and the VST3
//! subcategory when VST3 is enabled.

use crate::models::{PluginType, WorkspaceConfig, WorkspaceConfigKey};
use crate::services::text_patch::parse_version_number;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;

/// Failing fields mapped to their error message. A missing key means the field is valid.
pub type ValidationErrors = IndexMap<WorkspaceConfigKey, String>;

pub struct WorkspaceConfigValidator {
    project_name_pattern: Regex,
    identifier_pattern: Regex,
    bundle_domain_pattern: Regex,
    email_pattern: Regex,
    git_hash_pattern: Regex,
}

impl WorkspaceConfigValidator {
    pub fn new() -> Self {
        Self {
            project_name_pattern: Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$")
                .expect("Invalid project name regex"),
            identifier_pattern: Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid identifier regex"),
            bundle_domain_pattern: Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*$")
                .expect("Invalid bundle domain regex"),
            email_pattern: Regex::new(r"^[^@\s]+@[^@\s]+$").expect("Invalid email regex"),
            git_hash_pattern: Regex::new(r"^[0-9a-fA-F]{40}$").expect("Invalid git hash regex"),
        }
    }

    /// Check the given keys, or every key when `keys` is `None`
    pub fn validate(
        &self,
        config: &WorkspaceConfig,
        keys: Option<&[WorkspaceConfigKey]>,
    ) -> ValidationErrors {
        let keys = keys.unwrap_or(&WorkspaceConfigKey::ALL);
        let mut errors = ValidationErrors::new();

        for key in keys {
            if errors.contains_key(key) {
                continue;
            }
            if let Some(message) = self.check(config, *key) {
                errors.insert(*key, message);
            }
        }

        errors
    }

    /// Validate a single field
    pub fn check(&self, config: &WorkspaceConfig, key: WorkspaceConfigKey) -> Option<String> {
        use WorkspaceConfigKey as K;

        match key {
            K::ProjectName => {
                if config.project_name.is_empty() {
                    Some("Project name is required".to_string())
                } else if !self.project_name_pattern.is_match(&config.project_name) {
                    Some(
                        "Project name must start with a letter and contain only letters, digits and underscores"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            K::PluginVersion => match parse_version_number(&config.plugin_version) {
                Ok(version) if version.major > 0xFFFF || version.minor > 0xFF || version.patch > 0xFF => {
                    Some("Version parts are limited to 65535.255.255".to_string())
                }
                Ok(_) => None,
                Err(_) => Some("Version must have the form major.minor.patch".to_string()),
            },
            K::ManufacturerName => required_without_whitespace(&config.manufacturer_name, "Manufacturer name"),
            K::ManufacturerId => four_char_code(&config.manufacturer_id, "Manufacturer ID"),
            K::VstUniqueId => four_char_code(&config.vst_unique_id, "Plugin unique ID"),
            K::ManufacturerEmail => {
                if config.manufacturer_email.is_empty()
                    || self.email_pattern.is_match(&config.manufacturer_email)
                {
                    None
                } else {
                    Some("E-Mail address is not valid".to_string())
                }
            }
            K::ManufacturerWebsite => {
                if config.manufacturer_website.chars().any(char::is_whitespace) {
                    Some("Website must not contain spaces".to_string())
                } else {
                    None
                }
            }
            K::AudioUnitBundleManufacturer if config.has_audio_unit_format() => self.identifier(
                &config.audio_unit_bundle_manufacturer,
                "Audio Unit bundle manufacturer",
            ),
            K::AudioUnitBundleName if config.has_audio_unit_format() => {
                self.identifier(&config.audio_unit_bundle_name, "Audio Unit bundle name")
            }
            K::AudioUnitBundleDomain if config.has_audio_unit_format() => {
                if config.audio_unit_bundle_domain.is_empty() {
                    Some("Audio Unit bundle domain is required".to_string())
                } else if !self
                    .bundle_domain_pattern
                    .is_match(&config.audio_unit_bundle_domain)
                {
                    Some("Audio Unit bundle domain may only contain lowercase letters, digits, dashes and dots".to_string())
                } else {
                    None
                }
            }
            K::Vst3Subcategory if config.has_format(crate::models::PluginFormat::Vst3) => {
                let is_instrument = config.plugin_type == PluginType::Instrument;
                match (config.vst3_subcategory.is_instrument(), is_instrument) {
                    (true, false) => Some("Instrument subcategories require an instrument plugin".to_string()),
                    (false, true) => Some("Instrument plugins need an instrument subcategory".to_string()),
                    _ => None,
                }
            }
            K::Formats => {
                let unique: HashSet<_> = config.formats.iter().collect();
                if config.formats.is_empty() {
                    Some("At least one format must be enabled".to_string())
                } else if unique.len() != config.formats.len() {
                    Some("Formats must not contain duplicates".to_string())
                } else {
                    None
                }
            }
            K::Fps => in_range(config.fps, 1, 240, "Frame rate"),
            K::UiWidth => in_range(config.ui_width, 1, 8192, "UI width"),
            K::UiHeight => in_range(config.ui_height, 1, 8192, "UI height"),
            K::InputChannels => in_range(config.input_channels, 0, 64, "Input channel count"),
            K::OutputChannels => in_range(config.output_channels, 1, 64, "Output channel count"),
            K::IPlug2GitHash => self.git_hash(&config.iplug2_git_hash, "iPlug2 commit"),
            K::Vst3SdkGitHash => self.git_hash(&config.vst3_sdk_git_hash, "VST3 SDK commit"),
            K::AppOutputMultiplier => in_range(config.app_output_multiplier, 1, 16, "Output multiplier"),
            K::AppSignalVectorSize => {
                let size = config.app_signal_vector_size;
                if (16..=4096).contains(&size) && size.is_power_of_two() {
                    None
                } else {
                    Some("Signal vector size must be a power of two between 16 and 4096".to_string())
                }
            }
            K::AppVectorWaitMultiplier => {
                in_range(config.app_vector_wait_multiplier, 0, 16, "Vector wait multiplier")
            }
            _ => None,
        }
    }

    fn identifier(&self, value: &str, label: &str) -> Option<String> {
        if value.is_empty() {
            Some(format!("{} is required", label))
        } else if !self.identifier_pattern.is_match(value) {
            Some(format!(
                "{} may only contain letters, digits, dashes and underscores",
                label
            ))
        } else {
            None
        }
    }

    fn git_hash(&self, value: &str, label: &str) -> Option<String> {
        if self.git_hash_pattern.is_match(value) {
            None
        } else {
            Some(format!("{} must be a 40 character git hash", label))
        }
    }
}

impl Default for WorkspaceConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn required_without_whitespace(value: &str, label: &str) -> Option<String> {
    if value.is_empty() {
        Some(format!("{} is required", label))
    } else if value.chars().any(char::is_whitespace) {
        Some(format!("{} must not contain spaces", label))
    } else {
        None
    }
}

fn four_char_code(value: &str, label: &str) -> Option<String> {
    if value.chars().count() != 4 {
        Some(format!("{} must be exactly 4 characters", label))
    } else if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(format!("{} may only contain letters and digits", label))
    } else {
        None
    }
}

fn in_range(value: u32, min: u32, max: u32, label: &str) -> Option<String> {
    if (min..=max).contains(&value) {
        None
    } else {
        Some(format!("{} must be between {} and {}", label, min, max))
    }
}
