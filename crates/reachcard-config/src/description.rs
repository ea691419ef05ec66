//! Card description file format and operations.

use std::path::Path;

use reachcard_core::{DaiRef, EndpointRecord};
use reachcard_runtime::{CardMetadata, Route, VolumeLimit, VolumePolicy, Widget, WidgetKind};
use serde::{Deserialize, Serialize};

use crate::driver::driver_name;
use crate::error::ConfigError;
use crate::providers::{DaiProvider, ProviderTable};
use crate::validation::validate_description;

/// A card description.
///
/// Describes the board's sound card the way the device tree does: card
/// level properties, the nodes that provide DAIs, and one child per DAI
/// link.
///
/// # TOML Format
///
/// ```toml
/// model = "qcs6490-rb3gen2-snd-card"
/// compatible = "qcom,qcs6490-rb3gen2-sndcard"
/// widgets = [["Headphone", "Headphone Jack"]]
/// audio-routing = [["IN1_HPHL", "HPHL_OUT"]]
///
/// [[dai-providers]]
/// node = "q6apmbedai"
/// dais = [{ name = "RX_CODEC_DMA_RX_0", id = 113 }]
///
/// [[links]]
/// link-name = "WCD Playback"
/// cpu = { node = "q6apmbedai", args = [113] }
/// codec = [{ node = "wcd938x", args = [0] }]
/// platform = { node = "q6apm" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CardDescription {
    /// Card name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Deprecated spelling of `model`, used only when `model` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qcom_model: Option<String>,

    /// Board compatible string; selects the driver name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible: Option<String>,

    /// `(template, name)` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<(String, String)>,

    /// `(sink, source)` routing pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_routing: Vec<(String, String)>,

    /// Deprecated routing property, appended after `audio-routing`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qcom_audio_routing: Vec<(String, String)>,

    /// Widgets exposed as pin switches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pin_switches: Vec<String>,

    /// Auxiliary device nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux_devs: Vec<String>,

    /// Overrides the built-in speaker volume limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_limits: Option<Vec<VolumeLimitDescription>>,

    /// Nodes providing DAIs.
    #[serde(default)]
    pub dai_providers: Vec<DaiProvider>,

    /// DAI links, in card order.
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

/// One DAI link child.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct LinkDescription {
    /// Child node name; generated from the position when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Declared link name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_name: Option<String>,

    /// `okay` (default) or `disabled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Transport side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<DaiRefDescription>,

    /// Codec DAIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<Vec<DaiRefDescription>>,

    /// Explicit platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformDescription>,
}

impl LinkDescription {
    /// Whether the link takes part in the card.
    pub fn is_available(&self) -> bool {
        !matches!(self.status.as_deref(), Some("disabled"))
    }
}

/// A DAI reference: provider node plus argument cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaiRefDescription {
    /// Provider node.
    pub node: String,
    /// Argument cells.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<u32>,
}

impl From<&DaiRefDescription> for DaiRef {
    fn from(value: &DaiRefDescription) -> Self {
        DaiRef::new(value.node.clone(), value.args.iter().copied())
    }
}

/// Explicit platform binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformDescription {
    /// Platform node.
    pub node: String,
}

/// One speaker volume limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeLimitDescription {
    /// Mixer control name.
    pub control: String,
    /// Highest raw value.
    pub max: u32,
}

impl CardDescription {
    /// Load a description from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let description = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            links = description.links.len(),
            providers = description.dai_providers.len(),
            "card description loaded"
        );
        Ok(description)
    }

    /// Load a description from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the description to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the description to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the whole description, reporting every problem found.
    ///
    /// See [`validate_description`] for what is checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_description(self)?;
        Ok(())
    }

    /// Card name: `model`, falling back to `qcom-model`.
    pub fn card_name(&self) -> Option<&str> {
        self.model.as_deref().or(self.qcom_model.as_deref())
    }

    /// Driver name for the board's compatible string.
    pub fn driver_name(&self) -> Result<&'static str, ConfigError> {
        let compatible = self
            .compatible
            .as_deref()
            .ok_or(ConfigError::MissingCompatible)?;
        driver_name(compatible).ok_or_else(|| ConfigError::UnknownCompatible(compatible.to_string()))
    }

    /// Available links, in card order.
    pub fn available_links(&self) -> impl Iterator<Item = &LinkDescription> {
        self.links.iter().filter(|link| link.is_available())
    }

    /// Endpoint records of the available links, in card order.
    pub fn endpoint_records(&self) -> Vec<EndpointRecord> {
        self.available_links()
            .enumerate()
            .map(|(position, link)| EndpointRecord {
                node: link
                    .node
                    .clone()
                    .unwrap_or_else(|| format!("link{position}")),
                name: link.link_name.clone().unwrap_or_default(),
                cpu: link.cpu.as_ref().map(DaiRef::from),
                codecs: link
                    .codec
                    .as_ref()
                    .map(|codecs| codecs.iter().map(DaiRef::from).collect()),
                platform: link.platform.as_ref().map(|p| p.node.clone()),
            })
            .collect()
    }

    /// Card-level data for registration.
    pub fn card_metadata(&self) -> Result<CardMetadata, ConfigError> {
        let widgets = self
            .widgets
            .iter()
            .map(|(template, name)| {
                WidgetKind::from_template(template)
                    .map(|kind| Widget::new(kind, name.clone()))
                    .ok_or_else(|| ConfigError::UnknownWidget {
                        template: template.clone(),
                        name: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let routes = self
            .audio_routing
            .iter()
            .chain(&self.qcom_audio_routing)
            .map(|(sink, source)| Route::new(sink.clone(), source.clone()))
            .collect();

        Ok(CardMetadata {
            name: self.card_name().unwrap_or_default().to_string(),
            driver_name: self.driver_name()?.to_string(),
            widgets,
            routes,
            pin_switches: self.pin_switches.clone(),
            aux_devs: self.aux_devs.clone(),
        })
    }

    /// DAI providers as a lookup table.
    pub fn provider_table(&self) -> ProviderTable {
        self.dai_providers.iter().cloned().collect()
    }

    /// Speaker volume policy: the declared limits, or the built-in ones.
    pub fn volume_policy(&self) -> VolumePolicy {
        match &self.volume_limits {
            Some(limits) => VolumePolicy::new(
                limits
                    .iter()
                    .map(|l| VolumeLimit::new(l.control.clone(), l.max))
                    .collect(),
            ),
            None => VolumePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use reachcard_core::DaiLookup;

    const CARD: &str = r#"
model = "qcs6490-rb3gen2-snd-card"
compatible = "qcom,qcs6490-rb3gen2-sndcard"
widgets = [["Headphone", "Headphone Jack"], ["Microphone", "Mic Jack"]]
audio-routing = [["IN1_HPHL", "HPHL_OUT"]]
qcom-audio-routing = [["AMIC2", "MIC BIAS2"]]
pin-switches = ["Headphone Jack"]

[[dai-providers]]
node = "q6apmbedai"
dais = [{ name = "RX_CODEC_DMA_RX_0", id = 113 }]

[[dai-providers]]
node = "wcd938x"
dais = [{ name = "wcd938x-rx" }]

[[links]]
link-name = "MultiMedia1"
cpu = { node = "q6apmdai", args = [0] }

[[links]]
node = "wcd-playback-dai-link"
link-name = "WCD Playback"
cpu = { node = "q6apmbedai", args = [113] }
codec = [{ node = "wcd938x", args = [0] }]
platform = { node = "q6apm" }

[[links]]
link-name = "Unused"
status = "disabled"
cpu = { node = "q6apmbedai", args = [200] }
"#;

    #[test]
    fn validate_wraps_every_problem() {
        let mut d = CardDescription::from_toml(CARD).unwrap();
        d.compatible = None;
        d.links[1].cpu = None;

        let err = d.validate().unwrap_err();
        assert!(err.to_string().starts_with("validation failed"), "got: {err}");
        let ConfigError::Validation(ValidationError::Multiple(errors)) = &err else {
            panic!("expected collected validation errors, got {err:?}");
        };
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingCompatible)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingCpu { link } if link == "WCD Playback")));
    }

    #[test]
    fn parses_card_level_properties() {
        let d = CardDescription::from_toml(CARD).unwrap();
        assert_eq!(d.card_name(), Some("qcs6490-rb3gen2-snd-card"));
        assert_eq!(d.driver_name().unwrap(), "qcs6490");
        assert_eq!(d.widgets.len(), 2);
        assert_eq!(d.links.len(), 3);
    }

    #[test]
    fn deprecated_model_fallback() {
        let d = CardDescription {
            qcom_model: Some("old-card".to_string()),
            ..CardDescription::default()
        };
        assert_eq!(d.card_name(), Some("old-card"));

        let d = CardDescription {
            model: Some("new-card".to_string()),
            qcom_model: Some("old-card".to_string()),
            ..CardDescription::default()
        };
        assert_eq!(d.card_name(), Some("new-card"));
    }

    #[test]
    fn disabled_links_skipped() {
        let d = CardDescription::from_toml(CARD).unwrap();
        let records = d.endpoint_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].node, "link0");
        assert!(records[0].codecs.is_none());
        assert_eq!(records[1].node, "wcd-playback-dai-link");
        assert_eq!(records[1].platform.as_deref(), Some("q6apm"));
        assert_eq!(records[1].cpu.as_ref().and_then(DaiRef::first_cell), Some(113));
    }

    #[test]
    fn routes_merged_in_order() {
        let meta = CardDescription::from_toml(CARD).unwrap().card_metadata().unwrap();
        assert_eq!(
            meta.routes,
            vec![
                Route::new("IN1_HPHL", "HPHL_OUT"),
                Route::new("AMIC2", "MIC BIAS2")
            ]
        );
        assert_eq!(meta.driver_name, "qcs6490");
        assert_eq!(meta.pin_switches, vec!["Headphone Jack"]);
    }

    #[test]
    fn unknown_widget_template() {
        let d = CardDescription {
            compatible: Some("qcom,qcs8300-sndcard".to_string()),
            widgets: vec![("Mic".to_string(), "Mic Jack".to_string())],
            ..CardDescription::default()
        };
        assert!(matches!(
            d.card_metadata(),
            Err(ConfigError::UnknownWidget { ref template, .. }) if template == "Mic"
        ));
    }

    #[test]
    fn compatible_required() {
        let d = CardDescription::default();
        assert!(matches!(d.driver_name(), Err(ConfigError::MissingCompatible)));
        let d = CardDescription {
            compatible: Some("qcom,sm8250-sndcard".to_string()),
            ..CardDescription::default()
        };
        assert!(matches!(d.card_metadata(), Err(ConfigError::UnknownCompatible(_))));
    }

    #[test]
    fn provider_table_from_description() {
        let table = CardDescription::from_toml(CARD).unwrap().provider_table();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.dai_name(&DaiRef::new("q6apmbedai", [113])).unwrap(),
            "RX_CODEC_DMA_RX_0"
        );
    }

    #[test]
    fn volume_policy_override() {
        let mut d = CardDescription::default();
        assert_eq!(d.volume_policy(), VolumePolicy::default());
        d.volume_limits = Some(vec![VolumeLimitDescription {
            control: "SpkrLeft PA Volume".to_string(),
            max: 12,
        }]);
        assert_eq!(
            d.volume_policy().limits(),
            &[VolumeLimit::new("SpkrLeft PA Volume", 12)]
        );
    }

    #[test]
    fn toml_roundtrip() {
        let d = CardDescription::from_toml(CARD).unwrap();
        let again = CardDescription::from_toml(&d.to_toml().unwrap()).unwrap();
        assert_eq!(d, again);
    }
}
