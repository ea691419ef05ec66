//! Card description validation.
//!
//! [`validate_description`] checks a description without resolving it and
//! reports every problem it finds, so a board author can fix them in one
//! pass instead of meeting them one at a time at bring-up.
//!
//! # Example
//!
//! ```rust
//! use reachcard_config::{CardDescription, ValidationError, validate_description};
//!
//! let description = CardDescription::from_toml(r#"
//! compatible = "qcom,qcs6490-rb3gen2-sndcard"
//!
//! [[links]]
//! link-name = "MultiMedia1"
//! "#).unwrap();
//!
//! let err = validate_description(&description).unwrap_err();
//! assert!(matches!(err, ValidationError::MissingCpu { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use reachcard_core::{DaiLookup, DaiRef, LookupFailure};
use reachcard_runtime::WidgetKind;
use thiserror::Error;

use crate::description::CardDescription;
use crate::driver::driver_name;
use crate::providers::ProviderTable;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No compatible string.
    #[error("missing compatible string")]
    MissingCompatible,

    /// Compatible names no supported board.
    #[error("unsupported compatible: {0}")]
    UnknownCompatible(String),

    /// Widget template not recognised.
    #[error("unknown widget template '{template}' for '{name}'")]
    UnknownWidget {
        /// Template as written.
        template: String,
        /// Widget name.
        name: String,
    },

    /// The description has no available links.
    #[error("card has no links")]
    NoLinks,

    /// A link has no `link-name`.
    #[error("link #{position} has no link-name")]
    MissingLinkName {
        /// Position among available links.
        position: usize,
    },

    /// A link has no `cpu` child.
    #[error("{link}: missing cpu")]
    MissingCpu {
        /// Declared link name.
        link: String,
    },

    /// The `cpu` reference has no argument cells.
    #[error("{link}: cpu reference has no port id")]
    MissingPortId {
        /// Declared link name.
        link: String,
    },

    /// A `codec` child lists no DAIs.
    #[error("{link}: codec list is empty")]
    EmptyCodec {
        /// Declared link name.
        link: String,
    },

    /// A reference names a node that provides no DAIs.
    #[error("{link}: no DAI provider '{node}'")]
    UnknownProvider {
        /// Declared link name.
        link: String,
        /// Referenced node.
        node: String,
    },

    /// A reference selects a DAI the provider does not have.
    #[error("{link}: '{node}' has no DAI {args:?}")]
    UnknownDai {
        /// Declared link name.
        link: String,
        /// Referenced node.
        node: String,
        /// Argument cells of the reference.
        args: Vec<u32>,
    },

    /// Two links share a port id.
    #[error("port {id} used by both '{first}' and '{second}'")]
    DuplicatePort {
        /// Shared port id.
        id: u32,
        /// First link.
        first: String,
        /// Second link.
        second: String,
    },

    /// A provider node is declared twice.
    #[error("DAI provider '{0}' declared more than once")]
    DuplicateProvider(String),

    /// Link `status` is neither `okay` nor `disabled`.
    #[error("{link}: unknown status '{status}'")]
    UnknownStatus {
        /// Declared link name.
        link: String,
        /// Status as written.
        status: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_reference(
    providers: &ProviderTable,
    link: &str,
    reference: &DaiRef,
    errors: &mut Vec<ValidationError>,
) {
    match providers.dai_name(reference) {
        Ok(_) => {}
        Err(LookupFailure::UnknownProvider) => errors.push(ValidationError::UnknownProvider {
            link: link.to_string(),
            node: reference.node.clone(),
        }),
        Err(LookupFailure::UnknownDai { .. }) => errors.push(ValidationError::UnknownDai {
            link: link.to_string(),
            node: reference.node.clone(),
            args: reference.args.clone(),
        }),
    }
}

/// Validate a whole card description.
///
/// Returns the single problem found, or [`ValidationError::Multiple`] when
/// there is more than one.
pub fn validate_description(description: &CardDescription) -> ValidationResult<()> {
    let mut errors = Vec::new();

    match description.compatible.as_deref() {
        None => errors.push(ValidationError::MissingCompatible),
        Some(c) if driver_name(c).is_none() => {
            errors.push(ValidationError::UnknownCompatible(c.to_string()));
        }
        Some(_) => {}
    }

    for (template, name) in &description.widgets {
        if WidgetKind::from_template(template).is_none() {
            errors.push(ValidationError::UnknownWidget {
                template: template.clone(),
                name: name.clone(),
            });
        }
    }

    let mut seen_providers = HashSet::new();
    for provider in &description.dai_providers {
        if !seen_providers.insert(provider.node.as_str()) {
            errors.push(ValidationError::DuplicateProvider(provider.node.clone()));
        }
    }

    for link in &description.links {
        if let Some(status) = link.status.as_deref()
            && !matches!(status, "okay" | "ok" | "disabled")
        {
            errors.push(ValidationError::UnknownStatus {
                link: link.link_name.clone().unwrap_or_default(),
                status: status.to_string(),
            });
        }
    }

    let providers = description.provider_table();
    let mut ports: HashMap<u32, String> = HashMap::new();
    let mut available = 0;

    for (position, record) in description.endpoint_records().iter().enumerate() {
        available += 1;
        if record.name.is_empty() {
            errors.push(ValidationError::MissingLinkName { position });
        }
        let link = if record.name.is_empty() {
            record.node.as_str()
        } else {
            record.name.as_str()
        };

        match &record.cpu {
            None => errors.push(ValidationError::MissingCpu {
                link: link.to_string(),
            }),
            Some(cpu) => {
                match cpu.first_cell() {
                    None => errors.push(ValidationError::MissingPortId {
                        link: link.to_string(),
                    }),
                    Some(id) => {
                        if let Some(first) = ports.get(&id) {
                            errors.push(ValidationError::DuplicatePort {
                                id,
                                first: first.clone(),
                                second: link.to_string(),
                            });
                        } else {
                            ports.insert(id, link.to_string());
                        }
                    }
                }
                check_reference(&providers, link, cpu, &mut errors);
            }
        }

        if let Some(codecs) = &record.codecs {
            if codecs.is_empty() {
                errors.push(ValidationError::EmptyCodec {
                    link: link.to_string(),
                });
            }
            for codec in codecs {
                check_reference(&providers, link, codec, &mut errors);
            }
        }
    }

    if available == 0 {
        errors.push(ValidationError::NoLinks);
    }

    if errors.is_empty() {
        Ok(())
    } else if errors.len() == 1 {
        Err(errors.remove(0))
    } else {
        tracing::debug!(problems = errors.len(), "card description invalid");
        Err(ValidationError::Multiple(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{DaiRefDescription, LinkDescription, PlatformDescription};
    use crate::providers::{DaiEntry, DaiProvider};

    fn cpu(id: u32) -> Option<DaiRefDescription> {
        Some(DaiRefDescription {
            node: "q6apmbedai".to_string(),
            args: vec![id],
        })
    }

    fn valid() -> CardDescription {
        CardDescription {
            model: Some("test-card".to_string()),
            compatible: Some("qcom,qcm6490-idp-sndcard".to_string()),
            dai_providers: vec![
                DaiProvider {
                    node: "q6apmbedai".to_string(),
                    dais: vec![
                        DaiEntry::with_id("RX_CODEC_DMA_RX_0", 113),
                        DaiEntry::with_id("TX_CODEC_DMA_TX_3", 120),
                    ],
                },
                DaiProvider {
                    node: "wcd938x".to_string(),
                    dais: vec![DaiEntry::new("wcd938x-rx"), DaiEntry::new("wcd938x-tx")],
                },
            ],
            links: vec![
                LinkDescription {
                    link_name: Some("WCD Playback".to_string()),
                    cpu: cpu(113),
                    codec: Some(vec![DaiRefDescription {
                        node: "wcd938x".to_string(),
                        args: vec![0],
                    }]),
                    platform: Some(PlatformDescription {
                        node: "q6apm".to_string(),
                    }),
                    ..LinkDescription::default()
                },
                LinkDescription {
                    link_name: Some("WCD Capture".to_string()),
                    cpu: cpu(120),
                    ..LinkDescription::default()
                },
            ],
            ..CardDescription::default()
        }
    }

    #[test]
    fn valid_description_passes() {
        assert_eq!(validate_description(&valid()), Ok(()));
    }

    #[test]
    fn single_error_not_wrapped() {
        let mut d = valid();
        d.compatible = None;
        assert_eq!(
            validate_description(&d),
            Err(ValidationError::MissingCompatible)
        );
    }

    #[test]
    fn collects_every_problem() {
        let mut d = valid();
        d.compatible = Some("qcom,sm8250-sndcard".to_string());
        d.widgets.push(("Mic".to_string(), "Mic Jack".to_string()));
        d.links[1].cpu = cpu(113);
        d.links.push(LinkDescription {
            link_name: Some("Broken".to_string()),
            ..LinkDescription::default()
        });

        let Err(ValidationError::Multiple(errors)) = validate_description(&d) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.contains(&ValidationError::UnknownCompatible(
            "qcom,sm8250-sndcard".to_string()
        )));
        assert!(errors.contains(&ValidationError::DuplicatePort {
            id: 113,
            first: "WCD Playback".to_string(),
            second: "WCD Capture".to_string(),
        }));
        assert!(errors.contains(&ValidationError::MissingCpu {
            link: "Broken".to_string()
        }));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownWidget { .. })));
    }

    #[test]
    fn unknown_references() {
        let mut d = valid();
        d.links[0].codec = Some(vec![
            DaiRefDescription {
                node: "wcd938x".to_string(),
                args: vec![5],
            },
            DaiRefDescription {
                node: "swr2".to_string(),
                args: vec![0],
            },
        ]);
        let Err(ValidationError::Multiple(errors)) = validate_description(&d) else {
            panic!("expected multiple errors");
        };
        assert_eq!(
            errors,
            vec![
                ValidationError::UnknownDai {
                    link: "WCD Playback".to_string(),
                    node: "wcd938x".to_string(),
                    args: vec![5],
                },
                ValidationError::UnknownProvider {
                    link: "WCD Playback".to_string(),
                    node: "swr2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn disabled_links_not_checked() {
        let mut d = valid();
        d.links.push(LinkDescription {
            link_name: Some("Off".to_string()),
            status: Some("disabled".to_string()),
            ..LinkDescription::default()
        });
        assert_eq!(validate_description(&d), Ok(()));
    }

    #[test]
    fn empty_card() {
        let mut d = valid();
        d.links.clear();
        assert_eq!(validate_description(&d), Err(ValidationError::NoLinks));
    }

    #[test]
    fn missing_name_and_port() {
        let mut d = valid();
        d.links[1].link_name = None;
        d.links[1].cpu = Some(DaiRefDescription {
            node: "q6apmbedai".to_string(),
            args: vec![],
        });
        let Err(ValidationError::Multiple(errors)) = validate_description(&d) else {
            panic!("expected multiple errors");
        };
        assert!(errors.contains(&ValidationError::MissingLinkName { position: 1 }));
        assert!(errors.contains(&ValidationError::MissingPortId {
            link: "link1".to_string()
        }));
    }
}
