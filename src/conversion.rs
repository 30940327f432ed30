//! Photon conversion candidates, provided by a companion reconstruction step

use crate::{
    event::{Event, V0Candidate},
    numeric::Float,
};
use eyre::{ensure, Report};
use std::{fmt, str::FromStr};

/// Companion service counting reconstructed conversion-photon candidates
pub trait PhotonConversionSource: Send + Sync {
    /// Number of photon candidates in `event`, or None if the service has
    /// nothing to say about this event
    fn photon_candidates(&self, event: &Event) -> Option<usize>;
}

/// Photon candidate finder working on the event's V0 list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct V0Reader {
    /// Only count V0s found during tracking
    pub only_on_the_fly: bool,

    /// Upper bound on the e⁺e⁻ invariant mass of a candidate (GeV/c²)
    pub max_inv_mass: Option<Float>,
}
//
impl V0Reader {
    fn is_candidate(&self, v0: &V0Candidate) -> bool {
        if self.only_on_the_fly && !v0.on_the_fly {
            return false;
        }
        self.max_inv_mass.map_or(true, |max| v0.inv_mass <= max)
    }
}
//
impl PhotonConversionSource for V0Reader {
    fn photon_candidates(&self, event: &Event) -> Option<usize> {
        Some(event.v0s.iter().filter(|v0| self.is_candidate(v0)).count())
    }
}

/// Name under which the conversion service is registered
///
/// Some setups register a single reader under a fixed name, others register
/// one reader per cut selection and name it after the cut strings. Both
/// spellings are accepted so that the choice stays with the configuration.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConversionKey {
    /// Fixed service name
    Literal(String),

    /// Name derived from the event and photon cut strings
    FromCuts {
        /// Event selection cut string
        event_cut: String,
        /// Photon selection cut string
        photon_cut: String,
    },
}
//
impl Default for ConversionKey {
    fn default() -> Self {
        ConversionKey::Literal("fV0ReaderV1".to_owned())
    }
}
//
impl ConversionKey {
    /// Service name which this key resolves to
    pub fn name(&self) -> String {
        match self {
            ConversionKey::Literal(name) => name.clone(),
            ConversionKey::FromCuts {
                event_cut,
                photon_cut,
            } => format!("V0ReaderV1_{}_{}", event_cut, photon_cut),
        }
    }
}
//
impl fmt::Display for ConversionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKey::Literal(name) => write!(f, "{}", name),
            ConversionKey::FromCuts {
                event_cut,
                photon_cut,
            } => write!(f, "cuts:{}:{}", event_cut, photon_cut),
        }
    }
}
//
impl FromStr for ConversionKey {
    type Err = Report;

    /// Parse either a literal name or `cuts:<event cut>:<photon cut>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(!s.is_empty(), "Empty conversion service key");
        match s.strip_prefix("cuts:") {
            Some(cuts) => {
                let (event_cut, photon_cut) = cuts.split_once(':').unwrap_or((cuts, ""));
                ensure!(
                    !event_cut.is_empty() && !photon_cut.is_empty(),
                    "Conversion key {} should read cuts:<event cut>:<photon cut>",
                    s
                );
                Ok(ConversionKey::FromCuts {
                    event_cut: event_cut.to_owned(),
                    photon_cut: photon_cut.to_owned(),
                })
            }
            None => Ok(ConversionKey::Literal(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v0(on_the_fly: bool, inv_mass: Float) -> V0Candidate {
        V0Candidate {
            on_the_fly,
            inv_mass,
        }
    }

    #[test]
    fn v0_reader_counts_candidates() {
        let event = Event {
            v0s: vec![v0(true, 0.01), v0(false, 0.02), v0(true, 0.3)],
            ..Event::default()
        };
        assert_eq!(V0Reader::default().photon_candidates(&event), Some(3));

        let on_the_fly = V0Reader {
            only_on_the_fly: true,
            max_inv_mass: None,
        };
        assert_eq!(on_the_fly.photon_candidates(&event), Some(2));

        let light = V0Reader {
            only_on_the_fly: true,
            max_inv_mass: Some(0.1),
        };
        assert_eq!(light.photon_candidates(&event), Some(1));
        assert_eq!(light.photon_candidates(&Event::default()), Some(0));
    }

    #[test]
    fn keys_parse_and_name() {
        let literal: ConversionKey = "fV0ReaderV1".parse().unwrap();
        assert_eq!(literal, ConversionKey::default());
        assert_eq!(literal.name(), "fV0ReaderV1");

        let derived: ConversionKey = "cuts:00010113:00200009327000008250400000".parse().unwrap();
        assert_eq!(
            derived.name(),
            "V0ReaderV1_00010113_00200009327000008250400000"
        );
        assert_eq!(
            derived.to_string(),
            "cuts:00010113:00200009327000008250400000"
        );
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!("".parse::<ConversionKey>().is_err());
        assert!("cuts:".parse::<ConversionKey>().is_err());
        assert!("cuts:00010113".parse::<ConversionKey>().is_err());
        assert!("cuts::002".parse::<ConversionKey>().is_err());
    }
}
