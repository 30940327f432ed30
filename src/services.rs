//! Registry of the external services which reducers depend on
//!
//! Services are looked up once, when a reducer is built. The reducer then
//! holds typed references for the rest of the run.

use crate::{conversion::PhotonConversionSource, pid::PidResponse};
use indexmap::IndexMap;

/// Name-addressed collection of the services available to this run
#[derive(Default)]
pub struct ServiceRegistry {
    pid: Option<Box<dyn PidResponse>>,
    conversions: IndexMap<String, Box<dyn PhotonConversionSource>>,
}
//
impl ServiceRegistry {
    /// Start with no service registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the PID response, replacing any previous one
    pub fn with_pid(mut self, pid: impl PidResponse + 'static) -> Self {
        self.pid = Some(Box::new(pid));
        self
    }

    /// Register a conversion service under a name
    pub fn with_conversion(
        mut self,
        name: impl Into<String>,
        source: impl PhotonConversionSource + 'static,
    ) -> Self {
        let name = name.into();
        if self.conversions.insert(name.clone(), Box::new(source)).is_some() {
            tracing::warn!(%name, "conversion service registered twice, keeping the last one");
        }
        self
    }

    /// PID response, if one was installed
    pub fn pid(&self) -> Option<&dyn PidResponse> {
        self.pid.as_deref()
    }

    /// Conversion service registered under `name`
    pub fn conversion(&self, name: &str) -> Option<&dyn PhotonConversionSource> {
        self.conversions.get(name).map(|source| &**source)
    }

    /// Names of the registered conversion services
    pub fn conversion_names(&self) -> impl Iterator<Item = &str> {
        self.conversions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{conversion::V0Reader, pid::BetheBlochResponse};

    #[test]
    fn lookups_by_name() {
        let registry = ServiceRegistry::new()
            .with_pid(BetheBlochResponse::default())
            .with_conversion("fV0ReaderV1", V0Reader::default());
        assert!(registry.pid().is_some());
        assert!(registry.conversion("fV0ReaderV1").is_some());
        assert!(registry.conversion("V0ReaderV1").is_none());
        assert_eq!(registry.conversion_names().collect::<Vec<_>>(), vec!["fV0ReaderV1"]);
    }

    #[test]
    fn empty_registry() {
        let registry = ServiceRegistry::new();
        assert!(registry.pid().is_none());
        assert!(registry.conversion("fV0ReaderV1").is_none());
    }
}
