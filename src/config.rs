//! Mechanism for loading and sharing the run configuration

use crate::{
    conversion::ConversionKey,
    cuts::TpcQualityCut,
    reducer::{ReducerConfig, Variant},
    Result,
};

use eyre::{ensure, eyre, Report, WrapErr};

use std::{fs, str::FromStr};

/// Run configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Number of events to be reduced
    pub num_events: usize,

    /// Seed of the event source
    pub seed: u64,

    /// Reduction variant
    pub variant: Variant,

    /// Name of the photon conversion service
    pub conversion_key: ConversionKey,

    /// Whether tracks must also pass the TPC quality requirements
    pub tpc_quality: bool,

    /// Prefix of the output files
    pub output_prefix: String,
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and print it out
    pub fn load(file_name: &str) -> Result<Self> {
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read configuration file {}", file_name))?;
        let config = Self::parse(&config_str)?;
        config.print();
        Ok(config)
    }

    /// Decode and check the contents of a configuration file
    pub fn parse(config_str: &str) -> Result<Self> {
        // Configuration items are the first non-whitespace chunk of text on
        // each line, in a fixed order. Blank lines are ignored, and the rest
        // of each line is free-form commentary.
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill to
        // ease error reporting, and handling unexpected end-of-file too.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| eyre!("Missing configuration of {}", name))
        };

        let config = Configuration {
            num_events: next_item("num_events")?.parse::<usize>()?,
            seed: next_item("seed")?.parse::<u64>()?,
            variant: next_item("variant")?.parse::<Variant>()?,
            conversion_key: next_item("conversion_key")?.parse::<ConversionKey>()?,
            tpc_quality: next_item("tpc_quality")?.parse_bool()?,
            output_prefix: next_item("output_prefix")?.data.to_owned(),
        };

        // A sensible run must reduce at least one event
        ensure!(config.num_events > 0, "Please reduce at least one event");

        Ok(config)
    }

    /// Reducer setup matching this configuration
    pub fn reducer_config(&self) -> ReducerConfig {
        let mut reducer_config = ReducerConfig::for_variant(self.variant);
        reducer_config.conversion_key = self.conversion_key.clone();
        if self.tpc_quality {
            reducer_config.track_cut.quality = Some(TpcQualityCut::default());
        }
        reducer_config
    }

    /// Log the configuration
    pub fn print(&self) {
        tracing::info!(
            num_events = self.num_events,
            seed = self.seed,
            variant = %self.variant,
            conversion_key = %self.conversion_key,
            tpc_quality = self.tpc_quality,
            output_prefix = %self.output_prefix,
            "configuration loaded"
        );
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: Into<Report>,
    {
        let name = self.name;
        let parsed: Result<T> = self.data.parse::<T>().map_err(Into::into);
        parsed.wrap_err_with(|| format!("Could not parse configuration of {}", name))
    }

    /// Parse this data using special logic which handles Fortran's bool syntax
    fn parse_bool(self) -> Result<bool> {
        match self.data.to_lowercase().as_str() {
            ".true." => Ok(true),
            ".false." => Ok(false),
            _ => self.parse::<bool>(),
        }
    }
}
