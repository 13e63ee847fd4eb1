//! Encoding and decoding of technology and fuel identifiers.
//!
//! Identifiers are fixed-width strings made up of three-character segments with no separators.
//! For example, `PWRHYDUSACA01` is made up of:
//!
//! * `PWR` - the record class (here, a power-generation technology)
//! * `HYD` - the technology or fuel family (hydro)
//! * `USA` - the primary geography
//! * `CA01` - the sub-national node and unit suffix
//!
//! Decoding is positional and the tables which make up a model do not agree on where geography
//! codes live, so callers describe the slices to read with a [`SliceSpec`].
use anyhow::{Context, Result, ensure};
use std::fmt;
use std::ops::Range;
use strum::{AsRefStr, EnumIter, EnumString};

/// The geography code used for international (cross-border) links
pub const INTERNATIONAL: &str = "INT";

/// Width of every fixed-width segment of an identifier
pub const SEGMENT_WIDTH: usize = 3;

/// The record class of power-generation technologies
pub const POWER_CLASS: &str = "PWR";

/// The shortest string which can be parsed as an [`Identifier`]
const MIN_IDENTIFIER_LEN: usize = 3 * SEGMENT_WIDTH;

const CLASS_SLICE: Range<usize> = 0..3;
const FAMILY_SLICE: Range<usize> = 3..6;
const GEOGRAPHY_SLICE: Range<usize> = 6..9;

/// Get the characters of `identifier` in `range`.
///
/// If the identifier is too short to contain the whole range, an empty string is returned. An
/// empty string never matches a family or geography code.
pub fn slice(identifier: &str, range: Range<usize>) -> &str {
    identifier.get(range).unwrap_or_default()
}

/// Get the record class of an identifier (e.g. `PWR`)
pub fn class_of(identifier: &str) -> &str {
    slice(identifier, CLASS_SLICE)
}

/// Describes where the family and geography codes are found in a given kind of identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceSpec {
    family: Range<usize>,
    geographies: Vec<Range<usize>>,
}

impl SliceSpec {
    /// Ordinary identifiers: family at `[3, 6)` and geography at `[6, 9)`
    pub fn ordinary() -> Self {
        Self {
            family: FAMILY_SLICE,
            geographies: vec![GEOGRAPHY_SLICE],
        }
    }

    /// A spec probing three-character geography slots starting at each of `starts`
    pub fn geography_slots(starts: &[usize]) -> Self {
        Self {
            family: FAMILY_SLICE,
            geographies: starts
                .iter()
                .map(|&start| start..start + SEGMENT_WIDTH)
                .collect(),
        }
    }

    /// Iterate over the geography slots of `identifier` described by this spec
    pub fn geographies<'s, 'a>(
        &'s self,
        identifier: &'a str,
    ) -> impl Iterator<Item = &'a str> + use<'s, 'a> {
        self.geographies
            .iter()
            .map(move |range| slice(identifier, range.clone()))
    }
}

/// The fields of an identifier, as read by [`decode`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// The technology or fuel family code
    pub family: &'a str,
    /// The primary geography code
    pub geography_primary: &'a str,
    /// The secondary geography code (empty if the slice spec only has one geography slot)
    pub geography_secondary: &'a str,
}

/// Decode an identifier according to the given slice spec.
///
/// No validation is performed: slices which do not fit inside `identifier` are empty.
pub fn decode<'a>(identifier: &'a str, spec: &SliceSpec) -> Decoded<'a> {
    let mut geographies = spec.geographies(identifier);
    Decoded {
        family: slice(identifier, spec.family.clone()),
        geography_primary: geographies.next().unwrap_or_default(),
        geography_secondary: geographies.next().unwrap_or_default(),
    }
}

/// Build an identifier by concatenating its segments
pub fn encode(class: &str, family: &str, geography: &str, unit: &str) -> String {
    [class, family, geography, unit].concat()
}

/// Known technology and fuel families
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, EnumIter, EnumString,
)]
pub enum TechnologyFamily {
    /// Battery storage
    #[strum(serialize = "BAT")]
    Battery,
    /// Biomass
    #[strum(serialize = "BIO")]
    Biomass,
    /// Combined-cycle gas turbine
    #[strum(serialize = "CCG")]
    GasCombinedCycle,
    /// Coal
    #[strum(serialize = "COA")]
    Coal,
    /// Cogeneration
    #[strum(serialize = "COG")]
    Cogeneration,
    /// Concentrated solar power
    #[strum(serialize = "CSP")]
    ConcentratedSolar,
    /// Electricity
    #[strum(serialize = "ELC")]
    Electricity,
    /// Natural gas
    #[strum(serialize = "GAS")]
    NaturalGas,
    /// Geothermal
    #[strum(serialize = "GEO")]
    Geothermal,
    /// Hydroelectric
    #[strum(serialize = "HYD")]
    Hydro,
    /// International transmission
    #[strum(serialize = "INT")]
    International,
    /// Open-cycle gas turbine
    #[strum(serialize = "OCG")]
    GasOpenCycle,
    /// Oil
    #[strum(serialize = "OIL")]
    Oil,
    /// Catch-all category
    #[strum(serialize = "OTH")]
    Other,
    /// Petroleum
    #[strum(serialize = "PET")]
    Petroleum,
    /// Solar (unspecified)
    #[strum(serialize = "SOL")]
    Solar,
    /// Solar photovoltaic
    #[strum(serialize = "SPV")]
    SolarPV,
    /// Nuclear (uranium)
    #[strum(serialize = "URN")]
    Nuclear,
    /// Waste
    #[strum(serialize = "WAS")]
    Waste,
    /// Wave
    #[strum(serialize = "WAV")]
    Wave,
    /// Offshore wind
    #[strum(serialize = "WOF")]
    WindOffshore,
    /// Onshore wind
    #[strum(serialize = "WON")]
    WindOnshore,
}

impl TechnologyFamily {
    /// The three-letter code for this family
    pub fn code(&self) -> &str {
        self.as_ref()
    }

    /// A human-readable description, used for labelling results
    pub fn description(&self) -> &'static str {
        match self {
            Self::Battery => "Battery",
            Self::Biomass => "Biomass",
            Self::GasCombinedCycle => "Gas - Combined cycle",
            Self::Coal => "Coal",
            Self::Cogeneration => "Cogeneration",
            Self::ConcentratedSolar => "Concentrated Solar Power",
            Self::Electricity => "Electricity",
            Self::NaturalGas => "Natural gas",
            Self::Geothermal => "Geothermal",
            Self::Hydro => "Hydroelectric",
            Self::International => "International",
            Self::GasOpenCycle => "Gas - Open Cycle",
            Self::Oil => "Oil",
            Self::Other => "Other",
            Self::Petroleum => "Petroleum",
            Self::Solar => "Solar",
            Self::SolarPV => "Solar Photovoltaic",
            Self::Nuclear => "Nuclear",
            Self::Waste => "Waste",
            Self::Wave => "Wave",
            Self::WindOffshore => "Wind - Offshore",
            Self::WindOnshore => "Wind - Onshore",
        }
    }

    /// Whether this family counts towards the renewable share of generation
    pub fn is_renewable(&self) -> bool {
        matches!(
            self,
            Self::Biomass
                | Self::ConcentratedSolar
                | Self::Geothermal
                | Self::Hydro
                | Self::SolarPV
                | Self::WindOnshore
                | Self::WindOffshore
        )
    }
}

/// Get a description for a family code, falling back on the code itself if it is unknown
pub fn describe_family(code: &str) -> &str {
    code.parse::<TechnologyFamily>()
        .map_or(code, |family| family.description())
}

/// A structured identifier, validated on parsing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The record class (e.g. `PWR`)
    pub class: String,
    /// The technology or fuel family
    pub family: TechnologyFamily,
    /// The primary geography code
    pub geography: String,
    /// Everything after the primary geography (sub-national node, unit number etc.)
    pub unit: String,
}

impl Identifier {
    /// Parse an identifier string.
    ///
    /// The string must be ASCII, at least nine characters long and contain a known family code.
    pub fn parse(s: &str) -> Result<Self> {
        ensure!(s.is_ascii(), "Identifier '{s}' contains non-ASCII characters");
        ensure!(
            s.len() >= MIN_IDENTIFIER_LEN,
            "Identifier '{s}' is too short: expected at least {MIN_IDENTIFIER_LEN} characters"
        );

        let family_code = slice(s, FAMILY_SLICE);
        let family = family_code
            .parse()
            .ok()
            .with_context(|| format!("Unknown family '{family_code}' in identifier '{s}'"))?;

        Ok(Self {
            class: slice(s, CLASS_SLICE).to_string(),
            family,
            geography: slice(s, GEOGRAPHY_SLICE).to_string(),
            unit: s[GEOGRAPHY_SLICE.end..].to_string(),
        })
    }

    /// Whether this identifier is for a power-generation technology
    pub fn is_power_plant(&self) -> bool {
        self.class == POWER_CLASS
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            encode(&self.class, self.family.code(), &self.geography, &self.unit)
        )
    }
}
