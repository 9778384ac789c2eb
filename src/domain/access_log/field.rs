//! Semantic access-log field names.

use std::fmt;
use std::str::FromStr;

/// A semantic field of an access-log record.
///
/// The set is closed: adding a variant is a schema change and must be paired
/// with an appended slot in [`super::LogSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogField {
    Slug,
    Url,
    Ua,
    Ip,
    Source,
    Country,
    Region,
    City,
    Timezone,
    Language,
    Os,
    Browser,
    BrowserType,
    Device,
    DeviceType,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmTerm,
    UtmContent,
}

impl LogField {
    /// Number of known fields.
    pub const COUNT: usize = 20;

    /// All fields in declaration order.
    pub const ALL: [LogField; Self::COUNT] = [
        LogField::Slug,
        LogField::Url,
        LogField::Ua,
        LogField::Ip,
        LogField::Source,
        LogField::Country,
        LogField::Region,
        LogField::City,
        LogField::Timezone,
        LogField::Language,
        LogField::Os,
        LogField::Browser,
        LogField::BrowserType,
        LogField::Device,
        LogField::DeviceType,
        LogField::UtmSource,
        LogField::UtmMedium,
        LogField::UtmCampaign,
        LogField::UtmTerm,
        LogField::UtmContent,
    ];

    /// The wire name of the field, as used in decoded records and stats filters.
    pub fn as_str(self) -> &'static str {
        match self {
            LogField::Slug => "slug",
            LogField::Url => "url",
            LogField::Ua => "ua",
            LogField::Ip => "ip",
            LogField::Source => "source",
            LogField::Country => "country",
            LogField::Region => "region",
            LogField::City => "city",
            LogField::Timezone => "timezone",
            LogField::Language => "language",
            LogField::Os => "os",
            LogField::Browser => "browser",
            LogField::BrowserType => "browserType",
            LogField::Device => "device",
            LogField::DeviceType => "deviceType",
            LogField::UtmSource => "UTMSource",
            LogField::UtmMedium => "UTMMedium",
            LogField::UtmCampaign => "UTMCampaign",
            LogField::UtmTerm => "UTMTerm",
            LogField::UtmContent => "UTMContent",
        }
    }

    /// Position of the field in [`Self::ALL`]; used to index record tables.
    pub(crate) fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log field '{0}'")]
pub struct UnknownLogField(pub String);

impl FromStr for LogField {
    type Err = UnknownLogField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownLogField(s.to_string()))
    }
}
