//! US EPA air-quality bands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    /// Station published no reading.
    Unknown,
}

impl AqiCategory {
    #[must_use]
    pub fn from_aqi(aqi: Option<u32>) -> Self {
        match aqi {
            None => Self::Unknown,
            Some(0..=50) => Self::Good,
            Some(51..=100) => Self::Moderate,
            Some(101..=150) => Self::UnhealthyForSensitive,
            Some(151..=200) => Self::Unhealthy,
            Some(201..=300) => Self::VeryUnhealthy,
            Some(_) => Self::Hazardous,
        }
    }

    #[must_use]
    pub fn level(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
            Self::Unknown => "No Reading",
        }
    }

    /// CSS class used by the popup stylesheet.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Good => "aqi-good",
            Self::Moderate => "aqi-moderate",
            Self::UnhealthyForSensitive => "aqi-unhealthy-sensitive",
            Self::Unhealthy => "aqi-unhealthy",
            Self::VeryUnhealthy => "aqi-very-unhealthy",
            Self::Hazardous => "aqi-hazardous",
            Self::Unknown => "aqi-unknown",
        }
    }
}

#[cfg(test)]
#[path = "aqi_test.rs"]
mod tests;
