//! Time signatures and their measure lengths.
//!
//! A closed set of meters, each mapping to a beats-per-measure count.
//! x/4 meters count quarter-note beats directly; x/8 meters count
//! eighth-note pairs, so compound meters land on fractional beat counts
//! (5/8 is two and a half beats).

use crate::error::ConductorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The meters the clock understands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSignature {
    #[serde(rename = "2/4")]
    TwoFour,
    #[serde(rename = "5/8")]
    FiveEight,
    #[serde(rename = "3/4")]
    ThreeFour,
    #[serde(rename = "6/8")]
    SixEight,
    #[serde(rename = "7/8")]
    SevenEight,
    #[default]
    #[serde(rename = "4/4")]
    FourFour,
    #[serde(rename = "9/8")]
    NineEight,
    #[serde(rename = "5/4")]
    FiveFour,
    #[serde(rename = "11/8")]
    ElevenEight,
    #[serde(rename = "6/4")]
    SixFour,
    #[serde(rename = "7/4")]
    SevenFour,
    #[serde(rename = "8/4")]
    EightFour,
    #[serde(rename = "9/4")]
    NineFour,
    #[serde(rename = "10/4")]
    TenFour,
    #[serde(rename = "11/4")]
    ElevenFour,
    #[serde(rename = "12/4")]
    TwelveFour,
}

impl TimeSignature {
    /// Every meter, in ascending measure length.
    pub const ALL: [TimeSignature; 16] = [
        TimeSignature::TwoFour,
        TimeSignature::FiveEight,
        TimeSignature::ThreeFour,
        TimeSignature::SixEight,
        TimeSignature::SevenEight,
        TimeSignature::FourFour,
        TimeSignature::NineEight,
        TimeSignature::FiveFour,
        TimeSignature::ElevenEight,
        TimeSignature::SixFour,
        TimeSignature::SevenFour,
        TimeSignature::EightFour,
        TimeSignature::NineFour,
        TimeSignature::TenFour,
        TimeSignature::ElevenFour,
        TimeSignature::TwelveFour,
    ];

    /// Beats in one measure of this meter.
    pub const fn beats_per_measure(self) -> f64 {
        match self {
            TimeSignature::TwoFour => 2.0,
            TimeSignature::FiveEight => 2.5,
            TimeSignature::ThreeFour => 3.0,
            TimeSignature::SixEight => 3.0,
            TimeSignature::SevenEight => 3.5,
            TimeSignature::FourFour => 4.0,
            TimeSignature::NineEight => 4.5,
            TimeSignature::FiveFour => 5.0,
            TimeSignature::ElevenEight => 5.5,
            TimeSignature::SixFour => 6.0,
            TimeSignature::SevenFour => 7.0,
            TimeSignature::EightFour => 8.0,
            TimeSignature::NineFour => 9.0,
            TimeSignature::TenFour => 10.0,
            TimeSignature::ElevenFour => 11.0,
            TimeSignature::TwelveFour => 12.0,
        }
    }

    /// The symbolic id, e.g. `"7/8"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            TimeSignature::TwoFour => "2/4",
            TimeSignature::FiveEight => "5/8",
            TimeSignature::ThreeFour => "3/4",
            TimeSignature::SixEight => "6/8",
            TimeSignature::SevenEight => "7/8",
            TimeSignature::FourFour => "4/4",
            TimeSignature::NineEight => "9/8",
            TimeSignature::FiveFour => "5/4",
            TimeSignature::ElevenEight => "11/8",
            TimeSignature::SixFour => "6/4",
            TimeSignature::SevenFour => "7/4",
            TimeSignature::EightFour => "8/4",
            TimeSignature::NineFour => "9/4",
            TimeSignature::TenFour => "10/4",
            TimeSignature::ElevenFour => "11/4",
            TimeSignature::TwelveFour => "12/4",
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSignature {
    type Err = ConductorError;

    /// Resolve a symbolic id. This is the only gate through which
    /// external ids enter the system; anything past it is a valid meter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSignature::ALL
            .iter()
            .copied()
            .find(|sig| sig.as_str() == s)
            .ok_or_else(|| ConductorError::UnknownTimeSignature(s.to_string()))
    }
}
