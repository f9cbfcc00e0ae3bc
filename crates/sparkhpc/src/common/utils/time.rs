use std::fmt::{Display, Formatter};
use std::time::Duration;

use nom::character::complete::char;
use nom::combinator::map_res;
use nom::error::context;
use nom::sequence::separated_pair;
use serde::{Deserialize, Serialize};

use crate::common::parser::{NomResult, consume_all, p_u32};

// Allows specifying walltime as HH:MM
crate::arg_wrapper!(ArgWalltime, Walltime, parse_walltime);

// Allows specifying humantime format (2h, 3m, etc.)
crate::arg_wrapper!(ArgDuration, Duration, humantime::parse_duration);

/// Wall-clock limit of a cluster job, with minute granularity.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Walltime {
    minutes: u32,
}

impl Walltime {
    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    pub fn total_minutes(&self) -> u32 {
        self.minutes
    }

    pub fn hours_minutes(&self) -> (u32, u32) {
        (self.minutes / 60, self.minutes % 60)
    }
}

impl Default for Walltime {
    fn default() -> Self {
        Self::from_minutes(30)
    }
}

/// Formats the walltime as `HH:MM`.
impl Display for Walltime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (hours, minutes) = self.hours_minutes();
        write!(f, "{hours:02}:{minutes:02}")
    }
}

impl From<Walltime> for String {
    fn from(walltime: Walltime) -> Self {
        walltime.to_string()
    }
}

impl TryFrom<String> for Walltime {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_walltime(&value)
    }
}

fn p_walltime(input: &str) -> NomResult<Walltime> {
    context(
        "HH:MM walltime",
        map_res(separated_pair(p_u32, char(':'), p_u32), |(hours, minutes)| {
            hours
                .checked_mul(60)
                .and_then(|total| total.checked_add(minutes))
                .map(Walltime::from_minutes)
                .ok_or_else(|| anyhow::anyhow!("walltime {hours}:{minutes:02} is too long"))
        }),
    )(input)
}

/// Parses a walltime in the format `HH:MM`.
/// Minutes may exceed 59, hours may be zero padded.
pub fn parse_walltime(input: &str) -> anyhow::Result<Walltime> {
    let walltime = consume_all(p_walltime, input.trim())?;
    if walltime.total_minutes() == 0 {
        anyhow::bail!("Walltime has to be at least one minute");
    }
    Ok(walltime)
}
