use nom::branch::alt;
use nom::character::complete::{char, space0};
use nom::combinator::{map, map_res, opt};
use nom::error::context;
use nom::sequence::{terminated, tuple};

use crate::common::parser::{NomResult, consume_all, p_u64};

// Allows specifying memory as `<n>`, `<n>M` or `<n>G`
crate::arg_wrapper!(ArgMemory, u64, parse_memory_mb);

const MB_PER_GB: u64 = 1024;

fn p_unit(input: &str) -> NomResult<u64> {
    context(
        "memory unit (M or G)",
        alt((
            map(alt((char('M'), char('m'))), |_| 1),
            map(alt((char('G'), char('g'))), |_| MB_PER_GB),
        )),
    )(input)
}

fn p_memory(input: &str) -> NomResult<u64> {
    map_res(
        tuple((
            terminated(p_u64, space0),
            opt(terminated(p_unit, opt(alt((char('B'), char('b')))))),
        )),
        |(value, unit)| {
            value
                .checked_mul(unit.unwrap_or(1))
                .ok_or_else(|| anyhow::anyhow!("memory amount is too large"))
        },
    )(input)
}

/// Parses a memory amount into megabytes.
/// A value without a unit is interpreted as megabytes.
pub fn parse_memory_mb(input: &str) -> anyhow::Result<u64> {
    let memory = consume_all(p_memory, input.trim())?;
    if memory == 0 {
        anyhow::bail!("Memory amount has to be positive");
    }
    Ok(memory)
}

/// Formats megabytes as a JVM memory string, e.g. `2048M`.
pub fn format_memory_mb(memory: u64) -> String {
    format!("{memory}M")
}
