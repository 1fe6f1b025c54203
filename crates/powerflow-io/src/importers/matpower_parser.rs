//! MATPOWER .m file parser
//!
//! Reads the `mpc.version`, `mpc.baseMVA`, `mpc.bus`, `mpc.gen` and `mpc.branch`
//! assignments of a MATPOWER case. Other assignments (costs, bus names, area data,
//! user fields) are skipped.

use std::fs;
use std::path::Path;

use powerflow_core::{PowerflowError, PowerflowResult};

use crate::helpers::{safe_f64_to_i32, safe_f64_to_usize};

/// Parsed MATPOWER case data
#[derive(Debug, Clone, Default)]
pub struct MatpowerCase {
    pub version: String,
    pub base_mva: f64,
    pub bus: Vec<MatpowerBus>,
    pub gen: Vec<MatpowerGen>,
    pub branch: Vec<MatpowerBranch>,
}

/// Bus types as encoded in the second column of `mpc.bus`
pub const BUS_PQ: i32 = 1;
pub const BUS_PV: i32 = 2;
pub const BUS_REF: i32 = 3;
pub const BUS_ISOLATED: i32 = 4;

#[derive(Debug, Clone)]
pub struct MatpowerBus {
    pub bus_i: usize,
    pub bus_type: i32,
    pub pd: f64,
    pub qd: f64,
    pub gs: f64,
    pub bs: f64,
    pub area: i32,
    pub vm: f64,
    pub va: f64,
    pub base_kv: f64,
    pub zone: i32,
    pub vmax: f64,
    pub vmin: f64,
}

#[derive(Debug, Clone)]
pub struct MatpowerGen {
    pub gen_bus: usize,
    pub pg: f64,
    pub qg: f64,
    pub qmax: f64,
    pub qmin: f64,
    pub vg: f64,
    pub mbase: f64,
    pub gen_status: i32,
    pub pmax: f64,
    pub pmin: f64,
}

#[derive(Debug, Clone)]
pub struct MatpowerBranch {
    pub f_bus: usize,
    pub t_bus: usize,
    pub br_r: f64,
    pub br_x: f64,
    pub br_b: f64,
    pub rate_a: f64,
    pub rate_b: f64,
    pub rate_c: f64,
    pub tap: f64,
    pub shift: f64,
    pub br_status: i32,
    pub angmin: f64,
    pub angmax: f64,
}

pub fn parse_matpower_file(path: &Path) -> PowerflowResult<MatpowerCase> {
    let content = fs::read_to_string(path)?;
    parse_matpower_string(&content).map_err(|err| match err {
        PowerflowError::Parse(msg) => {
            PowerflowError::Parse(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// Parse MATPOWER content from a string (single pass over the lines)
pub fn parse_matpower_string(content: &str) -> PowerflowResult<MatpowerCase> {
    let mut case = MatpowerCase {
        base_mva: 100.0,
        ..MatpowerCase::default()
    };

    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = strip_comment(line).trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((lhs, rhs)) = trimmed.split_once('=') else {
            continue;
        };
        // Bare `rhs` also catches `function mpc = case9`, whose lhs is not an mpc field.
        match lhs.trim() {
            "mpc.version" => case.version = extract_string(rhs),
            "mpc.baseMVA" => {
                case.base_mva = extract_scalar(rhs).ok_or_else(|| {
                    PowerflowError::Parse(format!("invalid mpc.baseMVA value '{}'", rhs.trim()))
                })?;
            }
            "mpc.bus" => case.bus = parse_matrix("mpc.bus", rhs, &mut lines, 13, parse_bus_row)?,
            "mpc.gen" => case.gen = parse_matrix("mpc.gen", rhs, &mut lines, 10, parse_gen_row)?,
            "mpc.branch" => {
                case.branch = parse_matrix("mpc.branch", rhs, &mut lines, 11, parse_branch_row)?
            }
            _ => {}
        }
    }

    if case.bus.is_empty() {
        return Err(PowerflowError::Parse("mpc.bus matrix not found".into()));
    }
    if !(case.base_mva.is_finite() && case.base_mva > 0.0) {
        return Err(PowerflowError::Parse(format!(
            "mpc.baseMVA must be positive, got {}",
            case.base_mva
        )));
    }

    Ok(case)
}

fn strip_comment(line: &str) -> &str {
    line.split('%').next().unwrap_or_default()
}

/// Value of `'2';` style assignments
fn extract_string(rhs: &str) -> String {
    rhs.trim()
        .trim_matches(|c| c == '\'' || c == '"' || c == ';')
        .to_string()
}

fn extract_scalar(rhs: &str) -> Option<f64> {
    rhs.trim().trim_end_matches(';').trim().parse().ok()
}

/// Consume a `[ ... ];` matrix literal.
///
/// `rhs` is the text after `=` on the assignment line; rows may continue on the
/// same line and are separated by `;` or newlines.
fn parse_matrix<'a, T>(
    name: &str,
    rhs: &'a str,
    lines: &mut impl Iterator<Item = &'a str>,
    min_cols: usize,
    parse_row: fn(&[f64], usize) -> PowerflowResult<T>,
) -> PowerflowResult<Vec<T>> {
    let Some((_, first)) = rhs.split_once('[') else {
        return Err(PowerflowError::Parse(format!("{name}: expected '['")));
    };

    let mut rows = Vec::new();
    let mut segment = first;
    let mut closed = false;

    loop {
        let mut body = strip_comment(segment);
        if let Some((before, _)) = body.split_once(']') {
            body = before;
            closed = true;
        }

        for row_text in body.split(';') {
            let values = parse_values(name, row_text, rows.len())?;
            if values.is_empty() {
                continue;
            }
            if values.len() < min_cols {
                return Err(PowerflowError::Parse(format!(
                    "{name} row {} has {} columns, expected at least {min_cols}",
                    rows.len() + 1,
                    values.len()
                )));
            }
            rows.push(parse_row(&values, rows.len() + 1).map_err(|err| match err {
                PowerflowError::Parse(msg) => PowerflowError::Parse(format!("{name}: {msg}")),
                other => other,
            })?);
        }

        if closed {
            return Ok(rows);
        }
        segment = lines
            .next()
            .ok_or_else(|| PowerflowError::Parse(format!("{name}: missing closing ']'")))?;
    }
}

fn parse_values(name: &str, row_text: &str, row_idx: usize) -> PowerflowResult<Vec<f64>> {
    row_text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                PowerflowError::Parse(format!(
                    "{name} row {}: '{token}' is not a number",
                    row_idx + 1
                ))
            })
        })
        .collect()
}

fn parse_bus_row(values: &[f64], row: usize) -> PowerflowResult<MatpowerBus> {
    Ok(MatpowerBus {
        bus_i: safe_f64_to_usize(values[0], "bus_i", row)?,
        bus_type: safe_f64_to_i32(values[1], "type", row)?,
        pd: values[2],
        qd: values[3],
        gs: values[4],
        bs: values[5],
        area: safe_f64_to_i32(values[6], "area", row)?,
        vm: values[7],
        va: values[8],
        base_kv: values[9],
        zone: safe_f64_to_i32(values[10], "zone", row)?,
        vmax: values[11],
        vmin: values[12],
    })
}

fn parse_gen_row(values: &[f64], row: usize) -> PowerflowResult<MatpowerGen> {
    Ok(MatpowerGen {
        gen_bus: safe_f64_to_usize(values[0], "gen_bus", row)?,
        pg: values[1],
        qg: values[2],
        qmax: values[3],
        qmin: values[4],
        vg: values[5],
        mbase: values[6],
        gen_status: safe_f64_to_i32(values[7], "gen_status", row)?,
        pmax: values[8],
        pmin: values[9],
    })
}

fn parse_branch_row(values: &[f64], row: usize) -> PowerflowResult<MatpowerBranch> {
    Ok(MatpowerBranch {
        f_bus: safe_f64_to_usize(values[0], "f_bus", row)?,
        t_bus: safe_f64_to_usize(values[1], "t_bus", row)?,
        br_r: values[2],
        br_x: values[3],
        br_b: values[4],
        rate_a: values[5],
        rate_b: values[6],
        rate_c: values[7],
        tap: values[8],
        shift: values[9],
        br_status: safe_f64_to_i32(values[10], "br_status", row)?,
        // version 1 files stop after the status column
        angmin: values.get(11).copied().unwrap_or(-360.0),
        angmax: values.get(12).copied().unwrap_or(360.0),
    })
}
