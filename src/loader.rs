//! Reading point lists from plain text
//!
//! One point per line as `lat,lon[,label]`.
//! Blank lines and lines starting with `#` are skipped.

use crate::{IoSnafu, ParseSnafu, QuadTree};
use snafu::prelude::*;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

const BUFFER_SIZE: usize = 1024 * 1024; // 1 MB

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

pub fn read_points<R>(reader: R) -> crate::Result<Vec<LabeledPoint>>
where
    R: BufRead,
{
    let mut points = Vec::new();
    for (index, line_res) in reader.lines().enumerate() {
        let line = line_res.context(IoSnafu)?;
        if let Some(point) = parse_line(&line, index + 1)? {
            points.push(point);
        }
    }
    Ok(points)
}

pub fn load_points<P>(path: P) -> crate::Result<Vec<LabeledPoint>>
where
    P: AsRef<Path>,
{
    let file = File::open(path).context(IoSnafu)?;
    read_points(BufReader::with_capacity(BUFFER_SIZE, file))
}

/// Build a tree holding every point, labelled with its label
///
/// Points outside the universe of `tree` are skipped with a warning.
pub fn fill_tree(tree: &mut QuadTree<String>, points: Vec<LabeledPoint>) {
    tree.extend(points.into_iter().map(|p| (p.lat, p.lon, p.label)));
}

fn parse_line(line: &str, line_number: usize) -> crate::Result<Option<LabeledPoint>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut fields = trimmed.splitn(3, ',').map(str::trim);
    let lat = parse_coordinate(fields.next(), "latitude", line_number)?;
    let lon = parse_coordinate(fields.next(), "longitude", line_number)?;
    let label = match fields.next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => format!("{lat},{lon}"),
    };
    Ok(Some(LabeledPoint { lat, lon, label }))
}

fn parse_coordinate(field: Option<&str>, name: &str, line: usize) -> crate::Result<f64> {
    let field = field.context(ParseSnafu {
        line,
        description: format!("missing {name}"),
    })?;
    let value: f64 = field.parse().ok().context(ParseSnafu {
        line,
        description: format!("{name} '{field}' is not a number"),
    })?;
    ensure!(
        value.is_finite(),
        ParseSnafu {
            line,
            description: format!("{name} '{field}' is not finite"),
        }
    );
    Ok(value)
}
