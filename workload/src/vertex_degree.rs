//! A MapReduce-compatible application that computes the
//! degree of each vertex in a graph, given a list of edges.
//!
//! Each input line holds one edge as two whitespace-separated vertex ids.

use anyhow::{anyhow, Result};

use common::{KeyValue, MapOutput};

fn parse_line(line: &str) -> Result<(u64, u64)> {
    let mut iter = line.split_whitespace().take(2);
    let a = iter
        .next()
        .ok_or_else(|| anyhow!("Invalid input file format"))?
        .parse()?;
    let b = iter
        .next()
        .ok_or_else(|| anyhow!("Invalid input file format"))?
        .parse()?;
    Ok((a, b))
}

pub fn map(document: KeyValue) -> MapOutput {
    let edges = document
        .value()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect::<Result<Vec<_>>>()?;

    let iter = edges.into_iter().flat_map(move |(a, b)| {
        [
            Ok::<_, anyhow::Error>(KeyValue::new(a.to_string(), "1")),
            Ok(KeyValue::new(b.to_string(), "1")),
        ]
    });
    Ok(Box::new(iter))
}

pub fn reduce(key: &str, values: Box<dyn Iterator<Item = &str> + '_>) -> Result<String> {
    let mut count = 0u64;

    for value in values {
        count += value.parse::<u64>()?;
    }

    Ok(format!("{}, deg={}", key, count))
}
