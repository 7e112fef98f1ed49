use crate::aggregate::{Attribute, Distributions, FrequencyTable};
use crate::error::Error;
use crate::render::{arrange, ChartSpec};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Heading used when dumping a distribution to the console.
pub fn heading(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::FocalLength => "Full-frame equivalent focal length distribution",
        Attribute::CameraModel => "Camera model distribution",
        Attribute::LensModel => "Lens model distribution",
        Attribute::Aperture => "Aperture distribution",
        Attribute::Iso => "ISO distribution",
    }
}

/// `value: count` lines in the same order the chart uses.
pub fn dump_table<W: Write>(
    out: &mut W,
    title: &str,
    table: &FrequencyTable,
    spec: &ChartSpec,
) -> io::Result<()> {
    writeln!(out, "{}:", title)?;
    for (value, count) in arrange(table, spec.mode) {
        writeln!(out, "{}: {}", value, count)?;
    }
    Ok(())
}

pub fn dump_distributions<W: Write>(out: &mut W, distributions: &Distributions) -> io::Result<()> {
    for (i, (attribute, table)) in distributions.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        dump_table(
            out,
            heading(attribute),
            table,
            &ChartSpec::for_attribute(attribute),
        )?;
    }
    Ok(())
}

/// Raw counts as `attribute,value,count` rows, values in lexical order.
pub fn write_csv(path: &Path, distributions: &Distributions) -> Result<usize, Error> {
    let file = File::create(path)?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(["attribute", "value", "count"])?;

    let mut rows = 0;
    for (attribute, table) in distributions.iter() {
        for (value, count) in table.iter() {
            wtr.write_record([attribute.key(), value, count.to_string().as_str()])?;
            rows += 1;
        }
    }
    wtr.flush()?;
    Ok(rows)
}
