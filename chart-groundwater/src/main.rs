//! Groundwater level chart
//!
//! Renders the stratigraphy of an observation well (left panel) beside
//! its compensated daily water level series (right panel) as an SVG.
//!
//! Data flow:
//! 1. Read the per-well water level CSV written by `gwl-cli compensate`.
//! 2. Aggregate the hourly rows into daily means.
//! 3. Read the per-well geology CSV and convert it to elevations.
//! 4. Draw both panels with plotters into an SVG string and write it out.

use std::collections::BTreeMap;
use std::ops::Range;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use log::info;
use plotters::prelude::*;

use gwl_diver::geology::Geology;
use gwl_diver::readers;

/// Timestamp format of the water level CSV: "YYYY-MM-DD HH:MM:SS"
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Parser)]
#[command(
    name = "chart-groundwater",
    version,
    about = "Render well stratigraphy and water levels to SVG"
)]
struct Args {
    /// Water level CSV written by the compensate command
    #[arg(short = 'w', long)]
    water_level_csv: String,

    /// Per-well geology CSV
    #[arg(short = 'g', long)]
    geology_csv: String,

    /// Surface level of the well (m datum)
    #[arg(short = 's', long)]
    surface_level: f64,

    /// Figure title, usually the well name
    #[arg(long, default_value = "Observation well")]
    title: String,

    /// Output SVG path
    #[arg(short = 'o', long, default_value = "groundwater.svg")]
    output: String,
}

/// Colors per lithology label. A value, not process state: pass a
/// different one in to restyle the figure.
struct LithologyColors {
    fill: RGBColor,
    clay: RGBColor,
    sandy_clay: RGBColor,
    clay_loam: RGBColor,
    sandy_loam: RGBColor,
    loamy_sand: RGBColor,
    sand: RGBColor,
    water_level: RGBColor,
}

impl Default for LithologyColors {
    fn default() -> Self {
        LithologyColors {
            fill: RGBColor(128, 128, 128),
            clay: RGBColor(0, 146, 0),
            sandy_clay: RGBColor(7, 140, 3),
            clay_loam: RGBColor(54, 124, 44),
            sandy_loam: RGBColor(178, 236, 94),
            loamy_sand: RGBColor(218, 233, 93),
            sand: RGBColor(242, 226, 5),
            water_level: RGBColor(20, 30, 149),
        }
    }
}

impl LithologyColors {
    /// Unknown labels fall back to the fill color.
    fn color(&self, lithology: &str) -> RGBColor {
        match lithology {
            "clay" => self.clay,
            "sandy_clay" => self.sandy_clay,
            "clay_loam" => self.clay_loam,
            "sandy_loam" => self.sandy_loam,
            "loamy_sand" => self.loamy_sand,
            "sand" => self.sand,
            _ => self.fill,
        }
    }
}

/// Aggregate a water level CSV body into daily mean levels.
/// Empty value cells (missing rows) are skipped.
fn daily_mean_levels(content: &str) -> anyhow::Result<Vec<(NaiveDate, f64)>> {
    let mut daily: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());
    for row in rdr.records() {
        let record = row?;
        let date_cell = record.get(0).context("missing date field")?;
        let ts = NaiveDateTime::parse_from_str(date_cell.trim(), DATETIME_FORMAT)?;
        let value_cell = record.get(1).unwrap_or("").trim();
        if value_cell.is_empty() {
            continue;
        }
        let value: f64 = value_cell.parse()?;
        let entry = daily.entry(ts.date()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    Ok(daily
        .into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect())
}

fn read_daily_water_level(path: &str) -> anyhow::Result<Vec<(NaiveDate, f64)>> {
    daily_mean_levels(&std::fs::read_to_string(path)?)
}

fn generate_svg(
    svg_inner_string: &mut String,
    title: &str,
    geology: &Geology,
    levels: &[(NaiveDate, f64)],
    colors: &LithologyColors,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = (900u32, 600u32);
    let backend = SVGBackend::with_string(svg_inner_string, size);
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;
    let (geology_area, level_area) = root.split_horizontally(180);

    // geology panel: lithology blocks over the elevation axis
    if !geology.layers.is_empty() {
        let bottom = geology
            .layers
            .iter()
            .map(|l| l.bottom)
            .fold(f64::INFINITY, f64::min);
        let top = geology
            .layers
            .iter()
            .map(|l| l.top)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut geology_chart = ChartBuilder::on(&geology_area)
            .margin(10i32)
            .y_label_area_size(40u32)
            .build_cartesian_2d(0f64..1f64, bottom..top)?;
        geology_chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .y_desc("Elevation (m datum)")
            .draw()?;
        for layer in &geology.layers {
            let color = colors.color(&layer.lithology);
            geology_chart.draw_series(std::iter::once(Rectangle::new(
                [(0.0, layer.bottom), (1.0, layer.top)],
                color.filled(),
            )))?;
        }
    }

    // water level panel
    let date_range = Range {
        start: levels.first().map(|p| p.0).unwrap_or_default(),
        end: levels.last().map(|p| p.0).unwrap_or_default(),
    };
    let ranged_date: RangedDate<NaiveDate> = date_range.into();
    let level_min = levels.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let level_max = levels.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((level_max - level_min) * 0.1).max(0.1);

    let mut level_chart = ChartBuilder::on(&level_area)
        .margin(10i32)
        .x_label_area_size(30u32)
        .y_label_area_size(40u32)
        .build_cartesian_2d(ranged_date, (level_min - pad)..(level_max + pad))?;
    level_chart
        .configure_mesh()
        .x_labels(8_usize)
        .y_desc("Water level (m datum)")
        .draw()?;

    let line_color = colors.water_level;
    level_chart
        .draw_series(LineSeries::new(levels.iter().copied(), &line_color))?
        .label("water level")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color));
    level_chart
        .configure_series_labels()
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let geology = readers::read_geology(&args.geology_csv, args.surface_level)?;
    let levels = read_daily_water_level(&args.water_level_csv)?;
    if levels.is_empty() {
        anyhow::bail!("no water level rows in {}", args.water_level_csv);
    }

    let mut svg = String::new();
    generate_svg(&mut svg, &args.title, &geology, &levels, &LithologyColors::default())
        .map_err(|e| anyhow::anyhow!("failed to render chart: {}", e))?;
    std::fs::write(&args.output, &svg)?;
    info!("Chart written to {}", args.output);
    Ok(())
}
