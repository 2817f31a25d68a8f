//! Interactive single-day chart of the cached CSV.
//!
//! Rows are limited to one calendar date and the 07:30–18:00 window, plotted
//! against time of day encoded as an `HHMM` integer.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use plotters::prelude::*;
use plotters::style::FontStyle;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

use crate::error::EtlError;
use crate::export::read_csv;
use crate::models::{IntradayTable, COMPANY_NAME};

const CHART_SIZE: (u32, u32) = (2000, 1600);
const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const PURPLE: RGBColor = RGBColor(128, 0, 128);

type PriceOf = fn(&ChartPoint) -> f64;

fn high(p: &ChartPoint) -> f64 {
    p.high
}
fn low(p: &ChartPoint) -> f64 {
    p.low
}
fn open(p: &ChartPoint) -> f64 {
    p.open
}
fn close(p: &ChartPoint) -> f64 {
    p.close
}

const SERIES: [(&str, RGBColor, PriceOf); 4] = [
    ("High Price", BLUE, high),
    ("Low Price", RED, low),
    ("Open Price", GREEN, open),
    ("Close Price", PURPLE, close),
];

/// One bar inside the trading window
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub datetime: NaiveDateTime,
    /// Time of day as an integer, 09:30 -> 930
    pub hhmm: i32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

pub fn window_start() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 30, 0).unwrap_or(NaiveTime::MIN)
}

pub fn window_end() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn plot_file_name(date: NaiveDate) -> String {
    format!("tesla_{}_30min_high_price.png", date)
}

pub fn chart_title(date: NaiveDate) -> String {
    format!(
        "{} - {} Stock Price Intraday 30-Minute Interval Data",
        date, COMPANY_NAME
    )
}

/// Ask for a date on `output` and parse one line of `input` as `YYYY-MM-DD`.
pub fn prompt_for_date<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<NaiveDate, EtlError> {
    write!(output, "Enter a date within the last month (YYYY-MM-DD): ")
        .and_then(|_| output.flush())
        .map_err(|e| EtlError::io("<stdout>", e))?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| EtlError::io("<stdin>", e))?;
    if read == 0 || line.trim().is_empty() {
        return Err(EtlError::Input("no date entered".to_string()));
    }

    parse_date(&line)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, EtlError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| EtlError::Input(format!("'{}' is not a YYYY-MM-DD date: {}", raw.trim(), e)))
}

/// Minutes since midnight, the x coordinate of a bar
pub fn minute_of_day(datetime: NaiveDateTime) -> i32 {
    (datetime.hour() * 60 + datetime.minute()) as i32
}

/// `HHMM` tick label for a minute-of-day coordinate, 570 -> `0930`
pub fn tick_label(minutes: i32) -> String {
    format!("{:02}{:02}", minutes / 60, minutes % 60)
}

/// Bars on `date` between 07:30 and 18:00 inclusive, in time order.
pub fn select_trading_window(table: &IntradayTable, date: NaiveDate) -> Vec<ChartPoint> {
    let (start, end) = (window_start(), window_end());

    let mut points: Vec<ChartPoint> = table
        .iter()
        .filter(|bar| bar.datetime.date() == date)
        .filter(|bar| (start..=end).contains(&bar.datetime.time()))
        .map(|bar| ChartPoint {
            datetime: bar.datetime,
            hhmm: (bar.datetime.hour() * 100 + bar.datetime.minute()) as i32,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        })
        .collect();
    points.sort_by_key(|p| p.datetime);
    points
}

/// Read the CSV, select `date`, and render it into `out_dir`.
/// Returns `None` when the date has no bars in the window.
pub fn plot_day(csv_path: &Path, date: NaiveDate, out_dir: &Path) -> Result<Option<PathBuf>, EtlError> {
    let table = read_csv(csv_path)?;
    let points = select_trading_window(&table, date);

    if points.is_empty() {
        info!("No data available for {}", date);
        return Ok(None);
    }

    let path = out_dir.join(plot_file_name(date));
    render_chart(&points, date, &path)?;
    info!("Plot saved to {}", path.display());
    Ok(Some(path))
}

fn register_fonts() -> Result<(), EtlError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| {
            plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "bundled font rejected".to_string())
        })
        .clone()
        .map_err(EtlError::Chart)
}

fn chart_err<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::Chart(e.to_string())
}

/// Draw the four price series as a PNG at `path`.
pub fn render_chart(points: &[ChartPoint], date: NaiveDate, path: &Path) -> Result<(), EtlError> {
    if points.is_empty() {
        return Err(EtlError::Chart("nothing to plot".to_string()));
    }
    register_fonts()?;

    // Ticks sit on the bars themselves, never between them
    let ticks: Vec<i32> = points.iter().map(|p| minute_of_day(p.datetime)).collect();
    let x_min = ticks.iter().copied().min().unwrap_or(0) - 30;
    let x_max = ticks.iter().copied().max().unwrap_or(0) + 30;

    let prices = points.iter().flat_map(|p| [p.open, p.high, p.low, p.close]);
    let (lo, hi) = prices.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let pad = ((hi - lo) * 0.05).max(0.5);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(date), (FONT_FAMILY, 40))
        .margin(30)
        .x_label_area_size(80)
        .y_label_area_size(100)
        .build_cartesian_2d((x_min..x_max).with_key_points(ticks), (lo - pad)..(hi + pad))
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Time During The Day (EST)")
        .y_desc("Price (USD)")
        .x_label_formatter(&|minutes| tick_label(*minutes))
        .label_style((FONT_FAMILY, 22))
        .axis_desc_style((FONT_FAMILY, 26))
        .draw()
        .map_err(chart_err)?;

    for (label, color, price) in SERIES {
        chart
            .draw_series(
                LineSeries::new(
                    points.iter().map(|p| (minute_of_day(p.datetime), price(p))),
                    color.stroke_width(2),
                )
                .point_size(5),
            )
            .map_err(chart_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(3)));
    }

    chart
        .configure_series_labels()
        .label_font((FONT_FAMILY, 24))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}
