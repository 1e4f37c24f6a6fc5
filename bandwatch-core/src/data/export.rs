//! Analysis export for rendering collaborators.
//!
//! CSV columns:
//! `timestamp,open,high,low,close,volume,upper,middle,lower,upper_signal,lower_signal`.
//! Missing band values and "no event" slots are written as empty cells.

use std::io::Write;
use std::path::Path;

use crate::analysis::Analysis;
use crate::error::BandwatchError;

pub const CSV_HEADER: [&str; 11] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "upper",
    "middle",
    "lower",
    "upper_signal",
    "lower_signal",
];

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

/// Write the analysis as CSV. Returns the number of data rows.
pub fn write_analysis_csv<W: Write>(writer: W, analysis: &Analysis) -> Result<usize, BandwatchError> {
    let export_err = |e: csv::Error| BandwatchError::Export(e.to_string());
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER).map_err(export_err)?;

    for (i, bar) in analysis.bars.iter().enumerate() {
        let record = [
            bar.timestamp.to_rfc3339(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            cell(analysis.band.upper.get(i).copied()),
            cell(analysis.band.middle.get(i).copied()),
            cell(analysis.band.lower.get(i).copied()),
            cell(analysis.upper_signals.get(i)),
            cell(analysis.lower_signals.get(i)),
        ];
        wtr.write_record(&record).map_err(export_err)?;
    }

    wtr.flush()
        .map_err(|e| BandwatchError::Export(e.to_string()))?;
    Ok(analysis.bars.len())
}

pub fn write_analysis_csv_file(path: &Path, analysis: &Analysis) -> Result<usize, BandwatchError> {
    let file = std::fs::File::create(path)
        .map_err(|e| BandwatchError::Export(format!("create '{}': {e}", path.display())))?;
    write_analysis_csv(file, analysis)
}

/// Pretty JSON of the full analysis (NaN serializes as `null`).
pub fn analysis_json(analysis: &Analysis) -> Result<String, BandwatchError> {
    serde_json::to_string_pretty(analysis).map_err(|e| BandwatchError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::config::BandwatchConfig;
    use crate::domain::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_analysis() -> Analysis {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap();
        let mut closes = vec![100.0; 25];
        closes[22] = 140.0;
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(base + Duration::minutes(i as i64), c, c, c, c, 1.0))
            .collect();
        let mut config = BandwatchConfig::classic();
        config.analysis.trim_minutes = 0;
        Analyzer::from_config(&config)
            .unwrap()
            .analyze_bars("X", bars)
            .unwrap()
    }

    #[test]
    fn csv_has_header_and_sparse_signals() {
        let analysis = sample_analysis();
        let mut out = Vec::new();
        let rows = write_analysis_csv(&mut out, &analysis).unwrap();
        assert_eq!(rows, 25);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(lines.len(), 26);

        // Warm-up row: band and signals empty.
        assert!(lines[1].ends_with(",,,,,"), "{}", lines[1]);

        // Spike row carries an upper marker and no lower marker.
        let spike: Vec<&str> = lines[23].split(',').collect();
        assert_eq!(spike.len(), 11);
        assert!(!spike[9].is_empty());
        assert!(spike[10].is_empty());
    }

    #[test]
    fn json_encodes_missing_as_null() {
        let json = analysis_json(&sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["band"]["upper"][0].is_null());
        assert_eq!(value["symbol"], "X");
    }

    #[test]
    fn file_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        assert_eq!(write_analysis_csv_file(&path, &sample_analysis()).unwrap(), 25);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("timestamp,"));
    }
}
