use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::core::MonthRecord;

use super::format::rounded_integer;

pub const CSV_HEADER: &str =
    "Month,New Users,Total Users,Revenue,Spend,Agency Fee,Transaction Fees,Profit";

/// One header line plus one line per displayed month, values rounded to
/// whole numbers. Lines are `\n`-separated with no trailing newline.
pub fn csv_content(rows: &[MonthRecord]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for m in rows {
        lines.push(format!(
            "{},{},{},{},{},{},{},{}",
            m.month,
            rounded_integer(m.new_users),
            rounded_integer(m.total_users),
            rounded_integer(m.revenue),
            rounded_integer(m.spend),
            rounded_integer(m.agency_fee),
            rounded_integer(m.transaction_fee),
            rounded_integer(m.profit),
        ));
    }
    lines.join("\n")
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("fibertime-growth-sim-{}.csv", date.format("%Y-%m-%d"))
}

/// Filename for an export made now, using the local calendar date.
pub fn export_filename_today() -> String {
    export_filename(Local::now().date_naive())
}

pub fn write_csv(dir: &Path, rows: &[MonthRecord], date: NaiveDate) -> io::Result<PathBuf> {
    let path = dir.join(export_filename(date));
    fs::write(&path, csv_content(rows))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EconomicConstants, ParameterSet, ProjectionResult, run_projection};
    use crate::report::DisplayWindow;

    fn default_result() -> ProjectionResult {
        run_projection(&ParameterSet::default(), &EconomicConstants::default())
            .expect("valid defaults")
    }

    fn parse_rows(csv: &str) -> (String, Vec<Vec<i64>>) {
        let mut lines = csv.split('\n');
        let header = lines.next().expect("header").to_string();
        let rows = lines
            .map(|line| {
                line.split(',')
                    .map(|cell| cell.parse::<i64>().expect("integer cell"))
                    .collect()
            })
            .collect();
        (header, rows)
    }

    #[test]
    fn quarter_export_matches_expected_text() {
        let result = default_result();
        let csv = csv_content(DisplayWindow::Quarter.rows(&result));
        let expected = "Month,New Users,Total Users,Revenue,Spend,Agency Fee,Transaction Fees,Profit\n\
                        1,2538,2538,126923,100000,75000,12692,-60769\n\
                        2,2538,4696,234808,100000,75000,23481,36327\n\
                        3,2538,6530,326510,100000,75000,32651,118859";
        assert_eq!(csv, expected);
    }

    #[test]
    fn full_year_export_round_trips_to_rounded_records() {
        let result = default_result();
        let rows = DisplayWindow::FullYear.rows(&result);
        let (header, parsed) = parse_rows(&csv_content(rows));

        assert_eq!(header, CSV_HEADER);
        assert_eq!(parsed.len(), 12);
        for (cells, m) in parsed.iter().zip(rows) {
            assert_eq!(
                cells,
                &vec![
                    i64::from(m.month),
                    rounded_integer(m.new_users),
                    rounded_integer(m.total_users),
                    rounded_integer(m.revenue),
                    rounded_integer(m.spend),
                    rounded_integer(m.agency_fee),
                    rounded_integer(m.transaction_fee),
                    rounded_integer(m.profit),
                ]
            );
        }
        assert_eq!(parsed[11][2], 14_516);
        assert_eq!(parsed[11][7], 478_216);
    }

    #[test]
    fn export_does_not_mutate_the_projection() {
        let result = default_result();
        let before = result.clone();
        let _ = csv_content(DisplayWindow::FullYear.rows(&result));
        assert_eq!(result, before);
        assert!(result.months[0].total_users.fract() != 0.0);
    }

    #[test]
    fn filename_uses_zero_padded_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date");
        assert_eq!(export_filename(date), "fibertime-growth-sim-2024-01-05.csv");
        assert!(export_filename_today().starts_with("fibertime-growth-sim-"));
        assert!(export_filename_today().ends_with(".csv"));
    }

    #[test]
    fn write_csv_creates_dated_file() {
        let dir = std::env::temp_dir().join(format!("growth-sim-csv-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let date = NaiveDate::from_ymd_opt(2025, 11, 30).expect("valid date");
        let result = default_result();

        let path = write_csv(&dir, DisplayWindow::Quarter.rows(&result), date).expect("written");
        assert!(path.ends_with("fibertime-growth-sim-2025-11-30.csv"));
        let body = fs::read_to_string(&path).expect("readable");
        assert!(body.starts_with(CSV_HEADER));
        assert_eq!(body.lines().count(), 4);

        let _ = fs::remove_dir_all(&dir);
    }
}
