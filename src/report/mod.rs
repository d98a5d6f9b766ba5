//! Presentation helpers: formatted values, table/chart views and CSV export.
//! Rounding happens here and nowhere in the engine.

mod csv;
mod format;
mod table;

pub use csv::{CSV_HEADER, csv_content, export_filename, export_filename_today, write_csv};
pub use format::{
    format_currency, format_days, format_percent, format_slider_value, format_users,
    round_half_up, rounded_integer,
};
pub use table::{
    ChartPoint, DisplayWindow, ProfitCard, ProfitView, TableTotals, chart_series, profit_cards,
    render_dashboard, table_totals,
};
