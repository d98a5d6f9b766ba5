use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::core::{
    EconomicConstants, HORIZON_MONTHS, Horizon, KpiSet, MonthRecord, ParameterSet, Payback,
    ProjectionResult,
};

use super::format::{format_currency, format_percent, format_users};

/// How many months the P&L table shows, and therefore exports.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayWindow {
    #[default]
    Quarter,
    FullYear,
}

impl DisplayWindow {
    pub fn months(self) -> usize {
        match self {
            DisplayWindow::Quarter => 3,
            DisplayWindow::FullYear => HORIZON_MONTHS,
        }
    }

    pub fn from_months(months: u32) -> Option<Self> {
        match months {
            3 => Some(DisplayWindow::Quarter),
            12 => Some(DisplayWindow::FullYear),
            _ => None,
        }
    }

    pub fn rows(self, result: &ProjectionResult) -> &[MonthRecord] {
        &result.months[..self.months()]
    }

    pub fn caption(self) -> String {
        format!("Showing {} months", self.months())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTotals {
    pub new_users: f64,
    pub revenue: f64,
    pub spend: f64,
    pub agency_fee: f64,
    pub transaction_fee: f64,
    pub profit: f64,
}

pub fn table_totals(rows: &[MonthRecord]) -> TableTotals {
    rows.iter().fold(TableTotals::default(), |acc, m| TableTotals {
        new_users: acc.new_users + m.new_users,
        revenue: acc.revenue + m.revenue,
        spend: acc.spend + m.spend,
        agency_fee: acc.agency_fee + m.agency_fee,
        transaction_fee: acc.transaction_fee + m.transaction_fee,
        profit: acc.profit + m.profit,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub name: String,
    pub month: u32,
    pub revenue: f64,
    pub total_costs: f64,
    pub net_profit: f64,
}

/// Trend chart data for all twelve months.
pub fn chart_series(result: &ProjectionResult) -> Vec<ChartPoint> {
    result
        .months
        .iter()
        .map(|m| ChartPoint {
            name: format!("M{}", m.month),
            month: m.month,
            revenue: m.revenue,
            total_costs: m.total_cost,
            net_profit: m.profit,
        })
        .collect()
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfitView {
    #[default]
    Cumulative,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitCard {
    pub title: &'static str,
    pub value: f64,
    pub formatted: String,
    pub subtitle: &'static str,
    pub is_positive: bool,
}

pub fn profit_cards(kpis: &KpiSet, view: ProfitView) -> Vec<ProfitCard> {
    Horizon::ALL
        .into_iter()
        .map(|horizon| {
            let (value, subtitle) = match (view, horizon) {
                (ProfitView::Cumulative, Horizon::ThirtyDay) => {
                    (kpis.cumulative_profit(horizon), "Month 1 profit")
                }
                (ProfitView::Cumulative, Horizon::NinetyDay) => {
                    (kpis.cumulative_profit(horizon), "Months 1-3 cumulative")
                }
                (ProfitView::Cumulative, Horizon::OneYear) => {
                    (kpis.cumulative_profit(horizon), "12 months cumulative")
                }
                (ProfitView::Monthly, Horizon::ThirtyDay) => {
                    (kpis.monthly_profit(horizon), "Month 1 only")
                }
                (ProfitView::Monthly, Horizon::NinetyDay) => {
                    (kpis.monthly_profit(horizon), "Month 3 only")
                }
                (ProfitView::Monthly, Horizon::OneYear) => {
                    (kpis.monthly_profit(horizon), "Month 12 only")
                }
            };
            ProfitCard {
                title: horizon.label(),
                value,
                formatted: format_currency(value),
                subtitle,
                is_positive: value >= 0.0,
            }
        })
        .collect()
}

fn payback_line(label: &str, payback: Payback) -> String {
    let status = if payback.is_reached() {
        "Positive"
    } else {
        "Negative"
    };
    format!("{label:<16} {payback} ({status})")
}

/// Plain-text dashboard: assumptions, KPI cards, then the monthly P&L table.
pub fn render_dashboard(
    params: &ParameterSet,
    constants: &EconomicConstants,
    result: &ProjectionResult,
    window: DisplayWindow,
    view: ProfitView,
) -> String {
    let mut out = String::new();
    let kpis = &result.kpis;

    let _ = writeln!(out, "Growth Command Center - 12-Month Simulator");
    let _ = writeln!(
        out,
        "Agency fee {}/month, transaction fee {}, monthly ARPU {}/user",
        format_currency(constants.agency_fee),
        format_percent(constants.transaction_fee_rate * 100.0),
        format_currency(params.monthly_arpu()),
    );
    let _ = writeln!(
        out,
        "Escalator steps {}, adjusted CPL {}, nCAC {}/user, new users {}/month",
        result.steps,
        format_currency(result.adjusted_cpl),
        format_currency(result.ncac),
        format_users(result.new_users_per_month),
    );
    let _ = writeln!(out);

    let view_label = match view {
        ProfitView::Cumulative => "cumulative",
        ProfitView::Monthly => "monthly",
    };
    let _ = writeln!(out, "Net Profit ({view_label})");
    for card in profit_cards(kpis, view) {
        let _ = writeln!(
            out,
            "  {:<7} {:>16}  {}",
            card.title, card.formatted, card.subtitle
        );
    }
    let _ = writeln!(out, "Customer Acquisition Cost (nCAC)");
    let _ = writeln!(out, "  Digital nCAC     {}", format_currency(kpis.digital_ncac));
    let _ = writeln!(out, "  All-In nCAC      {}", format_currency(kpis.all_in_ncac));
    let _ = writeln!(out, "Payback Period");
    let _ = writeln!(out, "  {}", payback_line("Digital Payback", kpis.digital_payback));
    let _ = writeln!(out, "  {}", payback_line("All-In Payback", kpis.all_in_payback));
    let _ = writeln!(out);

    let _ = writeln!(out, "Monthly P&L Breakdown ({})", window.caption());
    let _ = writeln!(
        out,
        "{:<6}{:>12}{:>14}{:>16}{:>14}{:>14}{:>18}{:>16}",
        "Month",
        "New Users",
        "Total Users",
        "Revenue",
        "Spend",
        "Agency Fee",
        "Transaction Fees",
        "Profit"
    );
    let rows = window.rows(result);
    for m in rows {
        let _ = writeln!(
            out,
            "{:<6}{:>12}{:>14}{:>16}{:>14}{:>14}{:>18}{:>16}",
            m.month,
            format_users(m.new_users),
            format_users(m.total_users),
            format_currency(m.revenue),
            format_currency(m.spend),
            format_currency(m.agency_fee),
            format_currency(m.transaction_fee),
            format_currency(m.profit),
        );
    }
    let totals = table_totals(rows);
    let _ = writeln!(
        out,
        "{:<6}{:>12}{:>14}{:>16}{:>14}{:>14}{:>18}{:>16}",
        "Total",
        format_users(totals.new_users),
        "",
        format_currency(totals.revenue),
        format_currency(totals.spend),
        format_currency(totals.agency_fee),
        format_currency(totals.transaction_fee),
        format_currency(totals.profit),
    );
    out
}
