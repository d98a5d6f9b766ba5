use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ConstantsError, DomainError};

pub const HORIZON_MONTHS: usize = 12;
pub const DAYS_PER_MONTH: u32 = 30;

pub const STEP_SIZE: f64 = 30_000.0;
pub const FIXED_AGENCY_FEE: f64 = 75_000.0;
pub const TRANSACTION_FEE_RATE: f64 = 0.10;
pub const BASE_SPEND_ANCHOR: f64 = 0.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "monthlySpend")]
    MonthlySpend,
    #[serde(rename = "baseCPL")]
    BaseCpl,
    #[serde(rename = "conversionRate")]
    ConversionRate,
    #[serde(rename = "cplPenalty")]
    CplPenalty,
    #[serde(rename = "usageDays")]
    UsageDays,
    #[serde(rename = "pricePerDay")]
    PricePerDay,
    #[serde(rename = "retention")]
    Retention,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldFormat {
    Currency,
    Percent,
    Days,
}

/// Slider bounds for one input. `step` is UI granularity only.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FieldDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub label: &'static str,
    pub format: FieldFormat,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::MonthlySpend,
        Field::BaseCpl,
        Field::ConversionRate,
        Field::CplPenalty,
        Field::UsageDays,
        Field::PricePerDay,
        Field::Retention,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::MonthlySpend => "monthlySpend",
            Field::BaseCpl => "baseCPL",
            Field::ConversionRate => "conversionRate",
            Field::CplPenalty => "cplPenalty",
            Field::UsageDays => "usageDays",
            Field::PricePerDay => "pricePerDay",
            Field::Retention => "retention",
        }
    }

    pub fn domain(self) -> FieldDomain {
        let (min, max, step, label, format) = match self {
            Field::MonthlySpend => (
                5_000.0,
                1_000_000.0,
                5_000.0,
                "Monthly Spend",
                FieldFormat::Currency,
            ),
            Field::BaseCpl => (5.0, 50.0, 1.0, "Base CPL", FieldFormat::Currency),
            Field::ConversionRate => (
                5.0,
                100.0,
                1.0,
                "Lead-to-Customer Conversion",
                FieldFormat::Percent,
            ),
            Field::CplPenalty => (
                0.0,
                50.0,
                1.0,
                "CPL Escalator (diminishing returns)",
                FieldFormat::Percent,
            ),
            Field::UsageDays => (1.0, 30.0, 1.0, "Usage Days", FieldFormat::Days),
            Field::PricePerDay => (1.0, 15.0, 1.0, "Revenue per Day", FieldFormat::Currency),
            Field::Retention => (0.0, 100.0, 1.0, "Retention", FieldFormat::Percent),
        };
        FieldDomain {
            min,
            max,
            step,
            label,
            format,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One immutable snapshot of the seven slider inputs.
///
/// Percentages (`conversion_rate`, `cpl_penalty`, `retention`) are carried in
/// percent form, e.g. `85.0` for 85%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub monthly_spend: f64,
    #[serde(rename = "baseCPL")]
    pub base_cpl: f64,
    pub conversion_rate: f64,
    pub cpl_penalty: f64,
    pub usage_days: u32,
    pub price_per_day: f64,
    pub retention: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            monthly_spend: 100_000.0,
            base_cpl: 10.0,
            conversion_rate: 33.0,
            cpl_penalty: 10.0,
            usage_days: 10,
            price_per_day: 5.0,
            retention: 85.0,
        }
    }
}

impl ParameterSet {
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::MonthlySpend => self.monthly_spend,
            Field::BaseCpl => self.base_cpl,
            Field::ConversionRate => self.conversion_rate,
            Field::CplPenalty => self.cpl_penalty,
            Field::UsageDays => f64::from(self.usage_days),
            Field::PricePerDay => self.price_per_day,
            Field::Retention => self.retention,
        }
    }

    /// Rejects non-finite and out-of-domain values. Step granularity is not checked.
    pub fn validate(&self) -> Result<(), DomainError> {
        for field in Field::ALL {
            let value = self.value(field);
            if !value.is_finite() {
                return Err(DomainError::NonFinite { field });
            }
            let domain = field.domain();
            if value < domain.min || value > domain.max {
                return Err(DomainError::OutOfRange {
                    field,
                    value,
                    min: domain.min,
                    max: domain.max,
                });
            }
        }
        Ok(())
    }

    /// Revenue earned from one active user over a month.
    pub fn monthly_arpu(&self) -> f64 {
        f64::from(self.usage_days) * self.price_per_day
    }
}

/// A partial update, e.g. a single slider move. Unset fields keep their value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterPatch {
    pub monthly_spend: Option<f64>,
    #[serde(rename = "baseCPL", alias = "baseCpl")]
    pub base_cpl: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub cpl_penalty: Option<f64>,
    pub usage_days: Option<u32>,
    pub price_per_day: Option<f64>,
    pub retention: Option<f64>,
}

impl ParameterPatch {
    pub fn apply_to(&self, base: &ParameterSet) -> ParameterSet {
        let mut params = *base;
        if let Some(v) = self.monthly_spend {
            params.monthly_spend = v;
        }
        if let Some(v) = self.base_cpl {
            params.base_cpl = v;
        }
        if let Some(v) = self.conversion_rate {
            params.conversion_rate = v;
        }
        if let Some(v) = self.cpl_penalty {
            params.cpl_penalty = v;
        }
        if let Some(v) = self.usage_days {
            params.usage_days = v;
        }
        if let Some(v) = self.price_per_day {
            params.price_per_day = v;
        }
        if let Some(v) = self.retention {
            params.retention = v;
        }
        params
    }
}

/// Process-wide economics that the sliders never touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicConstants {
    pub step_size: f64,
    pub agency_fee: f64,
    pub transaction_fee_rate: f64,
    pub base_spend_anchor: f64,
}

impl Default for EconomicConstants {
    fn default() -> Self {
        Self {
            step_size: STEP_SIZE,
            agency_fee: FIXED_AGENCY_FEE,
            transaction_fee_rate: TRANSACTION_FEE_RATE,
            base_spend_anchor: BASE_SPEND_ANCHOR,
        }
    }
}

impl EconomicConstants {
    pub fn validate(&self) -> Result<(), ConstantsError> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(ConstantsError::StepSize(self.step_size));
        }
        if !self.agency_fee.is_finite() || self.agency_fee < 0.0 {
            return Err(ConstantsError::AgencyFee(self.agency_fee));
        }
        if !(0.0..=1.0).contains(&self.transaction_fee_rate) {
            return Err(ConstantsError::TransactionFeeRate(
                self.transaction_fee_rate,
            ));
        }
        if !self.base_spend_anchor.is_finite() || self.base_spend_anchor < 0.0 {
            return Err(ConstantsError::BaseSpendAnchor(self.base_spend_anchor));
        }
        Ok(())
    }
}

/// Escalator and acquisition-cost figures derived from spend and CPL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acquisition {
    pub steps: u64,
    #[serde(rename = "adjustedCPL")]
    pub adjusted_cpl: f64,
    #[serde(rename = "nCAC")]
    pub ncac: f64,
    pub new_users_per_month: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRecord {
    pub month: u32,
    pub new_users: f64,
    pub total_users: f64,
    pub revenue: f64,
    pub spend: f64,
    pub agency_fee: f64,
    pub transaction_fee: f64,
    pub total_cost: f64,
    pub profit: f64,
    pub total_cost_digital: f64,
    pub profit_digital: f64,
}

/// Cost-accounting variant: with or without the flat agency fee.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Accounting {
    AllIn,
    Digital,
}

impl MonthRecord {
    pub fn profit_for(&self, accounting: Accounting) -> f64 {
        match accounting {
            Accounting::AllIn => self.profit,
            Accounting::Digital => self.profit_digital,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Horizon {
    ThirtyDay,
    NinetyDay,
    OneYear,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::ThirtyDay, Horizon::NinetyDay, Horizon::OneYear];

    pub fn months(self) -> usize {
        match self {
            Horizon::ThirtyDay => 1,
            Horizon::NinetyDay => 3,
            Horizon::OneYear => HORIZON_MONTHS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Horizon::ThirtyDay => "30-Day",
            Horizon::NinetyDay => "90-Day",
            Horizon::OneYear => "1-Year",
        }
    }
}

/// First month boundary at which the running profit turns non-negative.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Payback {
    Within { month: u32, days: u32 },
    NotWithinHorizon,
}

impl Payback {
    pub fn days(self) -> Option<u32> {
        match self {
            Payback::Within { days, .. } => Some(days),
            Payback::NotWithinHorizon => None,
        }
    }

    pub fn is_reached(self) -> bool {
        matches!(self, Payback::Within { .. })
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Within { days, .. } => write!(f, "{days} days"),
            Payback::NotWithinHorizon => f.write_str("No payback in 1 year"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub net_profit_30_day: f64,
    pub net_profit_90_day: f64,
    pub net_profit_1_year: f64,
    pub monthly_profit_30_day: f64,
    pub monthly_profit_90_day: f64,
    pub monthly_profit_1_year: f64,
    #[serde(rename = "digitalNCAC")]
    pub digital_ncac: f64,
    #[serde(rename = "allInNCAC")]
    pub all_in_ncac: f64,
    pub digital_payback: Payback,
    pub all_in_payback: Payback,
}

impl KpiSet {
    pub fn cumulative_profit(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::ThirtyDay => self.net_profit_30_day,
            Horizon::NinetyDay => self.net_profit_90_day,
            Horizon::OneYear => self.net_profit_1_year,
        }
    }

    pub fn monthly_profit(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::ThirtyDay => self.monthly_profit_30_day,
            Horizon::NinetyDay => self.monthly_profit_90_day,
            Horizon::OneYear => self.monthly_profit_1_year,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub steps: u64,
    #[serde(rename = "adjustedCPL")]
    pub adjusted_cpl: f64,
    #[serde(rename = "nCAC")]
    pub ncac: f64,
    pub new_users_per_month: f64,
    pub months: [MonthRecord; HORIZON_MONTHS],
    pub kpis: KpiSet,
}
