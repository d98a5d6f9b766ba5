use tracing::debug;

use super::error::{ConstantsError, DomainError};
use super::types::{
    Accounting, Acquisition, DAYS_PER_MONTH, EconomicConstants, Field, HORIZON_MONTHS, Horizon,
    KpiSet, MonthRecord, ParameterSet, Payback, ProjectionResult,
};

/// Evaluates one scenario end to end. Every call recomputes the full 12-month
/// series from scratch; nothing is cached between calls.
pub fn run_projection(
    params: &ParameterSet,
    constants: &EconomicConstants,
) -> Result<ProjectionResult, DomainError> {
    params.validate()?;
    constants.validate()?;

    let acquisition = derive_acquisition(params, constants)?;
    let users = user_base_series(acquisition.new_users_per_month, params.retention);
    let months: [MonthRecord; HORIZON_MONTHS] = std::array::from_fn(|idx| {
        project_month(
            idx as u32 + 1,
            users[idx],
            acquisition.new_users_per_month,
            params,
            constants,
        )
    });
    let kpis = aggregate_kpis(&months, params, constants, acquisition.new_users_per_month);

    debug!(
        steps = acquisition.steps,
        adjusted_cpl = acquisition.adjusted_cpl,
        ncac = acquisition.ncac,
        new_users_per_month = acquisition.new_users_per_month,
        net_profit_1_year = kpis.net_profit_1_year,
        "projection evaluated"
    );

    Ok(ProjectionResult {
        steps: acquisition.steps,
        adjusted_cpl: acquisition.adjusted_cpl,
        ncac: acquisition.ncac,
        new_users_per_month: acquisition.new_users_per_month,
        months,
        kpis,
    })
}

/// Number of whole spend increments above the anchor. Fails rather than
/// saturating when the count does not fit in a `u64`.
pub fn escalator_steps(
    monthly_spend: f64,
    constants: &EconomicConstants,
) -> Result<u64, ConstantsError> {
    let steps = ((monthly_spend - constants.base_spend_anchor).max(0.0) / constants.step_size)
        .floor();
    if !steps.is_finite() || steps >= u64::MAX as f64 {
        return Err(ConstantsError::StepCountOverflow {
            monthly_spend,
            step_size: constants.step_size,
        });
    }
    Ok(steps as u64)
}

/// Escalated CPL, nCAC and the steady monthly inflow of paying users.
///
/// Does not re-run domain validation, but still refuses inputs that would
/// divide by zero.
pub fn derive_acquisition(
    params: &ParameterSet,
    constants: &EconomicConstants,
) -> Result<Acquisition, DomainError> {
    if params.conversion_rate == 0.0 {
        return Err(DomainError::DivisionByZero {
            field: Field::ConversionRate,
            value: params.conversion_rate,
        });
    }

    let steps = escalator_steps(params.monthly_spend, constants)?;
    // Linear: each step adds the base penalty again, no penalty-on-penalty.
    let adjusted_cpl = params.base_cpl * (1.0 + (params.cpl_penalty / 100.0) * steps as f64);
    let ncac = adjusted_cpl / (params.conversion_rate / 100.0);
    if ncac == 0.0 {
        return Err(DomainError::DivisionByZero {
            field: Field::BaseCpl,
            value: params.base_cpl,
        });
    }

    Ok(Acquisition {
        steps,
        adjusted_cpl,
        ncac,
        new_users_per_month: params.monthly_spend / ncac,
    })
}

/// `total(i) = total(i-1) * retention + inflow`, starting from zero users.
/// Carries full precision across all months.
pub fn user_base_series(new_users_per_month: f64, retention_pct: f64) -> [f64; HORIZON_MONTHS] {
    let retained_share = retention_pct / 100.0;
    let mut series = [0.0; HORIZON_MONTHS];
    let mut previous = 0.0;
    for slot in series.iter_mut() {
        previous = previous * retained_share + new_users_per_month;
        *slot = previous;
    }
    series
}

/// Both cost-accounting variants for one month, computed side by side.
pub fn project_month(
    month: u32,
    total_users: f64,
    new_users: f64,
    params: &ParameterSet,
    constants: &EconomicConstants,
) -> MonthRecord {
    let revenue = total_users * f64::from(params.usage_days) * params.price_per_day;
    let transaction_fee = revenue * constants.transaction_fee_rate;
    let spend = params.monthly_spend;
    let agency_fee = constants.agency_fee;

    let total_cost = spend + transaction_fee + agency_fee;
    let total_cost_digital = spend + transaction_fee;

    MonthRecord {
        month,
        new_users,
        total_users,
        revenue,
        spend,
        agency_fee,
        transaction_fee,
        total_cost,
        profit: revenue - total_cost,
        total_cost_digital,
        profit_digital: revenue - total_cost_digital,
    }
}

/// Sum of all-in profit over the first `horizon` months.
pub fn cumulative_profit(months: &[MonthRecord], horizon: Horizon) -> f64 {
    months
        .iter()
        .take(horizon.months())
        .map(|m| m.profit)
        .sum()
}

/// All-in profit of the horizon's last month alone. Takes the full series so
/// every horizon is always in range.
pub fn snapshot_profit(months: &[MonthRecord; HORIZON_MONTHS], horizon: Horizon) -> f64 {
    months[horizon.months() - 1].profit
}

/// First month whose running profit sum is non-negative. Reports the month
/// boundary in whole 30-day months, never a fractional day.
pub fn payback_period(months: &[MonthRecord], accounting: Accounting) -> Payback {
    let mut cumulative = 0.0;
    for record in months.iter().take(HORIZON_MONTHS) {
        cumulative += record.profit_for(accounting);
        if cumulative >= 0.0 {
            return Payback::Within {
                month: record.month,
                days: record.month * DAYS_PER_MONTH,
            };
        }
    }
    Payback::NotWithinHorizon
}

fn aggregate_kpis(
    months: &[MonthRecord; HORIZON_MONTHS],
    params: &ParameterSet,
    constants: &EconomicConstants,
    new_users_per_month: f64,
) -> KpiSet {
    // Realized spend per acquired user; deliberately independent of the
    // CPL/conversion derivation of nCAC.
    let digital_ncac = params.monthly_spend / new_users_per_month;
    let all_in_ncac = (params.monthly_spend + constants.agency_fee) / new_users_per_month;

    KpiSet {
        net_profit_30_day: cumulative_profit(months, Horizon::ThirtyDay),
        net_profit_90_day: cumulative_profit(months, Horizon::NinetyDay),
        net_profit_1_year: cumulative_profit(months, Horizon::OneYear),
        monthly_profit_30_day: snapshot_profit(months, Horizon::ThirtyDay),
        monthly_profit_90_day: snapshot_profit(months, Horizon::NinetyDay),
        monthly_profit_1_year: snapshot_profit(months, Horizon::OneYear),
        digital_ncac,
        all_in_ncac,
        digital_payback: payback_period(months, Accounting::Digital),
        all_in_payback: payback_period(months, Accounting::AllIn),
    }
}

/// Long-run user base `inflow / (1 - retention)`. Undefined at 100% retention,
/// where the base grows linearly without bound.
pub fn steady_state_users(
    params: &ParameterSet,
    constants: &EconomicConstants,
) -> Result<f64, DomainError> {
    params.validate()?;
    constants.validate()?;
    let acquisition = derive_acquisition(params, constants)?;
    let churn_share = 1.0 - params.retention / 100.0;
    if churn_share == 0.0 {
        return Err(DomainError::DivisionByZero {
            field: Field::Retention,
            value: params.retention,
        });
    }
    Ok(acquisition.new_users_per_month / churn_share)
}
