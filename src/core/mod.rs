mod engine;
mod error;
mod presets;
mod session;
mod types;

pub use engine::{
    cumulative_profit, derive_acquisition, escalator_steps, payback_period, project_month,
    run_projection, snapshot_profit, steady_state_users, user_base_series,
};
pub use error::{ConstantsError, DomainError};
pub use presets::Preset;
pub use session::{Completion, Session, Submission};
pub use types::{
    Accounting, Acquisition, BASE_SPEND_ANCHOR, DAYS_PER_MONTH, EconomicConstants,
    FIXED_AGENCY_FEE, Field, FieldDomain, FieldFormat, HORIZON_MONTHS, Horizon, KpiSet,
    MonthRecord, ParameterPatch, ParameterSet, Payback, ProjectionResult, STEP_SIZE,
    TRANSACTION_FEE_RATE,
};
