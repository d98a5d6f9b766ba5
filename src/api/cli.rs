use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::{
    BASE_SPEND_ANCHOR, DomainError, EconomicConstants, FIXED_AGENCY_FEE, Field, ParameterPatch,
    ParameterSet, Preset, STEP_SIZE, TRANSACTION_FEE_RATE, run_projection,
};
use crate::report::{
    DisplayWindow, ProfitView, format_currency, render_dashboard, write_csv,
};

use super::{ApiOptions, build_projection_response};

#[derive(Parser, Debug)]
#[command(
    name = "growth-sim",
    version,
    about = "12-month customer growth and P&L simulator for paid acquisition"
)]
pub struct Cli {
    #[command(flatten)]
    pub constants: ConstantsArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single projection and print the dashboard.
    Project(ProjectArgs),
    /// List the built-in scenarios with their headline results.
    Presets,
    /// Serve the JSON API.
    Serve {
        #[arg(long, env = "GROWTH_SIM_PORT", default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ConstantsArgs {
    #[arg(
        long,
        global = true,
        default_value_t = STEP_SIZE,
        help = "Spend increment that adds one CPL penalty step"
    )]
    pub step_size: f64,
    #[arg(
        long,
        global = true,
        default_value_t = FIXED_AGENCY_FEE,
        help = "Fixed monthly agency fee"
    )]
    pub agency_fee: f64,
    #[arg(
        long,
        global = true,
        default_value_t = TRANSACTION_FEE_RATE * 100.0,
        help = "Transaction fee in percent of revenue, e.g. 10"
    )]
    pub transaction_fee_rate: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliProfitView {
    Cumulative,
    Monthly,
}

impl From<CliProfitView> for ProfitView {
    fn from(value: CliProfitView) -> Self {
        match value {
            CliProfitView::Cumulative => ProfitView::Cumulative,
            CliProfitView::Monthly => ProfitView::Monthly,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, help = "Start from a scenario: conservative, test-success, aggressive-scale")]
    pub preset: Option<Preset>,

    #[arg(long, help = "Monthly ad spend")]
    pub monthly_spend: Option<f64>,
    #[arg(long, help = "Base cost per lead before escalation")]
    pub base_cpl: Option<f64>,
    #[arg(long, help = "Lead-to-customer conversion in percent")]
    pub conversion_rate: Option<f64>,
    #[arg(long, help = "CPL increase per escalation step in percent")]
    pub cpl_penalty: Option<f64>,
    #[arg(long, help = "Paid days per user per month")]
    pub usage_days: Option<u32>,
    #[arg(long, help = "Revenue per paid day")]
    pub price_per_day: Option<f64>,
    #[arg(long, help = "Month-over-month retention in percent")]
    pub retention: Option<f64>,

    #[arg(long, default_value_t = 3, help = "Months shown in the P&L table: 3 or 12")]
    pub months: u32,
    #[arg(long, value_enum, default_value_t = CliProfitView::Cumulative)]
    pub view: CliProfitView,
    #[arg(long, help = "Write the displayed months as CSV into this directory")]
    pub csv: Option<PathBuf>,
    #[arg(long, help = "Print the full projection as JSON instead of the dashboard")]
    pub json: bool,
}

fn flag_name(field: Field) -> &'static str {
    match field {
        Field::MonthlySpend => "--monthly-spend",
        Field::BaseCpl => "--base-cpl",
        Field::ConversionRate => "--conversion-rate",
        Field::CplPenalty => "--cpl-penalty",
        Field::UsageDays => "--usage-days",
        Field::PricePerDay => "--price-per-day",
        Field::Retention => "--retention",
    }
}

fn describe_error(err: &DomainError) -> String {
    match err {
        DomainError::OutOfRange {
            field,
            value,
            min,
            max,
        } => format!(
            "{} must be between {min} and {max}, got {value}",
            flag_name(*field)
        ),
        DomainError::NonFinite { field } => {
            format!("{} must be a finite number", flag_name(*field))
        }
        DomainError::DivisionByZero { field, value } => {
            format!("{} of {value} would divide by zero", flag_name(*field))
        }
        DomainError::Constants(inner) => inner.to_string(),
    }
}

pub fn build_constants(args: &ConstantsArgs) -> Result<EconomicConstants, String> {
    if !(0.0..=100.0).contains(&args.transaction_fee_rate) {
        return Err("--transaction-fee-rate must be between 0 and 100".to_string());
    }
    if !args.step_size.is_finite() || args.step_size <= 0.0 {
        return Err("--step-size must be > 0".to_string());
    }
    if !args.agency_fee.is_finite() || args.agency_fee < 0.0 {
        return Err("--agency-fee must be >= 0".to_string());
    }

    let constants = EconomicConstants {
        step_size: args.step_size,
        agency_fee: args.agency_fee,
        transaction_fee_rate: args.transaction_fee_rate / 100.0,
        base_spend_anchor: BASE_SPEND_ANCHOR,
    };
    constants.validate().map_err(|e| e.to_string())?;
    Ok(constants)
}

fn build_params(args: &ProjectArgs) -> Result<ParameterSet, String> {
    let base = args.preset.unwrap_or(Preset::DEFAULT).params();
    let patch = ParameterPatch {
        monthly_spend: args.monthly_spend,
        base_cpl: args.base_cpl,
        conversion_rate: args.conversion_rate,
        cpl_penalty: args.cpl_penalty,
        usage_days: args.usage_days,
        price_per_day: args.price_per_day,
        retention: args.retention,
    };
    let params = patch.apply_to(&base);
    params.validate().map_err(|e| describe_error(&e))?;
    Ok(params)
}

fn build_options(args: &ProjectArgs) -> Result<ApiOptions, String> {
    let window = DisplayWindow::from_months(args.months)
        .ok_or_else(|| format!("--months must be 3 or 12, got {}", args.months))?;
    Ok(ApiOptions {
        window,
        view: args.view.into(),
    })
}

pub fn run_project(args: &ProjectArgs, constants: &EconomicConstants) -> Result<(), String> {
    let params = build_params(args)?;
    let options = build_options(args)?;
    let result = run_projection(&params, constants).map_err(|e| describe_error(&e))?;

    if let Some(dir) = &args.csv {
        let today = chrono::Local::now().date_naive();
        let path = write_csv(dir, options.window.rows(&result), today)
            .map_err(|e| format!("Failed to write CSV into {}: {e}", dir.display()))?;
        eprintln!("Exported {}", path.display());
    }

    if args.json {
        let response = build_projection_response(&params, constants, result, options);
        let json = serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize projection: {e}"))?;
        println!("{json}");
    } else {
        print!(
            "{}",
            render_dashboard(&params, constants, &result, options.window, options.view)
        );
    }
    Ok(())
}

pub fn print_presets(constants: &EconomicConstants) -> Result<(), String> {
    for preset in Preset::ALL {
        let result = run_projection(&preset.params(), constants).map_err(|e| describe_error(&e))?;
        println!(
            "{:<18} {:<32} 1-year {:>14}  all-in payback {}",
            preset.key(),
            preset.description(),
            format_currency(result.kpis.net_profit_1_year),
            result.kpis.all_in_payback,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Payback;

    fn sample_cli(args: &[&str]) -> Cli {
        let mut argv = vec!["growth-sim"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid command line")
    }

    fn project_args(cli: Cli) -> ProjectArgs {
        match cli.command {
            Command::Project(args) => args,
            other => panic!("expected project command, got {other:?}"),
        }
    }

    #[test]
    fn constants_default_to_business_values() {
        let cli = sample_cli(&["presets"]);
        let constants = build_constants(&cli.constants).expect("valid constants");
        assert_eq!(constants, EconomicConstants::default());
    }

    #[test]
    fn build_constants_converts_percent_fee() {
        let cli = sample_cli(&["project", "--transaction-fee-rate", "12.5", "--agency-fee", "0"]);
        let constants = build_constants(&cli.constants).expect("valid constants");
        assert_eq!(constants.transaction_fee_rate, 0.125);
        assert_eq!(constants.agency_fee, 0.0);
    }

    #[test]
    fn build_constants_rejects_invalid_values() {
        let cli = sample_cli(&["project", "--step-size", "0"]);
        let err = build_constants(&cli.constants).expect_err("must reject");
        assert!(err.contains("--step-size"));

        let cli = sample_cli(&["project", "--transaction-fee-rate", "150"]);
        let err = build_constants(&cli.constants).expect_err("must reject");
        assert!(err.contains("--transaction-fee-rate"));
    }

    #[test]
    fn build_params_overlays_flags_on_preset() {
        let args = project_args(sample_cli(&[
            "project",
            "--preset",
            "aggressive-scale",
            "--retention",
            "80",
        ]));
        let params = build_params(&args).expect("valid params");
        assert_eq!(params.monthly_spend, 500_000.0);
        assert_eq!(params.retention, 80.0);
    }

    #[test]
    fn build_params_defaults_to_test_success() {
        let args = project_args(sample_cli(&["project"]));
        assert_eq!(build_params(&args).expect("valid"), ParameterSet::default());
    }

    #[test]
    fn build_params_rejects_out_of_range_with_flag_name() {
        let args = project_args(sample_cli(&["project", "--conversion-rate", "0"]));
        let err = build_params(&args).expect_err("must reject");
        assert!(err.contains("--conversion-rate"), "{err}");
    }

    #[test]
    fn build_options_rejects_unsupported_window() {
        let args = project_args(sample_cli(&["project", "--months", "6"]));
        let err = build_options(&args).expect_err("must reject");
        assert!(err.contains("--months"));

        let args = project_args(sample_cli(&["project", "--months", "12", "--view", "monthly"]));
        let options = build_options(&args).expect("valid");
        assert_eq!(options.window, DisplayWindow::FullYear);
        assert_eq!(options.view, ProfitView::Monthly);
    }

    #[test]
    fn unknown_preset_is_a_parse_error() {
        let argv = ["growth-sim", "project", "--preset", "moonshot"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn serve_port_defaults_to_8080() {
        match sample_cli(&["serve"]).command {
            Command::Serve { port } => assert!(port == 8080 || std::env::var("GROWTH_SIM_PORT").is_ok()),
            other => panic!("expected serve, got {other:?}"),
        }
        match sample_cli(&["serve", "--port", "9000"]).command {
            Command::Serve { port } => assert_eq!(port, 9000),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn project_writes_csv_for_displayed_window() {
        let dir = std::env::temp_dir().join(format!("growth-sim-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let dir_arg = dir.to_string_lossy().to_string();
        let args = project_args(sample_cli(&[
            "project", "--preset", "conservative", "--json", "--csv", &dir_arg,
        ]));

        run_project(&args, &EconomicConstants::default()).expect("project runs");

        let written = std::fs::read_dir(&dir)
            .expect("listable")
            .filter_map(Result::ok)
            .find(|entry| entry.file_name().to_string_lossy().starts_with("fibertime-growth-sim-"))
            .expect("csv written");
        let body = std::fs::read_to_string(written.path()).expect("readable");
        assert_eq!(body.lines().count(), 4);
        assert!(body.lines().nth(3).expect("month 3").ends_with(",-125"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn conservative_preset_reaches_all_in_payback_at_six_months() {
        let args = project_args(sample_cli(&["project", "--preset", "conservative"]));
        let params = build_params(&args).expect("valid");
        let result = run_projection(&params, &EconomicConstants::default()).expect("valid");
        assert_eq!(
            result.kpis.all_in_payback,
            Payback::Within {
                month: 6,
                days: 180
            }
        );
    }
}
