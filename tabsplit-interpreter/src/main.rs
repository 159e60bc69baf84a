use std::{fs, path::PathBuf, process};

use anyhow::{Context, Result, bail};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tabsplit_application::{
    BillQuery, BillSelection, HistoryService, Ledger, PersonBalance, SettlementError,
    SettlementResult, SettlementService, SettlementWarning,
};
use tabsplit_domain::{
    Bill, BillFilter, BillOrder, DatePreset, Money, ParticipantId, Roster, Transfer,
};
use tabsplit_presentation::{
    SettlementPresenter, SummaryPresenter, bills_csv, bills_json, strings, transfers_csv,
};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;
const EXIT_UNBALANCED: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "tabsplit")]
#[command(about = "Settle shared bills with as few transfers as practical")]
struct Cli {
    /// Ledger file (JSON) holding participants and bills.
    ledger: PathBuf,

    /// Only use these bills; repeat for several. Defaults to every bill.
    #[arg(long = "bill", value_name = "ID", global = true)]
    bills: Vec<String>,

    #[arg(long, value_enum, env = "TABSPLIT_FORMAT", default_value = "text", global = true)]
    format: OutputFormat,

    /// Refuse to settle when balances do not net to zero.
    #[arg(long)]
    strict: bool,

    /// Reference date for relative periods and exports. Defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD", global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Settle the selected bills (the default).
    Settle,
    /// Spending by category, month and participant.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List matching bills.
    Bills {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "newest")]
        sort: SortOrder,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write matching bills as a JSON backup, whatever the output format.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    category: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "period")]
    from: Option<NaiveDate>,

    #[arg(long, value_name = "YYYY-MM-DD", conflicts_with = "period")]
    to: Option<NaiveDate>,

    #[arg(long, value_enum)]
    period: Option<Period>,

    /// Only bills from the last DAYS days.
    #[arg(long, value_name = "DAYS", conflicts_with_all = ["from", "to", "period"])]
    recent: Option<u64>,

    /// Bills this participant took part in.
    #[arg(long, value_name = "ID")]
    participant: Option<String>,

    /// Matches name, description, category or amount.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self, today: NaiveDate) -> Result<BillFilter> {
        let (from, to) = match (self.period, self.recent) {
            (Some(period), _) => {
                let (from, to) = DatePreset::from(period)
                    .range(today)
                    .with_context(|| format!("no calendar range for {period:?} around {today}"))?;
                (Some(from), Some(to))
            }
            (None, Some(days)) => {
                let from = today
                    .checked_sub_days(Days::new(days))
                    .with_context(|| format!("{days} days before {today} is out of range"))?;
                (Some(from), Some(today))
            }
            (None, None) => (self.from, self.to),
        };

        let mut filter = BillFilter::new().between(from, to);
        if let Some(category) = &self.category {
            filter = filter.category(category.as_str());
        }
        if let Some(participant) = &self.participant {
            filter = filter.participant(ParticipantId::from(participant.as_str()));
        }
        if let Some(term) = &self.search {
            filter = filter.search(term);
        }
        Ok(filter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Period {
    Today,
    Week,
    Month,
    LastMonth,
    Year,
}

impl From<Period> for DatePreset {
    fn from(period: Period) -> Self {
        match period {
            Period::Today => Self::Today,
            Period::Week => Self::Week,
            Period::Month => Self::Month,
            Period::LastMonth => Self::LastMonth,
            Period::Year => Self::Year,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SortOrder {
    Newest,
    Oldest,
    AmountHigh,
    AmountLow,
    Name,
}

impl From<SortOrder> for BillOrder {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Newest => Self::Newest,
            SortOrder::Oldest => Self::Oldest,
            SortOrder::AmountHigh => Self::AmountHigh,
            SortOrder::AmountLow => Self::AmountLow,
            SortOrder::Name => Self::Name,
        }
    }
}

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            process::exit(EXIT_FAILURE);
        }
    };

    match load_ledger(&cli).and_then(|ledger| run(&cli, &ledger)) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(exit_code(&err));
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the ledger, upgrading legacy records. Bills that would fail the
/// pre-save check are reported but still loaded.
fn load_ledger(cli: &Cli) -> Result<Ledger> {
    let source = fs::read_to_string(&cli.ledger)
        .with_context(|| format!("failed to read '{}'", cli.ledger.display()))?;
    let mut ledger: Ledger = serde_json::from_str(&source)
        .with_context(|| format!("'{}' is not a valid ledger", cli.ledger.display()))?;

    let migrated = ledger.migrate();
    if migrated > 0 {
        tracing::info!(migrated, "Legacy bills upgraded");
    }
    if let Err(err) = ledger.validate() {
        let err = anyhow::Error::new(err);
        tracing::warn!(error = %format!("{err:#}"), "Ledger has inconsistent bills");
    }
    Ok(ledger)
}

fn run(cli: &Cli, ledger: &Ledger) -> Result<String> {
    let roster = ledger.roster()?;
    let selection = if cli.bills.is_empty() {
        BillSelection::All
    } else {
        BillSelection::Ids(cli.bills.clone())
    };
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let history = HistoryService::default();

    match &cli.command {
        None | Some(Command::Settle) => settle(cli, ledger, &roster, &selection),
        Some(Command::Summary { filter }) => {
            let query = BillQuery {
                selection,
                filter: filter.to_filter(today)?,
                ..BillQuery::default()
            };
            let summary = history.summary(&roster, ledger, &query)?;
            match cli.format {
                OutputFormat::Text => {
                    let view = SummaryPresenter::render(&summary, &roster);
                    let mut sections = vec![format!("{}\n", view.overview)];
                    sections.extend(view.category_table);
                    sections.extend(view.trend_table);
                    sections.push(view.participant_table);
                    Ok(sections.join("\n"))
                }
                OutputFormat::Json => pretty_json(&summary),
                OutputFormat::Csv => bail!("summaries have no CSV form; use --format text or json"),
            }
        }
        Some(Command::Bills {
            filter,
            sort,
            limit,
        }) => {
            let query = BillQuery {
                selection,
                filter: filter.to_filter(today)?,
                order: BillOrder::from(*sort),
                limit: *limit,
            };
            let bills = history.bills(ledger, &query)?;
            match cli.format {
                OutputFormat::Text if bills.is_empty() => Ok(format!("{}\n", strings::NO_BILLS)),
                OutputFormat::Text => Ok(SummaryPresenter::build_bill_table(&bills)),
                OutputFormat::Json => Ok(bills_json(bills, today)?),
                OutputFormat::Csv => Ok(bills_csv(bills, &roster)?),
            }
        }
        Some(Command::Export { filter }) => {
            let query = BillQuery {
                selection,
                filter: filter.to_filter(today)?,
                order: BillOrder::Oldest,
                ..BillQuery::default()
            };
            let bills: Vec<&Bill> = history.bills(ledger, &query)?;
            tracing::info!(count = bills.len(), "Exporting bills");
            Ok(bills_json(bills, today)?)
        }
    }
}

fn settle(cli: &Cli, ledger: &Ledger, roster: &Roster, selection: &BillSelection) -> Result<String> {
    let service = SettlementService::default();
    let result = if cli.strict {
        service.compute_strict(roster, ledger, selection)?
    } else {
        service.compute(roster, ledger, selection)?
    };

    report_problems(&result);
    tracing::debug!(
        bills = ledger.bills.len(),
        transfers = result.transfers.len(),
        "Settlement computed"
    );

    render(&result, roster, cli.format)
}

fn report_problems(result: &SettlementResult) {
    if let Some(SettlementWarning::NonZeroAggregate { total }) = &result.warning {
        tracing::warn!(total = %total, "Balances do not net to zero");
    }
    for residual in &result.residuals {
        tracing::warn!(
            participant = %residual.id,
            balance = %residual.balance,
            "Balance left unresolved"
        );
    }
}

fn render(result: &SettlementResult, roster: &Roster, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, roster)),
        OutputFormat::Json => pretty_json(&JsonReport::from(result)),
        OutputFormat::Csv => Ok(transfers_csv(&result.transfers, roster)?),
    }
}

fn pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn render_text(result: &SettlementResult, roster: &Roster) -> String {
    let view = SettlementPresenter::render_with_participants(result, roster);

    let mut sections = vec![view.balance_table];
    sections.push(
        view.transfer_table
            .unwrap_or_else(|| format!("{}\n", strings::ALL_SETTLED)),
    );
    sections.extend(view.residual_table);
    sections.extend(view.warning.map(|warning| format!("{warning}\n")));
    sections.join("\n")
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SettlementError>() {
        Some(SettlementError::NonZeroAggregate { .. }) => EXIT_UNBALANCED,
        _ => EXIT_FAILURE,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    balances: Vec<JsonBalance<'a>>,
    transfers: &'a [Transfer],
    residuals: Vec<JsonBalance<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    non_zero_aggregate: Option<Money>,
}

#[derive(Serialize)]
struct JsonBalance<'a> {
    id: &'a ParticipantId,
    balance: Money,
}

impl<'a> From<&'a SettlementResult> for JsonReport<'a> {
    fn from(result: &'a SettlementResult) -> Self {
        Self {
            balances: json_balances(&result.balances),
            transfers: &result.transfers,
            residuals: json_balances(&result.residuals),
            non_zero_aggregate: result.warning.as_ref().map(|warning| match warning {
                SettlementWarning::NonZeroAggregate { total } => *total,
            }),
        }
    }
}

fn json_balances(balances: &[PersonBalance]) -> Vec<JsonBalance<'_>> {
    balances
        .iter()
        .map(|person| JsonBalance {
            id: &person.id,
            balance: person.balance,
        })
        .collect()
}
