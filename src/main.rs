use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use fintrack::api::dto::TransactionFilter;
use fintrack::forms::{BillForm, ContributionForm, LoginForm, RegisterForm, TransactionForm, ValidationErrors};
use fintrack::models::{parse_date, EntryType, StatsPeriod};
use fintrack::shell::{build_app, serve, AppState};
use fintrack::{stats, telemetry, AppConfig, FinanceClient, SessionManager};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Personal finance dashboard: web shell and terminal client", long_about = None)]
#[command(version)]
struct Cli {
    /// Token file used by the terminal client
    #[arg(long, global = true, env = "TOKEN_FILE")]
    token_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web shell (default)
    Serve,

    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and store the session token
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINTRACK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Dashboard summary
    Dashboard,

    /// Income and expense statistics
    Stats {
        #[arg(long, value_enum, default_value = "month")]
        period: PeriodArg,
    },

    /// List transactions
    Transactions {
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        category: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Record a transaction
    AddTransaction {
        #[arg(long)]
        amount: String,
        #[arg(long = "type", value_enum)]
        kind: KindArg,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// List bills with totals
    Bills {
        /// Window for the due-soon count, in days
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(i64).range(0..=stats::MAX_SOON_DAYS))]
        soon_days: i64,
    },

    /// Add a bill
    AddBill {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: String,
        /// YYYY-MM-DD
        #[arg(long)]
        due: String,
        /// ONCE, WEEKLY, MONTHLY, QUARTERLY or YEARLY
        #[arg(long, default_value = "MONTHLY")]
        frequency: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        autopay: bool,
    },

    /// Mark a bill as paid
    PayBill { id: String },

    /// List savings goals with progress
    Goals,

    /// Contribute to a savings goal
    Contribute {
        id: String,
        #[arg(long)]
        amount: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Contribution history across goals
    History,

    /// Budget plan for a month
    Plan {
        /// YYYY-MM
        month: String,
    },

    /// List categories
    Categories {
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
    Year,
}

impl From<PeriodArg> for StatsPeriod {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Week => StatsPeriod::Week,
            PeriodArg::Month => StatsPeriod::Month,
            PeriodArg::Year => StatsPeriod::Year,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for EntryType {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Income => EntryType::Income,
            KindArg::Expense => EntryType::Expense,
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn rejected(errors: ValidationErrors) -> anyhow::Error {
    anyhow!("invalid input: {errors}")
}

fn date_arg(raw: Option<String>, name: &str) -> Result<Option<time::Date>> {
    raw.map(|s| parse_date(&s).ok_or_else(|| anyhow!("--{name} must be YYYY-MM-DD")))
        .transpose()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.token_file {
        config.token_file = Some(path);
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = AppState::from_config(config.clone())?;
            serve(build_app(state), &config).await
        }
        command => {
            let session = SessionManager::file(config.token_file()?);
            let client = FinanceClient::from_config(&config, session)?;
            run(&client, command).await
        }
    }
}

async fn run(client: &FinanceClient, command: Commands) -> Result<()> {
    match command {
        Commands::Serve => Err(anyhow!("`serve` runs the web shell, not a client command")),
        Commands::Login { email, password } => {
            let form = LoginForm {
                email,
                password,
                redirect: None,
            };
            let res = client.login(&form.validate().map_err(rejected)?).await?;
            print(&res.user)
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let form = RegisterForm {
                name,
                email,
                confirm_password: password.clone(),
                password,
                redirect: None,
            };
            let res = client.register(&form.validate().map_err(rejected)?).await?;
            print(&res.user)
        }
        Commands::Logout => {
            client.logout()?;
            eprintln!("signed out");
            Ok(())
        }
        Commands::Whoami => {
            if !client.session().is_authenticated() {
                return Err(anyhow!("not signed in; run `fintrack login`"));
            }
            print(&client.me().await?)
        }
        Commands::Dashboard => print(&client.dashboard().await?),
        Commands::Stats { period } => {
            let summary = client.statistics(period.into()).await?;
            print(&serde_json::json!({
                "summary": summary,
                "savingsRate": stats::savings_rate(summary.total_income, summary.total_expenses),
                "categoryShares": stats::category_shares(&summary),
            }))
        }
        Commands::Transactions {
            kind,
            category,
            from,
            to,
            search,
            page,
            limit,
        } => {
            let filter = TransactionFilter {
                kind: kind.map(Into::into),
                category_id: category,
                start_date: date_arg(from, "from")?,
                end_date: date_arg(to, "to")?,
                search,
                page,
                limit,
            };
            print(&client.transactions(&filter).await?)
        }
        Commands::AddTransaction {
            amount,
            kind,
            date,
            category,
            description,
        } => {
            let form = TransactionForm {
                amount,
                kind: EntryType::from(kind).as_str().to_string(),
                date,
                category_id: category,
                description,
                notes: None,
            };
            let payload = form.validate().map_err(rejected)?;
            print(&client.create_transaction(&payload).await?)
        }
        Commands::Bills { soon_days } => {
            let bills = client.bills().await?;
            let today = time::OffsetDateTime::now_utc().date();
            let totals = stats::bill_totals(&bills, today, soon_days);
            print(&serde_json::json!({
                "bills": bills,
                "totalDue": totals.total_due,
                "unpaidTotal": totals.unpaid_total,
                "overdue": totals.overdue,
                "dueSoon": totals.due_soon,
            }))
        }
        Commands::AddBill {
            name,
            amount,
            due,
            frequency,
            category,
            autopay,
        } => {
            let form = BillForm {
                name,
                amount,
                due_date: due,
                frequency,
                category_id: category,
                autopay: autopay.then(|| "on".to_string()),
                notes: None,
            };
            let payload = form.validate().map_err(rejected)?;
            print(&client.create_bill(&payload).await?)
        }
        Commands::PayBill { id } => print(&client.pay_bill(&id).await?),
        Commands::Goals => {
            let goals = client.goals().await?;
            let rows: Vec<_> = goals
                .iter()
                .map(|g| {
                    serde_json::json!({
                        "goal": g,
                        "progress": stats::goal_progress(g),
                        "remaining": stats::goal_remaining(g),
                    })
                })
                .collect();
            print(&rows)
        }
        Commands::Contribute { id, amount, date } => {
            let form = ContributionForm {
                amount,
                date,
                notes: None,
            };
            let payload = form.validate().map_err(rejected)?;
            print(&client.contribute_to_goal(&id, &payload).await?)
        }
        Commands::History => {
            let history = client.goal_history().await?;
            let summary = stats::goal_history_summary(&history);
            print(&serde_json::json!({
                "contributions": history,
                "total": summary.total,
                "count": summary.count,
                "average": summary.average,
                "byGoal": summary.by_goal,
            }))
        }
        Commands::Plan { month } => {
            let items = client
                .plan_items(&month)
                .await
                .with_context(|| format!("loading plan for {month}"))?;
            let summary = stats::plan_summary(&items);
            print(&serde_json::json!({
                "items": items,
                "planned": summary.planned,
                "actual": summary.actual,
                "remaining": summary.remaining,
                "percentUsed": summary.percent_used,
                "overBudget": summary.over_budget,
            }))
        }
        Commands::Categories { kind } => print(&client.categories(kind.map(Into::into)).await?),
    }
}
