//! hrdesk command line client.
//!
//! Talks to the HR self-service backend configured in
//! `~/.config/hrdesk/config.toml` (or `--config`), overridable with
//! `HRDESK__*` environment variables.
//!
//! # Environment Variables
//!
//! - `HRDESK_TOKEN`: Bearer token for the session. Required for every command
//!   except `days`.
//! - `HRDESK_ENV`: `production` switches to JSON file logging.
//! - `HRDESK_LOG_LEVEL` / `RUST_LOG`: Log filter (default: warn).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hrdesk_client::logging;
use hrdesk_client::{BoardScope, FileCache, HrClient, LeaveBoard};
use hrdesk_core::files::infer_mime_type;
use hrdesk_core::{
    compute_leave_days, ApprovalAction, Config, DateRange, DayDuration, FileRef, LeaveDraft,
    LeaveType, OdDraft, RecordView, Session, StatusFilter,
};
use tracing::debug;

/// Environment variable names
mod env_vars {
    pub const TOKEN: &str = "HRDESK_TOKEN";
    pub const ENV: &str = "HRDESK_ENV";
}

#[derive(Debug, Parser)]
#[command(name = "hrdesk", version, about = "HR self-service from the terminal")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List leave requests.
    Leaves {
        /// Show the department's requests (HOD only).
        #[arg(long)]
        as_hod: bool,
        /// Only show requests in this state.
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        status: FilterArg,
    },
    /// List on-duty requests.
    Od {
        /// Show the department's requests (HOD only).
        #[arg(long)]
        as_hod: bool,
    },
    /// Approve a request as HOD.
    Approve(Decision),
    /// Reject a request as HOD.
    Reject(Decision),
    /// Count leave days for a date range.
    Days {
        /// First day (YYYY-MM-DD).
        from: NaiveDate,
        /// Last day (YYYY-MM-DD).
        to: Option<NaiveDate>,
        /// The first day is a half day.
        #[arg(long)]
        from_half: bool,
        /// The last day is a half day.
        #[arg(long)]
        to_half: bool,
    },
    /// Apply for leave.
    Apply(Box<ApplyArgs>),
    /// Raise an on-duty request.
    OdApply(OdArgs),
    /// Download an attachment, using the local cache when fresh.
    Download {
        /// Server file id.
        file_id: String,
    },
    /// Show notifications.
    Notifications {
        /// Mark all as read afterwards.
        #[arg(long)]
        mark_read: bool,
    },
}

#[derive(Debug, Args)]
struct Decision {
    /// Request id.
    id: String,
    /// Remarks for the applicant.
    #[arg(long, default_value = "")]
    remarks: String,
    /// The id is an on-duty request.
    #[arg(long)]
    od: bool,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Leave type, e.g. casual, medical, rh, lwp.
    #[arg(long = "type")]
    leave_type: LeaveType,
    /// First day (YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,
    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Take only half of the first day.
    #[arg(long, value_enum)]
    from_half: Option<SessionArg>,
    /// Take only half of the last day.
    #[arg(long, value_enum)]
    to_half: Option<SessionArg>,
    /// Reason for the leave.
    #[arg(long)]
    reason: String,
    /// Employee id taking charge.
    #[arg(long)]
    charge_to: String,
    /// Phone number during the leave.
    #[arg(long)]
    contact: String,
    /// Compensatory entry to redeem.
    #[arg(long)]
    comp_entry: Option<String>,
    /// Project the compensatory hours were worked on.
    #[arg(long)]
    project: Option<String>,
    /// Restricted holiday name.
    #[arg(long)]
    holiday: Option<String>,
    /// Medical certificate file.
    #[arg(long)]
    certificate: Option<PathBuf>,
    /// Supporting document, repeatable.
    #[arg(long = "attach")]
    attachments: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct OdArgs {
    /// First day (YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,
    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Start time (HH:MM).
    #[arg(long, value_parser = parse_time)]
    from_time: Option<NaiveTime>,
    /// End time (HH:MM).
    #[arg(long, value_parser = parse_time)]
    to_time: Option<NaiveTime>,
    /// Purpose of the duty.
    #[arg(long)]
    purpose: String,
    /// Place of visit.
    #[arg(long)]
    place: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SessionArg {
    Forenoon,
    Afternoon,
}

impl From<SessionArg> for Session {
    fn from(arg: SessionArg) -> Self {
        match arg {
            SessionArg::Forenoon => Self::Forenoon,
            SessionArg::Afternoon => Self::Afternoon,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Pending,
    Approved,
    Rejected,
}

impl From<FilterArg> for StatusFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => Self::All,
            FilterArg::Pending => Self::Pending,
            FilterArg::Approved => Self::Approved,
            FilterArg::Rejected => Self::Rejected,
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
}

fn duration_for(session: Option<SessionArg>) -> DayDuration {
    if session.is_some() {
        DayDuration::Half
    } else {
        DayDuration::Full
    }
}

/// Build a file reference for a local path, reading its size.
fn file_ref(path: &Path) -> Result<FileRef> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime = infer_mime_type(&name);
    Ok(FileRef::new(path.display().to_string(), name, metadata.len()).with_mime_type(mime))
}

async fn connect(config: &Config) -> Result<HrClient> {
    let client = HrClient::from_config(config).context("Failed to create HTTP client")?;
    let token = std::env::var(env_vars::TOKEN)
        .with_context(|| format!("{} is not set", env_vars::TOKEN))?;
    if token.trim().is_empty() {
        bail!("{} is empty", env_vars::TOKEN);
    }
    client.set_token(token).await;
    Ok(client)
}

async fn load_board(config: &Config, as_hod: bool) -> Result<LeaveBoard> {
    let scope = if as_hod {
        BoardScope::Department
    } else {
        BoardScope::Own
    };
    let mut board = LeaveBoard::new(connect(config).await?, scope).with_timezone(config.timezone());
    board.refresh().await;
    if let Some(message) = board.last_error() {
        bail!("{message}");
    }
    Ok(board)
}

fn print_leave(view: &RecordView<hrdesk_core::LeaveRecord>) {
    let leave = &view.record;
    let from = leave
        .dates
        .from
        .map(|d| d.to_string())
        .unwrap_or_default();
    let to = leave.dates.last_day().map(|d| d.to_string()).unwrap_or_default();
    println!(
        "{}  {:<20} {} .. {} ({} days)  {}{}",
        leave.id,
        leave.leave_type.as_str(),
        from,
        to,
        leave.days(),
        view.display,
        if view.can_act { "  [actionable]" } else { "" }
    );
}

fn apply_draft(args: &ApplyArgs, config: &Config) -> Result<LeaveDraft> {
    let max = config.uploads.max_file_bytes;
    let mut draft = LeaveDraft::new();
    draft.set_leave_type(args.leave_type);
    draft.set_from_date(Some(args.from));
    draft.set_to_date(args.to);
    draft.set_from_duration(duration_for(args.from_half));
    if let Some(session) = args.from_half {
        draft.set_from_session(session.into());
    }
    draft.set_to_duration(duration_for(args.to_half));
    if let Some(session) = args.to_half {
        draft.set_to_session(session.into());
    }
    draft.reason.clone_from(&args.reason);
    draft.charge_to_employee_id.clone_from(&args.charge_to);
    draft.emergency_contact.clone_from(&args.contact);
    draft.compensatory_entry_id.clone_from(&args.comp_entry);
    draft.project_details.clone_from(&args.project);
    draft.restricted_holiday.clone_from(&args.holiday);

    if let Some(path) = &args.certificate {
        draft.attach_medical_certificate(file_ref(path)?, max)?;
    }
    for path in &args.attachments {
        draft.add_supporting_document(file_ref(path)?, max)?;
    }
    Ok(draft)
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(base_url = %config.api.base_url, "Configuration loaded");

    match cli.command {
        Command::Days {
            from,
            to,
            from_half,
            to_half,
        } => {
            let range = DateRange {
                from: Some(from),
                to,
                from_duration: Some(if from_half { DayDuration::Half } else { DayDuration::Full }),
                from_session: None,
                to_duration: Some(if to_half { DayDuration::Half } else { DayDuration::Full }),
                to_session: None,
            };
            println!("{}", compute_leave_days(&range));
        }
        Command::Leaves { as_hod, status } => {
            let board = load_board(&config, as_hod).await?;
            for view in board.leaves_matching(status.into()) {
                print_leave(view);
            }
        }
        Command::Od { as_hod } => {
            let mut board = load_board(&config, as_hod).await?;
            board.refresh_od().await;
            if let Some(message) = board.last_error() {
                bail!("{message}");
            }
            for view in board.od() {
                let od = &view.record;
                println!(
                    "{}  {} .. {}  {} @ {}  {}",
                    od.id,
                    od.date_from,
                    od.date_to.unwrap_or(od.date_from),
                    od.purpose,
                    od.place_of_visit,
                    view.display
                );
            }
        }
        Command::Approve(decision) => decide(&config, decision, ApprovalAction::Approve).await?,
        Command::Reject(decision) => decide(&config, decision, ApprovalAction::Reject).await?,
        Command::Apply(args) => {
            let mut draft = apply_draft(&args, &config)?;
            let days = draft.days();
            let mut board = load_board(&config, false).await?;
            board
                .submit_leave(&mut draft, Utc::now())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Leave applied for {days} days");
        }
        Command::OdApply(args) => {
            let draft = OdDraft {
                from: Some(args.from),
                to: args.to,
                from_time: args.from_time,
                to_time: args.to_time,
                purpose: args.purpose,
                place_of_visit: args.place,
            };
            let mut board = LeaveBoard::new(connect(&config).await?, BoardScope::Own)
                .with_timezone(config.timezone());
            board
                .submit_od(&draft, Utc::now())
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("On-duty request submitted");
        }
        Command::Download { file_id } => {
            let client = connect(&config).await?;
            let cache = FileCache::from_config(&config)?;
            let file = cache
                .get_or_fetch(&client, &file_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!(
                "{}{}",
                file.path.display(),
                if file.from_cache { " (cached)" } else { "" }
            );
        }
        Command::Notifications { mark_read } => {
            let client = connect(&config).await?;
            let items = client
                .notifications()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if items.is_empty() {
                println!("No notifications");
            }
            for n in &items {
                println!("{} {}", if n.read { " " } else { "*" }, n.message);
            }
            if mark_read && !items.is_empty() {
                client
                    .mark_notifications_read()
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            }
        }
    }
    Ok(())
}

async fn decide(config: &Config, decision: Decision, action: ApprovalAction) -> Result<()> {
    let mut board = load_board(config, true).await?;
    let result = if decision.od {
        board.refresh_od().await;
        board
            .decide_od(&decision.id, action, &decision.remarks)
            .await
    } else {
        board
            .decide_leave(&decision.id, action, &decision.remarks)
            .await
    };
    result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let verb = match action {
        ApprovalAction::Approve => "approved",
        ApprovalAction::Reject => "rejected",
    };
    println!("{} {verb}", decision.id);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let is_production = std::env::var(env_vars::ENV).is_ok_and(|v| v == "production");
    logging::init(is_production)?;

    run(cli).await
}
