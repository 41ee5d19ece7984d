//! `tutti`: command-line client for the Tutti server.
//!
//! # Usage
//!
//! ```
//! tutti --url http://localhost:7070 members --active
//! tutti admit "Ada Lovelace" --role section_leader
//! tutti dues generate --period 2025-06
//! tutti events add 2025-06-04 "Sectionals"
//! tutti compliance
//! ```

mod client;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client::ApiClient;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tutti_core::{
  attendance::AttendanceStatus,
  event::EventKind,
  member::MemberRole,
  period::Period,
  report::BatchReport,
};
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tutti", about = "Command-line client for the Tutti server")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the tutti server (default: http://localhost:7070).
  #[arg(long, env = "TUTTI_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List members.
  Members {
    /// Only active members.
    #[arg(long)]
    active: bool,
  },
  /// Add a member, backfill this period's dues and seed upcoming rehearsals.
  Admit {
    name: String,
    #[arg(long, default_value = "musician")]
    role: MemberRole,
  },
  /// Dues records.
  #[command(subcommand)]
  Dues(DuesCommand),
  /// Attendance records.
  #[command(subcommand)]
  Attendance(AttendanceCommand),
  /// Rehearsals and concerts.
  #[command(subcommand)]
  Events(EventsCommand),
  /// Overdue-fee and repeated-absence counts.
  Compliance,
}

#[derive(Subcommand, Debug)]
enum DuesCommand {
  /// Create missing records for every member (default: current period).
  Generate {
    #[arg(long, value_name = "YYYY-MM")]
    period: Option<Period>,
  },
  /// Create the current period's record for one member.
  Backfill { member: Uuid },
  /// Mark a record paid.
  Pay {
    dues_id: Uuid,
    #[arg(long)]
    note: Option<String>,
    /// Mark unpaid instead.
    #[arg(long)]
    undo: bool,
  },
  /// List one member's records.
  List { member: Uuid },
}

#[derive(Subcommand, Debug)]
enum AttendanceCommand {
  /// Seed placeholders for one member at every upcoming rehearsal.
  SeedMember { member: Uuid },
  /// Seed placeholders for every member at one rehearsal.
  SeedEvent { event: Uuid },
  /// Record whether a member attended.
  Mark {
    attendance_id: Uuid,
    /// pending, present, absent or excused.
    status: AttendanceStatus,
  },
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
  /// List events, optionally from a date onwards.
  List {
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<NaiveDate>,
  },
  /// Add a rehearsal (or, with --concert, a concert).
  Add {
    date: NaiveDate,
    title: String,
    #[arg(long)]
    concert: bool,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:7070".to_string());

  let client = ApiClient::new(base_url)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Members { active } => {
      for m in client.list_members(active).await? {
        let mut flags = Vec::new();
        if !m.active {
          flags.push("inactive");
        }
        if m.suspended {
          flags.push("suspended");
        }
        println!("{}  {:<24} {:<14} {}", m.member_id, m.name, m.role, flags.join(","));
      }
    }

    Command::Admit { name, role } => {
      let admission = client.admit_member(&name, role).await?;
      println!("admitted {} ({})", admission.member.name, admission.member.member_id);
      match (&admission.dues.outcome, &admission.dues.error) {
        (_, Some(e)) => println!("  dues {}: FAILED {e}", admission.dues.period),
        (Some(outcome), None) => println!("  dues {}: {outcome:?}", admission.dues.period),
        (None, None) => {}
      }
      print_report("  attendance", &admission.attendance);
    }

    Command::Dues(DuesCommand::Generate { period }) => {
      let report = client.generate_dues(period).await?;
      print_report("dues", &report);
    }
    Command::Dues(DuesCommand::Backfill { member }) => {
      let backfill = client.backfill_dues(member).await?;
      match (backfill.outcome, backfill.error) {
        (_, Some(e)) => anyhow::bail!("backfill for {} failed: {e}", backfill.period),
        (outcome, None) => println!("dues {}: {outcome:?}", backfill.period),
      }
    }
    Command::Dues(DuesCommand::Pay { dues_id, note, undo }) => {
      let record = client.set_paid(dues_id, !undo, note).await?;
      let state = if record.paid { "paid" } else { "unpaid" };
      println!("{} {} {state}", record.member_id, record.period);
    }
    Command::Dues(DuesCommand::List { member }) => {
      for r in client.member_dues(member).await? {
        let state = if r.paid { "paid" } else { "unpaid" };
        println!(
          "{}  {}  {:<6} {}",
          r.dues_id,
          r.period,
          state,
          r.note.unwrap_or_default()
        );
      }
    }

    Command::Attendance(AttendanceCommand::SeedMember { member }) => {
      print_report("attendance", &client.seed_member(member).await?);
    }
    Command::Attendance(AttendanceCommand::SeedEvent { event }) => {
      print_report("attendance", &client.seed_event(event).await?);
    }
    Command::Attendance(AttendanceCommand::Mark { attendance_id, status }) => {
      let record = client.mark_attendance(attendance_id, status).await?;
      println!("{} {} {}", record.member_id, record.event_date, record.status);
    }

    Command::Events(EventsCommand::List { from }) => {
      for e in client.list_events(from).await? {
        println!("{}  {}  {:<9} {}", e.event_id, e.date, e.kind, e.title);
      }
    }
    Command::Events(EventsCommand::Add { date, title, concert }) => {
      let kind = if concert { EventKind::Concert } else { EventKind::Rehearsal };
      let scheduled = client.add_event(kind, date, &title).await?;
      println!("scheduled {} {} ({})", kind, date, scheduled.event.event_id);
      if scheduled.attendance.total() > 0 {
        print_report("  attendance", &scheduled.attendance);
      }
    }

    Command::Compliance => {
      let snapshot = client.compliance().await?;
      println!("as of {} (period {})", snapshot.as_of, snapshot.period);
      println!("  members with overdue fees:      {}", snapshot.overdue_fee_count);
      println!("  members with repeated absences: {}", snapshot.repeated_absence_count);
    }
  }
  Ok(())
}

fn print_report(label: &str, report: &BatchReport) {
  println!(
    "{label}: {} created, {} already present, {} cancelled, {} failed",
    report.created,
    report.skipped,
    report.cancelled,
    report.failures.len()
  );
  for f in &report.failures {
    println!("    {} after {} attempt(s): {}", f.subject_id, f.attempts, f.error);
  }
}
