//! CLI entry point for the gradebook.
//!
//! Records grades in the user's preferred grading scale, stores them in a
//! canonical scale on disk, and prints grade tables and averages.

use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use gradebook::book::{GradeBook, GradeEdit, NewGrade};
use gradebook::config::Config;
use gradebook::output::{render_grades, render_summary, to_json};
use gradebook::semester::{Semester, default_semester, load_semesters};
use gradebook::store::{CsvRecordStore, JsonPreferenceStore};
use gradebook::{DisplayLabel, GradeSystem, convert, grade_range};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uuid::Uuid;

type FileBook = GradeBook<CsvRecordStore, JsonPreferenceStore>;

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Track grades across grading scales", long_about = None)]
struct Cli {
    /// Directory holding grades.csv, preferences.json and semesters.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose grades and preferences to use
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("scope")
        .args(["semester", "current"])
        .multiple(false)
))]
struct Scope {
    /// Only include grades from the named semester
    #[arg(long)]
    semester: Option<String>,

    /// Only include grades from today's default semester
    #[arg(long, default_value_t = false)]
    current: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a grade between grading systems
    Convert {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        #[arg(long)]
        from: GradeSystem,
        #[arg(long)]
        to: GradeSystem,
    },
    /// Show the valid input range of a grading system
    Range { system: GradeSystem },
    /// Record a grade in your current grading system
    Add {
        #[arg(long)]
        subject: String,
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change fields of an existing grade
    Edit {
        id: Uuid,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        value: Option<f64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Pass an empty string to clear the description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a grade
    Remove { id: Uuid },
    /// List grades in your current grading system
    List {
        #[command(flatten)]
        scope: Scope,
    },
    /// Show overall and per-subject averages
    Summary {
        #[command(flatten)]
        scope: Scope,
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Import grades from a CSV file with columns subject,value,date,description
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show your display preference
    Prefs,
    /// Set the grading system grades are entered and shown in
    SetSystem { system: GradeSystem },
    /// Show averages as an average grade or as a 4.0 GPA
    SetLabel { label: DisplayLabel },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_name = config
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));
    let file_appender = tracing_appender::rolling::daily(config.log_dir(), log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let book = GradeBook::new(
        CsvRecordStore::new(config.grades_path()),
        JsonPreferenceStore::new(config.preferences_path()),
    );
    let user = config.user_id.as_str();

    match cli.command {
        Commands::Convert { value, from, to } => {
            let converted = convert(value, from, to)?;
            println!("{value} ({from}) = {converted:.2} ({to})");
        }
        Commands::Range { system } => {
            let range = grade_range(system);
            println!(
                "{system}: min {} max {} step {}",
                range.min, range.max, range.step
            );
        }
        Commands::Add {
            subject,
            value,
            date,
            description,
        } => {
            let grade = NewGrade {
                subject,
                value,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                description,
            };
            let shown = book.add_grade(user, grade).await?;
            println!("Added grade {}.", shown.id);
            print!("{}", render_grades(&[shown]));
        }
        Commands::Edit {
            id,
            subject,
            value,
            date,
            description,
        } => {
            let edit = GradeEdit {
                subject,
                value,
                date,
                description,
            };
            let shown = book.update_grade(user, id, edit).await?;
            print!("{}", render_grades(&[shown]));
        }
        Commands::Remove { id } => {
            book.delete_grade(user, id).await?;
            println!("Removed grade {id}.");
        }
        Commands::List { scope } => {
            let semester = resolve_scope(&config, &scope)?;
            let grades = book.list_grades(user, semester.as_ref()).await?;
            print!("{}", render_grades(&grades));
        }
        Commands::Summary { scope, json } => {
            let semester = resolve_scope(&config, &scope)?;
            let summary = book.summary(user, semester.as_ref()).await?;
            if json {
                println!("{}", to_json(&summary)?);
            } else {
                let label = semester
                    .as_ref()
                    .map(|s| s.name.as_str())
                    .unwrap_or("all grades");
                print!("{}", render_summary(&summary, label));
            }
        }
        Commands::Import { csv } => {
            let (imported, skipped) = import_csv(&book, user, &csv).await?;
            println!(
                "Imported {imported} grades from {} ({skipped} skipped).",
                csv.display()
            );
        }
        Commands::Prefs => {
            let preference = book.preference(user).await?;
            println!("Grade system: {}", preference.grade_system);
            println!("Display label: {}", preference.display_label);
        }
        Commands::SetSystem { system } => {
            book.set_grade_system(user, system).await?;
            println!("Grades are now entered and shown in {system}.");
        }
        Commands::SetLabel { label } => {
            book.set_display_label(user, label).await?;
            println!("Averages are now shown as {label}.");
        }
    }

    Ok(())
}

/// Resolves `--semester`/`--current` into a semester from the data directory.
fn resolve_scope(config: &Config, scope: &Scope) -> Result<Option<Semester>> {
    if scope.semester.is_none() && !scope.current {
        return Ok(None);
    }

    let path = config.semesters_path();
    let semesters =
        load_semesters(&path).with_context(|| format!("no semesters configured at {}", path.display()))?;

    let semester = match &scope.semester {
        Some(name) => semesters
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .with_context(|| format!("no semester named '{name}'"))?,
        None => default_semester(Utc::now().date_naive(), &semesters)
            .context("no semesters configured")?,
    };

    info!(semester = %semester.name, "Scoped to semester");
    Ok(Some(semester.clone()))
}

/// Imports grades entered in the user's current grading system. Rows that
/// fail validation are skipped and logged.
#[tracing::instrument(skip(book, path), fields(path = %path.display()))]
async fn import_csv(book: &FileBook, user: &str, path: &std::path::Path) -> Result<(usize, usize)> {
    #[derive(Deserialize)]
    struct CsvRow {
        subject: String,
        value: f64,
        date: NaiveDate,
        description: Option<String>,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut imported = 0usize;
    let mut skipped = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping unreadable row");
                skipped += 1;
                continue;
            }
        };

        let grade = NewGrade {
            subject: row.subject,
            value: row.value,
            date: row.date,
            description: row.description,
        };

        match book.add_grade(user, grade).await {
            Ok(_) => imported += 1,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping invalid grade");
                skipped += 1;
            }
        }
    }

    Ok((imported, skipped))
}
