use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod credits;
mod db;
mod models;
mod report;
mod risk;

#[derive(Parser)]
#[command(name = "credit-audit")]
#[command(about = "Graduation credit tracking and risk flags for counselor caseloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import course records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show one student's credit progress against requirements
    Progress {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Log a counselor contact note
    Note {
        #[arg(long)]
        email: String,
        #[arg(long)]
        note: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rank students by credits behind expectation
    #[command(group(
        ArgGroup::new("scope")
            .args(["grade", "email"])
            .multiple(false)
    ))]
    AtRisk {
        #[arg(long)]
        grade: Option<i32>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 1)]
        period: i32,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Rank students by dual-credit pathway standing
    #[command(group(
        ArgGroup::new("scope")
            .args(["grade", "email"])
            .multiple(false)
    ))]
    Pathways {
        #[arg(long)]
        grade: Option<i32>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown caseload risk report
    #[command(group(
        ArgGroup::new("scope")
            .args(["grade", "email"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        grade: Option<i32>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 1)]
        period: i32,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} course records from {}.", csv.display());
        }
        Commands::Progress { email, json } => {
            let students = db::fetch_students(&pool, None, Some(&email)).await?;
            let Some(student) = students.into_iter().next() else {
                println!("No student with email {email}.");
                return Ok(());
            };

            let categories = db::fetch_categories(&pool).await?;
            let courses = db::fetch_courses(&pool, None, Some(&email)).await?;
            let summary = credits::evaluate(&courses, &categories);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!(
                "Progress for {} (grade {}, class of {})",
                student.full_name, student.grade_level, student.graduation_year
            );
            println!(
                "Overall: {:.1} of {:.1} credits ({}%)",
                summary.total_earned, summary.total_required, summary.percentage
            );
            println!("Categories:");
            for category in categories.iter() {
                let earned = summary
                    .credits_by_category
                    .get(&category.id)
                    .copied()
                    .unwrap_or(0.0);
                println!(
                    "  - {}: {:.1}/{:.1} ({}%)",
                    category.name,
                    earned,
                    category.required_credits,
                    credits::category_percent(earned, category.required_credits)
                );
            }

            if summary.deficiencies.is_empty() {
                println!("No deficiencies.");
            } else {
                println!("Deficiencies:");
                for deficiency in summary.deficiencies.iter() {
                    println!(
                        "  - {}: need {:.1} more ({:.1} of {:.1})",
                        deficiency.category_name,
                        deficiency.needed,
                        deficiency.earned,
                        deficiency.required
                    );
                }
            }

            println!(
                "Dual credit: {:.1} total ({:.1} associate-eligible, {:.1} transfer-eligible)",
                summary.total_dual_credits, summary.associate_credits, summary.transfer_credits
            );
        }
        Commands::Note { email, note, date } => {
            let noted_on = date.unwrap_or_else(|| Utc::now().date_naive());
            db::insert_note(&pool, &email, &note, noted_on).await?;
            println!("Note recorded for {email}.");
        }
        Commands::AtRisk {
            grade,
            email,
            period,
            limit,
        } => {
            let students = db::fetch_students(&pool, grade, email.as_deref()).await?;
            let courses = db::fetch_courses(&pool, grade, email.as_deref()).await?;
            let categories = db::fetch_categories(&pool).await?;
            let entries = risk::assess_caseload(&students, &courses, &categories, period);

            if entries.is_empty() {
                println!("No students matched this scope.");
                return Ok(());
            }

            println!("Top students by credits behind (trimester {period}):");
            for entry in entries.iter().take(limit) {
                println!(
                    "- {} ({}, grade {}) {}: {:.1} credits behind ({:.1} of {:.1} expected, {}% complete)",
                    entry.student.full_name,
                    entry.student.email,
                    entry.student.grade_level,
                    entry.risk.tier.label(),
                    entry.risk.credits_behind,
                    entry.risk.earned_credits,
                    entry.risk.expected_credits,
                    entry.summary.percentage
                );
            }
        }
        Commands::Pathways { grade, email, limit } => {
            let students = db::fetch_students(&pool, grade, email.as_deref()).await?;
            let courses = db::fetch_courses(&pool, grade, email.as_deref()).await?;
            let categories = db::fetch_categories(&pool).await?;
            let mut entries = risk::assess_caseload(&students, &courses, &categories, 1);

            entries.retain(|entry| entry.summary.total_dual_credits > 0.0);
            entries.sort_by(|a, b| {
                b.summary
                    .total_dual_credits
                    .partial_cmp(&a.summary.total_dual_credits)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            if entries.is_empty() {
                println!("No students with dual-credit coursework in this scope.");
                return Ok(());
            }

            println!("Dual-credit pathway standing:");
            for entry in entries.iter().take(limit) {
                println!(
                    "- {} ({}, grade {}) {:.1} dual credits ({:.1} associate-eligible, {:.1} transfer-eligible)",
                    entry.student.full_name,
                    entry.student.email,
                    entry.student.grade_level,
                    entry.summary.total_dual_credits,
                    entry.summary.associate_credits,
                    entry.summary.transfer_credits
                );
            }
        }
        Commands::Report {
            grade,
            email,
            period,
            out,
        } => {
            let students = db::fetch_students(&pool, grade, email.as_deref()).await?;
            let courses = db::fetch_courses(&pool, grade, email.as_deref()).await?;
            let categories = db::fetch_categories(&pool).await?;
            let notes = db::fetch_recent_notes(&pool, grade, email.as_deref()).await?;
            let entries = risk::assess_caseload(&students, &courses, &categories, period);

            let scope_label = grade.map(|g| format!("grade {g}")).or(email);
            let report = report::build_report(
                scope_label.as_deref(),
                period,
                Utc::now().date_naive(),
                &entries,
                &notes,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
