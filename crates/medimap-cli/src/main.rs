use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use medimap_core::validate::{MAX_SEARCH_LIMIT, clamp_limit};
use medimap_core::{
    AppError, DbConfig, LoadOptions, LoadService, LoadSummary, RegionStat, StatsService,
    load_sources_config, round_currency, validate_search_term, validate_year,
};
use medimap_db::{ConsumptionRepository, LoadRepository, ensure_schema};
use medimap_cli::{Command, Config};

/// Regions printed after a load as a smoke check.
const LOAD_PREVIEW_REGIONS: usize = 3;

/// Upper bound for `top-drugs --limit`.
const MAX_TOP_DRUGS: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Logs go to stderr so stdout carries only results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default subscriber")?;

    let config = Config::parse();

    if let Err(e) = run(config).await {
        // Core errors carry a message meant for the terminal
        match e.downcast_ref::<AppError>() {
            Some(app_err) => eprintln!("Error: {}", app_err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let json = config.json;

    match config.command {
        Command::Load {
            sources,
            year,
            replace,
            dry_run,
            create_schema,
        } => {
            let pool = connect(&config.database_url, dry_run).await?;
            if create_schema && !dry_run {
                ensure_schema(&pool).await?;
                info!("Schema created");
            }
            let summary = load(&pool, sources, year, replace, dry_run).await?;
            if json {
                return print_json(&summary);
            }
            print_load_summary(&summary);
            if !summary.dry_run {
                let stats = StatsService::new(ConsumptionRepository::new(pool));
                let top = stats.region_totals(summary.year).await?;
                print_top_regions(summary.year, &top[..top.len().min(LOAD_PREVIEW_REGIONS)]);
            }
        }
        command => {
            let pool = connect(&config.database_url, false).await?;
            let stats = StatsService::new(ConsumptionRepository::new(pool));
            show(command, &stats, json).await?;
        }
    }

    Ok(())
}

/// Opens the pool. A dry run never touches the database, so its pool connects lazily.
async fn connect(database_url: &str, lazy: bool) -> anyhow::Result<PgPool> {
    let db_config = DbConfig::from_env();
    let options = PgPoolOptions::new().max_connections(db_config.max_connections);

    if lazy {
        return options
            .connect_lazy(database_url)
            .context("Invalid database URL");
    }

    info!("Connecting to database...");
    options
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

async fn load(
    pool: &PgPool,
    sources_path: Option<PathBuf>,
    year: Option<i32>,
    replace: bool,
    dry_run: bool,
) -> anyhow::Result<LoadSummary> {
    let sources = load_sources_config(sources_path)?;
    let year = validate_year(year.unwrap_or(sources.year))?;

    info!("Loading extracts for {}", year);
    info!("  regions: {}", sources.regions.display());
    info!("  drugs:   {}", sources.drugs.display());
    info!("  classes: {}", sources.classes.display());
    if replace {
        warn!("Existing aggregate facts for {} will be replaced", year);
    }

    let options = LoadOptions {
        year,
        replace,
        dry_run,
    };
    let service = LoadService::new(LoadRepository::new(pool.clone()));
    let summary = service.load_sources(&sources, options).await?;

    Ok(summary)
}

async fn show(
    command: Command,
    stats: &StatsService<ConsumptionRepository>,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::Overview { year } => {
            let overview = stats.national_overview(validate_year(year.year)?).await?;
            if json {
                return print_json(&overview);
            }
            println!("\nNational overview {}\n", overview.year);
            println!("  Regions:               {}", overview.region_count);
            println!("  Drugs in catalog:      {}", overview.drug_count);
            println!("  Packages dispensed:    {}", overview.total_units);
            println!("  Reimbursed:            {}", format_euros(overview.total_reimbursed));
            println!();
        }
        Command::Regions { year } => {
            let year = validate_year(year.year)?;
            let totals = stats.region_totals(year).await?;
            if json {
                return print_json(&totals);
            }
            if totals.is_empty() {
                println!("\nNo regional data for {}.\n", year);
                return Ok(());
            }
            println!("\nRegions by reimbursed amount, {}\n", year);
            for (i, stat) in totals.iter().enumerate() {
                println!(
                    "{:>3}. {:<4} {:<32} {:>14} {:>18}",
                    i + 1,
                    stat.code,
                    truncate_text(&stat.name, 32),
                    stat.total_units,
                    format_euros(stat.total_reimbursed)
                );
            }
            println!();
        }
        Command::Region { code, year } => {
            let detail = stats.region_detail(code, validate_year(year.year)?).await?;
            if json {
                return print_json(&detail);
            }
            println!("\n{} ({}), {}\n", detail.name, detail.code, detail.year);
            println!("  Packages dispensed:    {}", detail.total_units);
            println!("  Reimbursed:            {}", format_euros(detail.total_reimbursed));
            println!();
        }
        Command::Compare { code, year } => {
            let cmp = stats
                .compare_to_national(code, validate_year(year.year)?)
                .await?;
            if json {
                return print_json(&cmp);
            }
            println!("\n{} ({}) against the regional mean, {}\n", cmp.name, cmp.code, cmp.year);
            println!("  Region:                {}", format_euros(cmp.region_value));
            println!("  Mean of regions:       {}", format_euros(cmp.national_mean));
            println!("  Difference:            {}", format_euros(cmp.difference));
            println!("  Difference (%):        {}", cmp.percent_difference);
            match cmp.rank {
                Some(rank) => println!("  Rank:                  {} / {}", rank, cmp.region_count),
                None => println!("  Rank:                  not ranked (no data)"),
            }
            println!();
        }
        Command::Shares { year } => {
            let year = validate_year(year.year)?;
            let shares = stats.region_shares(year).await?;
            if json {
                return print_json(&shares);
            }
            println!("\nShare of national reimbursement, {}\n", year);
            for share in &shares {
                println!(
                    "  {:<4} {:<32} {:>18} {:>8}",
                    share.stat.code,
                    truncate_text(&share.stat.name, 32),
                    format_euros(share.stat.total_reimbursed),
                    share
                        .share_pct
                        .value()
                        .map(|v| format!("{v:.2}%"))
                        .unwrap_or_else(|| "n/a".to_string())
                );
            }
            println!();
        }
        Command::TopDrugs { limit, year } => {
            let year = validate_year(year.year)?;
            let limit = clamp_limit(Some(limit), limit, MAX_TOP_DRUGS)?;
            let drugs = stats.drug_totals(year, limit).await?;
            if json {
                return print_json(&drugs);
            }
            if drugs.is_empty() {
                println!("\nNo per-drug data for {}.\n", year);
                return Ok(());
            }
            println!("\nDrugs by reimbursed amount, {}\n", year);
            for (i, drug) in drugs.iter().enumerate() {
                println!(
                    "{:>3}. {:<15} {:<40} {:>18}",
                    i + 1,
                    drug.cip_code,
                    truncate_text(&drug.name, 40),
                    format_euros(drug.total_reimbursed)
                );
            }
            println!();
        }
        Command::Search { query, limit } => {
            let term = validate_search_term(&query)?;
            let limit = clamp_limit(Some(limit), limit, MAX_SEARCH_LIMIT)?;
            let drugs = stats.drug_search(term, limit).await?;
            if json {
                return print_json(&drugs);
            }
            if drugs.is_empty() {
                println!("\nNo drug matches \"{}\".\n", term);
                return Ok(());
            }
            println!("\nDrugs matching \"{}\"\n", term);
            for drug in &drugs {
                println!("  {:<15} {}", drug.cip_code, drug.name);
            }
            println!();
        }
        Command::Load { .. } => unreachable!("load is dispatched by run()"),
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn print_load_summary(summary: &LoadSummary) {
    let title = if summary.dry_run {
        "DRY RUN COMPLETE (nothing written)"
    } else {
        "LOAD COMPLETE"
    };

    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("{} - {}", title, summary.year);
    info!("═══════════════════════════════════════════════════════");
    info!("  Regions:             {} read, {} new", summary.regions_read, summary.regions_inserted);
    info!("  Drugs:               {} read, {} new", summary.drugs_read, summary.drugs_inserted);
    info!("  Classes:             {} read, {} new", summary.classes_read, summary.classes_inserted);
    info!("  Facts replaced:      {}", summary.facts_replaced);
    info!("  Facts inserted:      {}", summary.facts_inserted);
    if let Some(counts) = &summary.counts {
        info!("───────────────────────────────────────────────────────");
        info!("  regions:             {}", counts.regions);
        info!("  drugs:               {}", counts.drugs);
        info!("  therapeutic_classes: {}", counts.therapeutic_classes);
        info!("  consumption_facts:   {}", counts.consumption_facts);
    }
    info!("═══════════════════════════════════════════════════════");
}

fn print_top_regions(year: i32, top: &[RegionStat]) {
    info!("Top regions by reimbursement, {}:", year);
    for stat in top {
        info!("  {} - {}", stat.name, format_euros(stat.total_reimbursed));
    }
}

/// Formats an amount with thousands separators, e.g. `1 234 567.89 €`.
fn format_euros(amount: Decimal) -> String {
    let rounded = round_currency(amount);
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part} €")
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        // Safely truncate text by characters to handle multi-byte UTF-8
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
