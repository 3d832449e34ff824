//! # Takeoff CLI
//!
//! Runs a quantity takeoff from an estimate file and prints the component
//! results, material rows or the priced BOQ, as text tables or JSON.
//! Overrides can be edited in place and are saved back atomically.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use env_logger::Env;

use takeoff_core::boq::BoqReport;
use takeoff_core::components::ComponentResult;
use takeoff_core::estimate::{Estimate, TakeoffReport};
use takeoff_core::file_io::{load_estimate, save_estimate};
use takeoff_core::materials::MaterialRow;
use takeoff_core::overrides::{BoqKey, MaterialKey};
use takeoff_core::session::EstimateSession;

#[derive(Parser)]
#[command(name = "takeoff")]
#[command(about = "Construction quantity takeoff and priced BOQ", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Format {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    /// Estimate file
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(Args, Debug, Clone)]
struct BoqArgs {
    #[command(flatten)]
    report: ReportArgs,

    /// Only show this category
    #[arg(short, long)]
    category: Option<String>,

    /// Only show items whose material, category or brand contains this text
    #[arg(short, long)]
    search: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-floor component areas and volumes
    #[command(alias = "c")]
    Components(ReportArgs),

    /// Material quantities per floor and category
    #[command(alias = "m")]
    Materials(ReportArgs),

    /// Consolidated, priced bill of quantities
    #[command(alias = "b")]
    Boq(BoqArgs),

    /// Syntax-check every formula in the estimate
    Check {
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Edit a user override and save the estimate
    #[command(alias = "o")]
    Override {
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        #[command(subcommand)]
        edit: OverrideEdit,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum OverrideEdit {
    /// Percentage of a percentage-based component
    Percentage { component: String, value: f64 },
    /// Qty-per-unit of a material row
    QtyPerUnit {
        category: String,
        material: String,
        floor: String,
        value: f64,
    },
    /// Wastage percentage of a material row
    Wastage {
        category: String,
        material: String,
        floor: String,
        value: f64,
    },
    /// Drop qty-per-unit and wastage edits of a material row
    ClearMaterial {
        category: String,
        material: String,
        floor: String,
    },
    /// Brand of a BOQ row
    Brand {
        category: String,
        material: String,
        brand: String,
    },
    /// Manual rate of a BOQ row
    Rate {
        category: String,
        material: String,
        value: f64,
    },
    /// Drop the manual rate of a BOQ row
    ClearRate { category: String, material: String },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug; RUST_LOG overrides either
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Components(args) => {
            let report = calculate(&args)?;
            match args.format {
                Format::Json => print_json(&report.components),
                Format::Table => {
                    println!("{}", components_table(&report.components));
                    Ok(())
                }
            }
        }
        Commands::Materials(args) => {
            let report = calculate(&args)?;
            match args.format {
                Format::Json => print_json(&report.materials),
                Format::Table => {
                    println!("{}", materials_table(&report.materials));
                    Ok(())
                }
            }
        }
        Commands::Boq(args) => {
            let estimate = load(&args.report.file)?;
            let currency = estimate.settings.currency.clone();
            let report = estimate.calculate().context("Takeoff failed")?;
            let boq = report
                .boq
                .filter(args.category.as_deref(), args.search.as_deref());
            match args.report.format {
                Format::Json => print_json(&boq),
                Format::Table => {
                    println!("{}", boq_table(&boq, &currency));
                    Ok(())
                }
            }
        }
        Commands::Check { file } => {
            let estimate = load(&file)?;
            estimate.validate().context("Invalid estimate")?;
            let errors = estimate.inputs.check_formulas();
            if errors.is_empty() {
                println!("All formulas parse.");
                return Ok(());
            }
            for error in &errors {
                println!("[{}] {}", error.error_code(), error);
            }
            anyhow::bail!("{} formula(s) failed to parse", errors.len())
        }
        Commands::Override { file, edit } => {
            let mut session = EstimateSession::new(load(&file)?);
            apply_override(&mut session, edit);
            let grand_total = session.report().context("Takeoff failed")?.boq.grand_total;
            let estimate = session.into_estimate();
            save_estimate(&estimate, &file)
                .with_context(|| format!("Failed to save {}", file.display()))?;
            println!(
                "Saved {}. Grand total: {:.2} {}",
                file.display(),
                grand_total,
                estimate.settings.currency
            );
            Ok(())
        }
    }
}

fn load(file: &Path) -> Result<Estimate> {
    log::debug!("loading {}", file.display());
    load_estimate(file).with_context(|| format!("Failed to load {}", file.display()))
}

fn calculate(args: &ReportArgs) -> Result<TakeoffReport> {
    load(&args.file)?.calculate().context("Takeoff failed")
}

fn apply_override(session: &mut EstimateSession, edit: OverrideEdit) {
    let overrides = session.overrides_mut();
    match edit {
        OverrideEdit::Percentage { component, value } => overrides.set_percentage(&component, value),
        OverrideEdit::QtyPerUnit {
            category,
            material,
            floor,
            value,
        } => overrides.set_qty_per_unit(MaterialKey::new(&category, &material, &floor), value),
        OverrideEdit::Wastage {
            category,
            material,
            floor,
            value,
        } => overrides.set_wastage(MaterialKey::new(&category, &material, &floor), value),
        OverrideEdit::ClearMaterial {
            category,
            material,
            floor,
        } => overrides.clear_material_override(&MaterialKey::new(&category, &material, &floor)),
        OverrideEdit::Brand {
            category,
            material,
            brand,
        } => overrides.select_brand(BoqKey::new(&category, &material), brand),
        OverrideEdit::Rate {
            category,
            material,
            value,
        } => overrides.set_rate(BoqKey::new(&category, &material), value),
        OverrideEdit::ClearRate { category, material } => {
            overrides.clear_rate(&BoqKey::new(&category, &material))
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn numeric(value: impl ToString) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(comfy_table::ContentArrangement::DynamicFullWidth);
    table.set_header(header);
    table
}

fn components_table(results: &[ComponentResult]) -> Table {
    let mut table = new_table(vec!["Floor", "Component", "Category", "Area", "Volume", "Logic"]);
    for r in results {
        table.add_row(vec![
            Cell::new(&r.floor),
            Cell::new(&r.component),
            Cell::new(&r.category),
            numeric(opt(r.area.value())),
            numeric(opt(r.volume_cuft.value())),
            Cell::new(&r.logic),
        ]);
    }
    table
}

fn materials_table(rows: &[MaterialRow]) -> Table {
    let mut table = new_table(vec![
        "Floor", "Category", "Material", "Volume", "Unit", "Qty/Unit", "Wastage", "Total Qty", "Value",
    ]);
    for r in rows {
        let material = if r.overridden {
            format!("{} *", r.material)
        } else {
            r.material.clone()
        };
        table.add_row(vec![
            Cell::new(&r.floor),
            Cell::new(&r.category),
            Cell::new(material),
            numeric(format!("{:.2}", r.volume)),
            Cell::new(&r.unit),
            numeric(opt(r.qty_per_unit)),
            numeric(format!("{}%", r.wastage_percent)),
            numeric(format!("{:.2}", r.total_qty)),
            numeric(opt(r.total_value)),
        ]);
    }
    table
}

fn boq_table(boq: &BoqReport, currency: &str) -> Table {
    let mut table = new_table(vec!["Category", "Material", "Qty", "Unit", "Brand", "Rate", "Cost"]);
    for group in &boq.groups {
        for item in &group.items {
            let rate = match item.rate_per_unit {
                Some(rate) if item.rate_is_manual => format!("{:.2} *", rate),
                rate => opt(rate),
            };
            table.add_row(vec![
                Cell::new(&group.category),
                Cell::new(&item.material),
                numeric(format!("{:.2}", item.total_qty)),
                Cell::new(&item.unit),
                Cell::new(item.selected_brand.as_deref().unwrap_or("-")),
                numeric(rate),
                numeric(opt(item.cost)),
            ]);
        }
        table.add_row(vec![
            Cell::new(""),
            Cell::new(format!("Subtotal {}", group.category)),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            numeric(format!("{:.2} {}", group.subtotal, currency)),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new("Grand total"),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        numeric(format!("{:.2} {}", boq.grand_total, currency)),
    ]);
    table
}
