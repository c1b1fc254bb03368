//! fab-quote - command-line quotation
//!
//! Prices one configured item of a product family and prints the
//! aggregated quotation as JSON or as a plain summary.

use std::path::PathBuf;

use clap::Parser;
use fab_quote::bom::BomDeriver;
use fab_quote::core::error::{QuoteAppError, Result};
use fab_quote::core::EngineConfig;
use fab_quote::engine::{self, InputValue, Inputs};
use fab_quote::quote::{round_cents, Adjustments, Quotation, Quote};
use fab_quote::schema::ProductFamily;

/// Quote one configured product
#[derive(Parser, Debug)]
#[command(name = "fab-quote")]
#[command(about = "Price a configured product family item and print the quotation")]
struct Args {
    /// Product family definition (TOML)
    #[arg(long)]
    family: PathBuf,

    /// Input value as variable=value; MultiChoice labels are joined with '|'
    #[arg(long = "set", value_name = "VAR=VALUE")]
    set: Vec<String>,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Item quantity (defaults to the configured default quantity)
    #[arg(long)]
    quantity: Option<f64>,

    /// Hidden markup in percent
    #[arg(long, default_value_t = 0.0)]
    markup: f64,

    /// Visible discount in percent
    #[arg(long, default_value_t = 0.0)]
    discount: f64,

    /// Risk surcharge in percent
    #[arg(long, default_value_t = 0.0)]
    surcharge: f64,

    /// Fold the surcharge into the labor line instead of itemizing it
    #[arg(long)]
    hide_surcharge: bool,

    /// Labor hours per worker
    #[arg(long, default_value_t = 0.0)]
    labor_hours: f64,

    /// Hourly labor rate (overrides the config)
    #[arg(long)]
    labor_rate: Option<f64>,

    /// Workers on site (overrides the config)
    #[arg(long)]
    workers: Option<u32>,

    /// Flat crane / equipment fee
    #[arg(long, default_value_t = 0.0)]
    equipment: f64,

    /// Early-payment discount in percent (informational)
    #[arg(long, default_value_t = 0.0)]
    early_payment: f64,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fab_quote=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_file(path)?,
        None => EngineConfig::default(),
    };

    let family = ProductFamily::load_file(&args.family)?;
    tracing::info!(
        family = %family.meta.id,
        declarations = family.schema.len(),
        skipped_rows = family.load_errors.len(),
        "product family loaded"
    );
    for warning in family.schema.warnings() {
        tracing::warn!("default degraded to 0: {}", warning);
    }

    for issue in engine::ordering_issues(&family.schema) {
        match issue.declared_at {
            Some(later) => tracing::warn!(
                "row {} ({}) uses '{}' before row {} declares it",
                issue.row,
                issue.variable,
                issue.reference,
                later
            ),
            None => tracing::warn!(
                "row {} ({}) uses undeclared '{}'",
                issue.row,
                issue.variable,
                issue.reference
            ),
        }
    }

    let inputs = parse_inputs(&args.set)?;
    let deriver = BomDeriver::standard(config.bom.clone());
    let quantity = args.quantity.unwrap_or(config.default_quantity);

    let mut quote = Quote::new(adjustments(&args, &config));
    let item = engine::price_item(&family, &inputs, quantity, &deriver)?;
    for warning in &item.warnings {
        tracing::warn!("input degraded to 0: {}", warning);
    }
    quote.add(item);

    let quotation = quote.aggregate();
    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&quotation)?),
        "text" => print_text(&quotation),
        other => {
            return Err(QuoteAppError::InvalidArgument(format!(
                "unknown format '{}', expected json or text",
                other
            )))
        }
    }

    Ok(())
}

fn parse_inputs(pairs: &[String]) -> Result<Inputs> {
    let mut inputs = Inputs::new();
    for pair in pairs {
        let (variable, value) = pair.split_once('=').ok_or_else(|| {
            QuoteAppError::InvalidArgument(format!("expected VAR=VALUE, got '{}'", pair))
        })?;
        let value = if value.contains('|') {
            InputValue::Choices(value.split('|').map(|s| s.trim().to_string()).collect())
        } else {
            InputValue::Text(value.to_string())
        };
        inputs.set(variable.trim(), value);
    }
    Ok(inputs)
}

fn adjustments(args: &Args, config: &EngineConfig) -> Adjustments {
    let mut adjustments = Adjustments::from_config(config);
    adjustments.labor_hours = args.labor_hours;
    if let Some(rate) = args.labor_rate {
        adjustments.labor_rate = rate;
    }
    if let Some(workers) = args.workers {
        adjustments.workers = workers;
    }
    adjustments.equipment_fee = args.equipment;
    adjustments.surcharge_percent = args.surcharge;
    adjustments.surcharge_visible = !args.hide_surcharge;
    adjustments.markup_percent = args.markup;
    adjustments.discount_percent = args.discount;
    adjustments.early_payment_percent = args.early_payment;
    adjustments.clamped()
}

fn print_text(quotation: &Quotation) {
    for line in &quotation.lines {
        println!("{}", line.title);
        if !line.option_summary.is_empty() {
            println!("  {}", line.option_summary);
        }
        println!(
            "  {} x {:.2} = {:.2}",
            line.quantity, line.unit_price, line.extended_price
        );
        if let (Some(per_unit), Some(unit)) = (line.price_per_reference_unit, &line.reference_unit)
        {
            println!("  ({:.2} per {})", per_unit, unit);
        }
        for bom in &line.bom_lines {
            println!("  - {}", bom);
        }
    }

    if !quotation.adjustments.is_empty() {
        println!();
    }
    for adjustment in &quotation.adjustments {
        println!("{:<30} {:>12.2}", adjustment.label, adjustment.amount);
    }

    println!();
    println!("{:<30} {:>12.2}", "Net", quotation.net_total);
    println!(
        "{:<30} {:>12.2}",
        format!("Tax ({}%)", round_cents(quotation.tax_rate * 100.0)),
        quotation.tax
    );
    println!("{:<30} {:>12.2}", "Gross", quotation.gross_total);

    if let Some(early) = &quotation.early_payment {
        println!(
            "{:<30} {:>12.2}",
            format!("Payable early (-{}%)", early.percent),
            early.payable
        );
    }
}
