//! Alert reconciliation commands: run checks, test scenarios, reports
//! and cleanup.

use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

use pharmacy_core::error::AppError;
use pharmacy_database::store::{ProductStore, UserDirectory};
use pharmacy_entity::notification::{NotificationCount, NotificationPriority, NotificationType};
use pharmacy_entity::product::{NewProduct, Product};
use pharmacy_service::notification::service::CustomNotification;
use pharmacy_service::reconciliation::{AlertState, ReconciliationReport};
use pharmacy_service::{Services, Stores};

use super::Context;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// Run every alert check, then clean up old read notifications
    Check,
    /// Exercise the alert pipeline with sample scenarios
    Test {
        #[arg(short = 't', long = "type", value_enum, default_value = "all")]
        kind: Scenario,
    },
    /// Notifications created recently, grouped by type and priority
    Summary {
        #[arg(long, default_value = "24")]
        hours: i64,
    },
    /// Current catalog counts per alert condition
    State,
    /// Delete notifications read more than N days ago
    Cleanup {
        /// Retention in days; the configured value when omitted
        #[arg(short, long)]
        days: Option<i64>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Stock,
    Expiry,
    All,
}

impl Scenario {
    fn covers_stock(self) -> bool {
        matches!(self, Self::Stock | Self::All)
    }

    fn covers_expiry(self) -> bool {
        matches!(self, Self::Expiry | Self::All)
    }
}

#[derive(Debug, Serialize, Tabled)]
struct PhaseRow {
    #[tabled(rename = "Check")]
    phase: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Suppressed")]
    suppressed: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct CountRow {
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Count")]
    count: i64,
}

impl From<&NotificationCount> for CountRow {
    fn from(c: &NotificationCount) -> Self {
        Self {
            kind: c.kind.label(),
            priority: c.priority.as_str(),
            count: c.count,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct StateRow {
    #[tabled(rename = "Alert")]
    alert: &'static str,
    #[tabled(rename = "Products")]
    products: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct ProductRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Stock")]
    stock: i32,
    #[tabled(rename = "Threshold")]
    threshold: i32,
    #[tabled(rename = "Expiry")]
    expiry: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            stock: p.stock_quantity,
            threshold: p.stock_threshold,
            expiry: p
                .expiry_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub async fn execute(args: &NotificationsArgs, ctx: &Context) -> Result<(), AppError> {
    let config = super::load_config(ctx)?;
    let db = super::connect(&config).await?;
    let (stores, services) = super::build_services(&config, &db).await;

    let result = match &args.command {
        NotificationsCommand::Check => check(&services, ctx).await,
        NotificationsCommand::Test { kind } => test(&stores, &services, *kind, ctx).await,
        NotificationsCommand::Summary { hours } => {
            print_summary(&services, Duration::hours(*hours), ctx.format).await
        }
        NotificationsCommand::State => print_state(&services, ctx.format).await,
        NotificationsCommand::Cleanup { days, yes } => cleanup(&services, *days, *yes).await,
    };

    db.close().await;
    result
}

async fn check(services: &Services, ctx: &Context) -> Result<(), AppError> {
    println!("Running notification checks...");
    let started = Instant::now();

    let report = services.reconciliation.run_all_checks().await;
    print_report(&report, ctx.format);

    let deleted = services.reconciliation.cleanup_default().await?;
    output::print_success(&format!("{deleted} old read notification(s) deleted"));

    let total = report.total();
    if total.has_failures() {
        output::print_warning(&format!(
            "{} alert(s) could not be written, see logs",
            total.failed
        ));
    }
    output::print_success(&format!(
        "Notification checks finished in {:.1}s",
        started.elapsed().as_secs_f64()
    ));

    if ctx.verbose {
        print_summary(services, Duration::hours(24), ctx.format).await?;
        print_state(services, ctx.format).await?;
    }
    Ok(())
}

async fn test(
    stores: &Stores,
    services: &Services,
    scenario: Scenario,
    ctx: &Context,
) -> Result<(), AppError> {
    println!("Testing the notification pipeline...");

    if scenario.covers_stock() {
        output::print_heading("Stock scenario");
        let low = stores.products.list_low_stock().await?;
        let out = stores.products.list_out_of_stock().await?;
        if low.is_empty() {
            output::print_warning("No low stock product found, creating a sample one");
            let sample = services
                .inventory
                .create_product(sample_product("[test] Low stock sample", 1, 5, None))
                .await?;
            output::print_kv("Sample product", &sample.id.to_string());
        } else {
            let rows: Vec<ProductRow> = low.iter().take(3).map(ProductRow::from).collect();
            output::print_list(&rows, ctx.format);
        }
        if out.is_empty() {
            output::print_warning("No out of stock product found");
        } else {
            let rows: Vec<ProductRow> = out.iter().take(2).map(ProductRow::from).collect();
            output::print_list(&rows, ctx.format);
        }

        let outcome = services.reconciliation.check_low_stock().await
            + services.reconciliation.check_out_of_stock().await;
        output::print_success(&format!(
            "Stock checks ran: {} created, {} suppressed",
            outcome.created, outcome.suppressed
        ));
    }

    if scenario.covers_expiry() {
        output::print_heading("Expiry scenario");
        let today = Utc::now().date_naive();
        let expiring = stores
            .products
            .list_expiring_between(today, today + Duration::days(30))
            .await?;
        let expired = stores.products.list_expired_in_stock(today).await?;
        if expiring.is_empty() {
            output::print_warning("No product expiring soon found, creating a sample one");
            let sample = services
                .inventory
                .create_product(sample_product(
                    "[test] Expiring sample",
                    10,
                    2,
                    Some(today + Duration::days(10)),
                ))
                .await?;
            output::print_kv("Sample product", &sample.id.to_string());
        } else {
            let rows: Vec<ProductRow> = expiring.iter().take(3).map(ProductRow::from).collect();
            output::print_list(&rows, ctx.format);
        }
        if expired.is_empty() {
            output::print_warning("No expired product with stock found");
        } else {
            let rows: Vec<ProductRow> = expired.iter().take(2).map(ProductRow::from).collect();
            output::print_list(&rows, ctx.format);
        }

        let settings = services.reconciliation.settings();
        let outcome = services
            .reconciliation
            .check_expiring(settings.expiry_lookahead_days)
            .await
            + services
                .reconciliation
                .check_expiring(settings.expiry_urgent_days)
                .await
            + services.reconciliation.check_expired().await;
        output::print_success(&format!(
            "Expiry checks ran: {} created, {} suppressed",
            outcome.created, outcome.suppressed
        ));
    }

    if scenario == Scenario::All {
        output::print_heading("System scenario");
        let sent = services
            .notifications
            .send_system_alert(
                "Test System",
                "This is a test notification from the alerting system.",
                NotificationPriority::Normal,
                None,
            )
            .await?;
        output::print_success(&format!("System notification sent to {sent} user(s)"));

        let users = stores.users.list_all().await?;
        let admins: Vec<_> = users
            .iter()
            .filter(|u| u.role.is_admin())
            .map(|u| u.id)
            .collect();
        if !admins.is_empty() {
            let sent = services
                .notifications
                .send_system_alert_until(
                    "Test Admin",
                    "Test notification reserved for administrators.",
                    NotificationPriority::Low,
                    Some(admins),
                    Some(Utc::now() + Duration::hours(1)),
                )
                .await?;
            output::print_success(&format!("Admin notification sent to {sent} user(s)"));
        }

        if let Some(user) = users.first() {
            services
                .notifications
                .create_custom(CustomNotification {
                    user_id: user.id,
                    kind: NotificationType::SystemAlert,
                    title: "Test Custom".to_string(),
                    message: "Custom notification created by the system test.".to_string(),
                    details: serde_json::json!({ "test": true, "created_by_test": true }),
                    priority: NotificationPriority::Normal,
                    action_url: None,
                    expires_at: Some(Utc::now() + Duration::hours(1)),
                })
                .await?;
            output::print_success(&format!("Custom notification created for {}", user.name));
        }
    }

    print_summary(services, Duration::minutes(5), ctx.format).await?;
    print_state(services, ctx.format).await
}

async fn print_summary(
    services: &Services,
    window: Duration,
    format: OutputFormat,
) -> Result<(), AppError> {
    let summary = services.reconciliation.summary(Utc::now() - window).await?;
    output::print_heading(&format!(
        "Notifications since {}",
        summary.since.format("%Y-%m-%d %H:%M")
    ));
    let rows: Vec<CountRow> = summary.counts.iter().map(CountRow::from).collect();
    output::print_list(&rows, format);
    output::print_kv("Total", &summary.total().to_string());
    Ok(())
}

async fn print_state(services: &Services, format: OutputFormat) -> Result<(), AppError> {
    let state: AlertState = services.reconciliation.alert_state().await?;
    let lookahead = services.reconciliation.settings().expiry_lookahead_days;
    output::print_heading("Current alert state");
    let rows = vec![
        StateRow {
            alert: "Low stock",
            products: state.low_stock,
        },
        StateRow {
            alert: "Out of stock",
            products: state.out_of_stock,
        },
        StateRow {
            alert: "Expiring soon",
            products: state.expiring,
        },
        StateRow {
            alert: "Expired with stock",
            products: state.expired,
        },
    ];
    output::print_list(&rows, format);
    output::print_kv("Expiry lookahead", &format!("{lookahead} days"));
    Ok(())
}

async fn cleanup(services: &Services, days: Option<i64>, yes: bool) -> Result<(), AppError> {
    let days = days.unwrap_or(services.reconciliation.settings().retention_days);
    if days <= 0 {
        return Err(AppError::validation("Retention must be at least one day"));
    }

    if !yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete notifications read more than {days} days ago?"
            ))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = services.reconciliation.cleanup(days).await?;
    output::print_success(&format!("{deleted} notification(s) deleted"));
    Ok(())
}

fn print_report(report: &ReconciliationReport, format: OutputFormat) {
    let rows: Vec<PhaseRow> = report
        .phases
        .iter()
        .map(|p| PhaseRow {
            phase: p.phase.clone(),
            created: p.outcome.created,
            suppressed: p.outcome.suppressed,
            failed: p.outcome.failed,
        })
        .collect();
    output::print_list(&rows, format);
}

fn sample_product(
    name: &str,
    stock: i32,
    threshold: i32,
    expiry_date: Option<NaiveDate>,
) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        stock_quantity: stock,
        stock_threshold: threshold,
        selling_price: Decimal::ONE,
        expiry_date,
    }
}
