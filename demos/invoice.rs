//! Invoice Billing
//!
//! This demo wires an invoice's payment field to a table of guarded
//! operations loaded from JSON.
//!
//! Key concepts:
//! - Label-level rule configuration resolved against a field
//! - Conditions that block a call before any logic runs
//! - Error fallback: a failed charge lands in `Failed`
//! - A history recorder as the single notification sink
//! - Snapshots for a persistence layer
//!
//! Run with: RUST_LOG=fsmguard=debug cargo run --example invoice

use fsmguard::builder::{RegistryBuilder, TransitionRegistry};
use fsmguard::core::{Condition, FieldSchema, StateField, Stateful};
use fsmguard::engine::{HistoryRecorder, TransitionExecutor};
use fsmguard::{state_enum, FieldSnapshot, TransitionError};
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

state_enum! {
    enum Payment {
        Unpaid,
        Paid,
        Refunded,
        Failed,
    }
}

#[derive(Debug, Error)]
enum BillingError {
    #[error("card declined for {0}")]
    Declined(String),
}

struct Invoice {
    customer: String,
    amount_cents: u64,
    card_ok: bool,
    state: StateField<Payment>,
}

impl Stateful for Invoice {
    type State = Payment;
    type Args = ();
    type Error = BillingError;

    fn state_field(&self, name: &str) -> Option<&StateField<Payment>> {
        (name == "state").then_some(&self.state)
    }

    fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<Payment>> {
        (name == "state").then_some(&mut self.state)
    }
}

const RULES: &str = r#"{
    "charge": { "src": "Unpaid", "dest": "Paid", "on_error": "Failed",
                "custom": { "label": "Charge card" } },
    "retry":  { "src": "Failed", "dest": "Unpaid" },
    "refund": { "src": "Paid", "dest": "Refunded" }
}"#;

fn charge(invoice: &mut Invoice, _: &()) -> Result<Option<Payment>, BillingError> {
    if invoice.card_ok {
        Ok(None)
    } else {
        Err(BillingError::Declined(invoice.customer.clone()))
    }
}

fn build_registry() -> Result<TransitionRegistry<Invoice>, Box<dyn std::error::Error>> {
    let mut builder = RegistryBuilder::<Invoice>::new().field(FieldSchema::new(
        "state",
        Payment::all(),
        Payment::Unpaid,
    ))?;

    for (operation, config) in fsmguard::builder::TransitionConfig::table_from_json(RULES)? {
        let rule = builder.configured(operation.as_str(), &config)?;
        let rule = match operation.as_str() {
            "charge" => rule.logic(charge),
            "refund" => rule
                .condition(Condition::named("small_amount", |inv: &Invoice, _: &()| {
                    inv.amount_cents <= 50_000
                }))
                .succeeds(),
            _ => rule.succeeds(),
        };
        builder = builder.transition(rule)?;
    }

    Ok(builder.build()?)
}

fn describe(result: Result<Option<Payment>, TransitionError<BillingError>>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("refused: {e}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Invoice Billing ===\n");

    let registry = Arc::new(build_registry()?);
    let recorder: HistoryRecorder<Payment> = HistoryRecorder::new();
    let executor = TransitionExecutor::new(Arc::clone(&registry)).notifier(recorder.clone());

    println!("Operations: {:?}\n", registry.operations().collect::<Vec<_>>());

    let mut invoice = Invoice {
        customer: "acme".to_string(),
        amount_cents: 120_000,
        card_ok: false,
        state: registry.new_field("state").ok_or("no state field")?,
    };

    println!("Charging with a bad card...");
    println!("  {}", describe(executor.execute(&mut invoice, "charge", &())));
    println!("  state: {:?}", invoice.state.value());

    println!("Retrying with a good card...");
    invoice.card_ok = true;
    executor.execute(&mut invoice, "retry", &())?;
    println!("  {}", describe(executor.execute(&mut invoice, "charge", &())));
    println!("  state: {:?}", invoice.state.value());

    println!("Charging twice...");
    println!("  {}", describe(executor.execute(&mut invoice, "charge", &())));

    println!("Refunding a large invoice...");
    println!("  can call: {}", executor.can_call(&invoice, "refund", &()));
    println!("  {}", describe(executor.execute(&mut invoice, "refund", &())));

    println!("\nAllowed now: {:?}", executor.allowed_operations(&invoice));

    let stored = invoice.state.snapshot().to_json()?;
    println!("\nSnapshot: {stored}");
    let reloaded = registry.load_field(&FieldSnapshot::from_json(&stored)?)?;
    println!("Reloaded state: {:?}", reloaded.value());

    println!("\nHistory:");
    let history = recorder.history();
    for record in history.records() {
        println!(
            "  {} {:?} -> {:?} ({:?})",
            record.operation, record.from, record.to, record.outcome
        );
    }
    println!("Path: {:?}", history.path("state"));

    Ok(())
}
