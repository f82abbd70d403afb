//! Synthetic operations selected by descriptor kind.

use crate::core::{OperationDescriptor, OperationKind, TargetOperation};
use anyhow::{Result, bail};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Value, json};
use std::time::Duration;

const DEFAULT_CPU_ITERATIONS: u64 = 100_000;
const DEFAULT_IO_LATENCY_MS: u64 = 20;
const DEFAULT_SEARCH_LATENCY_MS: u64 = 100;
const CALCULATION_LATENCY: Duration = Duration::from_millis(10);
const DEFAULT_INCOME: i64 = 3_000_000;
const DEFAULT_DEDUCTIONS: i64 = 480_000;

/// Kind that always fails, for exercising error paths.
pub const FAIL_KIND: &str = "fail";

/// Progressive brackets as `(upper bound, rate, deduction)`.
const TAX_BRACKETS: [(i64, f64, f64); 4] = [
    (1_950_000, 0.05, 0.0),
    (3_300_000, 0.10, 97_500.0),
    (6_950_000, 0.20, 427_500.0),
    (i64::MAX, 0.23, 636_000.0),
];

/// Runs synthetic work according to the descriptor's kind.
///
/// | Kind | Work | Payload keys |
/// |---|---|---|
/// | `cpu` | sum of squares on the blocking pool | `iterations` (100000) |
/// | `io` | sleep | `latency_ms` (20) |
/// | `search` | sleep | `latency_ms` (100) |
/// | `calculation` | bracketed tax on `income - deductions`, then a 10 ms sleep | `income`, `deductions` |
/// | `fail` | returns an error | `message` |
///
/// Any other kind fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedTarget;

impl SimulatedTarget {
    /// Create the target.
    pub const fn new() -> Self {
        Self
    }
}

impl TargetOperation for SimulatedTarget {
    fn call(&self, descriptor: &OperationDescriptor) -> BoxFuture<'static, Result<Value>> {
        let kind = descriptor.kind().clone();
        let payload = descriptor.payload().clone();

        async move {
            match kind.as_str() {
                OperationKind::CPU => {
                    let iterations = read_u64(&payload, "iterations", DEFAULT_CPU_ITERATIONS);
                    let sum = tokio::task::spawn_blocking(move || sum_of_squares(iterations))
                        .await
                        .map_err(|e| anyhow::anyhow!("cpu work did not complete: {e}"))?;
                    Ok(json!({ "iterations": iterations, "result": sum }))
                }
                OperationKind::IO | OperationKind::SEARCH => {
                    let default = if kind.as_str() == OperationKind::IO {
                        DEFAULT_IO_LATENCY_MS
                    } else {
                        DEFAULT_SEARCH_LATENCY_MS
                    };
                    let latency_ms = read_u64(&payload, "latency_ms", default);
                    tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                    Ok(json!({ "latency_ms": latency_ms }))
                }
                OperationKind::CALCULATION => {
                    let income = read_i64(&payload, "income", DEFAULT_INCOME);
                    let deductions = read_i64(&payload, "deductions", DEFAULT_DEDUCTIONS);
                    let taxable = (income - deductions).max(0);
                    let tax = income_tax(taxable);
                    tokio::time::sleep(CALCULATION_LATENCY).await;
                    Ok(json!({ "taxable_income": taxable, "tax": tax }))
                }
                FAIL_KIND => {
                    let message =
                        payload.get("message").and_then(Value::as_str).unwrap_or("simulated failure");
                    bail!("{message}")
                }
                other => bail!("unsupported operation kind '{other}'"),
            }
        }
        .boxed()
    }
}

fn read_u64(payload: &Value, key: &str, default: u64) -> u64 {
    payload.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn read_i64(payload: &Value, key: &str, default: i64) -> i64 {
    payload.get(key).and_then(Value::as_i64).unwrap_or(default)
}

fn sum_of_squares(iterations: u64) -> u64 {
    (0..iterations).fold(0u64, |acc, i| acc.wrapping_add(i.wrapping_mul(i)))
}

fn income_tax(taxable: i64) -> i64 {
    let (_, rate, deduction) = TAX_BRACKETS
        .iter()
        .copied()
        .find(|(upper, _, _)| taxable <= *upper)
        .unwrap_or(TAX_BRACKETS[TAX_BRACKETS.len() - 1]);
    (taxable as f64 * rate - deduction).max(0.0).round() as i64
}
