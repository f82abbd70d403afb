//! Fake Target Operations for tests.

use crate::core::{FnTarget, OperationDescriptor, TargetOperation};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Succeeds after sleeping `delay`, echoing the case id.
pub fn sleeping(delay: Duration) -> Arc<dyn TargetOperation> {
    Arc::new(FnTarget::new(move |d: OperationDescriptor| async move {
        tokio::time::sleep(delay).await;
        Ok::<_, anyhow::Error>(json!({ "case_id": d.case_id() }))
    }))
}

/// Sleeps `delay`, then fails for `failing_case` and succeeds for every other case.
pub fn failing_on(failing_case: &str, delay: Duration) -> Arc<dyn TargetOperation> {
    let failing_case = failing_case.to_string();
    Arc::new(FnTarget::new(move |d: OperationDescriptor| {
        let fails = d.case_id() == failing_case;
        async move {
            tokio::time::sleep(delay).await;
            if fails {
                anyhow::bail!("case {} rejected the request", d.case_id());
            }
            Ok(Value::Null)
        }
    }))
}

/// Panics on every call.
pub fn panicking(message: &'static str) -> Arc<dyn TargetOperation> {
    Arc::new(FnTarget::new(move |_: OperationDescriptor| async move {
        if !message.is_empty() {
            panic!("{message}");
        }
        Ok::<_, anyhow::Error>(Value::Null)
    }))
}

/// Never completes.
pub fn hanging() -> Arc<dyn TargetOperation> {
    Arc::new(FnTarget::new(|_: OperationDescriptor| async {
        std::future::pending::<()>().await;
        Ok::<_, anyhow::Error>(Value::Null)
    }))
}

/// Sleeps `delay` and records the highest number of calls running at once.
pub fn concurrency_tracking(delay: Duration) -> (Arc<dyn TargetOperation>, Arc<AtomicUsize>) {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let peak_out = Arc::clone(&peak);
    let target = FnTarget::new(move |_: OperationDescriptor| {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(Value::Null)
        }
    });
    (Arc::new(target), peak_out)
}
