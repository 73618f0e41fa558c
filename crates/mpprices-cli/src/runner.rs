//! Best-effort orchestration over a list of units (cabinets, brands).

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Runs `process` over every unit, at most `max_concurrent` at a time.
///
/// Results come back in input order, labelled by `name`. A failed unit is
/// logged and left out; the run only fails when nothing succeeded.
///
/// # Errors
///
/// Returns an error when `units` is empty or every unit failed.
pub(crate) async fn run_units<'a, U, T, N, F, Fut>(
    kind: &str,
    units: &'a [U],
    max_concurrent: usize,
    name: N,
    process: F,
) -> anyhow::Result<Vec<(String, T)>>
where
    N: Fn(&U) -> String,
    F: Fn(&'a U) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if units.is_empty() {
        anyhow::bail!("no {kind} to process");
    }

    let results: Vec<(String, anyhow::Result<T>)> = stream::iter(units)
        .map(|unit| {
            let label = name(unit);
            let fut = process(unit);
            async move { (label, fut.await) }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let total = results.len();
    let mut succeeded = Vec::with_capacity(total);
    for (label, result) in results {
        match result {
            Ok(value) => succeeded.push((label, value)),
            Err(e) => tracing::error!(kind, unit = %label, error = %format!("{e:#}"), "unit failed"),
        }
    }

    let failed = total - succeeded.len();
    if succeeded.is_empty() {
        anyhow::bail!("all {total} {kind} failed");
    }
    if failed > 0 {
        tracing::warn!(kind, failed, total, "run completed with failures");
    }
    Ok(succeeded)
}
