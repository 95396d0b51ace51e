//! Batch submission against a QLink backend
//!
//! Demonstrates:
//! - Credential auto-discovery (env vars, then ~/.qlink/credentials.json)
//! - Backend selection by queue length
//! - Chunked submission of an oversized circuit batch
//! - Re-attaching to submitted jobs for a status snapshot
//!
//! Usage:
//!   cargo run --example submit_batch

use anyhow::Result;
use qlink_backend::prelude::*;
use qlink_core::{CircuitBuilder, Program};

const NUM_CIRCUITS: usize = 20;
const SHOTS: u64 = 2048;

fn main() -> Result<()> {
    let provider = Provider::auto_load()?;

    provider.events().subscribe(|event| {
        println!(">> submitted {} on {}", event.job_id, event.backend_name);
    });

    let mut backend = provider.least_busy(2)?;
    println!(
        "Using backend {} ({} qubits, max {} programs/job)",
        backend.name(),
        backend.configuration().n_qubits,
        backend
            .configuration()
            .max_experiments
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unlimited".to_string()),
    );

    // A parameter sweep over rotation angles
    let mut programs: Vec<Program> = (0..NUM_CIRCUITS)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI / NUM_CIRCUITS as f64;
            CircuitBuilder::with_name(2, format!("sweep_{}", i))
                .h(0)
                .rz(0, angle)
                .cx(0, 1)
                .measure_all()
                .build()
                .into()
        })
        .collect();

    let options = RunOptions::new()
        .with_shots(SHOTS)
        .with_tag("sweep")
        .with_job_name("rz_sweep");

    let job = backend.run(&mut programs, &options)?;

    match &job {
        Job::Circuit(single) => {
            println!("Submitted single job {}", single.id());
        }
        Job::Composite(composite) => {
            println!(
                "Submitted composite job {} with {} sub-jobs:",
                composite.id(),
                composite.jobs().len()
            );
            for sub in composite.jobs() {
                println!("  {} [{:?}]", sub.id(), sub.status());
            }
        }
    }

    // Re-attach for a status snapshot (fire-and-forget workflow)
    if let Job::Composite(composite) = &job {
        for id in composite.job_ids() {
            let handle = provider.job(id)?;
            println!("{}: {:?}", handle.id(), handle.status());
        }
    }

    Ok(())
}
