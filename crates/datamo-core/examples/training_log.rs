//! Example of logging a toy training run with datamo-core.

use std::sync::Arc;
use std::thread;

use datamo_core::{Item, Tensor, Writer, WriterConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // 1. Open the log; the directory itself is the caller's business
    let location = std::path::PathBuf::from("./datamo-logs");
    std::fs::create_dir_all(&location)?;
    let writer = Arc::new(Writer::open(WriterConfig::new(&location))?);
    println!("Logging to {}", writer.path().display());

    // 2. Tag the project
    writer.write(&Item::meta_project("toy_regression"))?;
    writer.write(&Item::string("phase", "train"))?;

    // 3. Two workers reporting concurrently
    let workers: Vec<_> = (0..2)
        .map(|worker| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || -> datamo_core::Result<()> {
                for step in 0..20 {
                    let loss = 1.0 / (1.0 + step as f64) + worker as f64 * 0.01;
                    writer.write(&Item::scalar(format!("loss/worker{worker}"), loss))?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in workers {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))??;
    }

    // 4. Final weights
    let weights: Vec<f64> = (0..6).map(|i| (i as f64 * 0.3).sin()).collect();
    writer.write(&Item::from_tensor("fc.weight", Tensor::new(&[2, 3], weights)?))?;

    println!("Done.");
    Ok(())
}
