//! Simulated `/api/pull` progress.
//!
//! Remote models need no download, but Ollama clients wait for a pull to
//! report success before using a model. This produces the same sequence of
//! status lines a real pull would.

use std::time::Duration;

use futures_util::{Stream, StreamExt, stream};

use ollagate_core::services::metadata;

use crate::ollama_models::OllamaPullProgress;

/// Nominal layer sizes reported during a pull.
const LAYER_SIZES: [u64; 5] = [1_073_741_824, 2_147_483_648, 536_870_912, 268_435_456, 134_217_728];

/// Progress updates per layer.
const UPDATES_PER_LAYER: u64 = 20;

/// Every progress line a pull of `model` reports, in order.
pub fn pull_steps(model: &str) -> Vec<OllamaPullProgress> {
    let mut steps = vec![OllamaPullProgress::status("pulling manifest")];

    for (index, &size) in LAYER_SIZES.iter().enumerate() {
        let digest = format!("sha256:{}", metadata::digest(&format!("{model}:{index}")));
        let chunk = (size / UPDATES_PER_LAYER).max(1);
        let mut completed = 0;
        while completed < size {
            completed = (completed + chunk).min(size);
            steps.push(OllamaPullProgress {
                status: "downloading".to_string(),
                digest: Some(digest.clone()),
                total: Some(size),
                completed: Some(completed),
            });
        }
    }

    steps.extend(
        [
            "verifying sha256 digest",
            "writing manifest",
            "removing any unused layers",
            "success",
        ]
        .map(OllamaPullProgress::status),
    );
    steps
}

/// Progress lines for `model`, paced `delay` apart.
pub fn pull_progress(
    model: String,
    delay: Duration,
) -> impl Stream<Item = OllamaPullProgress> + Send + 'static {
    stream::iter(pull_steps(&model)).enumerate().then(move |(i, step)| async move {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        step
    })
}
