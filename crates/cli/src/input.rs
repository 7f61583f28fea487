//! Reading pod lists produced by `kubectl get pods -o json`

use anyhow::{bail, Context, Result};
use k8s_openapi::api::core::v1::Pod;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Read pods from a file, or stdin when `path` is `None` or `-`
pub fn read_pods(path: Option<&Path>) -> Result<Vec<Pod>> {
    let content = match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display()))?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read pods from stdin")?;
            buffer
        }
    };

    parse_pods(&content)
}

/// Parse a pod list document, or a single pod
pub fn parse_pods(content: &str) -> Result<Vec<Pod>> {
    let mut document: Value = serde_json::from_str(content).context("Input is not valid JSON")?;

    if let Some(items) = document.get_mut("items") {
        return serde_json::from_value(items.take()).context("Failed to parse pod list items");
    }

    match document.get("kind").and_then(Value::as_str) {
        Some("Pod") => {
            let pod = serde_json::from_value(document).context("Failed to parse pod")?;
            Ok(vec![pod])
        }
        Some(kind) => bail!("Expected a Pod or a list of pods, got kind {}", kind),
        None => bail!("Expected a Pod or a list of pods"),
    }
}
