use pulse_core::registry::MetricRegistry;
use std::fmt::Write;

/// Renders every registered blockchain with its metrics, one metric per line.
pub fn render_chains(registry: &MetricRegistry) -> String {
    let mut out = String::new();
    for blockchain in registry.blockchains() {
        let _ = writeln!(out, "{blockchain}");
        for spec in registry.metrics(blockchain) {
            let _ = writeln!(out, "  {} (api_method={})", spec.name, spec.kind.api_method());
        }
    }
    out
}

pub fn handle_chains_command(registry: &MetricRegistry) {
    print!("{}", render_chains(registry));
}
