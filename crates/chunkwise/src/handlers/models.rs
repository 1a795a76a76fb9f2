//! `chunkwise models`

use chunkwise_config::{ApplicationConfig, ModelProfile};
use std::io::Write;

/// Print the built-in model profiles, marking the configured default
///
/// # Errors
/// Returns an error when writing to `out` fails
pub fn models_handler(
    config: &ApplicationConfig,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let default_model = config.llm.default_model.as_str();

    if json {
        let models: Vec<_> = ModelProfile::known_models()
            .map(|(name, profile)| {
                serde_json::json!({
                    "name": name,
                    "default": name == default_model,
                    "max_input_tokens": profile.max_input_tokens(),
                    "profile": profile,
                })
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &models)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<24} {:>9} {:>9} {:>9}",
        "MODEL", "CONTEXT", "CHUNK", "INPUT"
    )?;
    for (name, profile) in ModelProfile::known_models() {
        let marker = if name == default_model { " *" } else { "" };
        writeln!(
            out,
            "{name:<24} {:>9} {:>9} {:>9}{marker}",
            profile.context_window(),
            profile.max_tokens_per_chunk(),
            profile.max_input_tokens(),
        )?;
    }
    Ok(())
}
