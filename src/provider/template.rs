//! Argument substitution for provider configuration strings.
//!
//! Templates use `{{args.NAME}}` placeholders resolved against the run's
//! argument list. Resolution fails with a descriptive error when an argument
//! is missing or has no value; that failure surfaces as an Error-phase
//! measurement, never a panic.

use crate::domain::Argument;
use crate::error::ProviderError;

/// Resolve every `{{args.NAME}}` placeholder in `template`.
pub fn resolve(template: &str, args: &[Argument]) -> Result<String, ProviderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| ProviderError::MalformedTemplate {
                reason: "unclosed '{{' placeholder".into(),
            })?;

        let placeholder = after_open[..end].trim();
        let name = placeholder
            .strip_prefix("args.")
            .ok_or_else(|| ProviderError::MalformedTemplate {
                reason: format!("unsupported placeholder '{{{{{placeholder}}}}}'"),
            })?;

        let value = args
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_deref())
            .ok_or_else(|| ProviderError::UnresolvedArgument {
                name: name.to_string(),
            })?;

        out.push_str(value);
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}
