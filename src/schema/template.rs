//! Schema name templates: `{model}` and `{http_verb}` placeholders, `{{`/`}}` escapes.

use crate::error::ConfigError;

pub fn format_name(template: &str, model: &str, http_verb: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };
    let mut out = String::with_capacity(template.len() + model.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => return Err(invalid("unclosed '{'".into())),
                    }
                }
                match key.as_str() {
                    "model" => out.push_str(model),
                    "http_verb" => out.push_str(http_verb),
                    other => return Err(invalid(format!("unknown placeholder '{}'", other))),
                }
            }
            '}' => return Err(invalid("single '}' encountered".into())),
            c => out.push(c),
        }
    }
    Ok(out)
}
