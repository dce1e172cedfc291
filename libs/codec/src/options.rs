//! # Content Options - Pre-Encoding Mutators
//!
//! A content option mutates `(topic, content)` before the content is encoded,
//! typically writing tags such as a serialized trace header. Options run in the
//! order given; the first failure stops the sequence and is returned verbatim.
//! Options that ran before the failing one may already have mutated the content.

use crate::content::MessageContent;
use crate::error::OptionError;

/// Named mutation applied to content before encoding
pub trait ContentOption: Send + Sync {
    /// Apply the mutation for a message bound to `topic`
    fn apply(&self, topic: &str, content: &mut MessageContent) -> Result<(), OptionError>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        "content_option"
    }
}

impl<F> ContentOption for F
where
    F: Fn(&str, &mut MessageContent) -> Result<(), OptionError> + Send + Sync,
{
    fn apply(&self, topic: &str, content: &mut MessageContent) -> Result<(), OptionError> {
        self(topic, content)
    }
}

/// Closure option with an explicit name
pub struct NamedOption<F> {
    name: String,
    apply: F,
}

impl<F> NamedOption<F>
where
    F: Fn(&str, &mut MessageContent) -> Result<(), OptionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, apply: F) -> Self {
        Self {
            name: name.into(),
            apply,
        }
    }
}

impl<F> ContentOption for NamedOption<F>
where
    F: Fn(&str, &mut MessageContent) -> Result<(), OptionError> + Send + Sync,
{
    fn apply(&self, topic: &str, content: &mut MessageContent) -> Result<(), OptionError> {
        (self.apply)(topic, content)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Apply `options` in order, stopping at the first failure
pub fn apply_options(
    topic: &str,
    content: &mut MessageContent,
    options: &[&dyn ContentOption],
) -> Result<(), OptionError> {
    for option in options {
        option.apply(topic, content).map_err(|e| {
            tracing::debug!(option = option.name(), topic, error = %e, "content option failed");
            e
        })?;
    }
    Ok(())
}

/// Option writing a fixed tag
pub fn with_tag(name: impl Into<String>, value: impl Into<Vec<u8>>) -> impl ContentOption {
    let name = name.into();
    let value = value.into();
    NamedOption::new("with_tag", move |_: &str, content: &mut MessageContent| {
        content.state.set(&name, value.clone())?;
        Ok(())
    })
}
