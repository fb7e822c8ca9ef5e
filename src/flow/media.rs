use serde::Serialize;
use tracing::warn;

use super::FlowError;

/// Outcome of a media generation that is allowed to degrade.
///
/// Hard failures are still reported as `Err(FlowError)` by callers that need
/// them; `Degraded` means "the rest of the work can continue without this".
#[derive(Debug, Clone, PartialEq)]
pub enum Generation<T> {
    Ready(T),
    Degraded(Degraded),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Degraded {
    pub flow: &'static str,
    pub reason: String,
}

/// The empty value shown in place of media that could not be generated.
pub trait Placeholder {
    fn placeholder() -> Self;
}

impl<T> Generation<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Generation::Ready(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Generation::Degraded(_))
    }

    pub fn degraded(&self) -> Option<&Degraded> {
        match self {
            Generation::Degraded(d) => Some(d),
            Generation::Ready(_) => None,
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Generation::Ready(value) => Some(value),
            Generation::Degraded(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generation<U> {
        match self {
            Generation::Ready(value) => Generation::Ready(f(value)),
            Generation::Degraded(d) => Generation::Degraded(d),
        }
    }
}

impl<T: Placeholder> Generation<T> {
    /// The generated value, or the empty placeholder when degraded.
    pub fn into_output(self) -> T {
        match self {
            Generation::Ready(value) => value,
            Generation::Degraded(_) => T::placeholder(),
        }
    }
}

/// Converts a hard failure into a logged, degraded result.
pub(crate) fn degrade<T>(result: Result<T, FlowError>) -> Generation<T> {
    match result {
        Ok(value) => Generation::Ready(value),
        Err(err) => {
            warn!(
                flow = err.flow,
                cause = %err.cause,
                "media generation degraded to placeholder"
            );
            Generation::Degraded(Degraded {
                flow: err.flow,
                reason: err.cause.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FailureCause;

    #[derive(Debug, PartialEq)]
    struct Picture(String);

    impl Placeholder for Picture {
        fn placeholder() -> Self {
            Picture(String::new())
        }
    }

    #[test]
    fn failures_become_placeholders() {
        let generation: Generation<Picture> =
            degrade(Err(FlowError::new("image", FailureCause::EmptyMedia)));
        assert!(generation.is_degraded());
        assert_eq!(generation.degraded().unwrap().reason, "model returned no media");
        assert_eq!(generation.into_output(), Picture(String::new()));
    }

    #[test]
    fn ready_values_pass_through() {
        let generation = degrade(Ok(Picture("data:image/png;base64,AA==".into())));
        assert!(generation.is_ready());
        let mapped = generation.map(|p| p.0.len());
        assert_eq!(mapped.ready(), Some(26));
    }
}
