//! Tagged results handed to the presentation layer.

/// Result of a step that can succeed, succeed with a caveat, or fail
/// without aborting the surrounding operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Ok(T),
    Warn(String),
    Fail(String),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Message of a warning or failure.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Warn(m) | Outcome::Fail(m) => Some(m),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(v) => Outcome::Ok(f(v)),
            Outcome::Warn(m) => Outcome::Warn(m),
            Outcome::Fail(m) => Outcome::Fail(m),
        }
    }
}

/// One labelled line of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub outcome: Outcome<String>,
}

impl Step {
    pub fn ok(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcome: Outcome::Ok(detail.into()),
        }
    }

    pub fn warn(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcome: Outcome::Warn(message.into()),
        }
    }

    pub fn fail(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outcome: Outcome::Fail(message.into()),
        }
    }
}

/// Ordered steps of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub steps: Vec<Step>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn ok(&mut self, label: impl Into<String>, detail: impl Into<String>) {
        self.push(Step::ok(label, detail));
    }

    pub fn warn(&mut self, label: impl Into<String>, message: impl Into<String>) {
        self.push(Step::warn(label, message));
    }

    pub fn fail(&mut self, label: impl Into<String>, message: impl Into<String>) {
        self.push(Step::fail(label, message));
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.outcome.is_fail())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Step> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, Outcome::Warn(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.outcome.is_fail())
    }

    pub fn find(&self, label: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.label == label)
    }
}
