//! Diagnostic error types.
//!
//! Kept as three distinct types rather than one enum: each has a different
//! call-site fate (reject the call, report-and-isolate-one-body, or
//! log-and-swallow), and folding them together would force every call site
//! to match on variants it can never actually receive.
//!
//! `miette::Diagnostic` is implemented by hand below rather than pulled in
//! through its derive macro, since that derive expects `thiserror` to supply
//! the `std::error::Error`/`Display` impls and nothing else in this crate's
//! dependency tree needs `thiserror`.

use std::fmt;

use miette::Diagnostic;

/// A body or boundary could not be constructed.
#[derive(Debug)]
pub enum ConfigError {
    DegenerateArea { area: f64 },
    TooFewVertices { count: usize },
    InvalidRadius { radius: f64 },
    InvalidMass { mass: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateArea { area } => {
                write!(f, "body shape produced a non-positive area ({area})")
            }
            Self::TooFewVertices { count } => {
                write!(f, "polygon body needs at least 3 vertices, got {count}")
            }
            Self::InvalidRadius { radius } => {
                write!(f, "circle body needs a positive radius, got {radius}")
            }
            Self::InvalidMass { mass } => write!(
                f,
                "body mass must be positive for a non-static body, got {mass}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Diagnostic for ConfigError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            Self::DegenerateArea { .. } => "dynamics2d::config::degenerate_area",
            Self::TooFewVertices { .. } => "dynamics2d::config::too_few_vertices",
            Self::InvalidRadius { .. } => "dynamics2d::config::invalid_radius",
            Self::InvalidMass { .. } => "dynamics2d::config::invalid_mass",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::DegenerateArea { .. } => {
                Some(Box::new("check the supplied vertices or radius"))
            }
            _ => None,
        }
    }
}

/// A body's kinematic state became non-finite during simulation.
///
/// Reported through the world's registered error handler; the offending
/// body is put to sleep and the rest of the step continues.
#[derive(Debug)]
pub struct DomainError;

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body kinematic state became non-finite after integration")
    }
}

impl std::error::Error for DomainError {}

impl Diagnostic for DomainError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("dynamics2d::domain::non_finite_state"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "a host-applied force or velocity likely introduced NaN/infinity",
        ))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Warning)
    }
}

/// A user-supplied callback (collision, step function) panicked.
///
/// Never returned from a public function; logged via `log::error!` and
/// swallowed so one misbehaving callback doesn't abort the whole step.
#[derive(Debug)]
pub struct UserCallbackError {
    pub message: String,
}

impl fmt::Display for UserCallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user callback panicked: {}", self.message)
    }
}

impl std::error::Error for UserCallbackError {}

impl Diagnostic for UserCallbackError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("dynamics2d::domain::user_callback_panicked"))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Warning)
    }
}

/// Run `f`, catching a panic and logging it as a [`UserCallbackError`]
/// rather than letting it unwind past the engine's own stepping code.
pub fn isolate_callback<F: FnOnce() + std::panic::UnwindSafe>(f: F) {
    if let Err(payload) = std::panic::catch_unwind(f) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        log::error!("{}", UserCallbackError { message });
    }
}
