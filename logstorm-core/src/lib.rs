#![forbid(unsafe_code)]

mod catalog;
mod error;
mod executor;
mod outcome;
mod selector;
mod template;

pub mod runner;

pub use catalog::{Scenario, ScenarioCatalog};
pub use error::{Error, Result};
pub use executor::{ACCEPT_LANGUAGES, RequestExecutor, USER_AGENTS};
pub use outcome::{ErrorKind, OutcomeKind, RequestOutcome};
pub use selector::ScenarioSelector;
pub use template::{PathFn, UrlTemplate};
