pub mod assembler;
pub mod batch_manager;
#[cfg(feature = "chrome")]
pub mod chrome;
pub mod cli;
pub mod config;
pub mod cookie_loader;
pub mod delay_manager;
pub mod driver;
pub mod error;
pub mod extractor;
pub mod input_loader;
pub mod locators;
pub mod logger;
pub mod model;
pub mod resolver;
pub mod resume_manager;
pub mod sections;
pub mod session;

// Exporting types for convenience
pub use assembler::ProfileAssembler;
pub use batch_manager::{BatchCoordinator, BatchReport, CancelToken};
pub use config::ScraperConfig;
pub use cookie_loader::CredentialSet;
pub use driver::{Driver, DriverFactory, ReplaySite};
pub use error::{FailureKind, TargetFailure};
pub use extractor::Extractor;
pub use input_loader::TargetRecord;
pub use model::ProfileRecord;
pub use resume_manager::{BatchResult, ResultStore};
pub use session::{Authenticator, GateDetector, PageKind, PatternGate, SessionOutcome};
