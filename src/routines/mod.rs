// Lambert W, principal branch
pub mod lambert;
// Routines for logging
pub mod logger;
// Numerical helpers
pub mod math;
// Routines for output
pub mod output;
// Routines for settings
pub mod settings;
