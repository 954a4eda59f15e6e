//! Command implementations.

pub mod alerts;
pub mod history;
pub mod record;
pub mod sweep;
pub mod watch;

pub use self::alerts::execute_alerts;
pub use self::history::execute_history;
pub use self::record::execute_record;
pub use self::sweep::execute_sweep;
pub use self::watch::execute_watch;
