//! History command implementation.

use crate::cli::HistoryArgs;
use crate::commands::record::require_record;
use crate::error::Result;
use crate::output::Formatter;
use casewatch_domain::traits::EscalationStore;
use casewatch_store::SqliteStore;

/// Execute the history command.
pub fn execute_history(args: HistoryArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let record = require_record(store, args.id)?;
    let entries = store.assignment_history(record.id)?;
    println!("{}", formatter.format_history(record.id, &entries)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use casewatch_domain::RecordId;

    #[test]
    fn test_history_of_missing_record() {
        let store = SqliteStore::new(":memory:").unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = execute_history(HistoryArgs { id: RecordId::new() }, &store, &formatter);
        assert!(matches!(result, Err(CliError::NotFound(_))));
    }
}
