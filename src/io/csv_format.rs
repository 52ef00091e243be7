//! CSV format handling for ledger commands and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to ledger commands
//! - Balance and history output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::core::LedgerFacade;
use crate::types::{LedgerCommand, Points, TransactionRecord, TransactionType, UserBalance};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, user, amount.
/// Fields are kept as text so that malformed values can be reported with
/// the offending input.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: String,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to a LedgerCommand
///
/// This function:
/// - Parses the type string (`charge` or `use`, case-insensitive)
/// - Validates the user id shape through `LedgerFacade::parse_user_id`
/// - Parses the amount as an integer
///
/// Non-positive amounts are passed through for the engine to reject.
///
/// # Returns
///
/// * `Ok(LedgerCommand)` - Successfully converted record
/// * `Err(String)` - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LedgerCommand, String> {
    let kind = match csv_record.kind.trim().to_lowercase().as_str() {
        "charge" => TransactionType::Charge,
        "use" => TransactionType::Use,
        _ => return Err(format!("Invalid command type: '{}'", csv_record.kind)),
    };

    let user_id = LedgerFacade::parse_user_id(&csv_record.user).map_err(|e| e.to_string())?;

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => amount_str
            .trim()
            .parse::<Points>()
            .map_err(|_| format!("Invalid amount '{}' for user {}", amount_str, user_id))?,
        _ => return Err(format!("{} for user {} requires an amount", kind, user_id)),
    };

    Ok(LedgerCommand {
        kind,
        user_id,
        amount,
    })
}

/// Write balances to CSV format
///
/// Writes balances with columns: user, points, sorted by user id for
/// deterministic output.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(balances: &[UserBalance], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["user", "points"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|balance| balance.user_id);

    for balance in sorted {
        writer
            .write_record(&[balance.user_id.to_string(), balance.points.to_string()])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write history records to CSV format
///
/// Writes records with columns: user, type, amount, sorted by user id and
/// then by sequence id. Sequence ids themselves are not written.
pub fn write_history_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["user", "type", "amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| (record.user_id, record.sequence_id));

    for record in sorted {
        writer
            .write_record(&[
                record.user_id.to_string(),
                record.kind.as_str().to_lowercase(),
                record.amount.to_string(),
            ])
            .map_err(|e| format!("Failed to write history record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn csv_record(kind: &str, user: &str, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            kind: kind.to_string(),
            user: user.to_string(),
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case("charge", TransactionType::Charge)]
    #[case("use", TransactionType::Use)]
    #[case("CHARGE", TransactionType::Charge)] // case insensitive
    #[case("Use", TransactionType::Use)]
    fn test_convert_csv_record_valid(#[case] kind: &str, #[case] expected: TransactionType) {
        let result = convert_csv_record(csv_record(kind, "7", Some("250")));

        assert_eq!(
            result,
            Ok(LedgerCommand {
                kind: expected,
                user_id: 7,
                amount: 250,
            })
        );
    }

    #[rstest]
    #[case::zero("0", 0)]
    #[case::negative("-1000", -1000)]
    #[case::padded("  42  ", 42)]
    fn test_convert_csv_record_passes_amount_through(
        #[case] amount: &str,
        #[case] expected: Points,
    ) {
        let command = convert_csv_record(csv_record("charge", "1", Some(amount))).unwrap();
        assert_eq!(command.amount, expected);
    }

    #[rstest]
    #[case::invalid_type("refund", "1", Some("100"), "Invalid command type")]
    #[case::negative_user("charge", "-1", Some("100"), "Invalid user id")]
    #[case::word_user("charge", "bob", Some("100"), "Invalid user id")]
    #[case::missing_amount("charge", "1", None, "requires an amount")]
    #[case::empty_amount("use", "1", Some(""), "requires an amount")]
    #[case::decimal_amount("charge", "1", Some("10.5"), "Invalid amount")]
    #[case::word_amount("charge", "1", Some("lots"), "Invalid amount")]
    fn test_convert_csv_record_errors(
        #[case] kind: &str,
        #[case] user: &str,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(csv_record(kind, user, amount));

        assert!(result.is_err());
        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_write_balances_csv_sorts_by_user() {
        let balances = vec![
            UserBalance {
                user_id: 2,
                points: 20,
                updated_at: Utc::now(),
            },
            UserBalance {
                user_id: 1,
                points: 10,
                updated_at: Utc::now(),
            },
        ];
        let mut output = Vec::new();

        write_balances_csv(&balances, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,points\n1,10\n2,20\n"
        );
    }

    #[test]
    fn test_write_balances_csv_empty() {
        let mut output = Vec::new();

        write_balances_csv(&[], &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "user,points\n");
    }

    #[test]
    fn test_write_history_csv_orders_by_user_then_sequence() {
        let record = |sequence_id, user_id, amount, kind| TransactionRecord {
            sequence_id,
            user_id,
            amount,
            kind,
            timestamp: Utc::now(),
        };
        let records = vec![
            record(3, 1, 30, TransactionType::Use),
            record(2, 2, 20, TransactionType::Charge),
            record(1, 1, 100, TransactionType::Charge),
        ];
        let mut output = Vec::new();

        write_history_csv(&records, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,type,amount\n1,charge,100\n1,use,30\n2,charge,20\n"
        );
    }
}
