use crate::csv_export::ExportError;
use chrono::NaiveDate;
use serde::Serialize;
use tabsplit_domain::{Bill, Money};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BillsExport<'b> {
    bills: Vec<&'b Bill>,
    export_info: ExportInfo,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportInfo {
    date: NaiveDate,
    count: usize,
    total_amount: Money,
}

/// Pretty-printed backup of `bills` in their stored record shape, with a
/// summary block. The output loads back as bill records.
pub fn bills_json<'b, I>(bills: I, exported_on: NaiveDate) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'b Bill>,
{
    let bills: Vec<&Bill> = bills.into_iter().collect();
    let export_info = ExportInfo {
        date: exported_on,
        count: bills.len(),
        total_amount: bills.iter().map(|bill| bill.total_amount()).sum(),
    };
    let mut json = serde_json::to_string_pretty(&BillsExport { bills, export_info })?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabsplit_domain::{Entry, ParticipantId, Roster, SplitStrategy};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).expect("date")
    }

    fn bill(id: &str, amount: i64) -> Bill {
        let roster = Roster::from_ids(["A", "B"]).expect("roster");
        let mut bill = Bill::new(id, "Dinner", date(3), &roster).with_description("team night");
        let entry = Entry::try_new(
            format!("{id}-e"),
            Money::from_i64(amount),
            SplitStrategy::Custom,
            ParticipantId::from("A"),
            [(ParticipantId::from("B"), Money::from_i64(amount))]
                .into_iter()
                .collect(),
            "",
        )
        .expect("valid entry");
        bill.add_entry(entry).expect("added");
        bill
    }

    #[test]
    fn export_carries_records_and_summary() {
        let bills = [bill("b1", 40), bill("b2", 25)];

        let json = bills_json(&bills, date(10)).expect("export");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["exportInfo"]["date"], "2024-02-10");
        assert_eq!(value["exportInfo"]["count"], 2);
        assert_eq!(value["exportInfo"]["totalAmount"], "65");
        assert_eq!(value["bills"][1]["description"], "team night");

        let restored: Vec<Bill> =
            serde_json::from_value(value["bills"].clone()).expect("records load back");
        assert_eq!(restored, bills);
    }

    #[test]
    fn empty_export_is_still_well_formed() {
        let json = bills_json(&[], date(1)).expect("export");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["bills"], serde_json::json!([]));
        assert_eq!(value["exportInfo"]["count"], 0);
    }
}
