use crate::{
    settlement_presenter::{format_amount, format_participant_label},
    strings,
};
use std::string::FromUtf8Error;
use tabsplit_application::ParticipantDirectory;
use tabsplit_domain::{Bill, ParticipantId, Transfer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV record")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV output")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] FromUtf8Error),
    #[error("failed to encode JSON export")]
    Json(#[from] serde_json::Error),
}

/// One row per entry of `bill`.
pub fn entries_csv(
    bill: &Bill,
    directory: &dyn ParticipantDirectory,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        strings::AMOUNT,
        strings::DESCRIPTION,
        strings::PARTICIPANTS,
        strings::PAID_BY,
    ])?;
    for entry in bill.entries() {
        let amount = format_amount(entry.amount());
        let participants = join_names(entry.participants(), directory);
        let paid_by = format_participant_label(entry.paid_by(), directory);
        let record: [&str; 4] = [&amount, entry.description(), &participants, &paid_by];
        writer.write_record(record)?;
    }
    finish(writer)
}

pub fn bills_csv<'b, I>(
    bills: I,
    directory: &dyn ParticipantDirectory,
) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'b Bill>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        strings::DATE,
        strings::NAME,
        strings::CATEGORY,
        strings::AMOUNT,
        strings::PARTICIPANTS,
        strings::DESCRIPTION,
    ])?;
    for bill in bills {
        let date = bill.date().format("%Y-%m-%d").to_string();
        let amount = format_amount(bill.total_amount());
        let participants = join_names(bill.participants(), directory);
        let record: [&str; 6] = [
            &date,
            bill.name(),
            bill.category(),
            &amount,
            &participants,
            bill.description(),
        ];
        writer.write_record(record)?;
    }
    finish(writer)
}

pub fn transfers_csv(
    transfers: &[Transfer],
    directory: &dyn ParticipantDirectory,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([strings::FROM, strings::TO, strings::AMOUNT])?;
    for transfer in transfers {
        let from = format_participant_label(&transfer.from, directory);
        let to = format_participant_label(&transfer.to, directory);
        let amount = format_amount(transfer.amount);
        let record: [&str; 3] = [&from, &to, &amount];
        writer.write_record(record)?;
    }
    finish(writer)
}

fn join_names<'p>(
    ids: impl IntoIterator<Item = &'p ParticipantId>,
    directory: &dyn ParticipantDirectory,
) -> String {
    ids.into_iter()
        .map(|id| format_participant_label(id, directory).into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
