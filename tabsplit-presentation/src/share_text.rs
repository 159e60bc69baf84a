use crate::{
    settlement_presenter::{format_amount, format_participant_label},
    strings,
};
use std::fmt::Write;
use tabsplit_application::ParticipantDirectory;
use tabsplit_domain::{Bill, Transfer};

/// Plain-text summary of a bill meant for pasting into a chat.
pub fn share_text(
    bill: &Bill,
    transfers: &[Transfer],
    directory: &dyn ParticipantDirectory,
) -> String {
    let currency = strings::CURRENCY_SYMBOL;
    let mut out = String::with_capacity(256);

    let _ = writeln!(out, "{}", bill.name());
    let _ = writeln!(out, "Date: {}", bill.date().format("%d %b %Y"));
    let _ = writeln!(out, "Total: {currency}{}", format_amount(bill.total_amount()));
    out.push('\n');

    out.push_str("Expenses:\n");
    for entry in bill.entries() {
        let description = match entry.description().trim() {
            "" => strings::NO_DESCRIPTION,
            text => text,
        };
        let _ = writeln!(
            out,
            "- {currency}{} - {description}",
            format_amount(entry.amount())
        );
    }

    out.push_str("\nSettlements:\n");
    if transfers.is_empty() {
        let _ = writeln!(out, "{}", strings::ALL_SETTLED);
    } else {
        for transfer in transfers {
            let _ = writeln!(
                out,
                "- {} -> {}: {currency}{}",
                format_participant_label(&transfer.from, directory),
                format_participant_label(&transfer.to, directory),
                format_amount(transfer.amount),
            );
        }
    }

    out
}
