use crate::{
    strings,
    text_table::{Alignment, TextTableBuilder},
};
use std::borrow::Cow;
use tabsplit_application::{
    ParticipantDirectory, PersonBalance, SettlementResult, SettlementWarning,
};
use tabsplit_domain::{CURRENCY_SCALE, Money, ParticipantId, Transfer};

pub struct SettlementPresenter;

pub struct SettlementView {
    pub balance_table: String,
    pub transfer_table: Option<String>,
    pub residual_table: Option<String>,
    pub warning: Option<String>,
}

impl SettlementPresenter {
    pub fn render(result: &SettlementResult) -> SettlementView {
        Self::render_with_participants(result, &EmptyDirectory)
    }

    pub fn render_with_participants(
        result: &SettlementResult,
        directory: &dyn ParticipantDirectory,
    ) -> SettlementView {
        let balance_table = Self::build_balance_table(&result.balances, directory);
        let transfer_table = (!result.transfers.is_empty())
            .then(|| Self::build_transfer_table(&result.transfers, directory));
        let residual_table = (!result.residuals.is_empty()).then(|| {
            Self::build_balance_table_with_title(&result.residuals, directory, strings::RESIDUAL)
        });
        let warning = result.warning.as_ref().map(|warning| match warning {
            SettlementWarning::NonZeroAggregate { total } => {
                strings::non_zero_aggregate(format_amount(*total))
            }
        });

        SettlementView {
            balance_table,
            transfer_table,
            residual_table,
            warning,
        }
    }

    pub fn build_balance_table(
        balances: &[PersonBalance],
        directory: &dyn ParticipantDirectory,
    ) -> String {
        Self::build_balance_table_with_title(balances, directory, strings::BALANCE)
    }

    fn build_balance_table_with_title(
        balances: &[PersonBalance],
        directory: &dyn ParticipantDirectory,
        title: &'static str,
    ) -> String {
        let headers = [Cow::Borrowed(strings::MEMBER), Cow::Borrowed(title)];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right])
            .headers(&headers);

        for person in balances {
            builder = builder.row([
                format_participant_label(&person.id, directory),
                Cow::Owned(format_signed_amount(person.balance)),
            ]);
        }

        builder.build()
    }

    pub fn build_transfer_table(
        transfers: &[Transfer],
        directory: &dyn ParticipantDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed(strings::FROM),
            Cow::Borrowed(strings::TO),
            Cow::Borrowed(strings::AMOUNT),
        ];
        let mut builder = TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Left, Alignment::Right])
            .headers(&headers);

        for transfer in transfers {
            builder = builder.row([
                format_participant_label(&transfer.from, directory),
                format_participant_label(&transfer.to, directory),
                Cow::Owned(format_amount(transfer.amount)),
            ]);
        }

        builder.build()
    }
}

struct EmptyDirectory;

impl ParticipantDirectory for EmptyDirectory {
    fn display_name(&self, _id: &ParticipantId) -> Option<&str> {
        None
    }
}

pub(crate) fn format_participant_label<'a>(
    id: &'a ParticipantId,
    directory: &'a dyn ParticipantDirectory,
) -> Cow<'a, str> {
    Cow::Borrowed(directory.display_name(id).unwrap_or(id.as_str()))
}

pub(crate) fn format_amount(amount: Money) -> String {
    amount.to_fixed(CURRENCY_SCALE)
}

fn format_signed_amount(amount: Money) -> String {
    let sign = if amount.is_negative() { "" } else { "+" };
    format!("{sign}{}", format_amount(amount))
}
