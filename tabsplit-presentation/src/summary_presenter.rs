use crate::{
    settlement_presenter::{format_amount, format_participant_label},
    strings,
    text_table::{Alignment, TextTableBuilder},
};
use rust_decimal::Decimal;
use std::borrow::Cow;
use tabsplit_application::ParticipantDirectory;
use tabsplit_domain::{
    Bill, CategorySpending, MonthlySpending, ParticipantSpending, SpendingSummary,
};

pub struct SummaryPresenter;

pub struct SummaryView {
    pub overview: String,
    pub category_table: Option<String>,
    pub trend_table: Option<String>,
    pub participant_table: String,
}

impl SummaryPresenter {
    pub fn render(summary: &SpendingSummary, directory: &dyn ParticipantDirectory) -> SummaryView {
        let overview = if summary.bill_count == 0 {
            strings::NO_BILLS.to_owned()
        } else {
            strings::spending_overview(
                format_amount(summary.total_spent),
                summary.bill_count,
                format_amount(summary.average_per_bill),
            )
        };

        SummaryView {
            overview,
            category_table: (!summary.categories.is_empty())
                .then(|| Self::build_category_table(&summary.categories)),
            trend_table: (!summary.months.is_empty())
                .then(|| Self::build_trend_table(summary.recent_months())),
            participant_table: Self::build_participant_table(&summary.participants, directory),
        }
    }

    pub fn build_category_table(categories: &[CategorySpending]) -> String {
        let headers = [
            Cow::Borrowed(strings::CATEGORY),
            Cow::Borrowed(strings::BILLS),
            Cow::Borrowed(strings::AMOUNT),
            Cow::Borrowed(strings::SHARE),
        ];
        TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Right,
                Alignment::Right,
                Alignment::Right,
            ])
            .headers(&headers)
            .rows(categories.iter().map(|category| {
                [
                    Cow::Borrowed(category.category.as_str()),
                    Cow::Owned(category.count.to_string()),
                    Cow::Owned(format_amount(category.amount)),
                    Cow::Owned(format_percentage(category.percentage)),
                ]
            }))
            .build()
    }

    pub fn build_trend_table(months: &[MonthlySpending]) -> String {
        let headers = [
            Cow::Borrowed(strings::MONTH),
            Cow::Borrowed(strings::BILLS),
            Cow::Borrowed(strings::AMOUNT),
        ];
        TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right, Alignment::Right])
            .headers(&headers)
            .rows(months.iter().map(|month| {
                [
                    Cow::Borrowed(month.month.as_str()),
                    Cow::Owned(month.count.to_string()),
                    Cow::Owned(format_amount(month.amount)),
                ]
            }))
            .build()
    }

    /// One row per bill in the given order.
    pub fn build_bill_table(bills: &[&Bill]) -> String {
        let headers = [
            Cow::Borrowed(strings::DATE),
            Cow::Borrowed(strings::NAME),
            Cow::Borrowed(strings::CATEGORY),
            Cow::Borrowed(strings::AMOUNT),
        ];
        TextTableBuilder::new()
            .alignments(&[
                Alignment::Left,
                Alignment::Left,
                Alignment::Left,
                Alignment::Right,
            ])
            .headers(&headers)
            .rows(bills.iter().map(|bill| {
                [
                    Cow::Owned(bill.date().format("%Y-%m-%d").to_string()),
                    Cow::Borrowed(bill.name()),
                    Cow::Borrowed(bill.category()),
                    Cow::Owned(format_amount(bill.total_amount())),
                ]
            }))
            .build()
    }

    pub fn build_participant_table(
        participants: &[ParticipantSpending],
        directory: &dyn ParticipantDirectory,
    ) -> String {
        let headers = [
            Cow::Borrowed(strings::MEMBER),
            Cow::Borrowed(strings::SPENT),
            Cow::Borrowed(strings::SHARE),
        ];
        TextTableBuilder::new()
            .alignments(&[Alignment::Left, Alignment::Right, Alignment::Right])
            .headers(&headers)
            .rows(participants.iter().map(|person| {
                [
                    format_participant_label(&person.id, directory),
                    Cow::Owned(format_amount(person.amount)),
                    Cow::Owned(format_percentage(person.percentage)),
                ]
            }))
            .build()
    }
}

fn format_percentage(percentage: Decimal) -> String {
    format!("{:.1}%", percentage.round_dp(1))
}
