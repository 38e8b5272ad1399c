//! Expense book.

use serde::Serialize;
use stockroom_core::report::expense_totals;
use stockroom_core::validation::validate_new_expense;
use stockroom_core::{Expense, ExpenseTotals, NewExpense, DEFAULT_EXPENSE_CATEGORY};
use stockroom_db::{Filter, OrderBy, Table};
use tracing::info;

use crate::codec;
use crate::error::LedgerResult;
use crate::Ledger;

/// Every expense with its totals, as shown on the expense page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseSummary {
    pub expenses: Vec<Expense>,
    pub totals: ExpenseTotals,
}

impl Ledger {
    pub async fn add_expense(&self, input: NewExpense) -> LedgerResult<Expense> {
        let input = validate_new_expense(input)?;

        let created_at = codec::now();
        let mut expense = Expense {
            id: String::new(),
            title: input.title,
            amount: input.amount,
            category: input
                .category
                .unwrap_or_else(|| DEFAULT_EXPENSE_CATEGORY.to_string()),
            note: input.note,
            expense_date: input.expense_date.unwrap_or_else(|| created_at.date_naive()),
            created_at,
        };
        expense.id = self.insert(Table::Expenses, &expense).await?;

        info!(
            expense_id = %expense.id,
            category = %expense.category,
            amount = %expense.amount,
            "Expense added"
        );
        Ok(expense)
    }

    /// Expenses, latest expense date first.
    pub async fn list_expenses(&self) -> LedgerResult<Vec<Expense>> {
        self.fetch_all(
            Table::Expenses,
            &Filter::all(),
            Some(&OrderBy::desc("expense_date")),
        )
        .await
    }

    pub async fn delete_expense(&self, id: &str) -> LedgerResult<()> {
        self.remove(Table::Expenses, "Expense", id).await
    }

    pub async fn expense_summary(&self) -> LedgerResult<ExpenseSummary> {
        let expenses = self.list_expenses().await?;
        let totals = expense_totals(&expenses, codec::now().date_naive());

        Ok(ExpenseSummary { expenses, totals })
    }
}
