//! Dashboard arithmetic over ledger records.
//!
//! Everything here is pure: callers fetch rows from the database and pass the
//! reference date in, which keeps "today" out of the math.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::structs::{Expense, ExpenseWithUser, Income};

/// A ledger row that carries an amount and a timestamp.
pub trait Entry {
    fn amount(&self) -> f64;
    fn date(&self) -> NaiveDateTime;
}

impl Entry for Income {
    fn amount(&self) -> f64 {
        self.amount
    }
    fn date(&self) -> NaiveDateTime {
        self.date
    }
}

impl Entry for Expense {
    fn amount(&self) -> f64 {
        self.amount
    }
    fn date(&self) -> NaiveDateTime {
        self.date
    }
}

impl Entry for ExpenseWithUser {
    fn amount(&self) -> f64 {
        self.expense.amount
    }
    fn date(&self) -> NaiveDateTime {
        self.expense.date
    }
}

/// Half-open `[start, end)` window of local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
        DateRange {
            start: midnight(date),
            end: midnight(next),
        }
    }

    pub fn month(date: NaiveDate) -> Self {
        let start = first_of_month(date.year(), date.month());
        let end = if date.month() == 12 {
            first_of_month(date.year() + 1, 1)
        } else {
            first_of_month(date.year(), date.month() + 1)
        };
        DateRange {
            start: midnight(start),
            end: midnight(end),
        }
    }

    pub fn year(year: i32) -> Self {
        DateRange {
            start: midnight(first_of_month(year, 1)),
            end: midnight(first_of_month(year + 1, 1)),
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub amount: f64,
    pub count: usize,
}

pub fn totals_within<E: Entry>(entries: &[E], range: DateRange) -> Totals {
    entries
        .iter()
        .filter(|e| range.contains(e.date()))
        .fold(Totals::default(), |acc, e| Totals {
            amount: acc.amount + e.amount(),
            count: acc.count + 1,
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UserSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    /// Expenses recorded this month.
    pub transaction_count: usize,
    pub total_daily_expense: f64,
    pub daily_transaction_count: usize,
}

pub fn user_summary(incomes: &[Income], expenses: &[Expense], today: NaiveDate) -> UserSummary {
    let month = DateRange::month(today);
    let income = totals_within(incomes, month);
    let expense = totals_within(expenses, month);
    let daily = totals_within(expenses, DateRange::day(today));

    UserSummary {
        total_income: income.amount,
        total_expense: expense.amount,
        balance: income.amount - expense.amount,
        transaction_count: expense.count,
        total_daily_expense: daily.amount,
        daily_transaction_count: daily.count,
    }
}

/// Sums a year's expenses into twelve monthly buckets, January first.
pub fn monthly_series<E: Entry>(entries: &[E], year: i32) -> [f64; 12] {
    let mut buckets = [0.0; 12];
    for entry in entries {
        let date = entry.date();
        if date.year() == year {
            buckets[date.month0() as usize] += entry.amount();
        }
    }
    buckets
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AdminSummary {
    pub total_users: i64,
    pub total_daily_expenses: f64,
    pub total_monthly_expenses: f64,
    pub total_transactions_today: usize,
}

pub fn admin_summary(total_users: i64, expenses: &[ExpenseWithUser], today: NaiveDate) -> AdminSummary {
    let daily = totals_within(expenses, DateRange::day(today));
    let monthly = totals_within(expenses, DateRange::month(today));

    AdminSummary {
        total_users,
        total_daily_expenses: daily.amount,
        total_monthly_expenses: monthly.amount,
        total_transactions_today: daily.count,
    }
}

/// Expenses from `today`, newest first, capped at `limit`.
pub fn todays_expenses(expenses: &[Expense], today: NaiveDate, limit: usize) -> Vec<Expense> {
    let range = DateRange::day(today);
    let mut todays: Vec<Expense> = expenses
        .iter()
        .filter(|e| range.contains(e.date))
        .cloned()
        .collect();
    todays.sort_by(|a, b| b.date.cmp(&a.date));
    todays.truncate(limit);
    todays
}
