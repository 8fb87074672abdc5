mod category;
mod expense;
mod recurring;

pub use category::Category;
pub use expense::{Expense, MAX_AMOUNT};
pub use recurring::{Frequency, RecurringExpense};
