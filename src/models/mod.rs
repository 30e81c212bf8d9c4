//! Data models for the catalog and lending records

pub mod author;
pub mod book;
pub mod borrower;
pub mod loan;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookStatus};
pub use borrower::Borrower;
pub use loan::LoanRecord;
