//! Lending invariants exercised through the service layer

use std::collections::HashMap;

use chrono::NaiveDate;
use library_server::{
    models::{
        author::CreateAuthor,
        book::{BookQuery, CreateBook},
        borrower::CreateBorrower,
        loan::LoanHistoryQuery,
    },
    services::Services,
    AppError,
};
use tempfile::TempDir;

use crate::common::{file_repository, services};

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(n))
}

async fn seed_books(services: &Services, count: usize) -> (Vec<i64>, Vec<i64>) {
    let author = services
        .records
        .add_author(CreateAuthor { name: "A. Author".into() })
        .await
        .unwrap();

    let mut books = Vec::new();
    let mut borrowers = Vec::new();
    for i in 0..count {
        let book = services
            .records
            .add_book(CreateBook {
                title: format!("Volume {}", i + 1),
                author_id: author.id,
                genre: "Reference".into(),
            })
            .await
            .unwrap();
        books.push(book.id);

        let borrower = services
            .records
            .add_borrower(CreateBorrower {
                name: format!("Reader {}", i + 1),
                email: format!("reader{}@example.com", i + 1),
            })
            .await
            .unwrap();
        borrowers.push(borrower.id);
    }
    (books, borrowers)
}

/// Every book's flag matches the number of its open loans
async fn assert_consistent(services: &Services) {
    let (books, _) = services.catalog.list_books(&BookQuery::default()).await.unwrap();
    for book in books {
        let open = services
            .catalog
            .list_loan_history(&LoanHistoryQuery {
                book_id: Some(book.id),
                borrower_id: None,
                open_only: Some(true),
            })
            .await
            .unwrap();
        assert!(open.len() <= 1, "book {} has {} open loans", book.id, open.len());
        assert_eq!(book.is_borrowed, open.len() == 1, "book {}", book.id);
    }

    let stats = services.stats.get_stats().await.unwrap();
    assert!(stats.status_mismatches.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_open_exactly_one_loan() {
    let services = services().await;
    let (books, borrowers) = seed_books(&services, 8).await;
    let book_id = books[0];

    let mut handles = Vec::new();
    for borrower_id in borrowers.clone() {
        let services = services.clone();
        handles.push(tokio::spawn(async move {
            services.lending.borrow_book(book_id, borrower_id, day(0)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(loan) => {
                assert!(loan.is_open());
                successes += 1;
            }
            Err(AppError::AlreadyBorrowed(id)) => assert_eq!(id, book_id),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(successes, 1);

    let open = services
        .catalog
        .list_loan_history(&LoanHistoryQuery {
            book_id: Some(book_id),
            borrower_id: None,
            open_only: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_consistent(&services).await;
}

/// Borrow then return, failing on anything but the expected state-machine rejections
async fn borrow_and_return(services: Services, book_id: i64, borrower_id: i64, round: u32) {
    match services.lending.borrow_book(book_id, borrower_id, day(round)).await {
        Ok(_) | Err(AppError::AlreadyBorrowed(_)) => {}
        Err(other) => panic!("borrow of book {} failed: {:?}", book_id, other),
    }
    // Later than every borrow date used here
    match services.lending.return_book(book_id, day(30)).await {
        Ok(_) | Err(AppError::NotCurrentlyBorrowed(_)) => {}
        Err(other) => panic!("return of book {} failed: {:?}", book_id, other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_traffic_on_many_books_stays_consistent() {
    let services = services().await;
    let (books, borrowers) = seed_books(&services, 6).await;

    let mut handles = Vec::new();
    for (i, book_id) in books.iter().copied().enumerate() {
        for round in 0..3u32 {
            let borrower_id = borrowers[(i + round as usize) % borrowers.len()];
            handles.push(tokio::spawn(borrow_and_return(
                services.clone(),
                book_id,
                borrower_id,
                round,
            )));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_consistent(&services).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_database_races_open_one_loan_per_book() {
    let dir = TempDir::new().unwrap();
    let repository = file_repository(&dir).await;
    // Separate lock registries, like two server processes on one database file
    let nodes = [Services::new(repository.clone()), Services::new(repository)];
    let (books, borrowers) = seed_books(&nodes[0], 32).await;

    let mut handles = Vec::new();
    for book_id in books.iter().copied() {
        for (n, borrower_id) in borrowers.iter().copied().take(4).enumerate() {
            let services = nodes[n % nodes.len()].clone();
            handles.push(tokio::spawn(async move {
                (book_id, services.lending.borrow_book(book_id, borrower_id, day(0)).await)
            }));
        }
    }

    let mut successes: HashMap<i64, usize> = HashMap::new();
    for handle in handles {
        match handle.await.unwrap() {
            (book_id, Ok(loan)) => {
                assert_eq!(loan.book_id, book_id);
                *successes.entry(book_id).or_default() += 1;
            }
            (book_id, Err(AppError::AlreadyBorrowed(id))) => assert_eq!(id, book_id),
            (book_id, Err(other)) => panic!("borrow of book {} failed: {:?}", book_id, other),
        }
    }
    assert_eq!(successes.len(), books.len());
    assert!(successes.values().all(|n| *n == 1));

    let stats = nodes[1].stats.get_stats().await.unwrap();
    assert_eq!(stats.loans_open, books.len() as i64);
    assert_eq!(stats.borrowed_books, books.len() as i64);
    assert_consistent(&nodes[1]).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_database_borrow_return_traffic() {
    let dir = TempDir::new().unwrap();
    let repository = file_repository(&dir).await;
    let nodes = [Services::new(repository.clone()), Services::new(repository)];
    let (books, borrowers) = seed_books(&nodes[0], 8).await;

    let mut handles = Vec::new();
    for (i, book_id) in books.iter().copied().enumerate() {
        for round in 0..4u32 {
            let services = nodes[(i + round as usize) % nodes.len()].clone();
            let borrower_id = borrowers[(i + round as usize) % borrowers.len()];
            handles.push(tokio::spawn(borrow_and_return(services, book_id, borrower_id, round)));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_consistent(&nodes[0]).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stats_read_one_snapshot_during_lending() {
    let dir = TempDir::new().unwrap();
    let services = Services::new(file_repository(&dir).await);
    let (books, borrowers) = seed_books(&services, 12).await;

    let writer = {
        let services = services.clone();
        tokio::spawn(async move {
            for (book_id, borrower_id) in books.into_iter().zip(borrowers) {
                services
                    .lending
                    .borrow_book(book_id, borrower_id, day(0))
                    .await
                    .unwrap();
            }
        })
    };

    while !writer.is_finished() {
        let stats = services.stats.get_stats().await.unwrap();
        assert_eq!(stats.borrowed_books, stats.loans_open);
        assert_eq!(stats.available_books + stats.borrowed_books, stats.books);
        assert!(stats.status_mismatches.is_empty());
    }
    writer.await.unwrap();

    let stats = services.stats.get_stats().await.unwrap();
    assert_eq!(stats.borrowed_books, 12);
    assert_eq!(stats.loans_open, 12);
}

#[tokio::test]
async fn test_history_is_append_only() {
    let services = services().await;
    let (books, borrowers) = seed_books(&services, 1).await;
    let (book_id, borrower_id) = (books[0], borrowers[0]);

    for round in 0..3u32 {
        services
            .lending
            .borrow_book(book_id, borrower_id, day(round * 10))
            .await
            .unwrap();
        assert_consistent(&services).await;
        let closed = services
            .lending
            .return_book(book_id, day(round * 10 + 3))
            .await
            .unwrap();
        assert_eq!(closed.return_date, Some(day(round * 10 + 3)));
        assert_consistent(&services).await;
    }

    let history = services
        .catalog
        .list_loan_history(&LoanHistoryQuery::for_book(book_id))
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|loan| !loan.is_open()));
    assert!(history.windows(2).all(|w| w[0].borrow_date < w[1].borrow_date));
    // Earlier records were not touched by later returns
    assert_eq!(history[0].return_date, Some(day(3)));

    assert!(matches!(
        services.lending.return_book(book_id, day(40)).await,
        Err(AppError::NotCurrentlyBorrowed(_))
    ));
}
