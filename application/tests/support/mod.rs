#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use error_stack::Report;
use tokio::sync::OwnedMutexGuard;

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    BookQuery, BorrowRecordQuery, BorrowerQuery, DependOnBookQuery, DependOnBorrowRecordQuery,
    DependOnBorrowerQuery,
};
use kernel::interface::update::{
    BookModifier, BorrowRecordModifier, BorrowerModifier, DependOnBookModifier,
    DependOnBorrowRecordModifier, DependOnBorrowerModifier,
};
use kernel::prelude::entity::{
    Book, BookAuthor, BookGenre, BookId, BookStatus, BookTitle, BorrowRecord, BorrowRecordId,
    BorrowedAt, Borrower, BorrowerEmail, BorrowerId, BorrowerName, ReturnedAt, SelectLimit,
    SelectOffset,
};
use kernel::KernelError;

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub books: BTreeMap<BookId, Book>,
    pub borrowers: BTreeMap<BorrowerId, Borrower>,
    pub records: BTreeMap<BorrowRecordId, BorrowRecord>,
}

#[derive(Debug, Clone)]
enum Write {
    Book(BookId, Option<Book>),
    Borrower(BorrowerId, Option<Borrower>),
    Record(BorrowRecordId, Option<BorrowRecord>),
}

impl Write {
    fn apply(&self, tables: &mut Tables) {
        match self {
            Write::Book(id, Some(book)) => {
                tables.books.insert(*id, book.clone());
            }
            Write::Book(id, None) => {
                tables.books.remove(id);
            }
            Write::Borrower(id, Some(borrower)) => {
                tables.borrowers.insert(*id, borrower.clone());
            }
            Write::Borrower(id, None) => {
                tables.borrowers.remove(id);
            }
            Write::Record(id, Some(record)) => {
                tables.records.insert(*id, record.clone());
            }
            Write::Record(id, None) => {
                tables.records.remove(id);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Row {
    Book(BookId),
    Borrower(BorrowerId),
    Record(BorrowRecordId),
}

#[derive(Default)]
struct Shared {
    committed: Mutex<Tables>,
    rows: Mutex<HashMap<Row, Arc<tokio::sync::Mutex<()>>>>,
    sequence: AtomicI64,
    fail_record_insert: AtomicBool,
}

impl Shared {
    fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn committed(&self) -> Tables {
        self.committed.lock().expect("committed tables poisoned").clone()
    }
}

/// Store with read-committed visibility and row locks.
///
/// Transactions run side by side. Reads see the latest committed state plus
/// the transaction's own writes; every write to an existing row takes that
/// row's lock until commit or rollback, and re-reads the row once the lock is
/// granted. Commit applies the write log and checks the schema constraints
/// (foreign keys, one open record per book, unique emails).
#[derive(Clone, Default)]
pub struct InMemoryDatabase(Arc<Shared>);

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Tables {
        self.0.committed()
    }

    /// Makes every following borrow record insert fail with a storage error.
    pub fn fail_record_insert(&self, fail: bool) {
        self.0.fail_record_insert.store(fail, Ordering::SeqCst);
    }

    /// Inserts a borrower without any of the service checks.
    pub async fn seed_borrower(&self, name: &str, email: &str) -> i64 {
        let id = BorrowerId::new(self.0.next_id());
        let mut tables = self.0.committed.lock().expect("committed tables poisoned");
        tables.borrowers.insert(
            id,
            Borrower::new(id, BorrowerName::new(name), BorrowerEmail::new(email)),
        );
        id.into()
    }

    /// Inserts an open record without touching the book's status.
    pub async fn seed_open_record(&self, book_id: i64, borrower_id: i64, date: time::Date) -> i64 {
        let id = BorrowRecordId::new(self.0.next_id());
        let mut tables = self.0.committed.lock().expect("committed tables poisoned");
        tables.records.insert(
            id,
            BorrowRecord::new(
                id,
                BookId::new(book_id),
                BorrowerId::new(borrower_id),
                BorrowedAt::new(date),
                None,
            ),
        );
        id.into()
    }

    /// Every book is borrowed exactly when it has one open record.
    pub async fn assert_availability_consistent(&self) {
        let tables = self.snapshot().await;
        for (id, book) in &tables.books {
            let open = tables
                .records
                .values()
                .filter(|record| record.book_id() == id && record.is_open())
                .count();
            assert!(open <= 1, "book {:?} has {} open records", id, open);
            assert_eq!(
                book.status().is_borrowed(),
                open == 1,
                "book {:?} status {:?} with {} open records",
                id,
                book.status(),
                open
            );
        }
        for record in tables.records.values() {
            assert!(
                tables.books.contains_key(record.book_id()),
                "orphaned record {:?}",
                record
            );
        }
    }
}

pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    view: Tables,
    writes: Vec<Write>,
    held: HashSet<Row>,
    guards: Vec<OwnedMutexGuard<()>>,
    fail_record_insert: bool,
}

impl InMemoryTransaction {
    /// Rebuilds the view from the latest commit and this transaction's writes.
    async fn refresh(&mut self) {
        tokio::task::yield_now().await;
        let mut view = self.shared.committed();
        for write in &self.writes {
            write.apply(&mut view);
        }
        self.view = view;
    }

    async fn lock_row(&mut self, row: Row) {
        if self.held.insert(row) {
            let mutex = self
                .shared
                .rows
                .lock()
                .expect("row locks poisoned")
                .entry(row)
                .or_default()
                .clone();
            self.guards.push(mutex.lock_owned().await);
        }
        self.refresh().await;
    }

    fn write(&mut self, write: Write) {
        write.apply(&mut self.view);
        self.writes.push(write);
    }
}

fn check_constraints(tables: &Tables, writes: &[Write]) -> error_stack::Result<(), KernelError> {
    for record in tables.records.values() {
        if !tables.books.contains_key(record.book_id())
            || !tables.borrowers.contains_key(record.borrower_id())
        {
            return Err(Report::new(KernelError::Internal).attach_printable(format!(
                "foreign key violation on borrow record {}",
                record.id().as_ref()
            )));
        }
        let open = tables
            .records
            .values()
            .filter(|other| other.book_id() == record.book_id() && other.is_open())
            .count();
        if open > 1 {
            return Err(Report::new(KernelError::Internal).attach_printable(format!(
                "book {} has {} open records",
                record.book_id().as_ref(),
                open
            )));
        }
    }
    for write in writes {
        if let Write::Borrower(_, Some(borrower)) = write {
            let same = tables
                .borrowers
                .values()
                .filter(|other| other.email() == borrower.email())
                .count();
            if same > 1 {
                return Err(Report::new(KernelError::DuplicateEmail)
                    .attach_printable(format!("email {}", borrower.email().as_ref())));
            }
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.0),
            view: self.0.committed(),
            writes: Vec::new(),
            held: HashSet::new(),
            guards: Vec::new(),
            fail_record_insert: self.0.fail_record_insert.load(Ordering::SeqCst),
        })
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        let Self {
            shared,
            writes,
            guards,
            ..
        } = self;
        {
            let mut committed = shared.committed.lock().expect("committed tables poisoned");
            let mut next = committed.clone();
            for write in &writes {
                write.apply(&mut next);
            }
            check_constraints(&next, &writes)?;
            *committed = next;
        }
        drop(guards);
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

pub struct InMemoryRepository;

fn page<T: Clone>(rows: impl Iterator<Item = T>, limit: &SelectLimit, offset: &SelectOffset) -> Vec<T> {
    rows.skip(*offset.as_ref() as usize)
        .take(*limit.as_ref() as usize)
        .collect()
}

#[async_trait::async_trait]
impl BookQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        con.refresh().await;
        Ok(con.view.books.get(id).cloned())
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        con.refresh().await;
        Ok(page(con.view.books.values().cloned(), limit, offset))
    }

    async fn find_by_author(
        &self,
        con: &mut InMemoryTransaction,
        author: &BookAuthor,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        con.refresh().await;
        Ok(con
            .view
            .books
            .values()
            .filter(|book| book.author() == author)
            .cloned()
            .collect())
    }

    async fn find_by_title(
        &self,
        con: &mut InMemoryTransaction,
        title: &BookTitle,
    ) -> error_stack::Result<Vec<Book>, KernelError> {
        con.refresh().await;
        let wanted = title.as_ref().to_lowercase();
        Ok(con
            .view
            .books
            .values()
            .filter(|book| book.title().as_ref().to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    async fn find_authors(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<Vec<BookAuthor>, KernelError> {
        con.refresh().await;
        let mut authors = con
            .view
            .books
            .values()
            .map(|book| book.author().clone())
            .collect::<Vec<_>>();
        authors.sort();
        authors.dedup();
        Ok(authors)
    }
}

#[async_trait::async_trait]
impl BookModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        title: &BookTitle,
        author: &BookAuthor,
        genre: &BookGenre,
    ) -> error_stack::Result<BookId, KernelError> {
        let id = BookId::new(con.shared.next_id());
        let book = Book::new(
            id,
            title.clone(),
            author.clone(),
            genre.clone(),
            BookStatus::Available,
        );
        con.write(Write::Book(id, Some(book)));
        Ok(id)
    }

    async fn lock(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<Book>, KernelError> {
        con.lock_row(Row::Book(*book_id)).await;
        Ok(con.view.books.get(book_id).cloned())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        book: &Book,
    ) -> error_stack::Result<(), KernelError> {
        con.lock_row(Row::Book(*book.id())).await;
        let Some(stored) = con.view.books.get(book.id()).cloned() else {
            return Err(Report::new(KernelError::BookNotFound));
        };
        let updated = stored.reconstruct(|stored| {
            stored.title = book.title().clone();
            stored.author = book.author().clone();
            stored.genre = book.genre().clone();
        });
        con.write(Write::Book(*book.id(), Some(updated)));
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<(), KernelError> {
        con.lock_row(Row::Book(*book_id)).await;
        if con.view.records.values().any(|r| r.book_id() == book_id) {
            return Err(Report::new(KernelError::Internal)
                .attach_printable("foreign key violation on borrow_records.book_id"));
        }
        if !con.view.books.contains_key(book_id) {
            return Err(Report::new(KernelError::BookNotFound));
        }
        con.write(Write::Book(*book_id, None));
        Ok(())
    }

    async fn change_status(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
        expected: &BookStatus,
        next: &BookStatus,
    ) -> error_stack::Result<bool, KernelError> {
        con.lock_row(Row::Book(*book_id)).await;
        match con.view.books.get(book_id).cloned() {
            Some(book) if book.status() == expected => {
                let changed = book.reconstruct(|book| book.status = *next);
                con.write(Write::Book(*book_id, Some(changed)));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl BorrowerQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BorrowerId,
    ) -> error_stack::Result<Option<Borrower>, KernelError> {
        con.refresh().await;
        Ok(con.view.borrowers.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        con: &mut InMemoryTransaction,
        email: &BorrowerEmail,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        con.refresh().await;
        Ok(con
            .view
            .borrowers
            .values()
            .filter(|borrower| borrower.email() == email)
            .cloned()
            .collect())
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        limit: &SelectLimit,
        offset: &SelectOffset,
    ) -> error_stack::Result<Vec<Borrower>, KernelError> {
        con.refresh().await;
        Ok(page(con.view.borrowers.values().cloned(), limit, offset))
    }
}

#[async_trait::async_trait]
impl BorrowerModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        name: &BorrowerName,
        email: &BorrowerEmail,
    ) -> error_stack::Result<BorrowerId, KernelError> {
        let id = BorrowerId::new(con.shared.next_id());
        con.write(Write::Borrower(
            id,
            Some(Borrower::new(id, name.clone(), email.clone())),
        ));
        Ok(id)
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        borrower: &Borrower,
    ) -> error_stack::Result<(), KernelError> {
        con.lock_row(Row::Borrower(*borrower.id())).await;
        if !con.view.borrowers.contains_key(borrower.id()) {
            return Err(Report::new(KernelError::BorrowerNotFound));
        }
        con.write(Write::Borrower(*borrower.id(), Some(borrower.clone())));
        Ok(())
    }

    async fn delete(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<(), KernelError> {
        con.lock_row(Row::Borrower(*borrower_id)).await;
        if !con.view.borrowers.contains_key(borrower_id) {
            return Err(Report::new(KernelError::BorrowerNotFound));
        }
        con.write(Write::Borrower(*borrower_id, None));
        Ok(())
    }
}

fn ordered(mut records: Vec<BorrowRecord>) -> Vec<BorrowRecord> {
    records.sort_by_key(|r| (*r.borrowed_at(), *r.id()));
    records
}

#[async_trait::async_trait]
impl BorrowRecordQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BorrowRecordId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(con.view.records.get(id).cloned())
    }

    async fn find_open(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(con
            .view
            .records
            .values()
            .find(|r| r.book_id() == book_id && r.borrower_id() == borrower_id && r.is_open())
            .cloned())
    }

    async fn find_open_by_book(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Option<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(con
            .view
            .records
            .values()
            .find(|r| r.book_id() == book_id && r.is_open())
            .cloned())
    }

    async fn find_open_by_borrower(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(ordered(
            con.view
                .records
                .values()
                .filter(|r| r.borrower_id() == borrower_id && r.is_open())
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_borrower(
        &self,
        con: &mut InMemoryTransaction,
        borrower_id: &BorrowerId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(ordered(
            con.view
                .records
                .values()
                .filter(|r| r.borrower_id() == borrower_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_book(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<Vec<BorrowRecord>, KernelError> {
        con.refresh().await;
        Ok(ordered(
            con.view
                .records
                .values()
                .filter(|r| r.book_id() == book_id)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait::async_trait]
impl BorrowRecordModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
        borrower_id: &BorrowerId,
        borrowed_at: &BorrowedAt,
    ) -> error_stack::Result<BorrowRecordId, KernelError> {
        if con.fail_record_insert {
            return Err(Report::new(KernelError::Internal).attach_printable("injected failure"));
        }
        let id = BorrowRecordId::new(con.shared.next_id());
        con.write(Write::Record(
            id,
            Some(BorrowRecord::new(id, *book_id, *borrower_id, *borrowed_at, None)),
        ));
        Ok(id)
    }

    async fn close(
        &self,
        con: &mut InMemoryTransaction,
        id: &BorrowRecordId,
        returned_at: &ReturnedAt,
    ) -> error_stack::Result<bool, KernelError> {
        con.lock_row(Row::Record(*id)).await;
        match con.view.records.get(id).cloned() {
            Some(record) if record.is_open() => {
                let closed = record.reconstruct(|record| record.returned_at = Some(*returned_at));
                con.write(Write::Record(*id, Some(closed)));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_by_book_id(
        &self,
        con: &mut InMemoryTransaction,
        book_id: &BookId,
    ) -> error_stack::Result<u64, KernelError> {
        con.refresh().await;
        let ids = con
            .view
            .records
            .values()
            .filter(|r| r.book_id() == book_id)
            .map(|r| *r.id())
            .collect::<Vec<_>>();
        for id in &ids {
            con.lock_row(Row::Record(*id)).await;
        }
        let mut removed = 0;
        for id in ids {
            if con.view.records.contains_key(&id) {
                con.write(Write::Record(id, None));
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl DependOnBookQuery for InMemoryDatabase {
    type BookQuery = InMemoryRepository;
    fn book_query(&self) -> &Self::BookQuery {
        &InMemoryRepository
    }
}

impl DependOnBookModifier for InMemoryDatabase {
    type BookModifier = InMemoryRepository;
    fn book_modifier(&self) -> &Self::BookModifier {
        &InMemoryRepository
    }
}

impl DependOnBorrowerQuery for InMemoryDatabase {
    type BorrowerQuery = InMemoryRepository;
    fn borrower_query(&self) -> &Self::BorrowerQuery {
        &InMemoryRepository
    }
}

impl DependOnBorrowerModifier for InMemoryDatabase {
    type BorrowerModifier = InMemoryRepository;
    fn borrower_modifier(&self) -> &Self::BorrowerModifier {
        &InMemoryRepository
    }
}

impl DependOnBorrowRecordQuery for InMemoryDatabase {
    type BorrowRecordQuery = InMemoryRepository;
    fn borrow_record_query(&self) -> &Self::BorrowRecordQuery {
        &InMemoryRepository
    }
}

impl DependOnBorrowRecordModifier for InMemoryDatabase {
    type BorrowRecordModifier = InMemoryRepository;
    fn borrow_record_modifier(&self) -> &Self::BorrowRecordModifier {
        &InMemoryRepository
    }
}
