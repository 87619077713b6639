use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub use super::repo_types::{NewTransaction, Transaction, TransactionType};
use super::services::day_bounds;
use crate::error::StoreError;

/// Owner-scoped transaction store. Every method takes the owner id; there is no
/// way to read or write another user's rows through it.
#[async_trait]
pub trait TransactionRepo: Send + Sync {
    async fn list_all(&self, owner: Uuid) -> Result<Vec<Transaction>, StoreError>;

    async fn list_by_type(
        &self,
        owner: Uuid,
        kind: TransactionType,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Rows with `from <= date < until`; no upper limit when `until` is `None`.
    async fn list_by_date_range(
        &self,
        owner: Uuid,
        from: OffsetDateTime,
        until: Option<OffsetDateTime>,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Rows dated within the UTC calendar day `day`.
    async fn list_by_exact_date(
        &self,
        owner: Uuid,
        day: Date,
    ) -> Result<Vec<Transaction>, StoreError> {
        let (from, until) = day_bounds(day);
        self.list_by_date_range(owner, from, until).await
    }

    async fn create(&self, owner: Uuid, tx: NewTransaction) -> Result<Transaction, StoreError>;
}

#[derive(Clone)]
pub struct PgTransactionRepo {
    db: PgPool,
}

impl PgTransactionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionRepo for PgTransactionRepo {
    async fn list_all(&self, owner: Uuid) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, name, amount, category, kind, date, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_type(
        &self,
        owner: Uuid,
        kind: TransactionType,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, name, amount, category, kind, date, created_at
            FROM transactions
            WHERE user_id = $1 AND kind = $2
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(owner)
        .bind(kind)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_date_range(
        &self,
        owner: Uuid,
        from: OffsetDateTime,
        until: Option<OffsetDateTime>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, name, amount, category, kind, date, created_at
            FROM transactions
            WHERE user_id = $1 AND date >= $2 AND ($3::timestamptz IS NULL OR date < $3)
            ORDER BY date ASC, created_at ASC
            "#,
        )
        .bind(owner)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, owner: Uuid, tx: NewTransaction) -> Result<Transaction, StoreError> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, name, amount, category, kind, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, name, amount, category, kind, date, created_at
            "#,
        )
        .bind(owner)
        .bind(tx.name)
        .bind(tx.amount)
        .bind(tx.category)
        .bind(tx.kind)
        .bind(tx.date)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
pub use memory::MemoryTransactionRepo;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use super::*;
    use crate::transactions::services::within;

    /// Vec-backed transaction store for tests.
    #[derive(Default)]
    pub struct MemoryTransactionRepo {
        rows: Mutex<Vec<Transaction>>,
    }

    impl MemoryTransactionRepo {
        fn select(&self, pred: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
            let mut out: Vec<Transaction> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|t| pred(t))
                .cloned()
                .collect();
            out.sort_by_key(|t| (t.date, t.created_at));
            out
        }
    }

    #[async_trait]
    impl TransactionRepo for MemoryTransactionRepo {
        async fn list_all(&self, owner: Uuid) -> Result<Vec<Transaction>, StoreError> {
            Ok(self.select(|t| t.user_id == owner))
        }

        async fn list_by_type(
            &self,
            owner: Uuid,
            kind: TransactionType,
        ) -> Result<Vec<Transaction>, StoreError> {
            Ok(self.select(|t| t.user_id == owner && t.kind == kind))
        }

        async fn list_by_date_range(
            &self,
            owner: Uuid,
            from: OffsetDateTime,
            until: Option<OffsetDateTime>,
        ) -> Result<Vec<Transaction>, StoreError> {
            Ok(self.select(|t| t.user_id == owner && within((from, until), t.date)))
        }

        async fn create(
            &self,
            owner: Uuid,
            tx: NewTransaction,
        ) -> Result<Transaction, StoreError> {
            let row = Transaction {
                id: Uuid::new_v4(),
                user_id: owner,
                name: tx.name,
                amount: tx.amount,
                category: tx.category,
                kind: tx.kind,
                date: tx.date,
                created_at: OffsetDateTime::now_utc(),
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }
    }

    #[cfg(test)]
    mod tests {
        use time::macros::{date, datetime};

        use super::*;
        use crate::transactions::services::days_bounds;

        fn new_tx(kind: TransactionType, date: OffsetDateTime) -> NewTransaction {
            NewTransaction {
                name: "coffee".into(),
                amount: 4.5,
                category: "food".into(),
                kind,
                date,
            }
        }

        #[tokio::test]
        async fn queries_are_owner_scoped() {
            let repo = MemoryTransactionRepo::default();
            let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
            let when = datetime!(2024-01-10 09:00 UTC);
            repo.create(alice, new_tx(TransactionType::Income, when)).await.unwrap();
            repo.create(bob, new_tx(TransactionType::Income, when)).await.unwrap();
            repo.create(bob, new_tx(TransactionType::Expense, when)).await.unwrap();

            assert_eq!(repo.list_all(alice).await.unwrap().len(), 1);
            assert_eq!(repo.list_all(bob).await.unwrap().len(), 2);
            assert!(repo
                .list_by_type(alice, TransactionType::Expense)
                .await
                .unwrap()
                .is_empty());
            assert!(repo.list_all(Uuid::new_v4()).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn date_range_includes_end_day_and_excludes_next() {
            let repo = MemoryTransactionRepo::default();
            let owner = Uuid::new_v4();
            let last_day = repo
                .create(owner, new_tx(TransactionType::Expense, datetime!(2024-01-31 12:00 UTC)))
                .await
                .unwrap();
            repo.create(owner, new_tx(TransactionType::Expense, datetime!(2024-02-01 00:00 UTC)))
                .await
                .unwrap();
            let first = repo
                .create(owner, new_tx(TransactionType::Income, datetime!(2024-01-01 00:00 UTC)))
                .await
                .unwrap();

            let (from, until) = days_bounds(date!(2024 - 01 - 01), date!(2024 - 01 - 31)).unwrap();
            let found = repo.list_by_date_range(owner, from, until).await.unwrap();
            assert_eq!(found, vec![first, last_day]);
        }

        #[tokio::test]
        async fn exact_date_matches_whole_day() {
            let repo = MemoryTransactionRepo::default();
            let owner = Uuid::new_v4();
            for when in [
                datetime!(2024-03-04 23:59:59 UTC),
                datetime!(2024-03-05 00:00 UTC),
                datetime!(2024-03-05 23:59:59.999 UTC),
                datetime!(2024-03-06 00:00 UTC),
            ] {
                repo.create(owner, new_tx(TransactionType::Expense, when))
                    .await
                    .unwrap();
            }
            let found = repo
                .list_by_exact_date(owner, date!(2024 - 03 - 05))
                .await
                .unwrap();
            assert_eq!(found.len(), 2);
            assert!(found.iter().all(|t| t.date.date() == date!(2024 - 03 - 05)));
        }

        #[tokio::test]
        async fn last_representable_day_is_searchable() {
            let repo = MemoryTransactionRepo::default();
            let owner = Uuid::new_v4();
            let row = repo
                .create(owner, new_tx(TransactionType::Income, datetime!(9999-12-31 12:00 UTC)))
                .await
                .unwrap();
            repo.create(owner, new_tx(TransactionType::Income, datetime!(9999-12-30 12:00 UTC)))
                .await
                .unwrap();

            let found = repo
                .list_by_exact_date(owner, date!(9999 - 12 - 31))
                .await
                .unwrap();
            assert_eq!(found, vec![row]);
        }
    }
}
