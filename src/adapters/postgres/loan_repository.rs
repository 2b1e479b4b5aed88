use crate::domain::{BookId, Loan, LoanFilter, LoanId, Page, PageRequest};
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, OpenLoanConflict, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};

/// 書籍ごとの未返却貸出の部分一意インデックス名（migrations参照）
const OPEN_LOAN_UNIQUE_INDEX: &str = "loans_open_book_idx";

const LOAN_COLUMNS: &str = "l.id, l.book_id, l.customer, l.customer_email, l.loan_date, l.returned";

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Loan {
    Loan {
        id: Some(LoanId::from_i64(row.get("id"))),
        book_id: BookId::from_i64(row.get("book_id")),
        customer: row.get("customer"),
        customer_email: row.get("customer_email"),
        loan_date: row.get("loan_date"),
        returned: row.get("returned"),
    }
}

fn map_write_error(err: sqlx::Error, book_id: BookId) -> Box<dyn std::error::Error + Send + Sync> {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(OPEN_LOAN_UNIQUE_INDEX) {
            return Box::new(OpenLoanConflict { book_id });
        }
    }
    Box::new(err)
}

/// 検索条件からWHERE句を組み立てる
///
/// 戻り値はWHERE句とバインドする値（プレースホルダ順）。
/// 比較は大文字小文字を区別しない。
fn build_filter_clause(filter: &LoanFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(isbn) = filter.isbn() {
        binds.push(isbn.to_string());
        conditions.push(format!("UPPER(b.isbn) = UPPER(${})", binds.len()));
    }
    if let Some(customer) = filter.customer() {
        binds.push(customer.to_string());
        conditions.push(format!("UPPER(l.customer) = UPPER(${})", binds.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, binds)
}

/// LoanRepositoryのPostgreSQL実装
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn save(&self, loan: &Loan) -> Result<Loan> {
        let row = sqlx::query(
            r#"
            INSERT INTO loans (book_id, customer, customer_email, loan_date, returned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, book_id, customer, customer_email, loan_date, returned
            "#,
        )
        .bind(loan.book_id.value())
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, loan.book_id))?;

        Ok(map_row_to_loan(&row))
    }

    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>> {
        let query = format!("SELECT {} FROM loans l WHERE l.id = $1", LOAN_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    async fn update(&self, id: LoanId, loan: &Loan) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            UPDATE loans AS l
            SET book_id = $2,
                customer = $3,
                customer_email = $4,
                loan_date = $5,
                returned = $6
            WHERE l.id = $1
            RETURNING l.id, l.book_id, l.customer, l.customer_email, l.loan_date, l.returned
            "#,
        )
        .bind(id.value())
        .bind(loan.book_id.value())
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(loan.loan_date)
        .bind(loan.returned)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, loan.book_id))?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    /// 条件付き検索（ページング）
    ///
    /// 件数取得と行取得で同じWHERE句を使う。
    async fn find_by_filter(&self, filter: &LoanFilter, page: PageRequest) -> Result<Page<Loan>> {
        let (where_clause, binds) = build_filter_clause(filter);

        let count_q = format!(
            "SELECT COUNT(*) FROM loans l JOIN books b ON b.id = l.book_id {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        for value in &binds {
            count_builder = count_builder.bind(value.as_str());
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT {} FROM loans l JOIN books b ON b.id = l.book_id {} ORDER BY l.id ASC LIMIT {} OFFSET {}",
            LOAN_COLUMNS,
            where_clause,
            page.size(),
            page.offset()
        );
        let mut builder = sqlx::query(&select_q);
        for value in &binds {
            builder = builder.bind(value.as_str());
        }
        let rows = builder.fetch_all(&self.pool).await?;

        let loans = rows.iter().map(map_row_to_loan).collect();
        Ok(Page::new(loans, page, total.max(0) as u64))
    }

    async fn find_by_book(&self, book_id: BookId, page: PageRequest) -> Result<Page<Loan>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id.value())
            .fetch_one(&self.pool)
            .await?;

        let select_q = format!(
            "SELECT {} FROM loans l WHERE l.book_id = $1 ORDER BY l.id ASC LIMIT {} OFFSET {}",
            LOAN_COLUMNS,
            page.size(),
            page.offset()
        );
        let rows = sqlx::query(&select_q)
            .bind(book_id.value())
            .fetch_all(&self.pool)
            .await?;

        let loans = rows.iter().map(map_row_to_loan).collect();
        Ok(Page::new(loans, page, total.max(0) as u64))
    }

    /// 延滞候補を検索（バッチ通知用）
    ///
    /// 部分インデックス (loan_date) WHERE NOT returned を使用する。
    async fn find_late(&self, threshold: NaiveDate) -> Result<Vec<Loan>> {
        let query = format!(
            "SELECT {} FROM loans l WHERE NOT l.returned AND l.loan_date < $1 ORDER BY l.loan_date ASC, l.id ASC",
            LOAN_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(map_row_to_loan).collect())
    }

    async fn exists_open_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE book_id = $1 AND NOT returned)",
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
