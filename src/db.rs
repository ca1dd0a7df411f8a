use crate::{
    aggregate::DateRange,
    errors::AppError,
    structs::{Expense, ExpenseWithUser, Income, NewExpense, NewIncome, Role, User},
    utils::hash_password,
    AppState,
};

/// Outcome of inserting a user; a taken username is not an error.
#[derive(Debug)]
pub enum CreateUser {
    Created(User),
    UsernameTaken,
}

pub async fn get_user_by_id(state: &AppState, id: i64) -> Result<Option<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_username(
    state: &AppState,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&pool)
        .await?;
    Ok(user)
}

pub async fn get_non_admin_users(state: &AppState) -> Result<Vec<User>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role != $1 ORDER BY id")
        .bind(Role::Admin.as_str())
        .fetch_all(&pool)
        .await?;
    Ok(users)
}

pub async fn count_users_with_role(state: &AppState, role: Role) -> Result<i64, sqlx::Error> {
    let pool = state.db_pool.clone();
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role.as_str())
        .fetch_one(&pool)
        .await?;
    Ok(count)
}

pub async fn create_user(
    state: &AppState,
    username: &str,
    password: &str,
    role: Role,
) -> Result<CreateUser, AppError> {
    if get_user_by_username(state, username).await?.is_some() {
        return Ok(CreateUser::UsernameTaken);
    }

    let created_at = chrono::Utc::now().to_string();
    let pwd_hash = hash_password(password)?;
    let pool = state.db_pool.clone();
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, pwd_hash, role, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(username)
    .bind(pwd_hash)
    .bind(role.as_str())
    .bind(&created_at)
    .fetch_one(&pool)
    .await;

    match result {
        Ok(user) => {
            log::info!("User created: {} ({})", user.username, user.role);
            Ok(CreateUser::Created(user))
        }
        // Lost a race with a concurrent registration of the same name.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(CreateUser::UsernameTaken),
        Err(e) => Err(AppError::DatabaseError(e)),
    }
}

pub async fn create_income(
    state: &AppState,
    user_id: i64,
    income: NewIncome,
) -> Result<Income, sqlx::Error> {
    let pool = state.db_pool.clone();
    let income = sqlx::query_as::<_, Income>(
        "INSERT INTO incomes (user_id, amount, description, date) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user_id)
    .bind(income.amount)
    .bind(income.description)
    .bind(income.date)
    .fetch_one(&pool)
    .await?;
    log::info!("Income {} recorded for user {}", income.id, user_id);
    Ok(income)
}

pub async fn create_expense(
    state: &AppState,
    user_id: i64,
    expense: NewExpense,
) -> Result<Expense, sqlx::Error> {
    let pool = state.db_pool.clone();
    let expense = sqlx::query_as::<_, Expense>(
        "INSERT INTO expenses (user_id, name, amount, description, method, date) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(user_id)
    .bind(expense.name)
    .bind(expense.amount)
    .bind(expense.description)
    .bind(expense.method)
    .bind(expense.date)
    .fetch_one(&pool)
    .await?;
    log::info!("Expense {} recorded for user {}", expense.id, user_id);
    Ok(expense)
}

pub async fn get_incomes_within(
    state: &AppState,
    user_id: i64,
    range: DateRange,
) -> Result<Vec<Income>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let incomes = sqlx::query_as::<_, Income>(
        "SELECT * FROM incomes WHERE user_id = $1 AND date >= $2 AND date < $3 ORDER BY date DESC",
    )
    .bind(user_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(&pool)
    .await?;
    Ok(incomes)
}

pub async fn get_expenses_within(
    state: &AppState,
    user_id: i64,
    range: DateRange,
) -> Result<Vec<Expense>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let expenses = sqlx::query_as::<_, Expense>(
        "SELECT * FROM expenses WHERE user_id = $1 AND date >= $2 AND date < $3 ORDER BY date DESC",
    )
    .bind(user_id)
    .bind(range.start)
    .bind(range.end)
    .fetch_all(&pool)
    .await?;
    Ok(expenses)
}

/// Every expense a user owns, in the order they were recorded.
pub async fn get_expenses_for_user(
    state: &AppState,
    user_id: i64,
) -> Result<Vec<Expense>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let expenses =
        sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&pool)
            .await?;
    Ok(expenses)
}

pub async fn get_all_expenses_with_user(
    state: &AppState,
) -> Result<Vec<ExpenseWithUser>, sqlx::Error> {
    let pool = state.db_pool.clone();
    let expenses = sqlx::query_as::<_, ExpenseWithUser>(
        r#"
        SELECT e.id, e.user_id, e.name, e.amount, e.description, e.method, e.date, u.username
        FROM expenses e
        JOIN users u ON u.id = e.user_id
        ORDER BY e.date DESC, e.id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;
    Ok(expenses)
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::AppState;

    /// A fresh in-memory database with the migrations applied.
    pub async fn test_state() -> AppState {
        // One long-lived connection: every in-memory connection is its own database.
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!()
            .run(&db_pool)
            .await
            .expect("migrations apply");
        AppState { db_pool }
    }
}
