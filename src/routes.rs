use actix_identity::Identity;
use actix_session::Session;
use actix_web::{
    get,
    http::header::{self, ContentDisposition, DispositionParam, DispositionType},
    post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use chrono::Datelike;
use serde::Deserialize;
use tera::Context;

use crate::{
    aggregate::{self, DateRange},
    auth::SessionUser,
    db::{self, CreateUser},
    errors::AppError,
    export,
    flash::{self, Level},
    structs::{NewExpense, NewIncome, Role, User},
    utils::{local_now, parse_amount, verify_password},
    AppState, TEMPLATES,
};

const MAX_PASSWORD_LEN: usize = 128;
const TODAY_LIST_LIMIT: usize = 10;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login_handler)
        .service(login_form_handler)
        .service(register_handler)
        .service(register_form_handler)
        .service(logout_handler)
        .service(admin_dashboard_handler)
        .service(user_dashboard_handler)
        .service(dashboard_handler)
        .service(monthly_expenses_handler)
        .service(add_income_handler)
        .service(add_income_form_handler)
        .service(add_expense_form_handler)
        .service(export_expenses_handler);
}

fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::TemplateError(e)
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Context shared by every page: title, version and the pending flash messages.
fn page_context(session: &Session, title: &str) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("version", env!("CARGO_PKG_VERSION"));
    context.insert("messages", &flash::take(session));
    context
}

fn db_error(what: &str) -> impl Fn(sqlx::Error) -> AppError + '_ {
    move |e| {
        log::error!("Failed to {}: {}", what, e);
        AppError::DatabaseError(e)
    }
}

#[get("/")]
pub async fn login_handler(session: Session) -> Result<impl Responder, AppError> {
    let context = page_context(&session, "Login");
    render("login.html", &context)
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[post("/")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    session: Session,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let user = db::get_user_by_username(&state, form.username.trim())
        .await
        .map_err(db_error("look up user"))?;

    let authenticated = match &user {
        Some(user) => verify_password(&form.password, &user.pwd_hash).unwrap_or_else(|e| {
            log::error!("Stored hash for {} is unreadable: {}", user.username, e);
            false
        }),
        None => false,
    };

    match user {
        Some(user) if authenticated => {
            Identity::login(&request.extensions(), user.id.to_string())?;
            log::info!("User {} logged in", user.username);
            Ok(redirect(dashboard_for(&user)))
        }
        _ => {
            log::warn!("Failed login attempt for {:?}", form.username);
            flash::push(
                &session,
                Level::Danger,
                "Login Unsuccessful. Please check username and password",
            )?;
            Ok(redirect("/"))
        }
    }
}

fn dashboard_for(user: &User) -> &'static str {
    if user.is_admin() {
        "/admin-dashboard"
    } else {
        "/user-dashboard"
    }
}

#[get("/register")]
pub async fn register_handler(session: Session) -> Result<impl Responder, AppError> {
    let context = page_context(&session, "Register");
    render("register.html", &context)
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    /// Present only when the checkbox is ticked.
    is_admin: Option<String>,
}

#[post("/register")]
pub async fn register_form_handler(
    web::Form(form): web::Form<RegisterForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        flash::push(&session, Level::Warning, "Username and password are required")?;
        return Ok(redirect("/register"));
    }
    if form.password.len() > MAX_PASSWORD_LEN {
        flash::push(
            &session,
            Level::Warning,
            format!("Password must be at most {} characters long", MAX_PASSWORD_LEN),
        )?;
        return Ok(redirect("/register"));
    }

    let role = if form.is_admin.is_some() {
        Role::Admin
    } else {
        Role::User
    };

    match db::create_user(&state, username, &form.password, role).await? {
        CreateUser::Created(_) => {
            flash::push(&session, Level::Success, "Registration successful!")?;
        }
        CreateUser::UsernameTaken => {
            log::warn!("Registration rejected, username {} is taken", username);
            flash::push(
                &session,
                Level::Danger,
                "Username already exists. Please choose a different one.",
            )?;
        }
    }
    Ok(redirect("/register"))
}

#[get("/logout")]
pub async fn logout_handler(identity: Option<Identity>) -> impl Responder {
    if let Some(identity) = identity {
        identity.logout();
    }
    redirect("/")
}

#[get("/admin-dashboard")]
pub async fn admin_dashboard_handler(
    current: SessionUser,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    if !user.is_admin() {
        return Ok(redirect("/user-dashboard"));
    }

    let total_users = db::count_users_with_role(&state, Role::User)
        .await
        .map_err(db_error("count users"))?;
    let users = db::get_non_admin_users(&state)
        .await
        .map_err(db_error("list users"))?;
    let expenses = db::get_all_expenses_with_user(&state)
        .await
        .map_err(db_error("list expenses"))?;

    let summary = aggregate::admin_summary(total_users, &expenses, local_now().date());

    let mut context = page_context(&session, "Admin Dashboard");
    context.insert("user", &user);
    context.insert("summary", &summary);
    context.insert("users", &users);
    context.insert("expenses", &expenses);
    render("admin_dashboard.html", &context)
}

async fn user_dashboard(
    state: &AppState,
    session: &Session,
    user: &User,
) -> Result<HttpResponse, AppError> {
    let today = local_now().date();
    let month = DateRange::month(today);

    let incomes = db::get_incomes_within(state, user.id, month)
        .await
        .map_err(db_error("list incomes"))?;
    let expenses = db::get_expenses_within(state, user.id, month)
        .await
        .map_err(db_error("list expenses"))?;

    let summary = aggregate::user_summary(&incomes, &expenses, today);
    let todays = aggregate::todays_expenses(&expenses, today, TODAY_LIST_LIMIT);

    let mut context = page_context(session, "Dashboard");
    context.insert("user", user);
    context.insert("summary", &summary);
    context.insert("expenses", &todays);
    render("user_dashboard.html", &context)
}

#[get("/user-dashboard")]
pub async fn user_dashboard_handler(
    current: SessionUser,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    user_dashboard(&state, &session, &user).await
}

#[get("/dashboard")]
pub async fn dashboard_handler(
    current: SessionUser,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    user_dashboard(&state, &session, &user).await
}

#[get("/get_monthly_expenses")]
pub async fn monthly_expenses_handler(
    current: SessionUser,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    let year = local_now().year();

    let expenses = db::get_expenses_within(&state, user.id, DateRange::year(year))
        .await
        .map_err(db_error("list expenses"))?;

    Ok(HttpResponse::Ok().json(aggregate::monthly_series(&expenses, year)))
}

#[get("/add-income")]
pub async fn add_income_handler(
    current: SessionUser,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    let mut context = page_context(&session, "Add Income");
    context.insert("user", &user);
    render("add_income.html", &context)
}

#[derive(Deserialize)]
pub struct IncomeForm {
    #[serde(default)]
    amount: String,
    #[serde(default)]
    description: String,
}

#[post("/add-income")]
pub async fn add_income_form_handler(
    current: SessionUser,
    web::Form(form): web::Form<IncomeForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    let Some(amount) = parse_amount(&form.amount) else {
        flash::push(&session, Level::Warning, "Amount must be a number greater than zero")?;
        return Ok(redirect("/add-income"));
    };

    db::create_income(
        &state,
        user.id,
        NewIncome {
            amount,
            description: form.description.trim().to_owned(),
            date: local_now(),
        },
    )
    .await
    .map_err(db_error("record income"))?;

    flash::push(&session, Level::Success, "Income added successfully!")?;
    Ok(redirect("/dashboard"))
}

#[derive(Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    method: String,
}

#[post("/add-expense")]
pub async fn add_expense_form_handler(
    current: SessionUser,
    web::Form(form): web::Form<ExpenseForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    let Some(amount) = parse_amount(&form.amount) else {
        flash::push(&session, Level::Warning, "Amount must be a number greater than zero")?;
        return Ok(redirect("/user-dashboard"));
    };

    db::create_expense(
        &state,
        user.id,
        NewExpense {
            name: form.name.trim().to_owned(),
            amount,
            description: form.description.trim().to_owned(),
            method: form.method.trim().to_owned(),
            date: local_now(),
        },
    )
    .await
    .map_err(db_error("record expense"))?;

    flash::push(&session, Level::Success, "Expense added successfully!")?;
    Ok(redirect("/user-dashboard"))
}

#[get("/export-expenses")]
pub async fn export_expenses_handler(
    current: SessionUser,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let user = current.load(&state).await?;
    let expenses = db::get_expenses_for_user(&state, user.id)
        .await
        .map_err(db_error("list expenses"))?;

    let rows = export::export_rows(&expenses);
    let bytes = export::expenses_workbook(&rows).map_err(|e| {
        log::error!("Failed to build export for user {}: {}", user.id, e);
        e
    })?;
    log::info!("Exported {} expenses for user {}", rows.len(), user.id);

    Ok(HttpResponse::Ok()
        .content_type(export::XLSX_MIME)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(
                export::EXPORT_FILENAME.to_owned(),
            )],
        })
        .body(bytes))
}
