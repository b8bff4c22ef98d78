//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, customers, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Corvina API",
        version = "1.0.0",
        description = "Library Management System REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::upload_cover,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::my_loans,
        loans::list_all_loans,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::delete_customer,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::Role,
            // Books
            crate::models::book::Book,
            crate::models::book::Availability,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::BookListResponse,
            books::BookDetails,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanType,
            crate::models::loan::LoanSummary,
            crate::models::loan::LoanDetails,
            loans::CreateLoanRequest,
            loans::LoanResponse,
            loans::ReturnResponse,
            loans::LoanListResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "loans", description = "Loan management"),
        (name = "customers", description = "Customer management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
