pub mod paths;

use crate::{
    handlers::{attendance, auth, employees, health, offices, profile, registers, tasks},
    server::DeskServer,
};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Create health check routes
pub fn health_routes() -> Router<DeskServer> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

/// Create authentication routes
pub fn auth_routes() -> Router<DeskServer> {
    Router::new()
        .route(paths::auth::SIGNUP, post(auth::signup))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::LOGOUT, post(auth::logout))
        .route(paths::auth::ME, get(auth::me))
}

/// Create employee account routes
pub fn employee_routes() -> Router<DeskServer> {
    Router::new()
        .route(
            paths::employees::EMPLOYEES,
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            paths::employees::EMPLOYEE_BY_ID,
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
}

/// Create inward and outward register routes
pub fn register_routes() -> Router<DeskServer> {
    Router::new()
        .route(
            paths::registers::INWARD,
            get(registers::list_inward).post(registers::create_inward),
        )
        .route(
            paths::registers::INWARD_BY_ID,
            put(registers::update_inward).delete(registers::delete_inward),
        )
        .route(
            paths::registers::OUTWARD,
            get(registers::list_outward).post(registers::create_outward),
        )
        .route(
            paths::registers::OUTWARD_BY_ID,
            put(registers::update_outward).delete(registers::delete_outward),
        )
}

/// Create attendance, task, profile and office routes
pub fn desk_routes() -> Router<DeskServer> {
    Router::new()
        .route(
            paths::attendance::ATTENDANCE,
            get(attendance::get_attendance).post(attendance::upsert_attendance),
        )
        .route(paths::tasks::TASKS, get(tasks::list_tasks).post(tasks::create_task))
        .route(
            paths::tasks::TASK_BY_ID,
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            paths::profile::PROFILE,
            get(profile::get_profile).put(profile::save_profile),
        )
        .route(
            paths::offices::OFFICES,
            get(offices::get_offices).put(offices::save_offices),
        )
}

/// All API routes; attachments are mounted by `create_app`
pub fn create_routes() -> Router<DeskServer> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        .merge(auth_routes())
        .merge(employee_routes())
        .merge(register_routes())
        .merge(desk_routes())
}
