pub mod activity;

pub mod auth;

pub mod courses;

pub mod frontend;

pub mod institutions;

pub mod students;

pub mod system;

pub mod teachers;

pub mod transfers;

pub mod users;

pub use activity::configure_activity_routes;
pub use auth::configure_auth_routes;
pub use courses::configure_course_routes;
pub use frontend::configure_frontend_routes;
pub use institutions::configure_institution_routes;
pub use students::configure_student_routes;
pub use system::configure_system_routes;
pub use teachers::configure_teacher_routes;
pub use transfers::configure_transfer_routes;
pub use users::configure_user_routes;
