//! Route path constants

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod auth {
    pub const SIGNUP: &str = "/api/auth/signup";
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ME: &str = "/api/me";
}

pub mod employees {
    pub const EMPLOYEES: &str = "/api/employees";
    pub const EMPLOYEE_BY_ID: &str = "/api/employees/:id";
}

pub mod registers {
    pub const INWARD: &str = "/api/inward";
    pub const INWARD_BY_ID: &str = "/api/inward/:id";
    pub const OUTWARD: &str = "/api/outward";
    pub const OUTWARD_BY_ID: &str = "/api/outward/:id";
}

pub mod attendance {
    pub const ATTENDANCE: &str = "/api/attendance";
}

pub mod tasks {
    pub const TASKS: &str = "/api/tasks";
    pub const TASK_BY_ID: &str = "/api/tasks/:id";
}

pub mod profile {
    pub const PROFILE: &str = "/api/profile";
}

pub mod offices {
    pub const OFFICES: &str = "/api/offices";
}

/// Static attachment mounts
pub mod files {
    pub const INWARD: &str = "/files/inward";
    pub const OUTWARD: &str = "/files/outward";
}
