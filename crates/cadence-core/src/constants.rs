/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const SERIES_ROUTE_COMPONENT: &str = "series";
pub const SERIES_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", SERIES_ROUTE_COMPONENT);

pub const INSTANCE_ROUTE_COMPONENT: &str = "instances";
pub const INSTANCE_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", INSTANCE_ROUTE_COMPONENT);

pub const ATTENDANCE_ROUTE_COMPONENT: &str = "attendance";
pub const ATTENDANCE_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", ATTENDANCE_ROUTE_COMPONENT);

/// Header carrying the caller's user id, set by the fronting proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Upper bound on the number of occurrences a single series may expand to.
pub const MAX_SERIES_OCCURRENCES: u16 = u16::MAX - 1;

pub const MAINTENANCE_ROUTE_COMPONENT: &str = "maintenance";
pub const MAINTENANCE_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", MAINTENANCE_ROUTE_COMPONENT);
