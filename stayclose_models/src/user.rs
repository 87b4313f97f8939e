pub type UserId = i64;

pub struct User {
    pub id: UserId,
    pub timezone: chrono_tz::Tz,
    pub display_name: Option<String>,
}
