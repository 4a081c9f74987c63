use std::env;

use chrono::{NaiveTime, Weekday};

use crate::services::calendar::WeeklySchedule;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    // Weekly goal recalculation
    pub goal_recalc_enabled: bool,
    pub goal_recalc_weekday: Weekday,
    pub goal_recalc_time: NaiveTime,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),
            jwt_refresh_ttl_secs: env::var("JWT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "604800".into())
                .parse()
                .expect("JWT_REFRESH_TTL_SECS must be a number"),

            goal_recalc_enabled: env::var("GOAL_RECALC_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            goal_recalc_weekday: env::var("GOAL_RECALC_WEEKDAY")
                .unwrap_or_else(|_| "Mon".into())
                .parse()
                .expect("GOAL_RECALC_WEEKDAY must be a weekday name"),
            goal_recalc_time: NaiveTime::parse_from_str(
                &env::var("GOAL_RECALC_TIME").unwrap_or_else(|_| "03:00".into()),
                "%H:%M",
            )
            .expect("GOAL_RECALC_TIME must be HH:MM"),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn recalc_schedule(&self) -> WeeklySchedule {
        WeeklySchedule::new(self.goal_recalc_weekday, self.goal_recalc_time)
    }
}

#[cfg(test)]
impl Config {
    /// Config for tests that never touch the network or the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/fittrack_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 604800,
            goal_recalc_enabled: false,
            goal_recalc_weekday: Weekday::Mon,
            goal_recalc_time: NaiveTime::from_hms_opt(3, 0, 0).unwrap(),
        }
    }
}
